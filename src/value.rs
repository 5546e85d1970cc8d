//! Resolved node values and the value-rendering contract.
//!
//! A node's value is a tagged variant, never a sentinel compared by
//! identity: `Absent` (nothing collected), `NonCollecting` (the datatype has
//! no input widget, so the node can never carry a value), `Scalar` (a bare
//! display value) or `Structured` (a mapping of display sub-fields).

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::schema::{SchemaNode, SEMANTIC_DATATYPE};
use crate::tile::Tile;

/// Conventional key a bare scalar is folded under when it has to live
/// inside a mapping payload.
pub const DISPLAY_VALUE_KEY: &str = "@display_value";

/// A single field failed to render. Recovered locally by the graph builder,
/// which substitutes an absent value; never aborts a build.
#[derive(Debug, Error)]
#[error("cannot render {datatype} value for node {node_id}: {reason}")]
pub struct ValueError {
    pub node_id: Uuid,
    pub datatype: String,
    pub reason: String,
}

/// The display value carried by a label node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// No datum collected for this node.
    Absent,
    /// The node's datatype declares no capturable widget.
    NonCollecting,
    /// A bare display value.
    Scalar(Value),
    /// Display sub-fields merged into the node's rendered payload.
    Structured(Map<String, Value>),
}

impl NodeValue {
    /// True for the two no-datum states. A node with a blank value may still
    /// be non-empty through its children.
    pub fn is_blank(&self) -> bool {
        matches!(self, NodeValue::Absent | NodeValue::NonCollecting)
    }

    /// Classify a resolver's output. JSON null counts as no value.
    pub fn from_rendered(value: Value) -> Self {
        match value {
            Value::Null => NodeValue::Absent,
            Value::Object(fields) => NodeValue::Structured(fields),
            scalar => NodeValue::Scalar(scalar),
        }
    }
}

/// Value-rendering contract: converts a raw stored value plus its node's
/// declared datatype into a display-ready JSON value.
pub trait ValueResolver {
    /// Whether the datatype can collect data at all. Nodes whose datatype
    /// cannot are rendered with the non-collecting marker.
    fn collects_data(&self, datatype: &str) -> bool;

    /// Render the node's value from the tile. Any error is treated by the
    /// caller as "no value" for that field only.
    fn render(&self, tile: &Tile, node: &SchemaNode) -> Result<Value, ValueError>;
}

/// Per-datatype behavior for [`DatatypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct DatatypeSpec {
    pub collects_data: bool,
}

/// Registry-backed resolver keyed by datatype name.
///
/// The default rendering passes the raw stored value through unchanged,
/// which covers plain datatypes (strings, numbers, booleans, pre-shaped
/// objects). Datatypes missing from the registry are assumed to collect
/// data rather than being rejected.
#[derive(Debug, Clone)]
pub struct DatatypeRegistry {
    specs: HashMap<String, DatatypeSpec>,
}

impl DatatypeRegistry {
    /// Registry with the stock datatypes; `semantic` is non-collecting.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            specs: HashMap::new(),
        };
        for datatype in ["string", "number", "boolean", "date"] {
            registry.register(datatype, DatatypeSpec { collects_data: true });
        }
        registry.register(SEMANTIC_DATATYPE, DatatypeSpec { collects_data: false });
        registry
    }

    pub fn register(&mut self, datatype: impl Into<String>, spec: DatatypeSpec) {
        self.specs.insert(datatype.into(), spec);
    }
}

impl Default for DatatypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ValueResolver for DatatypeRegistry {
    fn collects_data(&self, datatype: &str) -> bool {
        self.specs
            .get(datatype)
            .map(|spec| spec.collects_data)
            .unwrap_or(true)
    }

    fn render(&self, tile: &Tile, node: &SchemaNode) -> Result<Value, ValueError> {
        Ok(tile.data.get(&node.id).cloned().unwrap_or(Value::Null))
    }
}
