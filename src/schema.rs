//! Schema node definitions and the schema service contract.
//!
//! A schema is a hierarchy of nodes: semantic nodes are pure groupings,
//! leaf nodes carry a datatype and collect values. Nodes belong to
//! node-groups; a group's id doubles as the id of its root node, and its
//! cardinality says whether tiles for it may repeat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::GraphError;

/// Datatype name reserved for pure grouping nodes.
pub const SEMANTIC_DATATYPE: &str = "semantic";

/// How many tile instances a node-group admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1")]
    Single,
    #[serde(rename = "n")]
    Many,
}

/// A node in the schema hierarchy. Immutable for the duration of a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNode {
    pub id: Uuid,
    pub name: String,
    pub datatype: String,
    /// The node-group this node belongs to.
    pub nodegroup_id: Uuid,
}

impl SchemaNode {
    /// Create a node that roots its own node-group (the common case for
    /// top-level groups).
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name: name.into(),
            datatype: datatype.into(),
            nodegroup_id: id,
        }
    }

    /// Reassign the node to an existing node-group.
    pub fn in_nodegroup(mut self, nodegroup_id: Uuid) -> Self {
        self.nodegroup_id = nodegroup_id;
        self
    }

    /// Semantic nodes group other nodes and never collect a value directly.
    pub fn is_semantic(&self) -> bool {
        self.datatype == SEMANTIC_DATATYPE
    }
}

/// Schema service contract consumed by the graph builder.
///
/// Implementations are expected to be cheap to call repeatedly; the builder
/// additionally caches nodes and child lists by id across a whole build.
pub trait SchemaProvider {
    /// Fetch a node definition by id.
    fn node(&self, id: Uuid) -> Result<SchemaNode, GraphError>;

    /// Fetch a node's direct children, in schema order.
    fn direct_children(&self, id: Uuid) -> Result<Vec<SchemaNode>, GraphError>;

    /// Batched cardinality lookup. Group ids with no matching node-group are
    /// simply absent from the result.
    fn cardinalities(
        &self,
        group_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Cardinality>, GraphError>;
}

/// In-memory schema provider.
///
/// Holds a full node hierarchy and per-group cardinalities. Useful for
/// embedders that already have the schema materialized, and for tests.
#[derive(Debug, Default)]
pub struct StaticSchema {
    nodes: HashMap<Uuid, SchemaNode>,
    children: HashMap<Uuid, Vec<Uuid>>,
    cardinalities: HashMap<Uuid, Cardinality>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node definition.
    pub fn add_node(&mut self, node: SchemaNode) {
        self.nodes.insert(node.id, node);
    }

    /// Register `child` as the next direct child of `parent`.
    pub fn add_child(&mut self, parent: Uuid, child: Uuid) {
        self.children.entry(parent).or_default().push(child);
    }

    /// Declare a node-group's cardinality.
    pub fn set_cardinality(&mut self, group_id: Uuid, cardinality: Cardinality) {
        self.cardinalities.insert(group_id, cardinality);
    }
}

impl SchemaProvider for StaticSchema {
    fn node(&self, id: Uuid) -> Result<SchemaNode, GraphError> {
        self.nodes
            .get(&id)
            .cloned()
            .ok_or(GraphError::UnknownNode(id))
    }

    fn direct_children(&self, id: Uuid) -> Result<Vec<SchemaNode>, GraphError> {
        let ids = self.children.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        ids.iter().map(|child_id| self.node(*child_id)).collect()
    }

    fn cardinalities(
        &self,
        group_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Cardinality>, GraphError> {
        Ok(group_ids
            .iter()
            .filter_map(|id| self.cardinalities.get(id).map(|c| (*id, *c)))
            .collect())
    }
}
