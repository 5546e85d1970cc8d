//! label-graph — schema-driven rendering of tiled resource data into
//! labeled JSON trees.
//!
//! A resource is a schema-bound entity whose data lives in flat, repeatable
//! tiles, each tagged with the schema node-group it populates and sometimes
//! stored as a separate card under another tile. This crate reconstructs
//! the logical nesting from those scattered records, merges repeated
//! siblings into ordered lists, tracks per-node provenance, and renders the
//! result in two shapes: verbose (every node annotated with its node and
//! tile ids) or compact (identifiers omitted, leaf values inlined).
//!
//! The storage services stay outside the crate, behind three small traits:
//! [`SchemaProvider`] for node definitions and cardinalities,
//! [`TileSource`] for lazy tile loading, and [`ValueResolver`] for turning
//! raw stored values into display values. [`StaticSchema`] and
//! [`DatatypeRegistry`] are ready-made in-memory implementations.
//!
//! ```
//! use label_graph::{
//!     Cardinality, DatatypeRegistry, LabelGraphBuilder, RenderOptions, Resource,
//!     SchemaNode, StaticSchema, Tile,
//! };
//! use serde_json::json;
//!
//! let mut schema = StaticSchema::new();
//! let name_node = SchemaNode::new("Name", "string");
//! schema.set_cardinality(name_node.nodegroup_id, Cardinality::Single);
//! schema.add_node(name_node.clone());
//!
//! let mut resource = Resource::new(uuid::Uuid::new_v4());
//! resource.push_tile(Tile::new(name_node.nodegroup_id).with_value(name_node.id, json!("Asa")));
//!
//! let registry = DatatypeRegistry::with_defaults();
//! let mut builder = LabelGraphBuilder::new(&schema, &registry);
//! let envelope = builder.render_resource(&resource, &RenderOptions::compact())?;
//! assert_eq!(envelope["resource"], json!({ "Name": "Asa" }));
//! # Ok::<(), label_graph::GraphError>(())
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod reference;
pub mod schema;
pub mod tile;
pub mod value;

pub use error::GraphError;
pub use graph::{LabelGraphBuilder, RenderOptions, RESOURCE_ID_KEY};
pub use node::{LabelNode, RenderMode, NODE_ID_KEY, TILE_ID_KEY};
pub use reference::{build_references, TileReferenceIndex};
pub use schema::{Cardinality, SchemaNode, SchemaProvider, StaticSchema, SEMANTIC_DATATYPE};
pub use tile::{Resource, Tile, TileSource};
pub use value::{
    DatatypeRegistry, DatatypeSpec, NodeValue, ValueError, ValueResolver, DISPLAY_VALUE_KEY,
};
