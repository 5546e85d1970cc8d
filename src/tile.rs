//! Tiles (stored data records) and the resources they belong to.
//!
//! A tile populates one node-group of a resource: a mapping from schema
//! node id to the raw stored value, plus an optional parent-tile reference
//! when the group is stored as a separate card under another tile.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::GraphError;

/// One stored unit of data for a resource. Absence of a node id in `data`
/// means "no value for this node in this tile" — never an explicit null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: Uuid,
    pub nodegroup_id: Uuid,
    #[serde(default)]
    pub parent_tile_id: Option<Uuid>,
    #[serde(default)]
    pub data: HashMap<Uuid, serde_json::Value>,
}

impl Tile {
    pub fn new(nodegroup_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            nodegroup_id,
            parent_tile_id: None,
            data: HashMap::new(),
        }
    }

    /// Store this tile as a separate card under `parent`.
    pub fn under(mut self, parent: &Tile) -> Self {
        self.parent_tile_id = Some(parent.id);
        self
    }

    /// Populate a node's raw value.
    pub fn with_value(mut self, node_id: Uuid, value: serde_json::Value) -> Self {
        self.data.insert(node_id, value);
        self
    }
}

/// The top-level schema-bound entity being rendered, with the metadata the
/// assembler copies verbatim into the output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub graph_id: Uuid,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_description: Option<String>,
    #[serde(default)]
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub map_popup: Option<String>,
    /// `None` means "not loaded yet"; the assembler will ask its tile
    /// source. `Some(vec![])` is a legitimately empty resource.
    #[serde(default)]
    pub tiles: Option<Vec<Tile>>,
}

impl Resource {
    pub fn new(graph_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph_id,
            display_name: None,
            display_description: None,
            legacy_id: None,
            map_popup: None,
            tiles: Some(Vec::new()),
        }
    }

    pub fn push_tile(&mut self, tile: Tile) {
        self.tiles.get_or_insert_with(Vec::new).push(tile);
    }
}

/// Data service contract: produces a resource's tiles on demand, in storage
/// order. Only consulted when `Resource::tiles` is `None`.
pub trait TileSource {
    fn load_tiles(&self, resource_id: Uuid) -> Result<Vec<Tile>, GraphError>;
}
