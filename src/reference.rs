//! Reference builder: one pass over a resource's tiles.
//!
//! Produces the two read-only maps the graph builder navigates by: which
//! tiles touch each node id, and each node-group's declared cardinality.
//! Tiles are indexed by position in the input sequence so later merge order
//! follows storage order.

use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::error::GraphError;
use crate::schema::{Cardinality, SchemaProvider};
use crate::tile::Tile;

/// Mapping from every node/node-group id seen across a resource's tiles to
/// the ordered list of tile positions that touch it.
#[derive(Debug, Default)]
pub struct TileReferenceIndex {
    by_node: HashMap<Uuid, Vec<usize>>,
}

impl TileReferenceIndex {
    /// Tile positions that touch `node_id`, in input order. `None` when the
    /// id was never seen.
    pub fn tiles_for(&self, node_id: Uuid) -> Option<&[usize]> {
        self.by_node.get(&node_id).map(Vec::as_slice)
    }

    /// Number of distinct node ids indexed.
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

/// Scan `tiles` once and build the reference index plus the node-group
/// cardinality snapshot (one batched schema lookup).
///
/// A tile always touches its own node-group id, even with no populated
/// entries, so empty groups still surface in the index.
pub fn build_references(
    tiles: &[Tile],
    schema: &dyn SchemaProvider,
) -> Result<(TileReferenceIndex, HashMap<Uuid, Cardinality>), GraphError> {
    let mut by_node: HashMap<Uuid, Vec<usize>> = HashMap::new();
    let mut group_ids: Vec<Uuid> = Vec::new();
    let mut seen_groups: HashSet<Uuid> = HashSet::new();

    for (position, tile) in tiles.iter().enumerate() {
        if seen_groups.insert(tile.nodegroup_id) {
            group_ids.push(tile.nodegroup_id);
        }

        for node_id in tile.data.keys() {
            by_node.entry(*node_id).or_default().push(position);
        }
        if !tile.data.contains_key(&tile.nodegroup_id) {
            by_node.entry(tile.nodegroup_id).or_default().push(position);
        }
    }

    let cardinalities = if group_ids.is_empty() {
        HashMap::new()
    } else {
        schema.cardinalities(&group_ids)?
    };

    debug!(
        "reference index built: {} node ids across {} tiles, {} nodegroups",
        by_node.len(),
        tiles.len(),
        group_ids.len()
    );

    Ok((TileReferenceIndex { by_node }, cardinalities))
}
