//! Graph builder and assembler.
//!
//! Reconstructs the logical nesting of a resource's tiles against its
//! schema hierarchy and renders the result as a labeled JSON tree wrapped
//! in a metadata envelope. The builder walks the schema recursively,
//! guided by the tile reference index; the assembler drives one walk per
//! top-level tile and collects the results under a synthetic root.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GraphError;
use crate::node::{LabelNode, RenderMode, NODE_ID_KEY, TILE_ID_KEY};
use crate::reference::{build_references, TileReferenceIndex};
use crate::schema::{Cardinality, SchemaNode, SchemaProvider};
use crate::tile::{Resource, Tile, TileSource};
use crate::value::{NodeValue, ValueResolver};

/// Key stamped onto each envelope in batch output to disambiguate entries.
pub const RESOURCE_ID_KEY: &str = "@resource_id";

/// Output options for the assembler.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub include_empty_nodes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Verbose,
            include_empty_nodes: true,
        }
    }
}

impl RenderOptions {
    pub fn compact() -> Self {
        Self {
            mode: RenderMode::Compact,
            ..Self::default()
        }
    }

    pub fn hide_empty(mut self) -> Self {
        self.include_empty_nodes = false;
        self
    }
}

/// Per-resource read-only state threaded through the recursive walk.
struct BuildContext<'t> {
    tiles: &'t [Tile],
    index: TileReferenceIndex,
    cardinalities: HashMap<Uuid, Cardinality>,
}

/// Where a freshly built node gets attached.
enum Attach<'a> {
    /// Top of a per-tile traversal; filled by the first parentless match.
    Root(&'a mut Option<LabelNode>),
    /// Appended as a child of an already-built node.
    Under(&'a mut LabelNode),
}

/// Builds label graphs for resources against one schema provider and one
/// value resolver. Schema lookups are cached across every build that goes
/// through the same builder, so batches reuse them; the builder is meant
/// for sequential use, not concurrent sharing.
pub struct LabelGraphBuilder<'a> {
    schema: &'a dyn SchemaProvider,
    values: &'a dyn ValueResolver,
    tile_source: Option<&'a dyn TileSource>,
    node_cache: HashMap<Uuid, SchemaNode>,
    children_cache: HashMap<Uuid, Vec<SchemaNode>>,
}

impl<'a> LabelGraphBuilder<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, values: &'a dyn ValueResolver) -> Self {
        Self {
            schema,
            values,
            tile_source: None,
            node_cache: HashMap::new(),
            children_cache: HashMap::new(),
        }
    }

    /// Configure lazy tile loading for resources that arrive without tiles.
    pub fn with_tile_source(mut self, source: &'a dyn TileSource) -> Self {
        self.tile_source = Some(source);
        self
    }

    /// Build the label graph for one tile out of a resource's tile
    /// sequence. Returns `None` when nothing matched (an absent optional
    /// branch, or a tile whose top node lives in a separate card and is
    /// surfaced by its own pass).
    pub fn graph_for_tile(
        &mut self,
        tiles: &[Tile],
        position: usize,
    ) -> Result<Option<LabelNode>, GraphError> {
        let (index, cardinalities) = build_references(tiles, self.schema)?;
        let ctx = BuildContext {
            tiles,
            index,
            cardinalities,
        };
        self.build_tile(&ctx, position)
    }

    /// Build the full label tree for a resource: one graph per tile,
    /// collected under a synthetic root so independently stored top-level
    /// groupings surface as siblings.
    pub fn graph_for_resource(&mut self, resource: &Resource) -> Result<LabelNode, GraphError> {
        let loaded;
        let tiles: &[Tile] = match &resource.tiles {
            Some(tiles) => tiles,
            None => {
                let source = self
                    .tile_source
                    .ok_or(GraphError::TilesNotLoaded(resource.id))?;
                loaded = source.load_tiles(resource.id)?;
                &loaded
            }
        };

        let (index, cardinalities) = build_references(tiles, self.schema)?;
        let ctx = BuildContext {
            tiles,
            index,
            cardinalities,
        };

        let mut root = LabelNode::root();
        for position in 0..tiles.len() {
            if let Some(graph) = self.build_tile(&ctx, position)? {
                root.children.push(graph);
            }
        }

        debug!(
            "resource {} graphed: {} top-level nodes from {} tiles",
            resource.id,
            root.children.len(),
            tiles.len()
        );
        Ok(root)
    }

    /// Render one resource to its metadata envelope.
    pub fn render_resource(
        &mut self,
        resource: &Resource,
        options: &RenderOptions,
    ) -> Result<Value, GraphError> {
        let root = self.graph_for_resource(resource)?;
        let mut rendered = root.render(options.mode, options.include_empty_nodes);

        match rendered.as_object_mut() {
            Some(tree) => {
                // meaningless on the synthetic root
                tree.remove(NODE_ID_KEY);
                tree.remove(TILE_ID_KEY);
            }
            // compact mode renders a childless root as null
            None => rendered = Value::Object(Map::new()),
        }

        Ok(envelope(resource, rendered))
    }

    /// Render a batch of resources, stamping each envelope with its
    /// resource id. Schema caches carry over between entries.
    pub fn render_resources(
        &mut self,
        resources: &[Resource],
        options: &RenderOptions,
    ) -> Result<Vec<Value>, GraphError> {
        let mut rendered = Vec::with_capacity(resources.len());
        for resource in resources {
            let mut entry = self.render_resource(resource, options)?;
            if let Some(fields) = entry.as_object_mut() {
                fields.insert(
                    RESOURCE_ID_KEY.to_string(),
                    Value::String(resource.id.to_string()),
                );
            }
            rendered.push(entry);
        }
        info!("rendered {} resource label graphs", rendered.len());
        Ok(rendered)
    }

    fn build_tile(
        &mut self,
        ctx: &BuildContext<'_>,
        position: usize,
    ) -> Result<Option<LabelNode>, GraphError> {
        let group_id = ctx.tiles[position].nodegroup_id;
        let root_node = match self.cached_node(group_id) {
            Ok(node) => node,
            Err(GraphError::UnknownNode(id)) => {
                debug!(
                    "tile {} references unknown nodegroup {}, skipping",
                    ctx.tiles[position].id, id
                );
                return Ok(None);
            }
            Err(other) => return Err(other),
        };

        let mut top = None;
        self.build_node(ctx, &root_node, position, &mut Attach::Root(&mut top))?;
        Ok(top)
    }

    /// Recursive walk of one schema node against every candidate tile the
    /// index associates with it.
    fn build_node(
        &mut self,
        ctx: &BuildContext<'_>,
        schema_node: &SchemaNode,
        current: usize,
        attach: &mut Attach<'_>,
    ) -> Result<(), GraphError> {
        let candidates = match ctx.index.tiles_for(schema_node.id) {
            Some(positions) => positions.to_vec(),
            None => vec![current],
        };

        for candidate in candidates {
            let current_tile_id = ctx.tiles[current].id;
            let tile = &ctx.tiles[candidate];

            // A candidate is relevant only if it is the current tile or a
            // separate card whose parent reference points back at it.
            if candidate != current && tile.parent_tile_id != Some(current_tile_id) {
                continue;
            }

            // Semantic nodes always materialize to preserve structure; leaf
            // nodes only when this candidate actually populates them, so
            // absent repeats of MANY groups emit no placeholders.
            if !schema_node.is_semantic() && !tile.data.contains_key(&schema_node.id) {
                continue;
            }

            let value = self.resolve_value(tile, schema_node);
            let mut label = LabelNode::new(
                schema_node.name.clone(),
                schema_node.id,
                tile.id,
                value,
                ctx.cardinalities.get(&tile.nodegroup_id).copied(),
            );
            let tile_parent = tile.parent_tile_id;

            let children = self.cached_children(schema_node.id)?;
            for child in &children {
                self.build_node(ctx, child, candidate, &mut Attach::Under(&mut label))?;
            }

            match attach {
                Attach::Under(parent) => parent.children.push(label),
                Attach::Root(slot) => match slot.take() {
                    Some(mut root) => {
                        root.children.push(label);
                        **slot = Some(root);
                    }
                    None if tile_parent.is_none() => **slot = Some(label),
                    // the top node of a separate card surfaces through its
                    // own per-tile pass, never nested here
                    None => {}
                },
            }
        }

        Ok(())
    }

    fn resolve_value(&self, tile: &Tile, schema_node: &SchemaNode) -> NodeValue {
        if !self.values.collects_data(&schema_node.datatype) {
            return NodeValue::NonCollecting;
        }
        if tile.data.is_empty() {
            return NodeValue::Absent;
        }
        match self.values.render(tile, schema_node) {
            Ok(rendered) => NodeValue::from_rendered(rendered),
            // best effort: one unrenderable field never aborts the tree
            Err(err) => {
                debug!("value render failed, leaving node blank: {err}");
                NodeValue::Absent
            }
        }
    }

    fn cached_node(&mut self, id: Uuid) -> Result<SchemaNode, GraphError> {
        if let Some(node) = self.node_cache.get(&id) {
            return Ok(node.clone());
        }
        let node = self.schema.node(id)?;
        self.node_cache.insert(id, node.clone());
        Ok(node)
    }

    fn cached_children(&mut self, id: Uuid) -> Result<Vec<SchemaNode>, GraphError> {
        if let Some(children) = self.children_cache.get(&id) {
            return Ok(children.clone());
        }
        let children = self.schema.direct_children(id)?;
        for child in &children {
            self.node_cache
                .entry(child.id)
                .or_insert_with(|| child.clone());
        }
        self.children_cache.insert(id, children.clone());
        Ok(children)
    }
}

/// Wrap a rendered tree with the resource's metadata.
fn envelope(resource: &Resource, tree: Value) -> Value {
    let mut fields = Map::new();
    fields.insert(
        "displaydescription".to_string(),
        json!(resource.display_description),
    );
    fields.insert("displayname".to_string(), json!(resource.display_name));
    fields.insert("graph_id".to_string(), json!(resource.graph_id));
    fields.insert("legacyid".to_string(), json!(resource.legacy_id));
    fields.insert("map_popup".to_string(), json!(resource.map_popup));
    fields.insert("resourceinstanceid".to_string(), json!(resource.id));
    fields.insert("resource".to_string(), tree);
    Value::Object(fields)
}
