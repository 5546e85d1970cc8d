//! The labeled output tree element and its two-mode JSON renderer.

use serde_json::map::Entry;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::Cardinality;
use crate::value::{NodeValue, DISPLAY_VALUE_KEY};

/// Reserved verbose-mode key carrying the schema node id.
pub const NODE_ID_KEY: &str = "@node_id";
/// Reserved verbose-mode key carrying the originating tile id.
pub const TILE_ID_KEY: &str = "@tile_id";

/// Output shape selector. Verbose annotates every node with its node and
/// tile ids; compact omits identifiers and inlines leaf values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Verbose,
    Compact,
}

/// One element of the labeled tree. Name, node id and tile id are `None`
/// only on the synthetic per-resource root. Children keep traversal order;
/// same-named siblings are merged at render time, not here.
#[derive(Debug, Clone)]
pub struct LabelNode {
    pub name: Option<String>,
    pub node_id: Option<Uuid>,
    pub tile_id: Option<Uuid>,
    pub cardinality: Option<Cardinality>,
    pub value: NodeValue,
    pub children: Vec<LabelNode>,
}

impl LabelNode {
    pub fn new(
        name: impl Into<String>,
        node_id: Uuid,
        tile_id: Uuid,
        value: NodeValue,
        cardinality: Option<Cardinality>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            node_id: Some(node_id),
            tile_id: Some(tile_id),
            cardinality,
            value,
            children: Vec::new(),
        }
    }

    /// The synthetic per-resource root.
    pub fn root() -> Self {
        Self {
            name: None,
            node_id: None,
            tile_id: None,
            cardinality: None,
            value: NodeValue::Absent,
            children: Vec::new(),
        }
    }

    /// A node is empty iff it carries no directly-collected datum and every
    /// child is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_blank() && self.children.iter().all(LabelNode::is_empty)
    }

    /// Render this node's payload. The caller keys the payload under
    /// `self.name` when merging it into its own parent; at the outermost
    /// call the name is simply discarded.
    pub fn render(&self, mode: RenderMode, include_empty: bool) -> Value {
        let mut display = Map::new();

        for child in &self.children {
            if !include_empty && child.is_empty() {
                continue;
            }

            let payload = child.render(mode, include_empty);
            let name = child.name.clone().unwrap_or_default();

            // Same-name merge: a MANY group living in another tile is a
            // repetition in waiting, so its first occurrence already seeds a
            // list. Any second occurrence appends, promoting a scalar slot
            // if needed — observed repetition wins over declared cardinality.
            match display.entry(name) {
                Entry::Vacant(vacant) => {
                    let seed_list = child.cardinality == Some(Cardinality::Many)
                        && child.tile_id != self.tile_id;
                    vacant.insert(if seed_list {
                        Value::Array(vec![payload])
                    } else {
                        payload
                    });
                }
                Entry::Occupied(mut occupied) => match occupied.get_mut() {
                    Value::Array(existing) => existing.push(payload),
                    existing => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, payload]);
                    }
                },
            }
        }

        match mode {
            RenderMode::Compact if display.is_empty() => match &self.value {
                NodeValue::Scalar(value) => value.clone(),
                NodeValue::Structured(fields) => Value::Object(fields.clone()),
                NodeValue::Absent | NodeValue::NonCollecting => Value::Null,
            },
            RenderMode::Compact => {
                self.merge_own_value(&mut display);
                Value::Object(display)
            }
            RenderMode::Verbose => {
                display.insert(NODE_ID_KEY.to_string(), id_json(self.node_id));
                display.insert(TILE_ID_KEY.to_string(), id_json(self.tile_id));
                self.merge_own_value(&mut display);
                Value::Object(display)
            }
        }
    }

    /// Fold this node's own value into its rendered payload. Own fields are
    /// applied after children, so they win on key collision. Bare scalars go
    /// under the display-value key rather than being dropped.
    fn merge_own_value(&self, display: &mut Map<String, Value>) {
        match &self.value {
            NodeValue::Structured(fields) => {
                for (key, value) in fields {
                    display.insert(key.clone(), value.clone());
                }
            }
            NodeValue::Scalar(value) => {
                display.insert(DISPLAY_VALUE_KEY.to_string(), value.clone());
            }
            NodeValue::Absent | NodeValue::NonCollecting => {}
        }
    }
}

fn id_json(id: Option<Uuid>) -> Value {
    id.map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valued(name: &str) -> LabelNode {
        LabelNode::new(
            name,
            Uuid::new_v4(),
            Uuid::new_v4(),
            NodeValue::Scalar(json!(format!("{name}_value"))),
            Some(Cardinality::Single),
        )
    }

    fn blank(name: &str) -> LabelNode {
        LabelNode::new(
            name,
            Uuid::new_v4(),
            Uuid::new_v4(),
            NodeValue::Absent,
            Some(Cardinality::Single),
        )
    }

    fn verbose_payload(node: &LabelNode) -> Value {
        json!({
            NODE_ID_KEY: node.node_id.unwrap().to_string(),
            TILE_ID_KEY: node.tile_id.unwrap().to_string(),
            DISPLAY_VALUE_KEY: format!("{}_value", node.name.as_deref().unwrap()),
        })
    }

    #[test]
    fn test_is_empty_without_value_or_children() {
        assert!(blank("empty").is_empty());
        assert!(LabelNode::root().is_empty());
    }

    #[test]
    fn test_is_empty_false_with_non_empty_child() {
        let mut node = blank("parent");
        node.children.push(valued("child"));
        assert!(!node.is_empty());
    }

    #[test]
    fn test_non_collecting_counts_as_empty() {
        let mut node = blank("group");
        node.value = NodeValue::NonCollecting;
        node.children.push(blank("leaf"));
        assert!(node.is_empty());
    }

    #[test]
    fn test_verbose_render_of_leaf() {
        let node = valued("leaf");
        assert_eq!(node.render(RenderMode::Verbose, true), verbose_payload(&node));
    }

    #[test]
    fn test_compact_render_of_leaf_is_value_unchanged() {
        let node = valued("leaf");
        assert_eq!(node.render(RenderMode::Compact, true), json!("leaf_value"));
    }

    #[test]
    fn test_compact_render_of_blank_leaf_is_null() {
        let node = blank("leaf");
        assert_eq!(node.render(RenderMode::Compact, true), Value::Null);
        let mut sentinel = blank("widgetless");
        sentinel.value = NodeValue::NonCollecting;
        assert_eq!(sentinel.render(RenderMode::Compact, true), Value::Null);
    }

    #[test]
    fn test_compact_render_merges_own_value_with_children() {
        let mut node = valued("parent");
        node.children.push(valued("child"));
        assert_eq!(
            node.render(RenderMode::Compact, true),
            json!({
                "child": "child_value",
                DISPLAY_VALUE_KEY: "parent_value",
            })
        );
    }

    #[test]
    fn test_verbose_render_nests_single_child() {
        let mut node = valued("parent");
        let child = valued("child");
        let expected_child = verbose_payload(&child);
        node.children.push(child);

        let rendered = node.render(RenderMode::Verbose, true);
        assert_eq!(rendered["child"], expected_child);
        assert_eq!(rendered[DISPLAY_VALUE_KEY], json!("parent_value"));
    }

    #[test]
    fn test_same_named_siblings_promote_to_list() {
        let mut node = valued("parent");
        for _ in 0..3 {
            let mut child = valued("child");
            // identical names from the same tile as the parent
            child.tile_id = node.tile_id;
            node.children.push(child);
        }

        let rendered = node.render(RenderMode::Verbose, true);
        let repeated = rendered["child"].as_array().expect("expected a list");
        assert_eq!(repeated.len(), 3);
        for payload in repeated {
            assert_eq!(payload[DISPLAY_VALUE_KEY], json!("child_value"));
        }
    }

    #[test]
    fn test_many_cardinality_in_other_tile_seeds_list() {
        let mut parent = valued("parent");
        let mut child = valued("child");
        child.cardinality = Some(Cardinality::Many);
        parent.children.push(child);

        let rendered = parent.render(RenderMode::Verbose, true);
        assert_eq!(rendered["child"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_many_cardinality_in_same_tile_stays_scalar_until_repeated() {
        let mut parent = valued("parent");
        let mut child = valued("child");
        child.cardinality = Some(Cardinality::Many);
        child.tile_id = parent.tile_id;
        parent.children.push(child);

        let rendered = parent.render(RenderMode::Verbose, true);
        assert!(rendered["child"].is_object());
    }

    #[test]
    fn test_hide_empty_drops_only_empty_branches() {
        let mut parent = valued("parent");
        parent.children.push(blank("missing"));
        parent.children.push(valued("present"));

        let rendered = parent.render(RenderMode::Verbose, false);
        assert!(rendered.get("missing").is_none());
        assert!(rendered.get("present").is_some());

        let kept = parent.render(RenderMode::Verbose, true);
        assert!(kept.get("missing").is_some());
    }

    #[test]
    fn test_structured_value_fields_win_over_children() {
        let mut parent = valued("parent");
        let mut fields = Map::new();
        fields.insert("label".to_string(), json!("own"));
        parent.value = NodeValue::Structured(fields);

        let mut child = valued("label");
        child.tile_id = parent.tile_id;
        parent.children.push(child);

        let rendered = parent.render(RenderMode::Compact, true);
        assert_eq!(rendered["label"], json!("own"));
    }
}
