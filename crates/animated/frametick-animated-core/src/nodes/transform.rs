use hashbrown::HashMap;
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::AnimatedNode;
use crate::error::AnimatedError;
use crate::types::{NodeId, StaticValue, DECOMPOSED_MATRIX_KEY};

/// Composes the current values of other nodes with static entries.
#[derive(Debug, Clone, Default)]
pub struct TransformNode {
    animated: IndexMap<String, NodeId>,
    statics: IndexMap<String, StaticValue>,
}

impl TransformNode {
    /// Statics that are neither numbers nor arrays are dropped; an array holding a
    /// non-number fails construction.
    pub fn new(
        animated: IndexMap<String, NodeId>,
        statics: &JsonMap<String, JsonValue>,
    ) -> Result<Self, AnimatedError> {
        let mut kept = IndexMap::with_capacity(statics.len());
        for (key, value) in statics {
            match StaticValue::from_json(key, value)? {
                Some(v) => {
                    kept.insert(key.clone(), v);
                }
                None => log::debug!("transform static '{key}' ignored: not numeric"),
            }
        }
        Ok(Self {
            animated,
            statics: kept,
        })
    }

    pub fn animated(&self) -> &IndexMap<String, NodeId> {
        &self.animated
    }

    pub fn statics(&self) -> &IndexMap<String, StaticValue> {
        &self.statics
    }

    pub fn references(&self, id: NodeId) -> bool {
        self.animated.values().any(|n| *n == id)
    }

    /// Build `{ "decomposedMatrix": { .. } }` from the referenced nodes' current values.
    ///
    /// Fails as a whole: nothing is returned if any reference is missing or is not a
    /// value node.
    pub fn collect(
        &self,
        nodes: &HashMap<NodeId, AnimatedNode>,
    ) -> Result<JsonMap<String, JsonValue>, AnimatedError> {
        let mut transform = JsonMap::new();
        for (key, id) in &self.animated {
            match nodes.get(id) {
                None => return Err(AnimatedError::NodeNotFound(*id)),
                Some(AnimatedNode::Value(node)) => {
                    transform.insert(key.clone(), JsonValue::from(node.value));
                }
                Some(other) => {
                    return Err(AnimatedError::UnsupportedNodeType {
                        id: *id,
                        found: other.kind(),
                        role: "transform input",
                    })
                }
            }
        }
        for (key, value) in &self.statics {
            transform.insert(key.clone(), value.to_json());
        }
        let mut props = JsonMap::with_capacity(1);
        props.insert(DECOMPOSED_MATRIX_KEY.to_string(), JsonValue::Object(transform));
        Ok(props)
    }
}
