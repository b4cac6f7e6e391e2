//! Registry owning every animated node, keyed by id.

use hashbrown::{hash_map::Entry, HashMap};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::AnimatedError;
use crate::nodes::{AnimatedNode, SpringDriverNode, SpringPhase, TransformNode, ValueNode};
use crate::types::{NodeConfig, NodeId, SpringConfig};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// What one call to [`NodesManager::run_update`] changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameUpdate {
    pub frame_time_ms: u64,
    /// Value nodes written this frame, in id order.
    pub updated: Vec<NodeId>,
    /// Spring nodes that came to rest this frame.
    pub finished: Vec<NodeId>,
}

impl FrameUpdate {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.finished.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct NodesManager {
    nodes: HashMap<NodeId, AnimatedNode>,
}

impl NodesManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&AnimatedNode> {
        self.nodes.get(&id)
    }

    fn insert_new(&mut self, id: NodeId, node: AnimatedNode) -> Result<(), AnimatedError> {
        match self.nodes.entry(id) {
            Entry::Occupied(_) => Err(AnimatedError::DuplicateNode(id)),
            Entry::Vacant(slot) => {
                log::debug!("animated node {id} created ({})", node.kind());
                slot.insert(node);
                Ok(())
            }
        }
    }

    pub fn create_node(&mut self, id: NodeId, config: NodeConfig) -> Result<(), AnimatedError> {
        let node = match config {
            NodeConfig::Value { value } => AnimatedNode::Value(ValueNode::new(value)),
            NodeConfig::Transform { animated, statics } => {
                AnimatedNode::Transform(TransformNode::new(animated, &statics)?)
            }
        };
        self.insert_new(id, node)
    }

    /// Create a node from its JSON payload (`{"type": "value", ...}`).
    pub fn create_node_json(&mut self, id: NodeId, config: JsonValue) -> Result<(), AnimatedError> {
        self.create_node(id, NodeConfig::from_json(config)?)
    }

    /// Register spring driver `spring_id` animating value node `value_node_id`.
    pub fn start_animating_node(
        &mut self,
        spring_id: NodeId,
        value_node_id: NodeId,
        config: SpringConfig,
    ) -> Result<(), AnimatedError> {
        config.validate()?;
        self.value_node(value_node_id, "spring target")?;
        self.insert_new(
            spring_id,
            AnimatedNode::Spring(SpringDriverNode::new(value_node_id, config)),
        )
    }

    pub fn start_animating_node_json(
        &mut self,
        spring_id: NodeId,
        value_node_id: NodeId,
        config: JsonValue,
    ) -> Result<(), AnimatedError> {
        self.start_animating_node(spring_id, value_node_id, SpringConfig::from_json(config)?)
    }

    /// Remove spring driver `spring_id`. The driven value keeps its last value.
    pub fn stop_animation(&mut self, spring_id: NodeId) -> bool {
        match self.nodes.entry(spring_id) {
            Entry::Occupied(slot) if matches!(slot.get(), AnimatedNode::Spring(_)) => {
                slot.remove();
                true
            }
            _ => false,
        }
    }

    /// Remove any node. Nodes referring to it fail on their next evaluation.
    pub fn drop_node(&mut self, id: NodeId) -> Option<AnimatedNode> {
        self.nodes.remove(&id)
    }

    fn value_node(&self, id: NodeId, role: &'static str) -> Result<&ValueNode, AnimatedError> {
        match self.nodes.get(&id) {
            None => Err(AnimatedError::NodeNotFound(id)),
            Some(AnimatedNode::Value(node)) => Ok(node),
            Some(other) => Err(AnimatedError::UnsupportedNodeType {
                id,
                found: other.kind(),
                role,
            }),
        }
    }

    pub fn value(&self, id: NodeId) -> Result<f64, AnimatedError> {
        self.value_node(id, "value").map(|node| node.value)
    }

    pub fn set_value(&mut self, id: NodeId, value: f64) -> Result<(), AnimatedError> {
        match self.nodes.get_mut(&id) {
            None => Err(AnimatedError::NodeNotFound(id)),
            Some(AnimatedNode::Value(node)) => {
                node.value = value;
                Ok(())
            }
            Some(other) => Err(AnimatedError::UnsupportedNodeType {
                id,
                found: other.kind(),
                role: "value",
            }),
        }
    }

    pub fn spring_phase(&self, id: NodeId) -> Option<SpringPhase> {
        match self.nodes.get(&id) {
            Some(AnimatedNode::Spring(driver)) => Some(driver.phase()),
            _ => None,
        }
    }

    pub fn has_active_animations(&self) -> bool {
        self.nodes
            .values()
            .any(|node| matches!(node, AnimatedNode::Spring(d) if !d.is_finished()))
    }

    /// Springs still consuming time, with the node each one drives, in id order.
    fn active_springs(&self) -> Vec<(NodeId, NodeId)> {
        let mut active: Vec<(NodeId, NodeId)> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| match node {
                AnimatedNode::Spring(driver) if !driver.is_finished() => Some((*id, driver.drives)),
                _ => None,
            })
            .collect();
        active.sort_unstable();
        active
    }

    /// Advance every running spring to `frame_time_nanos` and write the results into
    /// the driven value nodes.
    ///
    /// All targets are validated before anything is written, so a dangling or
    /// mistyped target fails the call without moving any spring.
    pub fn run_update(&mut self, frame_time_nanos: u64) -> Result<FrameUpdate, AnimatedError> {
        let frame_time_ms = frame_time_nanos / NANOS_PER_MILLI;
        let active = self.active_springs();
        for (_, drives) in &active {
            self.value_node(*drives, "spring target")?;
        }

        let mut update = FrameUpdate {
            frame_time_ms,
            ..Default::default()
        };
        for (spring_id, drives) in active {
            let current = self.value(drives)?;
            let Some(AnimatedNode::Spring(driver)) = self.nodes.get_mut(&spring_id) else {
                continue;
            };
            let Some(next) = driver.step(frame_time_ms, current) else {
                continue;
            };
            let finished = driver.is_finished();
            if let Some(AnimatedNode::Value(node)) = self.nodes.get_mut(&drives) {
                node.value = next;
            }
            if !update.updated.contains(&drives) {
                update.updated.push(drives);
            }
            if finished {
                log::debug!("spring {spring_id} at rest at {next}");
                update.finished.push(spring_id);
            }
        }
        update.updated.sort_unstable();
        Ok(update)
    }

    /// Props for transform node `id`: `{ "decomposedMatrix": { .. } }`.
    pub fn collect_view_updates(&self, id: NodeId) -> Result<JsonMap<String, JsonValue>, AnimatedError> {
        match self.nodes.get(&id) {
            None => Err(AnimatedError::NodeNotFound(id)),
            Some(AnimatedNode::Transform(node)) => node.collect(&self.nodes),
            Some(other) => Err(AnimatedError::UnsupportedNodeType {
                id,
                found: other.kind(),
                role: "props source",
            }),
        }
    }

    /// Transform nodes reading any of `updated`, in id order.
    pub fn dependents_of(&self, updated: &[NodeId]) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| match node {
                AnimatedNode::Transform(t) if updated.iter().any(|u| t.references(*u)) => Some(*id),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;
    use serde_json::json;

    fn spring(to: f64) -> SpringConfig {
        SpringConfig {
            overshoot_clamping: false,
            rest_displacement_threshold: 0.001,
            rest_speed_threshold: 0.001,
            tension: 100.0,
            friction: 20.0,
            initial_velocity: 0.0,
            to_value: to,
        }
    }

    const MS: u64 = 1_000_000;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        let err = m.create_node(1, NodeConfig::Value { value: 2.0 }).unwrap_err();
        assert_eq!(err, AnimatedError::DuplicateNode(1));
        assert_eq!(m.value(1).unwrap(), 0.0);
    }

    #[test]
    fn spring_target_must_be_a_value_node() {
        let mut m = NodesManager::new();
        assert_eq!(
            m.start_animating_node(9, 1, spring(1.0)).unwrap_err(),
            AnimatedError::NodeNotFound(1)
        );
        m.create_node_json(2, json!({"type": "transform", "animated": {}}))
            .unwrap();
        assert!(matches!(
            m.start_animating_node(9, 2, spring(1.0)),
            Err(AnimatedError::UnsupportedNodeType {
                found: NodeKind::Transform,
                ..
            })
        ));
        assert!(m.node(9).is_none());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn run_update_writes_driven_value_and_reports_finish_once() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        m.start_animating_node(10, 1, spring(1.0)).unwrap();

        let first = m.run_update(1_000 * MS).unwrap();
        assert_eq!(first.updated, vec![1]);
        assert!(first.finished.is_empty());
        assert_eq!(m.spring_phase(10), Some(SpringPhase::Running));

        let mut finished_count = 0;
        let mut t = 1_000;
        while m.has_active_animations() {
            t += 16;
            let update = m.run_update(t * MS).unwrap();
            finished_count += update.finished.len();
            assert!(t < 10_000, "spring never settled");
        }
        assert_eq!(finished_count, 1);
        assert!((m.value(1).unwrap() - 1.0).abs() <= 0.001);
        assert!(m.run_update((t + 16) * MS).unwrap().is_empty());
    }

    #[test]
    fn dangling_spring_target_fails_without_moving_others() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        m.create_node(2, NodeConfig::Value { value: 0.0 }).unwrap();
        m.start_animating_node(10, 1, spring(1.0)).unwrap();
        m.start_animating_node(11, 2, spring(1.0)).unwrap();
        m.run_update(0).unwrap();
        m.drop_node(2);

        assert_eq!(m.run_update(16 * MS).unwrap_err(), AnimatedError::NodeNotFound(2));
        assert_eq!(m.value(1).unwrap(), 0.0);

        assert!(m.stop_animation(11));
        let update = m.run_update(32 * MS).unwrap();
        assert_eq!(update.updated, vec![1]);
        assert!(m.value(1).unwrap() > 0.0);
    }

    #[test]
    fn stop_animation_only_removes_springs() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.5 }).unwrap();
        assert!(!m.stop_animation(1));
        m.start_animating_node(2, 1, spring(1.0)).unwrap();
        assert!(m.stop_animation(2));
        assert!(!m.stop_animation(2));
        assert_eq!(m.value(1).unwrap(), 0.5);
    }

    #[test]
    fn set_value_rejects_non_value_nodes() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        m.start_animating_node(2, 1, spring(1.0)).unwrap();
        m.set_value(1, 3.0).unwrap();
        assert_eq!(m.value(1).unwrap(), 3.0);
        assert!(matches!(
            m.set_value(2, 1.0),
            Err(AnimatedError::UnsupportedNodeType { id: 2, .. })
        ));
        assert_eq!(m.set_value(7, 1.0).unwrap_err(), AnimatedError::NodeNotFound(7));
    }

    #[test]
    fn dependents_are_transforms_reading_updated_nodes() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        m.create_node(2, NodeConfig::Value { value: 0.0 }).unwrap();
        m.create_node_json(20, json!({"type": "transform", "animated": {"x": 2}}))
            .unwrap();
        m.create_node_json(10, json!({"type": "transform", "animated": {"x": 1, "y": 2}}))
            .unwrap();
        assert_eq!(m.dependents_of(&[2]), vec![10, 20]);
        assert_eq!(m.dependents_of(&[1]), vec![10]);
        assert!(m.dependents_of(&[3]).is_empty());
    }

    #[test]
    fn collect_view_updates_requires_a_transform() {
        let mut m = NodesManager::new();
        m.create_node(1, NodeConfig::Value { value: 0.0 }).unwrap();
        assert!(matches!(
            m.collect_view_updates(1),
            Err(AnimatedError::UnsupportedNodeType {
                found: NodeKind::Value,
                ..
            })
        ));
        assert_eq!(m.collect_view_updates(4).unwrap_err(), AnimatedError::NodeNotFound(4));
    }
}
