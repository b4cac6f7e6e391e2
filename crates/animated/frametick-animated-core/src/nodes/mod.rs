//! Node variants stored in the [`NodesManager`](crate::NodesManager).

mod spring_driver;
mod transform;
mod value;

use serde::Serialize;

pub use spring_driver::{SpringDriverNode, SpringPhase};
pub use transform::TransformNode;
pub use value::ValueNode;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Value,
    Spring,
    Transform,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NodeKind::Value => "value",
            NodeKind::Spring => "spring",
            NodeKind::Transform => "transform",
        })
    }
}

#[derive(Debug, Clone)]
pub enum AnimatedNode {
    Value(ValueNode),
    Spring(SpringDriverNode),
    Transform(TransformNode),
}

impl AnimatedNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AnimatedNode::Value(_) => NodeKind::Value,
            AnimatedNode::Spring(_) => NodeKind::Spring,
            AnimatedNode::Transform(_) => NodeKind::Transform,
        }
    }

    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            AnimatedNode::Value(node) => Some(node),
            _ => None,
        }
    }
}
