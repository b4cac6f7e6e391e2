//! frametick-animated-core
//!
//! Animated nodes evaluated on frame ticks. Nodes live in a [`NodesManager`] keyed by
//! integer id and refer to each other only by id, so any node can be created or
//! dropped independently and references are validated when they are evaluated.
//!
//! - [`nodes::ValueNode`] holds a scalar.
//! - [`nodes::SpringDriverNode`] integrates a damped spring and writes into the value
//!   node it drives until it comes to rest.
//! - [`nodes::TransformNode`] composes the current values of other nodes plus static
//!   entries into the `decomposedMatrix` props map.

pub mod error;
pub mod manager;
pub mod nodes;
pub mod spring;
pub mod types;

pub use error::AnimatedError;
pub use manager::{FrameUpdate, NodesManager};
pub use nodes::{AnimatedNode, NodeKind, SpringDriverNode, SpringPhase, TransformNode, ValueNode};
pub use spring::Spring;
pub use types::{NodeConfig, NodeId, SpringConfig, StaticValue, DECOMPOSED_MATRIX_KEY};
