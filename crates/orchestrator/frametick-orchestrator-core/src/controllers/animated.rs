use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use serde_json::{Map as JsonMap, Value as JsonValue};

use frametick_animated::{AnimatedError, FrameUpdate, NodeId, NodesManager};
use frametick_timing::{FrameInfo, FrameListener, TimingError};

/// Receives composed props for views whose transform inputs changed.
pub trait PropsSink: Send + Sync {
    fn update_view(&self, node: NodeId, props: &JsonMap<String, JsonValue>);
}

/// Frame listener owning the animated node registry.
#[derive(Default)]
pub struct AnimatedController {
    nodes: Mutex<NodesManager>,
    props_sink: OnceLock<Arc<dyn PropsSink>>,
    last_update: Mutex<Option<FrameUpdate>>,
}

impl std::fmt::Debug for AnimatedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedController")
            .field("nodes", &self.nodes)
            .field("has_props_sink", &self.props_sink.get().is_some())
            .finish()
    }
}

fn listener_error(err: AnimatedError) -> TimingError {
    TimingError::Listener {
        listener: "animated".into(),
        message: err.to_string(),
    }
}

impl AnimatedController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the props sink. Only the first call takes effect.
    pub fn set_props_sink(&self, sink: Arc<dyn PropsSink>) -> bool {
        self.props_sink.set(sink).is_ok()
    }

    /// Run `f` with exclusive access to the node registry.
    pub fn with_nodes<R>(&self, f: impl FnOnce(&mut NodesManager) -> R) -> R {
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut nodes)
    }

    /// Result of the most recent tick, if not yet taken.
    pub fn take_last_update(&self) -> Option<FrameUpdate> {
        self.last_update
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Props for every view reading a node written this frame. Views whose
    /// composition fails are skipped; the first failure is returned alongside.
    fn collect_props(
        nodes: &NodesManager,
        update: &FrameUpdate,
    ) -> (Vec<(NodeId, JsonMap<String, JsonValue>)>, Option<AnimatedError>) {
        let mut out = Vec::new();
        let mut first_err = None;
        for view in nodes.dependents_of(&update.updated) {
            match nodes.collect_view_updates(view) {
                Ok(props) => out.push((view, props)),
                Err(err) => {
                    log::warn!("props for view {view} skipped: {err}");
                    first_err.get_or_insert(err);
                }
            }
        }
        (out, first_err)
    }
}

impl FrameListener for AnimatedController {
    fn name(&self) -> &str {
        "animated"
    }

    fn on_tick(&self, frame: FrameInfo) -> Result<(), TimingError> {
        let sink = self.props_sink.get();
        let (pending, failed) = {
            let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
            let update = nodes
                .run_update(frame.frame_time_nanos)
                .map_err(listener_error)?;
            let collected = match sink {
                Some(_) => Self::collect_props(&nodes, &update),
                None => (Vec::new(), None),
            };
            *self
                .last_update
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(update);
            collected
        };
        // The sink may call back into `with_nodes`, so the registry lock is released first.
        if let Some(sink) = sink {
            for (view, props) in &pending {
                sink.update_view(*view, props);
            }
        }
        failed.map_or(Ok(()), |err| Err(listener_error(err)))
    }
}
