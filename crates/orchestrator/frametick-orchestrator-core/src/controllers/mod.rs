pub mod animated;

pub use animated::{AnimatedController, PropsSink};
