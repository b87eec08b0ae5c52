mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_overworld, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{RenderError, Renderer};
