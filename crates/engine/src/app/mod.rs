mod input;
mod loop_runner;
mod metrics;
mod presenter;

pub use input::{InputAction, InputSnapshot, PointerState};
pub use loop_runner::{
    run_app, run_app_with_metrics, AppError, Game, LoopCommand, LoopConfig, SLOW_FRAME_ENV_VAR,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
