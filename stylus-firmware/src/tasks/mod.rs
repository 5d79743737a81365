//! Embassy tasks
//!
//! Each task runs independently and communicates via channels.

mod engine;
mod host;

pub use engine::{engine_task, PlotterOutput};
pub use host::host_task;
