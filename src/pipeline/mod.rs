pub mod commands;
pub mod controller;

pub use controller::{PipelineController, PipelineSnapshot, ProgressListener, ProgressUpdate};
