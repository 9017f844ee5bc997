//! Talking-head chat pipeline

pub mod controller;
pub mod paths;
pub mod request;
pub mod state;

pub use controller::{Engines, PipelineController, CLONE_LANGUAGE, RECOGNITION_LOCALE};
pub use paths::PipelinePaths;
pub use request::PipelineRequest;
pub use state::{PipelineRun, PipelineState, StateTransition};
