//! Serving-side model access: artifact cache and the classify operation

pub mod cache;
pub mod service;

pub use cache::{ArtifactSource, FileArtifactSource, ModelCache};
pub use service::InferenceService;
