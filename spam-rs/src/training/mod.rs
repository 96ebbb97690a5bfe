//! Offline training
//!
//! Loads a labeled CSV corpus, splits off a hold-out set, fits the pipeline
//! and writes the artifact.

pub mod corpus;
pub mod metrics;
pub mod split;
pub mod trainer;

pub use corpus::{Corpus, TrainingExample};
pub use metrics::{ClassMetrics, EvaluationReport};
pub use split::train_test_split;
pub use trainer::{evaluate, Trainer};
