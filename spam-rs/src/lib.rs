//! spam-rs: Spam/ham email text classifier
//!
//! Classifies free-text email content as spam or legitimate ("ham") with a
//! calibrated probability.
//!
//! # Features
//!
//! - **Model**: TF-IDF features and a soft-voting ensemble of multinomial
//!   naive Bayes, a random forest and gradient boosted trees
//! - **Artifact**: Vectorizer and ensemble persisted together in one
//!   versioned, checksummed file written atomically
//! - **Serving**: Shared model cache with coalesced loading, JSON API
//! - **History**: Per-user record of past checks in SQLite
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::inference::{InferenceService, ModelCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(ModelCache::from_path("./model/spam_pipeline.bin"));
//!     let service = InferenceService::new(cache);
//!
//!     let result = service.classify("WINNER! Claim your prize").await?;
//!     println!("{} ({}%)", result.label, result.probability_display());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`model`]: Vectorizer, classifiers, pipeline and artifact format
//! - [`training`]: Corpus loading, hold-out split, evaluation
//! - [`inference`]: Model cache and inference service
//! - [`history`]: Classification history storage
//! - [`api`]: HTTP API

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod inference;
pub mod logging;
pub mod model;
pub mod training;

// Re-export commonly used types
pub use crate::config::Config;
pub use error::{Result, SpamError};
pub use model::{InferenceResult, Label, SpamPipeline};
