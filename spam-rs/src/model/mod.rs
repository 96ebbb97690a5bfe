//! Text classification model
//!
//! TF-IDF features feed a soft-voting ensemble of multinomial naive Bayes, a
//! random forest and gradient boosted trees. The fitted vectorizer and
//! ensemble travel together as a [`SpamPipeline`] and are persisted as one
//! versioned artifact.

pub mod artifact;
pub mod boosting;
pub mod ensemble;
pub mod forest;
pub mod naive_bayes;
pub mod pipeline;
pub mod sparse;
pub mod tokenizer;
pub mod tree;
pub mod types;
pub mod vectorizer;

pub use ensemble::{EnsembleParams, ProbabilisticClassifier, SoftVotingEnsemble};
pub use pipeline::{ArtifactMetadata, SpamPipeline};
pub use sparse::FeatureVector;
pub use tokenizer::Tokenizer;
pub use types::*;
pub use vectorizer::{TfidfVectorizer, Vocabulary};
