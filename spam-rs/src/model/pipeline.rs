//! Trained pipeline: vectorizer and ensemble as one unit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ensemble::{EnsembleParams, SoftVotingEnsemble};
use super::types::{ClassProbabilities, InferenceResult, Label};
use super::vectorizer::TfidfVectorizer;
use crate::error::{Result, SpamError};
use crate::training::corpus::TrainingExample;
use crate::training::metrics::EvaluationReport;

/// Provenance stored alongside the learned parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub trained_at: DateTime<Utc>,
    pub crate_version: String,
    pub n_training_examples: usize,
    pub vocabulary_size: usize,
    /// Hold-out evaluation, absent when trained without a test split
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamPipeline {
    vectorizer: TfidfVectorizer,
    ensemble: SoftVotingEnsemble,
    metadata: ArtifactMetadata,
}

impl SpamPipeline {
    pub fn fit(examples: &[TrainingExample], params: &EnsembleParams) -> Result<Self> {
        let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
        let labels: Vec<Label> = examples.iter().map(|e| e.label).collect();
        Self::fit_texts(texts.as_slice(), labels.as_slice(), params)
    }

    /// Fit vectorizer and ensemble jointly on the same documents, so the
    /// ensemble's feature width is the vocabulary the vectorizer froze.
    pub fn fit_texts<S: AsRef<str>>(
        texts: &[S],
        labels: &[Label],
        params: &EnsembleParams,
    ) -> Result<Self> {
        let mut vectorizer = TfidfVectorizer::default();
        let rows = vectorizer.fit_transform(texts)?;
        let ensemble = SoftVotingEnsemble::fit(&rows, labels, params)?;
        let vocabulary_size = ensemble.n_features();

        Ok(Self {
            vectorizer,
            ensemble,
            metadata: ArtifactMetadata {
                trained_at: Utc::now(),
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                n_training_examples: texts.len(),
                vocabulary_size,
                evaluation: None,
            },
        })
    }

    /// Attach a hold-out report before the pipeline is saved
    pub fn with_evaluation(mut self, report: EvaluationReport) -> Self {
        self.metadata.evaluation = Some(report);
        self
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn ensemble(&self) -> &SoftVotingEnsemble {
        &self.ensemble
    }

    pub fn predict_proba(&self, text: &str) -> Result<ClassProbabilities> {
        let features = self.vectorizer.transform(text)?;
        self.ensemble.predict_proba(&features)
    }

    pub fn classify(&self, text: &str) -> Result<InferenceResult> {
        if text.trim().is_empty() {
            return Err(SpamError::EmptyInput);
        }
        Ok(InferenceResult::from_probabilities(self.predict_proba(text)?))
    }

    /// Cross-component consistency checks run on every decoded artifact
    pub(crate) fn validate(&self) -> Result<()> {
        let vocabulary = self
            .vectorizer
            .vocabulary()
            .ok_or_else(|| SpamError::ArtifactCorrupt("vectorizer is not fitted".to_string()))?;

        if !vocabulary.is_consistent() {
            return Err(SpamError::ArtifactCorrupt(
                "vocabulary indices are not a bijection".to_string(),
            ));
        }
        if vocabulary.len() != self.ensemble.n_features() {
            return Err(SpamError::ArtifactCorrupt(format!(
                "vocabulary has {} tokens but classifier expects {} features",
                vocabulary.len(),
                self.ensemble.n_features()
            )));
        }
        if self.metadata.vocabulary_size != vocabulary.len() {
            return Err(SpamError::ArtifactCorrupt(
                "metadata vocabulary size disagrees with payload".to_string(),
            ));
        }
        if !self.ensemble.is_consistent() {
            return Err(SpamError::ArtifactCorrupt(
                "ensemble members are malformed".to_string(),
            ));
        }
        Ok(())
    }
}
