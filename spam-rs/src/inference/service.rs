//! Single-text inference

use std::sync::Arc;
use tracing::debug;

use super::cache::ModelCache;
use crate::error::{Result, SpamError};
use crate::model::pipeline::ArtifactMetadata;
use crate::model::types::InferenceResult;

/// Classifies text against whatever pipeline the cache currently holds.
/// Holds no other state; results are not recorded here.
#[derive(Clone)]
pub struct InferenceService {
    cache: Arc<ModelCache>,
}

impl InferenceService {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    pub async fn classify(&self, text: &str) -> Result<InferenceResult> {
        if text.trim().is_empty() {
            return Err(SpamError::EmptyInput);
        }

        let pipeline = self.cache.get_pipeline().await?;
        let result = pipeline.classify(text)?;
        debug!(
            "Classified {} chars as {} (p_spam={:.4})",
            text.len(),
            result.label,
            result.spam_probability
        );
        Ok(result)
    }

    /// Metadata of the loaded pipeline, loading it if needed
    pub async fn model_metadata(&self) -> Result<ArtifactMetadata> {
        Ok(self.cache.get_pipeline().await?.metadata().clone())
    }

    pub async fn reload(&self) -> Result<ArtifactMetadata> {
        self.cache.invalidate().await;
        self.model_metadata().await
    }
}
