//! Loaded-model cache
//!
//! The first `get_pipeline` call reads the artifact; later calls share the
//! same `Arc` until `invalidate`. Loading happens under the write lock, so
//! concurrent first callers wait on one load instead of each starting their
//! own.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SpamError};
use crate::model::artifact;
use crate::model::pipeline::SpamPipeline;

/// Where the cache gets its pipeline from
#[async_trait::async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn load(&self) -> Result<SpamPipeline>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Artifact file on local storage
pub struct FileArtifactSource {
    path: PathBuf,
}

impl FileArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ArtifactSource for FileArtifactSource {
    async fn load(&self) -> Result<SpamPipeline> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || artifact::load(&path))
            .await
            .map_err(|e| SpamError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct ModelCache {
    source: Arc<dyn ArtifactSource>,
    current: RwLock<Option<Arc<SpamPipeline>>>,
    loads: AtomicU64,
}

impl ModelCache {
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            loads: AtomicU64::new(0),
        }
    }

    /// Cache backed by an artifact file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileArtifactSource::new(path)))
    }

    pub async fn get_pipeline(&self) -> Result<Arc<SpamPipeline>> {
        if let Some(pipeline) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(pipeline));
        }

        let mut slot = self.current.write().await;
        // Another caller may have finished loading while we waited
        if let Some(pipeline) = slot.as_ref() {
            debug!("Model cache filled by a concurrent load");
            return Ok(Arc::clone(pipeline));
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        info!("Loading model from {}", self.source.describe());
        let pipeline = match self.source.load().await {
            Ok(pipeline) => Arc::new(pipeline),
            Err(e) => {
                warn!("Model load from {} failed: {}", self.source.describe(), e);
                return Err(e);
            }
        };

        *slot = Some(Arc::clone(&pipeline));
        Ok(pipeline)
    }

    /// Drop the cached pipeline; the next `get_pipeline` re-reads storage.
    /// Callers already holding the old `Arc` keep using it.
    pub async fn invalidate(&self) {
        let mut slot = self.current.write().await;
        if slot.take().is_some() {
            info!("Model cache invalidated");
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Number of times the source has been read
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }
}
