//! Versioned on-disk format for trained pipelines.
//!
//! Layout: `[magic "SPAMPIPE"][u16 format version BE][u64 payload length BE]
//! [bincode payload][u32 CRC32 of payload BE]`.
//!
//! The version is checked before anything else in the payload is looked at; a
//! file written by a different format version is rejected outright. Writes go
//! to a temporary sibling file that is renamed over the destination only once
//! fully written and synced.

use bincode::Options;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::pipeline::{ArtifactMetadata, SpamPipeline};
use crate::error::{Result, SpamError};

pub const ARTIFACT_MAGIC: &[u8; 8] = b"SPAMPIPE";
pub const ARTIFACT_FORMAT_VERSION: u16 = 1;

const MAGIC_LEN: usize = 8;
const VERSION_LEN: usize = 2;
const HEADER_LEN: usize = MAGIC_LEN + VERSION_LEN + 8;
const FOOTER_LEN: usize = 4;

pub fn encode(pipeline: &SpamPipeline) -> Result<Vec<u8>> {
    let payload = bincode::DefaultOptions::new()
        .serialize(pipeline)
        .map_err(|e| SpamError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
    out.extend_from_slice(ARTIFACT_MAGIC);
    out.extend_from_slice(&ARTIFACT_FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc.to_be_bytes());
    Ok(out)
}

/// Format version embedded in `bytes`, after checking the magic
pub fn read_version(bytes: &[u8]) -> Result<u16> {
    if bytes.len() < MAGIC_LEN + VERSION_LEN {
        return Err(SpamError::ArtifactCorrupt("truncated header".to_string()));
    }
    if &bytes[..MAGIC_LEN] != ARTIFACT_MAGIC {
        return Err(SpamError::ArtifactCorrupt(
            "not a spam pipeline artifact".to_string(),
        ));
    }
    Ok(u16::from_be_bytes([bytes[MAGIC_LEN], bytes[MAGIC_LEN + 1]]))
}

pub fn decode(bytes: &[u8]) -> Result<SpamPipeline> {
    let version = read_version(bytes)?;
    if version != ARTIFACT_FORMAT_VERSION {
        return Err(SpamError::ArtifactVersionMismatch {
            expected: ARTIFACT_FORMAT_VERSION,
            found: version,
        });
    }

    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(SpamError::ArtifactCorrupt("truncated header".to_string()));
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[MAGIC_LEN + VERSION_LEN..HEADER_LEN]);
    let payload_len = u64::from_be_bytes(len_bytes);

    let expected_total = (HEADER_LEN + FOOTER_LEN) as u64 + payload_len;
    if bytes.len() as u64 != expected_total {
        return Err(SpamError::ArtifactCorrupt(format!(
            "expected {} bytes, found {}",
            expected_total,
            bytes.len()
        )));
    }

    let payload = &bytes[HEADER_LEN..bytes.len() - FOOTER_LEN];
    let footer = &bytes[bytes.len() - FOOTER_LEN..];
    let stored_crc = u32::from_be_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed_crc = crc32fast::hash(payload);
    if stored_crc != computed_crc {
        return Err(SpamError::ArtifactCorrupt(format!(
            "CRC32 mismatch: stored {:#010x}, computed {:#010x}",
            stored_crc, computed_crc
        )));
    }
    debug!("Artifact CRC32 verified: {:#010x}", stored_crc);

    let pipeline: SpamPipeline = bincode::DefaultOptions::new()
        .with_limit(payload_len)
        .reject_trailing_bytes()
        .deserialize(payload)
        .map_err(|e| SpamError::ArtifactCorrupt(e.to_string()))?;

    pipeline.validate()?;
    Ok(pipeline)
}

/// Atomically write `pipeline` to `destination`, returning the bytes written
pub fn save(pipeline: &SpamPipeline, destination: &Path) -> Result<u64> {
    let bytes = encode(pipeline)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(destination);
    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&tmp_path, destination)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!(
        "Saved model artifact {:?} ({} bytes, format v{}, {} features)",
        destination,
        bytes.len(),
        ARTIFACT_FORMAT_VERSION,
        pipeline.metadata().vocabulary_size
    );
    Ok(bytes.len() as u64)
}

pub fn load(source: &Path) -> Result<SpamPipeline> {
    let bytes = match fs::read(source) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SpamError::ArtifactNotFound(source.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let pipeline = decode(&bytes)?;
    info!(
        "Loaded model artifact {:?} ({} bytes, trained {})",
        source,
        bytes.len(),
        pipeline.metadata().trained_at.to_rfc3339()
    );
    Ok(pipeline)
}

pub fn inspect(source: &Path) -> Result<ArtifactMetadata> {
    load(source).map(|p| p.metadata().clone())
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(format!(".tmp-{}", uuid::Uuid::new_v4()));
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::boosting::BoostingParams;
    use crate::model::ensemble::EnsembleParams;
    use crate::model::forest::ForestParams;
    use crate::model::types::Label;
    use tempfile::TempDir;

    fn pipeline() -> SpamPipeline {
        let texts = [
            "Free entry! Claim now!",
            "See you at lunch",
            "WINNER! Claim your prize",
            "Meeting notes attached",
        ];
        let labels = [Label::Spam, Label::Ham, Label::Spam, Label::Ham];
        let params = EnsembleParams {
            forest: ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
            boosting: BoostingParams {
                n_rounds: 10,
                ..BoostingParams::default()
            },
            ..EnsembleParams::default()
        };
        SpamPipeline::fit_texts(&texts, &labels, &params).unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_pipeline() {
        let pipeline = pipeline();
        let bytes = encode(&pipeline).unwrap();
        assert_eq!(&bytes[..8], ARTIFACT_MAGIC);
        assert_eq!(read_version(&bytes).unwrap(), ARTIFACT_FORMAT_VERSION);
        assert_eq!(decode(&bytes).unwrap(), pipeline);
    }

    #[test]
    fn test_unknown_version_rejected_before_payload() {
        let mut bytes = encode(&pipeline()).unwrap();
        bytes[8..10].copy_from_slice(&7u16.to_be_bytes());
        // corrupt the payload too: the version check must win
        bytes[HEADER_LEN] ^= 0xff;

        assert!(matches!(
            decode(&bytes),
            Err(SpamError::ArtifactVersionMismatch {
                expected: ARTIFACT_FORMAT_VERSION,
                found: 7
            })
        ));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let mut bytes = encode(&pipeline()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(SpamError::ArtifactCorrupt(_))));
        assert!(matches!(decode(b"SPAM"), Err(SpamError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_flipped_payload_bit_is_corrupt() {
        let mut bytes = encode(&pipeline()).unwrap();
        let middle = HEADER_LEN + (bytes.len() - HEADER_LEN - FOOTER_LEN) / 2;
        bytes[middle] ^= 0x01;
        assert!(matches!(decode(&bytes), Err(SpamError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let bytes = encode(&pipeline()).unwrap();
        let truncated = &bytes[..bytes.len() - 10];
        assert!(matches!(decode(truncated), Err(SpamError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let pipeline = pipeline();

        let written = save(&pipeline, &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), written);

        // no temporary files left behind
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, pipeline);
        assert_eq!(inspect(&path).unwrap(), *pipeline.metadata());
    }

    #[test]
    fn test_save_replaces_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"old junk").unwrap();

        save(&pipeline(), &path).unwrap();
        assert!(load(&path).is_ok());
    }

    #[test]
    fn test_failed_save_leaves_destination_untouched() {
        let dir = TempDir::new().unwrap();
        // a directory at the destination makes the final rename fail
        let path = dir.path().join("model.bin");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), b"still here").unwrap();

        assert!(matches!(save(&pipeline(), &path), Err(SpamError::Io(_))));

        assert!(path.is_dir());
        assert_eq!(fs::read(path.join("keep.txt")).unwrap(), b"still here");
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("model.bin")]);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.bin");
        assert!(matches!(load(&path), Err(SpamError::ArtifactNotFound(p)) if p == path));
    }
}
