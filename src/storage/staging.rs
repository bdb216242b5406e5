//! Transient upload staging
//!
//! Uploaded bytes are written to a staging directory before being
//! committed to the object store. A [`StagedFile`] removes its backing
//! file when dropped, so every stage is paired with exactly one cleanup
//! on success, validation failure, or upload failure.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::AppError;

/// Staging area for uploaded files
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Create the staging area, ensuring the directory exists.
    pub fn new(dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            AppError::Config(format!(
                "cannot create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write uploaded bytes to a transient file in the staging
    /// directory.
    pub fn stage(&self, bytes: &[u8]) -> Result<StagedFile, AppError> {
        use std::io::Write;

        let mut file = NamedTempFile::new_in(&self.dir)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to stage upload: {}", e)))?;
        file.write_all(bytes)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to stage upload: {}", e)))?;
        file.flush()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to stage upload: {}", e)))?;

        Ok(StagedFile { file })
    }
}

/// A staged upload; the transient file is removed on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged bytes back for the object-store commit.
    pub async fn read(&self) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(self.path())
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to read staged file: {}", e)))
    }
}

// =============================================================================
// MP4 duration probe
// =============================================================================

/// Probe the duration of a staged video file in seconds.
///
/// Reads the MP4 `moov`/`mvhd` box. Non-MP4 containers (or files with
/// no parseable movie header) report 0.
pub fn video_duration_seconds(path: &Path) -> f64 {
    match std::fs::read(path) {
        Ok(data) => mp4_duration(&data).unwrap_or(0.0),
        Err(error) => {
            tracing::warn!(%error, path = %path.display(), "failed to read staged video for probing");
            0.0
        }
    }
}

fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn be_u64(data: &[u8], offset: usize) -> Option<u64> {
    data.get(offset..offset + 8).map(|b| {
        u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    })
}

/// Iterate ISO-BMFF boxes in `data`, yielding (type, payload range).
fn find_box<'a>(data: &'a [u8], box_type: &[u8; 4]) -> Option<&'a [u8]> {
    let mut offset = 0usize;
    while offset + 8 <= data.len() {
        let declared = be_u32(data, offset)? as u64;
        let kind = &data[offset + 4..offset + 8];

        let (size, header) = match declared {
            // to end of enclosing container
            0 => ((data.len() - offset) as u64, 8usize),
            // 64-bit largesize follows the type
            1 => (be_u64(data, offset + 8)?, 16usize),
            _ => (declared, 8usize),
        };
        if size < header as u64 {
            return None;
        }

        let end = offset.checked_add(size as usize)?;
        if end > data.len() {
            return None;
        }
        if kind == box_type {
            return Some(&data[offset + header..end]);
        }
        offset = end;
    }
    None
}

/// Duration in seconds from the `mvhd` movie header, if present.
fn mp4_duration(data: &[u8]) -> Option<f64> {
    let moov = find_box(data, b"moov")?;
    let mvhd = find_box(moov, b"mvhd")?;

    let version = *mvhd.first()?;
    let (timescale, duration) = match version {
        // version/flags(4) creation(4) modification(4) timescale(4) duration(4)
        0 => (be_u32(mvhd, 12)? as u64, be_u32(mvhd, 16)? as u64),
        // version/flags(4) creation(8) modification(8) timescale(4) duration(8)
        1 => (be_u32(mvhd, 20)? as u64, be_u64(mvhd, 24)?),
        _ => return None,
    };

    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}
