// src/engine/io.rs
//
// File materialization and persistence: reading staged files (signature
// verification, geometry recovery, metadata sidecar), and writing the live
// buffer plus its sidecar back out. Files are read through a memory map so
// the header checks touch only what they need before the single copy into
// the owned buffer.

use super::staging::{Image, StagedPixels};
use crate::bmp;
use crate::error::{CamstageError, Result};
use crate::jpeg;
use crate::metadata::{sidecar_path, Metadata};
use crate::ops::{ExistingFile, ImageKind, MissingFile, Timestamp};
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

/// Read, verify and measure a staged file. Returns None when the file is
/// missing and the policy says to reset instead of failing.
pub(crate) fn materialize_file(
    path: &Path,
    kind: ImageKind,
    policy: MissingFile,
) -> Result<Option<(StagedPixels, Metadata)>> {
    if !path.exists() {
        return match policy {
            MissingFile::Error => Err(CamstageError::missing_file(path_str(path))),
            MissingFile::Reset => Ok(None),
        };
    }

    let file = File::open(path).map_err(|e| CamstageError::file_read_failed(path_str(path), e))?;
    let map = unsafe { Mmap::map(&file) }
        .map_err(|e| CamstageError::file_read_failed(path_str(path), e))?;
    let bytes: &[u8] = &map;

    let (width, height) = match kind {
        ImageKind::Jpeg => {
            if !jpeg::has_signature(bytes) {
                return Err(CamstageError::signature_mismatch(path_str(path), kind));
            }
            // The file's declared dimensions are not trusted; the marker
            // stream is.
            jpeg::extract_jpeg_size(bytes)?
        }
        ImageKind::Bmp => {
            if !bmp::has_signature(bytes) {
                return Err(CamstageError::signature_mismatch(path_str(path), kind));
            }
            bmp::parse_dimensions(bytes)?
        }
        kind => return Err(CamstageError::FileKindUnsupported { kind }),
    };

    let timestamp = file
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .map(Timestamp::from)
        .unwrap_or_default();
    let data = bytes.to_vec();
    drop(map);

    let sidecar = sidecar_path(path);
    let metadata = if sidecar.exists() {
        let text = fs::read_to_string(&sidecar)
            .map_err(|e| CamstageError::file_read_failed(path_str(&sidecar), e))?;
        Metadata::from_sidecar(&text, &sidecar.to_string_lossy())?
    } else {
        Metadata::new()
    };

    debug!(path = %path.display(), %kind, width, height, len = data.len(), "loaded file");
    Ok(Some((
        StagedPixels {
            data,
            width,
            height,
            kind,
            timestamp,
        },
        metadata,
    )))
}

impl Image {
    /// Record the sink path for a later save(). Callers format paths
    /// themselves (`format!`) before handing them over.
    pub fn to_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sink = Some(path.into());
        self
    }

    /// Write the live buffer to the recorded sink path, then the metadata
    /// sidecar: non-empty metadata is written alongside, empty metadata
    /// removes any stale sidecar file.
    pub fn save(&mut self, policy: ExistingFile) -> Result<()> {
        let path = self
            .sink
            .clone()
            .ok_or_else(|| CamstageError::missing_sink(self.object_name().to_string()))?;
        if !self.has_content() {
            return Err(CamstageError::no_content(self.object_name().to_string()));
        }
        if policy == ExistingFile::Error && path.exists() {
            return Err(CamstageError::FileExists {
                path: path_str(&path).into(),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| CamstageError::file_write_failed(path_str(&path), e))?;
            }
        }
        fs::write(&path, &self.buffer)
            .map_err(|e| CamstageError::file_write_failed(path_str(&path), e))?;

        let sidecar = sidecar_path(&path);
        if self.metadata.is_empty() {
            if sidecar.exists() {
                fs::remove_file(&sidecar)
                    .map_err(|e| CamstageError::file_remove_failed(path_str(&sidecar), e))?;
            }
        } else {
            fs::write(&sidecar, self.metadata.to_sidecar())
                .map_err(|e| CamstageError::file_write_failed(path_str(&sidecar), e))?;
        }

        debug!(object = %self.object_name(), path = %path.display(),
               len = self.buffer.len(), "saved");
        Ok(())
    }
}
