//! Filesystem utilities.
//!
//! Reading design documents from disk and writing exported designs and
//! settings without leaving half-written files behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::core::{design::Design, CoreError, CoreResult};

/// File extension used for exported design documents
pub const DESIGN_FILE_EXTENSION: &str = "json";

// =============================================================================
// Path Validation Utilities
// =============================================================================

/// Validates a local design file path for reading.
///
/// Rejects empty paths, URLs of any scheme and relative paths, and requires
/// the target to be an existing regular file.
pub fn validate_local_input_path(path: &str, label: &str) -> Result<PathBuf, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is empty"));
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(format!("{label} must be a local file path, not a URL"));
    }
    if lower.contains("://") {
        return Err(format!("{label} must be a local file path"));
    }

    let pb = PathBuf::from(trimmed);
    if !pb.is_absolute() {
        return Err(format!(
            "{label} must be an absolute path: {}",
            pb.display()
        ));
    }

    let meta =
        std::fs::metadata(&pb).map_err(|_| format!("{label} file not found: {}", pb.display()))?;
    if !meta.is_file() {
        return Err(format!("{label} is not a file: {}", pb.display()));
    }

    Ok(pb)
}

/// Validates an output path, creating its parent directory when missing
pub fn validate_output_path(path: &str, label: &str) -> Result<PathBuf, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is empty"));
    }

    let pb = PathBuf::from(trimmed);
    if !pb.is_absolute() {
        return Err(format!(
            "{label} must be an absolute path: {}",
            pb.display()
        ));
    }

    if let Some(parent) = pb.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create output directory: {}", e))?;
        }
    }

    if pb.is_dir() {
        return Err(format!("{label} points to a directory: {}", pb.display()));
    }

    Ok(pb)
}

// =============================================================================
// Design Files
// =============================================================================

/// Reads a design document as untyped JSON.
///
/// The value is left untyped so the importer can report an unknown `type`
/// before any shape errors.
pub async fn read_design_file(path: &Path) -> CoreResult<Value> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(CoreError::IoError(e)),
    };

    debug!(path = %path.display(), bytes = text.len(), "Read design file");
    serde_json::from_str(&text).map_err(|e| {
        CoreError::MalformedDesign(format!("{} is not valid JSON: {}", path.display(), e))
    })
}

/// Writes a design document as pretty-printed JSON, atomically
pub async fn write_design_file(path: &Path, design: &Design) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(design)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || atomic_write_bytes(&path, &bytes))
        .await
        .map_err(|e| CoreError::Internal(format!("Design write task failed: {}", e)))?
}

/// Default file name for an exported design
pub fn design_file_name(design: &Design) -> String {
    let stem: String = design
        .name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.trim_matches('_').is_empty() {
        design.id.clone()
    } else {
        stem
    };
    format!("{stem}.{DESIGN_FILE_EXTENSION}")
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace pattern.
///
/// The bytes go to a sibling `.tmp` file which is synced and then renamed
/// over the destination. An existing destination is moved aside to `.bak`
/// first and restored if the final rename fails.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)
}

/// Write a JSON file atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

fn sibling_path(path: &Path, suffix: &str, fallback: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_path(path, "tmp", "design")
}

fn bak_path_for(path: &Path) -> PathBuf {
    sibling_path(path, "bak", "design")
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    let bak = bak_path_for(dest);
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}
