use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GenerateError;
use crate::models::{Manifest, MANIFEST_FILE};

/// Replaces `<dir>/info` with `manifest`.
///
/// The JSON is written to `info.tmp` first and renamed over the old
/// manifest, so a failed write leaves the previous manifest in place.
pub fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<PathBuf, GenerateError> {
    let path = dir.join(MANIFEST_FILE);
    let tmp = dir.join(format!("{}.tmp", MANIFEST_FILE));

    let fail = |reason: String| GenerateError::ManifestWrite {
        path: path.clone(),
        reason,
    };

    let json = serde_json::to_string(manifest).map_err(|e| fail(e.to_string()))?;
    fs::write(&tmp, json).map_err(|e| fail(format!("writing {}: {}", tmp.display(), e)))?;
    if let Err(e) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(fail(format!("replacing {}: {}", path.display(), e)));
    }

    Ok(path)
}

pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
