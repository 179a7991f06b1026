//! Model weight resolution and cached download.
//!
//! Artifacts are fetched once into a weights directory and verified by
//! checksum; detectors then load them by path at startup. Fetch failures are
//! fatal ([`AnonymizeError::WeightsUnavailable`]) — a process without weights
//! should not start serving.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AnonymizeError;
use crate::region::RegionKind;

/// A downloadable model artifact for one detector kind.
#[derive(Debug)]
pub struct WeightsArtifact {
    /// Detector kind this artifact serves.
    pub kind: RegionKind,
    /// File name within the weights directory.
    pub filename: &'static str,
    /// Download location.
    pub url: &'static str,
    /// Expected MD5 of the artifact file.
    pub md5_checksum: &'static str,
}

/// Artifacts with a built-in backend. Plate detection has no bundled model —
/// callers plug in their own [`crate::Detector`] implementation for it.
const ARTIFACTS: [WeightsArtifact; 1] = [WeightsArtifact {
    kind: RegionKind::Face,
    filename: "seeta_fd_frontal_v1.0.bin",
    url: "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin",
    md5_checksum: "c27aa4c0a4bed2da7e0f5b6ef7e6b677",
}];

/// Serializes downloads so concurrent first use cannot fetch the same
/// artifact twice.
static DOWNLOAD_LOCK: Mutex<()> = Mutex::new(());

/// Look up the artifact for a detector kind, if one is bundled.
pub fn artifact_for(kind: RegionKind) -> Option<&'static WeightsArtifact> {
    ARTIFACTS.iter().find(|a| a.kind == kind)
}

/// Path where the weights for `kind` live under `base`.
pub fn resolve(base: &Path, kind: RegionKind) -> Result<PathBuf, AnonymizeError> {
    artifact_for(kind)
        .map(|artifact| base.join(artifact.filename))
        .ok_or_else(|| {
            AnonymizeError::WeightsUnavailable(format!(
                "no bundled weights for kind '{}'",
                kind.as_str()
            ))
        })
}

/// Default weights directory under the platform cache dir.
pub fn default_weights_dir() -> Result<PathBuf, AnonymizeError> {
    dirs::cache_dir()
        .map(|dir| dir.join("anonymizer").join("weights"))
        .ok_or_else(|| {
            AnonymizeError::WeightsUnavailable("unable to determine cache directory".into())
        })
}

/// Download and verify every bundled artifact missing from `base`.
///
/// Cached files with a matching checksum are reused; corrupt files are
/// removed and re-fetched. Safe to call from multiple threads.
pub fn ensure_available(base: &Path) -> Result<(), AnonymizeError> {
    let _guard = DOWNLOAD_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    for artifact in &ARTIFACTS {
        ensure_artifact(base, artifact)?;
    }
    Ok(())
}

fn ensure_artifact(base: &Path, artifact: &WeightsArtifact) -> Result<(), AnonymizeError> {
    let path = base.join(artifact.filename);

    if path.exists() {
        match verify_checksum(&path, artifact.md5_checksum) {
            Ok(true) => {
                log::debug!("using cached weights: {}", path.display());
                return Ok(());
            }
            Ok(false) => {
                log::warn!("cached weights have invalid checksum, re-downloading");
                fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
            }
            Err(e) => {
                log::warn!("error verifying cached weights ({e}), re-downloading");
                fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
            }
        }
    }

    download(artifact.url, &path)?;

    if !verify_checksum(&path, artifact.md5_checksum).map_err(|e| io_error(&path, e))? {
        fs::remove_file(&path).ok();
        return Err(AnonymizeError::WeightsUnavailable(format!(
            "downloaded {} failed checksum verification (expected {})",
            artifact.filename, artifact.md5_checksum
        )));
    }

    log::info!("weights downloaded and verified: {}", path.display());
    Ok(())
}

fn download(url: &str, output_path: &Path) -> Result<(), AnonymizeError> {
    log::info!("downloading weights from {url}");

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| AnonymizeError::WeightsUnavailable(format!("download failed: {e}")))?;
    let content = response
        .bytes()
        .map_err(|e| AnonymizeError::WeightsUnavailable(format!("download failed: {e}")))?;

    let mut file = fs::File::create(output_path).map_err(|e| io_error(output_path, e))?;
    file.write_all(&content)
        .map_err(|e| io_error(output_path, e))?;

    Ok(())
}

fn calculate_md5(path: &Path) -> std::io::Result<String> {
    let contents = fs::read(path)?;
    let mut hasher = md5::Context::new();
    hasher.consume(&contents);
    Ok(format!("{:x}", hasher.finalize()))
}

fn verify_checksum(path: &Path, expected_md5: &str) -> std::io::Result<bool> {
    Ok(calculate_md5(path)? == expected_md5)
}

fn io_error(path: &Path, e: std::io::Error) -> AnonymizeError {
    AnonymizeError::WeightsUnavailable(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_face_weights_path() {
        let path = resolve(Path::new("/opt/weights"), RegionKind::Face).unwrap();
        assert_eq!(
            path,
            Path::new("/opt/weights/seeta_fd_frontal_v1.0.bin")
        );
    }

    #[test]
    fn resolve_fails_for_kind_without_bundled_weights() {
        let result = resolve(Path::new("/opt/weights"), RegionKind::Plate);
        assert!(matches!(
            result,
            Err(AnonymizeError::WeightsUnavailable(_))
        ));
    }

    #[test]
    fn default_weights_dir_ends_with_crate_path() {
        let dir = default_weights_dir().unwrap();
        assert!(dir.ends_with("anonymizer/weights"));
    }

    #[test]
    fn checksum_of_known_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.bin");
        fs::write(&path, b"hello weights").unwrap();

        let md5 = calculate_md5(&path).unwrap();
        assert_eq!(md5.len(), 32);
        assert!(verify_checksum(&path, &md5).unwrap());
        assert!(!verify_checksum(&path, "00000000000000000000000000000000").unwrap());
    }

    #[test]
    fn cached_artifact_with_valid_checksum_is_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"model bytes").unwrap();
        let md5 = calculate_md5(&path).unwrap();

        // Leak the checksum to get the 'static lifetime the table uses
        let artifact = WeightsArtifact {
            kind: RegionKind::Face,
            filename: "model.bin",
            url: "https://invalid.invalid/never-fetched",
            md5_checksum: Box::leak(md5.into_boxed_str()),
        };

        // Must return Ok without touching the (unreachable) URL
        ensure_artifact(dir.path(), &artifact).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"model bytes");
    }
}
