//! Screenshot artifact inspection
//!
//! Screenshot bytes are not required to be stable across runs, but every
//! artifact a passed flow claims to have produced must exist and decode.
//! The report carries dimensions and a content hash so a CI harness can
//! tell artifacts apart across runs.

use std::path::{Path, PathBuf};
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{E2eError, E2eResult};

/// Fingerprint of one captured screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
}

/// Verify a captured screenshot decodes as an image and fingerprint it
pub fn inspect(name: &str, dir: &Path) -> E2eResult<ArtifactReport> {
    let path = dir.join(format!("{name}.png"));
    if !path.exists() {
        return Err(E2eError::ArtifactMissing(path.display().to_string()));
    }

    let data = std::fs::read(&path)?;

    let mut hasher = Sha256::new();
    hasher.update(&data);
    let sha256 = hex::encode(hasher.finalize());

    let img = image::load_from_memory(&data)?;
    let (width, height) = img.dimensions();

    Ok(ArtifactReport {
        name: name.to_string(),
        path,
        bytes: data.len() as u64,
        width,
        height,
        sha256,
    })
}
