use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::scene_discovery::SceneDiscovery;

pub const MANIFEST_FILE_NAME: &str = "files.json";

/// Sorted asset paths of one scene, relative to the scene directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneManifest {
    pub files: Vec<String>,
}

impl SceneManifest {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize manifest to JSON")
    }

    /// Paths `current` lists that `self` lacks, and the reverse.
    pub fn diff(&self, current: &SceneManifest) -> ManifestDiff {
        let old: BTreeSet<&String> = self.files.iter().collect();
        let new: BTreeSet<&String> = current.files.iter().collect();

        ManifestDiff {
            added: new.difference(&old).map(|path| path.to_string()).collect(),
            removed: old.difference(&new).map(|path| path.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub struct ManifestGenerator<'a> {
    discovery: &'a SceneDiscovery,
}

impl<'a> ManifestGenerator<'a> {
    pub fn new(discovery: &'a SceneDiscovery) -> Self {
        Self { discovery }
    }

    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE_NAME)
    }

    pub fn generate_manifest(&self, scene_dir: &Path) -> Result<SceneManifest> {
        let files = self
            .discovery
            .collect_assets(scene_dir)
            .with_context(|| format!("Failed to collect assets in {}", scene_dir.display()))?;

        Ok(SceneManifest { files })
    }

    pub fn write_manifest(&self, scene_dir: &Path, manifest: &SceneManifest) -> Result<PathBuf> {
        let manifest_path = Self::manifest_path(scene_dir);
        let manifest_json = manifest.to_json()?;

        fs::write(&manifest_path, manifest_json)
            .with_context(|| format!("Failed to write manifest to {}", manifest_path.display()))?;

        tracing::info!(
            "Wrote {} ({} files)",
            manifest_path.display(),
            manifest.len()
        );

        Ok(manifest_path)
    }

    pub fn read_manifest(&self, scene_dir: &Path) -> Result<SceneManifest> {
        let manifest_path = Self::manifest_path(scene_dir);

        let manifest_content = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read manifest from {}", manifest_path.display()))?;

        let manifest: SceneManifest =
            serde_json::from_str(&manifest_content).with_context(|| {
                format!("Failed to parse manifest JSON from {}", manifest_path.display())
            })?;

        Ok(manifest)
    }

    /// Deletes `root/files.json`. Returns whether a file was removed.
    pub fn remove_root_manifest(&self) -> Result<bool> {
        let manifest_path = Self::manifest_path(self.discovery.root());

        match fs::remove_file(&manifest_path) {
            Ok(()) => {
                tracing::info!("Removed stray root manifest {}", manifest_path.display());
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to remove root manifest {}", manifest_path.display())
            }),
        }
    }
}
