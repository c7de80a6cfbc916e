use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::manifest::{ManifestGenerator, SceneManifest};
use crate::scene_discovery::SceneDiscovery;

#[derive(Debug, Clone)]
pub struct SceneReport {
    pub scene_dir: PathBuf,
    pub file_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub scenes: Vec<SceneReport>,
    pub removed_root_manifest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Missing,
    Unreadable(String),
    Outdated { expected: SceneManifest, found: SceneManifest },
}

#[derive(Debug, Clone)]
pub struct StaleScene {
    pub scene_dir: PathBuf,
    pub staleness: Staleness,
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub scenes_checked: usize,
    pub stale: Vec<StaleScene>,
    pub stray_root_manifest: bool,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty() && !self.stray_root_manifest
    }
}

pub struct ManifestBuilder {
    discovery: SceneDiscovery,
    dry_run: bool,
}

impl ManifestBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            discovery: SceneDiscovery::new(root),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        self.discovery.root()
    }

    /// Rewrites every scene manifest, then drops a manifest left at the root.
    pub fn generate(&self) -> Result<GenerationReport> {
        let generator = ManifestGenerator::new(&self.discovery);
        let mut report = GenerationReport::default();

        for scene_dir in self.discovery.scene_directories()? {
            let manifest = generator.generate_manifest(&scene_dir)?;

            if self.dry_run {
                tracing::info!(
                    "Would write {} ({} files)",
                    ManifestGenerator::manifest_path(&scene_dir).display(),
                    manifest.len()
                );
            } else {
                generator.write_manifest(&scene_dir, &manifest)?;
            }

            report.scenes.push(SceneReport {
                scene_dir,
                file_count: manifest.len(),
            });
        }

        report.removed_root_manifest = if self.dry_run {
            let root_manifest = ManifestGenerator::manifest_path(self.root());
            let exists = root_manifest.exists();
            if exists {
                tracing::info!("Would remove stray root manifest {}", root_manifest.display());
            }
            exists
        } else {
            generator
                .remove_root_manifest()
                .context("Failed to clean up root manifest")?
        };

        Ok(report)
    }

    /// Compares each on-disk manifest with a fresh listing. Writes nothing.
    pub fn check(&self) -> Result<CheckReport> {
        let generator = ManifestGenerator::new(&self.discovery);
        let mut report = CheckReport::default();

        for scene_dir in self.discovery.scene_directories()? {
            report.scenes_checked += 1;
            let expected = generator.generate_manifest(&scene_dir)?;

            let staleness = if !ManifestGenerator::manifest_path(&scene_dir).is_file() {
                Some(Staleness::Missing)
            } else {
                match generator.read_manifest(&scene_dir) {
                    Ok(found) if found == expected => None,
                    Ok(found) => Some(Staleness::Outdated { expected, found }),
                    Err(err) => Some(Staleness::Unreadable(format!("{:#}", err))),
                }
            };

            if let Some(staleness) = staleness {
                tracing::debug!("Stale manifest in {}: {:?}", scene_dir.display(), staleness);
                report.stale.push(StaleScene {
                    scene_dir,
                    staleness,
                });
            }
        }

        report.stray_root_manifest = ManifestGenerator::manifest_path(self.root()).exists();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn setup_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sceneA/robot.xml");
        touch(dir.path(), "sceneA/robot.stl");
        touch(dir.path(), "sceneA/notes.txt");
        touch(dir.path(), "sceneA/meshes/base.obj");
        touch(dir.path(), "sceneB/floor.png");
        fs::create_dir(dir.path().join("sceneC")).unwrap();
        dir
    }

    fn read_json(path: &Path) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_generate_writes_every_scene() {
        let dir = setup_tree();
        let report = ManifestBuilder::new(dir.path()).generate().unwrap();

        assert_eq!(report.scenes.len(), 3);
        assert!(!report.removed_root_manifest);

        assert_eq!(
            read_json(&dir.path().join("sceneA").join(MANIFEST_FILE_NAME)),
            vec!["meshes/base.obj", "robot.stl", "robot.xml"]
        );
        assert_eq!(
            read_json(&dir.path().join("sceneB").join(MANIFEST_FILE_NAME)),
            vec!["floor.png"]
        );
        assert!(read_json(&dir.path().join("sceneC").join(MANIFEST_FILE_NAME)).is_empty());
    }

    #[test]
    fn test_generate_is_idempotent() {
        let dir = setup_tree();
        let builder = ManifestBuilder::new(dir.path());
        let manifest_path = dir.path().join("sceneA").join(MANIFEST_FILE_NAME);

        builder.generate().unwrap();
        let first = fs::read(&manifest_path).unwrap();
        builder.generate().unwrap();
        let second = fs::read(&manifest_path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_removes_root_manifest() {
        let dir = setup_tree();
        fs::write(dir.path().join(MANIFEST_FILE_NAME), "[\"stale.xml\"]").unwrap();

        let report = ManifestBuilder::new(dir.path()).generate().unwrap();

        assert!(report.removed_root_manifest);
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = setup_tree();
        fs::write(dir.path().join(MANIFEST_FILE_NAME), "[]").unwrap();

        let report = ManifestBuilder::new(dir.path())
            .dry_run(true)
            .generate()
            .unwrap();

        assert_eq!(report.scenes.len(), 3);
        assert_eq!(report.scenes[0].file_count, 3);
        assert!(report.removed_root_manifest);
        assert!(dir.path().join(MANIFEST_FILE_NAME).exists());
        assert!(!dir.path().join("sceneA").join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_generate_on_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let result = ManifestBuilder::new(dir.path().join("missing")).generate();
        assert!(result.is_err());
    }

    #[test]
    fn test_check_detects_drift() {
        let dir = setup_tree();
        let builder = ManifestBuilder::new(dir.path());

        let before = builder.check().unwrap();
        assert_eq!(before.scenes_checked, 3);
        assert_eq!(before.stale.len(), 3);
        assert!(before.stale.iter().all(|s| s.staleness == Staleness::Missing));

        builder.generate().unwrap();
        assert!(builder.check().unwrap().is_clean());

        touch(dir.path(), "sceneB/extra.mjb");
        fs::write(dir.path().join("sceneC").join(MANIFEST_FILE_NAME), "not json").unwrap();

        let after = builder.check().unwrap();
        assert_eq!(after.stale.len(), 2);
        assert_eq!(after.stale[0].scene_dir, dir.path().join("sceneB"));
        assert!(matches!(after.stale[0].staleness, Staleness::Outdated { .. }));
        assert!(matches!(after.stale[1].staleness, Staleness::Unreadable(_)));
    }

    #[test]
    fn test_check_reports_stray_root_manifest() {
        let dir = setup_tree();
        let builder = ManifestBuilder::new(dir.path());
        builder.generate().unwrap();

        fs::write(dir.path().join(MANIFEST_FILE_NAME), "[]").unwrap();
        let report = builder.check().unwrap();

        assert!(report.stale.is_empty());
        assert!(report.stray_root_manifest);
        assert!(!report.is_clean());
    }
}
