use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    SceneDefinition,
    Texture,
    StlMesh,
    ObjMesh,
    CompiledModel,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::SceneDefinition,
        AssetKind::Texture,
        AssetKind::StlMesh,
        AssetKind::ObjMesh,
        AssetKind::CompiledModel,
    ];

    /// Matches case-sensitively, so `Robot.XML` is not an asset.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|kind| kind.extension() == extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AssetKind::SceneDefinition => "xml",
            AssetKind::Texture => "png",
            AssetKind::StlMesh => "stl",
            AssetKind::ObjMesh => "obj",
            AssetKind::CompiledModel => "mjb",
        }
    }
}

pub struct SceneDiscovery {
    root: PathBuf,
}

impl SceneDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Immediate child directories of the root, sorted by name.
    pub fn scene_directories(&self) -> Result<std::vec::IntoIter<PathBuf>> {
        if !self.root.is_dir() {
            return Err(anyhow!(
                "Scene root is not a directory: {}",
                self.root.display()
            ));
        }

        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read scene root: {}", self.root.display()))?;

        let mut scenes = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to read entry in {}", self.root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                scenes.push(path);
            }
        }

        scenes.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(scenes.into_iter())
    }

    /// Every asset file below `scene_dir`, as sorted `/`-separated relative paths.
    pub fn collect_assets(&self, scene_dir: &Path) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.walk(scene_dir, scene_dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn walk(&self, scene_dir: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to read entry in {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("Failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                self.walk(scene_dir, &path, files)?;
                continue;
            }

            // Regular files and symlinks to them; symlinked directories are not followed
            if !(file_type.is_file() || (file_type.is_symlink() && path.is_file())) {
                tracing::debug!("Skipping non-regular entry: {}", path.display());
                continue;
            }

            if AssetKind::from_path(&path).is_none() {
                tracing::debug!("Skipping non-asset file: {}", path.display());
                continue;
            }

            files.push(relative_path_string(scene_dir, &path)?);
        }

        Ok(())
    }
}

fn relative_path_string(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).with_context(|| {
        format!("{} is not inside {}", path.display(), base.display())
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| anyhow!("File name is not valid UTF-8: {}", path.display()))?;
            parts.push(part);
        }
    }

    Ok(parts.join("/"))
}
