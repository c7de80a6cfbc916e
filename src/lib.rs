pub mod scene_discovery;
pub mod manifest;
pub mod builder;
pub mod cli;

pub use builder::ManifestBuilder;
pub use manifest::SceneManifest;
