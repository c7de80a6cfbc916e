use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::builder::{ManifestBuilder, Staleness};
use crate::scene_discovery::AssetKind;

#[derive(Parser)]
#[command(name = "scene-manifest")]
#[command(about = "Writes a files.json asset manifest into every demo scene directory")]
#[command(version)]
pub struct Cli {
    /// Directory whose subdirectories are scenes (defaults to the executable's directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log every skipped file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate files.json in every scene directory
    Generate {
        /// Report what would be written without touching the tree
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify that every scene manifest is up to date
    Check,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => default_root()?,
    };

    match cli.command.unwrap_or(Commands::Generate { dry_run: false }) {
        Commands::Generate { dry_run } => generate_command(root, dry_run),
        Commands::Check => check_command(root),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("Executable has no parent directory: {}", exe.display()))
}

fn generate_command(root: PathBuf, dry_run: bool) -> Result<()> {
    tracing::debug!(
        "Asset extensions: {}",
        AssetKind::ALL.map(|kind| kind.extension()).join(", ")
    );

    let builder = ManifestBuilder::new(&root).dry_run(dry_run);
    let report = builder
        .generate()
        .with_context(|| format!("Failed to generate manifests under {}", root.display()))?;

    let total_files: usize = report.scenes.iter().map(|scene| scene.file_count).sum();
    let verb = if dry_run { "Would write" } else { "Wrote" };
    println!(
        "{} {} manifests listing {} files",
        verb,
        report.scenes.len(),
        total_files
    );

    Ok(())
}

fn check_command(root: PathBuf) -> Result<()> {
    let builder = ManifestBuilder::new(&root);
    let report = builder
        .check()
        .with_context(|| format!("Failed to check manifests under {}", root.display()))?;

    for stale in &report.stale {
        match &stale.staleness {
            Staleness::Missing => println!("✗ {}: manifest missing", stale.scene_dir.display()),
            Staleness::Unreadable(reason) => {
                println!("✗ {}: manifest unreadable ({})", stale.scene_dir.display(), reason)
            }
            Staleness::Outdated { expected, found } => {
                let diff = found.diff(expected);
                let first = diff
                    .added
                    .first()
                    .map(|path| format!(", first: +{}", path))
                    .or_else(|| diff.removed.first().map(|path| format!(", first: -{}", path)))
                    .unwrap_or_default();
                println!(
                    "✗ {}: manifest outdated ({} added, {} removed{})",
                    stale.scene_dir.display(),
                    diff.added.len(),
                    diff.removed.len(),
                    first
                )
            }
        }
    }

    if report.stray_root_manifest {
        println!("✗ {}: stray root manifest", root.display());
    }

    if !report.is_clean() {
        return Err(anyhow!(
            "{} of {} scene manifests are stale",
            report.stale.len(),
            report.scenes_checked
        ));
    }

    println!("✓ {} scene manifests up to date", report.scenes_checked);

    Ok(())
}
