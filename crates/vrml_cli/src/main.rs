//! vrml CLI - inspect, validate and convert VRML 2.0 files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vrml_core::{read_vrml_file, write_vrml_file, LoadError, NodeKind, Scene, SceneConfig};
use vrml_math::Aabb;

#[derive(Parser)]
#[command(name = "vrml")]
#[command(about = "Inspect, validate and convert VRML 2.0 files", long_about = None)]
struct Cli {
    /// JSON file with scene settings (linear_scale, indent_step)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node graph and a shape summary
    Info {
        /// Path to the .wrl file
        file: PathBuf,
    },
    /// Re-export a file, naming shared nodes and applying a linear scale
    Convert {
        /// Input .wrl file
        input: PathBuf,
        /// Output .wrl file
        output: PathBuf,
        /// Linear scale for reading and writing lengths (overrides --config)
        #[arg(short, long)]
        scale: Option<f64>,
    },
    /// Check that a file parses; exit code 1 on failure
    Check {
        /// Path to the .wrl file
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scale = match &cli.command {
        Commands::Convert { scale, .. } => *scale,
        _ => None,
    };
    let config = load_config(cli.config.as_deref(), scale)?;

    match cli.command {
        Commands::Info { file } => show_info(&file, &config)?,
        Commands::Convert { input, output, .. } => convert(&input, &output, &config)?,
        Commands::Check { file } => return Ok(check(&file, &config)),
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Settings from the optional JSON file, with `scale` taking precedence
/// over its `linear_scale`.
fn load_config(path: Option<&Path>, scale: Option<f64>) -> Result<SceneConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SceneConfig::default(),
    };
    if let Some(scale) = scale {
        config.linear_scale = scale;
    }
    if !config.linear_scale.is_finite() || config.linear_scale <= 0.0 {
        anyhow::bail!("linear scale must be positive, got {}", config.linear_scale);
    }
    log::debug!("Using {config:?}");
    Ok(config)
}

fn open(file: &Path, config: &SceneConfig) -> Result<Scene> {
    read_vrml_file(file, config).with_context(|| format!("Failed to read {}", file.display()))
}

fn show_info(file: &Path, config: &SceneConfig) -> Result<()> {
    let scene = open(file, config)?;

    print!("{}", scene.dump());

    let info = scene.world_info();
    if !info.title.is_empty() {
        println!("Title: {}", info.title);
    }
    for line in &info.info {
        println!("Info:  {line}");
    }

    let counts = {
        let data = scene.lock();
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for node in data.nodes() {
            let label = match &node.kind {
                NodeKind::Group(g) if g.is_transform => "Transform",
                other => other.node_type().name(),
            };
            match counts.iter_mut().find(|(name, _)| *name == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }
        counts.sort();
        counts
    };
    println!("\n--- Nodes ---");
    for (label, count) in counts {
        println!("  {label:<20} {count}");
    }

    println!("\n--- Shape ---");
    match scene.shape_with_appearances() {
        (Some(shape), appearances) => {
            println!("  Faces:      {}", shape.face_count());
            println!("  Polylines:  {}", shape.wire_count());
            println!("  Bound faces: {}", appearances.len());
            print_bounds(&shape.bounds());
        }
        (None, _) => println!("  (no geometry)"),
    }
    Ok(())
}

fn print_bounds(bounds: &Aabb) {
    if bounds.is_empty() {
        return;
    }
    let (min, max) = (bounds.min(), bounds.max());
    println!(
        "  Bounds:     ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
    let size = bounds.extent();
    println!("  Size:       {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    let center = bounds.centroid();
    println!("  Center:     ({:.3}, {:.3}, {:.3})", center.x, center.y, center.z);
}

fn convert(input: &Path, output: &Path, config: &SceneConfig) -> Result<()> {
    let scene = open(input, config)?;
    write_vrml_file(&scene, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Converted {} -> {} ({} top-level nodes)",
        input.display(),
        output.display(),
        scene.top_level().len()
    );
    Ok(())
}

fn check(file: &Path, config: &SceneConfig) -> ExitCode {
    match read_vrml_file(file, config) {
        Ok(scene) => {
            println!("{}: OK ({} nodes)", file.display(), scene.node_count());
            ExitCode::SUCCESS
        }
        Err(LoadError::Import(err)) => {
            println!("{}:{}: {:?}: {}", file.display(), err.line, err.status(), err.source);
            ExitCode::FAILURE
        }
        Err(err) => {
            println!("{}: {err}", file.display());
            ExitCode::FAILURE
        }
    }
}
