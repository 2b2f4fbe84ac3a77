//! File-level entry points.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;

use crate::config::SceneConfig;
use crate::error::{ImportError, VrmlError};
use crate::scene::Scene;

/// Errors from reading or writing a VRML file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Write error: {0}")]
    Write(#[from] VrmlError),
}

/// Result type for file operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Read a `.wrl` file into a new scene.
pub fn read_vrml_file<P: AsRef<Path>>(path: P, config: &SceneConfig) -> LoadResult<Scene> {
    let path = path.as_ref();
    log::info!("Reading VRML file {}", path.display());
    let file = File::open(path)?;
    let scene = Scene::with_config(config);
    scene.read(BufReader::new(file))?;
    Ok(scene)
}

/// Read VRML text into a new scene.
pub fn read_vrml_from_string(text: &str, config: &SceneConfig) -> LoadResult<Scene> {
    let scene = Scene::with_config(config);
    scene.read(text.as_bytes())?;
    Ok(scene)
}

/// Export a scene to a file, replacing it.
pub fn write_vrml_file<P: AsRef<Path>>(scene: &Scene, path: P) -> LoadResult<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    scene.write(&mut out)?;
    log::info!("Wrote VRML file {}", path.display());
    Ok(())
}
