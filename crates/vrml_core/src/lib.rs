//! VRML Core - VRML 2.0 scene import, export and shape extraction.
//!
//! This crate provides:
//!
//! - **Scene graph**: `Scene`, an arena of `Node`s addressed by `NodeId`
//! - **Import**: a line-oriented reader with DEF/USE resolution; PROTO
//!   declarations and unsupported nodes are skipped
//! - **Export**: a two-pass writer that names shared nodes and emits DEF/USE
//! - **Shapes**: a faceted boundary representation of the scene geometry
//!
//! # Example
//!
//! ```no_run
//! use vrml_core::{read_vrml_file, SceneConfig};
//!
//! let scene = read_vrml_file("model.wrl", &SceneConfig::default())?;
//! print!("{}", scene.dump());
//! if let Some(shape) = scene.shape() {
//!     println!("{} faces", shape.face_count());
//! }
//! # Ok::<(), vrml_core::LoadError>(())
//! ```

pub mod brep;
pub mod config;
pub mod error;
pub mod io;
pub mod loader;
pub mod node;
pub mod scene;
mod shape;

// Re-export commonly used types
pub use brep::{AppearanceMap, Shape, ShapeKind};
pub use config::SceneConfig;
pub use error::{ErrorStatus, ImportError, VrmlError, VrmlResult};
pub use loader::{read_vrml_file, read_vrml_from_string, write_vrml_file, LoadError, LoadResult};
pub use node::{Node, NodeId, NodeKind, NodeType};
pub use scene::{Scene, SceneData};
