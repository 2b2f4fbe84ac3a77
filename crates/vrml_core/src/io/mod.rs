//! VRML text input and output.

pub mod cursor;
pub mod import;
pub mod reader;
pub mod writer;

pub use cursor::LineCursor;
pub use import::{Importer, NodeConstraint};
pub use reader::VrmlReader;
pub use writer::{format_real, WriteSession, VRML_HEADER};
