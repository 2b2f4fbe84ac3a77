//! Error types for VRML import and export.
//!
//! Every parse or write step returns a [`VrmlResult`]; the enclosing operation
//! stops at the first failure. [`ErrorStatus`] is the flat status code kept on
//! the scene after each operation.

use std::io;

use thiserror::Error;

/// Status of the last scene operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorStatus {
    #[default]
    Ok,
    EndOfFile,
    NotVrmlFile,
    VrmlFormatError,
    StringInputError,
    NumericInputError,
    IrrelevantNumber,
    UnrecoverableError,
    GeneralError,
    NotImplemented,
    NodeNameUnknown,
}

/// Errors that can occur while reading or writing VRML.
#[derive(Error, Debug)]
pub enum VrmlError {
    #[error("Unexpected end of file")]
    EndOfFile,

    #[error("Not a VRML 2.0 file (missing \"#VRML V2.0\" header)")]
    NotVrmlFile,

    #[error("VRML format error: {0}")]
    Format(String),

    #[error("Expected a word")]
    StringInput,

    #[error("Invalid number: {0:?}")]
    NumericInput(String),

    #[error("Value {0} must be strictly positive")]
    IrrelevantNumber(f64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Allocation failure: {0}")]
    Allocation(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Unknown node name: {0:?}")]
    NodeNameUnknown(String),
}

impl VrmlError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Flat status code for this error.
    pub fn status(&self) -> ErrorStatus {
        match self {
            VrmlError::EndOfFile => ErrorStatus::EndOfFile,
            VrmlError::NotVrmlFile => ErrorStatus::NotVrmlFile,
            VrmlError::Format(_) => ErrorStatus::VrmlFormatError,
            VrmlError::StringInput => ErrorStatus::StringInputError,
            VrmlError::NumericInput(_) => ErrorStatus::NumericInputError,
            VrmlError::IrrelevantNumber(_) => ErrorStatus::IrrelevantNumber,
            VrmlError::Io(err) if is_recoverable(err.kind()) => ErrorStatus::GeneralError,
            VrmlError::Io(_) | VrmlError::Allocation(_) => ErrorStatus::UnrecoverableError,
            VrmlError::NotImplemented(_) => ErrorStatus::NotImplemented,
            VrmlError::NodeNameUnknown(_) => ErrorStatus::NodeNameUnknown,
        }
    }

    /// True for failures that invalidate the whole stream.
    pub fn is_unrecoverable(&self) -> bool {
        self.status() == ErrorStatus::UnrecoverableError
    }
}

/// Stream failures that leave the stream itself usable.
fn is_recoverable(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::InvalidData
    )
}

/// An import failure with the input line at which it happened.
#[derive(Error, Debug)]
#[error("Parse error at line {line}: {source}")]
pub struct ImportError {
    pub line: usize,
    #[source]
    pub source: VrmlError,
}

impl ImportError {
    pub fn status(&self) -> ErrorStatus {
        self.source.status()
    }
}

/// Result type for VRML operations.
pub type VrmlResult<T> = Result<T, VrmlError>;
