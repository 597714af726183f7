//! Error taxonomy for the view.
//!
//! None of these are fatal to the frame loop: node and dispatch errors are
//! reported and skipped, machine and load errors abandon one frame or one
//! load, catalog errors stop catalog setup only.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// wrong-shaped arguments to a node update, or a dispatch target that can't
/// be found
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("{node}: expected {expected} values, got {found}")]
    InvalidLength {
        node: String,
        expected: usize,
        found: usize,
    },
    #[error("variable register index {0} is out of range (0-15)")]
    RegisterIndex(usize),
    #[error("{node}: no child at position {position}")]
    MissingChild { node: String, position: usize },
    #[error("no node mounted as '{0}'")]
    MissingTarget(String),
    #[error("{0} is not bound to a snapshot field")]
    Unbound(String),
}

/// failures reported across the machine boundary
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("program of {size} bytes does not fit ({capacity} bytes available)")]
    ProgramTooLarge { size: usize, capacity: usize },
    #[error("no program loaded")]
    NoProgram,
    #[error("program counter 0x{0:04x} is outside memory")]
    OutOfBounds(u16),
    #[error("{0}")]
    Other(String),
}

/// a program file couldn't be fetched; the current program stays
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is empty")]
    Empty(PathBuf),
}

/// the program catalog can't be used at all
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("program catalog is empty")]
    Empty,
    #[error("program catalog is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to read program catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown option {0}")]
    UnknownOption(String),
}
