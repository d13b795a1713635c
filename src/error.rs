//! Error types for semtree.
//!
//! Only tree construction and (de)serialization can fail. The merge model and the
//! accumulation engine are fail-soft: degenerate input yields a probability of zero
//! and a logged warning, never an error.

use std::io;
use thiserror::Error;

/// Result type alias for semtree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or loading a semantic tree.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A node index does not exist in the tree.
    #[error("Node {0} does not exist")]
    NodeNotFound(usize),

    /// Attaching the child would make a node its own ancestor.
    #[error("Attaching node {0} would create a cycle")]
    CycleDetected(usize),

    /// The node already has a parent.
    #[error("Node {0} is already attached to a parent")]
    AlreadyAttached(usize),

    /// The tree description is structurally invalid.
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
