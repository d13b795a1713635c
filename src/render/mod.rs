//! Rendering module for exporting accumulated trees.

mod json;

pub use json::{annotated_nodes, to_json, AnnotatedNode, JsonFormat, RepresentativeKind};
