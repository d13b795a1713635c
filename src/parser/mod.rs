//! Loading semantic trees from an extractor.

mod tree_document;

pub use tree_document::{tree_from_file, tree_from_json, tree_from_reader, NodeRecord, TreeDocument};
