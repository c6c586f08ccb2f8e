//! Tree file access.
//!
//! A tree file is a JSON document mapping tree names to trees, where a tree
//! maps column names to numeric arrays:
//!
//! ```json
//! { "events": { "pt": [31.2, 18.0], "eta": [0.4, -1.1] } }
//! ```
//!
//! All columns of one tree must have the same length. Column order within a
//! frame built from a tree is the name-sorted order, which keeps downstream
//! processing deterministic regardless of JSON key order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, TableError};
use crate::frame::Frame;

/// A parsed input file holding one or more named trees.
#[derive(Debug, Clone)]
pub struct TreeFile {
    path: PathBuf,
    trees: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl TreeFile {
    /// Open and parse a tree file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path)?;
        Self::from_bytes(&bytes, path)
    }

    /// Parse a tree file from raw bytes (`path` is kept for error context).
    pub fn from_bytes(bytes: &[u8], path: PathBuf) -> Result<Self> {
        let trees: BTreeMap<String, BTreeMap<String, Vec<f64>>> =
            serde_json::from_slice(bytes).map_err(|e| TableError::Malformed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(TreeFile { path, trees })
    }

    /// Path this file was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the trees in this file, sorted.
    pub fn tree_names(&self) -> Vec<&str> {
        self.trees.keys().map(String::as_str).collect()
    }

    /// Materialize the named tree as a [`Frame`].
    ///
    /// Fails with [`TableError::TreeMissing`] if the tree is absent and
    /// [`TableError::Malformed`] if its columns have unequal lengths.
    pub fn tree(&self, name: &str) -> Result<Frame> {
        let tree = self.trees.get(name).ok_or_else(|| TableError::TreeMissing {
            file: self.path.clone(),
            tree: name.to_string(),
            available: self.tree_names().join(", "),
        })?;
        let columns: Vec<(String, Vec<f64>)> =
            tree.iter().map(|(n, v)| (n.clone(), v.clone())).collect();
        Frame::from_columns(columns).map_err(|e| TableError::Malformed {
            path: self.path.clone(),
            reason: format!("tree '{name}': {e}"),
        })
    }
}
