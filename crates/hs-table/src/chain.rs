//! Chaining the same-named tree across many input files.

use std::path::PathBuf;

use crate::error::{Result, TableError};
use crate::file::TreeFile;
use crate::frame::Frame;

/// Concatenate `tree_name` from every file, in file order, into one frame.
///
/// The chained column set is that of the first file's tree; a later file
/// missing the tree or one of those columns fails the whole chain (silently
/// skipping a file would corrupt the aggregate). No filtering or computation
/// happens here.
pub fn chain(files: &[PathBuf], tree_name: &str) -> Result<Frame> {
    let Some((first, rest)) = files.split_first() else {
        return Err(TableError::ColumnMismatch("cannot chain an empty file list".into()));
    };

    let mut frame = TreeFile::open(first)?.tree(tree_name)?;
    for path in rest {
        let next = TreeFile::open(path)?.tree(tree_name)?;
        frame.append(&next).map_err(|e| {
            TableError::ColumnMismatch(format!("{}: tree '{tree_name}': {e}", path.display()))
        })?;
    }
    Ok(frame)
}
