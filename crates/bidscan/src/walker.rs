//! Depth-first dataset walker
//!
//! Yields every regular file under the root, one at a time, in pre-order.
//! Nothing is collected: the consumer does its work per file while the walk
//! holds one open listing per directory level.
//!
//! # Failure policy
//!
//! - A directory that cannot be listed because of permissions becomes a
//!   [`WalkEvent::AccessDenied`]; its subtree is skipped and the walk goes on
//!   with the next sibling.
//! - Any other listing error is yielded as `Err` and the caller is expected to
//!   stop.
//!
//! Symlinks are never followed, so the walk always terminates.

use crate::error::{BidscanError, Result};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    path: PathBuf,
    depth: usize,
}

impl DirectoryEntry {
    /// Full path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Depth below the root; files directly in the root are at depth 1
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// One step of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    File(DirectoryEntry),
    AccessDenied { path: PathBuf, message: String },
}

/// Builder for a walk over one root.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    sort_entries: bool,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sort_entries: false,
        }
    }

    /// Visit each directory's children in file-name order.
    ///
    /// Costs one directory listing of memory per level.
    pub fn sort_entries(mut self, sort: bool) -> Self {
        self.sort_entries = sort;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start the walk. The root itself is not yielded.
    pub fn walk(&self) -> Walk {
        let mut walker = WalkDir::new(&self.root).min_depth(1).follow_links(false);
        if self.sort_entries {
            walker = walker.sort_by_file_name();
        }
        Walk {
            inner: walker.into_iter(),
            dirs_scanned: 0,
        }
    }
}

/// Lazy iterator over a dataset tree.
pub struct Walk {
    inner: walkdir::IntoIter,
    dirs_scanned: u64,
}

impl Walk {
    /// Directories entered so far, not counting the root
    pub fn dirs_scanned(&self) -> u64 {
        self.dirs_scanned
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        self.dirs_scanned += 1;
                        continue;
                    }
                    if !file_type.is_file() {
                        // symlinks, sockets, fifos, devices
                        continue;
                    }
                    let depth = entry.depth();
                    return Some(Ok(WalkEvent::File(DirectoryEntry {
                        path: entry.into_path(),
                        depth,
                    })));
                }
                Err(err) if is_permission_denied(&err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let message = err
                        .io_error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| err.to_string());
                    return Some(Ok(WalkEvent::AccessDenied { path, message }));
                }
                Err(err) => return Some(Err(BidscanError::Walk(err))),
            }
        }
    }
}

fn is_permission_denied(err: &walkdir::Error) -> bool {
    err.io_error()
        .map_or(false, |e| e.kind() == io::ErrorKind::PermissionDenied)
}
