//! Request path to file resolution.

use std::path::{Path, PathBuf};

use crate::http::response::Response;

/// Request paths longer than this are refused before touching the disk.
pub const MAX_PATH_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("path longer than {} bytes", MAX_PATH_LEN)]
    TooLong,
    #[error("path contains a parent-directory segment")]
    Traversal,
}

impl ResolveError {
    /// The fixed response a client gets for this rejection.
    pub fn response(&self) -> Response {
        match self {
            ResolveError::TooLong => Response::bad_request(),
            ResolveError::Traversal => Response::not_found(),
        }
    }
}

/// A directory of static resources.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index: index.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto a file under the root.
    ///
    /// `/` becomes the index document. Paths with `..` anywhere in them are
    /// rejected, never normalized.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ResolveError> {
        let path = if path == "/" { self.index.as_str() } else { path };

        if path.len() > MAX_PATH_LEN {
            return Err(ResolveError::TooLong);
        }
        if path.contains("..") {
            return Err(ResolveError::Traversal);
        }

        Ok(self.root.join(path.trim_start_matches('/')))
    }
}
