//! Session identifier allocation and backing files

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Opaque session token as carried in `Cookie: id=<token>`.
///
/// Tokens double as file names, so anything that could escape the session
/// directory is refused at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Validates a client-supplied token.
    ///
    /// # Example
    ///
    /// ```
    /// # use cookie_server::session::SessionId;
    /// assert!(SessionId::parse("42").is_some());
    /// assert!(SessionId::parse("../etc/passwd").is_none());
    /// assert!(SessionId::parse("").is_none());
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        let unsafe_name = token.is_empty()
            || token.contains("..")
            || token.contains(['/', '\\', '\0']);

        if unsafe_name {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for SessionId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a session's backing file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file, truncating any previous content.
    Create,
    /// Append to an existing file; fails if the session does not exist.
    Append,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} does not exist")]
    NotFound(SessionId),
    #[error("session {id} file error: {source}")]
    Io {
        id: SessionId,
        #[source]
        source: io::Error,
    },
}

/// Maps session identifiers to files under one directory.
///
/// Not safe for concurrent writers to the same session; the event loop
/// applies session operations one at a time, in arrival order.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    next_id: u64,
}

impl SessionStore {
    /// A store whose numbering starts at 0.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: 0,
        }
    }

    /// A store whose numbering continues after the highest numeric session
    /// file already present in `dir`. A missing directory starts at 0; a
    /// file named `u64::MAX` leaves no identifier to continue with and is an
    /// error.
    pub async fn resume(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        let mut next_id = 0;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new(dir)),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let highest = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok());
            if let Some(n) = highest {
                let after = n.checked_add(1).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("session numbering exhausted in {}", dir.display()),
                    )
                })?;
                next_id = next_id.max(after);
            }
        }

        tracing::info!(dir = %dir.display(), next_id, "Resuming session numbering");
        Ok(Self { dir, next_id })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hands out the next identifier. Identifiers are never reused within one
    /// process lifetime.
    pub fn allocate(&mut self) -> SessionId {
        let id = SessionId::from(self.next_id);
        self.next_id += 1;
        id
    }

    /// Backing file of a session.
    pub fn path(&self, id: &SessionId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    pub async fn open(&self, id: &SessionId, mode: OpenMode) -> Result<File, SessionError> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Create => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true),
        };

        options.open(self.path(id)).await.map_err(|source| {
            tracing::warn!(session = %id, error = %source, "Session file error");
            if source.kind() == io::ErrorKind::NotFound && mode == OpenMode::Append {
                SessionError::NotFound(id.clone())
            } else {
                SessionError::Io {
                    id: id.clone(),
                    source,
                }
            }
        })
    }

    /// Creates (or truncates) the backing file of `id`.
    pub async fn create(&self, id: &SessionId) -> Result<(), SessionError> {
        self.open(id, OpenMode::Create).await?;
        tracing::info!(session = %id, dir = %self.dir.display(), "Created session file");
        Ok(())
    }

    /// Appends `data` to an existing session.
    pub async fn append(&self, id: &SessionId, data: &[u8]) -> Result<(), SessionError> {
        let mut file = self.open(id, OpenMode::Append).await?;
        let io_err = |source| SessionError::Io {
            id: id.clone(),
            source,
        };

        file.write_all(data).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        tracing::info!(session = %id, bytes = data.len(), "Appended to session file");
        Ok(())
    }
}
