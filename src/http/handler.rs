//! Request dispatch: static resources and session files.

use std::io;
use std::path::Path;

use tokio::io::AsyncWrite;
use tracing::{info, warn};

use crate::http::mime::content_type;
use crate::http::request::{Method, Request};
use crate::http::resource::{ResolveError, StaticFiles};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::{self, ResponseWriter};
use crate::session::{SessionError, SessionId, SessionStore};

/// Turns framed requests into responses.
///
/// Session and file failures become 404s for the client; only errors writing
/// to the client itself are returned.
pub struct Handler {
    files: StaticFiles,
    sessions: SessionStore,
    max_age: u64,
}

impl Handler {
    pub fn new(files: StaticFiles, sessions: SessionStore, max_age: u64) -> Self {
        Self {
            files,
            sessions,
            max_age,
        }
    }

    /// Writes the response for `request` to `stream` and returns its status.
    ///
    /// - GET with cookie: serve the path, the session is only logged.
    /// - GET without cookie: resolve the path first; only then create a new
    ///   session and serve the path with `Set-Cookie`. No cookie is sent if
    ///   the session file could not be created.
    /// - POST with cookie: append the body, empty 200 (404 if the session
    ///   does not exist).
    /// - POST without cookie: new session holding the body, serve the
    ///   session file with `Set-Cookie` (404 if it could not be created).
    pub async fn handle<W>(&mut self, request: &Request, stream: &mut W) -> io::Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        match (request.method, &request.session) {
            (Method::GET, Some(id)) => {
                info!(session = %id, path = %request.path, "GET with session");
                self.serve_path(&request.path, stream).await
            }
            (Method::GET, None) => {
                // Rejected paths never allocate a session.
                let full_path = match self.files.resolve(&request.path) {
                    Ok(full_path) => full_path,
                    Err(e) => return self.reject_path(&request.path, e, stream).await,
                };
                let id = self.new_session(&request.path).await;
                self.serve_file(&full_path, id.as_ref(), stream).await
            }
            (Method::POST, Some(id)) => {
                info!(session = %id, bytes = request.body.len(), "POST with session");
                let response = match self.sessions.append(id, &request.body).await {
                    Ok(()) => Response::ok_empty(),
                    Err(SessionError::NotFound(id)) => {
                        warn!(session = %id, "No such session");
                        Response::not_found()
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to append to session");
                        Response::not_found()
                    }
                };
                writer::send(stream, &response).await?;
                Ok(response.status)
            }
            (Method::POST, None) => {
                let Some(id) = self.new_session(&request.path).await else {
                    writer::send(stream, &Response::not_found()).await?;
                    return Ok(StatusCode::NotFound);
                };
                if let Err(e) = self.sessions.append(&id, &request.body).await {
                    warn!(session = %id, error = %e, "Failed to store POST body");
                }
                let path = self.sessions.path(&id);
                self.serve_file(&path, Some(&id), stream).await
            }
        }
    }

    /// Allocates a session and creates its file. `None` when the file could
    /// not be created, in which case no cookie must be handed out.
    async fn new_session(&mut self, path: &str) -> Option<SessionId> {
        let id = self.sessions.allocate();
        match self.sessions.create(&id).await {
            Ok(()) => Some(id),
            Err(e) => {
                warn!(session = %id, path = %path, error = %e, "Session not created, no cookie issued");
                None
            }
        }
    }

    async fn serve_path<W>(
        &self,
        path: &str,
        stream: &mut W,
    ) -> io::Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        match self.files.resolve(path) {
            Ok(full_path) => self.serve_file(&full_path, None, stream).await,
            Err(e) => self.reject_path(path, e, stream).await,
        }
    }

    async fn reject_path<W>(
        &self,
        path: &str,
        error: ResolveError,
        stream: &mut W,
    ) -> io::Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        warn!(path = %path, error = %error, "Rejected request path");
        let response = error.response();
        writer::send(stream, &response).await?;
        Ok(response.status)
    }

    async fn serve_file<W>(
        &self,
        full_path: &Path,
        cookie: Option<&SessionId>,
        stream: &mut W,
    ) -> io::Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        let opened = match tokio::fs::File::open(full_path).await {
            Ok(file) => match file.metadata().await {
                Ok(meta) if meta.is_file() => Some((file, meta.len())),
                _ => None,
            },
            Err(_) => None,
        };

        let Some((mut file, len)) = opened else {
            info!(path = %full_path.display(), "Resource not found");
            writer::send(stream, &Response::not_found()).await?;
            return Ok(StatusCode::NotFound);
        };

        let ct = content_type(&full_path.to_string_lossy());
        let response = Response::resource(len, ct, cookie.map(|id| (id, self.max_age)));
        let sent = ResponseWriter::new(&response)
            .write_with_body(stream, &mut file)
            .await?;

        info!(
            path = %full_path.display(),
            content_type = ct,
            bytes = sent,
            session = ?cookie.map(SessionId::as_str),
            "Served resource"
        );
        Ok(StatusCode::Ok)
    }
}
