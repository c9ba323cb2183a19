//! File-backed sessions
//!
//! A session is a plain file named after its identifier inside the session
//! directory. Identifiers come from a process-wide counter and are handed to
//! clients through a `Set-Cookie: id=<token>` header.

pub mod store;

pub use store::{OpenMode, SessionError, SessionId, SessionStore};
