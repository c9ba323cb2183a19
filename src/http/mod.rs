//! HTTP protocol implementation.
//!
//! A deliberately small subset of HTTP/1.1: one request per connection,
//! `GET /` and `POST /` only, `Cookie: id=` and `Content-Length` as the only
//! recognized headers, and `Connection: close` on every response.
//!
//! # Architecture
//!
//! - **`connection`**: Per-socket receive buffer and framing state
//! - **`parser`**: Frames and parses a request out of the receive buffer
//! - **`request`**: Parsed request representation
//! - **`handler`**: GET/POST dispatch against static files and sessions
//! - **`resource`**: Request path to file resolution
//! - **`response`**: Status codes, response builder, fixed 400/404 bodies
//! - **`writer`**: Serializes responses and streams files to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │   Accumulating   │ ← Append bytes on every readable event
//!        └──────┬───────────┘
//!               │ CRLFCRLF seen (and POST body buffered)
//!               ▼
//!        ┌──────────────────┐
//!        │     Complete     │ ← Dispatch GET/POST, write response
//!        └──────┬───────────┘
//!               │ Response written
//!               ▼
//!        ┌──────────────────┐
//!        │    Dispatched    │ → Removed from the registry
//!        └──────────────────┘
//! ```
//!
//! A disconnect while accumulating tears the connection down silently; a
//! framing error gets a 400 first.

pub mod connection;
pub mod handler;
pub mod mime;
pub mod parser;
pub mod request;
pub mod resource;
pub mod response;
pub mod writer;
