//! Cookie Server - single-task HTTP server with file-backed sessions
//!
//! Core library for the event loop, request framing and the session store.

pub mod config;
pub mod http;
pub mod server;
pub mod session;
