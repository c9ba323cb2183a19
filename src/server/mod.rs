//! Listening socket and the connection-multiplexing event loop.

pub mod event_loop;
pub mod listener;
pub mod registry;

pub use event_loop::EventLoop;
pub use registry::{ConnectionId, Registry, RegistryError};
