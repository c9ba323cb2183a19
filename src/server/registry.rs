//! Connection Registry
//!
//! Owns every open client connection. Removing a connection drops it, which
//! closes its socket and frees its buffer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::task::Context;

use crate::http::connection::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connections reported readable by one readiness wait.
pub type ReadySet = BTreeSet<ConnectionId>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),
}

#[derive(Default)]
pub struct Registry {
    connections: BTreeMap<ConnectionId, Connection>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection: Connection) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, connection);
        id
    }

    /// Tears a connection down. Removing an id twice is an error: the caller
    /// has lost track of the connection's lifecycle.
    pub fn remove(&mut self, id: ConnectionId) -> Result<(), RegistryError> {
        self.connections
            .remove(&id)
            .map(drop)
            .ok_or(RegistryError::Unknown(id))
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Result<&mut Connection, RegistryError> {
        self.connections
            .get_mut(&id)
            .ok_or(RegistryError::Unknown(id))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Polls every connection's read readiness, registering `cx` with the
    /// ones that are not ready yet.
    pub fn poll_ready(&self, cx: &mut Context<'_>) -> ReadySet {
        self.connections
            .iter()
            .filter(|(_, conn)| conn.poll_read_ready(cx).is_ready())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Snapshot of the registered connections that are in `ready`, in id
    /// order. Since it is a snapshot, handling one of them may remove it
    /// from the registry without disturbing the iteration.
    pub fn ready_ids(&self, ready: &ReadySet) -> Vec<ConnectionId> {
        self.connections
            .keys()
            .filter(|id| ready.contains(id))
            .copied()
            .collect()
    }
}
