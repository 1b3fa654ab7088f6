//! Transport seam between a room and its connections
//!
//! The room never owns sockets. Whoever hosts it hands in a tunnel finder
//! that maps a connection [`crate::watcher::Id`] to something implementing
//! [`Tunnel`], so the same game can be served over WebSockets, a test
//! harness or anything else that can carry JSON.

use crate::room::{SyncMessage, UpdateMessage};

/// A channel to one connected client
pub trait Tunnel {
    /// Sends an incremental update
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state sync, used when a client connects
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Closes the channel
    fn close(self);
}
