//! Connection management for a room
//!
//! A room is watched by any number of connections. A moderator connection
//! drives the game, while display connections (the contestants' screen,
//! scoreboards) only follow it. This module tracks who is connected in
//! which role and fans messages out to them.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use enum_map::{Enum, EnumMap};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    constants::watchers::MAX_WATCHER_COUNT,
    room::{SyncMessage, UpdateMessage},
    session::Tunnel,
};

/// A unique identifier for a connection
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The role of a connection
///
/// Both roles may send requests; the role only decides what a connection
/// is shown. Displays never see the choices of a question while answers
/// are hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum ValueKind {
    /// The operator running the game
    Moderator,
    /// A screen following the game
    Display,
}

/// Errors that can occur when managing connections
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The room has reached the maximum number of connections
    #[error("maximum number of connections reached")]
    MaximumWatchers,
}

/// All connections of a room, indexed by role
#[derive(Default, Debug)]
pub struct Watchers {
    /// Role of every connection
    mapping: HashMap<Id, ValueKind>,

    /// Connections grouped by role
    reverse_mapping: EnumMap<ValueKind, HashSet<Id>>,
}

impl Watchers {
    /// Gets every connection with a live tunnel, along with its role
    pub fn vec<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        tunnel_finder: F,
    ) -> Vec<(Id, T, ValueKind)> {
        self.mapping
            .iter()
            .filter_map(|(id, kind)| tunnel_finder(*id).map(|t| (*id, t, *kind)))
            .collect_vec()
    }

    /// Gets every connection of one role with a live tunnel
    pub fn specific_vec<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        filter: ValueKind,
        tunnel_finder: F,
    ) -> Vec<(Id, T)> {
        self.reverse_mapping[filter]
            .iter()
            .filter_map(|id| tunnel_finder(*id).map(|t| (*id, t)))
            .collect_vec()
    }

    /// Number of connections in a role
    pub fn specific_count(&self, filter: ValueKind) -> usize {
        self.reverse_mapping[filter].len()
    }

    /// Total number of connections
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether nobody is connected
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Registers a connection, or changes its role if already registered
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaximumWatchers`] if a new connection would exceed
    /// the connection limit.
    pub fn add_watcher(&mut self, watcher_id: Id, kind: ValueKind) -> Result<(), Error> {
        match self.mapping.get(&watcher_id) {
            Some(old_kind) => {
                self.reverse_mapping[*old_kind].remove(&watcher_id);
            }
            None if self.mapping.len() >= MAX_WATCHER_COUNT => {
                return Err(Error::MaximumWatchers);
            }
            None => {}
        }

        self.mapping.insert(watcher_id, kind);
        self.reverse_mapping[kind].insert(watcher_id);

        Ok(())
    }

    /// Forgets a connection, returning its role if it was registered
    pub fn remove_watcher(&mut self, watcher_id: Id) -> Option<ValueKind> {
        let kind = self.mapping.remove(&watcher_id)?;
        self.reverse_mapping[kind].remove(&watcher_id);
        Some(kind)
    }

    /// Role of a connection
    pub fn get_watcher_kind(&self, watcher_id: Id) -> Option<ValueKind> {
        self.mapping.get(&watcher_id).copied()
    }

    /// Whether a connection is registered
    pub fn has_watcher(&self, watcher_id: Id) -> bool {
        self.mapping.contains_key(&watcher_id)
    }

    /// Sends an update to a single connection
    pub fn send_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        watcher_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(watcher_id) else {
            return;
        };

        session.send_message(message);
    }

    /// Sends a full state sync to a single connection
    pub fn send_state<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &SyncMessage,
        watcher_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(watcher_id) else {
            return;
        };

        session.send_state(message);
    }

    /// Broadcasts an update to every connection
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        for (_, session, _) in self.vec(tunnel_finder) {
            session.send_message(message);
        }
    }

    /// Broadcasts an update to every connection of one role
    pub fn announce_specific<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        filter: ValueKind,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        for (_, session) in self.specific_vec(filter, tunnel_finder) {
            session.send_message(message);
        }
    }
}
