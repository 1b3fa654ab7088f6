//! # Painani
//!
//! Core game logic for a buzzer quiz played on a board of categories and
//! point values. Teams race for the buzzer, answer the open question, and
//! win or lose its value; a wrong answer rebounds the question to the teams
//! that have not tried it yet.
//!
//! The crate is split into layers:
//!
//! * [`board`] holds the board data model and its loaders, including the
//!   built-in sample board and random sampling from a question bank.
//! * [`game`] holds [`game::GameSession`], the transport-agnostic state
//!   machine.
//! * [`room`] maps tagged client requests onto a session, fans results out
//!   to every connection through the [`session::Tunnel`] seam, and drives
//!   the answer countdown through host-scheduled alarms.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod board;
pub mod constants;
pub mod game;
pub mod room;
pub mod session;
pub mod watcher;

pub use board::{Board, TileId, TileStatus};
pub use game::GameSession;
pub use room::{AlarmMessage, IncomingMessage, Room, SyncMessage, UpdateMessage};
