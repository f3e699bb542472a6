//! # Mismo Game Library
//!
//! This library provides the core game logic for Mismo, a multiplayer
//! elimination game. Every round each player submits a number; the
//! holders of the lowest and highest unique numbers lose a life, and any
//! number picked by exactly two players costs both of them a life. The
//! last player standing wins.
//!
//! The crate covers the round rules, the per-session state machine, and a
//! registry that lets many connections share sessions safely. Transport
//! (HTTP, WebSockets, polling) is left to the caller through the
//! [`session::Tunnel`] trait.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::wildcard_imports)]

pub mod constants;

pub mod game;
pub mod game_id;
pub mod names;
pub mod player;
pub mod registry;
pub mod resolution;
pub mod session;

pub use game::{Error, ErrorKind, Game, Options, Progress, Snapshot, State};
pub use game_id::GameId;
pub use player::{Id, Player};
pub use registry::Registry;
pub use session::{Session, Tunnel};
