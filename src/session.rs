//! Shared game sessions and message delivery
//!
//! A `Session` owns one `Game` behind its own lock. Every operation holds
//! that lock for its whole duration, so callers never observe a partially
//! applied submission or a half-resolved round. Delivery to clients goes
//! through the `Tunnel` trait and always happens after the lock has been
//! released.

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    game::{Error, Game, Options, Progress, Snapshot},
    game_id::GameId,
    player::{Id, Player},
};

/// Trait for sending messages through a communication tunnel
///
/// This trait abstracts the communication mechanism used to reach a
/// connected player. Implementations might use WebSockets, long polling,
/// or anything else; the game does not care.
pub trait Tunnel {
    /// Sends a state snapshot to the client
    ///
    /// # Arguments
    ///
    /// * `state` - The snapshot, already filtered for this client
    fn send_state(&self, state: &Snapshot);

    /// Closes the communication tunnel
    ///
    /// Closing a tunnel only drops the connection; the player stays part
    /// of the game.
    fn close(self);
}

/// A game shared between connections
#[derive(Debug)]
pub struct Session {
    id: GameId,
    game: Mutex<Game>,
}

impl Session {
    /// Creates a session around a fresh waiting game
    pub fn new(id: GameId, options: Options) -> Self {
        Self {
            id,
            game: Mutex::new(Game::new(id, options)),
        }
    }

    /// Returns the session ID
    pub fn id(&self) -> GameId {
        self.id
    }

    /// Runs an operation on the game under its lock
    ///
    /// Rejections are logged and passed through unchanged.
    fn apply<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Game) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut game = self.game.lock();
        f(&mut *game)
            .inspect_err(|error| debug!(game = %self.id, operation, %error, "operation rejected"))
    }

    /// Adds a player; see [`Game::add_player`]
    ///
    /// # Errors
    ///
    /// Returns the game's rejection unchanged.
    pub fn add_player(&self, name: &str) -> Result<Player, Error> {
        self.apply("add_player", |game| game.add_player(name))
    }

    /// Starts the game; see [`Game::start`]
    ///
    /// # Errors
    ///
    /// Returns the game's rejection unchanged.
    pub fn start(&self, requester: Id) -> Result<(), Error> {
        self.apply("start", |game| game.start(requester))
    }

    /// Submits a number, resolving the round if it was the last one;
    /// see [`Game::submit`]
    ///
    /// # Errors
    ///
    /// Returns the game's rejection unchanged.
    pub fn submit(&self, player: Id, number: u64) -> Result<Progress, Error> {
        self.apply("submit", |game| game.submit(player, number))
    }

    /// Advances to the next round; see [`Game::next_round`]
    ///
    /// # Errors
    ///
    /// Returns the game's rejection unchanged.
    pub fn next_round(&self, requester: Id) -> Result<(), Error> {
        self.apply("next_round", |game| game.next_round(requester))
    }

    /// Takes a snapshot of the game as seen by `viewer`
    pub fn snapshot(&self, viewer: Option<Id>) -> Snapshot {
        self.game.lock().snapshot(viewer)
    }

    /// Runs a read-only closure against the game under its lock
    pub fn inspect<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        f(&*self.game.lock())
    }

    /// Sends every connected player their own view of the game
    ///
    /// All snapshots are taken in one critical section so that every player
    /// sees the same moment; they are sent after the lock is released.
    ///
    /// # Arguments
    ///
    /// * `tunnel_finder` - Function to find the tunnel of a connected player
    pub fn broadcast<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) {
        let snapshots = {
            let game = self.game.lock();
            game.players()
                .map(|p| (p.id(), game.snapshot(Some(p.id()))))
                .collect::<Vec<_>>()
        };

        for (player, snapshot) in snapshots {
            if let Some(tunnel) = tunnel_finder(player) {
                tunnel.send_state(&snapshot);
            }
        }
    }

    /// Closes the tunnel of every connected player
    ///
    /// # Arguments
    ///
    /// * `tunnel_finder` - Function to find the tunnel of a connected player
    pub fn close_all<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) {
        let players = self.inspect(|game| game.players().map(Player::id).collect::<Vec<_>>());

        for player in players {
            if let Some(tunnel) = tunnel_finder(player) {
                tunnel.close();
            }
        }
    }
}
