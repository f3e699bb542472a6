//! Player identity and per-round state
//!
//! This module defines the identifier handed out to every participant and
//! the `Player` record a game keeps for them: lives, host flag, and the
//! number submitted for the current round.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

/// A unique identifier for a player in a game session
///
/// The ID is stable for the lifetime of the session and is the only key
/// used to address a player; display names are never used as keys.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random player ID
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
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A participant of a game session
///
/// A player is eliminated exactly when their lives reach zero; from then on
/// their lives never change and they take no further part in rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: Id,
    name: String,
    lives: u32,
    host: bool,
    /// Number submitted for the current round, absent until they submit
    submission: Option<u64>,
}

impl Player {
    /// Creates a player who has not yet submitted anything
    ///
    /// # Arguments
    ///
    /// * `id` - The player's unique ID
    /// * `name` - The validated display name
    /// * `lives` - Number of lives to start with
    /// * `host` - Whether this player controls the session
    pub fn new(id: Id, name: String, lives: u32, host: bool) -> Self {
        Self {
            id,
            name,
            lives,
            host,
            submission: None,
        }
    }

    /// Returns the player's ID
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the player's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the player's remaining lives
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Returns whether this player is the session host
    pub fn is_host(&self) -> bool {
        self.host
    }

    /// Returns whether this player has run out of lives
    pub fn is_eliminated(&self) -> bool {
        self.lives == 0
    }

    /// Returns whether this player is still taking part in rounds
    pub fn is_active(&self) -> bool {
        !self.is_eliminated()
    }

    /// Returns whether this player has submitted in the current round
    pub fn has_submitted(&self) -> bool {
        self.submission.is_some()
    }

    /// Returns the number submitted in the current round, if any
    pub fn submission(&self) -> Option<u64> {
        self.submission
    }

    pub(crate) fn submit(&mut self, number: u64) {
        self.submission = Some(number);
    }

    pub(crate) fn clear_submission(&mut self) {
        self.submission = None;
    }

    /// Removes up to `count` lives, clamping at zero
    ///
    /// Returns the number of lives actually lost.
    pub(crate) fn lose_lives(&mut self, count: u32) -> u32 {
        let lost = count.min(self.lives);
        self.lives -= lost;
        lost
    }
}
