//! Game ID generation and parsing
//!
//! Sessions are identified by short six-digit codes so that players can
//! read them out loud to each other when joining.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::constants::game_id::{DIGITS, MAX_VALUE};

/// A unique identifier for a game session
///
/// Displayed as a zero-padded six-digit decimal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(u32);

impl GameId {
    /// Creates a new random game ID
    pub fn new() -> Self {
        Self(fastrand::u32(0..MAX_VALUE))
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameId {
    /// Formats the game ID as a zero-padded six-digit code
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$}", self.0, width = DIGITS)
    }
}

/// Errors that can occur when parsing a game ID
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The code is not exactly six characters long
    #[error("game id must have six digits")]
    Length,
    /// The code contains something other than decimal digits
    #[error("game id must only contain digits")]
    Digits,
}

impl FromStr for GameId {
    type Err = ParseError;

    /// Parses a game ID from its six-digit representation
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the string is not exactly six decimal
    /// digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGITS {
            return Err(ParseError::Length);
        }
        // u32 parsing alone would accept a leading '+'
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::Digits);
        }
        s.parse().map(Self).map_err(|_| ParseError::Digits)
    }
}

impl Serialize for GameId {
    /// Serializes the game ID as its six-digit string
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D>(deserializer: D) -> Result<GameId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        GameId::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}
