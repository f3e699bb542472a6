//! Configuration constants for the Mismo game system
//!
//! This module contains the rule constants and validation limits used
//! throughout the game system so that every component agrees on the
//! same boundaries.

/// Game rule constants
pub mod game {
    /// Lives every player starts a session with
    pub const STARTING_LIVES: u32 = 7;
    /// Largest number of starting lives a session may be configured with
    pub const MAX_STARTING_LIVES: u32 = 99;
    /// Minimum number of players required before the host may start
    pub const MIN_PLAYERS: usize = 3;
}

/// Player name constants
pub mod names {
    /// Maximum length of a display name in characters
    pub const MAX_LENGTH: usize = 30;
}

/// Game ID constants
pub mod game_id {
    /// Number of decimal digits in a displayed game ID
    pub const DIGITS: usize = 6;
    /// Exclusive upper bound of the raw game ID value
    pub const MAX_VALUE: u32 = 1_000_000;
    /// Random draws the registry makes before giving up on finding a free ID
    pub const MAX_ATTEMPTS: usize = 64;
}
