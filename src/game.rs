//! Core game logic and state management
//!
//! This module contains the `Game` struct, the state machine of a single
//! Mismo session: players join while it is waiting, the host starts it,
//! every active player submits a number each round, and the last
//! submission of a round resolves it on the spot. The host then advances
//! to the next round until at most one player is left standing.
//!
//! A `Game` is plain data with no locking of its own; see
//! [`crate::session::Session`] for the shared, lock-guarded wrapper.

use std::collections::HashMap;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    constants,
    game_id::GameId,
    names,
    player::{Id, Player},
    resolution::{self, RoundOutcome},
};

/// Represents the current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// Players may still join; nobody has submitted
    Waiting,
    /// A round is in progress and submissions are accepted
    Playing,
    /// The round was resolved; results are visible until the host advances
    RoundEnd,
    /// At most one player is left; nothing more can happen
    GameOver,
}

/// Configuration options for a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Options {
    /// Lives every player starts with
    #[garde(range(min = 1, max = constants::game::MAX_STARTING_LIVES))]
    starting_lives: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            starting_lives: constants::game::STARTING_LIVES,
        }
    }
}

impl Options {
    /// Creates options with a custom number of starting lives
    ///
    /// The value is checked by [`Validate::validate`], not here.
    pub fn new(starting_lives: u32) -> Self {
        Self { starting_lives }
    }

    /// Returns the number of lives players start with
    pub fn starting_lives(&self) -> u32 {
        self.starting_lives
    }
}

/// Broad categories of rejected operations
///
/// Adapters can use these to pick a response (e.g. an HTTP status) without
/// matching on every individual rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The session or player does not exist
    NotFound,
    /// The operation is not allowed in the current phase
    InvalidPhase,
    /// The requester is not allowed to perform the operation
    Unauthorized,
    /// The operation's preconditions are not met
    PreconditionFailed,
}

/// Reasons a game operation can be rejected
///
/// Every rejection leaves the game untouched.
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Players can only join while the game is waiting
    #[error("game has already started")]
    GameAlreadyStarted,
    /// The operation is reserved for the host
    #[error("only the host can do this")]
    NotHost,
    /// The host asked to start a game that is not waiting anymore
    #[error("game was already started")]
    AlreadyStarted,
    /// Not enough players have joined to start
    #[error("at least 3 players are required to start the game")]
    TooFewPlayers,
    /// Numbers can only be submitted while a round is in progress
    #[error("game is not accepting numbers right now")]
    NotPlaying,
    /// No player with this ID is part of the game
    #[error("player not found in this game")]
    PlayerUnknown,
    /// Eliminated players cannot submit anymore
    #[error("player is eliminated")]
    AlreadyEliminated,
    /// Each player submits once per round
    #[error("player has already submitted this round")]
    AlreadySubmitted,
    /// The next round can only begin once the current one is resolved
    #[error("round not completed yet")]
    RoundNotComplete,
    /// The game has ended
    #[error("game is already over")]
    GameAlreadyOver,
    /// The requested display name was refused
    #[error("invalid name: {0}")]
    InvalidName(#[from] names::Error),
}

impl Error {
    /// Returns the broad category of this rejection
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlayerUnknown => ErrorKind::NotFound,
            Self::GameAlreadyStarted
            | Self::AlreadyStarted
            | Self::NotPlaying
            | Self::RoundNotComplete
            | Self::GameAlreadyOver => ErrorKind::InvalidPhase,
            Self::NotHost => ErrorKind::Unauthorized,
            Self::TooFewPlayers
            | Self::AlreadyEliminated
            | Self::AlreadySubmitted
            | Self::InvalidName(_) => ErrorKind::PreconditionFailed,
        }
    }
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Progress {
    /// The round is still waiting on other players
    Waiting {
        /// Active players who have not submitted yet
        remaining: usize,
    },
    /// This submission completed the round, which has been resolved
    Resolved(RoundOutcome),
}

/// What a viewer is allowed to know about a player
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    /// The player's ID
    pub id: Id,
    /// The player's display name
    pub name: String,
    /// Remaining lives
    pub lives: u32,
    /// Whether the player is out of the game
    pub eliminated: bool,
    /// Whether the player hosts the session
    pub host: bool,
    /// Whether the player has submitted in the current round
    pub submitted: bool,
    /// The submitted number, only shown to the player themselves
    pub number: Option<u64>,
}

/// Read-only view of a game, taken at a single point in time
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// The session ID
    pub id: GameId,
    /// The current phase
    pub state: State,
    /// The current round number
    pub round: u32,
    /// Every player, in join order
    pub players: Vec<PlayerView>,
    /// Report of the most recently resolved round
    pub last_round: Option<RoundOutcome>,
    /// The last player standing, once the game is over
    pub winner: Option<Id>,
}

impl Snapshot {
    /// Converts the snapshot to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A single Mismo game session
#[derive(Debug, Serialize, Deserialize)]
pub struct Game {
    /// The session ID
    id: GameId,
    /// Options chosen when the session was created
    options: Options,
    /// All players ever admitted, by ID
    players: HashMap<Id, Player>,
    /// Player IDs in join order
    order: Vec<Id>,
    /// Current phase of the game
    state: State,
    /// Current round, starting at 1
    round: u32,
    /// Report of the most recently resolved round
    last_round: Option<RoundOutcome>,
}

// Accessors
impl Game {
    /// Returns the session ID
    pub fn id(&self) -> GameId {
        self.id
    }

    /// Returns the current phase
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the current round number
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns the options the session was created with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Looks up a player by ID
    pub fn player(&self, id: Id) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Iterates over all players in join order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    /// Number of players who are not eliminated
    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.is_active()).count()
    }

    /// Report of the most recently resolved round
    pub fn last_round(&self) -> Option<&RoundOutcome> {
        self.last_round.as_ref()
    }

    /// The last player standing, once the game is over
    ///
    /// Returns `None` while the game is running, or if the final round
    /// eliminated everyone who was left.
    pub fn winner(&self) -> Option<&Player> {
        if self.state != State::GameOver {
            return None;
        }
        self.players().find(|p| p.is_active())
    }

    /// Takes a snapshot of the game as seen by `viewer`
    ///
    /// A player's own submitted number is only included for that player.
    /// Passing `None` gives the public view with no numbers at all.
    pub fn snapshot(&self, viewer: Option<Id>) -> Snapshot {
        Snapshot {
            id: self.id,
            state: self.state,
            round: self.round,
            players: self
                .players()
                .map(|p| PlayerView {
                    id: p.id(),
                    name: p.name().to_owned(),
                    lives: p.lives(),
                    eliminated: p.is_eliminated(),
                    host: p.is_host(),
                    submitted: p.has_submitted(),
                    number: p.submission().filter(|_| viewer == Some(p.id())),
                })
                .collect(),
            last_round: self.last_round.clone(),
            winner: self.winner().map(Player::id),
        }
    }

    /// Ensures `requester` exists and is the host
    fn authorize_host(&self, requester: Id) -> Result<(), Error> {
        match self.players.get(&requester) {
            None => Err(Error::PlayerUnknown),
            Some(player) if !player.is_host() => Err(Error::NotHost),
            Some(_) => Ok(()),
        }
    }
}

impl Game {
    /// Creates an empty game waiting for players
    ///
    /// # Arguments
    ///
    /// * `id` - The session ID
    /// * `options` - Already validated session options
    pub fn new(id: GameId, options: Options) -> Self {
        Self {
            id,
            options,
            players: HashMap::new(),
            order: Vec::new(),
            state: State::Waiting,
            round: 1,
            last_round: None,
        }
    }

    /// Adds a player to a waiting game
    ///
    /// The first player ever added becomes the host.
    ///
    /// # Arguments
    ///
    /// * `name` - The requested display name
    ///
    /// # Returns
    ///
    /// The newly created player
    ///
    /// # Errors
    ///
    /// * `Error::GameAlreadyStarted` - The game has left the waiting state
    /// * `Error::InvalidName` - The name failed validation
    pub fn add_player(&mut self, name: &str) -> Result<Player, Error> {
        if self.state != State::Waiting {
            return Err(Error::GameAlreadyStarted);
        }
        let name = names::validate(name)?;

        let host = self.players.is_empty();
        let player = Player::new(Id::new(), name, self.options.starting_lives, host);
        let id = player.id();

        self.players.insert(id, player.clone());
        self.order.push(id);

        debug!(game = %self.id, player = %id, host, "player joined");

        Ok(player)
    }

    /// Starts the game on behalf of the host
    ///
    /// # Errors
    ///
    /// * `Error::PlayerUnknown` - The requester is not in this game
    /// * `Error::NotHost` - The requester is not the host
    /// * `Error::AlreadyStarted` - The game is not waiting anymore
    /// * `Error::TooFewPlayers` - Fewer than three players have joined
    pub fn start(&mut self, requester: Id) -> Result<(), Error> {
        self.authorize_host(requester)?;
        if self.state != State::Waiting {
            return Err(Error::AlreadyStarted);
        }
        if self.players.len() < constants::game::MIN_PLAYERS {
            return Err(Error::TooFewPlayers);
        }

        self.state = State::Playing;

        info!(game = %self.id, players = self.players.len(), "game started");

        Ok(())
    }

    /// Records a player's number for the current round
    ///
    /// If this was the last active player to submit, the round is resolved
    /// before returning and the game moves to `RoundEnd` or `GameOver`.
    ///
    /// # Errors
    ///
    /// * `Error::NotPlaying` - No round is in progress
    /// * `Error::PlayerUnknown` - The player is not in this game
    /// * `Error::AlreadyEliminated` - The player has no lives left
    /// * `Error::AlreadySubmitted` - The player already submitted this round
    pub fn submit(&mut self, player_id: Id, number: u64) -> Result<Progress, Error> {
        if self.state != State::Playing {
            return Err(Error::NotPlaying);
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Error::PlayerUnknown)?;
        if player.is_eliminated() {
            return Err(Error::AlreadyEliminated);
        }
        if player.has_submitted() {
            return Err(Error::AlreadySubmitted);
        }

        player.submit(number);

        let remaining = self
            .players
            .values()
            .filter(|p| p.is_active() && !p.has_submitted())
            .count();

        debug!(game = %self.id, player = %player_id, remaining, "number submitted");

        if remaining > 0 {
            return Ok(Progress::Waiting { remaining });
        }

        Ok(Progress::Resolved(self.resolve_round()))
    }

    /// Advances from the results of a round to the next round
    ///
    /// # Errors
    ///
    /// * `Error::PlayerUnknown` - The requester is not in this game
    /// * `Error::NotHost` - The requester is not the host
    /// * `Error::GameAlreadyOver` - The game has ended
    /// * `Error::RoundNotComplete` - The current round has not been resolved
    pub fn next_round(&mut self, requester: Id) -> Result<(), Error> {
        self.authorize_host(requester)?;
        match self.state {
            State::RoundEnd => {
                self.round += 1;
                self.state = State::Playing;

                debug!(game = %self.id, round = self.round, "round started");

                Ok(())
            }
            State::GameOver => Err(Error::GameAlreadyOver),
            State::Waiting | State::Playing => Err(Error::RoundNotComplete),
        }
    }

    /// Applies the round rules to the current submissions
    ///
    /// Only reachable from `submit` once every active player has
    /// submitted, so it runs exactly once per round.
    fn resolve_round(&mut self) -> RoundOutcome {
        debug_assert_eq!(self.state, State::Playing);

        let submissions = self
            .players
            .values()
            .filter(|p| p.is_active())
            .filter_map(|p| Some((p.id(), p.submission()?)))
            .sorted_by_key(|(id, number)| (*number, *id))
            .collect_vec();

        debug_assert!(!submissions.is_empty(), "resolved a round with no submissions");

        let verdict = resolution::judge(submissions.iter().copied());
        let penalties = verdict.penalties();

        let mut lives_lost = Vec::new();
        let mut eliminated = Vec::new();

        for id in &self.order {
            let (Some(owed), Some(player)) = (penalties.get(id), self.players.get_mut(id)) else {
                continue;
            };
            lives_lost.push((*id, player.lose_lives(*owed)));
            if player.is_eliminated() {
                eliminated.push(*id);
            }
        }

        for player in self.players.values_mut() {
            player.clear_submission();
        }

        let active = self.active_count();
        self.state = if active <= 1 {
            State::GameOver
        } else {
            State::RoundEnd
        };

        let outcome = RoundOutcome {
            round: self.round,
            submissions,
            verdict,
            lives_lost,
            eliminated,
        };

        info!(
            game = %self.id,
            round = self.round,
            mismos = outcome.verdict.mismos.len(),
            eliminated = outcome.eliminated.len(),
            active,
            "round resolved"
        );

        if self.state == State::GameOver {
            info!(game = %self.id, winner = ?self.winner().map(Player::id), "game over");
        }

        self.last_round = Some(outcome.clone());

        outcome
    }
}
