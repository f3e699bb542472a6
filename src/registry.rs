//! Registry of live game sessions
//!
//! The registry maps session IDs to shared sessions. Its lock only guards
//! the map itself and is never held while a session's own lock is taken,
//! so operations on unrelated sessions never wait on each other.

use std::{collections::HashMap, sync::Arc};

use garde::Validate;
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    constants,
    game::{ErrorKind, Options},
    game_id::GameId,
    player::Id,
    session::{Session, Tunnel},
};

/// Errors that can occur when creating or looking up sessions
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No live session has this ID
    #[error("game {0} not found")]
    NotFound(GameId),
    /// No free session ID could be found
    #[error("too many live games")]
    Full,
    /// The requested options were refused
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Returns the broad category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Full | Self::InvalidOptions(_) => ErrorKind::PreconditionFailed,
        }
    }
}

/// Concurrent mapping from session ID to session
#[derive(Debug, Default)]
pub struct Registry {
    sessions: RwLock<HashMap<GameId, Arc<Session>>>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new waiting session with default options
    ///
    /// # Returns
    ///
    /// The ID of the new session, unique among live sessions
    ///
    /// # Errors
    ///
    /// Returns `Error::Full` if no free ID could be found.
    pub fn create(&self) -> Result<GameId, Error> {
        self.insert(Options::default(), GameId::new)
    }

    /// Creates a new waiting session with custom options
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOptions` if the options are out of range, or
    /// `Error::Full` if no free ID could be found.
    pub fn create_with_options(&self, options: Options) -> Result<GameId, Error> {
        options
            .validate()
            .map_err(|report| Error::InvalidOptions(report.to_string()))?;
        self.insert(options, GameId::new)
    }

    /// Stores a new session under the first free ID produced by `draw`
    ///
    /// Gives up after `MAX_ATTEMPTS` collisions, so the write lock is never
    /// held for long even when almost every ID is taken.
    fn insert(
        &self,
        options: Options,
        mut draw: impl FnMut() -> GameId,
    ) -> Result<GameId, Error> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= constants::game_id::MAX_VALUE as usize {
            return Err(Error::Full);
        }

        let id = std::iter::repeat_with(&mut draw)
            .take(constants::game_id::MAX_ATTEMPTS)
            .find(|id| !sessions.contains_key(id))
            .ok_or(Error::Full)
            .inspect_err(|_| warn!(live = sessions.len(), "no free game id"))?;
        sessions.insert(id, Arc::new(Session::new(id, options)));
        drop(sessions);

        info!(game = %id, starting_lives = options.starting_lives(), "game created");

        Ok(id)
    }

    /// Looks up a session by ID
    ///
    /// Only the registry lock is taken; the session itself is not locked.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no live session has this ID.
    pub fn lookup(&self, id: GameId) -> Result<Arc<Session>, Error> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    /// Removes a session and closes its players' tunnels
    ///
    /// Deciding when a session should be retired is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no live session has this ID.
    pub fn remove<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        id: GameId,
        tunnel_finder: F,
    ) -> Result<(), Error> {
        let session = self.sessions.write().remove(&id).ok_or(Error::NotFound(id))?;
        session.close_all(tunnel_finder);

        info!(game = %id, "game removed");

        Ok(())
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether there are no live sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::game::{self, Progress, State};

    struct MockTunnel {}

    impl Tunnel for MockTunnel {
        fn send_state(&self, _state: &game::Snapshot) {}

        fn close(self) {}
    }

    #[test]
    fn test_create_and_lookup() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        let id = registry.create().unwrap();
        let session = registry.lookup(id).unwrap();

        assert_eq!(session.id(), id);
        assert_eq!(session.inspect(game::Game::state), State::Waiting);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = Registry::new();
        let id = GameId::new();

        let error = registry.lookup(id).unwrap_err();
        assert_eq!(error, Error::NotFound(id));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.to_string(), format!("game {id} not found"));
    }

    #[test]
    fn test_create_with_options() {
        let registry = Registry::new();

        let id = registry.create_with_options(Options::new(3)).unwrap();
        let session = registry.lookup(id).unwrap();
        let host = session.add_player("Ada").unwrap();
        assert_eq!(host.lives(), 3);

        let error = registry.create_with_options(Options::new(0)).unwrap_err();
        assert!(matches!(error, Error::InvalidOptions(_)));
        assert_eq!(error.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookups_share_one_game() {
        let registry = Registry::new();
        let id = registry.create().unwrap();

        let first = registry.lookup(id).unwrap();
        first.add_player("Ada").unwrap();

        let second = registry.lookup(id).unwrap();
        assert_eq!(second.inspect(|game| game.players().count()), 1);
    }

    #[test]
    fn test_remove() {
        let registry = Registry::new();
        let id = registry.create().unwrap();
        let kept = registry.create().unwrap();

        assert_eq!(registry.remove(id, |_| None::<MockTunnel>), Ok(()));
        assert_eq!(registry.lookup(id).unwrap_err(), Error::NotFound(id));
        assert_eq!(
            registry.remove(id, |_| None::<MockTunnel>),
            Err(Error::NotFound(id))
        );
        assert!(registry.lookup(kept).is_ok());
    }

    #[test]
    fn test_concurrent_creates_are_unique() {
        let registry = Registry::new();

        let ids = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| {
                    let registry = &registry;
                    scope.spawn(move || {
                        (0..50)
                            .map(|_| registry.create().unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(registry.len(), 400);
    }

    #[test]
    fn test_create_gives_up_when_ids_collide() {
        let registry = Registry::new();
        let taken = registry.create().unwrap();

        let mut draws = 0;
        let result = registry.insert(Options::default(), || {
            draws += 1;
            taken
        });

        assert_eq!(result, Err(Error::Full));
        assert_eq!(Error::Full.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(draws, constants::game_id::MAX_ATTEMPTS);
        assert_eq!(registry.len(), 1);

        // the write lock was released
        assert!(registry.lookup(taken).is_ok());
        assert!(registry.create().is_ok());
    }

    #[test]
    fn test_create_skips_taken_ids() {
        let registry = Registry::new();
        let taken = registry.create().unwrap();
        let free = "000042".parse::<GameId>().unwrap();
        let free = if free == taken {
            "000043".parse().unwrap()
        } else {
            free
        };

        let mut candidates = [taken, taken, free].into_iter();
        let id = registry
            .insert(Options::default(), || candidates.next().unwrap())
            .unwrap();

        assert_eq!(id, free);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(free).unwrap().id(), free);
    }

    #[test]
    fn test_full_game_through_registry() {
        let registry = Registry::new();
        let id = registry.create().unwrap();

        let session = registry.lookup(id).unwrap();
        let players = ["Ada", "Grace", "Edsger"]
            .map(|name| session.add_player(name).unwrap().id());
        let [a, b, c] = players;

        session.start(a).unwrap();
        assert!(matches!(session.submit(a, 3), Ok(Progress::Waiting { .. })));
        assert!(matches!(session.submit(b, 7), Ok(Progress::Waiting { .. })));
        let Ok(Progress::Resolved(outcome)) = session.submit(c, 7) else {
            panic!("last submission should resolve the round");
        };

        assert_eq!(outcome.round, 1);
        let snapshot = registry.lookup(id).unwrap().snapshot(None);
        assert_eq!(snapshot.state, State::RoundEnd);
        assert_eq!(
            snapshot.players.iter().map(|p| p.lives).collect::<Vec<_>>(),
            vec![5, 6, 6]
        );

        session.next_round(a).unwrap();
        assert_eq!(session.inspect(game::Game::round), 2);
    }
}
