//! Round resolution rules
//!
//! Once every active player has submitted a number, the round is judged:
//!
//! * numbers held by exactly two players are a *mismo* and both holders
//!   lose a life;
//! * among numbers held by exactly one player, the holder of the lowest
//!   and the holder of the highest each lose a life. A player holding the
//!   only unique number is both and loses two.
//!
//! Numbers shared by three or more players are ignored by both rules.
//!
//! Judging is a pure function of the submissions. Applying the verdict to
//! players (clamping and elimination) is done by the game.

use std::collections::{BTreeMap, HashMap};

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::player::Id;

/// A number submitted by exactly two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismo {
    /// The shared number
    pub number: u64,
    /// The two players who submitted it
    pub players: [Id; 2],
}

/// A player holding an extreme unique number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extreme {
    /// The player who submitted the number
    pub player: Id,
    /// The submitted number
    pub number: u64,
}

/// The penalties a set of submissions earns, before they are applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Every mismo, ordered by number
    pub mismos: Vec<Mismo>,
    /// Holder of the lowest unique number
    pub lowest: Option<Extreme>,
    /// Holder of the highest unique number
    pub highest: Option<Extreme>,
}

impl Verdict {
    /// Lives owed by each penalized player
    ///
    /// Penalties from different rules add up, so a lone unique number
    /// costs its holder two lives.
    pub fn penalties(&self) -> HashMap<Id, u32> {
        self.mismos
            .iter()
            .flat_map(|mismo| mismo.players)
            .chain(self.lowest.map(|e| e.player))
            .chain(self.highest.map(|e| e.player))
            .counts()
            .into_iter()
            .map(|(id, count)| (id, count as u32))
            .collect()
    }

    /// Total number of lives owed across all players
    pub fn total_penalty(&self) -> u32 {
        self.penalties().values().sum()
    }
}

/// Judges one round of submissions
///
/// # Arguments
///
/// * `submissions` - The `(player, number)` pairs of every active player
///
/// # Returns
///
/// The verdict describing which players are penalized and why
pub fn judge<I: IntoIterator<Item = (Id, u64)>>(submissions: I) -> Verdict {
    let groups = submissions
        .into_iter()
        .fold(BTreeMap::<u64, Vec<Id>>::new(), |mut groups, (id, number)| {
            groups.entry(number).or_default().push(id);
            groups
        });

    let mismos = groups
        .iter()
        .filter_map(|(number, ids)| match ids.as_slice() {
            [a, b] => Some(Mismo {
                number: *number,
                players: [*a, *b],
            }),
            _ => None,
        })
        .collect_vec();

    let uniques = groups.iter().filter_map(|(number, ids)| match ids.as_slice() {
        [id] => Some(Extreme {
            player: *id,
            number: *number,
        }),
        _ => None,
    });

    let (lowest, highest) = match uniques.minmax_by_key(|e| e.number) {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(only) => (Some(only), Some(only)),
        MinMaxResult::MinMax(low, high) => (Some(low), Some(high)),
    };

    Verdict {
        mismos,
        lowest,
        highest,
    }
}

/// Report of a resolved round, kept for display after submissions reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// The round that was resolved
    pub round: u32,
    /// Every submission of the round, ordered by number
    pub submissions: Vec<(Id, u64)>,
    /// The penalties the submissions earned
    pub verdict: Verdict,
    /// Lives actually lost by each player, after clamping at zero
    pub lives_lost: Vec<(Id, u32)>,
    /// Players whose lives reached zero this round
    pub eliminated: Vec<Id>,
}

impl RoundOutcome {
    /// Lives lost by a specific player this round
    pub fn lives_lost_by(&self, player: Id) -> u32 {
        self.lives_lost
            .iter()
            .find(|(id, _)| *id == player)
            .map_or(0, |(_, lost)| *lost)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn ids<const N: usize>() -> [Id; N] {
        std::array::from_fn(|_| Id::new())
    }

    #[test]
    fn test_lone_unique_number_is_both_extremes() {
        let [a, b, c] = ids::<3>();
        let verdict = judge([(a, 3), (b, 7), (c, 7)]);

        assert_eq!(
            verdict.mismos,
            vec![Mismo {
                number: 7,
                players: [b, c]
            }]
        );
        assert_eq!(verdict.lowest, Some(Extreme { player: a, number: 3 }));
        assert_eq!(verdict.highest, Some(Extreme { player: a, number: 3 }));

        let penalties = verdict.penalties();
        assert_eq!(penalties[&a], 2);
        assert_eq!(penalties[&b], 1);
        assert_eq!(penalties[&c], 1);
    }

    #[test]
    fn test_mismo_between_distinct_extremes() {
        let [a, b, c, d] = ids::<4>();
        let verdict = judge([(a, 1), (b, 5), (c, 5), (d, 9)]);

        let penalties = verdict.penalties();
        assert_eq!(penalties.len(), 4);
        assert!(penalties.values().all(|&lost| lost == 1));
        assert_eq!(verdict.lowest.map(|e| e.player), Some(a));
        assert_eq!(verdict.highest.map(|e| e.player), Some(d));
    }

    #[test]
    fn test_triple_is_ignored() {
        let [a, b, c] = ids::<3>();
        let verdict = judge([(a, 4), (b, 4), (c, 4)]);

        assert!(verdict.mismos.is_empty());
        assert_eq!(verdict.lowest, None);
        assert_eq!(verdict.highest, None);
        assert!(verdict.penalties().is_empty());
    }

    #[test]
    fn test_triple_does_not_shield_extremes() {
        let [a, b, c, d, e] = ids::<5>();
        let verdict = judge([(a, 0), (b, 4), (c, 4), (d, 4), (e, 100)]);

        let penalties = verdict.penalties();
        assert_eq!(penalties.len(), 2);
        assert_eq!(penalties[&a], 1);
        assert_eq!(penalties[&e], 1);
    }

    #[test]
    fn test_only_mismos_means_no_extremes() {
        let [a, b, c, d] = ids::<4>();
        let verdict = judge([(a, 2), (b, 2), (c, 8), (d, 8)]);

        assert_eq!(verdict.mismos.len(), 2);
        assert_eq!(verdict.mismos[0].number, 2);
        assert_eq!(verdict.mismos[1].number, 8);
        assert_eq!(verdict.lowest, None);
        assert_eq!(verdict.highest, None);
        assert_eq!(verdict.total_penalty(), 4);
    }

    #[test]
    fn test_extremes_skip_shared_numbers() {
        let [a, b, c, d] = ids::<4>();
        // 1 is shared, so the lowest unique number is 5
        let verdict = judge([(a, 1), (b, 1), (c, 5), (d, 9)]);

        assert_eq!(verdict.lowest, Some(Extreme { player: c, number: 5 }));
        assert_eq!(verdict.highest, Some(Extreme { player: d, number: 9 }));
    }

    #[test]
    fn test_zero_and_max_are_ordinary_numbers() {
        let [a, b, c] = ids::<3>();
        let verdict = judge([(a, 0), (b, u64::MAX), (c, 10)]);

        assert_eq!(verdict.lowest.map(|e| e.player), Some(a));
        assert_eq!(verdict.highest.map(|e| e.player), Some(b));
        assert!(!verdict.penalties().contains_key(&c));
    }

    #[test]
    fn test_no_submissions() {
        let verdict = judge(std::iter::empty::<(Id, u64)>());
        assert_eq!(verdict, Verdict::default());
    }

    #[test]
    fn test_lives_lost_by() {
        let [a, b] = ids::<2>();
        let outcome = RoundOutcome {
            round: 1,
            submissions: vec![],
            verdict: Verdict::default(),
            lives_lost: vec![(a, 2)],
            eliminated: vec![],
        };
        assert_eq!(outcome.lives_lost_by(a), 2);
        assert_eq!(outcome.lives_lost_by(b), 0);
    }

    proptest! {
        #[test]
        fn prop_penalty_lower_bound(numbers in prop::collection::vec(0u64..20, 1..12)) {
            let submissions = numbers.iter().map(|&n| (Id::new(), n)).collect_vec();
            let verdict = judge(submissions.iter().copied());

            let has_unique = numbers.iter().counts().values().any(|&c| c == 1);
            let extremes = if has_unique { 2 } else { 0 };
            let mismo_players = verdict.mismos.len() as u32 * 2;

            prop_assert_eq!(verdict.total_penalty(), mismo_players + extremes);
        }

        #[test]
        fn prop_penalties_only_hit_submitters(numbers in prop::collection::vec(0u64..20, 1..12)) {
            let submissions = numbers.iter().map(|&n| (Id::new(), n)).collect_vec();
            let verdict = judge(submissions.iter().copied());

            for (id, lost) in verdict.penalties() {
                prop_assert!(submissions.iter().any(|(s, _)| *s == id));
                prop_assert!((1..=2).contains(&lost));
            }
        }
    }
}
