//! Rollouts (fast game simulation).
//!
//! A rollout plays a position out to the end of the game with a cheap move
//! selector and scores the final board. The selector is configurable: the
//! default is the greedy heuristic, but uniform random and epsilon-greedy
//! rollouts are available too.

use std::fmt;
use std::str::FromStr;

use fastrand::Rng;
use tracing::warn;

use crate::board::{Board, Move, Score, Side};
use crate::constants::PASSES_TO_END;
use crate::error::ConfigError;
use crate::greedy::GreedyPolicy;

/// Move selection strategy used inside rollouts.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum RolloutPolicy {
    /// Corner-first greedy selector.
    #[default]
    Greedy,
    /// Uniformly random legal moves.
    Random,
    /// Any other selector configuration, e.g. epsilon-greedy.
    Custom(GreedyPolicy),
}

impl RolloutPolicy {
    pub fn selector(&self) -> GreedyPolicy {
        match self {
            RolloutPolicy::Greedy => GreedyPolicy::greedy(),
            RolloutPolicy::Random => GreedyPolicy::random(),
            RolloutPolicy::Custom(policy) => *policy,
        }
    }

    #[inline]
    pub fn choose(&self, board: &Board, side: Side, rng: &mut Rng) -> Move {
        self.selector().choose(board, side, rng)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector().validate()
    }
}

impl fmt::Display for RolloutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloutPolicy::Greedy => write!(f, "greedy"),
            RolloutPolicy::Random => write!(f, "random"),
            RolloutPolicy::Custom(policy) => write!(f, "epsilon:{}", policy.exploration_rate),
        }
    }
}

/// Parses `greedy`, `random` or `epsilon:<rate>`.
impl FromStr for RolloutPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "greedy" => Ok(RolloutPolicy::Greedy),
            "random" => Ok(RolloutPolicy::Random),
            other => {
                let rate = other
                    .strip_prefix("epsilon:")
                    .and_then(|r| r.parse::<f64>().ok())
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown rollout policy {other:?}")))?;
                let policy = RolloutPolicy::Custom(GreedyPolicy::epsilon(rate));
                policy.validate()?;
                Ok(policy)
            }
        }
    }
}

/// Play `board` out until two consecutive passes and return the final score.
///
/// `side` moves first; `passes` is the number of consecutive passes that
/// already happened right before this position.
pub fn playout(board: &mut Board, mut side: Side, mut passes: u8, policy: &RolloutPolicy, rng: &mut Rng) -> Score {
    while passes < PASSES_TO_END {
        match policy.choose(board, side, rng) {
            Move::Pass => passes += 1,
            Move::Play(x, y) => match board.apply_move(side, x, y) {
                Ok(_) => passes = 0,
                Err(err) => {
                    warn!(%err, "rollout selector returned an illegal move, passing");
                    passes += 1;
                }
            },
        }
        side = side.opponent();
    }
    board.score()
}
