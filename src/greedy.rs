//! Greedy heuristic move selection.
//!
//! The policy takes a corner whenever one is available (corners can never be
//! flipped back), otherwise the move that leaves the mover with the most
//! stones. An exploration rate turns it into an epsilon-greedy policy; at
//! rate 1.0 it plays uniformly at random. The same selector is used as a
//! standalone engine and as the default MCTS rollout policy.

use fastrand::Rng;

use crate::board::{Board, Move, Side};
use crate::error::ConfigError;

/// Corner-first, score-maximising move selector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GreedyPolicy {
    /// Take a corner before comparing scores.
    pub corner_priority: bool,
    /// Probability of playing a uniformly random legal move instead.
    pub exploration_rate: f64,
    /// Raise the exploration rate to the power of the number of stones on
    /// the board, so exploration fades as the game goes on.
    pub decay: bool,
}

impl Default for GreedyPolicy {
    fn default() -> Self {
        Self::greedy()
    }
}

impl GreedyPolicy {
    /// Deterministic up to tie-breaking: corners, then best immediate score.
    pub fn greedy() -> Self {
        Self {
            corner_priority: true,
            exploration_rate: 0.0,
            decay: false,
        }
    }

    /// Uniformly random legal moves.
    pub fn random() -> Self {
        Self {
            exploration_rate: 1.0,
            ..Self::greedy()
        }
    }

    pub fn epsilon(rate: f64) -> Self {
        Self {
            exploration_rate: rate,
            ..Self::greedy()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(ConfigError::Invalid(format!(
                "exploration rate must be in [0, 1] (got {})",
                self.exploration_rate
            )));
        }
        Ok(())
    }

    fn effective_rate(&self, board: &Board) -> f64 {
        if self.decay {
            self.exploration_rate.powi(board.occupied() as i32)
        } else {
            self.exploration_rate
        }
    }

    /// Pick a move for `side`. Returns [`Move::Pass`] when `side` has no
    /// legal move. `board` is only read; candidates are tried on clones.
    pub fn choose(&self, board: &Board, side: Side, rng: &mut Rng) -> Move {
        let mut candidates = board.legal_moves(side);
        if candidates.is_empty() {
            return Move::Pass;
        }

        // Shuffled so that ties below are broken at random
        rng.shuffle(&mut candidates);

        let rate = self.effective_rate(board);
        if rate > 0.0 && rng.f64() < rate {
            return Move::from(candidates[rng.usize(..candidates.len())]);
        }

        if self.corner_priority {
            if let Some(&(x, y)) = candidates.iter().find(|&&(x, y)| board.is_corner(x, y)) {
                return Move::Play(x, y);
            }
        }

        let mut best = candidates[0];
        let mut best_score = 0;
        for &(x, y) in &candidates {
            let mut trial = board.clone();
            if trial.apply_move(side, x, y).is_err() {
                continue;
            }
            let score = trial.score().of(side);
            if score > best_score {
                best = (x, y);
                best_score = score;
            }
        }
        Move::from(best)
    }
}
