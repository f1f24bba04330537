//! Monte Carlo Tree Search engine.
//!
//! The search is an anytime loop over a [`SearchTree`]:
//! - selection: descend with UCT while nodes are fully expanded
//! - expansion: add one untried move as a new leaf
//! - simulation: play the leaf out with the rollout policy
//! - backpropagation: add the result to every node up to the root
//!
//! It runs until the wall-clock budget elapses (or an iteration cap or stop
//! flag fires) and then recommends the root child with the best mean
//! result. The budget and stop flag are only checked between complete
//! iterations, so the tree is never left half-updated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fastrand::Rng;
use tracing::{debug, trace, warn};

use crate::board::Move;
use crate::constants::{EXPLORATION, ROLLOUTS_PER_LEAF, TIME_BUDGET_MS};
use crate::error::{ConfigError, SearchError};
use crate::playout::RolloutPolicy;
use crate::tree::{NodeId, SearchTree};

/// Search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Wall-clock budget per decision
    pub time_budget: Duration,
    /// UCT exploration constant used while descending
    pub exploration: f64,
    /// Move selector used in rollouts
    pub rollout: RolloutPolicy,
    /// Rollouts run from each new leaf
    pub rollouts_per_leaf: u32,
    /// Optional cap on iterations, mostly for reproducible tests
    pub max_iterations: Option<usize>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(TIME_BUDGET_MS),
            exploration: EXPLORATION,
            rollout: RolloutPolicy::default(),
            rollouts_per_leaf: ROLLOUTS_PER_LEAF,
            max_iterations: None,
        }
    }
}

impl MctsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "exploration constant must be a finite value >= 0 (got {})",
                self.exploration
            )));
        }
        if self.rollouts_per_leaf == 0 {
            return Err(ConfigError::Invalid("rollouts per leaf must be > 0".into()));
        }
        self.rollout.validate()
    }
}

/// Statistics of one search run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub iterations: usize,
    pub tree_size: usize,
    pub elapsed: Duration,
}

/// Time-budgeted MCTS decision engine.
#[derive(Clone, Debug, Default)]
pub struct Mcts {
    pub config: MctsConfig,
    stop: Option<Arc<AtomicBool>>,
}

impl Mcts {
    pub fn new(config: MctsConfig) -> Self {
        Self { config, stop: None }
    }

    /// Stop searching as soon as `flag` is set, after the current iteration.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Recommend a move for the side to move at the root of `tree`.
    ///
    /// Passes without searching when there is no legal move, and returns a
    /// forced move without searching when there is exactly one.
    pub fn best_move(&self, tree: &mut SearchTree, rng: &mut Rng) -> Move {
        let root = tree.root_node();
        let legal = root.board.legal_moves(root.to_move);
        match legal.as_slice() {
            [] => {
                debug!(side = %root.to_move, "no legal moves, passing");
                return Move::Pass;
            }
            [only] => {
                debug!(side = %root.to_move, "single legal move, skipping search");
                return Move::from(*only);
            }
            _ => {}
        }

        let stats = self.search(tree, rng);
        match recommend(tree) {
            Ok(mv) => {
                dump_children(tree);
                let root = tree.root_node();
                debug!(
                    %mv,
                    iterations = stats.iterations,
                    nodes = stats.tree_size,
                    elapsed_ms = stats.elapsed.as_millis() as u64,
                    root_mean = root.mean(),
                    "MCTS decision"
                );
                mv
            }
            Err(err) => {
                warn!(%err, "passing");
                Move::Pass
            }
        }
    }

    /// Run search iterations on `tree` until the budget is spent.
    pub fn search(&self, tree: &mut SearchTree, rng: &mut Rng) -> SearchStats {
        let start = Instant::now();
        let mut iterations = 0;

        while !self.should_stop(start, iterations) {
            let leaf = self.tree_policy(tree);
            for _ in 0..self.config.rollouts_per_leaf.max(1) {
                let result = tree.simulate(leaf, &self.config.rollout, rng);
                tree.backpropagate(leaf, result);
            }
            iterations += 1;
            trace!(iterations, leaf = leaf.index(), "MCTS iteration complete");
        }

        SearchStats {
            iterations,
            tree_size: tree.len(),
            elapsed: start.elapsed(),
        }
    }

    fn should_stop(&self, start: Instant, iterations: usize) -> bool {
        self.config.max_iterations.is_some_and(|max| iterations >= max)
            || self.stop.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
            || start.elapsed() >= self.config.time_budget
    }

    /// Descend from the root to the node to simulate from: a freshly
    /// expanded child, or a terminal node.
    fn tree_policy(&self, tree: &mut SearchTree) -> NodeId {
        let mut node = tree.root();
        while !tree.is_terminal(node) {
            if !tree.get(node).is_fully_expanded() {
                if let Some(child) = tree.expand(node) {
                    return child;
                }
            }
            match tree.select_best_child(node, self.config.exploration) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }
}

/// The move leading to the root child with the best mean result.
pub fn recommend(tree: &SearchTree) -> Result<Move, SearchError> {
    tree.select_best_child(tree.root(), 0.0)
        .and_then(|child| tree.get(child).mv)
        .ok_or(SearchError::NoChildren)
}

/// Log the statistics of the root's children.
pub fn dump_children(tree: &SearchTree) {
    for &child in &tree.root_node().children {
        let node = tree.get(child);
        if let Some(mv) = node.mv {
            debug!(%mv, visits = node.visits, results = node.results, mean = node.mean(), "root child");
        }
    }
}
