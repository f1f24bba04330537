//! Reversi-MCTS: a Reversi (Othello) engine built on Monte Carlo Tree Search.
//!
//! The engine plays on rectangular boards of any size with an arbitrary
//! initial stone layout. Moves are chosen either by a corner-first greedy
//! heuristic or by a time-budgeted MCTS whose rollouts use that heuristic.
//!
//! ## Modules
//!
//! - [`constants`] - Board defaults and engine parameters
//! - [`board`] - Board state, move rules and scoring
//! - [`greedy`] - Corner-first greedy and epsilon-greedy move selection
//! - [`playout`] - Rollout policies and game simulation
//! - [`tree`] - Arena-allocated search tree
//! - [`mcts`] - Monte Carlo Tree Search with UCT
//! - [`game`] - Turn-state controller shared by every front end
//! - [`protocol`] - Client for the line-based match server
//! - [`console`] - Human vs engine in the terminal
//! - [`arena`] - Automated engine vs engine matches
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use reversi_mcts::board::Board;
//! use reversi_mcts::game::{Agent, Game};
//! use reversi_mcts::mcts::{Mcts, MctsConfig};
//!
//! // Create a new game
//! let mut game = Game::new(Board::standard(), fastrand::Rng::with_seed(7));
//!
//! // Let MCTS choose and play Black's first move
//! let engine = Agent::Mcts(Mcts::new(MctsConfig {
//!     time_budget: Duration::from_millis(50),
//!     ..MctsConfig::default()
//! }));
//! let mv = game.step(&engine).unwrap();
//! println!("Black played {mv}, score {}", game.score());
//! ```

pub mod arena;
pub mod board;
pub mod console;
pub mod constants;
pub mod error;
pub mod game;
pub mod greedy;
pub mod mcts;
pub mod playout;
pub mod protocol;
pub mod tree;
