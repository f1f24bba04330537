//! Automated matches between two agents.

use std::fmt;

use anyhow::Result;
use fastrand::Rng;
use tracing::info;

use crate::board::{Board, Point, Side};
use crate::constants::{ARENA_GAMES, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::ConfigError;
use crate::game::{Agent, Game};

/// Random layouts drawn before giving up on finding a playable one.
const RANDOM_START_ATTEMPTS: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    pub games: usize,
    pub width: usize,
    pub height: usize,
    /// Start each game from this many random stones instead of the centre
    /// four
    pub random_stones: Option<usize>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            games: ARENA_GAMES,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            random_stones: None,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(n) = self.random_stones {
            if n < 2 || n > self.width * self.height {
                return Err(ConfigError::Invalid(format!(
                    "random stones must be in 2..={} (got {n})",
                    self.width * self.height
                )));
            }
        }
        Ok(())
    }

    /// Starting board for one game. Random layouts are redrawn until at
    /// least one side has a legal move.
    fn board(&self, rng: &mut Rng) -> Result<Board, ConfigError> {
        let Some(n) = self.random_stones else {
            return Board::new(self.width, self.height, None);
        };
        let mut cells: Vec<Point> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .collect();
        for _ in 0..RANDOM_START_ATTEMPTS {
            rng.shuffle(&mut cells);
            let board = Board::new(self.width, self.height, Some(&cells[..n]))?;
            if !board.is_game_over() {
                return Ok(board);
            }
        }
        Err(ConfigError::Invalid(format!(
            "no playable layout of {n} random stones found on a {}x{} board",
            self.width, self.height
        )))
    }
}

/// Results from the contender's point of view.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaReport {
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
}

impl ArenaReport {
    pub fn games(&self) -> usize {
        self.wins + self.losses + self.ties
    }

    /// Ties count as half a win.
    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / self.games() as f64
    }

    fn record(&mut self, outcome: i32) {
        match outcome {
            1 => self.wins += 1,
            -1 => self.losses += 1,
            _ => self.ties += 1,
        }
    }
}

impl fmt::Display for ArenaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wins, {} losses, {} ties ({:.1}%)",
            self.wins,
            self.losses,
            self.ties,
            self.win_rate() * 100.0
        )
    }
}

/// Play `config.games` games of `contender` against `opponent`. The
/// contender takes Black in even-numbered games and White in the others.
pub fn run_arena(contender: &Agent, opponent: &Agent, config: &ArenaConfig, rng: &mut Rng) -> Result<ArenaReport> {
    config.validate()?;

    let mut report = ArenaReport::default();
    for index in 0..config.games {
        let side = if index % 2 == 0 { Side::Black } else { Side::White };
        let board = config.board(rng)?;
        let mut game = Game::new(board, rng.fork());
        let score = match side {
            Side::Black => game.play_out(contender, opponent)?,
            Side::White => game.play_out(opponent, contender)?,
        };
        let outcome = score.outcome(side);
        report.record(outcome);
        info!(
            game = index + 1,
            %side,
            %score,
            outcome,
            contender = contender.name(),
            opponent = opponent.name(),
            "arena game finished"
        );
    }
    info!(%report, "arena finished");
    Ok(report)
}
