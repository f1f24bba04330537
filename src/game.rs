//! Turn-state controller.
//!
//! [`Game`] owns the real board, whose turn it is, the consecutive-pass
//! counter and the live search tree. Boundary code (console, protocol
//! client, arena) only ever talks to the game through this type.

use fastrand::Rng;
use tracing::{debug, warn};

use crate::board::{Board, Move, Point, Score, Side};
use crate::constants::PASSES_TO_END;
use crate::error::IllegalMoveError;
use crate::greedy::GreedyPolicy;
use crate::mcts::Mcts;
use crate::tree::SearchTree;

/// A move-choosing engine.
#[derive(Clone, Debug)]
pub enum Agent {
    Greedy(GreedyPolicy),
    Mcts(Mcts),
}

impl Agent {
    pub fn name(&self) -> &'static str {
        match self {
            Agent::Greedy(_) => "greedy",
            Agent::Mcts(_) => "mcts",
        }
    }
}

/// A game in progress.
pub struct Game {
    board: Board,
    to_move: Side,
    passes: u8,
    ended: bool,
    /// Live search tree; its root is the current position when present
    tree: Option<SearchTree>,
    rng: Rng,
    history: Vec<(Side, Move)>,
}

impl Game {
    /// Start a game on `board` with Black to move.
    pub fn new(board: Board, rng: Rng) -> Self {
        Self {
            board,
            to_move: Side::Black,
            passes: 0,
            ended: false,
            tree: None,
            rng,
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Side {
        self.to_move
    }

    pub fn passes(&self) -> u8 {
        self.passes
    }

    pub fn history(&self) -> &[(Side, Move)] {
        &self.history
    }

    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }

    pub fn legal_moves(&self) -> Vec<Point> {
        self.board.legal_moves(self.to_move)
    }

    pub fn is_over(&self) -> bool {
        self.ended || self.passes >= PASSES_TO_END
    }

    /// Mark the game as finished by an outside signal.
    pub fn finish(&mut self) {
        self.ended = true;
        self.tree = None;
    }

    pub fn score(&self) -> Score {
        self.board.score()
    }

    pub fn winner(&self) -> Option<Side> {
        self.score().winner()
    }

    /// Ask `agent` for a move for the side to move. Nothing is applied.
    pub fn think(&mut self, agent: &Agent) -> Move {
        match agent {
            Agent::Greedy(policy) => policy.choose(&self.board, self.to_move, &mut self.rng),
            Agent::Mcts(mcts) => {
                let tree = Self::live_tree(&mut self.tree, &self.board, self.to_move, self.passes);
                mcts.best_move(tree, &mut self.rng)
            }
        }
    }

    /// The live tree if its root is the current position searched for the
    /// side to move, otherwise a fresh one.
    fn live_tree<'a>(tree: &'a mut Option<SearchTree>, board: &Board, side: Side, passes: u8) -> &'a mut SearchTree {
        let reusable = tree.as_ref().is_some_and(|t| {
            let root = t.root_node();
            root.to_move == side && root.perspective == side && root.passes == passes && root.board == *board
        });
        if reusable {
            debug!(visits = tree.as_ref().map_or(0, |t| t.root_node().visits), "reusing search tree");
        } else {
            *tree = None;
        }
        tree.get_or_insert_with(|| SearchTree::new(board.clone(), side, side, passes))
    }

    /// Apply `mv` for the side to move. On error nothing changes.
    pub fn play(&mut self, mv: Move) -> Result<(), IllegalMoveError> {
        if self.is_over() {
            return Err(IllegalMoveError::GameOver);
        }
        self.board.play(self.to_move, mv)?;
        self.commit(mv);
        Ok(())
    }

    fn commit(&mut self, mv: Move) {
        self.passes = if mv.is_pass() { self.passes.saturating_add(1) } else { 0 };
        self.history.push((self.to_move, mv));
        self.to_move = self.to_move.opponent();

        if let Some(tree) = self.tree.as_mut() {
            if !tree.advance(mv) {
                debug!(%mv, "move was not explored, dropping search tree");
                self.tree = None;
            }
        }
    }

    /// Play one turn for the side to move with `agent`.
    ///
    /// A side without legal moves passes without consulting the engine. If
    /// the engine answers with an illegal move, the greedy selector picks a
    /// replacement from the legal moves.
    pub fn step(&mut self, agent: &Agent) -> Result<Move, IllegalMoveError> {
        if self.is_over() {
            return Err(IllegalMoveError::GameOver);
        }
        if !self.board.has_legal_move(self.to_move) {
            self.commit(Move::Pass);
            return Ok(Move::Pass);
        }

        let mv = self.think(agent);
        match self.play(mv) {
            Ok(()) => Ok(mv),
            Err(err) => {
                warn!(%err, side = %self.to_move, agent = agent.name(), "engine chose an illegal move, using greedy");
                let fallback = GreedyPolicy::greedy().choose(&self.board, self.to_move, &mut self.rng);
                self.play(fallback)?;
                Ok(fallback)
            }
        }
    }

    /// Play the game to the end, `black` and `white` choosing the moves.
    pub fn play_out(&mut self, black: &Agent, white: &Agent) -> Result<Score, IllegalMoveError> {
        while !self.is_over() {
            let agent = match self.to_move {
                Side::Black => black,
                Side::White => white,
            };
            self.step(agent)?;
        }
        Ok(self.score())
    }
}
