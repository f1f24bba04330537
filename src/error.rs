//! Error types for board construction, move validation, search and the
//! line protocol.
//!
//! Passing is never an error: a side without legal moves simply passes.

use crate::board::Side;

/// Malformed board parameters or engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("board dimensions must be positive (got {width}x{height})")]
    EmptyBoard { width: usize, height: usize },

    #[error("stone ({x}, {y}) is outside the {width}x{height} board")]
    StoneOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("stone ({x}, {y}) is listed more than once")]
    DuplicateStone { x: usize, y: usize },

    #[error("a {width}x{height} board cannot hold the four centre stones")]
    TooSmallForDefault { width: usize, height: usize },

    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("unknown cell glyph {0:?}")]
    UnknownGlyph(char),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// An attempted move that is not in the legal set. Always detected before
/// the board is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveError {
    #[error("({x}, {y}) is off the board")]
    OutOfBounds { x: usize, y: usize },

    #[error("({x}, {y}) is already occupied")]
    Occupied { x: usize, y: usize },

    #[error("{side} at ({x}, {y}) captures nothing")]
    NoCapture { side: Side, x: usize, y: usize },

    #[error("{side} cannot pass while it has legal moves")]
    PassWithLegalMoves { side: Side },

    #[error("the game is already over")]
    GameOver,
}

/// Degenerate search outcomes. Recovered by passing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search budget exhausted before any child of the root was expanded")]
    NoChildren,
}

/// A move string that is neither `"x y"` nor `"pass"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse move {0:?}: expected \"x y\" or \"pass\"")]
pub struct ParseMoveError(pub String);

/// Failures of the line protocol client.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by the server")]
    Closed,

    #[error("expected {expected}, got {got:?}")]
    Unexpected { expected: &'static str, got: String },

    #[error("bad board message: {0}")]
    BoardJson(#[from] serde_json::Error),

    #[error("bad board parameters: {0}")]
    Board(#[from] ConfigError),

    #[error(transparent)]
    Move(#[from] ParseMoveError),

    #[error("server reported an illegal move: {0}")]
    IllegalMove(#[from] IllegalMoveError),
}
