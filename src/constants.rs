//! Constants for board dimensions, search parameters and the match protocol.
//!
//! These are the defaults; board size, time budget and the other engine
//! parameters can all be overridden at runtime from the command line.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board width.
pub const DEFAULT_WIDTH: usize = 8;

/// Default board height.
pub const DEFAULT_HEIGHT: usize = 8;

/// Offsets (dx, dy) to the 8 neighbouring cells.
/// Order: North, NE, East, SE, South, SW, West, NW
pub const DIRECTIONS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

// =============================================================================
// Cell Glyphs
// =============================================================================

/// Side A (moves first).
pub const GLYPH_BLACK: char = 'X';

/// Side B.
pub const GLYPH_WHITE: char = 'O';

/// Empty cell.
pub const GLYPH_EMPTY: char = '.';

/// Legal-move marker in hint boards.
pub const GLYPH_HINT: char = '*';

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Wall-clock budget per move decision, in milliseconds.
pub const TIME_BUDGET_MS: u64 = 100;

/// UCT exploration constant used during tree descent.
pub const EXPLORATION: f64 = 0.1;

/// Rollouts run from each new leaf before the next descent.
pub const ROLLOUTS_PER_LEAF: u32 = 1;

/// Consecutive passes that end the game.
pub const PASSES_TO_END: u8 = 2;

// =============================================================================
// Match Protocol
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5123;

/// Name announced to the server.
pub const CLIENT_NAME: &str = "mcts";

/// Number of games played by the arena by default.
pub const ARENA_GAMES: usize = 20;
