//! Reversi board representation and rules.
//!
//! The grid is a flat `width * height` array indexed as `y * width + x`.
//! `x` is the column and `y` is the row, both starting at 0 in the top-left
//! corner. The board knows the rules (legal moves, flipping, scoring) and
//! nothing about search or networking.

use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, DIRECTIONS, GLYPH_BLACK, GLYPH_EMPTY, GLYPH_HINT, GLYPH_WHITE,
};
use crate::error::{ConfigError, IllegalMoveError, ParseMoveError};

/// One of the two players. Black (`X`) always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Black,
    White,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Side::Black => GLYPH_BLACK,
            Side::White => GLYPH_WHITE,
        }
    }

    /// Parse a protocol glyph (`X` or `O`, case-insensitive).
    pub fn from_glyph(c: char) -> Option<Side> {
        match c.to_ascii_uppercase() {
            GLYPH_BLACK => Some(Side::Black),
            GLYPH_WHITE => Some(Side::White),
            _ => None,
        }
    }

    /// Owner of an initial stone: even `x + y` belongs to Black.
    pub fn from_parity(x: usize, y: usize) -> Side {
        if (x + y) % 2 == 0 {
            Side::Black
        } else {
            Side::White
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

pub type Point = (usize, usize);

/// A move: a placement at `(x, y)` or a pass.
///
/// Serializes as `"x y"` or `"pass"`, the encoding used on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Play(usize, usize),
    Pass,
}

impl Move {
    pub fn point(self) -> Option<Point> {
        match self {
            Move::Play(x, y) => Some((x, y)),
            Move::Pass => None,
        }
    }

    pub fn is_pass(self) -> bool {
        self == Move::Pass
    }
}

impl From<Point> for Move {
    fn from((x, y): Point) -> Self {
        Move::Play(x, y)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Play(x, y) => write!(f, "{x} {y}"),
            Move::Pass => write!(f, "pass"),
        }
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pass") {
            return Ok(Move::Pass);
        }
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [x, y] => match (x.parse(), y.parse()) {
                (Ok(x), Ok(y)) => Ok(Move::Play(x, y)),
                _ => Err(ParseMoveError(s.to_string())),
            },
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}

/// Number of cells held by each side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub black: usize,
    pub white: usize,
}

impl Score {
    pub fn of(&self, side: Side) -> usize {
        match side {
            Side::Black => self.black,
            Side::White => self.white,
        }
    }

    /// `+1` if `side` is ahead, `0` on a tie, `-1` if behind.
    pub fn outcome(&self, side: Side) -> i32 {
        match self.of(side).cmp(&self.of(side.opponent())) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => -1,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self.outcome(Side::Black) {
            1 => Some(Side::Black),
            -1 => Some(Side::White),
            _ => None,
        }
    }

    pub fn total(&self) -> usize {
        self.black + self.white
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GLYPH_BLACK} {} - {} {GLYPH_WHITE}", self.black, self.white)
    }
}

/// A rectangular Reversi board.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<Side>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

/// The four centre cells of a board at least 2x2.
fn centre_stones(width: usize, height: usize) -> [Point; 4] {
    let (cx, cy) = (width / 2, height / 2);
    [(cx - 1, cy - 1), (cx, cy - 1), (cx - 1, cy), (cx, cy)]
}

impl Board {
    /// Create a board with the given stones, or the four centre stones when
    /// `stones` is `None`. Stone owners alternate by position parity.
    pub fn new(width: usize, height: usize, stones: Option<&[Point]>) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyBoard { width, height });
        }
        let stones: Vec<Point> = match stones {
            Some(stones) => stones.to_vec(),
            None if width < 2 || height < 2 => {
                return Err(ConfigError::TooSmallForDefault { width, height });
            }
            None => centre_stones(width, height).to_vec(),
        };

        let mut board = Self::empty(width, height);
        for (x, y) in stones {
            if !board.in_bounds(x, y) {
                return Err(ConfigError::StoneOutOfRange {
                    x,
                    y,
                    width,
                    height,
                });
            }
            let i = board.idx(x, y);
            if board.cells[i].is_some() {
                return Err(ConfigError::DuplicateStone { x, y });
            }
            board.cells[i] = Some(Side::from_parity(x, y));
        }
        Ok(board)
    }

    /// The default 8x8 opening position.
    pub fn standard() -> Self {
        let mut board = Self::empty(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        for (x, y) in centre_stones(DEFAULT_WIDTH, DEFAULT_HEIGHT) {
            let i = board.idx(x, y);
            board.cells[i] = Some(Side::from_parity(x, y));
        }
        board
    }

    /// Build an arbitrary position from text rows of `X`, `O` and `.`.
    /// Whitespace inside a row is ignored.
    pub fn from_rows(rows: &[&str]) -> Result<Self, ConfigError> {
        let parsed: Vec<Vec<char>> = rows
            .iter()
            .map(|r| r.chars().filter(|c| !c.is_whitespace()).collect())
            .collect();
        let height = parsed.len();
        let width = parsed.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyBoard { width, height });
        }

        let mut board = Self::empty(width, height);
        for (y, row) in parsed.iter().enumerate() {
            if row.len() != width {
                return Err(ConfigError::RaggedRows {
                    row: y,
                    got: row.len(),
                    expected: width,
                });
            }
            for (x, &c) in row.iter().enumerate() {
                let i = board.idx(x, y);
                board.cells[i] = match c {
                    GLYPH_EMPTY => None,
                    other => Some(Side::from_glyph(other).ok_or(ConfigError::UnknownGlyph(other))?),
                };
            }
        }
        Ok(board)
    }

    fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// The stone at `(x, y)`; `None` for empty or off-board cells.
    pub fn get(&self, x: usize, y: usize) -> Option<Side> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[self.idx(x, y)]
    }

    pub fn is_corner(&self, x: usize, y: usize) -> bool {
        (x == 0 || x + 1 == self.width) && (y == 0 || y + 1 == self.height)
    }

    /// Neighbour of `(x, y)` in direction `(dx, dy)`, if still on the board.
    #[inline]
    fn step(&self, (x, y): Point, (dx, dy): (isize, isize)) -> Option<Point> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.in_bounds(nx, ny).then_some((nx, ny))
    }

    /// Length of the opposing run starting next to `(x, y)` that `side`
    /// would capture in direction `dir`. Zero unless the run is closed by a
    /// `side` stone before the edge or an empty cell.
    fn capture_run(&self, side: Side, x: usize, y: usize, dir: (isize, isize)) -> usize {
        let opp = side.opponent();
        let mut len = 0;
        let mut cur = (x, y);
        while let Some(next) = self.step(cur, dir) {
            match self.cells[self.idx(next.0, next.1)] {
                Some(s) if s == opp => {
                    len += 1;
                    cur = next;
                }
                Some(_) => return len,
                None => return 0,
            }
        }
        0
    }

    fn is_legal(&self, side: Side, x: usize, y: usize) -> bool {
        self.in_bounds(x, y)
            && self.cells[self.idx(x, y)].is_none()
            && DIRECTIONS
                .iter()
                .any(|&dir| self.capture_run(side, x, y, dir) > 0)
    }

    /// All cells where `side` may play, column by column. Empty means the
    /// side must pass.
    pub fn legal_moves(&self, side: Side) -> Vec<Point> {
        let mut moves = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                if self.is_legal(side, x, y) {
                    moves.push((x, y));
                }
            }
        }
        moves
    }

    pub fn has_legal_move(&self, side: Side) -> bool {
        (0..self.width).any(|x| (0..self.height).any(|y| self.is_legal(side, x, y)))
    }

    /// Stones that would flip if `side` played at `(x, y)`.
    pub fn flips(&self, side: Side, x: usize, y: usize) -> Vec<Point> {
        if !self.in_bounds(x, y) || self.cells[self.idx(x, y)].is_some() {
            return Vec::new();
        }
        let mut flipped = Vec::new();
        for dir in DIRECTIONS {
            let len = self.capture_run(side, x, y, dir);
            let mut cur = (x, y);
            for _ in 0..len {
                // capture_run only counts cells that exist
                let Some(next) = self.step(cur, dir) else { break };
                flipped.push(next);
                cur = next;
            }
        }
        flipped
    }

    /// Validate a placement without touching the board.
    pub fn check_move(&self, side: Side, x: usize, y: usize) -> Result<Vec<Point>, IllegalMoveError> {
        if !self.in_bounds(x, y) {
            return Err(IllegalMoveError::OutOfBounds { x, y });
        }
        if self.cells[self.idx(x, y)].is_some() {
            return Err(IllegalMoveError::Occupied { x, y });
        }
        let flipped = self.flips(side, x, y);
        if flipped.is_empty() {
            return Err(IllegalMoveError::NoCapture { side, x, y });
        }
        Ok(flipped)
    }

    /// Place a `side` stone at `(x, y)` and flip every captured run.
    ///
    /// Returns the number of flipped stones. On error the board is unchanged.
    pub fn apply_move(&mut self, side: Side, x: usize, y: usize) -> Result<usize, IllegalMoveError> {
        let flipped = self.check_move(side, x, y)?;
        let i = self.idx(x, y);
        self.cells[i] = Some(side);
        for &(fx, fy) in &flipped {
            let i = self.idx(fx, fy);
            self.cells[i] = Some(side);
        }
        Ok(flipped.len())
    }

    /// Apply a [`Move`]. A pass is only accepted when `side` has no
    /// placement available, and leaves the board as it is.
    pub fn play(&mut self, side: Side, mv: Move) -> Result<usize, IllegalMoveError> {
        match mv {
            Move::Play(x, y) => self.apply_move(side, x, y),
            Move::Pass if self.has_legal_move(side) => {
                Err(IllegalMoveError::PassWithLegalMoves { side })
            }
            Move::Pass => Ok(0),
        }
    }

    pub fn score(&self) -> Score {
        self.cells.iter().fold(Score::default(), |mut s, c| {
            match c {
                Some(Side::Black) => s.black += 1,
                Some(Side::White) => s.white += 1,
                None => {}
            }
            s
        })
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// True when neither side can place a stone.
    pub fn is_game_over(&self) -> bool {
        !self.has_legal_move(Side::Black) && !self.has_legal_move(Side::White)
    }

    /// A printable view of the board with `side`'s legal moves marked.
    pub fn hints(&self, side: Side) -> Hints<'_> {
        Hints { board: self, side }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, hints: Option<Side>) -> fmt::Result {
        let marked = hints.map(|side| self.legal_moves(side)).unwrap_or_default();
        write!(f, "   ")?;
        for x in 0..self.width {
            write!(f, "{x:>2}")?;
        }
        writeln!(f)?;
        for y in 0..self.height {
            write!(f, "{y:>2} ")?;
            for x in 0..self.width {
                let ch = match self.get(x, y) {
                    Some(side) => side.glyph(),
                    None if marked.contains(&(x, y)) => GLYPH_HINT,
                    None => GLYPH_EMPTY,
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, None)
    }
}

/// Board view that marks legal moves, see [`Board::hints`].
pub struct Hints<'a> {
    board: &'a Board,
    side: Side,
}

impl fmt::Display for Hints<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.board.render(f, Some(self.side))
    }
}
