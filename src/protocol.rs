//! Line protocol match client.
//!
//! The match server speaks a newline-framed text protocol. Each line from
//! the server is one of:
//!
//! - `name?` - ask for the client name
//! - `board <json>` - start a new match on the given board
//! - `piece X` / `piece O` - our side for this match (`X` moves first)
//! - `X 3 4`, `O pass` - the opponent's move
//! - `ok` - acknowledgement of our move
//! - `end <summary>` - the match is over
//! - `disconnect` - all matches are done
//!
//! Our moves go out as `x y` or `pass`, each answered by `ok`.
//!
//! ## Example
//!
//! ```ignore
//! use std::io::BufReader;
//! use std::net::TcpStream;
//! use reversi_mcts::game::Agent;
//! use reversi_mcts::protocol::MatchClient;
//!
//! let stream = TcpStream::connect(("127.0.0.1", 5123))?;
//! let mut client = MatchClient::new(BufReader::new(stream.try_clone()?), stream, "mcts", agent, rng);
//! let summaries = client.run()?;
//! ```

use std::io::{BufRead, Write};

use fastrand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::board::{Board, Move, Point, Score, Side};
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{ConfigError, ProtocolError};
use crate::game::{Agent, Game};

/// Board parameters carried by the `board` message.
///
/// Accepts both `width`/`height` and the server's `sizeX`/`sizeY` keys.
/// Missing fields fall back to the default 8x8 board with centre stones.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardParams {
    #[serde(alias = "sizeX")]
    pub width: usize,
    #[serde(alias = "sizeY")]
    pub height: usize,
    pub stones: Option<Vec<Point>>,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            stones: None,
        }
    }
}

impl BoardParams {
    pub fn build(&self) -> Result<Board, ConfigError> {
        Board::new(self.width, self.height, self.stones.as_deref())
    }
}

/// One line sent by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    NameRequest,
    Board(BoardParams),
    Piece(Side),
    Move { side: Side, mv: Move },
    Ok,
    End(String),
    Disconnect,
}

impl ServerMessage {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        let unexpected = || ProtocolError::Unexpected {
            expected: "server message",
            got: line.to_string(),
        };

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "name?" if rest.is_empty() => Ok(ServerMessage::NameRequest),
            "ok" if rest.is_empty() => Ok(ServerMessage::Ok),
            "disconnect" if rest.is_empty() => Ok(ServerMessage::Disconnect),
            "end" => Ok(ServerMessage::End(rest.to_string())),
            "board" => Ok(ServerMessage::Board(serde_json::from_str(rest)?)),
            "piece" => {
                let mut glyphs = rest.chars();
                match (glyphs.next().and_then(Side::from_glyph), glyphs.next()) {
                    (Some(side), None) => Ok(ServerMessage::Piece(side)),
                    _ => Err(unexpected()),
                }
            }
            _ => {
                let mut glyphs = head.chars();
                match (glyphs.next().and_then(Side::from_glyph), glyphs.next()) {
                    (Some(side), None) => Ok(ServerMessage::Move {
                        side,
                        mv: rest.parse()?,
                    }),
                    _ => Err(unexpected()),
                }
            }
        }
    }
}

/// Outcome of one match as seen by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSummary {
    pub side: Side,
    pub score: Score,
    /// Whatever the server sent after `end`
    pub server_summary: String,
    /// Moves played by both sides, passes included
    pub moves: usize,
}

impl MatchSummary {
    pub fn outcome(&self) -> i32 {
        self.score.outcome(self.side)
    }
}

/// Plays matches against a server with a single agent.
pub struct MatchClient<R, W> {
    reader: R,
    writer: W,
    name: String,
    agent: Agent,
    rng: Rng,
}

impl<R: BufRead, W: Write> MatchClient<R, W> {
    pub fn new(reader: R, writer: W, name: impl Into<String>, agent: Agent, rng: Rng) -> Self {
        Self {
            reader,
            writer,
            name: name.into(),
            agent,
            rng,
        }
    }

    /// Read the next non-blank line.
    fn recv(&mut self) -> Result<ServerMessage, ProtocolError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(ProtocolError::Closed);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        debug!(line = line.trim(), "<- server");
        ServerMessage::parse(&line)
    }

    fn send(&mut self, line: &str) -> Result<(), ProtocolError> {
        debug!(line, "-> server");
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Answer the name request, then play matches until `disconnect`.
    pub fn run(&mut self) -> Result<Vec<MatchSummary>, ProtocolError> {
        match self.recv()? {
            ServerMessage::NameRequest => {
                let name = self.name.clone();
                self.send(&name)?;
            }
            other => {
                return Err(ProtocolError::Unexpected {
                    expected: "name?",
                    got: format!("{other:?}"),
                });
            }
        }

        let mut summaries = Vec::new();
        loop {
            match self.recv()? {
                ServerMessage::Board(params) => {
                    let summary = self.play_match(&params)?;
                    summaries.push(summary);
                }
                ServerMessage::Disconnect => break,
                other => {
                    return Err(ProtocolError::Unexpected {
                        expected: "board or disconnect",
                        got: format!("{other:?}"),
                    });
                }
            }
        }
        info!(matches = summaries.len(), "all matches finished by the server");
        Ok(summaries)
    }

    fn play_match(&mut self, params: &BoardParams) -> Result<MatchSummary, ProtocolError> {
        let board = params.build()?;
        let side = match self.recv()? {
            ServerMessage::Piece(side) => side,
            other => {
                return Err(ProtocolError::Unexpected {
                    expected: "piece",
                    got: format!("{other:?}"),
                });
            }
        };
        info!(%side, width = board.width(), height = board.height(), "new match");

        let mut game = Game::new(board, self.rng.fork());
        if side == Side::Black {
            self.send_move(&mut game)?;
        }

        loop {
            match self.recv()? {
                ServerMessage::Move { side: mover, mv } if mover == side.opponent() => {
                    game.play(mv)?;
                    self.send_move(&mut game)?;
                }
                ServerMessage::End(server_summary) => {
                    game.finish();
                    let summary = MatchSummary {
                        side,
                        score: game.score(),
                        server_summary,
                        moves: game.history().len(),
                    };
                    info!(score = %summary.score, server = %summary.server_summary, "match over");
                    return Ok(summary);
                }
                other => {
                    return Err(ProtocolError::Unexpected {
                        expected: "opponent move or end",
                        got: format!("{other:?}"),
                    });
                }
            }
        }
    }

    /// Send our move and wait for `ok`. Once both sides have passed the
    /// reply is always `pass`; the server is expected to close the match.
    fn send_move(&mut self, game: &mut Game) -> Result<(), ProtocolError> {
        let mv = if game.is_over() {
            Move::Pass
        } else {
            game.step(&self.agent)?
        };
        self.send(&mv.to_string())?;
        match self.recv()? {
            ServerMessage::Ok => Ok(()),
            other => Err(ProtocolError::Unexpected {
                expected: "ok",
                got: format!("{other:?}"),
            }),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
