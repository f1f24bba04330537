//! Interactive game between a human and an engine.
//!
//! Runs over any `BufRead`/`Write` pair so the binary can hand it stdin and
//! stdout while tests feed scripted input.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use fastrand::Rng;

use crate::board::{Board, Move, Score, Side};
use crate::game::{Agent, Game};

/// How a console session ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Finished(Score),
    Quit,
}

enum Command {
    Move(Move),
    Hints,
    Quit,
}

/// A human playing against `engine` through text input.
pub struct Console<R, W> {
    input: R,
    output: W,
    show_hints: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            show_hints: false,
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        Ok(line.trim().to_ascii_lowercase())
    }

    fn choose_side(&mut self) -> Result<Side> {
        loop {
            writeln!(self.output, "Do you want to be X or O?")?;
            let line = self.read_line()?;
            let mut chars = line.chars();
            if let (Some(side), None) = (chars.next().and_then(Side::from_glyph), chars.next()) {
                return Ok(side);
            }
        }
    }

    fn show(&mut self, game: &Game, human: Side) -> Result<()> {
        if self.show_hints && game.to_move() == human {
            write!(self.output, "{}", game.board().hints(human))?;
        } else {
            write!(self.output, "{}", game.board())?;
        }
        let score = game.score();
        writeln!(
            self.output,
            "You have {} points. The computer has {} points.",
            score.of(human),
            score.of(human.opponent())
        )?;
        Ok(())
    }

    fn read_command(&mut self, board: &Board, human: Side) -> Result<Command> {
        loop {
            writeln!(
                self.output,
                "Enter your move, or type quit to end the game, or hints to turn off/on hints."
            )?;
            let line = self.read_line()?;
            match line.as_str() {
                "quit" => return Ok(Command::Quit),
                "hints" => return Ok(Command::Hints),
                _ => {}
            }
            if let Ok(mv) = line.parse::<Move>() {
                let legal = match mv {
                    Move::Play(x, y) => board.check_move(human, x, y).is_ok(),
                    Move::Pass => !board.has_legal_move(human),
                };
                if legal {
                    return Ok(Command::Move(mv));
                }
            }
            writeln!(self.output, "That is not a valid move.")?;
            writeln!(
                self.output,
                "Type the x digit (0 to {}), then space, then the y digit (0 to {}).",
                board.width() - 1,
                board.height() - 1
            )?;
        }
    }

    /// Play one game on `board` against `engine`.
    pub fn play(&mut self, board: Board, engine: &Agent, rng: Rng) -> Result<ConsoleOutcome> {
        writeln!(self.output, "Welcome to Reversi!")?;
        let human = self.choose_side()?;
        let first = if human == Side::Black { "player" } else { "computer" };
        writeln!(self.output, "The {first} will go first.")?;

        let mut game = Game::new(board, rng);
        while !game.is_over() {
            self.show(&game, human)?;

            if game.to_move() == human {
                if game.legal_moves().is_empty() {
                    writeln!(self.output, "Player has no valid move. Player forced to pass.")?;
                    game.play(Move::Pass)?;
                    continue;
                }
                match self.read_command(game.board(), human)? {
                    Command::Quit => {
                        writeln!(self.output, "Thanks for playing!")?;
                        return Ok(ConsoleOutcome::Quit);
                    }
                    Command::Hints => self.show_hints = !self.show_hints,
                    Command::Move(mv) => game.play(mv)?,
                }
            } else {
                match game.step(engine)? {
                    Move::Pass => writeln!(self.output, "Computer passed.")?,
                    Move::Play(x, y) => writeln!(self.output, "Computer played x = {x}, y = {y}")?,
                }
            }
        }

        write!(self.output, "{}", game.board())?;
        let score = game.score();
        writeln!(
            self.output,
            "X scored {} points. O scored {} points.",
            score.black, score.white
        )?;
        let (mine, theirs) = (score.of(human), score.of(human.opponent()));
        match mine.cmp(&theirs) {
            std::cmp::Ordering::Greater => writeln!(
                self.output,
                "You beat the computer by {} points! Congratulations!",
                mine - theirs
            )?,
            std::cmp::Ordering::Less => writeln!(
                self.output,
                "You lost. The computer beat you by {} points.",
                theirs - mine
            )?,
            std::cmp::Ordering::Equal => writeln!(self.output, "The game was a tie!")?,
        }
        Ok(ConsoleOutcome::Finished(score))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
