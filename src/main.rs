//! Reversi engine command line.
//!
//! ## Usage
//!
//! - `reversi-mcts play` - Play against the engine in the terminal
//! - `reversi-mcts client` - Connect to a match server
//! - `reversi-mcts arena` - Pit the engine against the greedy player

use std::io::{self, BufReader};
use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fastrand::Rng;
use tracing::info;

use reversi_mcts::arena::{ArenaConfig, run_arena};
use reversi_mcts::board::{Board, Point};
use reversi_mcts::console::{Console, ConsoleOutcome};
use reversi_mcts::constants::{
    ARENA_GAMES, CLIENT_NAME, DEFAULT_HEIGHT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WIDTH, EXPLORATION,
    ROLLOUTS_PER_LEAF, TIME_BUDGET_MS,
};
use reversi_mcts::game::Agent;
use reversi_mcts::greedy::GreedyPolicy;
use reversi_mcts::mcts::{Mcts, MctsConfig};
use reversi_mcts::playout::RolloutPolicy;
use reversi_mcts::protocol::MatchClient;

/// Reversi engine with Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "reversi-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Seed for all randomness (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine in the terminal
    Play {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Connect to a match server and play until it disconnects
    Client {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Name announced to the server
        #[arg(long, default_value = CLIENT_NAME)]
        name: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Play automated games against an epsilon-greedy opponent
    Arena {
        #[arg(long, default_value_t = ARENA_GAMES)]
        games: usize,
        /// Start from this many random stones (at least 2) instead of the
        /// centre four; layouts where nobody can move are redrawn
        #[arg(long)]
        random_stones: Option<usize>,
        /// Exploration rate of the greedy opponent
        #[arg(long, default_value_t = 0.0)]
        opponent_epsilon: f64,
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: usize,
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: usize,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args)]
struct BoardArgs {
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,
    /// Initial stone as `x,y`; repeat for more. Owners follow `x + y` parity
    #[arg(long = "stone", value_parser = parse_stone)]
    stones: Vec<Point>,
}

impl BoardArgs {
    fn build(&self) -> Result<Board> {
        let stones = (!self.stones.is_empty()).then_some(self.stones.as_slice());
        Ok(Board::new(self.width, self.height, stones)?)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    Greedy,
    Mcts,
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, value_enum, default_value_t = EngineKind::Mcts)]
    engine: EngineKind,
    /// Thinking time per move in milliseconds
    #[arg(long, default_value_t = TIME_BUDGET_MS)]
    time_ms: u64,
    /// UCT exploration constant
    #[arg(long, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Rollout policy: greedy, random or epsilon:<rate>
    #[arg(long, default_value = "greedy")]
    rollout: RolloutPolicy,
    #[arg(long, default_value_t = ROLLOUTS_PER_LEAF)]
    rollouts_per_leaf: u32,
    /// Exploration rate of the greedy engine
    #[arg(long, default_value_t = 0.0)]
    epsilon: f64,
}

impl EngineArgs {
    fn agent(&self) -> Result<Agent> {
        match self.engine {
            EngineKind::Greedy => {
                let policy = GreedyPolicy::epsilon(self.epsilon);
                policy.validate()?;
                Ok(Agent::Greedy(policy))
            }
            EngineKind::Mcts => {
                let config = MctsConfig {
                    time_budget: Duration::from_millis(self.time_ms),
                    exploration: self.exploration,
                    rollout: self.rollout,
                    rollouts_per_leaf: self.rollouts_per_leaf,
                    max_iterations: None,
                };
                config.validate()?;
                Ok(Agent::Mcts(Mcts::new(config)))
            }
        }
    }
}

fn parse_stone(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y (got {s:?})"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok((x, y))
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut rng = match cli.seed {
        Some(seed) => Rng::with_seed(seed),
        None => Rng::new(),
    };

    match cli.command {
        Commands::Play { board, engine } => {
            let board = board.build()?;
            let agent = engine.agent()?;
            let mut console = Console::new(io::stdin().lock(), io::stdout());
            if let ConsoleOutcome::Finished(score) = console.play(board, &agent, rng)? {
                info!(%score, "game over");
            }
        }
        Commands::Client {
            host,
            port,
            name,
            engine,
        } => {
            let agent = engine.agent()?;
            let stream = TcpStream::connect((host.as_str(), port))
                .with_context(|| format!("failed to connect to {host}:{port}"))?;
            info!(%host, port, agent = agent.name(), "connected");
            let reader = BufReader::new(stream.try_clone()?);
            let mut client = MatchClient::new(reader, stream, name, agent, rng);
            let summaries = client.run()?;
            let wins = summaries.iter().filter(|s| s.outcome() > 0).count();
            info!(matches = summaries.len(), wins, "client finished");
        }
        Commands::Arena {
            games,
            random_stones,
            opponent_epsilon,
            width,
            height,
            engine,
        } => {
            let contender = engine.agent()?;
            let opponent = GreedyPolicy::epsilon(opponent_epsilon);
            opponent.validate()?;
            let config = ArenaConfig {
                games,
                width,
                height,
                random_stones,
            };
            let report = run_arena(&contender, &Agent::Greedy(opponent), &config, &mut rng)?;
            println!("{report}");
        }
    }

    Ok(())
}
