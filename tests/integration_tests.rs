//! Integration tests for reversi-mcts
//!
//! End-to-end checks of the rules, the engines and the match client, using
//! only the public API.

use std::time::Duration;

use fastrand::Rng;

use reversi_mcts::board::{Board, Move, Score, Side};
use reversi_mcts::error::ProtocolError;
use reversi_mcts::game::{Agent, Game};
use reversi_mcts::greedy::GreedyPolicy;
use reversi_mcts::mcts::{Mcts, MctsConfig};
use reversi_mcts::playout::{RolloutPolicy, playout};
use reversi_mcts::protocol::{MatchClient, MatchSummary};
use reversi_mcts::tree::SearchTree;

// =============================================================================
// Helper functions
// =============================================================================

fn capped_mcts(iterations: usize) -> Mcts {
    Mcts::new(MctsConfig {
        time_budget: Duration::from_secs(60),
        max_iterations: Some(iterations),
        ..MctsConfig::default()
    })
}

/// Run a client against a scripted server and return the result and
/// everything the client sent.
fn run_session(server: &str, agent: Agent) -> (Result<Vec<MatchSummary>, ProtocolError>, String) {
    let mut client = MatchClient::new(server.as_bytes(), Vec::new(), "mcts", agent, Rng::with_seed(5));
    let result = client.run();
    let (_, sent) = client.into_inner();
    (result, String::from_utf8(sent).unwrap())
}

// =============================================================================
// Rules
// =============================================================================

#[test]
fn test_opening_moves() {
    let board = Board::standard();
    assert_eq!(board.legal_moves(Side::Black), vec![(2, 4), (3, 5), (4, 2), (5, 3)]);
    assert_eq!(board.legal_moves(Side::White).len(), 4);
}

#[test]
fn test_greedy_choice_flips_exactly_the_run() {
    let before = Board::standard();
    let policy = GreedyPolicy {
        corner_priority: false,
        ..GreedyPolicy::greedy()
    };
    let mut rng = Rng::with_seed(13);
    let (x, y) = policy
        .choose(&before, Side::Black, &mut rng)
        .point()
        .unwrap();

    // Every opening move captures one stone, closed by a Black stone behind it
    let run = before.flips(Side::Black, x, y);
    assert_eq!(run.len(), 1);
    let (fx, fy) = run[0];
    assert_eq!(before.get(fx, fy), Some(Side::White));
    assert_eq!(before.get(2 * fx - x, 2 * fy - y), Some(Side::Black));

    let mut after = before.clone();
    assert_eq!(after.apply_move(Side::Black, x, y), Ok(1));
    for cy in 0..before.height() {
        for cx in 0..before.width() {
            let expected = if (cx, cy) == (x, y) || (cx, cy) == (fx, fy) {
                Some(Side::Black)
            } else {
                before.get(cx, cy)
            };
            assert_eq!(after.get(cx, cy), expected, "cell ({cx}, {cy})");
        }
    }
    assert_eq!(after.score(), Score { black: 4, white: 1 });
}

#[test]
fn test_illegal_moves_are_rejected() {
    let mut board = Board::standard();
    assert!(board.apply_move(Side::Black, 0, 0).is_err());
    assert!(board.apply_move(Side::Black, 3, 3).is_err());
    assert!(board.apply_move(Side::Black, 8, 0).is_err());
    assert!(board.play(Side::Black, Move::Pass).is_err());
    assert_eq!(board, Board::standard());
}

#[test]
fn test_move_accounting_over_a_game() {
    let mut board = Board::standard();
    let mut side = Side::Black;
    let mut rng = Rng::with_seed(21);
    let policy = GreedyPolicy::random();
    while !board.is_game_over() {
        for (x, y) in board.legal_moves(side) {
            assert_eq!(board.get(x, y), None);
        }
        if let Move::Play(x, y) = policy.choose(&board, side, &mut rng) {
            let before = board.score();
            let flips = board.apply_move(side, x, y).unwrap();
            let after = board.score();
            assert!(flips >= 1);
            assert_eq!(after.total(), before.total() + 1);
            assert_eq!(after.of(side), before.of(side) + 1 + flips);
            assert_eq!(after.of(side.opponent()), before.of(side.opponent()) - flips);
        }
        side = side.opponent();
    }
}

#[test]
fn test_clone_is_independent() {
    let board = Board::standard();
    assert_eq!(board.clone().score(), board.score());
    let mut copy = board.clone();
    assert_eq!(copy.score(), board.score());
    copy.apply_move(Side::Black, 2, 4).unwrap();
    assert_ne!(copy, board);
    assert_eq!(board.score(), Score { black: 2, white: 2 });
}

#[test]
fn test_position_without_moves_is_terminal() {
    let mut board = Board::from_rows(&["XXO", "X.X"]).unwrap();
    assert!(board.is_game_over());
    let mut rng = Rng::with_seed(1);
    let score = playout(&mut board, Side::Black, 0, &RolloutPolicy::Greedy, &mut rng);
    assert_eq!(score, Score { black: 5, white: 1 });
    assert_eq!(score.winner(), Some(Side::Black));
}

#[test]
fn test_custom_board_and_stones() {
    let board = Board::new(10, 6, Some(&[(2, 2), (3, 2), (2, 3), (3, 3)])).unwrap();
    assert_eq!(board.width(), 10);
    assert_eq!(board.height(), 6);
    assert_eq!(board.get(2, 2), Some(Side::Black));
    assert_eq!(board.get(3, 2), Some(Side::White));
    assert!(Board::new(4, 4, Some(&[(4, 0)])).is_err());
    assert!(Board::new(1, 1, None).is_err());
}

// =============================================================================
// Engines
// =============================================================================

#[test]
fn test_greedy_does_not_mutate() {
    let board = Board::standard();
    let mut rng = Rng::with_seed(2);
    let mv = GreedyPolicy::greedy().choose(&board, Side::Black, &mut rng);
    assert!(mv.point().is_some_and(|p| board.legal_moves(Side::Black).contains(&p)));
    assert_eq!(board, Board::standard());
}

#[test]
fn test_mcts_returns_the_only_move() {
    let board = Board::from_rows(&["XO.", "...", "..."]).unwrap();
    let mcts = Mcts::new(MctsConfig {
        time_budget: Duration::from_secs(3600),
        ..MctsConfig::default()
    });
    let mut tree = SearchTree::new(board, Side::Black, Side::Black, 0);
    assert_eq!(mcts.best_move(&mut tree, &mut Rng::with_seed(1)), Move::Play(2, 0));
}

#[test]
fn test_mcts_does_not_touch_the_game_board() {
    let mut game = Game::new(Board::standard(), Rng::with_seed(4));
    let mv = game.think(&Agent::Mcts(capped_mcts(100)));
    assert_eq!(*game.board(), Board::standard());
    assert!(mv.point().is_some_and(|p| game.legal_moves().contains(&p)));
}

#[test]
fn test_mcts_beats_random_more_often_than_not() {
    let mcts = Agent::Mcts(capped_mcts(200));
    let random = Agent::Greedy(GreedyPolicy::random());
    let mut wins = 0;
    for seed in 0..4 {
        let mut game = Game::new(Board::new(6, 6, None).unwrap(), Rng::with_seed(seed));
        let score = game.play_out(&mcts, &random).unwrap();
        if score.outcome(Side::Black) > 0 {
            wins += 1;
        }
    }
    assert!(wins >= 2, "MCTS won only {wins} of 4 games");
}

// =============================================================================
// Match protocol
// =============================================================================

#[test]
fn test_session_as_black() {
    // ". O X": Black's only move is (0, 0), after which nobody can move
    let server = concat!(
        "name?\n",
        "board {\"width\": 3, \"height\": 1, \"stones\": [[1, 0], [2, 0]]}\n",
        "piece X\n",
        "ok\n",
        "O pass\n",
        "ok\n",
        "end X 3 - O 0\n",
        "disconnect\n",
    );
    let (result, sent) = run_session(server, Agent::Mcts(capped_mcts(50)));
    assert_eq!(sent, "mcts\n0 0\npass\n");

    let summaries = result.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].side, Side::Black);
    assert_eq!(summaries[0].score, Score { black: 3, white: 0 });
    assert_eq!(summaries[0].server_summary, "X 3 - O 0");
    assert_eq!(summaries[0].moves, 3);
    assert_eq!(summaries[0].outcome(), 1);
}

#[test]
fn test_session_as_white() {
    let server = concat!(
        "name?\n",
        "board {\"sizeX\": 8, \"sizeY\": 8}\n",
        "piece O\n",
        "X 2 4\n",
        "ok\n",
        "end\n",
        "disconnect\n",
    );
    let (result, sent) = run_session(server, Agent::Greedy(GreedyPolicy::greedy()));
    let summaries = result.unwrap();
    assert_eq!(summaries[0].side, Side::White);

    let lines: Vec<&str> = sent.lines().collect();
    assert_eq!(lines.len(), 2);
    let reply: Move = lines[1].parse().unwrap();

    let mut board = Board::standard();
    board.apply_move(Side::Black, 2, 4).unwrap();
    assert!(reply.point().is_some_and(|p| board.legal_moves(Side::White).contains(&p)));
}

#[test]
fn test_session_with_two_matches() {
    let one_match = concat!(
        "board {\"width\": 3, \"height\": 1, \"stones\": [[1, 0], [2, 0]]}\n",
        "piece X\n",
        "ok\n",
        "O pass\n",
        "ok\n",
        "end\n",
    );
    let server = format!("name?\n{one_match}{one_match}disconnect\n");
    let (result, _) = run_session(&server, Agent::Greedy(GreedyPolicy::greedy()));
    assert_eq!(result.unwrap().len(), 2);
}

#[test]
fn test_session_rejects_illegal_opponent_move() {
    let server = "name?\nboard {}\npiece O\nX 0 0\n";
    let (result, _) = run_session(server, Agent::Greedy(GreedyPolicy::greedy()));
    assert!(matches!(result, Err(ProtocolError::IllegalMove(_))));
}

#[test]
fn test_session_rejects_move_for_wrong_side() {
    let server = "name?\nboard {}\npiece O\nO 2 4\n";
    let (result, _) = run_session(server, Agent::Greedy(GreedyPolicy::greedy()));
    assert!(matches!(result, Err(ProtocolError::Unexpected { .. })));
}

#[test]
fn test_session_requires_ok() {
    let server = "name?\nboard {}\npiece X\nX 2 4\n";
    let (result, sent) = run_session(server, Agent::Greedy(GreedyPolicy::greedy()));
    assert!(matches!(result, Err(ProtocolError::Unexpected { expected: "ok", .. })));
    assert_eq!(sent.lines().count(), 2);
}
