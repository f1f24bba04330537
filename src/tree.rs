//! Search tree for MCTS, stored in an arena.
//!
//! Nodes live in a contiguous `Vec` and refer to each other by [`NodeId`].
//! Parent -> child edges own the children (the arena only ever drops whole
//! subtrees); the child -> parent link is a plain index used for
//! backpropagation and never for ownership.
//!
//! Results are recorded from a single fixed perspective: the side the tree
//! was built for (`perspective`, the root's side to move). A playout result
//! of `+1` means that side won, and the same value is added to every node on
//! the path without flipping its sign between plies.

use std::collections::VecDeque;

use fastrand::Rng;

use crate::board::{Board, Move, Side};
use crate::constants::PASSES_TO_END;
use crate::playout::{RolloutPolicy, playout};

/// Index of a node in its [`SearchTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the MCTS search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Position reached at this node
    pub board: Board,
    /// Side to move at this node
    pub to_move: Side,
    /// Side whose results the whole tree records
    pub perspective: Side,
    /// Consecutive passes on the path leading here
    pub passes: u8,
    /// Parent node (None for the root)
    pub parent: Option<NodeId>,
    /// Move that produced this node from its parent
    pub mv: Option<Move>,
    /// Expanded children, in expansion order
    pub children: Vec<NodeId>,
    /// Moves not expanded yet
    untried: Vec<Move>,
    /// Number of playouts through this node
    pub visits: u32,
    /// Wins minus losses over those playouts
    pub results: i64,
}

impl TreeNode {
    /// Build a node. `link` is the parent and the move that led here, or
    /// `None` for a root.
    ///
    /// The untried moves are computed once, here. A side without legal
    /// moves gets a single `Pass`; a terminal node gets none.
    pub fn new(board: Board, to_move: Side, perspective: Side, passes: u8, link: Option<(NodeId, Move)>) -> Self {
        let untried = if passes >= PASSES_TO_END {
            Vec::new()
        } else {
            let moves: Vec<Move> = board.legal_moves(to_move).into_iter().map(Move::from).collect();
            if moves.is_empty() { vec![Move::Pass] } else { moves }
        };
        Self {
            board,
            to_move,
            perspective,
            passes,
            parent: link.map(|(parent, _)| parent),
            mv: link.map(|(_, mv)| mv),
            children: Vec::new(),
            untried,
            visits: 0,
            results: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.passes >= PASSES_TO_END
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    pub fn untried(&self) -> &[Move] {
        &self.untried
    }

    /// Mean result per visit, in [-1, 1]. Zero for unvisited nodes.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.results as f64 / self.visits as f64
        }
    }

    /// UCT value given the parent's `ln(visits)`.
    #[inline]
    fn uct(&self, ln_parent_visits: f64, exploration: f64) -> f64 {
        self.mean() + exploration * (2.0 * ln_parent_visits / self.visits as f64).sqrt()
    }
}

/// MCTS tree with arena-based node storage.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl SearchTree {
    /// Create a tree rooted at `board` with `to_move` to play, recording
    /// results for `perspective`.
    pub fn new(board: Board, to_move: Side, perspective: Side, passes: u8) -> Self {
        Self {
            nodes: vec![TreeNode::new(board, to_move, perspective, passes, None)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn root_node(&self) -> &TreeNode {
        self.get(self.root)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.get(id).is_terminal()
    }

    /// Expand one untried move of `id` into a new child.
    ///
    /// Returns `None` if the node is already fully expanded.
    pub fn expand(&mut self, id: NodeId) -> Option<NodeId> {
        let mv = self.get_mut(id).untried.pop()?;
        let node = self.get(id);
        let mut board = node.board.clone();
        let passes = match mv {
            Move::Pass => node.passes + 1,
            Move::Play(x, y) => {
                // Untried moves come from this very board
                board.apply_move(node.to_move, x, y).ok()?;
                0
            }
        };
        let child = TreeNode::new(board, node.to_move.opponent(), node.perspective, passes, Some((id, mv)));

        let child_id = NodeId(self.nodes.len());
        self.nodes.push(child);
        self.get_mut(id).children.push(child_id);
        Some(child_id)
    }

    /// Play the node's position out and score it for the tree's
    /// perspective: `+1` win, `0` tie, `-1` loss.
    pub fn simulate(&self, id: NodeId, policy: &RolloutPolicy, rng: &mut Rng) -> i32 {
        let node = self.get(id);
        let mut board = node.board.clone();
        let score = if node.is_terminal() {
            board.score()
        } else {
            playout(&mut board, node.to_move, node.passes, policy, rng)
        };
        score.outcome(node.perspective)
    }

    /// Add one visit and `result` to `id` and all of its ancestors.
    pub fn backpropagate(&mut self, id: NodeId, result: i32) {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.get_mut(cur);
            node.visits += 1;
            node.results += i64::from(result);
            current = node.parent;
        }
    }

    /// Child of `id` maximising `mean + c * sqrt(2 ln(N) / n)`.
    ///
    /// With `exploration == 0` only the mean counts and unvisited children
    /// are ignored; otherwise an unvisited child is taken first. Ties go to
    /// the earliest child. `None` if there is nothing to choose from.
    pub fn select_best_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let parent = self.get(id);
        let ln_n = f64::from(parent.visits.max(1)).ln();

        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &parent.children {
            let child = self.get(child_id);
            let value = match child.visits {
                0 if exploration > 0.0 => f64::INFINITY,
                0 => continue,
                _ => child.uct(ln_n, exploration),
            };
            if best.is_none_or(|(_, v)| value > v) {
                best = Some((child_id, value));
            }
        }
        best.map(|(child_id, _)| child_id)
    }

    /// The child of `id` produced by `mv`, if it was expanded.
    pub fn child_for(&self, id: NodeId, mv: Move) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).mv == Some(mv))
    }

    /// Re-anchor the root at the child reached by `mv`, dropping everything
    /// outside that subtree. Returns `false` (tree untouched) when `mv` was
    /// never expanded from the root.
    pub fn advance(&mut self, mv: Move) -> bool {
        match self.child_for(self.root, mv) {
            Some(child) => {
                self.retain_subtree(child);
                true
            }
            None => false,
        }
    }

    /// Compact the arena down to the subtree under `new_root`.
    fn retain_subtree(&mut self, new_root: NodeId) {
        let mut old: Vec<Option<TreeNode>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut queue = VecDeque::from([(new_root, None)]);

        while let Some((old_id, parent)) = queue.pop_front() {
            let Some(mut node) = old[old_id.0].take() else {
                continue;
            };
            let new_id = NodeId(self.nodes.len());
            node.parent = parent;
            for child in std::mem::take(&mut node.children) {
                queue.push_back((child, Some(new_id)));
            }
            self.nodes.push(node);
            if let Some(p) = parent {
                self.get_mut(p).children.push(new_id);
            }
        }
        self.root = NodeId(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_untried_moves() {
        let tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let root = tree.root_node();
        assert_eq!(root.untried().len(), 4);
        assert!(!root.is_fully_expanded());
        assert!(!root.is_terminal());
        assert_eq!(root.parent, None);
        assert_eq!(root.mv, None);
    }

    #[test]
    fn test_expand_creates_child() {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let root = tree.root();
        let child = tree.expand(root).unwrap();

        let node = tree.get(child);
        assert_eq!(node.parent, Some(root));
        assert_eq!(node.to_move, Side::White);
        assert_eq!(node.perspective, Side::Black);
        assert_eq!(node.passes, 0);
        assert_eq!(node.board.score().black, 4);
        assert_eq!(tree.root_node().children, vec![child]);
        assert_eq!(tree.root_node().untried().len(), 3);
        // The root board is untouched
        assert_eq!(tree.root_node().board, Board::standard());
    }

    #[test]
    fn test_expand_until_fully_expanded() {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let root = tree.root();
        for _ in 0..4 {
            assert!(tree.expand(root).is_some());
        }
        assert!(tree.root_node().is_fully_expanded());
        assert_eq!(tree.expand(root), None);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_pass_chain_becomes_terminal() {
        let board = Board::from_rows(&["XX", "XO"]).unwrap();
        let mut tree = SearchTree::new(board, Side::White, Side::White, 0);
        assert_eq!(tree.root_node().untried(), &[Move::Pass]);

        let one = tree.expand(tree.root()).unwrap();
        assert_eq!(tree.get(one).passes, 1);
        assert_eq!(tree.get(one).to_move, Side::Black);
        assert!(!tree.is_terminal(one));

        let two = tree.expand(one).unwrap();
        assert_eq!(tree.get(two).passes, 2);
        assert!(tree.is_terminal(two));
        assert!(tree.get(two).is_fully_expanded());
    }

    #[test]
    fn test_play_resets_pass_count() {
        let board = Board::from_rows(&["XO."]).unwrap();
        // White passed just before; Black can still play
        let mut tree = SearchTree::new(board, Side::Black, Side::Black, 1);
        let child = tree.expand(tree.root()).unwrap();
        assert_eq!(tree.get(child).mv, Some(Move::Play(2, 0)));
        assert_eq!(tree.get(child).passes, 0);
    }

    #[test]
    fn test_simulate_terminal_uses_raw_count() {
        let board = Board::from_rows(&["XXO", "X.X"]).unwrap();
        let tree = SearchTree::new(board.clone(), Side::Black, Side::White, 2);
        let mut rng = Rng::with_seed(1);
        assert_eq!(tree.simulate(tree.root(), &RolloutPolicy::Greedy, &mut rng), -1);
        let tree = SearchTree::new(board, Side::Black, Side::Black, 2);
        assert_eq!(tree.simulate(tree.root(), &RolloutPolicy::Random, &mut rng), 1);
    }

    #[test]
    fn test_backpropagate_reaches_root() {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let child = tree.expand(tree.root()).unwrap();
        let grandchild = tree.expand(child).unwrap();

        tree.backpropagate(grandchild, -1);
        tree.backpropagate(child, 1);

        assert_eq!(tree.get(grandchild).visits, 1);
        assert_eq!(tree.get(grandchild).results, -1);
        assert_eq!(tree.get(child).visits, 2);
        assert_eq!(tree.get(child).results, 0);
        assert_eq!(tree.root_node().visits, 2);
        assert_eq!(tree.root_node().results, 0);
    }

    fn tree_with_two_children() -> (SearchTree, NodeId, NodeId) {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let root = tree.root();
        let a = tree.expand(root).unwrap();
        let b = tree.expand(root).unwrap();
        (tree, a, b)
    }

    fn set_stats(tree: &mut SearchTree, id: NodeId, visits: u32, results: i64) {
        let node = tree.get_mut(id);
        node.visits = visits;
        node.results = results;
        let root = tree.root();
        let total: u32 = tree.get(root).children.iter().map(|&c| tree.get(c).visits).sum();
        tree.get_mut(root).visits = total;
    }

    #[test]
    fn test_select_best_child_exploitation_only() {
        let (mut tree, a, b) = tree_with_two_children();
        let root = tree.root();
        set_stats(&mut tree, a, 10, 6);
        set_stats(&mut tree, b, 10, 4);
        assert_eq!(tree.select_best_child(root, 0.0), Some(a));

        // Same win rates, many more visits on the weaker child
        set_stats(&mut tree, b, 1000, 400);
        assert_eq!(tree.select_best_child(root, 0.0), Some(a));
        set_stats(&mut tree, a, 1000, 600);
        assert_eq!(tree.select_best_child(root, 0.0), Some(a));
    }

    #[test]
    fn test_select_best_child_exploration() {
        let (mut tree, a, b) = tree_with_two_children();
        let root = tree.root();
        set_stats(&mut tree, a, 5, 5);
        // b unvisited: explored first, ignored when exploiting
        assert_eq!(tree.select_best_child(root, 1.0), Some(b));
        assert_eq!(tree.select_best_child(root, 0.0), Some(a));

        // A large constant favours the rarely visited child
        set_stats(&mut tree, a, 100, 60);
        set_stats(&mut tree, b, 2, 0);
        assert_eq!(tree.select_best_child(root, 0.0), Some(a));
        assert_eq!(tree.select_best_child(root, 2.0), Some(b));
    }

    #[test]
    fn test_select_best_child_without_children() {
        let tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        assert_eq!(tree.select_best_child(tree.root(), 0.0), None);
        assert_eq!(tree.select_best_child(tree.root(), 1.0), None);
    }

    #[test]
    fn test_advance_keeps_subtree() {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        let root = tree.root();
        let a = tree.expand(root).unwrap();
        let _b = tree.expand(root).unwrap();
        let a1 = tree.expand(a).unwrap();
        let _a2 = tree.expand(a).unwrap();
        tree.backpropagate(a1, 1);

        let mv = tree.get(a).mv.unwrap();
        let board = tree.get(a).board.clone();
        assert!(tree.advance(mv));

        assert_eq!(tree.len(), 3);
        let new_root = tree.root_node();
        assert_eq!(new_root.parent, None);
        assert_eq!(new_root.board, board);
        assert_eq!(new_root.visits, 1);
        assert_eq!(new_root.children.len(), 2);
        for &c in &new_root.children {
            assert_eq!(tree.get(c).parent, Some(tree.root()));
        }
    }

    #[test]
    fn test_advance_unknown_move() {
        let mut tree = SearchTree::new(Board::standard(), Side::Black, Side::Black, 0);
        assert!(!tree.advance(Move::Play(2, 4)));
        assert_eq!(tree.len(), 1);
    }
}
