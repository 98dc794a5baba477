use thiserror::Error;

/// A broken structural or coloring invariant, as reported by the
/// `validate` methods of the trees.
///
/// Depths are counted from the root, which is at depth 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("root node is red")]
    RedRoot,

    #[error("red node at depth {depth} has a red child")]
    RedRed { depth: usize },

    #[error("unequal black heights below node at depth {depth}: left {left}, right {right}")]
    BlackHeight {
        left: usize,
        right: usize,
        depth: usize,
    },

    #[error("keys out of order at in-order position {position}")]
    OutOfOrder { position: usize },

    #[error("node at depth {depth} does not point back to its parent")]
    BrokenParentLink { depth: usize },

    #[error("tree reports {expected} nodes but {found} are reachable from the root")]
    LenMismatch { expected: usize, found: usize },
}
