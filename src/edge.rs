//! Diagram edges: a node position plus a complement bit.
//!
//! An edge is packed into an `i32` the same way throughout the engine: a
//! non-negative value is `(position << 1) | complement`, where `position`
//! indexes the canonical node set of the level below the edge's source.
//! The two terminals are negative sentinels, chosen so that flipping the
//! complement bit maps one constant onto the other.

use std::fmt::{Display, Formatter};
use std::ops::Not;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Edge(i32);

impl Edge {
    /// Constant false.
    pub const ZERO: Edge = Edge(-2);
    /// Constant true.
    pub const ONE: Edge = Edge(-1);

    /// Uncomplemented edge to the node at `position` of its level.
    pub fn node(position: usize) -> Self {
        debug_assert!(position < (1 << 30), "node position {} does not fit an edge", position);
        Edge((position as i32) << 1)
    }

    /// The constant edge for `value`.
    pub const fn constant(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }

    pub const fn is_const(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == Self::ZERO.0
    }

    pub const fn is_one(self) -> bool {
        self.0 == Self::ONE.0
    }

    /// Whether the referenced function is read inverted.
    ///
    /// For terminals this is true for [`Edge::ONE`], the complement of [`Edge::ZERO`].
    pub const fn is_complemented(self) -> bool {
        self.0 & 1 != 0
    }

    /// Node position within its level, or `None` for a terminal.
    pub fn position(self) -> Option<usize> {
        if self.is_const() {
            None
        } else {
            Some((self.0 >> 1) as usize)
        }
    }

    /// This edge with its complement bit flipped when `flag` is set.
    pub const fn complement_if(self, flag: bool) -> Self {
        Edge(self.0 ^ flag as i32)
    }

    /// Return the internal representation.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Not for Edge {
    type Output = Self;

    fn not(self) -> Self::Output {
        Edge(self.0 ^ 1)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.position() {
            None => write!(f, "{}", if self.is_one() { "1" } else { "0" }),
            Some(pos) => write!(f, "{}@{}", if self.is_complemented() { "~" } else { "" }, pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_constants() {
        assert!(Edge::ZERO.is_const());
        assert!(Edge::ONE.is_const());
        assert_eq!(!Edge::ZERO, Edge::ONE);
        assert_eq!(!Edge::ONE, Edge::ZERO);
        assert!(Edge::ONE.is_complemented());
        assert!(!Edge::ZERO.is_complemented());
        assert_eq!(Edge::constant(true), Edge::ONE);
        assert_eq!(Edge::ZERO.position(), None);
    }

    #[test]
    fn test_node_edges() {
        let e = Edge::node(5);
        assert_eq!(e.position(), Some(5));
        assert!(!e.is_complemented());
        assert!(!e.is_const());
        assert_eq!((!e).position(), Some(5));
        assert!((!e).is_complemented());
        assert_eq!(!!e, e);
        assert_eq!(e.complement_if(true), !e);
        assert_eq!(e.complement_if(false), e);
        assert_eq!(e.get(), 10);
    }

    #[test]
    fn test_display() {
        assert_eq!(Edge::node(3).to_string(), "@3");
        assert_eq!((!Edge::node(3)).to_string(), "~@3");
        assert_eq!(Edge::ONE.to_string(), "1");
        assert_eq!(Edge::ZERO.to_string(), "0");
    }
}
