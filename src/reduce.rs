//! Redundancy elision and table materialization.
//!
//! The builder keeps every level complete: a node whose two edges coincide
//! is still registered, only marked redundant. Emission has to jump over
//! such nodes, possibly several levels at a time, which is what the skip
//! chains computed here provide.

use crate::bdd::Bdd;
use crate::edge::Edge;

/// For every redundant node, the `(level, edge)` it ultimately reduces to.
#[derive(Debug, Clone)]
pub struct SkipChains {
    inputs: usize,
    targets: Vec<Vec<Option<(usize, Edge)>>>,
}

impl SkipChains {
    /// Builds the chains bottom-up, so a node's target is final before any parent reads it.
    pub fn new(bdd: &Bdd) -> Self {
        let inputs = bdd.n_inputs();
        let mut chains = Self {
            inputs,
            targets: (0..inputs).map(|l| vec![None; bdd.indices(l).len()]).collect(),
        };
        for level in (0..inputs).rev() {
            for &pos in bdd.redundant(level) {
                let (edge, _) = bdd.children(level)[pos];
                let target = chains.resolve(level + 1, edge);
                chains.targets[level][pos] = Some(target);
            }
        }
        chains
    }

    /// Follows `edge`, which leaves for `level`, past every redundant node.
    ///
    /// Returns the level of the first node that really decides a variable,
    /// or `inputs` for a terminal.
    pub fn resolve(&self, level: usize, edge: Edge) -> (usize, Edge) {
        let Some(pos) = edge.position() else {
            return (self.inputs, edge);
        };
        match self.targets[level][pos] {
            Some((target, next)) => (target, next.complement_if(edge.is_complemented())),
            None => (level, edge),
        }
    }

    /// Whether the node at `pos` of `level` is skipped.
    pub fn is_skipped(&self, level: usize, pos: usize) -> bool {
        self.targets[level][pos].is_some()
    }
}

impl Bdd {
    /// Rewrites the table so every registered slice equals the function its edges describe.
    ///
    /// Levels are processed deepest first; afterwards each output's slice is
    /// replaced by its root function. Only don't-care rows can change, and
    /// implication checks on the table become exact for the emitted diagram.
    pub fn materialize(&mut self) {
        assert!(!self.stale, "diagram must be rebuilt after a bare swap");
        let structure = &self.structure;
        let table = &mut self.table;
        for level in (0..self.order.len()).rev() {
            for (pos, &raw) in structure.indices[level].iter().enumerate() {
                let (e0, e1) = structure.children[level][pos];
                for (half, edge) in [(raw << 1, e0), ((raw << 1) | 1, e1)] {
                    let src = edge.position().map(|p| structure.indices[level + 1][p]);
                    table.copy_func(half, src, level + 1, edge.is_complemented());
                }
            }
        }
        for (output, &root) in structure.roots.iter().enumerate() {
            let src = root.position().map(|p| structure.indices[0][p]);
            table.copy_func(output, src, 0, root.is_complemented());
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bdd::BddConfig;
    use crate::merge::MergePolicy;
    use crate::table::PackedTable;

    #[test]
    fn test_chains_skip_redundant_levels() {
        // f = x2 reads only the last input.
        let bdd = Bdd::from_onsets(3, &[vec![1, 3, 5, 7]], BddConfig::default()).unwrap();
        let chains = SkipChains::new(&bdd);
        assert!(chains.is_skipped(0, 0));
        assert!(chains.is_skipped(1, 0));
        assert!(!chains.is_skipped(2, 0));
        assert_eq!(chains.resolve(0, bdd.roots()[0]), (2, Edge::node(0)));
        assert_eq!(chains.resolve(0, !bdd.roots()[0]), (2, !Edge::node(0)));
        assert_eq!(chains.resolve(1, Edge::ONE), (3, Edge::ONE));
    }

    #[test]
    fn test_materialize_keeps_exact_tables() {
        let onsets = [vec![0, 5, 6, 9, 13, 14], vec![1, 2, 3, 7, 11, 15]];
        let mut bdd = Bdd::from_onsets(4, &onsets, BddConfig::default()).unwrap();
        let table = bdd.table().clone();
        bdd.materialize();
        assert_eq!(bdd.table(), &table);
    }

    #[test]
    fn test_materialize_fills_dont_cares() {
        let table = PackedTable::from_onsets(3, &[vec![0, 2, 5, 7]]).unwrap();
        let care = PackedTable::from_onsets(3, &[vec![0, 1, 2, 5, 7]]).unwrap();
        let config = BddConfig::default().with_policy(MergePolicy::TwoSided);
        let mut bdd = Bdd::with_care(table.clone(), Some(care.clone()), config).unwrap();
        bdd.complete_merge();
        bdd.materialize();
        for row in 0..8 {
            assert_eq!(bdd.table_value(0, row), bdd.evaluate(0, row), "row {}", row);
            if care.bit(row) {
                assert_eq!(bdd.table_value(0, row), table.bit(row), "row {}", row);
            }
        }
        // An exact rebuild of the materialized table can only share more.
        let rebuilt = Bdd::new(bdd.table().clone(), BddConfig::default());
        assert!(rebuilt.node_count() <= bdd.node_count());
    }
}
