use std::fmt::Debug;

use log::{debug, info};

use crate::checkpoint::Checkpoint;
use crate::edge::Edge;
use crate::error::Error;
use crate::merge::{MergePolicy, PendingMerge};
use crate::table::{CareMask, PackedTable};
use crate::trace::SimTrace;
use crate::types::{Level, Var, VarOrder};

/// Upper bound on the passes of one [`Bdd::build`] under a care vector.
const MAX_PASSES: usize = 8;

/// Engine configuration, built with the `with_*` methods.
///
/// ```
/// use ttbdd::bdd::BddConfig;
/// use ttbdd::merge::MergePolicy;
///
/// let config = BddConfig::default()
///     .with_policy(MergePolicy::TwoSided)
///     .with_sift_rounds(5)
///     .with_seed(42);
/// assert_eq!(config.rarity, 1);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// How cofactors that differ only on don't-care rows are merged.
    pub policy: MergePolicy,
    /// Occurrences needed before a traced pattern becomes a care row (0 disables care tracking).
    pub rarity: usize,
    /// Random restarts in [`Bdd::random_sift_reo`] when driven through [`Bdd::reorder`].
    pub sift_rounds: usize,
    /// Seed for the restart shuffles.
    pub seed: u64,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Exact,
            rarity: 1,
            sift_rounds: 20,
            seed: 0,
        }
    }
}

impl BddConfig {
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rarity(mut self, rarity: usize) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_sift_rounds(mut self, rounds: usize) -> Self {
        self.sift_rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Canonical index structures of one build, indexed by level.
///
/// `indices[L]` lists the raw table indices registered at level `L` in
/// registration order; an [`Edge`] leaving level `L - 1` addresses a
/// position in that list. `children[L][p]` holds the two edges of the node
/// at position `p` and `redundant[L]` the positions whose edges coincide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Structure {
    pub(crate) roots: Vec<Edge>,
    pub(crate) indices: Vec<Vec<usize>>,
    pub(crate) children: Vec<Vec<(Edge, Edge)>>,
    pub(crate) redundant: Vec<Vec<usize>>,
    pub(crate) merges: Vec<Vec<PendingMerge>>,
}

impl Structure {
    fn new(inputs: usize, outputs: usize) -> Self {
        Self {
            roots: vec![Edge::ZERO; outputs],
            indices: vec![Vec::new(); inputs],
            children: vec![Vec::new(); inputs],
            redundant: vec![Vec::new(); inputs],
            merges: vec![Vec::new(); inputs + 1],
        }
    }

    fn clear(&mut self) {
        self.roots.fill(Edge::ZERO);
        for level in self.indices.iter_mut() {
            level.clear();
        }
        for level in self.children.iter_mut() {
            level.clear();
        }
        for level in self.redundant.iter_mut() {
            level.clear();
        }
        for level in self.merges.iter_mut() {
            level.clear();
        }
    }
}

/// Truth-table backed ROBDD over one group of outputs sharing one input support.
pub struct Bdd {
    pub(crate) config: BddConfig,
    pub(crate) table: PackedTable,
    pub(crate) care: Option<PackedTable>,
    pub(crate) order: VarOrder,
    pub(crate) structure: Structure,
    pub(crate) slots: Vec<Option<Checkpoint>>,
    pub(crate) swaps: usize,
    /// Set by a bare [`Bdd::swap`]: the table moved but the index structures did not.
    pub(crate) stale: bool,
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("inputs", &self.n_inputs())
            .field("outputs", &self.n_outputs())
            .field("policy", &self.config.policy)
            .field("order", &self.order.to_string())
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl Bdd {
    /// Builds the diagram of `table` without don't-care information.
    pub fn new(table: PackedTable, config: BddConfig) -> Self {
        let mut bdd = Self::bare(table, None, config);
        bdd.build();
        bdd
    }

    /// Builds the diagram of `table`, treating rows outside `care` as don't-care.
    ///
    /// With [`MergePolicy::Exact`] the care vector is ignored.
    pub fn with_care(table: PackedTable, care: Option<PackedTable>, config: BddConfig) -> Result<Self, Error> {
        if let Some(care) = &care {
            if !care.same_shape(&table) {
                return Err(Error::CareShape {
                    expected: (table.inputs(), table.outputs()),
                    found: (care.inputs(), care.outputs()),
                });
            }
        }
        let care = if config.policy.uses_care() { care } else { None };
        let mut bdd = Self::bare(table, care, config);
        bdd.build();
        Ok(bdd)
    }

    /// Builds the diagram of the functions given by their on-sets.
    pub fn from_onsets<S: AsRef<[usize]>>(inputs: usize, onsets: &[S], config: BddConfig) -> Result<Self, Error> {
        Ok(Self::new(PackedTable::from_onsets(inputs, onsets)?, config))
    }

    /// Builds the diagram of the on-sets, deriving the care vector from a simulation trace.
    pub fn from_onsets_and_trace<S: AsRef<[usize]>>(
        inputs: usize,
        onsets: &[S],
        trace: &SimTrace,
        config: BddConfig,
    ) -> Result<Self, Error> {
        if trace.n_lanes() != inputs {
            return Err(Error::LaneCount {
                expected: inputs,
                found: trace.n_lanes(),
            });
        }
        let table = PackedTable::from_onsets(inputs, onsets)?;
        let care = trace.care_table(table.outputs(), config.rarity)?;
        Self::with_care(table, care, config)
    }

    fn bare(table: PackedTable, care: Option<PackedTable>, config: BddConfig) -> Self {
        let inputs = table.inputs();
        let outputs = table.outputs();
        Self {
            config,
            table,
            care,
            order: VarOrder::identity(inputs),
            structure: Structure::new(inputs, outputs),
            slots: Vec::new(),
            swaps: 0,
            stale: true,
        }
    }
}

impl Bdd {
    pub fn config(&self) -> &BddConfig {
        &self.config
    }

    pub fn table(&self) -> &PackedTable {
        &self.table
    }

    pub fn care(&self) -> Option<&PackedTable> {
        self.care.as_ref()
    }

    pub fn order(&self) -> &VarOrder {
        &self.order
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn n_inputs(&self) -> usize {
        self.table.inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.table.outputs()
    }

    /// Root edge of every output.
    pub fn roots(&self) -> &[Edge] {
        &self.structure.roots
    }

    /// Raw table indices registered at `level`, in registration order.
    pub fn indices(&self, level: usize) -> &[usize] {
        &self.structure.indices[level]
    }

    /// Child edges of the nodes registered at `level`.
    pub fn children(&self, level: usize) -> &[(Edge, Edge)] {
        &self.structure.children[level]
    }

    /// Positions at `level` whose two children coincide.
    pub fn redundant(&self, level: usize) -> &[usize] {
        &self.structure.redundant[level]
    }

    /// Merges recorded at `level` and not yet applied to the table.
    pub fn pending_merges(&self, level: usize) -> &[PendingMerge] {
        &self.structure.merges[level]
    }

    /// Number of adjacent transpositions performed so far.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Whether the index structures lag behind the table after a bare [`Bdd::swap`].
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Number of diagram nodes at `level`, not counting redundant ones.
    pub fn level_count(&self, level: Level) -> usize {
        let l = level.index();
        self.structure.indices[l].len() - self.structure.redundant[l].len()
    }

    /// Total diagram size: the constant plus every non-redundant node.
    pub fn node_count(&self) -> usize {
        1 + (0..self.n_inputs()).map(|l| self.level_count(Level::new(l))).sum::<usize>()
    }

    /// Value of the original function table for `output` at input assignment `row`.
    ///
    /// `row` uses input 0 as its most significant bit, independent of the current order.
    pub fn table_value(&self, output: usize, row: usize) -> bool {
        self.table.bit(self.position(output, row))
    }

    /// Whether `row` of `output` is a care row (always true without a care vector).
    pub fn is_care(&self, output: usize, row: usize) -> bool {
        let Some(care) = &self.care else {
            return true;
        };
        care.bit(self.position(output, row))
    }

    /// Global table bit holding `row` of `output` under the current order.
    fn position(&self, output: usize, row: usize) -> usize {
        let n = self.n_inputs();
        let pos = (0..n)
            .filter(|&v| (row >> (n - 1 - v)) & 1 == 1)
            .fold(0, |acc, v| acc | 1 << (n - 1 - self.order.level(Var::new(v)).index()));
        (output << n) | pos
    }

    /// Evaluates `output` at input assignment `row` by walking the diagram.
    ///
    /// # Panics
    ///
    /// Panics if the index structures are stale.
    pub fn evaluate(&self, output: usize, row: usize) -> bool {
        assert!(!self.stale, "diagram must be rebuilt after a bare swap");
        let n = self.n_inputs();
        let mut edge = self.structure.roots[output];
        for level in 0..n {
            let Some(pos) = edge.position() else {
                break;
            };
            let var = self.order.var_at(Level::new(level)).id();
            let (low, high) = self.structure.children[level][pos];
            let next = if (row >> (n - 1 - var)) & 1 == 1 { high } else { low };
            edge = next.complement_if(edge.is_complemented());
        }
        debug_assert!(edge.is_const(), "walk ended on a non-terminal edge");
        edge.is_one()
    }
}

impl Bdd {
    /// Resolves the cofactor `index` at `level` against the registered nodes.
    ///
    /// Returns a constant edge, an (optionally complemented) edge to the first
    /// registered node that matches, or `None` if the cofactor is new.
    ///
    /// Without a care vector this only reads the table. With one, a match
    /// only has to hold on care rows, and finding it has side effects: the
    /// matched node takes over the cofactor's care rows (and its values on
    /// them) in the table and the care vector, and the match is recorded as a
    /// pending merge that [`Bdd::complete_merge`] later writes over the cofactor.
    pub fn find(&mut self, index: usize, level: usize) -> Option<Edge> {
        if self.care.is_some() {
            return self.find_care(index, level);
        }
        if self.table.is_const0(index, level) {
            return Some(Edge::ZERO);
        }
        if self.table.is_const1(index, level) {
            return Some(Edge::ONE);
        }
        self.structure.indices[level].iter().enumerate().find_map(|(pos, &rep)| {
            let sim = self.table.compare(rep, index, level);
            if sim.equal {
                Some(Edge::node(pos))
            } else if sim.complement {
                Some(!Edge::node(pos))
            } else {
                None
            }
        })
    }

    /// Care-aware lookup: matches are only required on care rows.
    ///
    /// Every match is recorded as a pending merge, and the matched
    /// representative takes over the care rows of the cofactor.
    fn find_care(&mut self, index: usize, level: usize) -> Option<Edge> {
        let care = self.care.as_mut()?;
        let constant = if self.table.is_const0_on(care, index, level) {
            Some(Edge::ZERO)
        } else if self.table.is_const1_on(care, index, level) {
            Some(Edge::ONE)
        } else {
            None
        };
        if let Some(edge) = constant {
            self.defer_merge(level, edge, index);
            return Some(edge);
        }

        let relaxed = self.config.policy.is_level_local();
        let found = {
            let care: &PackedTable = care;
            let table = &self.table;
            self.structure.indices[level].iter().enumerate().find_map(|(pos, &rep)| {
                let sim = if relaxed {
                    table.agrees(care, rep, index, level, CareMask::Both)
                } else {
                    table.compare(rep, index, level)
                };
                if sim.equal {
                    Some((pos, rep, false))
                } else if sim.complement {
                    Some((pos, rep, true))
                } else {
                    None
                }
            })
        };

        let (pos, rep, complement) = found?;
        self.table.merge_into(care, rep, index, level, complement);
        let edge = Edge::node(pos).complement_if(complement);
        debug!("Cofactor {} at L{} aliases {}", index, level, edge);
        self.defer_merge(level, edge, index);
        Some(edge)
    }

    /// Records that raw cofactor `absorbed` at `level` is to be rewritten as `survivor`.
    pub(crate) fn defer_merge(&mut self, level: usize, survivor: Edge, absorbed: usize) {
        let rep = survivor.position().map(|pos| self.structure.indices[level][pos]);
        self.structure.merges[level].push(PendingMerge {
            survivor: rep,
            absorbed,
            complement: survivor.is_complemented(),
        });
    }

    /// Finds the cofactor, registering it as a new node when nothing matches.
    pub fn build_one(&mut self, index: usize, level: usize) -> Edge {
        if let Some(edge) = self.find(index, level) {
            return edge;
        }
        let pos = self.structure.indices[level].len();
        self.structure.indices[level].push(index);
        Edge::node(pos)
    }

    /// Computes both child edges of the node with raw `index` at `level`.
    fn build_children(&mut self, index: usize, level: usize) -> (Edge, Edge) {
        let next = level + 1;
        let low = index << 1;
        let high = low | 1;

        if let Some(care) = self.care.as_mut() {
            if let Some(alias) = self.config.policy.sibling_alias(&self.table, care, low, high, next) {
                self.table
                    .merge_into(care, alias.survivor, alias.absorbed, next, alias.complement);
                let survivor = self.build_one(alias.survivor, next);
                let absorbed = survivor.complement_if(alias.complement);
                self.defer_merge(next, absorbed, alias.absorbed);
                return if alias.survivor == low {
                    (survivor, absorbed)
                } else {
                    (absorbed, survivor)
                };
            }
        }

        let e0 = self.build_one(low, next);
        let e1 = self.build_one(high, next);
        (e0, e1)
    }

    /// Registers every output's root cofactor.
    ///
    /// An output without a single care row is filled with its majority bit
    /// (ties go to 0) and becomes a constant root instead.
    fn build_startup(&mut self) {
        for output in 0..self.n_outputs() {
            let dont_care = self.care.as_ref().is_some_and(|care| care.is_const0(output, 0));
            if dont_care {
                let ones = self.table.count_ones(output, 0);
                let value = 2 * ones > self.table.width(0);
                self.table.fill(output, 0, value);
                debug!("Output {} is entirely don't-care, filled with {}", output, value as u8);
                self.structure.roots[output] = Edge::constant(value);
            } else {
                self.structure.roots[output] = self.build_one(output, 0);
            }
        }
    }

    /// Rebuilds the canonical index structures from the current table.
    ///
    /// Leftover pending merges from a previous build are applied first.
    /// Under a care vector a pass may fill don't-care rows that let the next
    /// pass share more, so passes repeat until applying a pass's merges leaves
    /// the table and the care vector where that pass started. The merges of
    /// the final pass stay pending. Returns the node count.
    pub fn build(&mut self) -> usize {
        self.complete_merge();
        for pass in 1..=MAX_PASSES {
            let start = self.care.is_some().then(|| (self.table.clone(), self.care.clone()));
            self.build_pass();
            let Some((table, care)) = start else {
                break;
            };
            let merges = self.structure.merges.clone();
            self.complete_merge();
            if self.table == table && self.care == care {
                self.structure.merges = merges;
                break;
            }
            debug!("Pass {} rewrote don't-care rows", pass);
        }
        self.stale = false;

        let count = self.node_count();
        info!("Built diagram with {} nodes, order {}", count, self.order);
        count
    }

    /// One level-by-level construction over the current table.
    fn build_pass(&mut self) {
        self.structure.clear();
        self.build_startup();

        let n = self.n_inputs();
        for level in 0..n {
            let count = self.structure.indices[level].len();
            for pos in 0..count {
                let index = self.structure.indices[level][pos];
                let (e0, e1) = self.build_children(index, level);
                self.structure.children[level].push((e0, e1));
                if e0 == e1 {
                    self.structure.redundant[level].push(pos);
                }
            }
            if self.config.policy.is_level_local() {
                self.complete_level(level + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_not_of_first_input() {
        // Rows 0..4 have input 0 clear.
        let bdd = Bdd::from_onsets(3, &[vec![0, 1, 2, 3]], BddConfig::default()).unwrap();
        assert_eq!(bdd.node_count(), 2);
        assert_eq!(bdd.indices(0), &[0]);
        assert_eq!(bdd.children(0), &[(Edge::ONE, Edge::ZERO)]);
        assert!(bdd.indices(1).is_empty());
        for row in 0..8 {
            assert_eq!(bdd.evaluate(0, row), row < 4);
        }
    }

    #[test]
    fn test_constant_outputs() {
        let bdd = Bdd::from_onsets(4, &[(0..16).collect::<Vec<_>>(), vec![]], BddConfig::default()).unwrap();
        assert_eq!(bdd.roots(), &[Edge::ONE, Edge::ZERO]);
        assert_eq!(bdd.node_count(), 1);
        for level in 0..4 {
            assert_eq!(bdd.level_count(Level::new(level)), 0);
        }
    }

    #[test]
    fn test_shared_and_complemented_outputs() {
        // Output 1 is the complement of output 0, output 2 equals output 0.
        let f = vec![1, 2, 4, 7];
        let g: Vec<usize> = (0..8).filter(|r| !f.contains(r)).collect();
        let bdd = Bdd::from_onsets(3, &[f.clone(), g, f], BddConfig::default()).unwrap();
        assert_eq!(bdd.indices(0), &[0]);
        assert_eq!(bdd.roots(), &[Edge::node(0), !Edge::node(0), Edge::node(0)]);
        // Three-input parity: one node per level.
        assert_eq!(bdd.node_count(), 4);
        for row in 0..8 {
            assert_eq!(bdd.evaluate(0, row), (row as u32).count_ones() % 2 == 1);
            assert_eq!(bdd.evaluate(1, row), (row as u32).count_ones() % 2 == 0);
        }
    }

    #[test]
    fn test_redundant_nodes() {
        // f = x2 and g = x1 & x2 never read x0, and f does not read x1 either.
        let bdd = Bdd::from_onsets(3, &[vec![1, 3, 5, 7], vec![3, 7]], BddConfig::default()).unwrap();
        assert_eq!(bdd.redundant(0), &[0, 1]);
        assert_eq!(bdd.level_count(Level::new(0)), 0);
        assert_eq!(bdd.redundant(1), &[0]);
        assert_eq!(bdd.level_count(Level::new(1)), 1);
        // The x2 node at L2 is shared by both outputs.
        assert_eq!(bdd.node_count(), 3);
        for row in 0..8 {
            assert_eq!(bdd.evaluate(0, row), row & 1 == 1);
            assert_eq!(bdd.evaluate(1, row), row & 3 == 3);
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let onsets = [vec![0, 3, 5, 6, 9, 10, 12, 15, 17, 30], vec![1, 2, 3, 8, 13, 21, 22, 23]];
        let mut bdd = Bdd::from_onsets(5, &onsets, BddConfig::default()).unwrap();
        let first = bdd.node_count();
        let structure = bdd.structure().clone();
        assert_eq!(bdd.build(), first);
        assert_eq!(bdd.structure(), &structure);
    }

    #[test]
    fn test_build_is_idempotent_under_care() {
        let onsets = [
            (0..64usize).filter(|r| (r * 11 + 3) % 5 < 2).collect::<Vec<_>>(),
            (0..64usize).filter(|r| r % 7 < 3).collect(),
        ];
        let cares = [
            (0..64usize).filter(|r| r % 3 == 0).collect::<Vec<_>>(),
            (0..64usize).filter(|r| (r * 5) % 4 != 1).collect(),
        ];
        let table = PackedTable::from_onsets(6, &onsets).unwrap();
        let care = PackedTable::from_onsets(6, &cares).unwrap();
        let policies = [
            MergePolicy::SkipDontCare,
            MergePolicy::OneSided { complement: false },
            MergePolicy::OneSided { complement: true },
            MergePolicy::TwoSided,
            MergePolicy::LevelTwoSided,
        ];
        for policy in policies {
            let config = BddConfig::default().with_policy(policy);
            let mut bdd = Bdd::with_care(table.clone(), Some(care.clone()), config).unwrap();
            let count = bdd.node_count();
            let structure = bdd.structure().clone();
            assert_eq!(bdd.build(), count, "{:?}", policy);
            assert_eq!(bdd.structure(), &structure, "{:?}", policy);
            assert_eq!(bdd.build(), count, "{:?}", policy);
            for output in 0..2 {
                for row in 0..64 {
                    let pos = (output << 6) | row;
                    if care.bit(pos) {
                        assert_eq!(bdd.evaluate(output, row), table.bit(pos), "{:?} output {} row {}", policy, output, row);
                    }
                }
            }
        }
    }

    #[test]
    fn test_dont_care_output_majority_fill() {
        let table = PackedTable::from_onsets(2, &[vec![0, 1, 2], vec![1, 2], vec![3]]).unwrap();
        let mut care = PackedTable::new(2, 3).unwrap();
        care.fill(2, 0, true);
        let bdd = Bdd::with_care(table, Some(care), BddConfig::default().with_policy(MergePolicy::TwoSided)).unwrap();
        assert_eq!(bdd.roots()[0], Edge::ONE);
        // A tie resolves to 0.
        assert_eq!(bdd.roots()[1], Edge::ZERO);
        assert!(bdd.table().is_const0(1, 0));
        assert_eq!(bdd.roots()[2], Edge::node(0));
    }

    #[test]
    fn test_empty_dont_care_output_is_zero() {
        let table = PackedTable::from_onsets(3, &[Vec::<usize>::new()]).unwrap();
        let care = PackedTable::new(3, 1).unwrap();
        let bdd = Bdd::with_care(table, Some(care), BddConfig::default().with_policy(MergePolicy::SkipDontCare)).unwrap();
        assert_eq!(bdd.roots(), &[Edge::ZERO]);
        assert_eq!(bdd.node_count(), 1);
    }

    #[test]
    fn test_exact_policy_drops_care() {
        let table = PackedTable::from_onsets(2, &[vec![1]]).unwrap();
        let care = PackedTable::new(2, 1).unwrap();
        let bdd = Bdd::with_care(table, Some(care), BddConfig::default()).unwrap();
        assert!(bdd.care().is_none());
        assert_eq!(bdd.node_count(), 3);
    }

    #[test]
    fn test_care_shape_mismatch() {
        let table = PackedTable::new(3, 1).unwrap();
        let care = PackedTable::new(3, 2).unwrap();
        let err = Bdd::with_care(table, Some(care), BddConfig::default().with_policy(MergePolicy::TwoSided)).unwrap_err();
        assert_eq!(
            err,
            Error::CareShape {
                expected: (3, 1),
                found: (3, 2)
            }
        );
    }

    #[test]
    fn test_trace_lane_mismatch() {
        let trace = SimTrace::from_lanes(vec![vec![0xff], vec![0x0f]]).unwrap();
        let err = Bdd::from_onsets_and_trace(3, &[vec![1]], &trace, BddConfig::default()).unwrap_err();
        assert_eq!(err, Error::LaneCount { expected: 3, found: 2 });
    }

    #[test]
    fn test_table_value_follows_order() {
        let mut bdd = Bdd::from_onsets(3, &[vec![1, 6]], BddConfig::default()).unwrap();
        bdd.bdd_swap(Level::new(0));
        for row in 0..8 {
            assert_eq!(bdd.table_value(0, row), row == 1 || row == 6);
            assert_eq!(bdd.evaluate(0, row), row == 1 || row == 6);
        }
    }
}
