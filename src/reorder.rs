//! Variable reordering.
//!
//! # Theory: Variable Ordering
//!
//! The size of a decision diagram is highly sensitive to the order in which
//! variables are decided. For some functions, different orderings can change
//! the size from linear to exponential in the number of variables.
//!
//! Consider `f = (x₁ ∧ y₁) ∨ (x₂ ∧ y₂) ∨ ... ∨ (xₙ ∧ yₙ)`:
//!
//! - **Good ordering** (x₁, y₁, x₂, y₂, ..., xₙ, yₙ): O(n) nodes
//! - **Bad ordering** (x₁, x₂, ..., xₙ, y₁, y₂, ..., yₙ): O(2ⁿ) nodes
//!
//! Finding the optimal ordering is NP-complete, so we search heuristically
//! with local moves.
//!
//! # Adjacent Transposition
//!
//! Every move is a swap of the variables at two adjacent levels `L` and
//! `L + 1`. On the truth table this exchanges the two interior blocks of
//! every 4-block group (see [`crate::table::PackedTable::swap_levels`]). On the index
//! structures only levels `L` and `L + 1` need new nodes:
//!
//! - levels above `L` keep their nodes and edges, since the functions they
//!   reach through level `L` are unchanged up to the renaming
//! - every node at level `L` keeps its position; its new children are built
//!   from its four grandchildren `(f00, f10)` and `(f01, f11)`
//! - level `L + 1` is rebuilt from those pairs through a unique table
//! - deeper nodes keep their functions but move inside the table, so their
//!   raw indices are remapped by exchanging the `01` and `10` values of the
//!   2-bit group that addresses the swapped pair
//!
//! Under a care vector the rebuilt level may also alias a new cofactor to a
//! constant or to a node built before it, as long as this only grows that
//! node's care rows. Cofactors whose slice still hosts deeper nodes are
//! never aliased, since completing the merge would overwrite them. Deeper
//! nodes that lose their last parent this way are dropped.
//!
//! # Rudell's Sifting Algorithm
//!
//! **Sifting** moves each variable through all possible positions and keeps
//! the one with the smallest diagram. Variables are processed in decreasing
//! order of the node count at their level. Rejected positions are undone by
//! loading a checkpoint instead of replaying swaps.
//!
//! **Random sifting** restarts the search from shuffled orders and keeps the
//! best result over all rounds. There is no optimality guarantee; more rounds
//! lower the expected size.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//!
//! - R. Bryant. "Graph-Based Algorithms for Boolean Function Manipulation."
//!   IEEE Trans. Computers, 1986.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bdd::Bdd;
use crate::checkpoint::{BEST_SLOT, SIFT_SLOTS};
use crate::edge::Edge;
use crate::merge::PendingMerge;
use crate::table::PackedTable;
use crate::types::{Level, Var};

/// Statistics collected during reordering.
#[derive(Debug, Clone, Default)]
pub struct ReorderStats {
    /// Number of variable swaps performed
    pub swaps: usize,
    /// Initial diagram size (number of nodes)
    pub initial_size: usize,
    /// Final diagram size after reordering
    pub final_size: usize,
    /// Number of sifting passes run (the first one plus one per restart)
    pub rounds: usize,
}

impl ReorderStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Calculate the percentage reduction.
    pub fn reduction_percent(&self) -> f64 {
        self.reduction_ratio() * 100.0
    }
}

/// New nodes of the lower swapped level, deduplicated by their child pair.
#[derive(Default)]
struct LevelBuilder {
    indices: Vec<usize>,
    children: Vec<(Edge, Edge)>,
    redundant: Vec<usize>,
    unique: HashMap<(Edge, Edge), usize>,
}

impl LevelBuilder {
    /// The node with children `(low, high)` if it exists, in either polarity.
    fn lookup(&self, low: Edge, high: Edge) -> Option<Edge> {
        if low == high && low.is_const() {
            return Some(low);
        }
        if let Some(&pos) = self.unique.get(&(low, high)) {
            return Some(Edge::node(pos));
        }
        self.unique.get(&(!low, !high)).map(|&pos| !Edge::node(pos))
    }

    fn push(&mut self, low: Edge, high: Edge, raw: usize) -> Edge {
        let pos = self.indices.len();
        self.indices.push(raw);
        self.children.push((low, high));
        if low == high {
            self.redundant.push(pos);
        }
        self.unique.insert((low, high), pos);
        Edge::node(pos)
    }
}

/// Where raw `index` of a level `shift + 2` below a swapped pair ends up after the swap.
fn remap_raw(index: usize, shift: usize) -> usize {
    match (index >> shift) & 3 {
        1 => index + (1 << shift),
        2 => index - (1 << shift),
        _ => index,
    }
}

impl Bdd {
    /// Exchanges the variables at `level` and `level + 1` in the table, the
    /// care vector and the level order.
    ///
    /// Pending merges are carried through the permutation, so swapping the
    /// same level twice restores the table and the care vector exactly. The
    /// index structures are left untouched and become stale; use
    /// [`Bdd::bdd_swap`] to keep them in step, or call [`Bdd::build`] afterwards.
    pub fn swap(&mut self, level: Level) {
        let l = level.index();
        self.table.swap_levels(l);
        if let Some(care) = self.care.as_mut() {
            care.swap_levels(l);
        }
        self.order.swap_adjacent(level);
        self.remap_merges(l);
        self.swaps += 1;
        self.stale = true;
    }

    /// Moves the pending merges along with the table permutation of a swap at `level`.
    ///
    /// Slices at or above `level` only permute internally, so their merges
    /// stay. A slice of `level + 1` is torn apart by the swap; its merge is
    /// split into one merge per half, queued after the merges already
    /// recorded one level down.
    fn remap_merges(&mut self, level: usize) {
        let merges = &mut self.structure.merges;
        let straddling = std::mem::take(&mut merges[level + 1]);
        merges[level + 2].extend(straddling.iter().flat_map(|merge| [merge.half(0), merge.half(1)]));
        for deeper in level + 2..merges.len() {
            let shift = deeper - level - 2;
            for merge in merges[deeper].iter_mut() {
                merge.survivor = merge.survivor.map(|rep| remap_raw(rep, shift));
                merge.absorbed = remap_raw(merge.absorbed, shift);
            }
        }
    }

    /// Swaps `level` and `level + 1` and brings the diagram up to date.
    ///
    /// Pending merges are applied first, so every slice equals the function
    /// its edges describe. Then only the two affected levels are rebuilt, and
    /// under a merge policy the lower one may alias new cofactors on care
    /// rows. Returns the node count.
    pub fn bdd_swap(&mut self, level: Level) -> usize {
        let l = level.index();
        assert!(l + 1 < self.n_inputs(), "cannot swap {} with the level below it", level);
        if self.stale {
            self.build();
        }
        self.complete_merge();
        self.swap(level);
        self.remap_indices(l);
        self.rebuild_pair(l);
        self.stale = false;

        let count = self.node_count();
        debug!("Swapped {} and {}: {} nodes", level, level.next(), count);
        count
    }

    /// Follows the table permutation of a swap at `level` in every deeper level's raw indices.
    fn remap_indices(&mut self, level: usize) {
        for deeper in level + 2..self.n_inputs() {
            let shift = deeper - level - 2;
            for index in self.structure.indices[deeper].iter_mut() {
                *index = remap_raw(*index, shift);
            }
        }
    }

    /// Rebuilds levels `level` and `level + 1` from the grandchildren of the level-`level` nodes.
    fn rebuild_pair(&mut self, level: usize) {
        let lower = level + 1;
        let old_lower = std::mem::take(&mut self.structure.children[lower]);
        let grandchildren = |edge: Edge| -> (Edge, Edge) {
            match edge.position() {
                None => (edge, edge),
                Some(pos) => {
                    let (low, high) = old_lower[pos];
                    let flip = edge.is_complemented();
                    (low.complement_if(flip), high.complement_if(flip))
                }
            }
        };

        // Lower-level slices that contain a registered deeper node.
        let hosted: HashSet<usize> = if self.care.is_some() {
            let indices = &self.structure.indices;
            (lower + 1..indices.len())
                .flat_map(move |deeper| indices[deeper].iter().map(move |&raw| raw >> (deeper - lower)))
                .collect()
        } else {
            HashSet::new()
        };

        let mut builder = LevelBuilder::default();
        let count = self.structure.indices[level].len();
        let mut upper_children = Vec::with_capacity(count);
        let mut upper_redundant = Vec::new();
        for pos in 0..count {
            let raw = self.structure.indices[level][pos];
            let (e0, e1) = self.structure.children[level][pos];
            let (f00, f01) = grandchildren(e0);
            let (f10, f11) = grandchildren(e1);
            let low = self.lower_node(&mut builder, &hosted, lower, (f00, f10), raw << 1);
            let high = self.lower_node(&mut builder, &hosted, lower, (f01, f11), (raw << 1) | 1);
            if low == high {
                upper_redundant.push(pos);
            }
            upper_children.push((low, high));
        }

        self.structure.children[level] = upper_children;
        self.structure.redundant[level] = upper_redundant;
        self.structure.indices[lower] = builder.indices;
        self.structure.children[lower] = builder.children;
        self.structure.redundant[lower] = builder.redundant;
        if !self.structure.merges[lower].is_empty() {
            self.prune_below(lower);
        }
    }

    /// Resolves the new cofactor `raw` at `level` with the given children.
    fn lower_node(
        &mut self,
        builder: &mut LevelBuilder,
        hosted: &HashSet<usize>,
        level: usize,
        (low, high): (Edge, Edge),
        raw: usize,
    ) -> Edge {
        if let Some(edge) = builder.lookup(low, high) {
            return edge;
        }
        if !hosted.contains(&raw) {
            if let Some(edge) = self.absorb_on_care(builder, level, raw) {
                return edge;
            }
        }
        builder.push(low, high, raw)
    }

    /// Aliases the new cofactor `raw` to a constant or to a node already in
    /// `builder`, judged on care rows only.
    ///
    /// A node qualifies only if none of its own values change; it just takes
    /// over `raw`'s care rows. The alias is recorded as a pending merge.
    fn absorb_on_care(&mut self, builder: &LevelBuilder, level: usize, raw: usize) -> Option<Edge> {
        let policy = self.config.policy;
        let care = self.care.as_mut()?;
        let (edge, survivor) = {
            let table = &self.table;
            let care: &PackedTable = care;
            if table.is_const0_on(care, raw, level) {
                (Edge::ZERO, None)
            } else if table.is_const1_on(care, raw, level) {
                (Edge::ONE, None)
            } else {
                builder.indices.iter().enumerate().find_map(|(pos, &rep)| {
                    let complement = policy.absorbs(table, care, rep, raw, level)?;
                    Some((Edge::node(pos).complement_if(complement), Some(rep)))
                })?
            }
        };
        if let Some(rep) = survivor {
            self.table.merge_into(care, rep, raw, level, edge.is_complemented());
        }
        self.structure.merges[level].push(PendingMerge {
            survivor,
            absorbed: raw,
            complement: edge.is_complemented(),
        });
        debug!("Swapped cofactor {} at L{} aliases {}", raw, level, edge);
        Some(edge)
    }

    /// Drops the nodes below `level` that no edge reaches any more.
    fn prune_below(&mut self, level: usize) {
        let structure = &mut self.structure;
        for deeper in level + 1..structure.indices.len() {
            let mut live = vec![false; structure.indices[deeper].len()];
            for &(e0, e1) in &structure.children[deeper - 1] {
                for pos in [e0, e1].into_iter().filter_map(Edge::position) {
                    live[pos] = true;
                }
            }
            if live.iter().all(|&alive| alive) {
                break;
            }

            let mut moved = vec![None; live.len()];
            let mut next = 0;
            for (pos, _) in live.iter().enumerate().filter(|&(_, &alive)| alive) {
                moved[pos] = Some(next);
                next += 1;
            }
            debug!("Dropping {} unreachable nodes at L{}", live.len() - next, deeper);
            let keep = |pos: &usize| live[*pos];
            let indices = &structure.indices[deeper];
            structure.indices[deeper] = (0..indices.len()).filter(keep).map(|pos| indices[pos]).collect();
            let children = &structure.children[deeper];
            structure.children[deeper] = (0..children.len()).filter(keep).map(|pos| children[pos]).collect();
            structure.redundant[deeper] = structure.redundant[deeper]
                .iter()
                .filter_map(|&pos| moved[pos])
                .collect();
            for (e0, e1) in structure.children[deeper - 1].iter_mut() {
                for edge in [e0, e1] {
                    if let Some(pos) = edge.position().and_then(|pos| moved[pos]) {
                        *edge = Edge::node(pos).complement_if(edge.is_complemented());
                    }
                }
            }
        }
    }

    /// Sifts every variable once and keeps the smallest diagram seen.
    ///
    /// Uses the checkpoint slots [`SIFT_SLOTS`]. Never returns a count larger
    /// than the one before the call.
    pub fn sift_reo(&mut self) -> usize {
        let n = self.n_inputs();
        if self.stale {
            self.build();
        }
        let mut best = self.node_count();
        if n < 2 {
            return best;
        }

        let mut vars: Vec<Var> = (0..n).map(Var::new).collect();
        vars.sort_by_key(|&v| Reverse(self.level_count(self.order.level(v))));

        let mut turn = 0;
        self.save(SIFT_SLOTS[turn]);
        for var in vars {
            let start = self.order.level(var).index();
            let mut improved = false;

            // Down to the bottom...
            let mut level = start;
            while level + 1 < n {
                let count = self.bdd_swap(Level::new(level));
                level += 1;
                if count < best {
                    best = count;
                    improved = true;
                    self.save(SIFT_SLOTS[turn ^ 1]);
                }
            }

            // ...then up to the top from the starting position.
            if start > 0 {
                if level != start {
                    self.load(SIFT_SLOTS[turn]);
                }
                level = start;
                while level > 0 {
                    let count = self.bdd_swap(Level::new(level - 1));
                    level -= 1;
                    if count < best {
                        best = count;
                        improved = true;
                        self.save(SIFT_SLOTS[turn ^ 1]);
                    }
                }
            }

            if improved {
                turn ^= 1;
            }
            self.load(SIFT_SLOTS[turn]);
            debug!("Sifted {} to {}: {} nodes", var, self.order.level(var), best);
        }

        info!("Sifting finished with {} nodes, order {}", best, self.order);
        best
    }

    /// Moves the variables into the order `target` (listed from the top level down) by adjacent swaps.
    ///
    /// Returns the node count.
    pub fn reo(&mut self, target: &[Var]) -> usize {
        let n = self.n_inputs();
        assert_eq!(target.len(), n, "target order must list every variable");
        if self.stale {
            self.build();
        }
        for (level, &var) in target.iter().enumerate() {
            let mut current = self.order.level(var).index();
            assert!(current >= level, "target order lists {} twice", var);
            while current > level {
                self.bdd_swap(Level::new(current - 1));
                current -= 1;
            }
        }
        self.node_count()
    }

    /// Sifts from the current order, then from `rounds` shuffled orders, keeping the best.
    ///
    /// Shuffles are drawn from a generator seeded with the configured seed.
    /// Uses checkpoint slot [`BEST_SLOT`] in addition to the sifting slots.
    pub fn random_sift_reo(&mut self, rounds: usize) -> usize {
        let mut best = self.sift_reo();
        self.save(BEST_SLOT);
        if self.n_inputs() < 2 {
            return best;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        for round in 0..rounds {
            let mut target: Vec<Var> = (0..self.n_inputs()).map(Var::new).collect();
            target.shuffle(&mut rng);
            self.reo(&target);
            let count = self.sift_reo();
            debug!("Random sifting round {}: {} nodes", round, count);
            if count < best {
                best = count;
                self.save(BEST_SLOT);
            }
        }

        self.load(BEST_SLOT);
        info!("Random sifting kept {} nodes, order {}", best, self.order);
        best
    }

    /// Runs random sifting with the configured number of rounds and reports what it did.
    pub fn reorder(&mut self) -> ReorderStats {
        if self.stale {
            self.build();
        }
        let initial_size = self.node_count();
        let swaps = self.swaps;
        let rounds = self.config.sift_rounds;
        let final_size = self.random_sift_reo(rounds);
        ReorderStats {
            swaps: self.swaps - swaps,
            initial_size,
            final_size,
            rounds: rounds + 1,
        }
    }
}
