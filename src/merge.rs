//! Don't-care merge policies.
//!
//! # Care vectors
//!
//! A care vector has the shape of the function table. A set bit marks a row
//! whose value must be preserved; every other row is don't-care and may be
//! chosen freely to shrink the diagram. Two cofactors that differ only on
//! don't-care rows can then share one node.
//!
//! # Policies
//!
//! Every policy is a predicate on the two children of a node being expanded:
//!
//! | Policy | Sibling predicate | Matching against registered nodes |
//! |---|---|---|
//! | [`MergePolicy::Exact`] | none | bit-exact (care vector unused) |
//! | [`MergePolicy::SkipDontCare`] | one child has no care row | bit-exact |
//! | [`MergePolicy::OneSided`] | one child agrees with the other wherever the other cares | bit-exact |
//! | [`MergePolicy::TwoSided`] | the children agree where both care | bit-exact |
//! | [`MergePolicy::LevelTwoSided`] | as `TwoSided` | agreement where both care |
//!
//! When two cofactors merge, the survivor takes over the absorbed cofactor's
//! care rows (and its values on them), so later levels keep honoring them.
//! No care row ever changes value; merging only decides don't-care rows.
//!
//! # Deferred rewriting
//!
//! A merge does not touch the absorbed cofactor's slice right away. It is
//! recorded as a [`PendingMerge`] and applied by [`Bdd::complete_merge`],
//! deepest level first, so that every survivor already holds its final
//! content when it is copied. Completion turns the absorbed slice into an
//! exact copy of the survivor, values and care rows alike, so a later build
//! sees two identical cofactors and shares them again without any care
//! reasoning. [`MergePolicy::LevelTwoSided`] applies the merges of each level
//! as soon as that level has been expanded.
//!
//! Pending merges address slices by raw index, so a bare [`Bdd::swap`]
//! carries them through the table permutation instead of applying them.
//!
//! Without a care vector every policy behaves exactly like [`MergePolicy::Exact`].

use log::debug;

use crate::bdd::Bdd;
use crate::table::{CareMask, PackedTable};

/// Strategy for merging cofactors that differ only on don't-care rows.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum MergePolicy {
    /// Plain hash-consing; any care vector is dropped.
    #[default]
    Exact,
    /// A child without care rows aliases its sibling.
    SkipDontCare,
    /// A child aliases its sibling when it matches wherever the sibling cares.
    OneSided {
        /// Also accept a sibling that matches inverted.
        complement: bool,
    },
    /// Siblings merge when they agree (or are complementary) on their common care rows.
    TwoSided,
    /// `TwoSided`, plus agreement-based matching and per-level completion of merges.
    LevelTwoSided,
}

impl MergePolicy {
    /// Whether this policy consumes a care vector.
    pub fn uses_care(self) -> bool {
        self != MergePolicy::Exact
    }

    /// Whether merges are applied level by level during a build.
    pub fn is_level_local(self) -> bool {
        self == MergePolicy::LevelTwoSided
    }

    /// Decides whether one of the siblings `low`/`high` at `level` can alias the other.
    pub fn sibling_alias(
        self,
        table: &PackedTable,
        care: &PackedTable,
        low: usize,
        high: usize,
        level: usize,
    ) -> Option<SiblingAlias> {
        let alias = |survivor, absorbed, complement| {
            Some(SiblingAlias {
                survivor,
                absorbed,
                complement,
            })
        };
        match self {
            MergePolicy::Exact => None,
            MergePolicy::SkipDontCare => {
                if care.is_const0(high, level) {
                    alias(low, high, false)
                } else if care.is_const0(low, level) {
                    alias(high, low, false)
                } else {
                    None
                }
            }
            MergePolicy::OneSided { complement } => {
                let sim = table.agrees(care, low, high, level, CareMask::Right);
                if sim.equal {
                    return alias(low, high, false);
                }
                if complement && sim.complement {
                    return alias(low, high, true);
                }
                let sim = table.agrees(care, low, high, level, CareMask::Left);
                if sim.equal {
                    alias(high, low, false)
                } else if complement && sim.complement {
                    alias(high, low, true)
                } else {
                    None
                }
            }
            MergePolicy::TwoSided | MergePolicy::LevelTwoSided => {
                let sim = table.agrees(care, low, high, level, CareMask::Both);
                if sim.equal {
                    alias(low, high, false)
                } else if sim.complement {
                    alias(low, high, true)
                } else {
                    None
                }
            }
        }
    }
}

impl MergePolicy {
    /// Decides whether a new cofactor `candidate` may read as the registered
    /// `rep` without changing any value of `rep`.
    ///
    /// This is the check used when a swap rebuilds a level in place: `rep`
    /// already has children, so only `rep`'s care rows may grow. Returns the
    /// complement flag of the alias.
    pub fn absorbs(
        self,
        table: &PackedTable,
        care: &PackedTable,
        rep: usize,
        candidate: usize,
        level: usize,
    ) -> Option<bool> {
        let complement = match self {
            MergePolicy::Exact => return None,
            MergePolicy::SkipDontCare => return care.is_const0(candidate, level).then_some(false),
            MergePolicy::OneSided { complement } => complement,
            MergePolicy::TwoSided | MergePolicy::LevelTwoSided => true,
        };
        let sim = table.agrees(care, rep, candidate, level, CareMask::Right);
        if sim.equal {
            Some(false)
        } else if complement && sim.complement {
            Some(true)
        } else {
            None
        }
    }
}

/// Outcome of a sibling predicate: `absorbed` will read as `survivor`, inverted if `complement`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SiblingAlias {
    pub survivor: usize,
    pub absorbed: usize,
    pub complement: bool,
}

/// A recorded merge: raw cofactor `absorbed` is to be rewritten as raw
/// cofactor `survivor` of the same level, inverted if `complement`.
///
/// `survivor == None` stands for the constant-0 terminal, as in
/// [`PackedTable::copy_func`], so a constant-1 survivor is `None` complemented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PendingMerge {
    pub survivor: Option<usize>,
    pub absorbed: usize,
    pub complement: bool,
}

impl PendingMerge {
    /// The same merge one level down: half `half` of both slices.
    pub(crate) fn half(self, half: usize) -> Self {
        Self {
            survivor: self.survivor.map(|rep| (rep << 1) | half),
            absorbed: (self.absorbed << 1) | half,
            complement: self.complement,
        }
    }
}

impl Bdd {
    /// Applies every pending merge to the table, deepest level first.
    ///
    /// Afterwards each absorbed cofactor is an exact copy of its survivor in
    /// both the table and the care vector.
    pub fn complete_merge(&mut self) {
        for level in (0..=self.n_inputs()).rev() {
            self.complete_level(level);
        }
    }

    /// Applies the pending merges recorded at `level`, in recording order.
    pub(crate) fn complete_level(&mut self, level: usize) {
        let merges = std::mem::take(&mut self.structure.merges[level]);
        if merges.is_empty() {
            return;
        }
        debug!("Completing {} merges at L{}", merges.len(), level);
        for merge in merges {
            if merge.survivor == Some(merge.absorbed) {
                continue;
            }
            self.table
                .copy_func(merge.absorbed, merge.survivor, level, merge.complement);
            // The survivor already holds the absorbed care rows.
            if let (Some(care), Some(_)) = (self.care.as_mut(), merge.survivor) {
                care.copy_func(merge.absorbed, merge.survivor, level, false);
            }
        }
    }
}
