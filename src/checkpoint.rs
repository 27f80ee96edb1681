//! Value snapshots of the engine state.
//!
//! A [`Checkpoint`] copies the table, the care vector, the level order and
//! every index structure. Slots are plain integers chosen by the caller;
//! saving overwrites, loading copies out and leaves the slot intact.
//!
//! The reordering search reserves [`SIFT_SLOTS`] and [`BEST_SLOT`].

use log::debug;

use crate::bdd::{Bdd, Structure};
use crate::table::PackedTable;
use crate::types::VarOrder;

/// Slots alternated by [`Bdd::sift_reo`].
pub const SIFT_SLOTS: [usize; 2] = [0, 1];

/// Slot holding the best order found by [`Bdd::random_sift_reo`].
pub const BEST_SLOT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    table: PackedTable,
    care: Option<PackedTable>,
    order: VarOrder,
    structure: Structure,
    stale: bool,
}

impl Checkpoint {
    pub fn table(&self) -> &PackedTable {
        &self.table
    }

    pub fn order(&self) -> &VarOrder {
        &self.order
    }

    /// Node count of the captured structures.
    pub fn node_count(&self) -> usize {
        1 + self
            .structure
            .indices
            .iter()
            .zip(&self.structure.redundant)
            .map(|(indices, redundant)| indices.len() - redundant.len())
            .sum::<usize>()
    }
}

impl Bdd {
    /// Captures the current state.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            table: self.table.clone(),
            care: self.care.clone(),
            order: self.order.clone(),
            structure: self.structure.clone(),
            stale: self.stale,
        }
    }

    /// Replaces the current state with `checkpoint`.
    pub fn restore(&mut self, checkpoint: &Checkpoint) {
        assert!(
            checkpoint.table.same_shape(&self.table),
            "checkpoint does not belong to this diagram"
        );
        self.table.clone_from(&checkpoint.table);
        self.care.clone_from(&checkpoint.care);
        self.order.clone_from(&checkpoint.order);
        self.structure.clone_from(&checkpoint.structure);
        self.stale = checkpoint.stale;
    }

    /// Saves the current state into `slot`, overwriting what was there.
    pub fn save(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        debug!("Saving {} nodes, order {} into slot {}", self.node_count(), self.order, slot);
        self.slots[slot] = Some(self.checkpoint());
    }

    /// Restores the state saved in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if nothing was ever saved into `slot`.
    pub fn load(&mut self, slot: usize) {
        let Some(Some(checkpoint)) = self.slots.get_mut(slot).map(Option::take) else {
            panic!("checkpoint slot {} loaded before being saved", slot);
        };
        self.restore(&checkpoint);
        self.slots[slot] = Some(checkpoint);
        debug!("Loaded {} nodes, order {} from slot {}", self.node_count(), self.order, slot);
    }

    /// The state saved in `slot`, if any.
    pub fn saved(&self, slot: usize) -> Option<&Checkpoint> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
}
