//! # ttbdd: truth-table driven ROBDD minimization
//!
//! **`ttbdd`** builds reduced ordered binary decision diagrams with complement
//! edges directly from the packed truth tables of a multi-output function,
//! searches for a small variable order, and emits the result as a BLIF
//! `.names` netlist.
//!
//! ## How it works
//!
//! The function table holds one bit per (output, input row). Every node of
//! the diagram corresponds to a contiguous slice of that table: the cofactor
//! of some output with respect to the variables above the node's level.
//! Hash-consing is a search for an equal (or complementary) slice among the
//! nodes already registered at the same level.
//!
//! Variable reordering never walks the graph. Swapping two adjacent levels
//! is a fixed permutation of table bits, after which only the two affected
//! levels are rebuilt.
//!
//! Rows may be marked don't-care, either explicitly or from a simulation
//! trace. A [`MergePolicy`][crate::merge::MergePolicy] then lets cofactors
//! that agree on their care rows share one node.
//!
//! ## Basic usage
//!
//! ```rust
//! use ttbdd::bdd::{Bdd, BddConfig};
//!
//! // Two outputs over three inputs: parity and majority.
//! let onsets = [vec![1, 2, 4, 7], vec![3, 5, 6, 7]];
//! let mut bdd = Bdd::from_onsets(3, &onsets, BddConfig::default()).unwrap();
//!
//! let stats = bdd.reorder();
//! assert!(stats.final_size <= stats.initial_size);
//!
//! let inputs = ["a", "b", "c"];
//! let outputs = ["par", "maj"];
//! let netlist = bdd.to_netlist(&inputs, &outputs).unwrap();
//! assert_eq!(netlist.simulate_row(&inputs, &outputs, 7).unwrap(), vec![true, true]);
//! ```
//!
//! ## Core components
//!
//! - **[`table`]**: the packed bit table and every bulk operation on slices.
//! - **[`bdd`]**: the [`Bdd`][crate::bdd::Bdd] builder and its index structures.
//! - **[`merge`]**: don't-care merge policies.
//! - **[`reorder`]**: level swaps, sifting and randomized sifting.
//! - **[`blif`]**: netlist emission, simulated by [`eval`].

pub mod bdd;
pub mod blif;
pub mod checkpoint;
pub mod edge;
pub mod error;
pub mod eval;
pub mod merge;
pub mod reduce;
pub mod reorder;
pub mod table;
pub mod trace;
pub mod types;
