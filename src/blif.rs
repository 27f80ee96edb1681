//! Emission of the reduced diagram as a `.names` netlist fragment.
//!
//! # Format
//!
//! Every record is a BLIF `.names` block: the signals it reads, the signal
//! it drives, and the on-set cubes of its single-output cover. For a group
//! whose first output is named `p` the fragment contains:
//!
//! - `p n0`: the constant (an empty cover, i.e. constant 0)
//! - one buffer per primary input, driving `p v<level>` from the input name
//! - one multiplexer per non-redundant node, deepest level first, driving
//!   `p n<id>` from `p v<level>` and its two children; a complemented edge
//!   shows up as a `0` literal
//! - one buffer (or inverter) per primary output, reading its root node
//!
//! A multiplexer row is dropped to a single literal when the child on that
//! side implies the other, which the table decides exactly after
//! [`Bdd::materialize`].
//!
//! # Examples
//!
//! ```
//! use ttbdd::bdd::{Bdd, BddConfig};
//!
//! // f = x0 & x1
//! let mut bdd = Bdd::from_onsets(2, &[vec![3]], BddConfig::default()).unwrap();
//! let netlist = bdd.to_netlist(&["a", "b"], &["f"]).unwrap();
//! let text = netlist.to_string();
//! assert!(text.starts_with(".names fn0\n"));
//! assert!(text.contains(".names fn2 f\n1 1\n"));
//! ```

use std::fmt;

use log::debug;

use crate::bdd::Bdd;
use crate::edge::Edge;
use crate::error::Error;
use crate::reduce::SkipChains;
use crate::types::Var;

/// One `.names` record with a single-output on-set cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// Signals read by the record, in cube column order.
    pub inputs: Vec<String>,
    /// Signal driven by the record.
    pub output: String,
    /// On-set cubes over `inputs`, each a string of `0`, `1` and `-`.
    pub cubes: Vec<String>,
}

impl fmt::Display for Names {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".names")?;
        for input in &self.inputs {
            write!(f, " {}", input)?;
        }
        writeln!(f, " {}", self.output)?;
        for cube in &self.cubes {
            if cube.is_empty() {
                writeln!(f, "1")?;
            } else {
                writeln!(f, "{} 1", cube)?;
            }
        }
        Ok(())
    }
}

/// An ordered list of records; every signal is defined before it is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netlist {
    pub records: Vec<Names>,
}

impl Netlist {
    pub fn push(&mut self, names: Names) {
        self.records.push(names);
    }

    /// Number of multiplexer records, i.e. emitted diagram nodes.
    pub fn node_records(&self) -> usize {
        self.records.iter().filter(|r| r.inputs.len() == 3).count()
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            write!(f, "{}", record)?;
        }
        Ok(())
    }
}

fn literal(edge: Edge) -> char {
    if edge.is_complemented() {
        '0'
    } else {
        '1'
    }
}

impl Bdd {
    /// Emits the current diagram.
    ///
    /// Pending merges are applied and the table is materialized first, so
    /// the emitted functions and the table agree bit for bit afterwards.
    pub fn to_netlist<S: AsRef<str>>(&mut self, inputs: &[S], outputs: &[S]) -> Result<Netlist, Error> {
        if inputs.len() != self.n_inputs() {
            return Err(Error::NameCount {
                what: "input",
                expected: self.n_inputs(),
                found: inputs.len(),
            });
        }
        if outputs.len() != self.n_outputs() {
            return Err(Error::NameCount {
                what: "output",
                expected: self.n_outputs(),
                found: outputs.len(),
            });
        }
        if self.stale {
            self.build();
        }
        self.complete_merge();
        self.materialize();

        let n = self.n_inputs();
        let prefix = outputs[0].as_ref();
        let chains = SkipChains::new(self);
        let mut ids: Vec<Vec<usize>> = (0..n).map(|l| vec![0; self.indices(l).len()]).collect();
        let signal = |ids: &Vec<Vec<usize>>, (level, edge): (usize, Edge)| match edge.position() {
            None => format!("{}n0", prefix),
            Some(pos) => format!("{}n{}", prefix, ids[level][pos]),
        };

        let mut netlist = Netlist::default();
        netlist.push(Names {
            inputs: Vec::new(),
            output: format!("{}n0", prefix),
            cubes: Vec::new(),
        });
        for (var, name) in inputs.iter().enumerate() {
            netlist.push(Names {
                inputs: vec![name.as_ref().to_string()],
                output: format!("{}v{}", prefix, self.order.level(Var::new(var)).index()),
                cubes: vec!["1".to_string()],
            });
        }

        let mut next_id = 1;
        for level in (0..n).rev() {
            for pos in 0..self.indices(level).len() {
                if chains.is_skipped(level, pos) {
                    continue;
                }
                ids[level][pos] = next_id;
                next_id += 1;

                let (e0, e1) = self.children(level)[pos];
                let child = |edge: Edge| edge.position().map(|p| self.indices(level + 1)[p]);
                let low_implies_high = self.table.implies(
                    child(e0),
                    e0.is_complemented(),
                    child(e1),
                    e1.is_complemented(),
                    level + 1,
                );
                let high_implies_low = self.table.implies(
                    child(e1),
                    e1.is_complemented(),
                    child(e0),
                    e0.is_complemented(),
                    level + 1,
                );

                let low = chains.resolve(level + 1, e0);
                let high = chains.resolve(level + 1, e1);
                let low_cube = format!("{}{}-", if low_implies_high { '-' } else { '0' }, literal(low.1));
                let high_cube = format!("{}{}", if high_implies_low { "--" } else { "1-" }, literal(high.1));
                netlist.push(Names {
                    inputs: vec![format!("{}v{}", prefix, level), signal(&ids, low), signal(&ids, high)],
                    output: format!("{}n{}", prefix, ids[level][pos]),
                    cubes: vec![low_cube, high_cube],
                });
            }
        }

        for (output, name) in outputs.iter().enumerate() {
            let root = chains.resolve(0, self.structure.roots[output]);
            netlist.push(Names {
                inputs: vec![signal(&ids, root)],
                output: name.as_ref().to_string(),
                cubes: vec![literal(root.1).to_string()],
            });
        }

        debug!("Emitted {} records for {} nodes", netlist.records.len(), next_id - 1);
        Ok(netlist)
    }
}
