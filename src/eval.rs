//! Simulation of emitted netlists.
//!
//! Records are evaluated in order, so a netlist is simulated in one pass.
//! A record is true when any of its cubes matches the current signal values.

use std::collections::HashMap;

use crate::blif::{Names, Netlist};
use crate::error::Error;

/// Signal values by name.
pub type Assignment = HashMap<String, bool>;

impl Names {
    /// Evaluates the cover against `values`.
    pub fn eval(&self, values: &Assignment) -> Result<bool, Error> {
        let inputs = self
            .inputs
            .iter()
            .map(|name| values.get(name).copied().ok_or_else(|| Error::UndefinedSignal(name.clone())))
            .collect::<Result<Vec<bool>, Error>>()?;
        Ok(self.cubes.iter().any(|cube| {
            cube.chars().zip(&inputs).all(|(c, &v)| match c {
                '-' => true,
                '1' => v,
                _ => !v,
            })
        }))
    }
}

impl Netlist {
    /// Simulates the netlist with the primary inputs set to `inputs`.
    ///
    /// Returns the values of every signal, primary inputs included.
    pub fn simulate(&self, inputs: &Assignment) -> Result<Assignment, Error> {
        let mut values = inputs.clone();
        for record in &self.records {
            let value = record.eval(&values)?;
            values.insert(record.output.clone(), value);
        }
        Ok(values)
    }

    /// Simulates one truth-table row: input `i` takes bit `n - 1 - i` of `row`.
    ///
    /// Returns the values of `outputs`, in order.
    pub fn simulate_row<S: AsRef<str>>(&self, inputs: &[S], outputs: &[S], row: usize) -> Result<Vec<bool>, Error> {
        let n = inputs.len();
        let assignment: Assignment = inputs
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref().to_string(), (row >> (n - 1 - i)) & 1 == 1))
            .collect();
        let values = self.simulate(&assignment)?;
        outputs
            .iter()
            .map(|name| {
                values
                    .get(name.as_ref())
                    .copied()
                    .ok_or_else(|| Error::UndefinedSignal(name.as_ref().to_string()))
            })
            .collect()
    }
}
