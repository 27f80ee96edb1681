//! Simulation traces and the care vectors derived from them.
//!
//! A trace holds one byte lane per input. Bit `j` of byte `i`, read across
//! all lanes at once (lane 0 as the most significant bit), is one observed
//! input pattern. A pattern becomes a care row once it has been observed
//! `rarity` times.

use log::debug;

use crate::error::{check_shape, Error};
use crate::table::PackedTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTrace {
    lanes: Vec<Vec<u8>>,
}

impl SimTrace {
    /// Wraps one byte lane per input. All lanes must have the same length.
    pub fn from_lanes(lanes: Vec<Vec<u8>>) -> Result<Self, Error> {
        check_shape(lanes.len(), 1)?;
        let expected = lanes[0].len();
        if let Some((lane, bytes)) = lanes.iter().enumerate().find(|(_, l)| l.len() != expected) {
            return Err(Error::RaggedTrace {
                lane,
                expected,
                found: bytes.len(),
            });
        }
        Ok(Self { lanes })
    }

    /// Splits a flat buffer into `inputs` consecutive lanes of equal length.
    pub fn from_bytes(data: &[u8], inputs: usize) -> Result<Self, Error> {
        check_shape(inputs, 1)?;
        let per_lane = data.len() / inputs;
        if per_lane * inputs != data.len() {
            return Err(Error::RaggedTrace {
                lane: inputs - 1,
                expected: per_lane,
                found: data.len() - per_lane * (inputs - 1),
            });
        }
        if per_lane == 0 {
            return Self::from_lanes(vec![Vec::new(); inputs]);
        }
        Self::from_lanes(data.chunks(per_lane).map(<[u8]>::to_vec).collect())
    }

    /// Number of lanes (inputs).
    pub fn n_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Number of observed patterns.
    pub fn n_patterns(&self) -> usize {
        self.lanes[0].len() * 8
    }

    /// Keeps only the given lanes, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if a lane number is out of range.
    pub fn select(&self, lanes: &[usize]) -> SimTrace {
        SimTrace {
            lanes: lanes.iter().map(|&l| self.lanes[l].clone()).collect(),
        }
    }

    /// Observed patterns as row numbers, in trace order.
    pub fn patterns(&self) -> impl Iterator<Item = usize> + '_ {
        let bytes = self.lanes[0].len();
        (0..bytes).flat_map(move |i| {
            (0..8).map(move |j| {
                self.lanes
                    .iter()
                    .fold(0, |acc, lane| (acc << 1) | ((lane[i] >> j) & 1) as usize)
            })
        })
    }

    /// Rows in the order in which they reach `rarity` observations.
    pub fn care_rows(&self, rarity: usize) -> Vec<usize> {
        if rarity == 0 {
            return Vec::new();
        }
        let mut counts = vec![0usize; 1 << self.n_lanes()];
        let mut rows = Vec::new();
        for pattern in self.patterns() {
            counts[pattern] += 1;
            if counts[pattern] == rarity {
                rows.push(pattern);
            }
        }
        rows
    }

    /// Care vector for a table of `outputs` functions over the trace's inputs.
    ///
    /// Each care row is replicated across all outputs. A `rarity` of 0
    /// disables care tracking and yields `None`.
    pub fn care_table(&self, outputs: usize, rarity: usize) -> Result<Option<PackedTable>, Error> {
        if rarity == 0 {
            return Ok(None);
        }
        let inputs = self.n_lanes();
        let mut care = PackedTable::new(inputs, outputs)?;
        let rows = self.care_rows(rarity);
        debug!(
            "{} of {} rows are care rows at rarity {}",
            rows.len(),
            care.rows(),
            rarity
        );
        for row in rows {
            for output in 0..outputs {
                care.set_bit((output << inputs) | row, true);
            }
        }
        Ok(Some(care))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_patterns() {
        // Bit 0 of each lane: lane 0 = 1, lane 1 = 0 -> row 0b10.
        let trace = SimTrace::from_lanes(vec![vec![0b0000_0101], vec![0b0000_0110]]).unwrap();
        let patterns: Vec<usize> = trace.patterns().collect();
        assert_eq!(patterns, vec![0b10, 0b01, 0b11, 0, 0, 0, 0, 0]);
        assert_eq!(trace.n_patterns(), 8);
    }

    #[test]
    fn test_care_rows_rarity() {
        let trace = SimTrace::from_lanes(vec![vec![0b0000_0101], vec![0b0000_0110]]).unwrap();
        assert_eq!(trace.care_rows(1), vec![0b10, 0b01, 0b11, 0]);
        // Row 0 is seen five times, every other row once.
        assert_eq!(trace.care_rows(2), vec![0]);
        assert_eq!(trace.care_rows(5), vec![0]);
        assert!(trace.care_rows(6).is_empty());
    }

    #[test]
    fn test_care_table() {
        let trace = SimTrace::from_lanes(vec![vec![0x01], vec![0x00], vec![0x01]]).unwrap();
        assert_eq!(trace.care_table(2, 0).unwrap(), None);

        let care = trace.care_table(2, 1).unwrap().unwrap();
        for output in 0..2 {
            let rows: Vec<usize> = (0..8).filter(|&r| care.bit((output << 3) | r)).collect();
            assert_eq!(rows, vec![0, 0b101]);
        }
    }

    #[test]
    fn test_from_bytes_and_select() {
        let trace = SimTrace::from_bytes(&[1, 2, 3, 4, 5, 6], 3).unwrap();
        assert_eq!(trace, SimTrace::from_lanes(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap());
        let picked = trace.select(&[2, 0]);
        assert_eq!(picked, SimTrace::from_lanes(vec![vec![5, 6], vec![1, 2]]).unwrap());
        assert_eq!(picked.n_lanes(), 2);
    }

    #[test]
    fn test_malformed_traces() {
        assert_eq!(SimTrace::from_lanes(vec![]), Err(Error::NoInputs));
        assert_eq!(
            SimTrace::from_lanes(vec![vec![1, 2], vec![3]]),
            Err(Error::RaggedTrace {
                lane: 1,
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(SimTrace::from_bytes(&[1, 2, 3], 2), Err(Error::RaggedTrace { .. })));
    }
}
