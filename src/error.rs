//! Error types for table construction, trace ingestion and netlist handling.
//!
//! Only malformed caller data is reported through [`Error`]. Violated internal
//! invariants (a level out of range, loading an empty checkpoint slot, ...)
//! are programming errors and panic.

use std::fmt;

/// Largest supported number of inputs for a single engine instance.
pub const MAX_INPUTS: usize = 24;

/// Errors reported by the minimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A table needs at least one input variable.
    NoInputs,

    /// A table needs at least one output function.
    NoOutputs,

    /// The input count exceeds [`MAX_INPUTS`].
    TooManyInputs {
        /// Requested number of inputs
        inputs: usize,
        /// Supported maximum
        max: usize,
    },

    /// An on-set row lies outside `[0, 2^inputs)`.
    ///
    /// Rows are rejected rather than clamped, so a bad row never silently
    /// turns on another assignment.
    RowOutOfRange {
        /// Output whose on-set contained the row
        output: usize,
        /// The offending row
        row: usize,
        /// Number of rows of the table
        rows: usize,
    },

    /// The care vector does not have the shape of the function table.
    CareShape {
        /// `(inputs, outputs)` of the function table
        expected: (usize, usize),
        /// `(inputs, outputs)` of the care vector
        found: (usize, usize),
    },

    /// The simulation trace has a different number of lanes than the table has inputs.
    LaneCount {
        /// Number of table inputs
        expected: usize,
        /// Number of trace lanes
        found: usize,
    },

    /// Trace lanes differ in length, or a flat buffer does not split evenly.
    RaggedTrace {
        /// First lane with an unexpected length
        lane: usize,
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        found: usize,
    },

    /// The number of names handed to the emitter does not match the table.
    NameCount {
        /// Which names were miscounted ("input" or "output")
        what: &'static str,
        /// Required count
        expected: usize,
        /// Supplied count
        found: usize,
    },

    /// A netlist record reads a signal that no earlier record or primary input defines.
    UndefinedSignal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoInputs => write!(f, "table must have at least one input"),
            Error::NoOutputs => write!(f, "table must have at least one output"),
            Error::TooManyInputs { inputs, max } => {
                write!(f, "{} inputs requested, at most {} are supported", inputs, max)
            }
            Error::RowOutOfRange { output, row, rows } => {
                write!(f, "on-set row {} of output {} is outside the {} table rows", row, output, rows)
            }
            Error::CareShape { expected, found } => write!(
                f,
                "care vector shape {}x{} does not match table shape {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            Error::LaneCount { expected, found } => {
                write!(f, "trace has {} lanes, table has {} inputs", found, expected)
            }
            Error::RaggedTrace { lane, expected, found } => {
                write!(f, "trace lane {} has {} bytes, expected {}", lane, found, expected)
            }
            Error::NameCount { what, expected, found } => {
                write!(f, "expected {} {} names, got {}", expected, what, found)
            }
            Error::UndefinedSignal(name) => write!(f, "signal '{}' is used before it is defined", name),
        }
    }
}

impl std::error::Error for Error {}

/// Validates the dimensions shared by every table-shaped vector.
pub(crate) fn check_shape(inputs: usize, outputs: usize) -> Result<(), Error> {
    if inputs == 0 {
        return Err(Error::NoInputs);
    }
    if inputs > MAX_INPUTS {
        return Err(Error::TooManyInputs { inputs, max: MAX_INPUTS });
    }
    if outputs == 0 {
        return Err(Error::NoOutputs);
    }
    Ok(())
}
