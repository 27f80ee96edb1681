//! Type-safe wrappers for input variables, levels and the level order.
//!
//! Variables are the primary inputs of the minimized functions and keep their
//! identity forever. Levels are positions in the diagram and change whenever
//! two adjacent variables are transposed. [`VarOrder`] is the permutation
//! between the two.
use std::fmt;

/// An input variable (0-indexed, in the order of the truth-table row bits).
///
/// Input 0 is the most significant bit of a row number.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(usize);

impl Var {
    /// Creates a variable for the given input number.
    pub fn new(id: usize) -> Self {
        Var(id)
    }

    /// Returns the input number.
    pub fn id(self) -> usize {
        self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for usize {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0-indexed).
///
/// Level `L` holds the sub-functions left after fixing the variables at
/// levels `0..L`. Level 0 is the root (one node per output) and level
/// `inputs` is the constant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    /// Creates a new level with the given index.
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    /// Returns the raw level index as a `usize`.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns the next level down (index + 1).
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Permutation between variables and levels.
///
/// # Invariants
///
/// - `levels` and `vars` are mutually inverse bijections on `[0, inputs)`
/// - only [`VarOrder::swap_adjacent`] changes the permutation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarOrder {
    levels: Vec<usize>,
    vars: Vec<usize>,
}

impl VarOrder {
    /// The order where variable `i` sits at level `i`.
    pub fn identity(inputs: usize) -> Self {
        Self {
            levels: (0..inputs).collect(),
            vars: (0..inputs).collect(),
        }
    }

    /// Number of variables in the order.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Current level of `var`.
    pub fn level(&self, var: Var) -> Level {
        Level(self.levels[var.0])
    }

    /// Variable currently decided at `level`.
    pub fn var_at(&self, level: Level) -> Var {
        Var(self.vars[level.0])
    }

    /// Variables listed from the top level down.
    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.vars.iter().map(|&v| Var(v))
    }

    /// The level of every variable, indexed by variable.
    pub fn as_levels(&self) -> &[usize] {
        &self.levels
    }

    /// Exchanges the variables at `level` and `level + 1`.
    ///
    /// # Panics
    ///
    /// Panics if `level + 1` is not a valid level.
    pub fn swap_adjacent(&mut self, level: Level) {
        let l = level.0;
        assert!(l + 1 < self.vars.len(), "cannot swap {} with the level below it", level);
        self.vars.swap(l, l + 1);
        self.levels[self.vars[l]] = l;
        self.levels[self.vars[l + 1]] = l + 1;
        debug_assert!(self.is_bijection());
    }

    /// Checks that `levels` and `vars` are inverse permutations.
    pub fn is_bijection(&self) -> bool {
        let n = self.vars.len();
        self.levels.len() == n
            && self
                .vars
                .iter()
                .enumerate()
                .all(|(level, &var)| var < n && self.levels[var] == level)
    }
}

impl fmt::Display for VarOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, var) in self.vars().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", var)?;
        }
        write!(f, "]")
    }
}
