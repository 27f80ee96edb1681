//! Word-packed truth tables.
//!
//! A [`PackedTable`] stores `outputs` boolean functions over `inputs` ordered
//! variables as one flat bit vector: bit `o * 2^inputs + p` is the value of
//! output `o` at table position `p`. The variable at level `L` selects bit
//! `inputs - 1 - L` of the position, so a node at level `L` with index `i`
//! owns the `2^(inputs - L)` bits starting at `i * 2^(inputs - L)`, and its
//! two children at level `L + 1` are the indices `2i` and `2i + 1`.
//!
//! Slices of 64 bits or more span whole words. Narrower slices live inside a
//! single word at a shift; every bulk operation below goes through [`Span`]
//! so both cases share one code path.
//!
//! The same layout serves the care vector, which is why the care-aware
//! operations take a second table of identical shape.

use crate::error::{check_shape, Error};

const WORD_LOG: usize = 6;

/// Masks for slices narrower than a word, indexed by log2 of the slice width.
const ONES: [u64; 7] = [
    0x0000_0000_0000_0001,
    0x0000_0000_0000_0003,
    0x0000_0000_0000_000f,
    0x0000_0000_0000_00ff,
    0x0000_0000_0000_ffff,
    0x0000_0000_ffff_ffff,
    0xffff_ffff_ffff_ffff,
];

/// Position masks of the `01` block in each 4-block group, indexed by log2 of the block size.
const SWAP_MASKS: [u64; 5] = [
    0x2222_2222_2222_2222,
    0x0c0c_0c0c_0c0c_0c0c,
    0x00f0_00f0_00f0_00f0,
    0x0000_ff00_0000_ff00,
    0x0000_0000_ffff_0000,
];

/// Result of comparing two slices: equality and complementarity are decided in one scan.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Similarity {
    pub equal: bool,
    pub complement: bool,
}

impl Similarity {
    /// Whether the slices match in either polarity.
    pub fn any(self) -> bool {
        self.equal || self.complement
    }
}

/// Which care region restricts a comparison between slices `a` and `b`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CareMask {
    /// Rows where `a` cares.
    Left,
    /// Rows where `b` cares.
    Right,
    /// Rows where both care.
    Both,
}

/// Word range of one node slice.
#[derive(Debug, Copy, Clone)]
struct Span {
    start: usize,
    len: usize,
    shift: usize,
    mask: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedTable {
    inputs: usize,
    outputs: usize,
    words: Vec<u64>,
}

impl PackedTable {
    /// All-zero table for `outputs` functions over `inputs` variables.
    pub fn new(inputs: usize, outputs: usize) -> Result<Self, Error> {
        check_shape(inputs, outputs)?;
        let bits = outputs << inputs;
        Ok(Self {
            inputs,
            outputs,
            words: vec![0; bits.div_ceil(1 << WORD_LOG)],
        })
    }

    /// Builds a table from one on-set per output.
    ///
    /// Rows are read as binary numbers whose most significant bit is input 0.
    /// A row outside `[0, 2^inputs)` is rejected with [`Error::RowOutOfRange`].
    pub fn from_onsets<S: AsRef<[usize]>>(inputs: usize, onsets: &[S]) -> Result<Self, Error> {
        let mut table = Self::new(inputs, onsets.len())?;
        let rows = table.rows();
        for (output, onset) in onsets.iter().enumerate() {
            for &row in onset.as_ref() {
                if row >= rows {
                    return Err(Error::RowOutOfRange { output, row, rows });
                }
                table.set_bit((output << inputs) | row, true);
            }
        }
        Ok(table)
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Number of rows of each function.
    pub fn rows(&self) -> usize {
        1 << self.inputs
    }

    /// Raw storage words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Number of raw node indices at `level`.
    pub fn nodes_at(&self, level: usize) -> usize {
        self.outputs << level
    }

    /// Width in bits of a node slice at `level`.
    pub fn width(&self, level: usize) -> usize {
        1 << (self.inputs - level)
    }

    /// Whether `other` has the same dimensions.
    pub fn same_shape(&self, other: &PackedTable) -> bool {
        self.inputs == other.inputs && self.outputs == other.outputs
    }

    fn span(&self, index: usize, level: usize) -> Span {
        assert!(level <= self.inputs, "level {} is below the constant level {}", level, self.inputs);
        debug_assert!(
            index < self.nodes_at(level),
            "index {} is outside level {} ({} nodes)",
            index,
            level,
            self.nodes_at(level)
        );
        let width_log = self.inputs - level;
        if width_log >= WORD_LOG {
            let len = 1 << (width_log - WORD_LOG);
            Span {
                start: index * len,
                len,
                shift: 0,
                mask: u64::MAX,
            }
        } else {
            let bit = index << width_log;
            Span {
                start: bit >> WORD_LOG,
                len: 1,
                shift: bit & ((1 << WORD_LOG) - 1),
                mask: ONES[width_log],
            }
        }
    }

    fn read(&self, span: Span, i: usize) -> u64 {
        (self.words[span.start + i] >> span.shift) & span.mask
    }

    fn write(&mut self, span: Span, i: usize, value: u64) {
        let word = &mut self.words[span.start + i];
        *word = (*word & !(span.mask << span.shift)) | ((value & span.mask) << span.shift);
    }

    /// Reads a whole node slice that fits into one word.
    pub fn get_value(&self, index: usize, level: usize) -> u64 {
        assert!(self.inputs - level <= WORD_LOG, "slice at level {} is wider than a word", level);
        self.read(self.span(index, level), 0)
    }

    /// Overwrites a whole node slice that fits into one word.
    pub fn set_value(&mut self, index: usize, level: usize, bits: u64) {
        assert!(self.inputs - level <= WORD_LOG, "slice at level {} is wider than a word", level);
        let span = self.span(index, level);
        self.write(span, 0, bits);
    }

    /// Reads one bit by global position.
    pub fn bit(&self, pos: usize) -> bool {
        (self.words[pos >> WORD_LOG] >> (pos & 63)) & 1 != 0
    }

    /// Writes one bit by global position.
    pub fn set_bit(&mut self, pos: usize, value: bool) {
        let word = &mut self.words[pos >> WORD_LOG];
        if value {
            *word |= 1 << (pos & 63);
        } else {
            *word &= !(1 << (pos & 63));
        }
    }

    /// Overwrites node `dst` with node `src`, complemented if requested.
    ///
    /// `src == None` stands for the constant-0 terminal, so the slice becomes
    /// all zeros (or all ones when complemented).
    pub fn copy_func(&mut self, dst: usize, src: Option<usize>, level: usize, complement: bool) {
        if src == Some(dst) && !complement {
            return;
        }
        let d = self.span(dst, level);
        let s = src.map(|src| self.span(src, level));
        let flip = if complement { d.mask } else { 0 };
        for i in 0..d.len {
            let value = s.map_or(0, |s| self.read(s, i));
            self.write(d, i, value ^ flip);
        }
    }

    /// Sets every bit of a node slice to `value`.
    pub fn fill(&mut self, index: usize, level: usize, value: bool) {
        self.copy_func(index, None, level, value);
    }

    pub fn is_const0(&self, index: usize, level: usize) -> bool {
        let span = self.span(index, level);
        (0..span.len).all(|i| self.read(span, i) == 0)
    }

    pub fn is_const1(&self, index: usize, level: usize) -> bool {
        let span = self.span(index, level);
        (0..span.len).all(|i| self.read(span, i) == span.mask)
    }

    /// Number of set bits in a node slice.
    pub fn count_ones(&self, index: usize, level: usize) -> usize {
        let span = self.span(index, level);
        (0..span.len).map(|i| self.read(span, i).count_ones() as usize).sum()
    }

    /// Compares two slices for equality and complementarity in a single pass.
    pub fn compare(&self, a: usize, b: usize, level: usize) -> Similarity {
        let sa = self.span(a, level);
        let sb = self.span(b, level);
        let mut sim = Similarity {
            equal: true,
            complement: true,
        };
        for i in 0..sa.len {
            let diff = self.read(sa, i) ^ self.read(sb, i);
            sim.equal &= diff == 0;
            sim.complement &= diff == sa.mask;
            if !sim.any() {
                break;
            }
        }
        sim
    }

    /// Checks `(a ^ ca) -> (b ^ cb)` over the whole slice.
    ///
    /// A `None` operand is the constant-0 terminal.
    pub fn implies(&self, a: Option<usize>, ca: bool, b: Option<usize>, cb: bool, level: usize) -> bool {
        let mask = ONES[(self.inputs - level).min(WORD_LOG)];
        let len = 1 << (self.inputs - level).saturating_sub(WORD_LOG);
        let sa = a.map(|a| self.span(a, level));
        let sb = b.map(|b| self.span(b, level));
        let fa = if ca { mask } else { 0 };
        let fb = if cb { mask } else { 0 };
        (0..len).all(|i| {
            let va = sa.map_or(0, |s| self.read(s, i)) ^ fa;
            let vb = sb.map_or(0, |s| self.read(s, i)) ^ fb;
            va & !vb & mask == 0
        })
    }

    /// Exchanges the variables at `level` and `level + 1`.
    ///
    /// The table is viewed as groups of four blocks of `2^s` bits, where
    /// `s = inputs - level - 2`, and the two interior blocks of every group
    /// are exchanged. The transform is its own inverse.
    pub fn swap_levels(&mut self, level: usize) {
        assert!(
            level + 1 < self.inputs,
            "cannot swap level {} with the level below it ({} inputs)",
            level,
            self.inputs
        );
        let s = self.inputs - level - 2;
        if s > WORD_LOG {
            // Blocks of whole words.
            let block = 1 << (s - WORD_LOG);
            for group in (0..self.words.len()).step_by(4 * block) {
                for i in 0..block {
                    self.words.swap(group + block + i, group + 2 * block + i);
                }
            }
        } else if s == WORD_LOG {
            for group in (0..self.words.len()).step_by(4) {
                self.words.swap(group + 1, group + 2);
            }
        } else if s == WORD_LOG - 1 {
            // Upper half of the even word against the lower half of the odd word.
            for i in (0..self.words.len()).step_by(2) {
                self.words[i + 1] ^= self.words[i] >> 32;
                self.words[i] ^= self.words[i + 1] << 32;
                self.words[i + 1] ^= self.words[i] >> 32;
            }
        } else {
            let shift = 1 << s;
            let mask = SWAP_MASKS[s];
            for word in self.words.iter_mut() {
                *word ^= (*word >> shift) & mask;
                *word ^= (*word & mask) << shift;
                *word ^= (*word >> shift) & mask;
            }
        }
    }

    // Care-aware operations. `care` must have the shape of `self`.

    /// True if the slice is 0 on every row where `care` is set.
    pub fn is_const0_on(&self, care: &PackedTable, index: usize, level: usize) -> bool {
        let span = self.span(index, level);
        (0..span.len).all(|i| self.read(span, i) & care.read(span, i) == 0)
    }

    /// True if the slice is 1 on every row where `care` is set.
    pub fn is_const1_on(&self, care: &PackedTable, index: usize, level: usize) -> bool {
        let span = self.span(index, level);
        (0..span.len).all(|i| !self.read(span, i) & care.read(span, i) == 0)
    }

    /// Compares `a` and `b` only on the rows selected by `mask`.
    ///
    /// An empty care region is reported as both equal and complementary.
    pub fn agrees(&self, care: &PackedTable, a: usize, b: usize, level: usize, mask: CareMask) -> Similarity {
        let sa = self.span(a, level);
        let sb = self.span(b, level);
        let mut sim = Similarity {
            equal: true,
            complement: true,
        };
        for i in 0..sa.len {
            let region = match mask {
                CareMask::Left => care.read(sa, i),
                CareMask::Right => care.read(sb, i),
                CareMask::Both => care.read(sa, i) & care.read(sb, i),
            };
            let diff = self.read(sa, i) ^ self.read(sb, i);
            sim.equal &= diff & region == 0;
            sim.complement &= !diff & region == 0;
            if !sim.any() {
                break;
            }
        }
        sim
    }

    /// Folds node `absorbed` into node `survivor`.
    ///
    /// On the rows where `absorbed` cares, `survivor` takes the (possibly
    /// complemented) value of `absorbed`; everywhere else it keeps its own.
    /// The survivor's care region becomes the union of both.
    pub fn merge_into(
        &mut self,
        care: &mut PackedTable,
        survivor: usize,
        absorbed: usize,
        level: usize,
        complement: bool,
    ) {
        let ss = self.span(survivor, level);
        let sa = self.span(absorbed, level);
        let flip = if complement { ss.mask } else { 0 };
        for i in 0..ss.len {
            let ca = care.read(sa, i);
            let cs = care.read(ss, i);
            let value = (self.read(ss, i) & !ca) | ((self.read(sa, i) ^ flip) & ca);
            self.write(ss, i, value);
            care.write(ss, i, cs | ca);
        }
    }
}
