//! Bit-packed full assignments.
use crate::lit::{Lit, Var};
use crate::mem::{Mem, MemError};

/// Backing word of bit vectors.
pub type Word = u32;

const LD_BITS_PER_WORD: usize = 5;
const BITS_PER_WORD: usize = 1 << LD_BITS_PER_WORD;
const BIT_MASK: usize = BITS_PER_WORD - 1;

/// One bit per variable, packed into words.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Bits {
    words: Vec<Word>,
}

impl Bits {
    /// Number of words needed for `count` bits.
    pub fn word_count(count: usize) -> usize {
        (count + BIT_MASK) >> LD_BITS_PER_WORD
    }

    /// An all-false vector of `count` bits.
    pub fn new(mem: &mut Mem, count: usize) -> Result<Bits, MemError> {
        Ok(Bits {
            words: mem.alloc(Bits::word_count(count), 0)?,
        })
    }

    /// Builds a vector from raw words.
    pub fn from_words(words: Vec<Word>) -> Bits {
        Bits { words }
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.words[index >> LD_BITS_PER_WORD] & (1 << (index & BIT_MASK)) != 0
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        let word = &mut self.words[index >> LD_BITS_PER_WORD];
        let bit = 1 << (index & BIT_MASK);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    #[inline]
    pub fn toggle(&mut self, index: usize) {
        self.words[index >> LD_BITS_PER_WORD] ^= 1 << (index & BIT_MASK);
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Overwrite with the contents of another vector of the same size.
    pub fn copy_from(&mut self, other: &Bits) {
        self.words.copy_from_slice(&other.words);
    }

    /// Number of positions where the two vectors differ.
    pub fn distance(&self, other: &Bits) -> usize {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Releases the backing words.
    pub fn release(&mut self, mem: &mut Mem) {
        mem.release(&mut self.words);
    }
}

/// Current, best and seed assignments.
///
/// The search only ever mutates `vals` through flips. `best` holds the assignment with the
/// fewest unsatisfied clauses seen so far. `tmp` is used to assemble restart seeds.
#[derive(Default)]
pub struct Assignment {
    var_count: usize,
    pub vals: Bits,
    pub best: Bits,
    pub tmp: Bits,
    /// Polarity hints given by the user.
    pub phases: Vec<Lit>,
    /// Values fixed by preprocessing, applied to every seed.
    pub fixed: Vec<Option<bool>>,
}

impl Assignment {
    /// Allocate all vectors for a new variable count, every variable false.
    pub fn set_var_count(&mut self, mem: &mut Mem, count: usize) -> Result<(), MemError> {
        for bits in [&mut self.vals, &mut self.best, &mut self.tmp].iter_mut() {
            bits.release(mem);
            **bits = Bits::new(mem, count)?;
        }
        mem.release(&mut self.fixed);
        self.fixed = mem.alloc(count, None)?;
        self.var_count = count;
        Ok(())
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    #[inline]
    pub fn var_value(&self, var: Var) -> bool {
        self.vals.get(var.index())
    }

    #[inline]
    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.vals.get(lit.index()) == lit.is_positive()
    }

    /// Whether a literal is true in the best assignment.
    #[inline]
    pub fn best_lit_is_true(&self, lit: Lit) -> bool {
        self.best.get(lit.index()) == lit.is_positive()
    }

    /// Forces the preprocessing values onto `tmp`.
    pub fn apply_fixed_to_tmp(&mut self) {
        for (index, value) in self.fixed.iter().enumerate() {
            if let Some(value) = *value {
                self.tmp.set(index, value);
            }
        }
    }
}
