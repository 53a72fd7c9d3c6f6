//! Clause storage.
//!
//! All clauses live in one contiguous literal buffer. A clause is addressed by its index
//! (`cidx`) and spans from its start offset up to the start of the next clause. The store is
//! filled while loading and is immutable during search.
use crate::lit::Lit;
use crate::mem::{Mem, MemError};

/// Clause lengths beyond this are only tracked as "long" in length statistics.
pub const MAX_LEN: usize = (1 << LENSHIFT) - 1;
const LENSHIFT: usize = 6;

/// Flat clause store with derived length statistics.
#[derive(Default)]
pub struct ClauseDb {
    lits: Vec<Lit>,
    starts: Vec<u32>,
    binary: usize,
    ternary: usize,
    min_len: usize,
    max_len: usize,
    /// Clauses per capped length, index `MAX_LEN` collects everything longer.
    len_histogram: Vec<usize>,
}

impl ClauseDb {
    /// Append a clause.
    ///
    /// The literals must be free of duplicates and complementary pairs.
    pub fn add_clause(&mut self, mem: &mut Mem, lits: &[Lit]) -> Result<(), MemError> {
        debug_assert!(!lits.is_empty());
        debug_assert!(self.lits.len() + lits.len() <= u32::max_value() as usize);

        mem.push(&mut self.starts, self.lits.len() as u32)?;
        for &lit in lits {
            mem.push(&mut self.lits, lit)?;
        }

        let len = lits.len();
        match len {
            2 => self.binary += 1,
            3 => self.ternary += 1,
            _ => (),
        }
        if self.starts.len() == 1 || len < self.min_len {
            self.min_len = len;
        }
        self.max_len = self.max_len.max(len);

        if self.len_histogram.is_empty() {
            self.len_histogram = vec![0; MAX_LEN + 1];
        }
        self.len_histogram[len.min(MAX_LEN)] += 1;
        Ok(())
    }

    /// Number of clauses.
    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Literals of a clause.
    #[inline]
    pub fn lits(&self, cidx: usize) -> &[Lit] {
        let start = self.starts[cidx] as usize;
        let end = self
            .starts
            .get(cidx + 1)
            .map_or(self.lits.len(), |&end| end as usize);
        &self.lits[start..end]
    }

    /// Total number of stored literals.
    pub fn lit_count(&self) -> usize {
        self.lits.len()
    }

    /// Length of a clause, capped at [`MAX_LEN`].
    #[inline]
    pub fn capped_len(&self, cidx: usize) -> usize {
        self.lits(cidx).len().min(MAX_LEN)
    }

    pub fn binary_count(&self) -> usize {
        self.binary
    }

    pub fn ternary_count(&self) -> usize {
        self.ternary
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Length of the longest clause, not capped.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn avg_len(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.lits.len() as f64 / self.len() as f64
        }
    }

    /// Number of clauses of the given capped length.
    pub fn count_with_len(&self, len: usize) -> usize {
        self.len_histogram.get(len.min(MAX_LEN)).cloned().unwrap_or(0)
    }

    /// All clauses have the same length.
    pub fn is_uniform(&self) -> bool {
        !self.is_empty() && self.min_len == self.max_len
    }

    /// Iterator over all clauses in index order.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> + '_ {
        (0..self.len()).map(move |cidx| self.lits(cidx))
    }

    /// Release all storage.
    pub fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.lits);
        mem.release(&mut self.starts);
        *self = ClauseDb::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(numbers: &[i32]) -> Vec<Lit> {
        numbers.iter().map(|&n| Lit::from_dimacs(n)).collect()
    }

    #[test]
    fn store_and_classify() {
        let mut mem = Mem::default();
        let mut db = ClauseDb::default();
        db.add_clause(&mut mem, &lits(&[1, -2])).unwrap();
        db.add_clause(&mut mem, &lits(&[1, 2, 3])).unwrap();
        db.add_clause(&mut mem, &lits(&[-1, 2, -3, 4])).unwrap();

        assert_eq!(db.len(), 3);
        assert_eq!(db.lits(1), &lits(&[1, 2, 3])[..]);
        assert_eq!(db.lits(2).len(), 4);
        assert_eq!(db.binary_count(), 1);
        assert_eq!(db.ternary_count(), 1);
        assert_eq!(db.min_len(), 2);
        assert_eq!(db.max_len(), 4);
        assert!(!db.is_uniform());
        assert_eq!(db.lit_count(), 9);
        assert!((db.avg_len() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn long_clauses_share_capped_bucket() {
        let mut mem = Mem::default();
        let mut db = ClauseDb::default();
        let long: Vec<i32> = (1..=(MAX_LEN as i32 + 5)).collect();
        db.add_clause(&mut mem, &lits(&long)).unwrap();
        db.add_clause(&mut mem, &lits(&long[..MAX_LEN])).unwrap();

        assert_eq!(db.capped_len(0), MAX_LEN);
        assert_eq!(db.lits(0).len(), MAX_LEN + 5);
        assert_eq!(db.count_with_len(MAX_LEN), 2);
        assert_eq!(db.max_len(), MAX_LEN + 5);
    }
}
