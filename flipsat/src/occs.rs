//! Occurrence lists.
use crate::clause::ClauseDb;
use crate::lit::Lit;
use crate::mem::{Mem, MemError};

/// For each literal the indices of all clauses containing it.
///
/// All lists are stored back to back in a single array, the list of a literal with code `c` spans
/// `starts[c]..starts[c + 1]`. Built once per formula.
#[derive(Default)]
pub struct Occs {
    starts: Vec<u32>,
    cidxs: Vec<u32>,
}

impl Occs {
    /// Build the occurrence lists of a clause database using a counting pass.
    pub fn build(&mut self, mem: &mut Mem, db: &ClauseDb, var_count: usize) -> Result<(), MemError> {
        self.clear(mem);

        let lit_count = var_count * 2;
        let mut starts = mem.alloc(lit_count + 1, 0u32)?;

        for clause in db.iter() {
            for &lit in clause {
                starts[lit.code() + 1] += 1;
            }
        }
        for code in 0..lit_count {
            starts[code + 1] += starts[code];
        }

        let mut cidxs = mem.alloc(db.lit_count(), 0u32)?;
        let mut fill = mem.alloc(lit_count, 0u32)?;
        fill.copy_from_slice(&starts[..lit_count]);

        for (cidx, clause) in db.iter().enumerate() {
            for &lit in clause {
                let pos = &mut fill[lit.code()];
                cidxs[*pos as usize] = cidx as u32;
                *pos += 1;
            }
        }
        mem.release(&mut fill);

        self.starts = starts;
        self.cidxs = cidxs;
        Ok(())
    }

    /// Indices of the clauses containing a literal.
    #[inline]
    pub fn occs(&self, lit: Lit) -> &[u32] {
        let code = lit.code();
        &self.cidxs[self.starts[code] as usize..self.starts[code + 1] as usize]
    }

    /// Total number of occurrences.
    pub fn len(&self) -> usize {
        self.cidxs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cidxs.is_empty()
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.starts);
        mem.release(&mut self.cidxs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_match_clauses() {
        let mut mem = Mem::default();
        let mut db = ClauseDb::default();
        let clauses: &[&[i32]] = &[&[1, 2], &[-1, 3], &[1, -2, -3]];
        for clause in clauses {
            let lits: Vec<_> = clause.iter().map(|&n| Lit::from_dimacs(n)).collect();
            db.add_clause(&mut mem, &lits).unwrap();
        }

        let mut occs = Occs::default();
        occs.build(&mut mem, &db, 3).unwrap();

        assert_eq!(occs.occs(Lit::from_dimacs(1)), &[0, 2]);
        assert_eq!(occs.occs(Lit::from_dimacs(-1)), &[1]);
        assert_eq!(occs.occs(Lit::from_dimacs(2)), &[0]);
        assert_eq!(occs.occs(Lit::from_dimacs(-3)), &[2]);
        assert!(occs.occs(Lit::from_dimacs(3)).len() == 1);
        assert_eq!(occs.len(), 7);
    }
}
