//! Satisfied counts, critical literals and break values.
//!
//! For every clause we keep the number of true literals and the XOR of the codes of all true
//! literals. When exactly one literal is true, the XOR is that literal, the clause's critical
//! literal. A variable's break value is the number of clauses in which one of its literals is
//! critical; flipping the variable makes exactly those clauses unsatisfied. The weighted break
//! value sums the weights of the same clauses.
//!
//! All of this is maintained incrementally by [`flip`](crate::flip::flip). The functions here
//! compute the state from scratch after a reseed and verify the incremental state.
use partial_ref::{partial, PartialRef};

use crate::context::{AssignmentP, ClauseDbP, Context, CritP, MemP, OccsP, UnsatP, WeightsP};
use crate::lit::{Lit, LitIdx, Var};
use crate::mem::{Mem, MemError};
use crate::unsat::UnsatTracker;

/// Per clause satisfied literal counts in the narrowest width fitting the longest clause.
pub enum SatCounts {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Default for SatCounts {
    fn default() -> SatCounts {
        SatCounts::U8(vec![])
    }
}

impl SatCounts {
    /// All zero counts for `clause_count` clauses of at most `max_len` literals.
    pub fn new(mem: &mut Mem, clause_count: usize, max_len: usize) -> Result<SatCounts, MemError> {
        Ok(if max_len <= u8::max_value() as usize {
            SatCounts::U8(mem.alloc(clause_count, 0)?)
        } else if max_len <= u16::max_value() as usize {
            SatCounts::U16(mem.alloc(clause_count, 0)?)
        } else {
            SatCounts::U32(mem.alloc(clause_count, 0)?)
        })
    }

    /// Bytes used per clause.
    pub fn width(&self) -> usize {
        match self {
            SatCounts::U8(_) => 1,
            SatCounts::U16(_) => 2,
            SatCounts::U32(_) => 4,
        }
    }

    #[inline]
    pub fn get(&self, cidx: usize) -> u32 {
        match self {
            SatCounts::U8(counts) => counts[cidx] as u32,
            SatCounts::U16(counts) => counts[cidx] as u32,
            SatCounts::U32(counts) => counts[cidx],
        }
    }

    #[inline]
    pub fn set(&mut self, cidx: usize, value: u32) {
        match self {
            SatCounts::U8(counts) => counts[cidx] = value as u8,
            SatCounts::U16(counts) => counts[cidx] = value as u16,
            SatCounts::U32(counts) => counts[cidx] = value,
        }
    }

    /// Increment a count, returning the previous value.
    #[inline]
    pub fn inc(&mut self, cidx: usize) -> u32 {
        let old = self.get(cidx);
        self.set(cidx, old + 1);
        old
    }

    /// Decrement a count, returning the new value.
    #[inline]
    pub fn dec(&mut self, cidx: usize) -> u32 {
        let new = self.get(cidx) - 1;
        self.set(cidx, new);
        new
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        match self {
            SatCounts::U8(counts) => mem.release(counts),
            SatCounts::U16(counts) => mem.release(counts),
            SatCounts::U32(counts) => mem.release(counts),
        }
    }
}

/// Incrementally maintained per clause and per variable counters.
#[derive(Default)]
pub struct Crit {
    pub satcnt: SatCounts,
    /// XOR of the codes of the true literals of each clause.
    crit: Vec<LitIdx>,
    breaks: Vec<u32>,
    weighted: Vec<u64>,
    /// Critical literals are tracked. Otherwise only satisfied counts are kept.
    enabled: bool,
}

impl Crit {
    /// Allocate zeroed tables.
    pub fn init(
        &mut self,
        mem: &mut Mem,
        clause_count: usize,
        var_count: usize,
        max_len: usize,
        enabled: bool,
    ) -> Result<(), MemError> {
        self.clear(mem);
        self.satcnt = SatCounts::new(mem, clause_count, max_len)?;
        if enabled {
            self.crit = mem.alloc(clause_count, 0)?;
            self.breaks = mem.alloc(var_count, 0)?;
            self.weighted = mem.alloc(var_count, 0)?;
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Whether break values are maintained incrementally.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The only true literal of a clause, if there is exactly one.
    ///
    /// Only available when tracking is enabled.
    #[inline]
    pub fn critical(&self, cidx: usize) -> Option<Lit> {
        if self.enabled && self.satcnt.get(cidx) == 1 {
            Some(Lit::from_code(self.crit[cidx] as usize))
        } else {
            None
        }
    }

    /// Number of clauses that would become unsatisfied by flipping a variable.
    #[inline]
    pub fn breaks(&self, var: Var) -> u32 {
        self.breaks[var.index()]
    }

    /// Sum of the weights of the clauses that would become unsatisfied by flipping a variable.
    #[inline]
    pub fn weighted_breaks(&self, var: Var) -> u64 {
        self.weighted[var.index()]
    }

    /// A literal became true in a clause that had `old_count` true literals.
    #[inline]
    pub fn make(&mut self, cidx: usize, lit: Lit, old_count: u32, weight: u64) {
        if !self.enabled {
            return;
        }
        if old_count == 0 {
            self.breaks[lit.index()] += 1;
            self.weighted[lit.index()] += weight;
        } else if old_count == 1 {
            let critical = Lit::from_code(self.crit[cidx] as usize);
            self.breaks[critical.index()] -= 1;
            self.weighted[critical.index()] -= weight;
        }
        self.crit[cidx] ^= lit.code() as LitIdx;
    }

    /// A literal became false in a clause that now has `new_count` true literals.
    #[inline]
    pub fn brk(&mut self, cidx: usize, lit: Lit, new_count: u32, weight: u64) {
        if !self.enabled {
            return;
        }
        self.crit[cidx] ^= lit.code() as LitIdx;
        if new_count == 0 {
            self.breaks[lit.index()] -= 1;
            self.weighted[lit.index()] -= weight;
        } else if new_count == 1 {
            let critical = Lit::from_code(self.crit[cidx] as usize);
            self.breaks[critical.index()] += 1;
            self.weighted[critical.index()] += weight;
        }
    }

    /// Change the weight of a clause from `old` to `new`.
    #[inline]
    pub fn reweight(&mut self, cidx: usize, old: u64, new: u64) {
        if let Some(critical) = self.critical(cidx) {
            let weighted = &mut self.weighted[critical.index()];
            *weighted = *weighted - old + new;
        }
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        self.satcnt.clear(mem);
        mem.release(&mut self.crit);
        mem.release(&mut self.breaks);
        mem.release(&mut self.weighted);
    }
}

/// Recompute all counters and the unsatisfied set from the current assignment.
pub fn recompute(
    mut ctx: partial!(
        Context,
        mut CritP,
        mut MemP,
        mut UnsatP,
        AssignmentP,
        ClauseDbP,
        WeightsP,
    ),
) -> Result<(), MemError> {
    let (crit, mut ctx) = ctx.split_part_mut(CritP);
    let (mem, mut ctx) = ctx.split_part_mut(MemP);
    let (unsat, ctx) = ctx.split_part_mut(UnsatP);
    let assignment = ctx.part(AssignmentP);
    let weights = ctx.part(WeightsP);

    if crit.enabled {
        for value in crit.breaks.iter_mut() {
            *value = 0;
        }
        for value in crit.weighted.iter_mut() {
            *value = 0;
        }
    }

    for (cidx, lits) in ctx.part(ClauseDbP).iter().enumerate() {
        let mut count = 0;
        let mut xor = 0;
        for &lit in lits {
            if assignment.lit_is_true(lit) {
                count += 1;
                xor ^= lit.code() as LitIdx;
            }
        }
        crit.satcnt.set(cidx, count);
        if crit.enabled {
            crit.crit[cidx] = xor;
            if count == 1 {
                let critical = Lit::from_code(xor as usize);
                crit.breaks[critical.index()] += 1;
                crit.weighted[critical.index()] += weights.weight(cidx);
            }
        }
        if count == 0 {
            unsat.insert(mem, cidx)?;
        }
    }
    Ok(())
}

/// Panics if the incremental state differs from a full recomputation.
///
/// Used by the `checking` option and by tests.
pub fn verify(
    ctx: partial!(Context, AssignmentP, ClauseDbP, CritP, OccsP, UnsatP, WeightsP),
) {
    let assignment = ctx.part(AssignmentP);
    let crit = ctx.part(CritP);
    let unsat = ctx.part(UnsatP);
    let weights = ctx.part(WeightsP);

    let var_count = assignment.var_count();
    let mut breaks = vec![0u32; var_count];
    let mut weighted = vec![0u64; var_count];
    let mut unsat_count = 0;

    for (cidx, lits) in ctx.part(ClauseDbP).iter().enumerate() {
        let true_lits: Vec<Lit> = lits
            .iter()
            .cloned()
            .filter(|&lit| assignment.lit_is_true(lit))
            .collect();

        assert_eq!(
            crit.satcnt.get(cidx) as usize,
            true_lits.len(),
            "satisfied count of clause {}",
            cidx
        );
        assert_eq!(
            unsat.contains(cidx),
            true_lits.is_empty(),
            "unsatisfied membership of clause {}",
            cidx
        );
        if true_lits.is_empty() {
            unsat_count += 1;
        }
        if let [critical] = true_lits[..] {
            if crit.enabled {
                assert_eq!(crit.critical(cidx), Some(critical), "critical of {}", cidx);
            }
            breaks[critical.index()] += 1;
            weighted[critical.index()] += weights.weight(cidx);
        }
    }
    assert_eq!(unsat.len(), unsat_count);

    if crit.enabled {
        for index in 0..var_count {
            let var = Var::from_index(index);
            assert_eq!(crit.breaks(var), breaks[index], "break value of {:?}", var);
            assert_eq!(
                crit.weighted_breaks(var),
                weighted[index],
                "weighted break value of {:?}",
                var
            );
        }
    }

    let occs = ctx.part(OccsP);
    for index in 0..var_count {
        let var = Var::from_index(index);
        let true_lit = var.lit(assignment.var_value(var));
        let scanned = occs
            .occs(true_lit)
            .iter()
            .filter(|&&cidx| crit.satcnt.get(cidx as usize) == 1)
            .count();
        assert_eq!(scanned as u32, breaks[index], "scanned break value of {:?}", var);
    }
}
