//! Adaptive clause weights.
//!
//! Clauses that stay unsatisfied for a long time gain weight, making their literals' break values
//! more expensive to ignore. A clause that is satisfied again shortly after it was broken loses
//! weight. Weights stay within `1..=max`.
use partial_ref::{partial, PartialRef};

use crate::context::{Context, CritP, OptionsP, StatsP, TmpDataP, UnsatP, WeightsP};
use crate::mem::{Mem, MemError};

/// Per clause weights and the flip at which each clause last became unsatisfied.
#[derive(Default)]
pub struct Weights {
    weights: Vec<u8>,
    since: Vec<u64>,
    max: u8,
    active: bool,
    anti: bool,
}

impl Weights {
    /// Allocate uniform weights for `clause_count` clauses.
    pub fn init(&mut self, mem: &mut Mem, clause_count: usize) -> Result<(), MemError> {
        self.clear(mem);
        self.weights = mem.alloc(clause_count, 1)?;
        self.since = mem.alloc(clause_count, 0)?;
        self.max = 1;
        self.active = false;
        self.anti = false;
        Ok(())
    }

    /// Enable or disable weighting for the next search period.
    ///
    /// With `anti` the effective weight of a clause is mirrored within `1..=max`, so clauses that
    /// stayed unsatisfied the longest count the least. Stored weights are capped at the new
    /// maximum. Weighted break values must be recomputed afterwards.
    pub fn configure(&mut self, active: bool, anti: bool, max: u8) {
        self.active = active && max > 1;
        self.anti = anti;
        self.max = max.max(1);
        for weight in self.weights.iter_mut() {
            *weight = (*weight).min(self.max);
        }
    }

    /// Reset all weights to one.
    pub fn reset(&mut self) {
        for weight in self.weights.iter_mut() {
            *weight = 1;
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Effective weight of a clause, one when weighting is disabled.
    #[inline]
    pub fn weight(&self, cidx: usize) -> u64 {
        if self.active {
            self.effective(self.weights[cidx])
        } else {
            1
        }
    }

    #[inline]
    fn effective(&self, stored: u8) -> u64 {
        if self.anti {
            (self.max + 1 - stored) as u64
        } else {
            stored as u64
        }
    }

    /// Record that a clause became unsatisfied at the given flip.
    #[inline]
    pub fn mark_unsat(&mut self, cidx: usize, flips: u64) {
        self.since[cidx] = flips;
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.weights);
        mem.release(&mut self.since);
    }
}

/// Update clause weights after a flip.
///
/// Clauses made satisfied by the last flip after being unsatisfied for less than `weightint`
/// flips lose one unit. Every `weightint` flips, each clause unsatisfied for at least that long
/// gains one unit.
pub fn adapt_weights(
    mut ctx: partial!(Context, mut CritP, mut StatsP, mut WeightsP, OptionsP, TmpDataP, UnsatP),
) {
    if !ctx.part(WeightsP).active {
        return;
    }
    let interval = ctx.part(OptionsP).weightint as u64;

    let (weights, mut ctx) = ctx.split_part_mut(WeightsP);
    let (crit, mut ctx) = ctx.split_part_mut(CritP);
    let (stats, ctx) = ctx.split_part_mut(StatsP);
    let flips = stats.flips;

    for &cidx in ctx.part(TmpDataP).made.iter() {
        let cidx = cidx as usize;
        let weight = weights.weights[cidx];
        if weight > 1 && flips - weights.since[cidx] < interval {
            weights.weights[cidx] = weight - 1;
            crit.reweight(cidx, weights.effective(weight), weights.effective(weight - 1));
            stats.weights.decayed += 1;
            stats.mems.add_weight(1);
        }
    }

    if flips % interval == 0 {
        let max = weights.max;
        let since = &weights.since;
        let table = &mut weights.weights;
        let mut bumped = 0;
        ctx.part(UnsatP).for_each(|cidx| {
            if flips - since[cidx] >= interval && table[cidx] < max {
                // Unsatisfied clauses have no critical literal, so break values are unaffected.
                table[cidx] += 1;
                bumped += 1;
            }
        });
        stats.weights.bumped += bumped;
        stats.mems.add_weight(bumped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::crit;
    use crate::restart::reinit;
    use crate::test::loaded_context;

    /// The single unsatisfied and the single satisfied clause of `x & !x`.
    fn split_clauses(ctx: partial!(Context, UnsatP)) -> (usize, usize) {
        let mut unsat = vec![];
        ctx.part(UnsatP).for_each(|cidx| unsat.push(cidx));
        assert_eq!(unsat.len(), 1);
        (unsat[0], 1 - unsat[0])
    }

    #[test]
    fn configure_caps_weights() {
        let mut mem = Mem::default();
        let mut weights = Weights::default();
        weights.init(&mut mem, 3).unwrap();
        assert_eq!(weights.weight(0), 1);

        weights.configure(true, false, 5);
        weights.weights[1] = 5;
        assert_eq!(weights.weight(1), 5);

        weights.configure(true, false, 3);
        assert_eq!(weights.weight(1), 3);

        weights.configure(false, false, 3);
        assert_eq!(weights.weight(1), 1);

        weights.configure(true, false, 1);
        assert!(!weights.active());

        weights.reset();
        weights.configure(true, false, 7);
        assert_eq!(weights.weight(1), 1);
    }

    #[test]
    fn anti_weights_are_mirrored() {
        let mut mem = Mem::default();
        let mut weights = Weights::default();
        weights.init(&mut mem, 2).unwrap();

        weights.configure(true, true, 5);
        weights.weights[1] = 5;
        assert_eq!(weights.weight(0), 5);
        assert_eq!(weights.weight(1), 1);

        weights.configure(false, true, 5);
        assert_eq!(weights.weight(0), 1);
    }

    #[test]
    fn bumps_are_gated_and_saturate() {
        let formula = vec![vec![1], vec![-1]];
        let mut ctx = loaded_context(&formula, &[("prep", 0), ("weight", 3), ("weightint", 100)]);
        let mut ctx = ctx.into_partial_ref_mut();
        assert!(ctx.part(WeightsP).active());

        let (unsat, _) = split_clauses(ctx.borrow());
        ctx.part_mut(TmpDataP).made.clear();
        ctx.part_mut(WeightsP).since[unsat] = 0;

        for &(flips, expected) in [(50, 1), (100, 2), (150, 2), (200, 3), (300, 3)].iter() {
            ctx.part_mut(StatsP).flips = flips;
            adapt_weights(ctx.borrow());
            assert_eq!(ctx.part(WeightsP).weight(unsat), expected, "after {} flips", flips);
        }
        assert_eq!(ctx.part(StatsP).weights.bumped, 2);
    }

    #[test]
    fn recently_broken_clauses_decay_to_one() {
        let formula = vec![vec![1], vec![-1]];
        let mut ctx = loaded_context(&formula, &[("prep", 0), ("weight", 3), ("weightint", 100)]);
        let mut ctx = ctx.into_partial_ref_mut();

        let (_, sat) = split_clauses(ctx.borrow());
        ctx.part_mut(StatsP).flips = 10;
        ctx.part_mut(TmpDataP).made = vec![sat as u32];

        ctx.part_mut(WeightsP).weights[sat] = 3;
        reinit(ctx.borrow()).unwrap();
        ctx.part_mut(WeightsP).since[sat] = 5;

        adapt_weights(ctx.borrow());
        assert_eq!(ctx.part(WeightsP).weight(sat), 2);
        crit::verify(ctx.borrow());

        adapt_weights(ctx.borrow());
        adapt_weights(ctx.borrow());
        assert_eq!(ctx.part(WeightsP).weight(sat), 1);
        assert_eq!(ctx.part(StatsP).weights.decayed, 2);
        crit::verify(ctx.borrow());

        ctx.part_mut(WeightsP).weights[sat] = 3;
        reinit(ctx.borrow()).unwrap();
        ctx.part_mut(WeightsP).since[sat] = 0;
        ctx.part_mut(StatsP).flips = 150;
        adapt_weights(ctx.borrow());
        assert_eq!(ctx.part(WeightsP).weight(sat), 3);
    }
}
