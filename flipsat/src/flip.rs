//! Flipping a variable.
use partial_ref::{partial, PartialRef};

use log::trace;

use crate::context::{
    AssignmentP, Context, CritP, MemP, OccsP, OffloadP, StatsP, TmpDataP, UnsatP, WeightsP,
};
use crate::lit::Var;
use crate::mem::MemError;
use crate::unsat::UnsatTracker;

/// Flip a variable and update all dependent state.
///
/// Clauses containing the literal that became true gain a true literal, those containing the
/// literal that became false lose one. Satisfied counts, critical literals, break values and the
/// unsatisfied set are updated for exactly these clauses. Clauses made satisfied are recorded in
/// [`TmpData::made`](crate::tmp::TmpData::made).
///
/// Flipping the same variable twice restores all of this state.
pub fn flip(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut CritP,
        mut MemP,
        mut OffloadP,
        mut StatsP,
        mut TmpDataP,
        mut UnsatP,
        mut WeightsP,
        OccsP,
    ),
    var: Var,
) -> Result<(), MemError> {
    let assignment = ctx.part_mut(AssignmentP);
    assignment.vals.toggle(var.index());
    let lit = var.lit(assignment.var_value(var));

    trace!("flip {:?}", lit);

    let (occs, mut ctx) = ctx.split_part(OccsP);
    let (crit, mut ctx) = ctx.split_part_mut(CritP);
    let (mem, mut ctx) = ctx.split_part_mut(MemP);
    let (unsat, mut ctx) = ctx.split_part_mut(UnsatP);
    let (weights, mut ctx) = ctx.split_part_mut(WeightsP);
    let (stats, mut ctx) = ctx.split_part_mut(StatsP);
    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);

    stats.flips += 1;
    stats.var_flips[var.index()] += 1;
    let flips = stats.flips;

    tmp.made.clear();

    let made = occs.occs(lit);
    for &cidx in made {
        let cidx = cidx as usize;
        let old_count = crit.satcnt.inc(cidx);
        crit.make(cidx, lit, old_count, weights.weight(cidx));
        if old_count == 0 {
            unsat.remove(mem, cidx)?;
            tmp.made.push(cidx as u32);
        }
    }

    let broken = occs.occs(!lit);
    let mut broken_count = 0;
    for &cidx in broken {
        let cidx = cidx as usize;
        let new_count = crit.satcnt.dec(cidx);
        crit.brk(cidx, !lit, new_count, weights.weight(cidx));
        if new_count == 0 {
            unsat.insert(mem, cidx)?;
            weights.mark_unsat(cidx, flips);
            broken_count += 1;
        }
    }

    let visited = (made.len() + broken.len()) as u64;
    stats.mems.add_occs(visited);
    stats.mems.add_update(visited);
    if crit.enabled() {
        stats.mems.add_crit(visited);
    }
    stats.made += tmp.made.len() as u64;
    stats.broken += broken_count;

    if let Some(device) = ctx.part_mut(OffloadP) {
        device.flip(lit);
        device.make_clauses_after_flip(lit);
        device.break_clauses_after_flip(lit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;
    use proptest::prelude::*;

    use crate::context::{AssignmentP, ClauseDbP, CritP, UnsatP, WeightsP};
    use crate::crit::verify;
    use crate::test::{loaded_context, sat_formula};

    /// Snapshot of the incrementally maintained state.
    fn snapshot(
        ctx: partial!(Context, AssignmentP, CritP, UnsatP, WeightsP),
        clause_count: usize,
    ) -> (Vec<u32>, Vec<Option<crate::lit::Lit>>, Vec<(u32, u64)>, Vec<usize>) {
        let crit = ctx.part(CritP);
        let var_count = ctx.part(AssignmentP).var_count();
        let counts = (0..clause_count).map(|cidx| crit.satcnt.get(cidx)).collect();
        let criticals = (0..clause_count).map(|cidx| crit.critical(cidx)).collect();
        let breaks = (0..var_count)
            .map(|index| {
                let var = Var::from_index(index);
                (crit.breaks(var), crit.weighted_breaks(var))
            })
            .collect();
        let mut members = ctx.part(UnsatP).members();
        members.sort_unstable();
        (counts, criticals, breaks, members)
    }

    proptest! {
        #[test]
        fn flip_twice_restores_state(
            formula in sat_formula(4..30usize, 10..100usize, 0.05..0.2, 0.9..1.0),
            flips in proptest::collection::vec(any::<prop::sample::Index>(), 1..50),
        ) {
            let mut ctx = loaded_context(&formula, &[("prep", 0), ("uni", 0)]);
            let mut ctx = ctx.into_partial_ref_mut();
            let var_count = ctx.part(AssignmentP).var_count();
            let clause_count = ctx.part(ClauseDbP).len();

            for index in flips {
                let var = Var::from_index(index.index(var_count));
                let before = snapshot(ctx.borrow(), clause_count);
                let vals = ctx.part(AssignmentP).vals.clone();

                flip(ctx.borrow(), var).unwrap();
                verify(ctx.borrow());
                flip(ctx.borrow(), var).unwrap();
                verify(ctx.borrow());

                prop_assert_eq!(&ctx.part(AssignmentP).vals, &vals);
                prop_assert_eq!(snapshot(ctx.borrow(), clause_count), before);

                flip(ctx.borrow(), var).unwrap();
            }
        }

        #[test]
        fn no_drift(
            formula in sat_formula(4..40usize, 10..150usize, 0.05..0.2, 0.9..1.0),
            flips in proptest::collection::vec(any::<prop::sample::Index>(), 1..400),
        ) {
            let mut ctx = loaded_context(&formula, &[("prep", 0)]);
            let mut ctx = ctx.into_partial_ref_mut();
            let var_count = ctx.part(AssignmentP).var_count();

            for index in flips {
                flip(ctx.borrow(), Var::from_index(index.index(var_count))).unwrap();
            }
            verify(ctx.borrow());
        }

        #[test]
        fn no_drift_without_critical_literals(
            formula in sat_formula(4..40usize, 10..150usize, 0.05..0.2, 0.9..1.0),
            flips in proptest::collection::vec(any::<prop::sample::Index>(), 1..400),
        ) {
            let mut ctx = loaded_context(&formula, &[("prep", 0), ("crit", 0), ("pick", 1)]);
            let mut ctx = ctx.into_partial_ref_mut();
            let var_count = ctx.part(AssignmentP).var_count();

            for index in flips {
                flip(ctx.borrow(), Var::from_index(index.index(var_count))).unwrap();
            }
            verify(ctx.borrow());
        }
    }
}
