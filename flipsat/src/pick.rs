//! Clause and literal picking.
use partial_ref::{partial, PartialRef};

use crate::config::ClausePicking;
use crate::context::{
    AssignmentP, ClauseDbP, Context, CritP, ExpP, OccsP, OffloadP, OptionsP, RngP, SolverStateP,
    StatsP, StrategyP, TmpDataP, UnsatP, WeightsP,
};
use crate::crit::Crit;
use crate::lit::Lit;
use crate::occs::Occs;
use crate::unsat::{Unsat, UnsatTracker};
use crate::weight::Weights;

/// Pick an unsatisfied clause using the clause picking policy of the current solve call.
///
/// Returns `None` when all clauses are satisfied.
pub fn pick_clause(
    mut ctx: partial!(
        Context,
        mut OffloadP,
        mut RngP,
        mut StatsP,
        OptionsP,
        SolverStateP,
        UnsatP,
    ),
) -> Option<usize> {
    if ctx.part(UnsatP).is_empty() {
        return None;
    }

    if let Some(device) = ctx.part_mut(OffloadP) {
        if let Some(cidx) = device.pick_clause() {
            debug_assert!(ctx.part(UnsatP).contains(cidx));
            return Some(cidx);
        }
    }

    let (rng, mut ctx) = ctx.split_part_mut(RngP);
    let (stats, ctx) = ctx.split_part_mut(StatsP);
    let options = ctx.part(OptionsP);
    let policy = ctx.part(SolverStateP).picking;

    match ctx.part(UnsatP) {
        Unsat::Queue(queue) => match policy {
            ClausePicking::Dfs => queue.tail(),
            ClausePicking::RelaxedBfs => {
                if rng.pick(options.rbfsrate as usize) == 0 {
                    queue.nth(rng.pick(queue.len()))
                } else {
                    queue.head()
                }
            }
            ClausePicking::UnfairBfs => {
                if rng.percent(options.unfairfreq) {
                    queue.head()
                } else {
                    stats.queue.unfair += 1;
                    let geomfreq = options.geomfreq;
                    queue.walk(|| rng.percent(geomfreq))
                }
            }
            _ => queue.head(),
        },
        Unsat::Stack(stack) => {
            let len = stack.len();
            let pos = match policy {
                ClausePicking::PseudoBfs => (stats.flips % len as u64) as usize,
                _ => rng.pick(len),
            };
            Some(stack.get(pos))
        }
    }
}

/// Break value of the variable of a false literal, weighted when weighting is active.
#[inline]
fn break_value(crit: &Crit, occs: &Occs, weights: &Weights, lit: Lit) -> u64 {
    if crit.enabled() {
        if weights.active() {
            crit.weighted_breaks(lit.var())
        } else {
            crit.breaks(lit.var()) as u64
        }
    } else {
        occs.occs(!lit)
            .iter()
            .map(|&cidx| cidx as usize)
            .filter(|&cidx| crit.satcnt.get(cidx) == 1)
            .map(|cidx| weights.weight(cidx))
            .sum()
    }
}

/// Pick the literal of an unsatisfied clause to flip.
pub fn pick_literal(
    mut ctx: partial!(
        Context,
        mut OffloadP,
        mut RngP,
        mut StatsP,
        mut TmpDataP,
        AssignmentP,
        ClauseDbP,
        CritP,
        ExpP,
        OccsP,
        OptionsP,
        StrategyP,
        WeightsP,
    ),
    cidx: usize,
) -> Lit {
    if let Some(device) = ctx.part_mut(OffloadP) {
        if let Some(lit) = device.pick_literal(cidx) {
            debug_assert!(ctx.part(ClauseDbP).lits(cidx).contains(&lit));
            return lit;
        }
    }

    let (rng, mut ctx) = ctx.split_part_mut(RngP);
    let (stats, mut ctx) = ctx.split_part_mut(StatsP);
    let (tmp, ctx) = ctx.split_part_mut(TmpDataP);
    let lits = ctx.part(ClauseDbP).lits(cidx);
    let strategy = ctx.part(StrategyP);

    debug_assert!(lits
        .iter()
        .all(|&lit| !ctx.part(AssignmentP).lit_is_true(lit)));

    stats.mems.add_read(1);
    stats.mems.add_lits(lits.len() as u64);

    if lits.len() == 1 {
        return lits[0];
    }

    if strategy.walk && rng.percent(ctx.part(OptionsP).walkprobability) {
        stats.walks += 1;
        return lits[rng.pick(lits.len())];
    }

    let crit = ctx.part(CritP);
    let occs = ctx.part(OccsP);
    let weights = ctx.part(WeightsP);

    if strategy.eager {
        let mut min = u64::max_value();
        tmp.cands.clear();
        for &lit in lits {
            let value = break_value(crit, occs, weights, lit);
            if value < min {
                min = value;
                tmp.cands.clear();
            }
            if value == min {
                tmp.cands.push(lit);
            }
        }

        if strategy.pol != 0 && tmp.cands.len() > 1 {
            let positive = strategy.pol > 0;
            if tmp.cands.iter().any(|lit| lit.is_positive() == positive) {
                tmp.cands.retain(|lit| lit.is_positive() == positive);
            }
        }

        stats.eager_flips += 1;
        return tmp.cands[rng.pick(tmp.cands.len())];
    }

    let exp = ctx.part(ExpP);
    tmp.scores.clear();
    let mut sum = 0.0;
    for &lit in lits {
        let score = exp.score(break_value(crit, occs, weights, lit));
        sum += score;
        tmp.scores.push(score);
    }

    let mut threshold = rng.fraction() * sum;
    for (&lit, &score) in lits.iter().zip(tmp.scores.iter()) {
        if threshold < score {
            return lit;
        }
        threshold -= score;
    }
    // Rounding can leave a tiny remainder.
    lits[lits.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::config::OptionTable;
    use crate::context::{ClauseDbP, UnsatP};
    use crate::test::loaded_context;

    #[test]
    fn eager_picks_minimum_break() {
        // With every variable false only clause 0 is unsatisfied. `-1` is critical in clauses 1
        // and 2, so flipping 1 breaks two clauses while flipping 3 breaks none.
        let formula = vec![vec![1, 3], vec![-1, 4], vec![-1, 5], vec![-3, -5, 4]];
        let mut ctx = loaded_context(
            &formula,
            &[("prep", 0), ("eager", 1), ("pol", -1), ("uni", 1), ("restart", 0)],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        let members = ctx.part(UnsatP).members();
        assert_eq!(members, vec![0]);
        for _ in 0..20 {
            assert_eq!(pick_literal(ctx.borrow(), 0), Lit::from_dimacs(3));
        }
        assert_eq!(ctx.part(StatsP).eager_flips, 20);
    }

    #[test]
    fn probabilistic_prefers_low_break() {
        let formula = vec![vec![1, 3], vec![-1, 4], vec![-1, 5], vec![-1, 6], vec![-3, -5, 4]];
        let mut ctx = loaded_context(&formula, &[("prep", 0), ("pol", -1), ("uni", 1)]);
        let mut ctx = ctx.into_partial_ref_mut();

        let mut picked_3 = 0;
        for _ in 0..1000 {
            if pick_literal(ctx.borrow(), 0) == Lit::from_dimacs(3) {
                picked_3 += 1;
            }
        }
        // Scores are 1 for 3 and 1/8 for 1.
        assert!(picked_3 > 800, "picked 3 {} times", picked_3);
        assert!(picked_3 < 1000);
    }

    #[test]
    fn unit_clause_literal() {
        let formula = vec![vec![1], vec![-1]];
        let mut ctx = loaded_context(&formula, &[("prep", 0), ("pol", -1)]);
        let mut ctx = ctx.into_partial_ref_mut();
        assert_eq!(ctx.part(ClauseDbP).len(), 2);
        assert_eq!(pick_clause(ctx.borrow()), Some(0));
        assert_eq!(pick_literal(ctx.borrow(), 0), Lit::from_dimacs(1));
    }

    #[test]
    fn queue_policies() {
        let formula = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
        for &(pick, expected) in [(1, 0), (2, 2)].iter() {
            let mut ctx = loaded_context(&formula, &[("pick", pick), ("pol", -1)]);
            let mut ctx = ctx.into_partial_ref_mut();
            assert_eq!(ctx.part(OptionsP).get("pick"), Ok(pick));
            for _ in 0..5 {
                assert_eq!(pick_clause(ctx.borrow()), Some(expected));
            }
        }
    }

    #[test]
    fn stack_policies() {
        let formula = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
        let mut ctx = loaded_context(&formula, &[("pick", 0), ("pol", -1)]);
        let mut ctx = ctx.into_partial_ref_mut();
        let mut seen = [false; 3];
        for _ in 0..100 {
            let cidx = pick_clause(ctx.borrow()).unwrap();
            seen[cidx] = true;
        }
        assert!(seen.iter().all(|&hit| hit));

        let mut ctx = loaded_context(&formula, &[("pick", -1), ("pol", -1)]);
        let mut ctx = ctx.into_partial_ref_mut();
        let first = pick_clause(ctx.borrow());
        assert_eq!(pick_clause(ctx.borrow()), first);
        ctx.part_mut(StatsP).flips += 1;
        assert_ne!(pick_clause(ctx.borrow()), first);
    }

    #[test]
    fn relaxed_bfs() {
        let formula = vec![vec![1, 2], vec![3, 4], vec![5, 6]];

        let mut ctx = loaded_context(&formula, &[("pick", 3), ("rbfsrate", 1), ("pol", -1)]);
        let mut ctx = ctx.into_partial_ref_mut();
        let mut seen = [false; 3];
        for _ in 0..100 {
            seen[pick_clause(ctx.borrow()).unwrap()] = true;
        }
        assert!(seen.iter().all(|&hit| hit));

        let mut ctx = loaded_context(
            &formula,
            &[("pick", 3), ("rbfsrate", i32::max_value()), ("pol", -1)],
        );
        let mut ctx = ctx.into_partial_ref_mut();
        for _ in 0..100 {
            assert_eq!(pick_clause(ctx.borrow()), Some(0));
        }
    }

    #[test]
    fn walks_ignore_break_values() {
        let formula = vec![vec![1, 3], vec![-1, 4], vec![-1, 5], vec![-3, -5, 4]];
        let mut ctx = loaded_context(
            &formula,
            &[
                ("prep", 0),
                ("eager", 1),
                ("pol", -1),
                ("uni", 1),
                ("walk", 1),
                ("walkprobability", 100),
            ],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        let mut picked_1 = 0;
        for _ in 0..200 {
            if pick_literal(ctx.borrow(), 0) == Lit::from_dimacs(1) {
                picked_1 += 1;
            }
        }
        assert!(picked_1 > 50 && picked_1 < 150, "picked 1 {} times", picked_1);
        assert_eq!(ctx.part(StatsP).walks, 200);
        assert_eq!(ctx.part(StatsP).eager_flips, 0);
    }

    #[test]
    fn explicit_cb_table() {
        let formula = vec![vec![1, 3], vec![-1, 4], vec![-1, 5], vec![-1, 6], vec![-3, -5, 4]];
        let mut ctx = loaded_context(
            &formula,
            &[("prep", 0), ("pol", -1), ("uni", 1), ("cb", 1000), ("correct", 1)],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        let exp = ctx.part(ExpP);
        assert!((exp.base() - 10.0).abs() < 1e-9);
        assert!((exp.score(2) - 0.01).abs() < 1e-9);

        let mut picked_3 = 0;
        for _ in 0..1000 {
            if pick_literal(ctx.borrow(), 0) == Lit::from_dimacs(3) {
                picked_3 += 1;
            }
        }
        // Scores are 1 for 3 and 1/1000 for 1.
        assert!(picked_3 > 990, "picked 3 {} times", picked_3);

        let mut ctx = loaded_context(&formula, &[("prep", 0), ("cb", 100)]);
        let ctx = ctx.into_partial_ref_mut();
        assert!((ctx.part(ExpP).base() - 2.0).abs() < 1e-9);
    }
}
