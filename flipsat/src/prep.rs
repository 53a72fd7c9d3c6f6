//! Preprocessing by unit propagation.
use partial_ref::{partial, PartialRef};

use log::info;

use crate::clause::ClauseDb;
use crate::context::{
    AssignmentP, ClauseDbP, Context, MemP, OccsP, SolverStateP, StatsP, TmpDataP,
};
use crate::lit::Lit;
use crate::mem::MemError;

/// Value of a literal under the fixed values.
fn fixed_value(fixed: &[Option<bool>], lit: Lit) -> Option<bool> {
    fixed[lit.index()].map(|value| value == lit.is_positive())
}

/// Propagate unit clauses and simplify the formula accordingly.
///
/// Fixed values are stored in the assignment, so that every seed respects them. Satisfied
/// clauses are removed and false literals stripped from the remaining ones. A conflict marks the
/// formula as trivially unsatisfiable and leaves the clauses untouched.
///
/// Expects the assignment to be sized for the variable count. Leaves the occurrence lists empty.
pub fn preprocess(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut MemP,
        mut OccsP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
    ),
) -> Result<(), MemError> {
    let var_count = ctx.part(AssignmentP).var_count();

    {
        let (occs, mut ctx) = ctx.split_part_mut(OccsP);
        let (mem, ctx) = ctx.split_part_mut(MemP);
        occs.build(mem, ctx.part(ClauseDbP), var_count)?;
    }

    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);
    let fixed = &mut assignment.fixed;
    let units = &mut tmp.units;

    units.clear();
    units.extend(
        ctx.part(ClauseDbP)
            .iter()
            .filter(|lits| lits.len() == 1)
            .map(|lits| lits[0]),
    );

    let mut conflict = false;
    let mut fixed_count = 0;

    'propagate: while let Some(lit) = units.pop() {
        match fixed_value(fixed, lit) {
            Some(true) => continue,
            Some(false) => {
                conflict = true;
                break;
            }
            None => {
                fixed[lit.index()] = Some(lit.is_positive());
                fixed_count += 1;
            }
        }

        for &cidx in ctx.part(OccsP).occs(!lit) {
            let mut unassigned = None;
            let mut unassigned_count = 0;
            let mut satisfied = false;
            for &other in ctx.part(ClauseDbP).lits(cidx as usize) {
                match fixed_value(fixed, other) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => (),
                    None => {
                        unassigned = Some(other);
                        unassigned_count += 1;
                    }
                }
            }
            if satisfied {
                continue;
            }
            match (unassigned_count, unassigned) {
                (0, _) => {
                    conflict = true;
                    break 'propagate;
                }
                (1, Some(unit)) => units.push(unit),
                _ => (),
            }
        }
    }

    units.clear();

    let (occs, mut ctx) = ctx.split_part_mut(OccsP);
    let (mem, mut ctx) = ctx.split_part_mut(MemP);
    occs.clear(mem);

    if conflict {
        info!("unit propagation found a conflict");
        ctx.part_mut(SolverStateP).trivially_unsat = true;
        return Ok(());
    }

    ctx.part_mut(StatsP).fixed = fixed_count;

    if fixed_count == 0 {
        return Ok(());
    }

    let clause_db = ctx.part_mut(ClauseDbP);
    let mut simplified = ClauseDb::default();
    let mut removed = 0;
    for lits in clause_db.iter() {
        if lits
            .iter()
            .any(|&lit| fixed_value(fixed, lit) == Some(true))
        {
            removed += 1;
            continue;
        }
        tmp.clause.clear();
        tmp.clause.extend(
            lits.iter()
                .cloned()
                .filter(|&lit| fixed_value(fixed, lit).is_none()),
        );
        simplified.add_clause(mem, &tmp.clause)?;
    }
    tmp.clause.clear();
    clause_db.clear(mem);
    *clause_db = simplified;

    info!(
        "unit propagation fixed {} variables and removed {} clauses",
        fixed_count, removed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::test::loaded_context;

    #[test]
    fn propagates_chains() {
        let formula = vec![
            vec![1],
            vec![-1, 2],
            vec![-2, 3, 4],
            vec![-2, -3],
            vec![-4, 5, 6],
            vec![-6, 1, 3],
        ];
        let mut ctx = loaded_context(&formula, &[]);
        let ctx = ctx.into_partial_ref_mut();

        assert!(!ctx.part(SolverStateP).trivially_unsat);
        assert_eq!(ctx.part(StatsP).fixed, 4);

        let fixed = &ctx.part(AssignmentP).fixed;
        assert_eq!(fixed[0], Some(true));
        assert_eq!(fixed[1], Some(true));
        assert_eq!(fixed[2], Some(false));
        assert_eq!(fixed[3], Some(true));
        assert_eq!(fixed[4], None);

        // Only (5 v 6) survives, all other clauses are satisfied.
        let db = ctx.part(ClauseDbP);
        assert_eq!(db.len(), 1);
        assert_eq!(
            db.lits(0),
            &[Lit::from_dimacs(5), Lit::from_dimacs(6)][..]
        );
    }

    #[test]
    fn strips_false_literals() {
        let formula = vec![vec![-1], vec![1, 2, 3], vec![1, -2, 3]];
        let mut ctx = loaded_context(&formula, &[]);
        let ctx = ctx.into_partial_ref_mut();

        let db = ctx.part(ClauseDbP);
        assert_eq!(db.len(), 2);
        assert_eq!(db.lits(0), &[Lit::from_dimacs(2), Lit::from_dimacs(3)][..]);
        assert_eq!(db.lits(1), &[Lit::from_dimacs(-2), Lit::from_dimacs(3)][..]);
        assert!(!ctx.part(AssignmentP).vals.get(0));
    }

    #[test]
    fn detects_conflicts() {
        for formula in [
            vec![vec![1], vec![-1]],
            vec![vec![1], vec![-1, 2], vec![-2, -1]],
            vec![vec![1, 2], vec![-1], vec![-2]],
        ]
        .iter()
        {
            let mut ctx = loaded_context(formula, &[]);
            let ctx = ctx.into_partial_ref_mut();
            assert!(ctx.part(SolverStateP).trivially_unsat);
        }
    }
}
