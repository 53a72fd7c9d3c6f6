//! Loading a formula into the engine.
use partial_ref::{partial, PartialRef};

use crate::context::{ClauseDbP, Context, MemP, SolverStateP, StatsP, TmpDataP};
use crate::lit::{Lit, Var};
use crate::solver::SolverError;

/// Adds a literal of the zero terminated input stream.
///
/// A `0` terminates the current clause. Duplicated literals are removed and tautological clauses
/// (eg. x v -x v y) are ignored. An empty clause is rejected.
pub fn add_literal(
    mut ctx: partial!(Context, mut ClauseDbP, mut MemP, mut SolverStateP, mut StatsP, mut TmpDataP),
    number: i32,
) -> Result<(), SolverError> {
    if ctx.part(SolverStateP).formula_frozen {
        return Err(SolverError::FormulaFrozen);
    }

    if number != 0 {
        if (number as i64).abs() as u64 > Var::max_count() as u64 {
            return Err(SolverError::VarIndexOverflow { lit: number });
        }
        ctx.part_mut(TmpDataP).clause.push(Lit::from_dimacs(number));
        ctx.part_mut(SolverStateP).clause_open = true;
        return Ok(());
    }

    ctx.part_mut(SolverStateP).clause_open = false;

    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);
    let lits = &mut tmp.clause;

    lits.sort_unstable();
    let len = lits.len();
    lits.dedup();
    ctx.part_mut(StatsP).duplicates += (len - lits.len()) as u64;

    let state = ctx.part_mut(SolverStateP);
    for &lit in lits.iter() {
        state.var_count = state.var_count.max(lit.index() + 1);
    }

    // Sorting places the two literals of a variable next to each other.
    if lits.windows(2).any(|pair| pair[0] == !pair[1]) {
        ctx.part_mut(StatsP).tautologies += 1;
        lits.clear();
        return Ok(());
    }

    if lits.is_empty() {
        return Err(SolverError::EmptyClause);
    }

    let (clause_db, mut ctx) = ctx.split_part_mut(ClauseDbP);
    clause_db.add_clause(ctx.part_mut(MemP), lits)?;
    lits.clear();

    Ok(())
}
