//! The expression transformer.
//!
//! Walks an expression post-order, right to left, inserting `dup` and
//! `drop` at the four places ownership changes: variable occurrences,
//! lambda construction, let scopes, and match branches. The contract
//! for every case: return the rewritten expression and leave the live
//! set describing "names still needed to evaluate this expression",
//! relative to the state on entry.
//!
//! # The variable rule
//!
//! A reference-counted occurrence of `x` is wrapped in `dup` when some
//! later use needs it (`x` already live) or when this scope merely
//! borrows it (`x` not owned). Otherwise it is the last use of an
//! owned name and ownership moves into the consumer — no traffic.
//!
//! # Branches
//!
//! Each branch is analyzed in isolation against the liveness at the
//! case, then finished once the merged live set of all branches is
//! known: names the case as a whole keeps alive but this branch does
//! not consume are dropped on this branch's path. The pending results
//! hold plain data (transformed guards, entry dups, the guard's live
//! set) — they cannot observe analysis state after the fact.

use smallvec::SmallVec;

use vela_ir::{
    free_locals, make_let, maybe_stats, Branch, DefGroup, Expr, Guard, Pattern, TName,
};

use crate::driver::parc_def;
use crate::normalize::{is_normalized, normalize_case};
use crate::prim::{gen_drop, gen_dup};
use crate::state::{ordered, Parc, ParcResult, TNameSet};

/// Transform one expression.
pub fn parc_expr(ctx: &mut Parc<'_>, expr: Expr) -> ParcResult<Expr> {
    match expr {
        // Type abstraction and application are transparent.
        Expr::TypeLam(vars, body) => Ok(Expr::TypeLam(vars, Box::new(parc_expr(ctx, *body)?))),
        Expr::TypeApp(body, targs) => {
            Ok(Expr::TypeApp(Box::new(parc_expr(ctx, *body)?), targs))
        }

        Expr::Lam(params, body) => parc_lam(ctx, params, *body),

        Expr::Var { name, info } => {
            if !info.is_none() {
                // Arity-only and external references are code, not
                // heap values.
                return Ok(Expr::Var { name, info });
            }
            match use_tname(ctx, &name)? {
                // `dup(x)` evaluates to `x`, so it replaces the
                // occurrence outright.
                Some(dup) => Ok(dup),
                None => Ok(Expr::Var { name, info }),
            }
        }

        Expr::App(fun, args) => {
            // Arguments right to left: the last argument is analyzed
            // first and becomes "downstream" for the earlier ones.
            let mut rev: Vec<Expr> = Vec::with_capacity(args.len());
            for arg in args.into_iter().rev() {
                rev.push(parc_expr(ctx, arg)?);
            }
            rev.reverse();
            let fun = parc_expr(ctx, *fun)?;
            Ok(Expr::App(Box::new(fun), rev))
        }

        e @ (Expr::Lit(_) | Expr::Con { .. }) => Ok(e),

        Expr::Let(groups, body) => parc_let(ctx, groups.into_iter(), *body),

        Expr::Case {
            scrutinees,
            branches,
        } => parc_case(ctx, scrutinees, branches),
    }
}

/// The variable rule. Marks the occurrence live and returns the `dup`
/// wrapper when one is required. Qualified names are globally
/// allocated: never marked, never duplicated.
fn use_tname(ctx: &mut Parc<'_>, name: &TName) -> ParcResult<Option<Expr>> {
    if name.name.is_qualified() {
        return Ok(None);
    }
    let was_live = ctx.is_live(name);
    let owned = ctx.is_owned(name);
    ctx.mark_live(name);
    if was_live || !owned {
        gen_dup(ctx, name)
    } else {
        // Last use of an owned name: ownership moves.
        Ok(None)
    }
}

/// Value lambda: the body owns the captured free variables and the
/// parameters; dead parameters are dropped at entry, and each capture
/// goes through the variable rule in the outer scope (constructing
/// the closure is a use of every capture).
fn parc_lam(ctx: &mut Parc<'_>, params: Vec<TName>, body: Expr) -> ParcResult<Expr> {
    let mut caps = free_locals(&body);
    for p in &params {
        caps.remove(p);
    }
    let param_set: TNameSet = params.iter().cloned().collect();

    let (body_result, live_inner) = ctx.isolate_with(TNameSet::default(), |ctx| {
        ctx.with_owned(caps.clone(), |ctx| {
            ctx.scoped(&param_set, |ctx| -> ParcResult<Expr> {
                let body = parc_expr(ctx, body)?;
                let mut drops: SmallVec<[Expr; 4]> = SmallVec::new();
                for p in &params {
                    if ctx.is_dead(p) {
                        if let Some(d) = gen_drop(ctx, p)? {
                            drops.push(d);
                        }
                    }
                }
                Ok(maybe_stats(drops.into_vec(), body))
            })
        })
    });
    let body = body_result?;

    // The free-variable computation and the liveness analysis must
    // agree on what the body needs.
    if live_inner != caps {
        return Err(ctx.capture_mismatch(&caps, &live_inner));
    }

    let mut dups: SmallVec<[Expr; 4]> = SmallVec::new();
    for cap in ordered(&caps) {
        if let Some(d) = use_tname(ctx, cap)? {
            dups.push(d);
        }
    }
    Ok(maybe_stats(
        dups.into_vec(),
        Expr::Lam(params, Box::new(body)),
    ))
}

/// Let: analyze the body first under the binding's scope (so uses flow
/// back to the definition), drop bindings with no downstream use, then
/// transform the definition itself.
fn parc_let(
    ctx: &mut Parc<'_>,
    mut groups: std::vec::IntoIter<DefGroup>,
    body: Expr,
) -> ParcResult<Expr> {
    let Some(group) = groups.next() else {
        return parc_expr(ctx, body);
    };
    match group {
        DefGroup::NonRec(def) => {
            let bound: TNameSet = std::iter::once(def.tname()).collect();
            let rest = owned_in_scope(ctx, &bound, |ctx| parc_let(ctx, groups, body))?;
            let def = parc_def(ctx, false, def)?;
            Ok(make_let(vec![DefGroup::NonRec(def)], rest))
        }
        DefGroup::Rec(_) => Err(ctx.recursive_let()),
    }
}

/// Run `f` with `vars` owned and in scope; names in `vars` with no
/// downstream use after `f` are dropped in front of its result.
fn owned_in_scope<'a>(
    ctx: &mut Parc<'a>,
    vars: &TNameSet,
    f: impl FnOnce(&mut Parc<'a>) -> ParcResult<Expr>,
) -> ParcResult<Expr> {
    let result = ctx.extend_owned(vars, |ctx| {
        let expr = f(ctx)?;
        let mut drops: SmallVec<[Expr; 4]> = SmallVec::new();
        for v in ordered(vars) {
            if ctx.is_dead(v) {
                if let Some(d) = gen_drop(ctx, v)? {
                    drops.push(d);
                }
            }
        }
        Ok(maybe_stats(drops.into_vec(), expr))
    });
    ctx.forget(vars);
    result
}

// ── Case analysis ───────────────────────────────────────────────

/// A transformed guard waiting for the case's merged live set.
///
/// Holds only values: the finished test and body, the entry dups, and
/// the live set its body produced. Deliberately no reference into the
/// analysis state.
struct PendingGuard {
    test: Expr,
    body: Expr,
    dups: Vec<Expr>,
    live: TNameSet,
}

impl PendingGuard {
    fn finish(self, ctx: &Parc<'_>, match_live: &TNameSet) -> ParcResult<Guard> {
        // Names the case keeps alive that this guard's body does not
        // consume must be released on this path. Downstream needs are
        // seeded into `self.live`, so they are never dropped here.
        let mut dead: Vec<&TName> = match_live.difference(&self.live).collect();
        dead.sort();

        let mut stmts = self.dups;
        for name in dead {
            if let Some(d) = gen_drop(ctx, name)? {
                stmts.push(d);
            }
        }
        Ok(Guard {
            test: self.test,
            body: maybe_stats(stmts, self.body),
        })
    }
}

/// A transformed branch waiting for the case's merged live set.
struct PendingBranch {
    patterns: Vec<Pattern>,
    guards: Vec<PendingGuard>,
}

impl PendingBranch {
    fn finish(self, ctx: &Parc<'_>, match_live: &TNameSet) -> ParcResult<Branch> {
        let guards = self
            .guards
            .into_iter()
            .map(|g| g.finish(ctx, match_live))
            .collect::<ParcResult<Vec<Guard>>>()?;
        Ok(Branch {
            patterns: self.patterns,
            guards,
        })
    }
}

/// Case: normalize if needed, analyze every branch against the
/// entry liveness, mark the scrutinees live (they survive past all
/// branches), then finish each branch against the merged live set.
fn parc_case(
    ctx: &mut Parc<'_>,
    scrutinees: Vec<Expr>,
    branches: Vec<Branch>,
) -> ParcResult<Expr> {
    if !is_normalized(&scrutinees, &branches) {
        let rewritten = normalize_case(ctx, scrutinees, branches);
        return parc_expr(ctx, rewritten);
    }

    let scrut_names: Vec<TName> = scrutinees
        .iter()
        .filter_map(|e| match e {
            Expr::Var { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    debug_assert_eq!(scrut_names.len(), scrutinees.len());

    let live_in = ctx.live_snapshot();

    let mut pending: Vec<PendingBranch> = Vec::with_capacity(branches.len());
    for branch in branches.into_iter().rev() {
        pending.push(parc_branch(ctx, &live_in, branch)?);
    }
    pending.reverse();

    for name in &scrut_names {
        ctx.mark_live(name);
    }
    let match_live = ctx.live_snapshot();

    let branches = pending
        .into_iter()
        .map(|b| b.finish(ctx, &match_live))
        .collect::<ParcResult<Vec<Branch>>>()?;

    Ok(Expr::Case {
        scrutinees,
        branches,
    })
}

/// Analyze one branch: pattern binders are owned within the guards and
/// forgotten once the branch is done.
fn parc_branch(
    ctx: &mut Parc<'_>,
    live_in: &TNameSet,
    branch: Branch,
) -> ParcResult<PendingBranch> {
    let pvs = branch.bound_vars();
    let mut guards: Vec<PendingGuard> = Vec::with_capacity(branch.guards.len());
    for guard in branch.guards.into_iter().rev() {
        guards.push(parc_guard(ctx, live_in, &pvs, guard)?);
    }
    guards.reverse();
    ctx.forget(&pvs);
    Ok(PendingBranch {
        patterns: branch.patterns,
        guards,
    })
}

/// Analyze one guard under the branch's pattern binders.
fn parc_guard(
    ctx: &mut Parc<'_>,
    live_in: &TNameSet,
    pvs: &TNameSet,
    guard: Guard,
) -> ParcResult<PendingGuard> {
    ctx.extend_owned(pvs, |ctx| {
        let (body_result, live_body) =
            ctx.isolate_with(live_in.clone(), |ctx| parc_expr(ctx, guard.body));
        let body = body_result?;

        // A pattern variable the body consumed must be materialized
        // with a dup at guard entry: the matched cell still holds its
        // own reference to the field until the scrutinee is dropped.
        let mut dups: SmallVec<[Expr; 4]> = SmallVec::new();
        for pv in ordered(pvs) {
            if live_body.contains(pv) {
                if let Some(d) = gen_dup(ctx, pv)? {
                    dups.push(d);
                }
            }
        }

        // The outer analysis sees the union of all guard requirements.
        ctx.mark_lives(&live_body);

        // The test only borrows: it owns nothing, so every variable it
        // uses is duplicated by the variable rule.
        let test = ctx.with_owned(TNameSet::default(), |ctx| parc_expr(ctx, guard.test))?;

        Ok(PendingGuard {
            test,
            body,
            dups: dups.into_vec(),
            live: live_body,
        })
    })
}

#[cfg(test)]
mod tests;
