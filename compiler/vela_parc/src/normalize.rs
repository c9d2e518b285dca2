//! Case normalization.
//!
//! Branch analysis requires every scrutinee to be a plain variable
//! (so it can be marked live and dropped by name) and no branch to
//! start with a variable-binding pattern (so pattern binders are
//! exactly the constructor field binders). A `case` in that form is
//! **normalized**.
//!
//! Normalization hoists each non-variable scrutinee into a fresh
//! `match{k}` let binding and rewrites top-level `x as p` patterns by
//! substituting `x` with the corresponding scrutinee variable in the
//! branch's guards. The rewritten tree is re-entered through the main
//! transformer, which then sees a normalized case.

use vela_ir::{
    make_let, substitute, Branch, Def, DefGroup, Expr, Guard, Name, Pattern, Subst, TName,
};

use crate::state::Parc;

/// Whether branch analysis can run on this `case` directly.
pub fn is_normalized(scrutinees: &[Expr], branches: &[Branch]) -> bool {
    scrutinees.iter().all(|e| matches!(e, Expr::Var { .. }))
        && branches
            .iter()
            .all(|b| b.patterns.iter().all(|p| !matches!(p, Pattern::Var { .. })))
}

/// Rewrite a `case` into normalized form.
///
/// Hoisted bindings are prepended in scrutinee order via a single
/// `let`; the result still needs to be transformed.
pub fn normalize_case(
    ctx: &mut Parc<'_>,
    scrutinees: Vec<Expr>,
    branches: Vec<Branch>,
) -> Expr {
    let mut groups: Vec<DefGroup> = Vec::new();
    let scruts: Vec<Expr> = scrutinees
        .into_iter()
        .map(|e| {
            if matches!(e, Expr::Var { .. }) {
                e
            } else {
                let ty = e.ty();
                let name = Name::local(ctx.fresh_name("match"));
                groups.push(DefGroup::NonRec(Def::new(name, ty.clone(), e)));
                Expr::var(TName::new(name, ty))
            }
        })
        .collect();

    let branches = branches
        .into_iter()
        .map(|b| strip_aliases(b, &scruts))
        .collect();

    make_let(
        groups,
        Expr::Case {
            scrutinees: scruts,
            branches,
        },
    )
}

/// Eliminate top-level `x as p` patterns from one branch: record
/// `x → scrutinee` and unwrap to `p`, then apply the accumulated
/// substitution to every guard.
fn strip_aliases(branch: Branch, scrutinees: &[Expr]) -> Branch {
    let mut map = Subst::default();
    let patterns: Vec<Pattern> = branch
        .patterns
        .into_iter()
        .zip(scrutinees)
        .map(|(mut pat, scrut)| {
            while let Pattern::Var { binder, pattern } = pat {
                map.insert(binder, scrut.clone());
                pat = *pattern;
            }
            pat
        })
        .collect();
    let guards = branch
        .guards
        .into_iter()
        .map(|g| Guard {
            test: substitute(g.test, &map),
            body: substitute(g.body, &map),
        })
        .collect();
    Branch { patterns, guards }
}
