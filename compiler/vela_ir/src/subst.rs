//! Variable-occurrence substitution.
//!
//! Replaces whole variable occurrences by expressions. Used by case
//! normalization to eliminate top-level pattern aliases, where every
//! replacement is a plain variable with a name no binder in the branch
//! can shadow (alias binders are unique after earlier renaming), so no
//! capture avoidance is needed.

use rustc_hash::FxHashMap;

use crate::{Branch, DefGroup, Expr, Guard, TName};

/// Substitution map from typed names to replacement expressions.
pub type Subst = FxHashMap<TName, Expr>;

/// Apply `map` to every matching variable occurrence in `expr`.
pub fn substitute(expr: Expr, map: &Subst) -> Expr {
    if map.is_empty() {
        return expr;
    }
    match expr {
        Expr::Var { name, info } => match map.get(&name) {
            Some(replacement) => replacement.clone(),
            None => Expr::Var { name, info },
        },
        Expr::Lam(params, body) => Expr::Lam(params, Box::new(substitute(*body, map))),
        Expr::App(fun, args) => Expr::App(
            Box::new(substitute(*fun, map)),
            args.into_iter().map(|a| substitute(a, map)).collect(),
        ),
        Expr::TypeLam(vars, body) => Expr::TypeLam(vars, Box::new(substitute(*body, map))),
        Expr::TypeApp(body, targs) => Expr::TypeApp(Box::new(substitute(*body, map)), targs),
        e @ (Expr::Con { .. } | Expr::Lit(_)) => e,
        Expr::Let(groups, body) => Expr::Let(
            groups
                .into_iter()
                .map(|g| match g {
                    DefGroup::NonRec(mut def) => {
                        def.expr = substitute(def.expr, map);
                        DefGroup::NonRec(def)
                    }
                    DefGroup::Rec(defs) => DefGroup::Rec(
                        defs.into_iter()
                            .map(|mut def| {
                                def.expr = substitute(def.expr, map);
                                def
                            })
                            .collect(),
                    ),
                })
                .collect(),
            Box::new(substitute(*body, map)),
        ),
        Expr::Case {
            scrutinees,
            branches,
        } => Expr::Case {
            scrutinees: scrutinees
                .into_iter()
                .map(|s| substitute(s, map))
                .collect(),
            branches: branches
                .into_iter()
                .map(|b| Branch {
                    patterns: b.patterns,
                    guards: b
                        .guards
                        .into_iter()
                        .map(|g| Guard {
                            test: substitute(g.test, map),
                            body: substitute(g.body, map),
                        })
                        .collect(),
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests;
