//! Free local variable computation.
//!
//! Collects the free variables of an expression that are candidates
//! for reference counting: unqualified occurrences with
//! [`VarInfo::None`]. Qualified names are globally allocated and
//! arity/external references are code, so neither can be a captured
//! heap reference.

use rustc_hash::FxHashSet;

use crate::{DefGroup, Expr, TName};

/// Free reference-counted locals of `expr`.
pub fn free_locals(expr: &Expr) -> FxHashSet<TName> {
    let mut acc = FxHashSet::default();
    let mut bound = Vec::new();
    collect(expr, &mut bound, &mut acc);
    acc
}

fn collect(expr: &Expr, bound: &mut Vec<TName>, acc: &mut FxHashSet<TName>) {
    match expr {
        Expr::Var { name, info } => {
            if info.is_none() && !name.name.is_qualified() && !bound.contains(name) {
                acc.insert(name.clone());
            }
        }
        Expr::Lam(params, body) => {
            let mark = bound.len();
            bound.extend(params.iter().cloned());
            collect(body, bound, acc);
            bound.truncate(mark);
        }
        Expr::App(fun, args) => {
            collect(fun, bound, acc);
            for arg in args {
                collect(arg, bound, acc);
            }
        }
        Expr::TypeLam(_, body) => collect(body, bound, acc),
        Expr::TypeApp(body, _) => collect(body, bound, acc),
        Expr::Con { .. } | Expr::Lit(_) => {}
        Expr::Let(groups, body) => {
            let mark = bound.len();
            for group in groups {
                match group {
                    DefGroup::NonRec(def) => {
                        // The binding is not in scope in its own body.
                        collect(&def.expr, bound, acc);
                        bound.push(def.tname());
                    }
                    DefGroup::Rec(defs) => {
                        for def in defs {
                            bound.push(def.tname());
                        }
                        for def in defs {
                            collect(&def.expr, bound, acc);
                        }
                    }
                }
            }
            collect(body, bound, acc);
            bound.truncate(mark);
        }
        Expr::Case {
            scrutinees,
            branches,
        } => {
            for scrut in scrutinees {
                collect(scrut, bound, acc);
            }
            for branch in branches {
                let mark = bound.len();
                bound.extend(branch.bound_vars());
                for guard in &branch.guards {
                    collect(&guard.test, bound, acc);
                    collect(&guard.body, bound, acc);
                }
                bound.truncate(mark);
            }
        }
    }
}
