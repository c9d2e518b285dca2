//! Compact textual rendering of Core trees.
//!
//! Debug output for traces and test failure messages. Types are
//! elided; type lambdas and applications render transparently.

use std::fmt::Write as _;

use crate::{DefGroup, Expr, Lit, Name, Pattern, StringInterner};

/// Render an expression to a single-line string.
pub fn expr_to_string(expr: &Expr, interner: &StringInterner) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, interner);
    out
}

/// Render a definition group.
pub fn def_group_to_string(group: &DefGroup, interner: &StringInterner) -> String {
    let mut out = String::new();
    match group {
        DefGroup::NonRec(def) => {
            write_name(&mut out, def.name, interner);
            out.push_str(" = ");
            write_expr(&mut out, &def.expr, interner);
        }
        DefGroup::Rec(defs) => {
            out.push_str("rec {");
            for (i, def) in defs.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                } else {
                    out.push(' ');
                }
                write_name(&mut out, def.name, interner);
                out.push_str(" = ");
                write_expr(&mut out, &def.expr, interner);
            }
            out.push_str(" }");
        }
    }
    out
}

fn write_name(out: &mut String, name: Name, interner: &StringInterner) {
    if name.is_qualified() {
        out.push_str(interner.lookup(name.module));
        out.push('/');
    }
    if name.is_wildcard() {
        out.push('_');
    } else {
        out.push_str(interner.lookup(name.ident));
    }
}

fn write_lit(out: &mut String, lit: Lit, interner: &StringInterner) {
    match lit {
        Lit::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Lit::Float(bits) => {
            let _ = write!(out, "{}", f64::from_bits(bits));
        }
        Lit::Char(c) => {
            let _ = write!(out, "'{c}'");
        }
        Lit::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Lit::Str(sym) => {
            let _ = write!(out, "{:?}", interner.lookup(sym));
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr, interner: &StringInterner) {
    match expr {
        Expr::Lam(params, body) => {
            out.push_str("fn(");
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_name(out, p.name, interner);
            }
            out.push_str(") ");
            write_expr(out, body, interner);
        }
        Expr::Var { name, .. } => write_name(out, name.name, interner),
        Expr::App(fun, args) => {
            write_expr(out, fun, interner);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, interner);
            }
            out.push(')');
        }
        Expr::TypeLam(_, body) | Expr::TypeApp(body, _) => write_expr(out, body, interner),
        Expr::Con { name, .. } => write_name(out, name.name, interner),
        Expr::Lit(lit) => write_lit(out, *lit, interner),
        Expr::Let(groups, body) => {
            for group in groups {
                out.push_str("let ");
                out.push_str(&def_group_to_string(group, interner));
                out.push_str(" in ");
            }
            write_expr(out, body, interner);
        }
        Expr::Case {
            scrutinees,
            branches,
        } => {
            out.push_str("match (");
            for (i, s) in scrutinees.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, s, interner);
            }
            out.push_str(") {");
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                out.push(' ');
                for (j, pat) in branch.patterns.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    write_pattern(out, pat, interner);
                }
                for guard in &branch.guards {
                    if !matches!(guard.test, Expr::Lit(Lit::Bool(true))) {
                        out.push_str(" if ");
                        write_expr(out, &guard.test, interner);
                    }
                    out.push_str(" -> ");
                    write_expr(out, &guard.body, interner);
                }
            }
            out.push_str(" }");
        }
    }
}

fn write_pattern(out: &mut String, pat: &Pattern, interner: &StringInterner) {
    match pat {
        Pattern::Con {
            name, patterns, ..
        } => {
            write_name(out, name.name, interner);
            if !patterns.is_empty() {
                out.push('(');
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_pattern(out, p, interner);
                }
                out.push(')');
            }
        }
        Pattern::Var { binder, pattern } => {
            write_name(out, binder.name, interner);
            if !matches!(**pattern, Pattern::Wild) {
                out.push('@');
                write_pattern(out, pattern, interner);
            }
        }
        Pattern::Lit(lit) => write_lit(out, *lit, interner),
        Pattern::Wild => out.push('_'),
    }
}
