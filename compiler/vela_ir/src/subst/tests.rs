use pretty_assertions::assert_eq;

use rustc_hash::FxHashMap;

use crate::{Branch, Def, DefGroup, Expr, Guard, Lit, Name, Pattern, Symbol, TName, Type};

use super::substitute;

fn tn(raw: u32) -> TName {
    TName::new(Name::local(Symbol::from_raw(raw)), Type::STRING)
}

fn var(raw: u32) -> Expr {
    Expr::var(tn(raw))
}

#[test]
fn replaces_matching_occurrences() {
    let mut map = FxHashMap::default();
    map.insert(tn(1), var(9));

    let app = Expr::App(Box::new(var(1)), vec![var(1), var(2)]);
    let out = substitute(app, &map);
    assert_eq!(out, Expr::App(Box::new(var(9)), vec![var(9), var(2)]));
}

#[test]
fn empty_map_is_identity() {
    let e = Expr::App(Box::new(var(1)), vec![var(2)]);
    assert_eq!(substitute(e.clone(), &FxHashMap::default()), e);
}

#[test]
fn substitutes_inside_lets_and_guards() {
    let mut map = FxHashMap::default();
    map.insert(tn(1), var(9));

    let def = Def::new(tn(5).name, Type::STRING, var(1));
    let case = Expr::Case {
        scrutinees: vec![var(2)],
        branches: vec![Branch {
            patterns: vec![Pattern::Wild],
            guards: vec![Guard {
                test: var(1),
                body: var(1),
            }],
        }],
    };
    let le = Expr::Let(vec![DefGroup::NonRec(def)], Box::new(case));
    let out = substitute(le, &map);

    match out {
        Expr::Let(groups, body) => {
            match &groups[0] {
                DefGroup::NonRec(def) => assert_eq!(def.expr, var(9)),
                DefGroup::Rec(_) => panic!("expected non-recursive group"),
            }
            match *body {
                Expr::Case { branches, .. } => {
                    assert_eq!(branches[0].guards[0].test, var(9));
                    assert_eq!(branches[0].guards[0].body, var(9));
                }
                other => panic!("expected case, got {other:?}"),
            }
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn type_mismatch_is_not_replaced() {
    // Same identifier at a different type is a different typed name.
    let mut map = FxHashMap::default();
    map.insert(tn(1), var(9));

    let at_int = Expr::var(TName::new(Name::local(Symbol::from_raw(1)), Type::INT));
    assert_eq!(substitute(at_int.clone(), &map), at_int);
}

#[test]
fn literals_and_constructors_unchanged() {
    let mut map = FxHashMap::default();
    map.insert(tn(1), var(9));
    assert_eq!(
        substitute(Expr::Lit(Lit::Int(3)), &map),
        Expr::Lit(Lit::Int(3))
    );
}
