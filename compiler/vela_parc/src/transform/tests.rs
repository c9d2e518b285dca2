use pretty_assertions::assert_eq;

use vela_ir::{
    maybe_stats, Branch, ConRepr, Def, DefGroup, Expr, Guard, Lit, Pattern, Type,
};

use crate::prim::{drop_of, dup_of};
use crate::state::ParcError;
use crate::test_helpers::Fixture;

// ── Lambdas and parameters ──────────────────────────────────────

#[test]
fn identity_lambda_over_machine_value_unchanged() {
    let fx = Fixture::new();
    let x = fx.tn("x", Type::INT);
    let lam = Expr::Lam(vec![x.clone()], Box::new(Expr::var(x)));
    assert_eq!(fx.parc(lam.clone()), lam);
}

#[test]
fn identity_lambda_over_heap_value_unchanged() {
    // The parameter is live (it is the result), so no drop; it is the
    // last use of an owned name, so no dup either.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let lam = Expr::Lam(vec![x.clone()], Box::new(Expr::var(x)));
    assert_eq!(fx.parc(lam.clone()), lam);
}

#[test]
fn dead_heap_parameter_is_dropped_at_entry() {
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let lam = Expr::Lam(vec![x.clone()], Box::new(Expr::Lit(Lit::Int(0))));

    let expected = Expr::Lam(
        vec![x.clone()],
        Box::new(maybe_stats(vec![drop_of(&x)], Expr::Lit(Lit::Int(0)))),
    );
    assert_eq!(fx.parc(lam), expected);
}

#[test]
fn dead_machine_parameter_generates_no_traffic() {
    let fx = Fixture::new();
    let x = fx.tn("x", Type::INT);
    let lam = Expr::Lam(vec![x], Box::new(Expr::Lit(Lit::Int(0))));
    assert_eq!(fx.parc(lam.clone()), lam);
}

#[test]
fn multi_use_dups_all_but_the_last_use() {
    // fn(x) f(x, x) — the rightmost argument is analyzed first and
    // moves; the leftmost use is then live, so it dups.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let f = fx.ext_fun("f", vec![fx.list_ty(), fx.list_ty()], Type::INT);

    let lam = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::App(
            Box::new(f.clone()),
            vec![Expr::var(x.clone()), Expr::var(x.clone())],
        )),
    );
    let expected = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::App(Box::new(f), vec![dup_of(&x), Expr::var(x)])),
    );
    assert_eq!(fx.parc(lam), expected);
}

#[test]
fn three_argument_ordering() {
    // fn(x, y) f(x, y, x) — only the first x needs a dup.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let y = fx.tn("y", fx.list_ty());
    let f = fx.ext_fun(
        "f",
        vec![fx.list_ty(), fx.list_ty(), fx.list_ty()],
        Type::INT,
    );

    let lam = Expr::Lam(
        vec![x.clone(), y.clone()],
        Box::new(Expr::App(
            Box::new(f.clone()),
            vec![
                Expr::var(x.clone()),
                Expr::var(y.clone()),
                Expr::var(x.clone()),
            ],
        )),
    );
    let expected = Expr::Lam(
        vec![x.clone(), y.clone()],
        Box::new(Expr::App(
            Box::new(f),
            vec![dup_of(&x), Expr::var(y), Expr::var(x)],
        )),
    );
    assert_eq!(fx.parc(lam), expected);
}

// ── Variable occurrences ────────────────────────────────────────

#[test]
fn borrowed_occurrence_is_duped() {
    // Nothing owns xs here, so the occurrence only borrows it.
    let fx = Fixture::new();
    let xs = fx.tn("xs", fx.list_ty());
    let (out, live) = fx.parc_owned(&[], Expr::var(xs.clone()));
    assert_eq!(out, dup_of(&xs));
    assert!(live.contains(&xs));
}

#[test]
fn machine_value_occurrence_unchanged() {
    let fx = Fixture::new();
    let n = fx.tn("n", Type::INT);
    let (out, live) = fx.parc_owned(&[], Expr::var(n.clone()));
    assert_eq!(out, Expr::var(n.clone()));
    // Still marked live: liveness tracks all locals, traffic only
    // heap ones.
    assert!(live.contains(&n));
}

#[test]
fn qualified_reference_untouched() {
    let fx = Fixture::new();
    let g = fx.global("core", "default_list", fx.list_ty());
    let (out, live) = fx.parc_owned(&[], g.clone());
    assert_eq!(out, g);
    assert!(live.is_empty());
}

#[test]
fn tagged_references_untouched() {
    let fx = Fixture::new();
    let f = fx.ext_fun("f", vec![Type::INT], Type::INT);
    let (out, live) = fx.parc_owned(&[], f.clone());
    assert_eq!(out, f);
    assert!(live.is_empty());
}

// ── Lets ────────────────────────────────────────────────────────

#[test]
fn let_moves_into_binding_and_dups_early_uses() {
    // fn(x) let y = x in pair(y, y)
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let y = fx.tn("y", fx.list_ty());
    let pair_con = Expr::Con {
        name: fx.tn(
            "Pair",
            Type::fun(vec![fx.list_ty(), fx.list_ty()], fx.pair_ty()),
        ),
        repr: ConRepr::Boxed,
    };

    let lam = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::Let(
            vec![DefGroup::NonRec(Def::new(
                y.name,
                y.ty.clone(),
                Expr::var(x.clone()),
            ))],
            Box::new(Expr::App(
                Box::new(pair_con.clone()),
                vec![Expr::var(y.clone()), Expr::var(y.clone())],
            )),
        )),
    );

    let expected = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::Let(
            vec![DefGroup::NonRec(Def::new(
                y.name,
                y.ty.clone(),
                Expr::var(x),
            ))],
            Box::new(Expr::App(
                Box::new(pair_con),
                vec![dup_of(&y), Expr::var(y)],
            )),
        )),
    );
    assert_eq!(fx.parc(lam), expected);
}

#[test]
fn dead_let_binding_is_dropped() {
    // fn(x) let y = x in 0 — y has no downstream use.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let y = fx.tn("y", fx.list_ty());

    let lam = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::Let(
            vec![DefGroup::NonRec(Def::new(
                y.name,
                y.ty.clone(),
                Expr::var(x.clone()),
            ))],
            Box::new(Expr::Lit(Lit::Int(0))),
        )),
    );

    let out = fx.parc(lam);
    // let y = x in (drop(y); 0), with the statement merged into the
    // same binding list.
    let expected = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::Let(
            vec![
                DefGroup::NonRec(Def::new(y.name, y.ty.clone(), Expr::var(x))),
                DefGroup::NonRec(Def::new(
                    vela_ir::Name::local(vela_ir::Symbol::EMPTY),
                    Type::UNIT,
                    drop_of(&y),
                )),
            ],
            Box::new(Expr::Lit(Lit::Int(0))),
        )),
    );
    assert_eq!(out, expected);
}

#[test]
fn recursive_let_is_fatal() {
    let fx = Fixture::new();
    let f = fx.tn("f", Type::fun(vec![Type::INT], Type::INT));
    let expr = Expr::Let(
        vec![DefGroup::Rec(vec![Def::new(
            f.name,
            f.ty.clone(),
            Expr::var(f),
        )])],
        Box::new(Expr::Lit(Lit::Int(0))),
    );
    match fx.try_parc(expr) {
        Err(ParcError::RecursiveLet { .. }) => {}
        other => panic!("expected a recursive-let error, got {other:?}"),
    }
}

// ── Type abstraction ────────────────────────────────────────────

#[test]
fn type_lambda_is_transparent() {
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let expr = Expr::TypeLam(
        vec![0],
        Box::new(Expr::Lam(vec![x.clone()], Box::new(Expr::Lit(Lit::Int(0))))),
    );
    let expected = Expr::TypeLam(
        vec![0],
        Box::new(Expr::Lam(
            vec![x.clone()],
            Box::new(maybe_stats(vec![drop_of(&x)], Expr::Lit(Lit::Int(0)))),
        )),
    );
    assert_eq!(fx.parc(expr), expected);
}

#[test]
fn type_application_is_transparent() {
    let fx = Fixture::new();
    let g = fx.global(
        "core",
        "nil",
        Type::Forall(vec![0], Box::new(fx.list_ty())),
    );
    let expr = Expr::TypeApp(Box::new(g.clone()), vec![Type::INT]);
    assert_eq!(fx.parc(expr.clone()), expr);
}

// ── Lambda captures ─────────────────────────────────────────────

#[test]
fn last_use_capture_moves_into_the_closure() {
    // fn(x) fn(y) pair(x, y) — constructing the inner closure is the
    // last use of x, so ownership moves without a dup.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let y = fx.tn("y", fx.list_ty());
    let pair_con = Expr::Con {
        name: fx.tn(
            "Pair",
            Type::fun(vec![fx.list_ty(), fx.list_ty()], fx.pair_ty()),
        ),
        repr: ConRepr::Boxed,
    };

    let lam = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::Lam(
            vec![y.clone()],
            Box::new(Expr::App(
                Box::new(pair_con),
                vec![Expr::var(x), Expr::var(y)],
            )),
        )),
    );
    assert_eq!(fx.parc(lam.clone()), lam);
}

#[test]
fn capture_used_downstream_is_duped_at_construction() {
    // fn(x) g(fn(y) h(x), x) — x is both captured and passed on, so
    // the closure construction dups it.
    let fx = Fixture::new();
    let x = fx.tn("x", fx.list_ty());
    let y = fx.tn("y", Type::INT);
    let h = fx.ext_fun("h", vec![fx.list_ty()], Type::INT);
    let inner_ty = Type::fun(vec![Type::INT], Type::INT);
    let g = fx.ext_fun("g", vec![inner_ty, fx.list_ty()], Type::INT);

    let inner = Expr::Lam(
        vec![y.clone()],
        Box::new(Expr::App(Box::new(h.clone()), vec![Expr::var(x.clone())])),
    );
    let inner_rewritten = Expr::Lam(
        vec![y],
        Box::new(Expr::App(Box::new(h), vec![Expr::var(x.clone())])),
    );

    let lam = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::App(
            Box::new(g.clone()),
            vec![inner, Expr::var(x.clone())],
        )),
    );
    let expected = Expr::Lam(
        vec![x.clone()],
        Box::new(Expr::App(
            Box::new(g),
            vec![
                maybe_stats(vec![dup_of(&x)], inner_rewritten),
                Expr::var(x),
            ],
        )),
    );
    assert_eq!(fx.parc(lam), expected);
}

// ── Cases ───────────────────────────────────────────────────────

fn cons_pattern(fx: &Fixture, elem: Type, h: &vela_ir::TName, t: &vela_ir::TName) -> Pattern {
    let list = Type::App(Box::new(Type::Con(fx.local("list"))), vec![elem.clone()]);
    Pattern::Con {
        name: fx.tn("Cons", Type::fun(vec![elem, list.clone()], list)),
        repr: ConRepr::Boxed,
        patterns: vec![
            Pattern::bind(h.clone(), Pattern::Wild),
            Pattern::bind(t.clone(), Pattern::Wild),
        ],
    }
}

fn nil_pattern(fx: &Fixture, elem: Type) -> Pattern {
    let list = Type::App(Box::new(Type::Con(fx.local("list"))), vec![elem]);
    Pattern::Con {
        name: fx.tn("Nil", list),
        repr: ConRepr::Const,
        patterns: vec![],
    }
}

#[test]
fn head_of_list_normalizes_and_drops_the_scrutinee() {
    // case mklist() of Cons(h, t) -> h; Nil -> core/default
    // The scrutinee is hoisted to match0; each branch releases it.
    // With h: int, neither field generates traffic; t is released
    // transitively by dropping the cell.
    let fx = Fixture::new();
    let h = fx.tn("h", Type::INT);
    let t = fx.tn("t", fx.list_ty());
    let mk = Expr::App(
        Box::new(fx.ext_fun("mklist", vec![], fx.list_ty())),
        vec![],
    );
    let default = fx.global("core", "default", Type::INT);

    let case = Expr::Case {
        scrutinees: vec![mk.clone()],
        branches: vec![
            Branch {
                patterns: vec![cons_pattern(&fx, Type::INT, &h, &t)],
                guards: vec![Guard::unconditional(Expr::var(h.clone()))],
            },
            Branch {
                patterns: vec![nil_pattern(&fx, Type::INT)],
                guards: vec![Guard::unconditional(default.clone())],
            },
        ],
    };

    let m0 = fx.tn("match0", fx.list_ty());
    let expected = Expr::Let(
        vec![DefGroup::NonRec(Def::new(m0.name, m0.ty.clone(), mk))],
        Box::new(Expr::Case {
            scrutinees: vec![Expr::var(m0.clone())],
            branches: vec![
                Branch {
                    patterns: vec![cons_pattern(&fx, Type::INT, &h, &t)],
                    guards: vec![Guard::unconditional(maybe_stats(
                        vec![drop_of(&m0)],
                        Expr::var(h),
                    ))],
                },
                Branch {
                    patterns: vec![nil_pattern(&fx, Type::INT)],
                    guards: vec![Guard::unconditional(maybe_stats(
                        vec![drop_of(&m0)],
                        default,
                    ))],
                },
            ],
        }),
    );
    assert_eq!(fx.parc(case), expected);
}

#[test]
fn consumed_heap_field_is_duped_at_guard_entry() {
    // Same match over list<string>: the branch body consumes h, so h
    // is duped before the scrutinee is released.
    let fx = Fixture::new();
    let list_str = Type::App(Box::new(Type::Con(fx.local("list"))), vec![Type::STRING]);
    let h = fx.tn("h", Type::STRING);
    let t = fx.tn("t", list_str.clone());
    let xs = fx.tn("xs", list_str.clone());
    let default = fx.global("core", "default", Type::STRING);

    let case = Expr::Case {
        scrutinees: vec![Expr::var(xs.clone())],
        branches: vec![
            Branch {
                patterns: vec![cons_pattern(&fx, Type::STRING, &h, &t)],
                guards: vec![Guard::unconditional(Expr::var(h.clone()))],
            },
            Branch {
                patterns: vec![nil_pattern(&fx, Type::STRING)],
                guards: vec![Guard::unconditional(default.clone())],
            },
        ],
    };

    let expected = Expr::Case {
        scrutinees: vec![Expr::var(xs.clone())],
        branches: vec![
            Branch {
                patterns: vec![cons_pattern(&fx, Type::STRING, &h, &t)],
                guards: vec![Guard::unconditional(maybe_stats(
                    vec![dup_of(&h), drop_of(&xs)],
                    Expr::var(h),
                ))],
            },
            Branch {
                patterns: vec![nil_pattern(&fx, Type::STRING)],
                guards: vec![Guard::unconditional(maybe_stats(
                    vec![drop_of(&xs)],
                    default,
                ))],
            },
        ],
    };
    let (out, live) = fx.parc_owned(&[], case);
    assert_eq!(out, expected);
    assert!(live.contains(&xs));
}

#[test]
fn guard_test_borrows_pattern_variables() {
    // case xs of Cons(h, t) | g(h) -> t
    let fx = Fixture::new();
    let list_str = Type::App(Box::new(Type::Con(fx.local("list"))), vec![Type::STRING]);
    let h = fx.tn("h", Type::STRING);
    let t = fx.tn("t", list_str.clone());
    let xs = fx.tn("xs", list_str.clone());
    let g = fx.ext_fun("g", vec![Type::STRING], Type::BOOL);

    let case = Expr::Case {
        scrutinees: vec![Expr::var(xs.clone())],
        branches: vec![Branch {
            patterns: vec![cons_pattern(&fx, Type::STRING, &h, &t)],
            guards: vec![Guard {
                test: Expr::App(Box::new(g.clone()), vec![Expr::var(h.clone())]),
                body: Expr::var(t.clone()),
            }],
        }],
    };

    let expected = Expr::Case {
        scrutinees: vec![Expr::var(xs.clone())],
        branches: vec![Branch {
            patterns: vec![cons_pattern(&fx, Type::STRING, &h, &t)],
            guards: vec![Guard {
                // The test owns nothing, so its use of h dups.
                test: Expr::App(Box::new(g), vec![dup_of(&h)]),
                body: maybe_stats(vec![dup_of(&t), drop_of(&xs)], Expr::var(t.clone())),
            }],
        }],
    };
    assert_eq!(fx.parc_owned(&[], case).0, expected);
}

#[test]
fn owned_name_unused_by_one_branch_is_dropped_there() {
    // fn(u, xs) case xs of Cons(h, t) -> u; Nil -> core/empty
    // u is consumed by the Cons branch, so the Nil branch must
    // release it; both branches release the scrutinee.
    let fx = Fixture::new();
    let u = fx.tn("u", fx.list_ty());
    let xs = fx.tn("xs", fx.list_ty());
    let h = fx.tn("h", Type::INT);
    let t = fx.tn("t", fx.list_ty());
    let empty = fx.global("core", "empty", fx.list_ty());

    let lam = Expr::Lam(
        vec![u.clone(), xs.clone()],
        Box::new(Expr::Case {
            scrutinees: vec![Expr::var(xs.clone())],
            branches: vec![
                Branch {
                    patterns: vec![cons_pattern(&fx, Type::INT, &h, &t)],
                    guards: vec![Guard::unconditional(Expr::var(u.clone()))],
                },
                Branch {
                    patterns: vec![nil_pattern(&fx, Type::INT)],
                    guards: vec![Guard::unconditional(empty.clone())],
                },
            ],
        }),
    );

    let expected = Expr::Lam(
        vec![u.clone(), xs.clone()],
        Box::new(Expr::Case {
            scrutinees: vec![Expr::var(xs.clone())],
            branches: vec![
                Branch {
                    patterns: vec![cons_pattern(&fx, Type::INT, &h, &t)],
                    guards: vec![Guard::unconditional(maybe_stats(
                        vec![drop_of(&xs)],
                        Expr::var(u.clone()),
                    ))],
                },
                Branch {
                    patterns: vec![nil_pattern(&fx, Type::INT)],
                    // Names sort by interning order: u before xs.
                    guards: vec![Guard::unconditional(maybe_stats(
                        vec![drop_of(&u), drop_of(&xs)],
                        empty,
                    ))],
                },
            ],
        }),
    );
    assert_eq!(fx.parc(lam), expected);
}
