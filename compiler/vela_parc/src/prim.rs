//! Runtime primitive emitter.
//!
//! Pure syntax construction: each primitive is a `Var` whose info
//! carries the literal C template for the code generator, applied to
//! its arguments. Nothing here is executed or analyzed further — the
//! external info tag keeps emitted primitives out of any later
//! reference counting.
//!
//! | primitive      | template                                  | result        |
//! |----------------|-------------------------------------------|---------------|
//! | `dup(x)`       | `dup(#1)`                                 | type of `x`   |
//! | `drop(x)`      | `drop(#1)`                                | unit          |
//! | `is_unique(x)` | `constructor_is_unique(#1)`               | bool          |
//! | `free(x)`      | `constructor_free(#1)`                    | unit          |
//! | `drop_reuse(x)`| `drop_reuse_datatype(#1, current_context())` | reuse token |
//! | `no_reuse()`   | `no_reuse()`                              | reuse token   |
//! | `alloc_at`     | known-arity, explicit token + constructor | type of ctor  |

use vela_ir::{Expr, Name, Symbol, TName, Type, VarInfo};

use crate::state::{Parc, ParcResult};
use crate::RcClass;

fn prim(sym: Symbol, ty: Type, template: &'static str) -> Expr {
    Expr::Var {
        name: TName::new(Name::local(sym), ty),
        info: VarInfo::External(template),
    }
}

fn apply_to(fun: Expr, name: &TName) -> Expr {
    Expr::App(Box::new(fun), vec![Expr::var(name.clone())])
}

/// `dup(x)` — increment the reference count; evaluates to `x`.
pub fn dup_of(name: &TName) -> Expr {
    let ty = Type::fun(vec![name.ty.clone()], name.ty.clone());
    apply_to(prim(Symbol::DUP, ty, "dup(#1)"), name)
}

/// `drop(x)` — decrement the reference count, freeing at zero.
pub fn drop_of(name: &TName) -> Expr {
    let ty = Type::fun(vec![name.ty.clone()], Type::UNIT);
    apply_to(prim(Symbol::DROP, ty, "drop(#1)"), name)
}

/// `constructor_is_unique(x)` — whether `x` holds the only reference.
pub fn is_unique_of(name: &TName) -> Expr {
    let ty = Type::fun(vec![name.ty.clone()], Type::BOOL);
    apply_to(prim(Symbol::IS_UNIQUE, ty, "constructor_is_unique(#1)"), name)
}

/// `constructor_free(x)` — free the cell without touching its fields.
pub fn free_of(name: &TName) -> Expr {
    let ty = Type::fun(vec![name.ty.clone()], Type::UNIT);
    apply_to(prim(Symbol::FREE, ty, "constructor_free(#1)"), name)
}

/// `drop_reuse_datatype(x, current_context())` — release a unique cell
/// and hand back its memory as a reuse token.
pub fn drop_reuse_of(name: &TName) -> Expr {
    let ty = Type::fun(vec![name.ty.clone()], Type::REUSE);
    apply_to(
        prim(
            Symbol::DROP_REUSE,
            ty,
            "drop_reuse_datatype(#1, current_context())",
        ),
        name,
    )
}

/// `no_reuse()` — the empty reuse token.
pub fn no_reuse() -> Expr {
    let ty = Type::fun(vec![], Type::REUSE);
    Expr::App(Box::new(prim(Symbol::NO_REUSE, ty, "no_reuse()")), vec![])
}

/// `alloc_at(token, ctor)` — allocate a constructor into the memory
/// named by a reuse token.
pub fn alloc_at(token: &TName, con_app: Expr) -> Expr {
    let con_ty = con_app.ty();
    let ty = Type::fun(vec![Type::REUSE, con_ty.clone()], con_ty);
    let fun = Expr::Var {
        name: TName::new(Name::local(Symbol::ALLOC_AT), ty),
        info: VarInfo::Arity {
            type_params: 0,
            params: 1,
        },
    };
    Expr::App(Box::new(fun), vec![Expr::var(token.clone()), con_app])
}

/// A `dup` for `name`, or `None` when its type has no pointer content.
pub fn gen_dup(ctx: &Parc<'_>, name: &TName) -> ParcResult<Option<Expr>> {
    Ok(match ctx.classify(&name.ty)? {
        RcClass::Rc => Some(dup_of(name)),
        RcClass::NoRc => None,
    })
}

/// A `drop` for `name`, or `None` when its type has no pointer content.
pub fn gen_drop(ctx: &Parc<'_>, name: &TName) -> ParcResult<Option<Expr>> {
    Ok(match ctx.classify(&name.ty)? {
        RcClass::Rc => Some(drop_of(name)),
        RcClass::NoRc => None,
    })
}
