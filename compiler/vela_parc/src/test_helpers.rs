//! Shared builders for pass tests.
//!
//! A [`Fixture`] owns an interner and a registry seeded with the
//! builtins plus two boxed data types (`list`, `pair`), and runs the
//! transformer with a fresh context per call so tests stay independent.

use vela_ir::{
    ConRepr, DataInfo, DataRepr, Expr, Name, Newtypes, StringInterner, Symbol, TName, Type,
    VarInfo,
};

use crate::state::{Parc, ParcResult, TNameSet};
use crate::transform::parc_expr;

pub(crate) struct Fixture {
    pub interner: StringInterner,
    pub newtypes: Newtypes,
}

impl Fixture {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let mut newtypes = Newtypes::with_builtins();
        newtypes.insert(
            Name::local(interner.intern("list")),
            DataInfo::new(DataRepr::Boxed),
        );
        newtypes.insert(
            Name::local(interner.intern("pair")),
            DataInfo::new(DataRepr::Boxed),
        );
        Fixture { interner, newtypes }
    }

    pub fn sym(&self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    pub fn local(&self, s: &str) -> Name {
        Name::local(self.sym(s))
    }

    /// `list<int>`.
    pub fn list_ty(&self) -> Type {
        Type::App(Box::new(Type::Con(self.local("list"))), vec![Type::INT])
    }

    /// `pair<list<int>, list<int>>`.
    pub fn pair_ty(&self) -> Type {
        Type::App(
            Box::new(Type::Con(self.local("pair"))),
            vec![self.list_ty(), self.list_ty()],
        )
    }

    pub fn tn(&self, s: &str, ty: Type) -> TName {
        TName::new(self.local(s), ty)
    }

    pub fn var(&self, s: &str, ty: Type) -> Expr {
        Expr::var(self.tn(s, ty))
    }

    /// A known-arity function reference; not reference counted.
    pub fn ext_fun(&self, s: &str, params: Vec<Type>, result: Type) -> Expr {
        let arity = u32::try_from(params.len()).unwrap_or(u32::MAX);
        Expr::Var {
            name: self.tn(s, Type::fun(params, result)),
            info: VarInfo::Arity {
                type_params: 0,
                params: arity,
            },
        }
    }

    /// A qualified (top-level) value reference.
    pub fn global(&self, module: &str, s: &str, ty: Type) -> Expr {
        Expr::var(TName::new(
            Name::qualified(self.sym(module), self.sym(s)),
            ty,
        ))
    }

    /// The `Cons` constructor for `list<int>`.
    pub fn cons(&self) -> Expr {
        Expr::Con {
            name: self.tn(
                "Cons",
                Type::fun(vec![Type::INT, self.list_ty()], self.list_ty()),
            ),
            repr: ConRepr::Boxed,
        }
    }

    /// Transform with empty initial state; panics on a pass error.
    pub fn parc(&self, expr: Expr) -> Expr {
        match self.try_parc(expr) {
            Ok(e) => e,
            Err(err) => panic!("parc failed: {err}"),
        }
    }

    /// Transform with empty initial state.
    pub fn try_parc(&self, expr: Expr) -> ParcResult<Expr> {
        let mut uniq = 0;
        let mut ctx = Parc::new(&self.newtypes, &self.interner, &mut uniq);
        parc_expr(&mut ctx, expr)
    }

    /// Transform with `owned` pre-owned; returns the result and the
    /// final live set.
    pub fn parc_owned(&self, owned: &[TName], expr: Expr) -> (Expr, TNameSet) {
        let mut uniq = 0;
        let mut ctx = Parc::new(&self.newtypes, &self.interner, &mut uniq);
        let set: TNameSet = owned.iter().cloned().collect();
        let result = ctx.extend_owned(&set, |ctx| parc_expr(ctx, expr));
        match result {
            Ok(e) => (e, ctx.live_snapshot()),
            Err(err) => panic!("parc failed: {err}"),
        }
    }
}
