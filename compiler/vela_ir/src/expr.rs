//! Core expression tree.
//!
//! The typed functional IR transformed by the compiler's middle-end
//! passes: lambdas, applications, let bindings, and multi-scrutinee
//! pattern matches. The tree is read-mostly — passes return new trees
//! rather than mutating in place.

use rustc_hash::FxHashSet;

use crate::{ConRepr, Name, Symbol, Type};

/// A typed name: an identifier paired with its type.
///
/// Equality and hashing cover both the identifier and the type
/// position, so the same identifier at different types is two distinct
/// typed names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TName {
    pub name: Name,
    pub ty: Type,
}

impl TName {
    pub fn new(name: Name, ty: Type) -> Self {
        TName { name, ty }
    }
}

/// A literal constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lit {
    Int(i64),
    /// Float stored as raw bits so literals stay `Eq`/`Hash`.
    Float(u64),
    Char(char),
    Bool(bool),
    Str(Symbol),
}

impl Lit {
    /// The type of this literal.
    pub fn ty(self) -> Type {
        match self {
            Lit::Int(_) => Type::INT,
            Lit::Float(_) => Type::FLOAT,
            Lit::Char(_) => Type::CHAR,
            Lit::Bool(_) => Type::BOOL,
            Lit::Str(_) => Type::STRING,
        }
    }
}

/// Info tag on a variable occurrence.
///
/// Only [`VarInfo::None`] occurrences denote reference-counted local or
/// global references. Arity-only and externally-implemented references
/// are code, not heap values, and are left untouched by the
/// reference-counting pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarInfo {
    /// Plain reference; subject to reference counting.
    None,
    /// Known-arity function reference.
    Arity { type_params: u32, params: u32 },
    /// Externally implemented primitive; the payload is the literal
    /// code-generator template (`#1`, `#2`, … are argument holes).
    External(&'static str),
}

impl VarInfo {
    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, VarInfo::None)
    }
}

/// A Core expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Value lambda.
    Lam(Vec<TName>, Box<Expr>),
    /// Variable occurrence.
    Var { name: TName, info: VarInfo },
    /// Application.
    App(Box<Expr>, Vec<Expr>),
    /// Type lambda.
    TypeLam(Vec<u32>, Box<Expr>),
    /// Type application.
    TypeApp(Box<Expr>, Vec<Type>),
    /// Constructor reference.
    Con { name: TName, repr: ConRepr },
    /// Literal.
    Lit(Lit),
    /// Let binding; groups are scoped left to right.
    Let(Vec<DefGroup>, Box<Expr>),
    /// Pattern match over one or more scrutinees.
    Case {
        scrutinees: Vec<Expr>,
        branches: Vec<Branch>,
    },
}

impl Expr {
    /// A plain reference-counted variable occurrence.
    pub fn var(name: TName) -> Expr {
        Expr::Var {
            name,
            info: VarInfo::None,
        }
    }

    /// Synthesize the type of this expression.
    ///
    /// The tree is intrinsically typed (every binder and constructor
    /// carries its type), so this is a bottom-up read, not inference.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Lam(params, body) => Type::fun(
                params.iter().map(|p| p.ty.clone()).collect(),
                body.ty(),
            ),
            Expr::Var { name, .. } | Expr::Con { name, .. } => name.ty.clone(),
            Expr::App(fun, _) => match fun.ty().unquantify() {
                Type::Fun(_, result) => (**result).clone(),
                // Ill-typed application; surface the head type rather
                // than guessing.
                other => other.clone(),
            },
            Expr::TypeLam(vars, body) => Type::Forall(vars.clone(), Box::new(body.ty())),
            Expr::TypeApp(body, targs) => body.ty().instantiate(targs),
            Expr::Lit(lit) => lit.ty(),
            Expr::Let(_, body) => body.ty(),
            Expr::Case { branches, .. } => branches
                .first()
                .and_then(|b| b.guards.first())
                .map_or(Type::UNIT, |g| g.body.ty()),
        }
    }
}

/// A named definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Def {
    pub name: Name,
    pub ty: Type,
    pub expr: Expr,
}

impl Def {
    pub fn new(name: Name, ty: Type, expr: Expr) -> Self {
        Def { name, ty, expr }
    }

    /// The typed name this definition binds.
    pub fn tname(&self) -> TName {
        TName::new(self.name, self.ty.clone())
    }
}

/// A definition group: a single non-recursive binding or a cluster of
/// mutually recursive ones. Groups preserve source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefGroup {
    NonRec(Def),
    Rec(Vec<Def>),
}

impl DefGroup {
    /// The typed names bound by this group.
    pub fn bound_vars(&self) -> Vec<TName> {
        match self {
            DefGroup::NonRec(def) => vec![def.tname()],
            DefGroup::Rec(defs) => defs.iter().map(Def::tname).collect(),
        }
    }
}

/// A whole Core program: its top-level definition groups.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Core {
    pub defs: Vec<DefGroup>,
}

/// One arm of a `Case`: a pattern per scrutinee plus one or more guards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub patterns: Vec<Pattern>,
    pub guards: Vec<Guard>,
}

impl Branch {
    /// Typed names bound by this branch's patterns, at any depth.
    pub fn bound_vars(&self) -> FxHashSet<TName> {
        let mut acc = FxHashSet::default();
        for pat in &self.patterns {
            pat.collect_binders(&mut acc);
        }
        acc
    }
}

/// A guarded result within a branch. `test` must be boolean; an
/// unconditional guard uses a `true` literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guard {
    pub test: Expr,
    pub body: Expr,
}

impl Guard {
    pub fn unconditional(body: Expr) -> Self {
        Guard {
            test: Expr::Lit(Lit::Bool(true)),
            body,
        }
    }
}

/// A match pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Constructor pattern with sub-patterns for each field.
    Con {
        name: TName,
        repr: ConRepr,
        patterns: Vec<Pattern>,
    },
    /// Variable binding wrapping a sub-pattern (`x as p`). Top-level
    /// occurrences are eliminated by case normalization; nested
    /// occurrences bind constructor fields.
    Var { binder: TName, pattern: Box<Pattern> },
    /// Literal pattern.
    Lit(Lit),
    /// Wildcard.
    Wild,
}

impl Pattern {
    /// Bind a name to the whole sub-tree (`x as _` when `sub` is wild).
    pub fn bind(binder: TName, sub: Pattern) -> Pattern {
        Pattern::Var {
            binder,
            pattern: Box::new(sub),
        }
    }

    fn collect_binders(&self, acc: &mut FxHashSet<TName>) {
        match self {
            Pattern::Con { patterns, .. } => {
                for p in patterns {
                    p.collect_binders(acc);
                }
            }
            Pattern::Var { binder, pattern } => {
                acc.insert(binder.clone());
                pattern.collect_binders(acc);
            }
            Pattern::Lit(_) | Pattern::Wild => {}
        }
    }
}

/// Wrap `body` in a let over `groups`, flattening nested lets and
/// eliding empty binding lists.
pub fn make_let(groups: Vec<DefGroup>, body: Expr) -> Expr {
    if groups.is_empty() {
        return body;
    }
    match body {
        Expr::Let(inner, inner_body) => {
            let mut all = groups;
            all.extend(inner);
            Expr::Let(all, inner_body)
        }
        other => Expr::Let(groups, Box::new(other)),
    }
}

/// Statement sequencing: evaluate `stmts` for effect, then `result`.
///
/// Each statement is bound as an anonymous non-recursive definition, so
/// inserted reference-count traffic introduces no new live names.
/// Returns `result` unchanged when there are no statements.
pub fn maybe_stats(stmts: Vec<Expr>, result: Expr) -> Expr {
    if stmts.is_empty() {
        return result;
    }
    let groups = stmts
        .into_iter()
        .map(|stmt| {
            let ty = stmt.ty();
            DefGroup::NonRec(Def::new(Name::local(Symbol::EMPTY), ty, stmt))
        })
        .collect();
    make_let(groups, result)
}

/// A boolean two-way match: `if cond then on_true else on_false`.
pub fn make_if(cond: Expr, on_true: Expr, on_false: Expr) -> Expr {
    Expr::Case {
        scrutinees: vec![cond],
        branches: vec![
            Branch {
                patterns: vec![Pattern::Lit(Lit::Bool(true))],
                guards: vec![Guard::unconditional(on_true)],
            },
            Branch {
                patterns: vec![Pattern::Wild],
                guards: vec![Guard::unconditional(on_false)],
            },
        ],
    }
}
