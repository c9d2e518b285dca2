//! Core types.
//!
//! A small explicit type tree: named constructors, type variables,
//! applications, function types, and universal quantification. The
//! reference-counting pass only ever needs two questions answered about
//! a type — what is its head constructor, and how does a quantified
//! type instantiate — so that is all this module provides beyond the
//! constructors themselves.

use rustc_hash::FxHashMap;

use crate::{Name, Symbol};

/// A Core type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// Named type constructor, e.g. `int`, `list`.
    Con(Name),
    /// Type variable, identified by a unique id.
    Var(u32),
    /// Type application, e.g. `list<a>`.
    App(Box<Type>, Vec<Type>),
    /// Function type.
    Fun(Vec<Type>, Box<Type>),
    /// Universal quantification.
    Forall(Vec<u32>, Box<Type>),
}

impl Type {
    /// Builtin `unit` type.
    pub const UNIT: Type = Type::Con(Name::local(Symbol::UNIT));
    /// Builtin `bool` type.
    pub const BOOL: Type = Type::Con(Name::local(Symbol::BOOL));
    /// Builtin `int` type.
    pub const INT: Type = Type::Con(Name::local(Symbol::INT));
    /// Builtin `float` type.
    pub const FLOAT: Type = Type::Con(Name::local(Symbol::FLOAT));
    /// Builtin `char` type.
    pub const CHAR: Type = Type::Con(Name::local(Symbol::CHAR));
    /// Builtin `string` type.
    pub const STRING: Type = Type::Con(Name::local(Symbol::STRING));
    /// The reuse-token type.
    pub const REUSE: Type = Type::Con(Name::local(Symbol::REUSE));

    /// Function type constructor.
    pub fn fun(params: Vec<Type>, result: Type) -> Type {
        Type::Fun(params, Box::new(result))
    }

    /// Resolve the head type constructor through applications and
    /// quantifiers. `None` when the head is a type variable or a
    /// function type.
    pub fn head_con(&self) -> Option<Name> {
        match self {
            Type::Con(name) => Some(*name),
            Type::App(head, _) => head.head_con(),
            Type::Forall(_, body) => body.head_con(),
            Type::Var(_) | Type::Fun(..) => None,
        }
    }

    /// Strip universal quantifiers.
    pub fn unquantify(&self) -> &Type {
        match self {
            Type::Forall(_, body) => body.unquantify(),
            other => other,
        }
    }

    /// Instantiate a quantified type with the given type arguments.
    ///
    /// Arguments are matched to quantified variables positionally;
    /// unmatched variables stay as they are. Non-quantified types are
    /// returned unchanged (the application is a no-op).
    pub fn instantiate(&self, targs: &[Type]) -> Type {
        match self {
            Type::Forall(vars, body) => {
                let map: FxHashMap<u32, &Type> =
                    vars.iter().copied().zip(targs.iter()).collect();
                body.subst_vars(&map)
            }
            other => other.clone(),
        }
    }

    fn subst_vars(&self, map: &FxHashMap<u32, &Type>) -> Type {
        match self {
            Type::Con(name) => Type::Con(*name),
            Type::Var(v) => match map.get(v) {
                Some(t) => (*t).clone(),
                None => Type::Var(*v),
            },
            Type::App(head, args) => Type::App(
                Box::new(head.subst_vars(map)),
                args.iter().map(|t| t.subst_vars(map)).collect(),
            ),
            Type::Fun(params, result) => Type::Fun(
                params.iter().map(|t| t.subst_vars(map)).collect(),
                Box::new(result.subst_vars(map)),
            ),
            Type::Forall(vars, body) => {
                // Inner quantifiers shadow outer substitutions.
                let inner: FxHashMap<u32, &Type> = map
                    .iter()
                    .filter(|&(v, _)| !vars.contains(v))
                    .map(|(v, t)| (*v, *t))
                    .collect();
                Type::Forall(vars.clone(), Box::new(body.subst_vars(&inner)))
            }
        }
    }
}
