//! Core IR for the Vela compiler.
//!
//! This crate defines the typed functional intermediate representation
//! shared by the middle-end passes, plus the small set of utilities
//! those passes require of it:
//!
//! - **Names** ([`Symbol`], [`Name`], [`TName`]) — interned identifiers
//!   with a qualified/local split; typed names pair an identifier with
//!   its type.
//! - **Types** ([`Type`]) — an explicit type tree with builtin
//!   constructors and quantifier instantiation.
//! - **Expressions** ([`Expr`], [`Def`], [`DefGroup`], [`Branch`],
//!   [`Guard`], [`Pattern`], [`Core`]) — lambdas, applications, lets,
//!   and multi-scrutinee pattern matches.
//! - **Data registry** ([`Newtypes`], [`DataInfo`], [`ConRepr`]) — the
//!   value-vs-heap representation of each data type.
//! - **Utilities** — free local variables ([`free_locals`]),
//!   occurrence substitution ([`substitute`]), statement sequencing
//!   ([`maybe_stats`]), and a compact pretty printer ([`pretty`]).
//!
//! No analysis logic lives here; passes such as reference-count
//! insertion consume this crate and return new trees.

mod data;
mod expr;
mod free_vars;
mod interner;
mod name;
pub mod pretty;
mod subst;
mod ty;

pub use data::{ConRepr, DataInfo, DataRepr, Newtypes};
pub use expr::{
    make_if, make_let, maybe_stats, Branch, Core, Def, DefGroup, Expr, Guard, Lit, Pattern, TName,
    VarInfo,
};
pub use free_vars::free_locals;
pub use interner::{InternError, StringInterner};
pub use name::{Name, Symbol};
pub use subst::{substitute, Subst};
pub use ty::Type;
