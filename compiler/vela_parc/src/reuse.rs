//! Keep/reuse emitters for match branches.
//!
//! Building blocks for the follow-on constructor-reuse pass: when a
//! branch is the last user of its scrutinee, the matched cell can
//! either be *kept* alive through its fields (dup the fields, drop the
//! cell) or offered for *reuse* (test uniqueness at runtime; a unique
//! cell's memory becomes a reuse token for a later allocation, a
//! shared cell falls back to the keep protocol with an empty token).
//!
//! Nothing in this crate invokes these yet — the decision logic for
//! choosing keep vs reuse vs plain drop at a match belongs to the
//! reuse pass. They are exported so that pass has the emission side
//! ready.

use smallvec::SmallVec;

use vela_ir::{make_if, make_let, maybe_stats, Def, DefGroup, Expr, Name, TName, Type};

use crate::prim::{drop_reuse_of, gen_drop, gen_dup, is_unique_of, no_reuse};
use crate::state::{Parc, ParcResult};

/// Keep the matched cell's fields past the cell itself: dup every
/// field the branch consumes, then drop the scrutinee, in front of
/// `body`.
pub fn gen_keep_match(
    ctx: &Parc<'_>,
    scrutinee: &TName,
    fields: &[TName],
    body: Expr,
) -> ParcResult<Expr> {
    let mut stmts: SmallVec<[Expr; 4]> = SmallVec::new();
    for field in fields {
        if let Some(d) = gen_dup(ctx, field)? {
            stmts.push(d);
        }
    }
    if let Some(d) = gen_drop(ctx, scrutinee)? {
        stmts.push(d);
    }
    Ok(maybe_stats(stmts.into_vec(), body))
}

/// Offer the matched cell for reuse: bind a fresh reuse token to
///
/// ```text
/// if constructor_is_unique(scrutinee)
///   then drop_reuse_datatype(scrutinee, current_context())
///   else { dup fields; drop(scrutinee); no_reuse() }
/// ```
///
/// in front of `body`. Returns the token's name so the caller can
/// thread it into an [`alloc_at`](crate::prim::alloc_at) allocation.
pub fn gen_reuse_match(
    ctx: &mut Parc<'_>,
    scrutinee: &TName,
    fields: &[TName],
    body: Expr,
) -> ParcResult<(TName, Expr)> {
    let token = TName::new(Name::local(ctx.fresh_name("reuse")), Type::REUSE);

    // Unique: the fields move out of the cell and its memory is handed
    // back as the token.
    let unique_path = drop_reuse_of(scrutinee);

    // Shared: the keep protocol, with an empty token.
    let mut shared: SmallVec<[Expr; 4]> = SmallVec::new();
    for field in fields {
        if let Some(d) = gen_dup(ctx, field)? {
            shared.push(d);
        }
    }
    if let Some(d) = gen_drop(ctx, scrutinee)? {
        shared.push(d);
    }
    let shared_path = maybe_stats(shared.into_vec(), no_reuse());

    let rhs = make_if(is_unique_of(scrutinee), unique_path, shared_path);
    let def = Def::new(token.name, Type::REUSE, rhs);
    Ok((
        token,
        make_let(vec![DefGroup::NonRec(def)], body),
    ))
}
