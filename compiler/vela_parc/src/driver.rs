//! Definition driver and pass entry points.
//!
//! Walks top-level definition groups in reverse (so a later
//! definition's uses are analyzed before an earlier definition's
//! body) and isolates each top-level definition's liveness so one
//! definition cannot bleed into another. Also owns the `KK_PARC`
//! enable flag.

use vela_ir::{pretty, Core, Def, DefGroup, Newtypes, StringInterner};

use crate::state::{Parc, ParcResult};
use crate::transform::parc_expr;

/// Transform one definition.
///
/// Top-level definitions run isolated; expression-level definitions
/// (from `let`) share the surrounding liveness so their uses flow
/// outward.
pub(crate) fn parc_def(ctx: &mut Parc<'_>, top: bool, def: Def) -> ParcResult<Def> {
    let Def { name, ty, expr } = def;
    ctx.enter_def(name);
    tracing::debug!(def = %ctx.def_chain(), top, "inserting reference counting");

    let result = if top {
        let (result, _live) = ctx.isolated(|ctx| parc_expr(ctx, expr));
        result
    } else {
        parc_expr(ctx, expr)
    };
    let result = result.map(|expr| {
        tracing::trace!(
            def = %ctx.def_chain(),
            body = %pretty::expr_to_string(&expr, ctx.interner()),
            "rewritten"
        );
        Def::new(name, ty, expr)
    });

    ctx.leave_def();
    result
}

/// Transform one definition group, defs in reverse.
pub(crate) fn parc_def_group(
    ctx: &mut Parc<'_>,
    top: bool,
    group: DefGroup,
) -> ParcResult<DefGroup> {
    match group {
        DefGroup::NonRec(def) => Ok(DefGroup::NonRec(parc_def(ctx, top, def)?)),
        DefGroup::Rec(defs) => {
            let mut out = Vec::with_capacity(defs.len());
            for def in defs.into_iter().rev() {
                out.push(parc_def(ctx, top, def)?);
            }
            out.reverse();
            Ok(DefGroup::Rec(out))
        }
    }
}

/// Transform all definition groups, groups in reverse.
pub(crate) fn parc_def_groups(
    ctx: &mut Parc<'_>,
    top: bool,
    groups: Vec<DefGroup>,
) -> ParcResult<Vec<DefGroup>> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups.into_iter().rev() {
        out.push(parc_def_group(ctx, top, group)?);
    }
    out.reverse();
    Ok(out)
}

/// Insert reference counting into a whole program, unconditionally.
pub fn parc_core(
    core: Core,
    newtypes: &Newtypes,
    interner: &StringInterner,
    uniq: &mut u64,
) -> ParcResult<Core> {
    let mut ctx = Parc::new(newtypes, interner, uniq);
    let defs = parc_def_groups(&mut ctx, true, core.defs)?;
    Ok(Core { defs })
}

/// Whether the pass is enabled via the `KK_PARC` environment variable.
///
/// Truthy values: `1`, `on`, `yes`, `true`, `y`, `t` (case-insensitive).
/// Read it once at startup and treat the result as a constant.
pub fn parc_enabled() -> bool {
    std::env::var("KK_PARC").ok().is_some_and(|v| {
        matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "on" | "yes" | "true" | "y" | "t"
        )
    })
}

/// Gated entry point: transform when enabled, otherwise return the
/// input unchanged.
pub fn run(
    core: Core,
    newtypes: &Newtypes,
    interner: &StringInterner,
    uniq: &mut u64,
) -> ParcResult<Core> {
    if parc_enabled() {
        parc_core(core, newtypes, interner, uniq)
    } else {
        Ok(core)
    }
}
