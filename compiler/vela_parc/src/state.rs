//! Analysis state for the reference-counting traversal.
//!
//! Two sets drive every insertion decision:
//!
//! - the **owned set** — names the current enclosing binder has the
//!   right to consume. A stacked context: replaced or extended on
//!   entry to a scope, restored on exit.
//! - the **live set** — names still needed by the part of the
//!   traversal already visited (code downstream in evaluation order,
//!   since the traversal is reversed). A single mutable cell.
//!
//! All scoping combinators save the prior state, run the body, and
//! restore unconditionally — the restore happens whether the body
//! produced a value or an error, so a failing traversal never leaks
//! scope state into its caller.

use std::fmt;

use rustc_hash::FxHashSet;

use vela_ir::{Name, Newtypes, StringInterner, Symbol, TName, Type};

use crate::classify::{Classifier, UnknownTypeCon};
use crate::RcClass;

/// Set of typed names.
pub type TNameSet = FxHashSet<TName>;

/// Fatal internal error raised by the pass.
///
/// Every variant corresponds to a compiler bug (a broken invariant or
/// an incomplete earlier stage), never to a user error. The definition
/// chain names where the traversal was when the invariant broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcError {
    /// A referenced type constructor has no registry entry.
    MissingDataInfo { type_con: String, def_chain: String },
    /// A recursive definition group in an expression-level let.
    RecursiveLet { def_chain: String },
    /// A lambda's free-variable set disagreed with the liveness
    /// computed for its body.
    CaptureMismatch {
        captured: Vec<String>,
        live: Vec<String>,
        def_chain: String,
    },
}

impl fmt::Display for ParcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParcError::MissingDataInfo {
                type_con,
                def_chain,
            } => write!(
                f,
                "no data info for type constructor `{type_con}` (while transforming {def_chain})"
            ),
            ParcError::RecursiveLet { def_chain } => write!(
                f,
                "recursive let at expression level (while transforming {def_chain})"
            ),
            ParcError::CaptureMismatch {
                captured,
                live,
                def_chain,
            } => write!(
                f,
                "lambda captures {captured:?} do not match body liveness {live:?} \
                 (while transforming {def_chain})"
            ),
        }
    }
}

impl std::error::Error for ParcError {}

/// Result of a pass operation.
pub type ParcResult<T> = Result<T, ParcError>;

/// Deterministic iteration order over a name set.
///
/// Hash sets iterate in arbitrary order; emitted `dup`/`drop`
/// sequences must not depend on it.
pub fn ordered(set: &TNameSet) -> Vec<&TName> {
    let mut names: Vec<&TName> = set.iter().collect();
    names.sort();
    names
}

/// Traversal context for one program.
///
/// Created per [`parc_core`](crate::parc_core) call; the owned and
/// live sets are reset per top-level definition by the driver.
pub struct Parc<'a> {
    classifier: Classifier<'a>,
    interner: &'a StringInterner,
    uniq: &'a mut u64,
    owned: TNameSet,
    live: TNameSet,
    /// Enclosing definition names, outermost first. Trace context for
    /// fatal errors.
    current: Vec<Name>,
}

impl<'a> Parc<'a> {
    /// Create a context over the given registry and interner.
    pub fn new(
        newtypes: &'a Newtypes,
        interner: &'a StringInterner,
        uniq: &'a mut u64,
    ) -> Self {
        Self {
            classifier: Classifier::new(newtypes),
            interner,
            uniq,
            owned: TNameSet::default(),
            live: TNameSet::default(),
            current: Vec::new(),
        }
    }

    /// The underlying type classifier.
    pub fn classifier(&self) -> &Classifier<'a> {
        &self.classifier
    }

    /// The identifier interner.
    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Classify a type, promoting an unresolved constructor to a fatal
    /// error at the current definition.
    pub fn classify(&self, ty: &Type) -> ParcResult<RcClass> {
        self.classifier
            .classify(ty)
            .map_err(|e| self.missing_data_info(e))
    }

    /// Generate a fresh local identifier `{base}{k}`.
    pub fn fresh_name(&mut self, base: &str) -> Symbol {
        let k = *self.uniq;
        *self.uniq += 1;
        self.interner.intern(&format!("{base}{k}"))
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Whether the current scope may consume `name`.
    pub fn is_owned(&self, name: &TName) -> bool {
        self.owned.contains(name)
    }

    /// Whether `name` is still needed downstream.
    pub fn is_live(&self, name: &TName) -> bool {
        self.live.contains(name)
    }

    /// Whether `name` has no downstream use.
    pub fn is_dead(&self, name: &TName) -> bool {
        !self.is_live(name)
    }

    /// Snapshot of the current live set.
    pub fn live_snapshot(&self) -> TNameSet {
        self.live.clone()
    }

    // ── Live set updates ────────────────────────────────────────

    /// Mark `name` live. Qualified names are globally allocated and
    /// never enter the live set.
    pub fn mark_live(&mut self, name: &TName) {
        if !name.name.is_qualified() {
            self.live.insert(name.clone());
        }
    }

    /// Mark every name in `names` live.
    pub fn mark_lives(&mut self, names: &TNameSet) {
        for name in names {
            self.mark_live(name);
        }
    }

    /// Remove `names` from the live set (leaving a binding scope).
    pub fn forget(&mut self, names: &TNameSet) {
        for name in names {
            self.live.remove(name);
        }
    }

    // ── Scoped state ────────────────────────────────────────────

    /// Run `f` with the owned set replaced by `owned`.
    pub fn with_owned<T>(&mut self, owned: TNameSet, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.owned, owned);
        let result = f(self);
        self.owned = saved;
        result
    }

    /// Run `f` with the owned set extended by `extra`.
    pub fn extend_owned<T>(&mut self, extra: &TNameSet, f: impl FnOnce(&mut Self) -> T) -> T {
        let mut extended = self.owned.clone();
        extended.extend(extra.iter().cloned());
        self.with_owned(extended, f)
    }

    /// Extend the owned set for `f`, then forget `vars` afterwards.
    pub fn scoped<T>(&mut self, vars: &TNameSet, f: impl FnOnce(&mut Self) -> T) -> T {
        let result = self.extend_owned(vars, f);
        self.forget(vars);
        result
    }

    /// Run `f`, capture the live set it produces, and restore the
    /// caller's live set. Used to analyze a sibling whose liveness
    /// must not influence the caller.
    pub fn isolated<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> (T, TNameSet) {
        let saved = self.live.clone();
        let result = f(self);
        let after = std::mem::replace(&mut self.live, saved);
        (result, after)
    }

    /// Run `f` with the live set seeded to `live`, returning its
    /// result and the live set it produced; the caller's live set is
    /// restored.
    pub fn isolate_with<T>(
        &mut self,
        live: TNameSet,
        f: impl FnOnce(&mut Self) -> T,
    ) -> (T, TNameSet) {
        let saved = std::mem::replace(&mut self.live, live);
        let result = f(self);
        let after = std::mem::replace(&mut self.live, saved);
        (result, after)
    }

    // ── Definition context & errors ─────────────────────────────

    /// Push a definition onto the trace context.
    pub fn enter_def(&mut self, name: Name) {
        self.current.push(name);
    }

    /// Pop the innermost definition.
    pub fn leave_def(&mut self) {
        self.current.pop();
    }

    /// The enclosing definition chain, outermost first.
    pub fn def_chain(&self) -> String {
        if self.current.is_empty() {
            return String::from("<top>");
        }
        let mut out = String::new();
        for (i, name) in self.current.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&self.name_to_string(*name));
        }
        out
    }

    pub(crate) fn missing_data_info(&self, err: UnknownTypeCon) -> ParcError {
        ParcError::MissingDataInfo {
            type_con: self.name_to_string(err.0),
            def_chain: self.def_chain(),
        }
    }

    pub(crate) fn recursive_let(&self) -> ParcError {
        ParcError::RecursiveLet {
            def_chain: self.def_chain(),
        }
    }

    pub(crate) fn capture_mismatch(&self, captured: &TNameSet, live: &TNameSet) -> ParcError {
        ParcError::CaptureMismatch {
            captured: self.name_set_to_strings(captured),
            live: self.name_set_to_strings(live),
            def_chain: self.def_chain(),
        }
    }

    fn name_to_string(&self, name: Name) -> String {
        if name.is_qualified() {
            format!(
                "{}/{}",
                self.interner.lookup(name.module),
                self.interner.lookup(name.ident)
            )
        } else {
            self.interner.lookup(name.ident).to_owned()
        }
    }

    fn name_set_to_strings(&self, names: &TNameSet) -> Vec<String> {
        ordered(names)
            .into_iter()
            .map(|n| self.name_to_string(n.name))
            .collect()
    }
}
