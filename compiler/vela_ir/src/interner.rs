//! String interner for identifiers.
//!
//! Provides O(1) interning and lookup. Interned strings are leaked so
//! lookups hand out `&'static str` without lifetime bookkeeping. A
//! single `RwLock` guards the table — the compiler passes consuming
//! this crate are single-threaded traversals, so the lock exists only
//! to allow interning through `&self`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Symbol;

/// Builtin identifiers pre-interned at fixed indices.
///
/// Order must match the `Symbol` constants in `name.rs`.
const BUILTINS: &[&str] = &[
    "unit",
    "bool",
    "int",
    "float",
    "char",
    "string",
    "reuse",
    "dup",
    "drop",
    "constructor_is_unique",
    "constructor_free",
    "drop_reuse_datatype",
    "no_reuse",
    "alloc_at",
];

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// The table exceeded capacity (over 4 billion strings).
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {count} strings, max is {}",
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Symbol::index()`.
    strings: Vec<&'static str>,
}

/// Interner for identifier strings.
///
/// Pre-interns the empty string at index 0 and the builtin identifiers
/// at the indices named by the `Symbol` constants.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with builtins pre-interned.
    pub fn new() -> Self {
        let mut table = InternTable {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        let empty: &'static str = "";
        table.map.insert(empty, 0);
        table.strings.push(empty);

        let interner = Self {
            table: RwLock::new(table),
        };
        for s in BUILTINS {
            interner.intern(s);
        }
        debug_assert_eq!(interner.lookup(Symbol::UNIT), "unit");
        debug_assert_eq!(interner.lookup(Symbol::ALLOC_AT), "alloc_at");
        interner
    }

    /// Try to intern a string, returning its `Symbol` or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Symbol, InternError> {
        // Fast path: already interned.
        {
            let guard = self.table.read();
            if let Some(&idx) = guard.map.get(s) {
                return Ok(Symbol::from_raw(idx));
            }
        }

        let mut guard = self.table.write();

        // Double-check after acquiring the write lock.
        if let Some(&idx) = guard.map.get(s) {
            return Ok(Symbol::from_raw(idx));
        }

        // Leak the string to get a 'static lifetime.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());

        let idx = u32::try_from(guard.strings.len()).map_err(|_| InternError::Overflow {
            count: guard.strings.len(),
        })?;
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Ok(Symbol::from_raw(idx))
    }

    /// Intern a string, returning its `Symbol`.
    ///
    /// # Panics
    /// Panics on table overflow (over 4 billion strings). Use
    /// [`try_intern`](Self::try_intern) for fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Symbol {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Look up the string for a `Symbol`.
    ///
    /// Interned strings are leaked, so the reference is `'static`.
    pub fn lookup(&self, sym: Symbol) -> &'static str {
        let guard = self.table.read();
        guard.strings[sym.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Whether only the pre-interned strings are present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1 + BUILTINS.len()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
