//! Data-type representation registry.
//!
//! Maps type-constructor names to their runtime representation. The
//! essential bit for reference counting is whether a data type is a
//! pure value (no pointer fields, `scan == 0`) or carries heap
//! references. The registry is produced by earlier compiler stages and
//! is read-only here; it is expected to be complete — an unresolved
//! constructor name is a compiler bug, not a user error.

use rustc_hash::FxHashMap;

use crate::{Name, Symbol};

/// Runtime representation of a single constructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConRepr {
    /// Nullary constructor; allocates nothing.
    Const,
    /// Constructor of a value type; fields are stored unboxed.
    Value,
    /// Heap-allocated constructor.
    Boxed,
}

impl ConRepr {
    /// Whether constructing this shape performs no heap allocation.
    #[inline]
    pub const fn is_value(self) -> bool {
        matches!(self, ConRepr::Const | ConRepr::Value)
    }
}

/// Runtime representation of a data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataRepr {
    /// Value type: `raw` machine words of raw data followed by `scan`
    /// pointer fields. `scan == 0` means no reference-count traffic.
    Value { raw: u32, scan: u32 },
    /// Heap-allocated data type.
    Boxed,
}

/// Registry entry for one data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataInfo {
    pub repr: DataRepr,
}

impl DataInfo {
    pub const fn new(repr: DataRepr) -> Self {
        DataInfo { repr }
    }
}

/// Read-only map from type-constructor name to its representation.
#[derive(Clone, Debug, Default)]
pub struct Newtypes {
    map: FxHashMap<Name, DataInfo>,
}

impl Newtypes {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the builtin types.
    ///
    /// The machine-word builtins are value types with no pointer
    /// fields; `string` is heap-allocated; the reuse token is an
    /// opaque machine word.
    pub fn with_builtins() -> Self {
        let mut nt = Self::new();
        let value = |raw| DataInfo::new(DataRepr::Value { raw, scan: 0 });
        nt.insert(Name::local(Symbol::UNIT), value(0));
        nt.insert(Name::local(Symbol::BOOL), value(1));
        nt.insert(Name::local(Symbol::INT), value(1));
        nt.insert(Name::local(Symbol::FLOAT), value(1));
        nt.insert(Name::local(Symbol::CHAR), value(1));
        nt.insert(Name::local(Symbol::REUSE), value(1));
        nt.insert(Name::local(Symbol::STRING), DataInfo::new(DataRepr::Boxed));
        nt
    }

    /// Register a data type.
    pub fn insert(&mut self, name: Name, info: DataInfo) {
        self.map.insert(name, info);
    }

    /// Look up a type constructor. `None` indicates an incomplete
    /// registry, which callers treat as fatal.
    pub fn lookup(&self, name: Name) -> Option<&DataInfo> {
        self.map.get(&name)
    }
}
