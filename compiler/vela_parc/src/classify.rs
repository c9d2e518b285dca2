//! Reference-counting type classifier.
//!
//! Resolves a type's head constructor through applications and
//! quantifiers and asks the newtypes registry whether the data type is
//! a pure value. Classification depends only on the head constructor,
//! so results are memoized per constructor name.
//!
//! Also provides the size accounting (`field_size`,
//! `constructor_size`) used by the reuse emitters: a pointer field
//! counts one word, an unboxed value field counts its full footprint.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use vela_ir::{ConRepr, DataRepr, Name, Newtypes, Type};

use crate::RcClass;

/// An unresolved type constructor.
///
/// The registry is expected to be complete at this stage; callers
/// treat this as a fatal internal error naming the current definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTypeCon(pub Name);

/// Type classifier backed by the newtypes registry.
///
/// Uses `RefCell` for the memo table because classification queries
/// take `&self`.
pub struct Classifier<'a> {
    newtypes: &'a Newtypes,
    cache: RefCell<FxHashMap<Name, RcClass>>,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over the given registry.
    pub fn new(newtypes: &'a Newtypes) -> Self {
        Self {
            newtypes,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Classify a type.
    ///
    /// A named type whose data definition is a value with zero pointer
    /// fields is [`RcClass::NoRc`]. Everything else — heap data types,
    /// value types with pointer fields, closures, unresolved type
    /// variables — is [`RcClass::Rc`].
    pub fn classify(&self, ty: &Type) -> Result<RcClass, UnknownTypeCon> {
        let mut t = ty;
        loop {
            match t {
                Type::App(head, _) => t = head,
                Type::Forall(_, body) => t = body,
                // Unresolvable type variable: conservative.
                Type::Var(_) => return Ok(RcClass::Rc),
                // Closures carry captured heap references.
                Type::Fun(..) => return Ok(RcClass::Rc),
                Type::Con(name) => return self.con_class(*name),
            }
        }
    }

    /// Whether values of `ty` need reference-count traffic.
    pub fn needs_rc(&self, ty: &Type) -> Result<bool, UnknownTypeCon> {
        Ok(self.classify(ty)? == RcClass::Rc)
    }

    /// The footprint of one constructor field in words: a value type
    /// contributes its raw plus scan words, anything else is a pointer.
    pub fn field_size(&self, ty: &Type) -> Result<u32, UnknownTypeCon> {
        let mut t = ty;
        loop {
            match t {
                Type::App(head, _) => t = head,
                Type::Forall(_, body) => t = body,
                Type::Var(_) | Type::Fun(..) => return Ok(1),
                Type::Con(name) => {
                    let info = self
                        .newtypes
                        .lookup(*name)
                        .ok_or(UnknownTypeCon(*name))?;
                    return Ok(match info.repr {
                        DataRepr::Value { raw, scan } => raw + scan,
                        DataRepr::Boxed => 1,
                    });
                }
            }
        }
    }

    /// Allocated size of a constructor application, in words.
    ///
    /// Value constructors and nullary constructors allocate nothing.
    pub fn constructor_size(
        &self,
        repr: ConRepr,
        params: &[Type],
    ) -> Result<u32, UnknownTypeCon> {
        if repr.is_value() || params.is_empty() {
            return Ok(0);
        }
        let mut size = 0;
        for ty in params {
            size += self.field_size(ty)?;
        }
        Ok(size)
    }

    fn con_class(&self, name: Name) -> Result<RcClass, UnknownTypeCon> {
        if let Some(&cached) = self.cache.borrow().get(&name) {
            return Ok(cached);
        }
        let info = self.newtypes.lookup(name).ok_or(UnknownTypeCon(name))?;
        let class = match info.repr {
            DataRepr::Value { scan: 0, .. } => RcClass::NoRc,
            // Value type with pointer fields, or heap-allocated.
            DataRepr::Value { .. } | DataRepr::Boxed => RcClass::Rc,
        };
        self.cache.borrow_mut().insert(name, class);
        Ok(class)
    }
}
