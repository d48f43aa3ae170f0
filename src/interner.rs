//! The Type Interner (C1, `spec.md` §4.1).
//!
//! Two associative maps keyed by DIE identity: the primary map (holds
//! whatever interpretation was built first) and the non-incomplete-array
//! map (holds the "reinterpreted as length-zero" variant for callers that
//! cannot accept an incomplete array). `spec.md` §8 invariant 1: resolving
//! the same DIE twice under the same `can_be_incomplete_array` policy must
//! return the same [`TypeId`].

use indexmap::IndexMap;

use crate::die::DieId;
use crate::error::{Error, Result};
use crate::types::{Qualifiers, TypeId};

/// The value stored per DIE: the constructed type, its qualifier overlay,
/// and whether it is (or aliases) an incomplete array.
#[derive(Clone, Copy, Debug)]
pub struct InternedType {
    pub ty: TypeId,
    pub qualifiers: Qualifiers,
    pub is_incomplete_array: bool,
}

/// The DIE-identity → type map described by `spec.md` §4.1.
#[derive(Debug, Default)]
pub struct Interner {
    primary: IndexMap<DieId, InternedType>,
    non_incomplete_array: IndexMap<DieId, InternedType>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            primary: IndexMap::new(),
            non_incomplete_array: IndexMap::new(),
        }
    }

    /// Implements the three-step lookup of `spec.md` §4.1: consult the
    /// primary map; if the caller disallows incomplete arrays and the hit
    /// is flagged as one, fall through to the secondary map; otherwise
    /// return the primary hit directly. Returns `None` only when neither
    /// map has an applicable entry (construction must proceed).
    pub fn lookup(&self, id: DieId, can_be_incomplete_array: bool) -> Option<InternedType> {
        let primary_hit = self.primary.get(&id).copied()?;
        if !can_be_incomplete_array && primary_hit.is_incomplete_array {
            return self.non_incomplete_array.get(&id).copied();
        }
        Some(primary_hit)
    }

    /// Inserts a freshly constructed type into whichever map matches
    /// `can_be_incomplete_array`.
    ///
    /// `spec.md` §9's open question on the source's
    /// `// TODO: reserve so this won't fail?` comment is resolved here as
    /// directed: no `reserve()`/`try_reserve()` call is attempted before
    /// inserting. Allocation exhaustion aborts the process via the global
    /// allocator, as in any other Rust collection insert; the
    /// [`Error::out_of_memory`] sentinel exists so callers that *do* learn
    /// of an allocation failure (e.g. through a fallible-allocation
    /// embedding) have somewhere to report it, matching `spec.md` §7's
    /// "Allocation failure returns the `OutOfMemory` sentinel and unwinds."
    pub fn insert(
        &mut self,
        id: DieId,
        can_be_incomplete_array: bool,
        value: InternedType,
    ) -> Result<()> {
        if can_be_incomplete_array {
            self.primary.insert(id, value);
        } else {
            self.non_incomplete_array.insert(id, value);
        }
        let _ = Error::out_of_memory; // sentinel retained for the fallible-allocation path
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ty: u32, incomplete: bool) -> InternedType {
        InternedType {
            ty: TypeId(ty),
            qualifiers: Qualifiers::NONE,
            is_incomplete_array: incomplete,
        }
    }

    #[test]
    fn repeated_lookup_same_policy_returns_same_id() {
        let mut interner = Interner::new();
        let id = DieId(42);
        interner.insert(id, true, entry(7, false)).unwrap();
        let a = interner.lookup(id, true).unwrap();
        let b = interner.lookup(id, true).unwrap();
        assert_eq!(a.ty, b.ty);
    }

    #[test]
    fn incomplete_array_falls_through_to_secondary_map() {
        let mut interner = Interner::new();
        let id = DieId(1);
        interner.insert(id, true, entry(1, true)).unwrap();
        assert!(interner.lookup(id, false).is_none());
        interner.insert(id, false, entry(2, false)).unwrap();
        let hit = interner.lookup(id, false).unwrap();
        assert_eq!(hit.ty, TypeId(2));
        let still_incomplete = interner.lookup(id, true).unwrap();
        assert_eq!(still_incomplete.ty, TypeId(1));
    }
}
