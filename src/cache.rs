//! The per-program cache: owns the type arena, both interner maps, the
//! external DWARF index, and the recursion-depth counter (`spec.md` §3
//! "Lifecycle", §5).
//!
//! Grounded on `symbolic-debuginfo/src/dwarf.rs`'s `DwarfInfo`/
//! `DwarfDebugSession` split — a long-lived owner of parsed sections handed
//! out through a front-door object — generalized from a concrete `gimli`
//! instantiation to the `Die`/`DieIndex`/`ProgramContext`/`FilenameFilter`
//! trait seam of `die.rs`. `spec.md` §5: "concurrent calls against the same
//! cache are not supported" — `Cache` holds no internal synchronization and
//! is accessed through `&mut self`, so the borrow checker enforces this for
//! free rather than requiring an explicit `!Sync` marker.

use indexmap::IndexMap;

use crate::arena::Arena;
use crate::die::{Die, DieIndex, FilenameFilter, ProgramContext};
use crate::error::{Error, Result};
use crate::interner::{Interner, InternedType};
use crate::lang::Language;
use crate::types::{QualifiedType, TypeId, TypeNode};

/// The Tag Dispatcher's recursion-depth limit (`spec.md` §3 invariant 2).
pub const RECURSION_LIMIT: usize = 1000;

/// Owns everything a single program's type resolution needs.
///
/// One `Cache` per program (executable, shared object, core dump, or live
/// process); different caches are fully independent (`spec.md` §5).
pub struct Cache<'a, D, Idx, Prog, Filt>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    arena: Arena<'a, D>,
    interner: Interner,
    index: Idx,
    program: Prog,
    filter: Filt,
    recursion_depth: usize,
    void_cache: IndexMap<Language, TypeId>,
}

impl<'a, D, Idx, Prog, Filt> Cache<'a, D, Idx, Prog, Filt>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    pub fn new(index: Idx, program: Prog, filter: Filt) -> Self {
        Self {
            arena: Arena::new(),
            interner: Interner::new(),
            index,
            program,
            filter,
            recursion_depth: 0,
            void_cache: IndexMap::new(),
        }
    }

    pub fn arena(&self) -> &Arena<'a, D> {
        &self.arena
    }

    pub fn index(&self) -> &Idx {
        &self.index
    }

    pub fn program(&self) -> &Prog {
        &self.program
    }

    pub fn filter(&self) -> &Filt {
        &self.filter
    }

    pub fn word_size(&self) -> u8 {
        self.program.word_size()
    }

    pub fn default_language(&self) -> Language {
        self.program.default_language()
    }

    pub fn is_little_endian(&self) -> bool {
        self.program.is_little_endian()
    }

    pub(crate) fn lookup_interned(
        &self,
        id: crate::die::DieId,
        can_be_incomplete_array: bool,
    ) -> Option<InternedType> {
        self.interner.lookup(id, can_be_incomplete_array)
    }

    pub(crate) fn insert_interned(
        &mut self,
        id: crate::die::DieId,
        can_be_incomplete_array: bool,
        value: InternedType,
    ) -> Result<()> {
        self.interner.insert(id, can_be_incomplete_array, value)
    }

    pub(crate) fn push_type(&mut self, node: TypeNode<'a, D>) -> TypeId {
        self.arena.push(node)
    }

    /// `spec.md` §3 invariant 2: refuses entry beyond [`RECURSION_LIMIT`].
    pub(crate) fn enter_recursion(&mut self) -> Result<()> {
        if self.recursion_depth >= RECURSION_LIMIT {
            tracing::warn!(depth = self.recursion_depth, "recursion limit reached");
            return Err(Error::recursion_limit(RECURSION_LIMIT));
        }
        self.recursion_depth += 1;
        Ok(())
    }

    /// Decremented on all paths (`spec.md` §7: "cache remains usable
    /// afterward").
    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Returns (creating on first request) the singleton `Void` type for
    /// `language`. Void has no owning DIE, so it cannot be interned by DIE
    /// identity; this small per-language cache keeps repeated lookups from
    /// growing the arena unboundedly.
    pub fn void_type(&mut self, language: Language) -> TypeId {
        if let Some(id) = self.void_cache.get(&language) {
            return *id;
        }
        let id = self.arena.push(TypeNode::Void { language });
        self.void_cache.insert(language, id);
        id
    }

    pub fn void(&mut self, language: Language) -> QualifiedType {
        QualifiedType::unqualified(self.void_type(language))
    }
}
