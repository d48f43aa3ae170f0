//! Deferred evaluation of a child DIE's type (`spec.md` §4.2).
//!
//! A [`LazyType`] captures the *target* type DIE to resolve (already
//! indirected through the owning member/parameter's `DW_AT_type`, or absent
//! entirely for an [`LazyType::immediate`] value such as a parameterless
//! `void`) plus the "can be incomplete array" policy it should be resolved
//! under. It does *not* capture a back-reference to the cache, unlike the
//! source's mutable node graph: storing `&Cache` inside a value the cache's
//! own arena owns would be self-referential. Instead the cache is threaded
//! through [`LazyType::evaluate`] as an explicit argument — the same "parent
//! index known before children resolved" ordering `spec.md` §9 describes,
//! just without the back-pointer. This is recorded as an Open Question
//! resolution in `DESIGN.md`.
//!
//! Grounded on `symbolic-debuginfo/src/dwarf.rs`'s `LazyCell`-based
//! `get_unit` (compute once, cache the result, `std::cell::Cell`-backed
//! idempotence) adapted to per-member/per-parameter granularity.

use std::cell::RefCell;

use crate::die::Die;
use crate::error::Result;
use crate::types::QualifiedType;

/// The cached outcome of evaluating a [`LazyType`]: the resolved, qualified
/// type plus whether the outermost array dimension (if any) was left
/// incomplete, mirroring the Tag Dispatcher's `(type, qualifiers,
/// is_incomplete_array)` return shape (`spec.md` §4.4).
type Evaluated = (QualifiedType, bool);

/// A deferred type resolution for a member or parameter DIE.
///
/// Evaluated at most once; subsequent calls to [`LazyType::evaluate`]
/// return the cached result without re-invoking the dispatcher, per
/// `spec.md` §4.2 and the single-threaded cooperative-per-cache model of
/// §5 ("a thunk, once created, is evaluated at most once; concurrent
/// evaluation is impossible by the single-threaded invariant"). Only the
/// success value is cached: a failed resolution is not idempotent (the
/// caller sees a fresh error on each forced re-evaluation), which keeps
/// [`crate::error::Error`] free to carry a non-`Clone` boxed cause, as the
/// teacher's own error type does.
#[derive(Debug)]
pub struct LazyType<'a, D: Die<'a>> {
    die: Option<D>,
    can_be_incomplete_array: bool,
    cached: RefCell<Option<Evaluated>>,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a, D: Die<'a>> LazyType<'a, D> {
    /// Captures `die` — the member/parameter's *resolved* `DW_AT_type`
    /// target, not the member/parameter DIE itself — for later resolution
    /// under the given incomplete-array policy. Does not evaluate anything
    /// yet.
    pub fn new(die: D, can_be_incomplete_array: bool) -> Self {
        Self {
            die: Some(die),
            can_be_incomplete_array,
            cached: RefCell::new(None),
            _marker: std::marker::PhantomData,
        }
    }

    /// A thunk that is already resolved, for the case where there is no
    /// `DW_AT_type` to defer (e.g. a formal parameter or member with no
    /// type attribute, which `spec.md` §4.3 treats as `void`).
    pub fn immediate(value: QualifiedType) -> Self {
        Self {
            die: None,
            can_be_incomplete_array: false,
            cached: RefCell::new(Some((value, false))),
            _marker: std::marker::PhantomData,
        }
    }

    /// The captured target-type DIE, for callers that need to inspect it
    /// before forcing evaluation (e.g. the flexible-array-rule lookahead in
    /// `builders::compound`). `None` for a thunk built via
    /// [`LazyType::immediate`].
    pub fn die(&self) -> Option<D> {
        self.die
    }

    pub fn can_be_incomplete_array(&self) -> bool {
        self.can_be_incomplete_array
    }

    /// Forces evaluation via `resolve`, caching (and returning) the result.
    /// `resolve` is typically `dispatch::resolve`, passed in to avoid a
    /// circular module dependency between `thunk` and `dispatch`.
    ///
    /// Panics if called on an [`LazyType::immediate`] thunk with its cache
    /// cleared, which cannot happen: `immediate` pre-populates the cache and
    /// nothing ever clears it.
    pub fn evaluate(
        &self,
        resolve: impl FnOnce(D, bool) -> Result<Evaluated>,
    ) -> Result<Evaluated> {
        if let Some(cached) = *self.cached.borrow() {
            return Ok(cached);
        }
        let die = self
            .die
            .expect("a thunk with no cached value always has a die to resolve");
        let result = resolve(die, self.can_be_incomplete_array)?;
        *self.cached.borrow_mut() = Some(result);
        Ok(result)
    }
}
