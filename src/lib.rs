//! Translates a DWARF debugging-information tree into a language-agnostic,
//! interned type graph, and resolves program objects (variables, functions,
//! enumerators) to typed, addressable values.
//!
//! This crate does not parse ELF/DWARF bytes itself, nor does it walk the
//! symbol index or read process/core-dump memory — those are external
//! collaborators, exposed here only as the trait seam in [`die`]. An
//! embedding debugger supplies a [`Cache`] with concrete implementations of
//! [`Die`], [`DieIndex`], [`ProgramContext`], and [`FilenameFilter`], then
//! calls [`find_type`]/[`find_object`] to resolve names to typed values.
//!
//! # Example flow
//!
//! 1. The embedder constructs a [`Cache`] over its DWARF index and program
//!    context.
//! 2. A lookup by name enters [`find_type`] or [`find_object`], which query
//!    the external index for candidate DIEs and filter by source filename.
//! 3. Each candidate is handed to the Tag Dispatcher ([`dispatch::resolve`]),
//!    which consults the interner, dispatches by `DW_TAG_*` to the
//!    appropriate builder, and installs the result before returning.

#![warn(missing_docs)]

pub mod arena;
pub mod attr;
pub mod builders;
pub mod cache;
pub mod die;
pub mod dispatch;
pub mod error;
pub mod interner;
pub mod lang;
pub mod object;
pub mod thunk;
pub mod types;

#[cfg(test)]
mod testutil;
#[cfg(test)]
mod scenario_tests;

pub use crate::cache::{Cache, RECURSION_LIMIT};
pub use crate::die::{AttrValue, Die, DieId, DieIndex, FilenameFilter, ProgramContext, UnitId};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::lang::{language_from_dwarf, Language};
pub use crate::object::{find_object, find_type, Object, ObjectKind, ObjectValue, TypeKind};
pub use crate::types::{
    CompoundKind, Enumerator, EnumeratorValue, Member, Parameter, QualifiedType, Qualifiers,
    TypeId, TypeNode,
};
