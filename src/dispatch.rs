//! The Tag Dispatcher (C4, `spec.md` §4.4): the translator's recursive
//! entry point.
//!
//! Grounded on `other_examples` BugStalker `type.rs`'s `TypeParser::parse_inner`
//! (tag dispatch via one `match` over a closed tag set) and `spec.md` §9's
//! "tagged variant plus exhaustive matching, not open polymorphism" note.

use gimli::constants;

use crate::attr;
use crate::builders;
use crate::die::{AttrValue, Die, DieIndex, FilenameFilter, ProgramContext};
use crate::error::{Error, Result};
use crate::interner::InternedType;
use crate::lang::{language_from_dwarf, Language};
use crate::types::QualifiedType;

/// `(type, qualifiers, is_incomplete_array)`, folded into `(QualifiedType,
/// bool)` since `QualifiedType` already carries the qualifier set.
pub type Resolved = (QualifiedType, bool);

/// Resolves `die` to a type, per `spec.md` §4.4.
///
/// `can_be_incomplete_array` is the caller's policy on whether an
/// incomplete array is an acceptable answer; it only actually changes
/// behavior for `DW_TAG_array_type` (§4.8.3) and is otherwise threaded
/// through qualifier/typedef wrappers unchanged.
pub fn resolve<'a, D, Idx, Prog, Filt>(
    cache: &mut crate::cache::Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    can_be_incomplete_array: bool,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    if let Some(hit) = cache.lookup_interned(die.id(), can_be_incomplete_array) {
        tracing::trace!(die = die.id().0, "interner hit");
        return Ok((
            QualifiedType::new(hit.ty, hit.qualifiers),
            hit.is_incomplete_array,
        ));
    }

    let language = die_language(die, cache.default_language());

    cache.enter_recursion()?;
    tracing::trace!(die = die.id().0, tag = %die.tag(), "resolving");
    let result = dispatch_tag(cache, die, can_be_incomplete_array, language);
    cache.exit_recursion();

    let (qualified, is_incomplete_array) = result?;
    cache.insert_interned(
        die.id(),
        can_be_incomplete_array,
        InternedType {
            ty: qualified.ty,
            qualifiers: qualified.qualifiers,
            is_incomplete_array,
        },
    )?;
    Ok((qualified, is_incomplete_array))
}

fn dispatch_tag<'a, D, Idx, Prog, Filt>(
    cache: &mut crate::cache::Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    can_be_incomplete_array: bool,
    language: Language,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    let tag = die.tag();
    match tag {
        constants::DW_TAG_const_type => {
            builders::base::build_qualifier(cache, die, can_be_incomplete_array, QUAL_CONST, language)
        }
        constants::DW_TAG_volatile_type => builders::base::build_qualifier(
            cache,
            die,
            can_be_incomplete_array,
            QUAL_VOLATILE,
            language,
        ),
        constants::DW_TAG_restrict_type => builders::base::build_qualifier(
            cache,
            die,
            can_be_incomplete_array,
            QUAL_RESTRICT,
            language,
        ),
        constants::DW_TAG_atomic_type => {
            builders::base::build_qualifier(cache, die, can_be_incomplete_array, QUAL_ATOMIC, language)
        }
        constants::DW_TAG_base_type => builders::base::build_base_type(cache, die, language),
        constants::DW_TAG_structure_type => {
            builders::compound::build(cache, die, crate::types::CompoundKind::Struct, language)
        }
        constants::DW_TAG_union_type => {
            builders::compound::build(cache, die, crate::types::CompoundKind::Union, language)
        }
        constants::DW_TAG_class_type => {
            builders::compound::build(cache, die, crate::types::CompoundKind::Class, language)
        }
        constants::DW_TAG_enumeration_type => builders::enumtype::build(cache, die, language),
        constants::DW_TAG_typedef => builders::composite::build_typedef(cache, die, language),
        constants::DW_TAG_pointer_type => builders::composite::build_pointer(cache, die, language),
        constants::DW_TAG_array_type => {
            builders::composite::build_array(cache, die, can_be_incomplete_array, language)
        }
        constants::DW_TAG_subroutine_type | constants::DW_TAG_subprogram => {
            builders::composite::build_function(cache, die, language)
        }
        other => Err(Error::unknown_tag(other)),
    }
}

pub(crate) const QUAL_CONST: crate::types::Qualifiers = crate::types::Qualifiers::CONST;
pub(crate) const QUAL_RESTRICT: crate::types::Qualifiers = crate::types::Qualifiers::RESTRICT;
pub(crate) const QUAL_VOLATILE: crate::types::Qualifiers = crate::types::Qualifiers::VOLATILE;
pub(crate) const QUAL_ATOMIC: crate::types::Qualifiers = crate::types::Qualifiers::ATOMIC;

/// Resolves a child `DW_AT_type` reference, treating a missing attribute as
/// `void` when `allow_missing_as_void` is set (`spec.md` §4.4: "Missing
/// `DW_AT_type` on a child-type resolver is treated as void when the
/// caller allows it; otherwise it is a hard error").
pub(crate) fn resolve_child_type<'a, D, Idx, Prog, Filt>(
    cache: &mut crate::cache::Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    can_be_incomplete_array: bool,
    allow_missing_as_void: bool,
    language: Language,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    match attr::reference(die, constants::DW_AT_type)? {
        Some(child) => resolve(cache, child, can_be_incomplete_array),
        None if allow_missing_as_void => Ok((cache.void(language), false)),
        None => Err(Error::invalid_attribute("DW_AT_type")),
    }
}

/// Derives a DIE's source-language tag: its own `DW_AT_language` if present
/// (rare outside compilation-unit DIEs), else the program's default
/// (`spec.md` §4.4 step 2).
pub(crate) fn die_language<'a, D: Die<'a>>(die: D, default: Language) -> Language {
    match die.attr(constants::DW_AT_language) {
        Some(AttrValue::Language(lang)) => language_from_dwarf(lang),
        _ => default,
    }
}
