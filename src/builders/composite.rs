//! Typedef, pointer, array, and function/subprogram assembly (C8,
//! `spec.md` §4.8).
//!
//! Grounded on `DanielT-a2ltool` `typereader.rs::get_array_type` for the
//! subrange-dimension collection and the `DW_AT_upper_bound == -1` GCC
//! idiom, and on `other_examples` BugStalker `type.rs`'s parameter-list
//! walk for the formal-parameter/variadic handling.

use gimli::constants;
use smallvec::SmallVec;

use crate::attr;
use crate::cache::Cache;
use crate::die::{Die, DieIndex, FilenameFilter, ProgramContext};
use crate::dispatch::{self, Resolved};
use crate::error::{Error, Result};
use crate::lang::Language;
use crate::thunk::LazyType;
use crate::types::{Parameter, QualifiedType, TypeId, TypeNode};

/// `DW_TAG_typedef` (§4.8.1): requires `DW_AT_name`; propagates the child's
/// *is-incomplete-array* flag unchanged.
pub fn build_typedef<'a, D, Idx, Prog, Filt>(
    cache: &mut Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    language: Language,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    let name = attr::string(die, constants::DW_AT_name)?
        .ok_or_else(|| Error::invalid_attribute("DW_AT_name"))?;
    let (aliased, is_incomplete_array) =
        dispatch::resolve_child_type(cache, die, true, true, language)?;
    let ty = cache.push_type(TypeNode::Typedef {
        name,
        aliased,
        language,
    });
    Ok((QualifiedType::unqualified(ty), is_incomplete_array))
}

/// `DW_TAG_pointer_type` (§4.8.2): the referenced type may be void; size
/// comes from `DW_AT_byte_size`, falling back to the program's word size.
pub fn build_pointer<'a, D, Idx, Prog, Filt>(
    cache: &mut Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    language: Language,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    let (referenced, _) = dispatch::resolve_child_type(cache, die, false, true, language)?;
    let byte_size = attr::udata(die, constants::DW_AT_byte_size)?
        .unwrap_or_else(|| cache.word_size() as u64);
    let ty = cache.push_type(TypeNode::Pointer {
        referenced,
        byte_size,
        language,
    });
    Ok((QualifiedType::unqualified(ty), false))
}

enum Dimension {
    Incomplete,
    Known(u64),
}

/// `DW_TAG_array_type` (§4.8.3).
pub fn build_array<'a, D, Idx, Prog, Filt>(
    cache: &mut Cache<'a, D, Idx, Prog, Filt>,
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
    let (element, _) = dispatch::resolve_child_type(cache, die, false, true, language)?;

    let mut dimensions: SmallVec<[Dimension; 2]> = die
        .children()
        .filter(|child| child.tag() == constants::DW_TAG_subrange_type)
        .map(|child| subrange_dimension(child))
        .collect::<Result<_>>()?;

    if dimensions.is_empty() {
        dimensions.push(Dimension::Incomplete);
    }

    // Build innermost dimension outward: the last entry in source order is
    // innermost (closest to the element type), the first is outermost.
    let mut current = element;
    let last = dimensions.len() - 1;
    let mut outermost_incomplete = false;
    for (i, dimension) in dimensions.into_iter().enumerate().rev() {
        let is_outermost = i == 0;
        let (length, complete) = match dimension {
            Dimension::Known(n) => (Some(n), true),
            Dimension::Incomplete => {
                if is_outermost {
                    outermost_incomplete = true;
                    if can_be_incomplete_array {
                        (None, false)
                    } else {
                        (Some(0), true)
                    }
                } else {
                    // Non-outermost incomplete dimensions have no legal
                    // DWARF encoding in practice; treat as length zero.
                    (Some(0), true)
                }
            }
        };
        let ty = cache.push_type(TypeNode::Array {
            element: current,
            length,
            complete,
            language,
        });
        current = QualifiedType::unqualified(ty);
        let _ = last;
    }

    Ok((current, outermost_incomplete))
}

fn subrange_dimension<'a, D: Die<'a>>(die: D) -> Result<Dimension> {
    if let Some(count) = attr::udata(die, constants::DW_AT_count)? {
        return Ok(Dimension::Known(count));
    }
    match attr::sdata(die, constants::DW_AT_upper_bound)? {
        None => {
            if attr::udata(die, constants::DW_AT_upper_bound)?.is_none() {
                Ok(Dimension::Incomplete)
            } else {
                unreachable!("udata succeeded where sdata returned None")
            }
        }
        Some(-1) => Ok(Dimension::Known(0)),
        Some(upper_bound) => {
            let upper_bound = u64::try_from(upper_bound)
                .map_err(|_| Error::invalid_attribute("DW_AT_upper_bound"))?;
            upper_bound
                .checked_add(1)
                .map(Dimension::Known)
                .ok_or_else(|| Error::overflow("DW_AT_upper_bound"))
        }
    }
}

/// `DW_TAG_subroutine_type` / `DW_TAG_subprogram` (§4.8.4).
pub fn build_function<'a, D, Idx, Prog, Filt>(
    cache: &mut Cache<'a, D, Idx, Prog, Filt>,
    die: D,
    language: Language,
) -> Result<Resolved>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    let mut parameters = SmallVec::new();
    let mut variadic = false;

    for child in die.children() {
        match child.tag() {
            constants::DW_TAG_formal_parameter => {
                if variadic {
                    return Err(Error::invalid_argument(
                        "formal parameter after unspecified_parameters",
                    ));
                }
                let name = attr::string(child, constants::DW_AT_name)?;
                // As in `compound::parse_member`, the thunk resolves the
                // parameter's type target, not the formal_parameter DIE.
                let ty = match attr::reference(child, constants::DW_AT_type)? {
                    Some(target) => LazyType::new(target, false),
                    None => LazyType::immediate(cache.void(language)),
                };
                parameters.push(Parameter { name, ty });
            }
            constants::DW_TAG_unspecified_parameters => {
                if variadic {
                    return Err(Error::invalid_argument(
                        "multiple unspecified_parameters children",
                    ));
                }
                variadic = true;
            }
            _ => {}
        }
    }

    let (return_type, _) = dispatch::resolve_child_type(cache, die, false, true, language)?;

    let ty = cache.push_type(TypeNode::Function {
        return_type,
        parameters,
        variadic,
        language,
    });
    Ok((QualifiedType::unqualified(ty), false))
}

/// Resolves the byte size of an already-built type node, used by the
/// compound builder's legacy `DW_AT_bit_offset` little-endian adjustment
/// when a member has no `DW_AT_byte_size` of its own (`spec.md` §4.6).
/// Returns `None` for types with no fixed size (incomplete arrays,
/// functions).
pub(crate) fn type_byte_size<'a, D: Die<'a>>(
    arena: &crate::arena::Arena<'a, D>,
    id: TypeId,
    word_size: u8,
) -> Option<u64> {
    match arena.get(id) {
        TypeNode::Void { .. } => None,
        TypeNode::Int { byte_size, .. }
        | TypeNode::Bool { byte_size, .. }
        | TypeNode::Float { byte_size, .. }
        | TypeNode::Complex { byte_size, .. } => Some(*byte_size),
        TypeNode::Pointer { byte_size, .. } => Some(*byte_size),
        TypeNode::Array {
            element,
            length: Some(length),
            complete: true,
            ..
        } => type_byte_size(arena, element.ty, word_size).map(|elem| elem * length),
        TypeNode::Array { .. } => None,
        TypeNode::Typedef { aliased, .. } => type_byte_size(arena, aliased.ty, word_size),
        TypeNode::Compound {
            byte_size,
            complete: true,
            ..
        } => Some(*byte_size),
        TypeNode::Compound { .. } => None,
        TypeNode::Enum { compatible_type, .. } => type_byte_size(arena, *compatible_type, word_size),
        TypeNode::Function { .. } => Some(word_size as u64),
    }
}
