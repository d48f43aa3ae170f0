//! Enumeration assembly (C7, `spec.md` §4.7).
//!
//! Grounded on BugStalker `type.rs::parse_enum` (enumerator collection by
//! walking `DW_TAG_enumerator` children) and `DanielT-a2ltool`
//! `typereader.rs::get_enumeration_type` (falling back to the underlying
//! type's size/signedness when `DW_AT_type`/`DW_AT_byte_size` is absent).

use gimli::constants;
use smallvec::SmallVec;

use super::find_unique_definition;
use crate::attr;
use crate::cache::Cache;
use crate::die::{AttrValue, Die, DieIndex, FilenameFilter, ProgramContext};
use crate::dispatch::{self, Resolved};
use crate::error::{Error, Result};
use crate::lang::Language;
use crate::types::{Enumerator, EnumeratorValue, QualifiedType, TypeNode};

pub fn build<'a, D, Idx, Prog, Filt>(
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
    let tag_name = attr::string(die, constants::DW_AT_name)?;
    let is_declaration = attr::flag(die, constants::DW_AT_declaration)?;

    if is_declaration {
        if let Some(name) = &tag_name {
            if let Some(complete_die) =
                find_unique_definition(cache, name, constants::DW_TAG_enumeration_type)
            {
                return dispatch::resolve(cache, complete_die, true);
            }
        }
        // Zero or multiple completing definitions: give up and return an
        // incomplete enum carrying just the tag name (spec.md §7: this is
        // the internal `Stop` sentinel, never surfaced to the caller).
        tracing::debug!(tag = ?tag_name, "no unique completing definition, building incomplete enum");
        let byte_size = attr::udata(die, constants::DW_AT_byte_size)?.unwrap_or(0);
        let compatible_type = fabricate_unknown_int(cache, byte_size, false, language);
        let ty = cache.push_type(TypeNode::Enum {
            tag: tag_name,
            compatible_type,
            enumerators: SmallVec::new(),
            complete: false,
            language,
        });
        return Ok((QualifiedType::unqualified(ty), false));
    }

    let mut enumerators = SmallVec::new();
    let mut any_negative = false;
    for child in die.children() {
        if child.tag() != constants::DW_TAG_enumerator {
            continue;
        }
        let name = attr::string(child, constants::DW_AT_name)?
            .ok_or_else(|| Error::invalid_attribute("DW_AT_name"))?;
        let value = match attr::attr(child, constants::DW_AT_const_value) {
            Some(AttrValue::Sdata(v)) => {
                if v < 0 {
                    any_negative = true;
                }
                EnumeratorValue::Signed(v)
            }
            Some(AttrValue::Udata(v)) => EnumeratorValue::Unsigned(v),
            Some(_) => return Err(Error::invalid_attribute("DW_AT_const_value")),
            None => return Err(Error::invalid_attribute("DW_AT_const_value")),
        };
        enumerators.push(Enumerator { name, value });
    }

    let compatible_type = match attr::reference(die, constants::DW_AT_type)? {
        Some(underlying) => {
            let (resolved, _) = dispatch::resolve(cache, underlying, false)?;
            match cache.arena().get(resolved.ty) {
                TypeNode::Int { .. } => resolved.ty,
                _ => return Err(Error::invalid_attribute("DW_AT_type")),
            }
        }
        None => {
            // Producer quirk: GCC sometimes omits DW_AT_type on an
            // enumeration; fabricate a compatible integer from
            // DW_AT_byte_size and the sign observed among enumerators.
            let byte_size = attr::udata(die, constants::DW_AT_byte_size)?
                .ok_or_else(|| Error::invalid_attribute("DW_AT_byte_size"))?;
            fabricate_unknown_int(cache, byte_size, any_negative, language)
        }
    };

    let ty = cache.push_type(TypeNode::Enum {
        tag: tag_name,
        compatible_type,
        enumerators,
        complete: true,
        language,
    });
    Ok((QualifiedType::unqualified(ty), false))
}

fn fabricate_unknown_int<'a, D, Idx, Prog, Filt>(
    cache: &mut Cache<'a, D, Idx, Prog, Filt>,
    byte_size: u64,
    signed: bool,
    language: Language,
) -> crate::types::TypeId
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    cache.push_type(TypeNode::Int {
        name: Some("<unknown>".to_string()),
        byte_size,
        signed,
        language,
    })
}
