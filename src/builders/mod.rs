//! Tag-specific type builders (C5–C8, `spec.md` §4.5–§4.8).
//!
//! Each module owns one family of `DW_TAG_*` handling; `dispatch.rs` is the
//! only caller.

pub mod base;
pub mod composite;
pub mod compound;
pub mod enumtype;

use crate::cache::Cache;
use crate::die::{Die, DieIndex, FilenameFilter, ProgramContext};

/// Searches the external Index for the unique non-declaration DIE tagged
/// `tag` with name `tag_name`. `spec.md` §4.6 step 2: "zero matches or
/// multiple matches" both fall through to an incomplete type; only an
/// exact, unambiguous single hit lets the caller substitute the complete
/// definition. Per `spec.md` §7, this ambiguity is represented internally
/// as the `Stop` sentinel and never surfaces to the caller as a visible
/// error — here that's simply `None`.
pub(crate) fn find_unique_definition<'a, D, Idx, Prog, Filt>(
    cache: &Cache<'a, D, Idx, Prog, Filt>,
    tag_name: &str,
    tag: gimli::DwTag,
) -> Option<D>
where
    D: Die<'a>,
    Idx: DieIndex<'a, D>,
    Prog: ProgramContext,
    Filt: FilenameFilter<'a, D>,
{
    let mut matches = cache.index().iterate(tag_name, &[tag]);
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.0)
}
