//! The "consumed from environment" interfaces of `spec.md` §6.
//!
//! This crate does not parse ELF/DWARF bytes itself; it operates on
//! whatever DIE representation the embedding debugger hands it. These
//! traits are that seam. A thin adapter from `gimli::read` types to [`Die`]
//! is the embedding application's concern (mirrors `symbolic-debuginfo`'s
//! `UnitRef`/`Die` type aliases in `dwarf.rs`, generalized away from a
//! concrete `gimli::EndianSlice` instantiation).

use std::borrow::Cow;

use crate::lang::Language;

/// Identifies a DIE uniquely within the owning cache, independent of any
/// particular `gimli` unit/offset representation.
///
/// The type interner (`spec.md` §4.1) keys its maps on this value: "for
/// every DIE address `d`" in the spec's invariant language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieId(pub u64);

/// Identifies the compilation unit containing a DIE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

/// A form-aware attribute value, shaped after `gimli::read::AttributeValue`
/// but reduced to the forms the Attribute Decoder (`spec.md` §4.3) needs to
/// distinguish.
#[derive(Clone, Debug)]
pub enum AttrValue<'a> {
    /// An unsigned integer (`udata`, `data1`/`data2`/`data4`/`data8`, or an
    /// implicit-const with a non-negative value).
    Udata(u64),
    /// A signed integer (`sdata`, or an implicit-const with a negative
    /// value).
    Sdata(i64),
    /// A `flag` attribute.
    Flag(bool),
    /// A `string`/`strp`/`line_strp`-shaped attribute.
    String(Cow<'a, str>),
    /// A reference to another DIE (`ref1`..`ref8`, `ref_addr`, `ref_sig8`).
    Reference(DieId),
    /// A raw byte block (`block`, `data16`).
    Block(&'a [u8]),
    /// A DWARF location expression (`exprloc`), not yet evaluated.
    Exprloc(&'a [u8]),
    /// An absolute address (`addr`).
    Addr(u64),
    /// A `DW_LANG_*` constant.
    Language(gimli::DwLang),
    /// A `DW_ATE_*` constant.
    Encoding(gimli::DwAte),
    /// A `DW_END_*` constant.
    Endianity(gimli::DwEnd),
}

/// A single DIE, as exposed by the embedding debugger's DWARF index.
///
/// Implementations are expected to be cheap to copy (typically a unit
/// reference plus an offset), matching the teacher's `Die<'d, 'u>` alias
/// over `gimli::read::DebuggingInformationEntry`.
pub trait Die<'a>: Copy {
    /// This DIE's tag (`DW_TAG_*`).
    fn tag(&self) -> gimli::DwTag;

    /// Looks up a single attribute by name, without following
    /// `DW_AT_specification`/`DW_AT_abstract_origin` indirection (that is
    /// the Attribute Decoder's job, see `attr.rs`).
    fn attr(&self, at: gimli::DwAt) -> Option<AttrValue<'a>>;

    /// Iterates this DIE's direct children, in source order (`spec.md` §3
    /// invariant 4: "members and parameters retain their source DIE
    /// order").
    fn children(&self) -> impl Iterator<Item = Self>;

    /// This DIE's stable identity, used as the interner key.
    fn id(&self) -> DieId;

    /// The compilation unit containing this DIE.
    fn unit_id(&self) -> UnitId;

    /// Follows a `DieId` obtained from an `AttrValue::Reference` (possibly
    /// in a different compilation unit) to the DIE it names.
    ///
    /// Grounded on `symbolic-debuginfo/src/dwarf.rs`'s
    /// `UnitRef::resolve_reference`, which performs the same `UnitRef` /
    /// `DebugInfoRef` cross-unit lookup before handing the caller a `Die`.
    fn resolve(&self, id: DieId) -> Option<Self>;
}

/// Program-wide facts the translator needs but does not compute itself:
/// word size (for pointer types missing `DW_AT_byte_size`), the default
/// source language (for DIEs with no `DW_AT_language` ancestor), and the
/// containing ELF's data encoding (the endianness fallback of `spec.md`
/// §4.3).
pub trait ProgramContext {
    /// Pointer/address size in bytes for this program.
    fn word_size(&self) -> u8;
    /// The language a DIE falls back to absent `DW_AT_language`.
    fn default_language(&self) -> Language;
    /// `true` if the containing ELF's `EI_DATA` is little-endian.
    fn is_little_endian(&self) -> bool;
}

/// Matches a DIE's containing compilation unit against a caller-supplied
/// filename filter. An empty filter matches every DIE (`spec.md` §6).
pub trait FilenameFilter<'a, D: Die<'a>> {
    /// Returns whether `die`'s compilation unit file path matches `filter`.
    fn matches(&self, die: D, filter: &str) -> bool;
}

/// The debug-info symbol index: `(name, tag_set) -> stream<(DIE, load_bias)>`,
/// returning only non-declaration definitions (`spec.md` §6).
pub trait DieIndex<'a, D: Die<'a>> {
    /// Iterates candidate DIEs matching `name` and one of `tags`, each
    /// paired with the load bias of the image that contains it.
    fn iterate(&self, name: &str, tags: &[gimli::DwTag]) -> Box<dyn Iterator<Item = (D, i64)> + 'a>;
}
