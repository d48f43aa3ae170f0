//! Source-language tagging for type-graph nodes.
//!
//! Mirrors `symbolic_common::Language`, narrowed to the values this crate
//! actually threads through the type graph (see `spec.md` §3's "language"
//! field on every node variant).

use std::fmt;

/// The source language a DIE (and the types derived from it) was compiled
/// from. Carried on every type-graph node per `spec.md` §3.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// No language could be determined.
    #[default]
    Unknown,
    /// C in any standard revision.
    C,
    /// C++ in any standard revision.
    Cpp,
    D,
    Go,
    ObjC,
    ObjCpp,
    Rust,
    Swift,
}

impl Language {
    /// A short, human-readable name, as `symbolic_common::Language::name`
    /// provides.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::D => "d",
            Self::Go => "go",
            Self::ObjC => "objc",
            Self::ObjCpp => "objcpp",
            Self::Rust => "rust",
            Self::Swift => "swift",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts a DWARF `DW_LANG_*` constant into our [`Language`] type.
///
/// Grounded on `symbolic-debuginfo/src/dwarf.rs::language_from_dwarf`,
/// extended with the three `DW_LANG_*` values the original source (drgn)
/// additionally recognizes.
pub fn language_from_dwarf(language: gimli::DwLang) -> Language {
    use gimli::constants::*;
    match language {
        DW_LANG_C => Language::C,
        DW_LANG_C89 => Language::C,
        DW_LANG_C99 => Language::C,
        DW_LANG_C11 => Language::C,
        DW_LANG_C17 => Language::C,
        DW_LANG_C_plus_plus => Language::Cpp,
        DW_LANG_C_plus_plus_03 => Language::Cpp,
        DW_LANG_C_plus_plus_11 => Language::Cpp,
        DW_LANG_C_plus_plus_14 => Language::Cpp,
        DW_LANG_C_plus_plus_17 => Language::Cpp,
        DW_LANG_C_plus_plus_20 => Language::Cpp,
        DW_LANG_D => Language::D,
        DW_LANG_Go => Language::Go,
        DW_LANG_ObjC => Language::ObjC,
        DW_LANG_ObjC_plus_plus => Language::ObjCpp,
        DW_LANG_Rust => Language::Rust,
        DW_LANG_Swift => Language::Swift,
        _ => Language::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_languages() {
        assert_eq!(
            language_from_dwarf(gimli::constants::DW_LANG_C_plus_plus_17),
            Language::Cpp
        );
        assert_eq!(
            language_from_dwarf(gimli::constants::DW_LANG_Rust),
            Language::Rust
        );
    }

    #[test]
    fn unknown_constant_maps_to_unknown() {
        assert_eq!(language_from_dwarf(gimli::DwLang(0xffff)), Language::Unknown);
    }
}
