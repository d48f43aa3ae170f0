//! The error channel for the type graph translator.
//!
//! Mirrors the `DwarfErrorKind`/`DwarfError` split from
//! `symbolic-debuginfo/src/dwarf.rs`: a small, `Copy` kind enum for callers
//! who want to match on the failure class, and a `thiserror`-derived outer
//! struct wrapping an optional boxed cause for diagnostics.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error as ThisError;

/// The classification of an [`Error`].
///
/// A small number of conditions are instead represented as identity-compared
/// sentinels (see [`Error::not_found`], [`Error::stop`],
/// [`Error::out_of_memory`]) rather than as their own `ErrorKind` variant,
/// since callers must not pattern-match on them; each still reports one of
/// the variants below from [`Error::kind`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed DWARF: an invalid attribute, an unknown tag or encoding, or
    /// some other violation of the structure this translator assumes.
    Other,
    /// A symbol's address or value could not be determined.
    Lookup,
    /// The tag dispatcher's recursion depth limit (1000) was reached.
    Recursion,
    /// A numeric value exceeded its representable bound.
    Overflow,
    /// The caller violated the contract of a public entry point.
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Other => "malformed dwarf",
            Self::Lookup => "lookup failed",
            Self::Recursion => "recursion limit exceeded",
            Self::Overflow => "numeric overflow",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(s)
    }
}

/// Which of the three identity-compared sentinels this error is, if any.
/// Private: never part of the public `kind()` surface, per
/// [`ErrorKind`]'s doc comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sentinel {
    NotFound,
    Stop,
    OutOfMemory,
}

impl Sentinel {
    fn text(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Stop => "stop",
            Self::OutOfMemory => "out of memory",
        }
    }
}

fn render(kind: &ErrorKind, sentinel: &Option<Sentinel>, message: &Option<String>) -> String {
    match (sentinel, message) {
        (Some(sentinel), _) => sentinel.text().to_string(),
        (None, Some(message)) => format!("{kind}: {message}"),
        (None, None) => kind.to_string(),
    }
}

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, ThisError)]
#[error("{}", render(kind, sentinel, message))]
pub struct Error {
    kind: ErrorKind,
    sentinel: Option<Sentinel>,
    message: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error of `kind`, naming the attribute or tag involved.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            sentinel: None,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Attaches a source error, as `DwarfError::new` does for corrupted data.
    pub fn with_source<E>(kind: ErrorKind, message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind,
            sentinel: None,
            message: Some(message.into()),
            source: Some(Box::new(source)),
        }
    }

    /// An attribute was present but had the wrong form, or was otherwise
    /// unreadable. The DIE's parse is abandoned.
    pub fn invalid_attribute(name: &str) -> Self {
        Self::new(ErrorKind::Other, format!("invalid attribute {name}"))
    }

    /// An unrecognized `DW_TAG_*` was encountered where the dispatcher
    /// requires one of its known set.
    pub fn unknown_tag(tag: gimli::DwTag) -> Self {
        Self::new(ErrorKind::Other, format!("unknown tag {tag}"))
    }

    /// An unrecognized `DW_ATE_*` encoding was encountered on a base type.
    pub fn unknown_encoding(encoding: gimli::DwAte) -> Self {
        Self::new(ErrorKind::Other, format!("unknown encoding {encoding}"))
    }

    /// The tag dispatcher's recursion counter reached its limit.
    pub fn recursion_limit(limit: usize) -> Self {
        Self::new(
            ErrorKind::Recursion,
            format!("recursion depth exceeded {limit}"),
        )
    }

    /// A numeric value (e.g. an array dimension) exceeded `u64::MAX`.
    pub fn overflow(what: &str) -> Self {
        Self::new(ErrorKind::Overflow, format!("{what} overflows u64"))
    }

    /// The caller passed an argument that violates the entry point's
    /// contract (e.g. an unsupported `kind` bitmask).
    pub fn invalid_argument(what: &str) -> Self {
        Self::new(ErrorKind::InvalidArgument, what.to_string())
    }

    /// The sentinel returned when a lookup finds no matching candidate.
    ///
    /// Compared by identity (via [`Error::is_not_found`]), never matched on
    /// `kind`; `kind()` still reports [`ErrorKind::Lookup`].
    pub fn not_found() -> Self {
        Self {
            kind: ErrorKind::Lookup,
            sentinel: Some(Sentinel::NotFound),
            message: None,
            source: None,
        }
    }

    /// The internal sentinel for "give up on this branch, it is not an
    /// error the caller should see" — used by the compound builder when a
    /// forward-declaration search is ambiguous (spec.md §7). `kind()`
    /// reports [`ErrorKind::Other`].
    pub fn stop() -> Self {
        Self {
            kind: ErrorKind::Other,
            sentinel: Some(Sentinel::Stop),
            message: None,
            source: None,
        }
    }

    /// Allocation exhaustion while inserting into the interner. `kind()`
    /// reports [`ErrorKind::Overflow`].
    pub fn out_of_memory() -> Self {
        Self {
            kind: ErrorKind::Overflow,
            sentinel: Some(Sentinel::OutOfMemory),
            message: None,
            source: None,
        }
    }

    /// Returns this error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// True if this is the `NotFound` sentinel.
    pub fn is_not_found(&self) -> bool {
        self.sentinel == Some(Sentinel::NotFound)
    }

    /// True if this is the `Stop` sentinel.
    pub fn is_stop(&self) -> bool {
        self.sentinel == Some(Sentinel::Stop)
    }

    /// True if this is the `OutOfMemory` sentinel.
    pub fn is_out_of_memory(&self) -> bool {
        self.sentinel == Some(Sentinel::OutOfMemory)
    }
}

/// The crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
