//! A synthetic, in-memory DIE tree used only by this crate's own tests
//! (`spec.md` §8's scenario list). Not part of the public API.
//!
//! Grounded on `symbolic-debuginfo`'s own `#[cfg(test)] mod tests` idiom of
//! building small fixture values with free helper functions, adapted here to
//! a hand-rolled DIE tree since there is no real ELF/DWARF input available
//! in a unit test.

#![cfg(test)]

use std::collections::HashMap;

use gimli::constants;

use crate::die::{AttrValue, Die, DieId, DieIndex, FilenameFilter, ProgramContext, UnitId};
use crate::lang::Language;

#[derive(Clone, Debug)]
pub enum TestAttr {
    Udata(u64),
    Sdata(i64),
    Flag(bool),
    String(String),
    Reference(u64),
    Block(Vec<u8>),
    Exprloc(Vec<u8>),
    Addr(u64),
    Language(gimli::DwLang),
    Encoding(gimli::DwAte),
    Endianity(gimli::DwEnd),
}

#[derive(Clone, Debug, Default)]
pub struct TestDieData {
    pub tag: gimli::DwTag,
    pub attrs: Vec<(gimli::DwAt, TestAttr)>,
    pub children: Vec<usize>,
}

impl TestDieData {
    pub fn new(tag: gimli::DwTag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with(mut self, at: gimli::DwAt, value: TestAttr) -> Self {
        self.attrs.push((at, value));
        self
    }
}

/// Owns every synthetic DIE in one test tree; `TestDie::id()` is the node's
/// index, so `resolve` is a direct array lookup.
#[derive(Debug, Default)]
pub struct TestArena {
    nodes: Vec<TestDieData>,
}

impl TestArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: TestDieData) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn root(&self, index: usize) -> TestDie<'_> {
        TestDie { arena: self, index }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TestDie<'a> {
    arena: &'a TestArena,
    index: usize,
}

impl<'a> Die<'a> for TestDie<'a> {
    fn tag(&self) -> gimli::DwTag {
        self.arena.nodes[self.index].tag
    }

    fn attr(&self, at: gimli::DwAt) -> Option<AttrValue<'a>> {
        self.arena.nodes[self.index]
            .attrs
            .iter()
            .find(|(candidate, _)| *candidate == at)
            .map(|(_, value)| match value {
                TestAttr::Udata(v) => AttrValue::Udata(*v),
                TestAttr::Sdata(v) => AttrValue::Sdata(*v),
                TestAttr::Flag(v) => AttrValue::Flag(*v),
                TestAttr::String(s) => AttrValue::String(s.as_str().into()),
                TestAttr::Reference(id) => AttrValue::Reference(DieId(*id)),
                TestAttr::Block(b) => AttrValue::Block(b.as_slice()),
                TestAttr::Exprloc(b) => AttrValue::Exprloc(b.as_slice()),
                TestAttr::Addr(v) => AttrValue::Addr(*v),
                TestAttr::Language(l) => AttrValue::Language(*l),
                TestAttr::Encoding(e) => AttrValue::Encoding(*e),
                TestAttr::Endianity(e) => AttrValue::Endianity(*e),
            })
    }

    fn children(&self) -> impl Iterator<Item = Self> {
        self.arena.nodes[self.index]
            .children
            .clone()
            .into_iter()
            .map(|index| TestDie {
                arena: self.arena,
                index,
            })
    }

    fn id(&self) -> DieId {
        DieId(self.index as u64)
    }

    fn unit_id(&self) -> UnitId {
        UnitId(0)
    }

    fn resolve(&self, id: DieId) -> Option<Self> {
        let index = id.0 as usize;
        if index < self.arena.nodes.len() {
            Some(TestDie {
                arena: self.arena,
                index,
            })
        } else {
            None
        }
    }
}

pub struct TestProgram {
    pub word_size: u8,
    pub default_language: Language,
    pub little_endian: bool,
}

impl ProgramContext for TestProgram {
    fn word_size(&self) -> u8 {
        self.word_size
    }

    fn default_language(&self) -> Language {
        self.default_language
    }

    fn is_little_endian(&self) -> bool {
        self.little_endian
    }
}

/// Matches every DIE: this synthetic tree has no notion of a compilation
/// unit file path, so the filter is a pass-through (`spec.md` §6: "an empty
/// filter matches every DIE").
pub struct MatchAllFilter;

impl<'a> FilenameFilter<'a, TestDie<'a>> for MatchAllFilter {
    fn matches(&self, _die: TestDie<'a>, _filter: &str) -> bool {
        true
    }
}

/// A flat `(name, tags) -> [(die, bias)]` index, filled in by hand per
/// test. `iterate` skips any DIE carrying `DW_AT_declaration=true`,
/// matching `spec.md` §6's "returning only non-declaration definitions".
pub struct TestIndex<'a> {
    entries: HashMap<String, Vec<(TestDie<'a>, i64)>>,
}

impl<'a> TestIndex<'a> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, die: TestDie<'a>, bias: i64) {
        self.entries.entry(name.to_string()).or_default().push((die, bias));
    }
}

impl<'a> DieIndex<'a, TestDie<'a>> for TestIndex<'a> {
    fn iterate(
        &self,
        name: &str,
        tags: &[gimli::DwTag],
    ) -> Box<dyn Iterator<Item = (TestDie<'a>, i64)> + 'a> {
        let hits: Vec<(TestDie<'a>, i64)> = self
            .entries
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|(die, _)| tags.contains(&die.tag()))
            .filter(|(die, _)| {
                !matches!(die.attr(constants::DW_AT_declaration), Some(AttrValue::Flag(true)))
            })
            .collect();
        Box::new(hits.into_iter())
    }
}
