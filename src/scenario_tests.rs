//! End-to-end scenarios over the synthetic DIE tree in `testutil`,
//! mirroring `spec.md` §8's named scenarios and invariants.

#![cfg(test)]

use gimli::constants;

use crate::cache::Cache;
use crate::dispatch;
use crate::lang::Language;
use crate::object::{self, ObjectKind};
use crate::testutil::{MatchAllFilter, TestArena, TestAttr, TestDieData, TestIndex, TestProgram};
use crate::types::{CompoundKind, EnumeratorValue, TypeNode};

fn program() -> TestProgram {
    TestProgram {
        word_size: 8,
        default_language: Language::C,
        little_endian: true,
    }
}

/// Scenario 1: `struct { int a; char b[]; }`.
#[test]
fn struct_with_trailing_flexible_array() {
    let mut arena = TestArena::new();

    let int_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let char_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("char".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed_char))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(1)),
    );
    let flexible_array = arena.push(
        TestDieData::new(constants::DW_TAG_array_type)
            .with(constants::DW_AT_type, TestAttr::Reference(char_ty as u64)),
    );
    let member_a = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("a".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(int_ty as u64))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0)),
    );
    let member_b = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("b".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(flexible_array as u64))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(4)),
    );
    let mut strukt = TestDieData::new(constants::DW_TAG_structure_type)
        .with(constants::DW_AT_name, TestAttr::String("s".into()))
        .with(constants::DW_AT_byte_size, TestAttr::Udata(4));
    strukt.children = vec![member_a, member_b];
    let strukt = arena.push(strukt);

    let index = TestIndex::new();
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(strukt);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    let member_count;
    let first_bit_offset;
    let first_is_bit_field;
    let b_die;
    let b_can_be_incomplete_array;
    {
        let node = cache.arena().get(resolved.ty);
        match node {
            TypeNode::Compound {
                kind,
                byte_size,
                members,
                complete,
                ..
            } => {
                assert_eq!(*kind, CompoundKind::Struct);
                assert_eq!(*byte_size, 4);
                assert!(*complete);
                member_count = members.len();
                first_bit_offset = members[0].bit_offset;
                first_is_bit_field = members[0].is_bit_field();
                b_die = members[1].ty.die().unwrap();
                b_can_be_incomplete_array = members[1].ty.can_be_incomplete_array();
            }
            other => panic!("expected Compound, got {other:?}"),
        }
    }
    assert_eq!(member_count, 2);
    assert_eq!(first_bit_offset, 0);
    assert!(!first_is_bit_field);
    assert!(b_can_be_incomplete_array);

    let (b_resolved, b_is_incomplete_array) =
        dispatch::resolve(&mut cache, b_die, b_can_be_incomplete_array).unwrap();
    assert!(b_is_incomplete_array);
    match cache.arena().get(b_resolved.ty) {
        TypeNode::Array { complete, length, .. } => {
            assert!(!*complete);
            assert_eq!(*length, None);
        }
        other => panic!("expected incomplete Array, got {other:?}"),
    }
}

/// Scenario 5: enum without `DW_AT_type`, byte size 4, enumerator `NEG = -1`.
#[test]
fn enum_without_type_fabricates_signed_compatible_type() {
    let mut arena = TestArena::new();
    let mut en = TestDieData::new(constants::DW_TAG_enumeration_type)
        .with(constants::DW_AT_name, TestAttr::String("e".into()))
        .with(constants::DW_AT_byte_size, TestAttr::Udata(4));
    let neg = arena.push(
        TestDieData::new(constants::DW_TAG_enumerator)
            .with(constants::DW_AT_name, TestAttr::String("NEG".into()))
            .with(constants::DW_AT_const_value, TestAttr::Sdata(-1)),
    );
    en.children = vec![neg];
    let en = arena.push(en);

    let index = TestIndex::new();
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(en);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    match cache.arena().get(resolved.ty) {
        TypeNode::Enum {
            compatible_type,
            enumerators,
            complete,
            ..
        } => {
            assert!(*complete);
            assert_eq!(enumerators.len(), 1);
            assert!(matches!(enumerators[0].value, EnumeratorValue::Signed(-1)));
            match cache.arena().get(*compatible_type) {
                TypeNode::Int { name, byte_size, signed, .. } => {
                    assert_eq!(name.as_deref(), Some("<unknown>"));
                    assert_eq!(*byte_size, 4);
                    assert!(*signed);
                }
                other => panic!("expected fabricated Int, got {other:?}"),
            }
        }
        other => panic!("expected Enum, got {other:?}"),
    }
}

/// Scenario 6: `int g = 42;` with `DW_OP_addr 0x601040`, load bias 0x1000.
#[test]
fn variable_with_dw_op_addr_applies_load_bias() {
    let mut arena = TestArena::new();
    let int_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let mut location = vec![0x03u8];
    location.extend_from_slice(&0x0060_1040u64.to_le_bytes());
    let variable = arena.push(
        TestDieData::new(constants::DW_TAG_variable)
            .with(constants::DW_AT_name, TestAttr::String("g".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(int_ty as u64))
            .with(constants::DW_AT_location, TestAttr::Exprloc(location)),
    );

    let mut index = TestIndex::new();
    let die = arena.root(variable);
    index.register("g", die, 0x1000);
    let mut cache = Cache::new(index, program(), MatchAllFilter);

    let object = object::find_object(&mut cache, "g", "", ObjectKind::VARIABLE).unwrap();
    match object {
        object::Object::Reference { address, .. } => assert_eq!(address, 0x0060_2040),
        other => panic!("expected Reference, got {other:?}"),
    }
}

/// Invariant 1: resolving the same DIE twice under the same policy returns
/// the same `TypeId`.
#[test]
fn interning_identity_holds_across_repeated_resolution() {
    let mut arena = TestArena::new();
    let int_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let index = TestIndex::new();
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(int_ty);

    let (first, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    let (second, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    assert_eq!(first.ty, second.ty);
}

/// Invariant 6: a synthetic chain of qualifier DIEs longer than the
/// recursion limit fails with `RECURSION`, not a stack overflow.
#[test]
fn deep_qualifier_chain_hits_recursion_limit() {
    let mut arena = TestArena::new();
    let mut previous = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    for _ in 0..(crate::cache::RECURSION_LIMIT + 10) {
        previous = arena.push(
            TestDieData::new(constants::DW_TAG_const_type)
                .with(constants::DW_AT_type, TestAttr::Reference(previous as u64)),
        );
    }

    let index = TestIndex::new();
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(previous);

    let err = dispatch::resolve(&mut cache, die, true).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Recursion);
}

/// Builds `struct S { unsigned x:3; unsigned y:5; }` with a 4-byte storage
/// unit, encoded via the legacy `(DW_AT_data_member_location, DW_AT_bit_offset)`
/// pair rather than `DW_AT_data_bit_offset`. `bit_offset_x`/`bit_offset_y` are
/// the *legacy* DWARF `DW_AT_bit_offset` values (counted from the MSB of the
/// storage unit), which differ between endiannesses for the same logical
/// layout (scenarios 2 and 3).
fn bitfield_struct_with_legacy_encoding(bit_offset_x: u64, bit_offset_y: u64) -> (TestArena, usize) {
    let mut arena = TestArena::new();
    let unsigned_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("unsigned int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_unsigned))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let member_x = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("x".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(unsigned_ty as u64))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4))
            .with(constants::DW_AT_bit_size, TestAttr::Udata(3))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0))
            .with(constants::DW_AT_bit_offset, TestAttr::Udata(bit_offset_x)),
    );
    let member_y = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("y".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(unsigned_ty as u64))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4))
            .with(constants::DW_AT_bit_size, TestAttr::Udata(5))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0))
            .with(constants::DW_AT_bit_offset, TestAttr::Udata(bit_offset_y)),
    );
    let mut strukt = TestDieData::new(constants::DW_TAG_structure_type)
        .with(constants::DW_AT_name, TestAttr::String("s".into()))
        .with(constants::DW_AT_byte_size, TestAttr::Udata(4));
    strukt.children = vec![member_x, member_y];
    let strukt = arena.push(strukt);
    (arena, strukt)
}

/// Scenario 2: the little-endian encoding of the bit-field struct.
#[test]
fn bitfield_legacy_encoding_little_endian() {
    // x: bit_offset=29 -> absolute = 32 - 29 - 3 = 0; y: bit_offset=24 -> 32 - 24 - 5 = 3.
    let (arena, strukt) = bitfield_struct_with_legacy_encoding(29, 24);
    let mut prog = program();
    prog.little_endian = true;
    let index = TestIndex::new();
    let mut cache = Cache::new(index, prog, MatchAllFilter);
    let die = arena.root(strukt);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    match cache.arena().get(resolved.ty) {
        TypeNode::Compound { members, .. } => {
            assert_eq!(members[0].bit_offset, 0);
            assert_eq!(members[0].bit_field_size, 3);
            assert_eq!(members[1].bit_offset, 3);
            assert_eq!(members[1].bit_field_size, 5);
        }
        other => panic!("expected Compound, got {other:?}"),
    }
}

/// Scenario 3: the big-endian encoding of the same logical layout — same
/// resulting offsets, different `DW_AT_bit_offset` values.
#[test]
fn bitfield_legacy_encoding_big_endian() {
    let (arena, strukt) = bitfield_struct_with_legacy_encoding(0, 3);
    let mut prog = program();
    prog.little_endian = false;
    let index = TestIndex::new();
    let mut cache = Cache::new(index, prog, MatchAllFilter);
    let die = arena.root(strukt);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    match cache.arena().get(resolved.ty) {
        TypeNode::Compound { members, .. } => {
            assert_eq!(members[0].bit_offset, 0);
            assert_eq!(members[0].bit_field_size, 3);
            assert_eq!(members[1].bit_offset, 3);
            assert_eq!(members[1].bit_field_size, 5);
        }
        other => panic!("expected Compound, got {other:?}"),
    }
}

/// Scenario 4: `struct foo;` used only via pointer, with a complete
/// `struct foo { int a; };` present in the same unit. The pointer's
/// referenced type must resolve to the complete struct, not an incomplete
/// stand-in.
#[test]
fn pointer_to_forward_declaration_resolves_to_complete_struct() {
    let mut arena = TestArena::new();
    let int_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let member_a = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("a".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(int_ty as u64))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0)),
    );
    let mut complete = TestDieData::new(constants::DW_TAG_structure_type)
        .with(constants::DW_AT_name, TestAttr::String("foo".into()))
        .with(constants::DW_AT_byte_size, TestAttr::Udata(4));
    complete.children = vec![member_a];
    let complete = arena.push(complete);

    let declaration = arena.push(
        TestDieData::new(constants::DW_TAG_structure_type)
            .with(constants::DW_AT_name, TestAttr::String("foo".into()))
            .with(constants::DW_AT_declaration, TestAttr::Flag(true)),
    );

    let pointer = arena.push(
        TestDieData::new(constants::DW_TAG_pointer_type)
            .with(constants::DW_AT_type, TestAttr::Reference(declaration as u64))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(8)),
    );

    let mut index = TestIndex::new();
    // Both the declaration and the complete definition are registered under
    // the same name/tag; `TestIndex::iterate` filters out the declaration,
    // per `spec.md` §6's "returning only non-declaration definitions", so
    // the completion search sees exactly one (unambiguous) candidate.
    index.register("foo", arena.root(declaration), 0);
    index.register("foo", arena.root(complete), 0);
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(pointer);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    match cache.arena().get(resolved.ty) {
        TypeNode::Pointer { referenced, .. } => match cache.arena().get(referenced.ty) {
            TypeNode::Compound { tag, complete, members, .. } => {
                assert_eq!(tag.as_deref(), Some("foo"));
                assert!(*complete);
                assert_eq!(members.len(), 1);
            }
            other => panic!("expected complete Compound, got {other:?}"),
        },
        other => panic!("expected Pointer, got {other:?}"),
    }
}

/// Invariant 5: an incomplete-array member that is *not* the struct's last
/// member must be built as a zero-length array, not an incomplete one — only
/// the terminal member may use the flexible-array rule.
#[test]
fn non_terminal_incomplete_array_member_becomes_zero_length() {
    let mut arena = TestArena::new();
    let char_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("char".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed_char))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(1)),
    );
    let int_ty = arena.push(
        TestDieData::new(constants::DW_TAG_base_type)
            .with(constants::DW_AT_name, TestAttr::String("int".into()))
            .with(constants::DW_AT_encoding, TestAttr::Encoding(constants::DW_ATE_signed))
            .with(constants::DW_AT_byte_size, TestAttr::Udata(4)),
    );
    let incomplete_array = arena.push(
        TestDieData::new(constants::DW_TAG_array_type)
            .with(constants::DW_AT_type, TestAttr::Reference(char_ty as u64)),
    );
    let member_b = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("b".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(incomplete_array as u64))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0)),
    );
    let member_c = arena.push(
        TestDieData::new(constants::DW_TAG_member)
            .with(constants::DW_AT_name, TestAttr::String("c".into()))
            .with(constants::DW_AT_type, TestAttr::Reference(int_ty as u64))
            .with(constants::DW_AT_data_member_location, TestAttr::Udata(0)),
    );
    let mut strukt = TestDieData::new(constants::DW_TAG_structure_type)
        .with(constants::DW_AT_name, TestAttr::String("s".into()))
        .with(constants::DW_AT_byte_size, TestAttr::Udata(8));
    strukt.children = vec![member_b, member_c];
    let strukt = arena.push(strukt);

    let index = TestIndex::new();
    let mut cache = Cache::new(index, program(), MatchAllFilter);
    let die = arena.root(strukt);

    let (resolved, _) = dispatch::resolve(&mut cache, die, true).unwrap();
    let b_die;
    let b_can_be_incomplete_array;
    match cache.arena().get(resolved.ty) {
        TypeNode::Compound { members, .. } => {
            b_die = members[0].ty.die().unwrap();
            b_can_be_incomplete_array = members[0].ty.can_be_incomplete_array();
        }
        other => panic!("expected Compound, got {other:?}"),
    }
    assert!(!b_can_be_incomplete_array);
    let (b_resolved, b_is_incomplete_array) =
        dispatch::resolve(&mut cache, b_die, b_can_be_incomplete_array).unwrap();
    assert!(!b_is_incomplete_array);
    match cache.arena().get(b_resolved.ty) {
        TypeNode::Array { complete, length, .. } => {
            assert!(*complete);
            assert_eq!(*length, Some(0));
        }
        other => panic!("expected zero-length Array, got {other:?}"),
    }
}
