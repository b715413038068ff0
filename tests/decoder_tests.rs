//! Decoder tests on complete binaries

mod common;

use rstest::rstest;
use tern::parser::module::{DataMode, ElementMode, ExportIndex, ExternalKind, ValueType};
use tern::{DecodeErrorKind, FunctionType};

#[test]
fn decodes_every_section_kind() {
    let module = common::module(
        r#"(module
            (type $binop (func (param i32 i32) (result i32)))
            (import "env" "log" (func $log (param i32)))
            (import "env" "mem" (memory 1 2))
            (table $t 2 funcref)
            (global $g (mut i64) (i64.const -1))
            (func $add (export "add") (type $binop)
                local.get 0 local.get 1 i32.add)
            (func $start)
            (start $start)
            (elem (i32.const 0) $add $start)
            (data (i32.const 16) "hello")
            (data "passive"))"#,
    );

    assert_eq!(
        module.types[0],
        FunctionType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32])
    );
    assert_eq!(module.imports.len(), 2);
    assert!(matches!(module.imports[0].external_kind, ExternalKind::Function(_)));
    assert!(matches!(module.imports[1].external_kind, ExternalKind::Memory(_)));
    assert_eq!(module.functions.len(), 2);
    assert_eq!(module.tables[0].limits.min, 2);
    assert!(module.globals[0].global_type.mutable);
    assert_eq!(module.export("add").unwrap().index, ExportIndex::Function(1));
    assert_eq!(module.start, Some(2));
    assert!(matches!(module.elements[0].mode, ElementMode::Active { table_index: 0, .. }));
    assert_eq!(module.elements[0].items.len(), 2);
    assert_eq!(module.data[0].init, b"hello");
    assert_eq!(module.data[1].mode, DataMode::Passive);
    assert_eq!(module.num_imported_functions(), 1);
    assert_eq!(module.function_type(1), Some(&module.types[0]));
}

#[test]
fn records_instruction_offsets() {
    let bytes = common::binary(r#"(module (func (result i32) i32.const 1 i32.const 2 i32.add))"#);
    let module = tern::decode(&bytes).unwrap();
    let body = &module.code[0];
    assert_eq!(body.body.len(), 4);
    let offsets: Vec<usize> = (0..4).map(|pc| body.offset_of(pc).unwrap()).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(bytes[offsets[0]], 0x41);
    assert_eq!(bytes[offsets[2]], 0x6a);
    assert_eq!(bytes[offsets[3]], 0x0b);
}

#[test]
fn keeps_custom_sections() {
    let mut bytes = common::binary("(module)");
    bytes.extend_from_slice(&[0x00, 0x06, 0x04, b'n', b'o', b't', b'e', 0x2a]);
    let module = tern::decode(&bytes).unwrap();
    assert_eq!(module.custom_section("note").unwrap().data, vec![0x2a]);
}

#[rstest]
#[case::empty(&[], DecodeErrorKind::BadMagic)]
#[case::bad_magic(b"\0wasm\x01\0\0", DecodeErrorKind::BadMagic)]
#[case::truncated_version(b"\0asm\x01\0", DecodeErrorKind::UnexpectedEof("version"))]
#[case::version_two(b"\0asm\x02\0\0\0", DecodeErrorKind::UnsupportedVersion(2))]
#[case::unknown_section(b"\0asm\x01\0\0\0\x0e\x00", DecodeErrorKind::UnknownSection(14))]
#[case::type_form(b"\0asm\x01\0\0\0\x01\x04\x01\x61\x00\x00", DecodeErrorKind::InvalidTypeForm(0x61))]
#[case::value_type(b"\0asm\x01\0\0\0\x01\x05\x01\x60\x01\x7b\x00", DecodeErrorKind::Unsupported("v128 values"))]
fn rejects_malformed_binaries(#[case] bytes: &[u8], #[case] expected: DecodeErrorKind) {
    assert_eq!(tern::decode(bytes).unwrap_err().kind, expected);
}

#[test]
fn rejects_overlong_leb128() {
    // type section whose count is a six-byte LEB128
    let bytes = b"\0asm\x01\0\0\0\x01\x06\x80\x80\x80\x80\x80\x00";
    assert!(matches!(
        tern::decode(bytes).unwrap_err().kind,
        DecodeErrorKind::MalformedLeb128 | DecodeErrorKind::IntegerTooLarge
    ));
}

#[test]
fn truncated_module_reports_offset() {
    let bytes = common::binary(r#"(module (func (export "f") (result i32) i32.const 7))"#);
    let mut failures = 0;
    for len in 9..bytes.len() {
        // cuts on a section boundary leave a shorter but well-formed module
        if let Err(err) = tern::decode(&bytes[..len]) {
            assert!(err.offset <= len, "offset {} beyond input of {len} bytes", err.offset);
            failures += 1;
        }
    }
    assert!(failures > 0);
}

#[test]
fn rejects_simd() {
    // (func v128.const ...) is outside the supported feature set
    let bytes = common::binary(
        r#"(module (func (drop (v128.const i32x4 0 0 0 0))))"#,
    );
    assert!(matches!(
        tern::decode(&bytes).unwrap_err().kind,
        DecodeErrorKind::Unsupported(_)
    ));
}
