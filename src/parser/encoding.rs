//! Binary format constants and the primitive writers used by the encoder.

use byteorder::{LittleEndian, WriteBytesExt};

pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];
pub const VERSION: u32 = 1;

// Section ids
pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_START: u8 = 8;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;

/// Position of a known section in the canonical order. DataCount sits
/// between Element and Code even though its id is larger.
pub fn section_rank(id: u8) -> Option<u8> {
    match id {
        SECTION_TYPE..=SECTION_ELEMENT => Some(id),
        SECTION_DATA_COUNT => Some(10),
        SECTION_CODE => Some(11),
        SECTION_DATA => Some(12),
        _ => None,
    }
}

pub fn section_name(id: u8) -> &'static str {
    match id {
        SECTION_CUSTOM => "custom",
        SECTION_TYPE => "type",
        SECTION_IMPORT => "import",
        SECTION_FUNCTION => "function",
        SECTION_TABLE => "table",
        SECTION_MEMORY => "memory",
        SECTION_GLOBAL => "global",
        SECTION_EXPORT => "export",
        SECTION_START => "start",
        SECTION_ELEMENT => "element",
        SECTION_CODE => "code",
        SECTION_DATA => "data",
        SECTION_DATA_COUNT => "datacount",
        _ => "unknown",
    }
}

// Types
pub const TYPE_I32: u8 = 0x7f;
pub const TYPE_I64: u8 = 0x7e;
pub const TYPE_F32: u8 = 0x7d;
pub const TYPE_F64: u8 = 0x7c;
pub const TYPE_V128: u8 = 0x7b;
pub const TYPE_FUNCREF: u8 = 0x70;
pub const TYPE_EXTERNREF: u8 = 0x6f;
pub const TYPE_FUNC: u8 = 0x60;
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

// Import and export descriptors
pub const DESC_FUNC: u8 = 0x00;
pub const DESC_TABLE: u8 = 0x01;
pub const DESC_MEMORY: u8 = 0x02;
pub const DESC_GLOBAL: u8 = 0x03;

// Limits flags
pub const LIMITS_MIN: u8 = 0x00;
pub const LIMITS_MIN_MAX: u8 = 0x01;
pub const LIMITS_SHARED: u8 = 0x03;

// Element segment flags: bit 0 passive/declarative, bit 1 explicit table
// (active) or declarative (non-active), bit 2 expressions instead of indices.
pub const ELEM_PASSIVE_OR_DECLARATIVE: u32 = 0b001;
pub const ELEM_EXPLICIT_TABLE_OR_DECLARATIVE: u32 = 0b010;
pub const ELEM_EXPRESSIONS: u32 = 0b100;
pub const ELEMKIND_FUNCREF: u8 = 0x00;

// Data segment flags
pub const DATA_ACTIVE: u32 = 0;
pub const DATA_PASSIVE: u32 = 1;
pub const DATA_ACTIVE_EXPLICIT: u32 = 2;

pub const OP_END: u8 = 0x0b;
pub const PREFIX_MISC: u8 = 0xfc;
pub const PREFIX_SIMD: u8 = 0xfd;

// Primitive writers -----------------------------------------------------------

pub fn write_vu32(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub fn write_vs64(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub fn write_vs32(buf: &mut Vec<u8>, value: i32) {
    write_vs64(buf, value as i64);
}

pub fn write_f32(buf: &mut Vec<u8>, value: f32) {
    // writing into a Vec cannot fail
    let _ = buf.write_f32::<LittleEndian>(value);
}

pub fn write_f64(buf: &mut Vec<u8>, value: f64) {
    let _ = buf.write_f64::<LittleEndian>(value);
}

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    let _ = buf.write_u32::<LittleEndian>(value);
}

pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_bytes(buf, name.as_bytes());
}

/// Length-prefixed byte vector.
pub fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_vu32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

/// Write `id`, the LEB128 size of `contents`, then `contents`.
pub fn write_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    write_bytes(buf, contents);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reader::Reader;

    #[test]
    fn test_leb_writers_match_reader() {
        for value in [0u32, 1, 127, 128, 624_485, u32::MAX] {
            let mut buf = Vec::new();
            write_vu32(&mut buf, value);
            assert_eq!(Reader::new(&buf).read_vu32().unwrap(), value);
        }
        for value in [0i64, -1, 63, -64, 64, -65, i64::MAX, i64::MIN] {
            let mut buf = Vec::new();
            write_vs64(&mut buf, value);
            assert_eq!(Reader::new(&buf).read_vs64().unwrap(), value);
        }
    }

    #[test]
    fn test_minimal_encodings() {
        let mut buf = Vec::new();
        write_vs32(&mut buf, -1);
        assert_eq!(buf, vec![0x7f]);
        buf.clear();
        write_vu32(&mut buf, 128);
        assert_eq!(buf, vec![0x80, 0x01]);
    }

    #[test]
    fn test_section_rank_places_data_count_before_code() {
        assert!(section_rank(SECTION_ELEMENT) < section_rank(SECTION_DATA_COUNT));
        assert!(section_rank(SECTION_DATA_COUNT) < section_rank(SECTION_CODE));
        assert_eq!(section_rank(SECTION_CUSTOM), None);
        assert_eq!(section_rank(13), None);
    }
}
