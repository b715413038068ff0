//! Encodes a [`Module`] back into the binary format.
//!
//! The inverse of [`crate::decode`]. Sections are written in canonical order
//! and only when non-empty; custom sections are appended after all known
//! sections. All integers use minimal LEB128, so re-encoding a decoded
//! module can shrink a binary that used padded encodings, but decoding the
//! output always yields an equivalent module.
//!
//! ```
//! let module = tern::decode(b"\0asm\x01\0\0\0").unwrap();
//! let bytes = tern::encoder::encode(&module);
//! assert_eq!(bytes, b"\0asm\x01\0\0\0");
//! ```

use crate::parser::encoding::*;
use crate::parser::instruction::Instruction;
use crate::parser::module::{
    ConstExpr, DataMode, ElementMode, ElementSegment, ExportIndex, ExternalKind, GlobalType, Limits, Module, RefType,
    TableType,
};

/// Encode a module to a `.wasm` byte vector.
pub fn encode(module: &Module) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    write_u32(&mut buf, VERSION);

    encode_type_section(&mut buf, module);
    encode_import_section(&mut buf, module);
    encode_function_section(&mut buf, module);
    encode_table_section(&mut buf, module);
    encode_memory_section(&mut buf, module);
    encode_global_section(&mut buf, module);
    encode_export_section(&mut buf, module);
    encode_start_section(&mut buf, module);
    encode_element_section(&mut buf, module);
    encode_data_count_section(&mut buf, module);
    encode_code_section(&mut buf, module);
    encode_data_section(&mut buf, module);

    for custom in &module.customs {
        let mut contents = Vec::new();
        write_name(&mut contents, &custom.name);
        contents.extend_from_slice(&custom.data);
        write_section(&mut buf, SECTION_CUSTOM, &contents);
    }

    buf
}

// Shared pieces -----------------------------------------------------------------

fn encode_limits(buf: &mut Vec<u8>, limits: &Limits) {
    match limits.max {
        None => {
            buf.push(LIMITS_MIN);
            write_vu32(buf, limits.min);
        }
        Some(max) => {
            buf.push(LIMITS_MIN_MAX);
            write_vu32(buf, limits.min);
            write_vu32(buf, max);
        }
    }
}

fn encode_table_type(buf: &mut Vec<u8>, table: &TableType) {
    buf.push(table.ref_type.value_type().byte());
    encode_limits(buf, &table.limits);
}

fn encode_global_type(buf: &mut Vec<u8>, global: &GlobalType) {
    buf.push(global.value_type.byte());
    buf.push(global.mutable as u8);
}

fn encode_const_expr(buf: &mut Vec<u8>, expr: &ConstExpr) {
    for inst in &expr.instructions {
        inst.encode(buf);
    }
    buf.push(OP_END);
}

/// Write `count` followed by each item, then wrap the lot as a section.
fn encode_vec_section<T>(buf: &mut Vec<u8>, id: u8, items: &[T], mut encode_item: impl FnMut(&mut Vec<u8>, &T)) {
    if items.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, items.len() as u32);
    for item in items {
        encode_item(&mut contents, item);
    }
    write_section(buf, id, &contents);
}

// Sections ------------------------------------------------------------------------

/// ```text
/// typesec  ::= section_1(vec(functype))
/// functype ::= 0x60 vec(valtype) vec(valtype)
/// ```
fn encode_type_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_TYPE, &module.types, |out, ft| {
        out.push(TYPE_FUNC);
        write_vu32(out, ft.parameters.len() as u32);
        out.extend(ft.parameters.iter().map(|t| t.byte()));
        write_vu32(out, ft.return_types.len() as u32);
        out.extend(ft.return_types.iter().map(|t| t.byte()));
    });
}

fn encode_import_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_IMPORT, &module.imports, |out, import| {
        write_name(out, &import.module);
        write_name(out, &import.name);
        match &import.external_kind {
            ExternalKind::Function(type_idx) => {
                out.push(DESC_FUNC);
                write_vu32(out, *type_idx);
            }
            ExternalKind::Table(table) => {
                out.push(DESC_TABLE);
                encode_table_type(out, table);
            }
            ExternalKind::Memory(memory) => {
                out.push(DESC_MEMORY);
                encode_limits(out, &memory.limits);
            }
            ExternalKind::Global(global) => {
                out.push(DESC_GLOBAL);
                encode_global_type(out, global);
            }
        }
    });
}

fn encode_function_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_FUNCTION, &module.functions, |out, type_idx| {
        write_vu32(out, *type_idx);
    });
}

fn encode_table_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_TABLE, &module.tables, encode_table_type);
}

fn encode_memory_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_MEMORY, &module.memories, |out, memory| {
        encode_limits(out, &memory.limits);
    });
}

fn encode_global_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_GLOBAL, &module.globals, |out, global| {
        encode_global_type(out, &global.global_type);
        encode_const_expr(out, &global.init);
    });
}

fn encode_export_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_EXPORT, &module.exports, |out, export| {
        write_name(out, &export.name);
        let desc = match export.index {
            ExportIndex::Function(_) => DESC_FUNC,
            ExportIndex::Table(_) => DESC_TABLE,
            ExportIndex::Memory(_) => DESC_MEMORY,
            ExportIndex::Global(_) => DESC_GLOBAL,
        };
        out.push(desc);
        write_vu32(out, export.index.index());
    });
}

fn encode_start_section(buf: &mut Vec<u8>, module: &Module) {
    if let Some(start) = module.start {
        let mut contents = Vec::new();
        write_vu32(&mut contents, start);
        write_section(buf, SECTION_START, &contents);
    }
}

/// Function indices when every item is a plain `ref.func`, else `None`.
fn element_func_indices(segment: &ElementSegment) -> Option<Vec<u32>> {
    if segment.ref_type != RefType::FuncRef {
        return None;
    }
    segment
        .items
        .iter()
        .map(|item| match item.instructions.as_slice() {
            [Instruction::RefFunc { func_idx }] => Some(*func_idx),
            _ => None,
        })
        .collect()
}

/// Picks the most compact of the eight element segment encodings.
fn encode_element_segment(out: &mut Vec<u8>, segment: &ElementSegment) {
    let indices = element_func_indices(segment);
    let expr_bit = if indices.is_some() { 0 } else { ELEM_EXPRESSIONS };

    let explicit_kind = match &segment.mode {
        ElementMode::Active { table_index: 0, offset } if segment.ref_type == RefType::FuncRef => {
            write_vu32(out, expr_bit);
            encode_const_expr(out, offset);
            false
        }
        ElementMode::Active { table_index, offset } => {
            write_vu32(out, ELEM_EXPLICIT_TABLE_OR_DECLARATIVE | expr_bit);
            write_vu32(out, *table_index);
            encode_const_expr(out, offset);
            true
        }
        ElementMode::Passive => {
            write_vu32(out, ELEM_PASSIVE_OR_DECLARATIVE | expr_bit);
            true
        }
        ElementMode::Declarative => {
            write_vu32(
                out,
                ELEM_PASSIVE_OR_DECLARATIVE | ELEM_EXPLICIT_TABLE_OR_DECLARATIVE | expr_bit,
            );
            true
        }
    };

    match indices {
        Some(indices) => {
            if explicit_kind {
                out.push(ELEMKIND_FUNCREF);
            }
            write_vu32(out, indices.len() as u32);
            for idx in indices {
                write_vu32(out, idx);
            }
        }
        None => {
            if explicit_kind {
                out.push(segment.ref_type.value_type().byte());
            }
            write_vu32(out, segment.items.len() as u32);
            for item in &segment.items {
                encode_const_expr(out, item);
            }
        }
    }
}

fn encode_element_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_ELEMENT, &module.elements, encode_element_segment);
}

fn encode_data_count_section(buf: &mut Vec<u8>, module: &Module) {
    if let Some(count) = module.data_count {
        let mut contents = Vec::new();
        write_vu32(&mut contents, count);
        write_section(buf, SECTION_DATA_COUNT, &contents);
    }
}

/// ```text
/// codesec ::= section_10(vec(code))
/// code    ::= size:u32 func
/// func    ::= vec(locals) expr
/// ```
fn encode_code_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_CODE, &module.code, |out, body| {
        let mut func = Vec::new();
        write_vu32(&mut func, body.locals.len() as u32);
        for decl in &body.locals {
            write_vu32(&mut func, decl.count);
            func.push(decl.value_type.byte());
        }
        for inst in &body.body {
            inst.encode(&mut func);
        }
        write_bytes(out, &func);
    });
}

fn encode_data_section(buf: &mut Vec<u8>, module: &Module) {
    encode_vec_section(buf, SECTION_DATA, &module.data, |out, segment| {
        match &segment.mode {
            DataMode::Passive => write_vu32(out, DATA_PASSIVE),
            DataMode::Active {
                memory_index: 0,
                offset,
            } => {
                write_vu32(out, DATA_ACTIVE);
                encode_const_expr(out, offset);
            }
            DataMode::Active { memory_index, offset } => {
                write_vu32(out, DATA_ACTIVE_EXPLICIT);
                write_vu32(out, *memory_index);
                encode_const_expr(out, offset);
            }
        }
        write_bytes(out, &segment.init);
    });
}
