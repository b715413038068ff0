//! Binary decoder.
//!
//! [`decode`] turns a `.wasm` byte slice into a [`Module`] in a single
//! forward pass. It checks the binary format only (structure, encodings,
//! section order, counts); typing rules are left to [`validate`].

pub mod encoding;
pub mod error;
pub mod instruction;
pub mod limits;
pub mod module;
pub mod reader;
pub mod validate;

pub use error::{DecodeError, DecodeErrorKind};

use encoding::*;
use instruction::decode::{decode_const_expr, decode_function_body, decode_ref_type, decode_value_type};
use instruction::Instruction;
use limits::*;
use module::*;
use reader::Reader;
use tracing::debug;

/// Decode a complete module.
pub fn decode(bytes: &[u8]) -> Result<Module, DecodeError> {
    let mut reader = Reader::new(bytes);
    read_header(&mut reader)?;

    let mut module = Module::new();
    let mut last_rank = 0u8;
    let mut function_count: Option<u32> = None;

    while !reader.is_empty() {
        let start = reader.offset();
        let id = reader.read_byte()?;
        let size = reader.read_vu32()?;
        let mut section = reader.sub_reader(size as usize, "section contents")?;

        if id == SECTION_CUSTOM {
            read_custom_section(&mut section, &mut module)?;
        } else {
            let rank = section_rank(id).ok_or_else(|| DecodeError::new(start, DecodeErrorKind::UnknownSection(id)))?;
            if rank <= last_rank {
                return Err(DecodeError::new(start, DecodeErrorKind::SectionOutOfOrder(id)));
            }
            last_rank = rank;

            match id {
                SECTION_TYPE => read_type_section(&mut section, &mut module)?,
                SECTION_IMPORT => read_import_section(&mut section, &mut module)?,
                SECTION_FUNCTION => {
                    read_function_section(&mut section, &mut module)?;
                    function_count = Some(module.functions.len() as u32);
                }
                SECTION_TABLE => read_table_section(&mut section, &mut module)?,
                SECTION_MEMORY => read_memory_section(&mut section, &mut module)?,
                SECTION_GLOBAL => read_global_section(&mut section, &mut module)?,
                SECTION_EXPORT => read_export_section(&mut section, &mut module)?,
                SECTION_START => module.start = Some(section.read_vu32()?),
                SECTION_ELEMENT => read_element_section(&mut section, &mut module)?,
                SECTION_DATA_COUNT => module.data_count = Some(section.read_vu32()?),
                SECTION_CODE => read_code_section(&mut section, &mut module, function_count.unwrap_or(0))?,
                SECTION_DATA => read_data_section(&mut section, &mut module)?,
                _ => return Err(DecodeError::new(start, DecodeErrorKind::UnknownSection(id))),
            }
        }

        if !section.is_empty() {
            return Err(section.error(DecodeErrorKind::SectionSizeMismatch {
                declared: size,
                consumed: section.pos(),
            }));
        }
        module.positions.push(SectionPosition {
            id,
            start,
            end: reader.offset(),
        });
    }

    let end = reader.offset();
    if module.functions.len() != module.code.len() {
        return Err(DecodeError::new(
            end,
            DecodeErrorKind::FunctionCodeMismatch {
                functions: module.functions.len() as u32,
                bodies: module.code.len() as u32,
            },
        ));
    }
    if let Some(declared) = module.data_count {
        if declared as usize != module.data.len() {
            return Err(DecodeError::new(
                end,
                DecodeErrorKind::DataCountMismatch {
                    declared,
                    actual: module.data.len() as u32,
                },
            ));
        }
    }

    debug!(
        size = bytes.len(),
        types = module.types.len(),
        imports = module.imports.len(),
        functions = module.functions.len(),
        exports = module.exports.len(),
        customs = module.customs.len(),
        "decoded module"
    );
    Ok(module)
}

fn read_header(reader: &mut Reader) -> Result<(), DecodeError> {
    let magic = reader
        .read_bytes(4)
        .map_err(|_| DecodeError::new(0, DecodeErrorKind::BadMagic))?;
    if magic != MAGIC {
        return Err(DecodeError::new(0, DecodeErrorKind::BadMagic));
    }
    let version = reader
        .read_u32()
        .map_err(|_| DecodeError::new(4, DecodeErrorKind::UnexpectedEof("version")))?;
    if version != VERSION {
        return Err(DecodeError::new(4, DecodeErrorKind::UnsupportedVersion(version)));
    }
    Ok(())
}

fn read_custom_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let name = reader.read_name()?;
    let data = reader.read_bytes(reader.remaining())?.to_vec();
    module.customs.push(CustomSection { name, data });
    Ok(())
}

fn read_value_types(reader: &mut Reader, what: &'static str, limit: u32) -> Result<Vec<ValueType>, DecodeError> {
    let count = reader.read_count(what, limit)?;
    (0..count).map(|_| decode_value_type(reader)).collect()
}

fn read_type_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("types", MAX_TYPES)?;
    module.types.reserve(count as usize);
    for _ in 0..count {
        let offset = reader.offset();
        let form = reader.read_byte()?;
        if form != TYPE_FUNC {
            return Err(DecodeError::new(offset, DecodeErrorKind::InvalidTypeForm(form)));
        }
        let parameters = read_value_types(reader, "parameters", MAX_FUNCTION_PARAMS)?;
        let return_types = read_value_types(reader, "results", MAX_FUNCTION_RETURNS)?;
        module.types.push(FunctionType {
            parameters,
            return_types,
        });
    }
    Ok(())
}

fn read_limits(reader: &mut Reader) -> Result<Limits, DecodeError> {
    let offset = reader.offset();
    let flags = reader.read_byte()?;
    match flags {
        LIMITS_MIN => Ok(Limits::new(reader.read_vu32()?, None)),
        LIMITS_MIN_MAX => {
            let min = reader.read_vu32()?;
            let max = reader.read_vu32()?;
            Ok(Limits::new(min, Some(max)))
        }
        0x02 | LIMITS_SHARED => Err(DecodeError::new(offset, DecodeErrorKind::Unsupported("shared memory"))),
        0x04..=0x07 => Err(DecodeError::new(offset, DecodeErrorKind::Unsupported("64-bit memory"))),
        other => Err(DecodeError::new(offset, DecodeErrorKind::InvalidLimits(other))),
    }
}

fn read_table_type(reader: &mut Reader) -> Result<TableType, DecodeError> {
    let ref_type = decode_ref_type(reader)?;
    let limits = read_limits(reader)?;
    Ok(TableType { ref_type, limits })
}

fn read_global_type(reader: &mut Reader) -> Result<GlobalType, DecodeError> {
    let value_type = decode_value_type(reader)?;
    let offset = reader.offset();
    let mutable = match reader.read_byte()? {
        0x00 => false,
        0x01 => true,
        other => return Err(DecodeError::new(offset, DecodeErrorKind::InvalidMutability(other))),
    };
    Ok(GlobalType { value_type, mutable })
}

fn read_import_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("imports", MAX_IMPORTS)?;
    module.imports.reserve(count as usize);
    for _ in 0..count {
        let module_name = reader.read_name()?;
        let name = reader.read_name()?;
        let offset = reader.offset();
        let external_kind = match reader.read_byte()? {
            DESC_FUNC => ExternalKind::Function(reader.read_vu32()?),
            DESC_TABLE => ExternalKind::Table(read_table_type(reader)?),
            DESC_MEMORY => ExternalKind::Memory(MemoryType {
                limits: read_limits(reader)?,
            }),
            DESC_GLOBAL => ExternalKind::Global(read_global_type(reader)?),
            other => return Err(DecodeError::new(offset, DecodeErrorKind::InvalidExternalKind(other))),
        };
        module.imports.push(Import {
            module: module_name,
            name,
            external_kind,
        });
    }
    Ok(())
}

fn read_function_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("functions", MAX_FUNCTIONS)?;
    module.functions = (0..count).map(|_| reader.read_vu32()).collect::<Result<_, _>>()?;
    Ok(())
}

fn read_table_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("tables", MAX_TABLES)?;
    module.tables = (0..count).map(|_| read_table_type(reader)).collect::<Result<_, _>>()?;
    Ok(())
}

fn read_memory_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("memories", MAX_MEMORIES)?;
    module.memories = (0..count)
        .map(|_| read_limits(reader).map(|limits| MemoryType { limits }))
        .collect::<Result<_, _>>()?;
    Ok(())
}

fn read_global_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("globals", MAX_GLOBALS)?;
    module.globals.reserve(count as usize);
    for _ in 0..count {
        let global_type = read_global_type(reader)?;
        let init = decode_const_expr(reader)?;
        module.globals.push(Global { global_type, init });
    }
    Ok(())
}

fn read_export_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("exports", MAX_EXPORTS)?;
    module.exports.reserve(count as usize);
    for _ in 0..count {
        let name = reader.read_name()?;
        let offset = reader.offset();
        let kind = reader.read_byte()?;
        let index = reader.read_vu32()?;
        let index = match kind {
            DESC_FUNC => ExportIndex::Function(index),
            DESC_TABLE => ExportIndex::Table(index),
            DESC_MEMORY => ExportIndex::Memory(index),
            DESC_GLOBAL => ExportIndex::Global(index),
            other => return Err(DecodeError::new(offset, DecodeErrorKind::InvalidExternalKind(other))),
        };
        module.exports.push(Export { name, index });
    }
    Ok(())
}

fn read_elem_kind(reader: &mut Reader) -> Result<RefType, DecodeError> {
    let offset = reader.offset();
    match reader.read_byte()? {
        ELEMKIND_FUNCREF => Ok(RefType::FuncRef),
        other => Err(DecodeError::new(offset, DecodeErrorKind::InvalidElementKind(other))),
    }
}

fn read_element_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("element segments", MAX_ELEMENT_SEGMENTS)?;
    module.elements.reserve(count as usize);
    for _ in 0..count {
        let offset = reader.offset();
        let flags = reader.read_vu32()?;
        if flags > 7 {
            return Err(DecodeError::new(offset, DecodeErrorKind::InvalidElementFlags(flags)));
        }
        let non_active = flags & ELEM_PASSIVE_OR_DECLARATIVE != 0;
        let bit1 = flags & ELEM_EXPLICIT_TABLE_OR_DECLARATIVE != 0;
        let expressions = flags & ELEM_EXPRESSIONS != 0;

        let mode = if non_active {
            if bit1 {
                ElementMode::Declarative
            } else {
                ElementMode::Passive
            }
        } else {
            let table_index = if bit1 { reader.read_vu32()? } else { 0 };
            let offset = decode_const_expr(reader)?;
            ElementMode::Active { table_index, offset }
        };

        // flags 0 and 4 imply funcref; all others spell out the kind
        let implicit_kind = !non_active && !bit1;
        let ref_type = match (implicit_kind, expressions) {
            (true, _) => RefType::FuncRef,
            (false, false) => read_elem_kind(reader)?,
            (false, true) => decode_ref_type(reader)?,
        };

        let item_count = reader.read_count("element items", MAX_ELEMENT_ITEMS)?;
        let mut items = Vec::with_capacity(item_count as usize);
        for _ in 0..item_count {
            if expressions {
                items.push(decode_const_expr(reader)?);
            } else {
                let func_idx = reader.read_vu32()?;
                items.push(ConstExpr::new(vec![Instruction::RefFunc { func_idx }]));
            }
        }
        module.elements.push(ElementSegment { ref_type, items, mode });
    }
    Ok(())
}

fn read_code_section(reader: &mut Reader, module: &mut Module, declared: u32) -> Result<(), DecodeError> {
    let offset = reader.offset();
    let count = reader.read_count("function bodies", MAX_FUNCTIONS)?;
    if count != declared {
        return Err(DecodeError::new(
            offset,
            DecodeErrorKind::FunctionCodeMismatch {
                functions: declared,
                bodies: count,
            },
        ));
    }
    module.code.reserve(count as usize);
    for _ in 0..count {
        let size = reader.read_vu32()?;
        let mut body = reader.sub_reader(size as usize, "function body")?;
        module.code.push(decode_function_body(&mut body)?);
    }
    Ok(())
}

fn read_data_section(reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    let count = reader.read_count("data segments", MAX_DATA_SEGMENTS)?;
    module.data.reserve(count as usize);
    for _ in 0..count {
        let offset = reader.offset();
        let flags = reader.read_vu32()?;
        let mode = match flags {
            DATA_ACTIVE => DataMode::Active {
                memory_index: 0,
                offset: decode_const_expr(reader)?,
            },
            DATA_PASSIVE => DataMode::Passive,
            DATA_ACTIVE_EXPLICIT => {
                let memory_index = reader.read_vu32()?;
                DataMode::Active {
                    memory_index,
                    offset: decode_const_expr(reader)?,
                }
            }
            other => return Err(DecodeError::new(offset, DecodeErrorKind::InvalidDataFlags(other))),
        };
        let init = reader.read_byte_vec()?;
        module.data.push(DataSegment { init, mode });
    }
    Ok(())
}
