//! Opcode decoding.

use super::{for_each_memory_op, for_each_misc_simple_op, for_each_simple_op, BlockType, Instruction, MemArg};
use crate::parser::encoding::*;
use crate::parser::error::{DecodeError, DecodeErrorKind};
use crate::parser::limits::{MAX_BR_TABLE_LABELS, MAX_FUNCTION_LOCALS, MAX_SELECT_TYPES};
use crate::parser::module::{ConstExpr, FunctionBody, LocalDecl, RefType, ValueType};
use crate::parser::reader::Reader;

pub fn decode_value_type(reader: &mut Reader) -> Result<ValueType, DecodeError> {
    let offset = reader.offset();
    let byte = reader.read_byte()?;
    value_type_from_byte(byte).map_err(|kind| DecodeError::new(offset, kind))
}

fn value_type_from_byte(byte: u8) -> Result<ValueType, DecodeErrorKind> {
    match byte {
        TYPE_I32 => Ok(ValueType::I32),
        TYPE_I64 => Ok(ValueType::I64),
        TYPE_F32 => Ok(ValueType::F32),
        TYPE_F64 => Ok(ValueType::F64),
        TYPE_FUNCREF => Ok(ValueType::FuncRef),
        TYPE_EXTERNREF => Ok(ValueType::ExternRef),
        TYPE_V128 => Err(DecodeErrorKind::Unsupported("v128 values")),
        other => Err(DecodeErrorKind::InvalidValueType(other)),
    }
}

pub fn decode_ref_type(reader: &mut Reader) -> Result<RefType, DecodeError> {
    let offset = reader.offset();
    match reader.read_byte()? {
        TYPE_FUNCREF => Ok(RefType::FuncRef),
        TYPE_EXTERNREF => Ok(RefType::ExternRef),
        other => Err(DecodeError::new(offset, DecodeErrorKind::InvalidRefType(other))),
    }
}

impl BlockType {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let offset = reader.offset();
        match reader.peek_byte() {
            Some(BLOCK_TYPE_EMPTY) => {
                reader.read_byte()?;
                Ok(BlockType::Empty)
            }
            // single-byte negative values are value types
            Some(byte) if byte & 0xc0 == 0x40 => {
                reader.read_byte()?;
                value_type_from_byte(byte)
                    .map(BlockType::Value)
                    .map_err(|kind| DecodeError::new(offset, kind))
            }
            _ => {
                let index = reader.read_vs33()?;
                if index < 0 || index > u32::MAX as i64 {
                    return Err(DecodeError::new(offset, DecodeErrorKind::IntegerTooLarge));
                }
                Ok(BlockType::FuncType(index as u32))
            }
        }
    }
}

impl MemArg {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let align = reader.read_vu32()?;
        if align >= 64 {
            // bit 6 selects an explicit memory index (multi-memory)
            return Err(reader.error(DecodeErrorKind::Unsupported("multiple memories")));
        }
        let offset = reader.read_vu32()?;
        Ok(MemArg { align, offset })
    }
}

fn expect_zero_byte(reader: &mut Reader) -> Result<(), DecodeError> {
    let offset = reader.offset();
    match reader.read_byte()? {
        0 => Ok(()),
        _ => Err(DecodeError::new(offset, DecodeErrorKind::ZeroByteExpected)),
    }
}

impl Instruction {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        use Instruction::*;

        let offset = reader.offset();
        let opcode = reader.read_byte()?;

        macro_rules! simple {
            ($($name:ident = $op:literal, $text:expr;)*) => {
                match opcode {
                    $($op => return Ok(Instruction::$name),)*
                    _ => {}
                }
            };
        }
        macro_rules! memory {
            ($($name:ident = $op:literal, $text:expr, $align:literal;)*) => {
                match opcode {
                    $($op => return Ok(Instruction::$name { memarg: MemArg::decode(reader)? }),)*
                    _ => {}
                }
            };
        }
        for_each_simple_op!(simple);
        for_each_memory_op!(memory);

        let inst = match opcode {
            0x02 => Block {
                block_type: BlockType::decode(reader)?,
            },
            0x03 => Loop {
                block_type: BlockType::decode(reader)?,
            },
            0x04 => If {
                block_type: BlockType::decode(reader)?,
            },
            0x0c => Br {
                label_idx: reader.read_vu32()?,
            },
            0x0d => BrIf {
                label_idx: reader.read_vu32()?,
            },
            0x0e => {
                let count = reader.read_count("br_table labels", MAX_BR_TABLE_LABELS)?;
                let mut labels = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    labels.push(reader.read_vu32()?);
                }
                let default = reader.read_vu32()?;
                BrTable { labels, default }
            }
            0x10 => Call {
                func_idx: reader.read_vu32()?,
            },
            0x11 => {
                let type_idx = reader.read_vu32()?;
                let table_idx = reader.read_vu32()?;
                CallIndirect { type_idx, table_idx }
            }
            0xd0 => RefNull {
                ref_type: decode_ref_type(reader)?,
            },
            0xd2 => RefFunc {
                func_idx: reader.read_vu32()?,
            },
            0x1c => {
                let count = reader.read_count("select types", MAX_SELECT_TYPES)?;
                let mut val_types = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    val_types.push(decode_value_type(reader)?);
                }
                SelectTyped { val_types }
            }
            0x20 => LocalGet {
                local_idx: reader.read_vu32()?,
            },
            0x21 => LocalSet {
                local_idx: reader.read_vu32()?,
            },
            0x22 => LocalTee {
                local_idx: reader.read_vu32()?,
            },
            0x23 => GlobalGet {
                global_idx: reader.read_vu32()?,
            },
            0x24 => GlobalSet {
                global_idx: reader.read_vu32()?,
            },
            0x25 => TableGet {
                table_idx: reader.read_vu32()?,
            },
            0x26 => TableSet {
                table_idx: reader.read_vu32()?,
            },
            0x3f => {
                expect_zero_byte(reader)?;
                MemorySize
            }
            0x40 => {
                expect_zero_byte(reader)?;
                MemoryGrow
            }
            0x41 => I32Const {
                value: reader.read_vs32()?,
            },
            0x42 => I64Const {
                value: reader.read_vs64()?,
            },
            0x43 => F32Const {
                value: reader.read_f32()?,
            },
            0x44 => F64Const {
                value: reader.read_f64()?,
            },
            PREFIX_MISC => decode_misc(reader)?,
            PREFIX_SIMD => {
                return Err(DecodeError::new(offset, DecodeErrorKind::Unsupported("SIMD instructions")));
            }
            other => return Err(DecodeError::new(offset, DecodeErrorKind::UnknownOpcode(other))),
        };
        Ok(inst)
    }
}

fn decode_misc(reader: &mut Reader) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let offset = reader.offset();
    let sub = reader.read_vu32()?;

    macro_rules! misc {
        ($($name:ident = $op:literal, $text:expr;)*) => {
            match sub {
                $($op => return Ok(Instruction::$name),)*
                _ => {}
            }
        };
    }
    for_each_misc_simple_op!(misc);

    let inst = match sub {
        8 => {
            let data_idx = reader.read_vu32()?;
            expect_zero_byte(reader)?;
            MemoryInit { data_idx }
        }
        9 => DataDrop {
            data_idx: reader.read_vu32()?,
        },
        10 => {
            expect_zero_byte(reader)?;
            expect_zero_byte(reader)?;
            MemoryCopy
        }
        11 => {
            expect_zero_byte(reader)?;
            MemoryFill
        }
        12 => {
            let elem_idx = reader.read_vu32()?;
            let table_idx = reader.read_vu32()?;
            TableInit { elem_idx, table_idx }
        }
        13 => ElemDrop {
            elem_idx: reader.read_vu32()?,
        },
        14 => {
            let dst_table = reader.read_vu32()?;
            let src_table = reader.read_vu32()?;
            TableCopy { dst_table, src_table }
        }
        15 => TableGrow {
            table_idx: reader.read_vu32()?,
        },
        16 => TableSize {
            table_idx: reader.read_vu32()?,
        },
        17 => TableFill {
            table_idx: reader.read_vu32()?,
        },
        other => {
            return Err(DecodeError::new(
                offset,
                DecodeErrorKind::UnknownPrefixedOpcode(PREFIX_MISC, other),
            ))
        }
    };
    Ok(inst)
}

/// Read instructions up to and including the `end` that closes the
/// outermost level. Returns the instructions and their offsets.
fn decode_until_end(reader: &mut Reader) -> Result<(Vec<Instruction>, Vec<usize>), DecodeError> {
    let mut body = Vec::new();
    let mut offsets = Vec::new();
    let mut depth: u32 = 0;
    loop {
        if reader.is_empty() {
            return Err(reader.error(DecodeErrorKind::MissingEnd));
        }
        let offset = reader.offset();
        let inst = Instruction::decode(reader)?;
        match inst {
            Instruction::Block { .. } | Instruction::Loop { .. } | Instruction::If { .. } => depth += 1,
            Instruction::End if depth == 0 => {
                body.push(inst);
                offsets.push(offset);
                return Ok((body, offsets));
            }
            Instruction::End => depth -= 1,
            _ => {}
        }
        body.push(inst);
        offsets.push(offset);
    }
}

/// Constant expression terminated by `end`. The `end` itself is not kept.
pub fn decode_const_expr(reader: &mut Reader) -> Result<ConstExpr, DecodeError> {
    let (mut instructions, _) = decode_until_end(reader)?;
    instructions.pop();
    Ok(ConstExpr::new(instructions))
}

/// One code section entry, without its size prefix: local declarations and
/// the instruction sequence. The reader must cover exactly the body.
pub fn decode_function_body(reader: &mut Reader) -> Result<FunctionBody, DecodeError> {
    let groups = reader.read_count("local declarations", MAX_FUNCTION_LOCALS)?;
    let mut locals = Vec::with_capacity(groups as usize);
    let mut total: u64 = 0;
    for _ in 0..groups {
        let offset = reader.offset();
        let count = reader.read_vu32()?;
        total += count as u64;
        if total > MAX_FUNCTION_LOCALS as u64 {
            return Err(DecodeError::new(
                offset,
                DecodeErrorKind::LimitExceeded {
                    what: "locals",
                    count: total,
                    limit: MAX_FUNCTION_LOCALS,
                },
            ));
        }
        let value_type = decode_value_type(reader)?;
        locals.push(LocalDecl { count, value_type });
    }

    let (body, offsets) = decode_until_end(reader)?;
    if !reader.is_empty() {
        return Err(reader.error(DecodeErrorKind::SectionSizeMismatch {
            declared: (reader.pos() + reader.remaining()) as u32,
            consumed: reader.pos(),
        }));
    }
    Ok(FunctionBody { locals, body, offsets })
}
