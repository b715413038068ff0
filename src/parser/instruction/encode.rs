//! Opcode encoding, the inverse of [`Instruction::decode`].

use super::{for_each_memory_op, for_each_misc_simple_op, for_each_simple_op, BlockType, Instruction};
use crate::parser::encoding::*;
use crate::parser::module::{RefType, ValueType};

fn ref_type_byte(ref_type: RefType) -> u8 {
    ref_type.value_type().byte()
}

impl BlockType {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            BlockType::Empty => buf.push(BLOCK_TYPE_EMPTY),
            BlockType::Value(t) => buf.push(t.byte()),
            BlockType::FuncType(index) => write_vs64(buf, *index as i64),
        }
    }
}

fn write_misc(buf: &mut Vec<u8>, sub: u32) {
    buf.push(PREFIX_MISC);
    write_vu32(buf, sub);
}

impl Instruction {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        use Instruction::*;

        macro_rules! simple {
            ($($name:ident = $op:literal, $text:expr;)*) => {
                match self {
                    $(Instruction::$name => {
                        buf.push($op);
                        return;
                    })*
                    _ => {}
                }
            };
        }
        macro_rules! misc {
            ($($name:ident = $op:literal, $text:expr;)*) => {
                match self {
                    $(Instruction::$name => {
                        write_misc(buf, $op);
                        return;
                    })*
                    _ => {}
                }
            };
        }
        macro_rules! memory {
            ($($name:ident = $op:literal, $text:expr, $align:literal;)*) => {
                match self {
                    $(Instruction::$name { memarg } => {
                        buf.push($op);
                        write_vu32(buf, memarg.align);
                        write_vu32(buf, memarg.offset);
                        return;
                    })*
                    _ => {}
                }
            };
        }
        for_each_simple_op!(simple);
        for_each_misc_simple_op!(misc);
        for_each_memory_op!(memory);

        match self {
            Block { block_type } => {
                buf.push(0x02);
                block_type.encode(buf);
            }
            Loop { block_type } => {
                buf.push(0x03);
                block_type.encode(buf);
            }
            If { block_type } => {
                buf.push(0x04);
                block_type.encode(buf);
            }
            Br { label_idx } => {
                buf.push(0x0c);
                write_vu32(buf, *label_idx);
            }
            BrIf { label_idx } => {
                buf.push(0x0d);
                write_vu32(buf, *label_idx);
            }
            BrTable { labels, default } => {
                buf.push(0x0e);
                write_vu32(buf, labels.len() as u32);
                for label in labels {
                    write_vu32(buf, *label);
                }
                write_vu32(buf, *default);
            }
            Call { func_idx } => {
                buf.push(0x10);
                write_vu32(buf, *func_idx);
            }
            CallIndirect { type_idx, table_idx } => {
                buf.push(0x11);
                write_vu32(buf, *type_idx);
                write_vu32(buf, *table_idx);
            }
            RefNull { ref_type } => {
                buf.push(0xd0);
                buf.push(ref_type_byte(*ref_type));
            }
            RefFunc { func_idx } => {
                buf.push(0xd2);
                write_vu32(buf, *func_idx);
            }
            SelectTyped { val_types } => {
                buf.push(0x1c);
                write_vu32(buf, val_types.len() as u32);
                buf.extend(val_types.iter().map(ValueType::byte));
            }
            LocalGet { local_idx } => {
                buf.push(0x20);
                write_vu32(buf, *local_idx);
            }
            LocalSet { local_idx } => {
                buf.push(0x21);
                write_vu32(buf, *local_idx);
            }
            LocalTee { local_idx } => {
                buf.push(0x22);
                write_vu32(buf, *local_idx);
            }
            GlobalGet { global_idx } => {
                buf.push(0x23);
                write_vu32(buf, *global_idx);
            }
            GlobalSet { global_idx } => {
                buf.push(0x24);
                write_vu32(buf, *global_idx);
            }
            TableGet { table_idx } => {
                buf.push(0x25);
                write_vu32(buf, *table_idx);
            }
            TableSet { table_idx } => {
                buf.push(0x26);
                write_vu32(buf, *table_idx);
            }
            MemorySize => buf.extend([0x3f, 0x00]),
            MemoryGrow => buf.extend([0x40, 0x00]),
            I32Const { value } => {
                buf.push(0x41);
                write_vs32(buf, *value);
            }
            I64Const { value } => {
                buf.push(0x42);
                write_vs64(buf, *value);
            }
            F32Const { value } => {
                buf.push(0x43);
                write_f32(buf, *value);
            }
            F64Const { value } => {
                buf.push(0x44);
                write_f64(buf, *value);
            }
            MemoryInit { data_idx } => {
                write_misc(buf, 8);
                write_vu32(buf, *data_idx);
                buf.push(0x00);
            }
            DataDrop { data_idx } => {
                write_misc(buf, 9);
                write_vu32(buf, *data_idx);
            }
            MemoryCopy => {
                write_misc(buf, 10);
                buf.extend([0x00, 0x00]);
            }
            MemoryFill => {
                write_misc(buf, 11);
                buf.push(0x00);
            }
            TableInit { elem_idx, table_idx } => {
                write_misc(buf, 12);
                write_vu32(buf, *elem_idx);
                write_vu32(buf, *table_idx);
            }
            ElemDrop { elem_idx } => {
                write_misc(buf, 13);
                write_vu32(buf, *elem_idx);
            }
            TableCopy { dst_table, src_table } => {
                write_misc(buf, 14);
                write_vu32(buf, *dst_table);
                write_vu32(buf, *src_table);
            }
            TableGrow { table_idx } => {
                write_misc(buf, 15);
                write_vu32(buf, *table_idx);
            }
            TableSize { table_idx } => {
                write_misc(buf, 16);
                write_vu32(buf, *table_idx);
            }
            TableFill { table_idx } => {
                write_misc(buf, 17);
                write_vu32(buf, *table_idx);
            }
            // everything else was handled by the opcode tables
            _ => {}
        }
    }
}
