//! WebAssembly instruction representation.
//!
//! Instructions are decoded into a flat sequence: structured control
//! (`block`, `loop`, `if`) appears as an opening instruction followed later
//! by its `else`/`end`. The validator pairs them up once and hands the
//! interpreter a side table, so nothing here knows about nesting.

use super::module::{RefType, ValueType};
use fhex::ToHex;
use std::fmt;

/// Immediate-free instructions: variant, opcode, text-format mnemonic.
/// Shared by the decoder, the encoder and `Display`.
macro_rules! for_each_simple_op {
    ($mac:ident) => {
        $mac! {
            Unreachable = 0x00, "unreachable";
            Nop = 0x01, "nop";
            Else = 0x05, "else";
            End = 0x0b, "end";
            Return = 0x0f, "return";
            Drop = 0x1a, "drop";
            Select = 0x1b, "select";
            RefIsNull = 0xd1, "ref.is_null";

            I32Eqz = 0x45, "i32.eqz";
            I32Eq = 0x46, "i32.eq";
            I32Ne = 0x47, "i32.ne";
            I32LtS = 0x48, "i32.lt_s";
            I32LtU = 0x49, "i32.lt_u";
            I32GtS = 0x4a, "i32.gt_s";
            I32GtU = 0x4b, "i32.gt_u";
            I32LeS = 0x4c, "i32.le_s";
            I32LeU = 0x4d, "i32.le_u";
            I32GeS = 0x4e, "i32.ge_s";
            I32GeU = 0x4f, "i32.ge_u";

            I64Eqz = 0x50, "i64.eqz";
            I64Eq = 0x51, "i64.eq";
            I64Ne = 0x52, "i64.ne";
            I64LtS = 0x53, "i64.lt_s";
            I64LtU = 0x54, "i64.lt_u";
            I64GtS = 0x55, "i64.gt_s";
            I64GtU = 0x56, "i64.gt_u";
            I64LeS = 0x57, "i64.le_s";
            I64LeU = 0x58, "i64.le_u";
            I64GeS = 0x59, "i64.ge_s";
            I64GeU = 0x5a, "i64.ge_u";

            F32Eq = 0x5b, "f32.eq";
            F32Ne = 0x5c, "f32.ne";
            F32Lt = 0x5d, "f32.lt";
            F32Gt = 0x5e, "f32.gt";
            F32Le = 0x5f, "f32.le";
            F32Ge = 0x60, "f32.ge";

            F64Eq = 0x61, "f64.eq";
            F64Ne = 0x62, "f64.ne";
            F64Lt = 0x63, "f64.lt";
            F64Gt = 0x64, "f64.gt";
            F64Le = 0x65, "f64.le";
            F64Ge = 0x66, "f64.ge";

            I32Clz = 0x67, "i32.clz";
            I32Ctz = 0x68, "i32.ctz";
            I32Popcnt = 0x69, "i32.popcnt";
            I32Add = 0x6a, "i32.add";
            I32Sub = 0x6b, "i32.sub";
            I32Mul = 0x6c, "i32.mul";
            I32DivS = 0x6d, "i32.div_s";
            I32DivU = 0x6e, "i32.div_u";
            I32RemS = 0x6f, "i32.rem_s";
            I32RemU = 0x70, "i32.rem_u";
            I32And = 0x71, "i32.and";
            I32Or = 0x72, "i32.or";
            I32Xor = 0x73, "i32.xor";
            I32Shl = 0x74, "i32.shl";
            I32ShrS = 0x75, "i32.shr_s";
            I32ShrU = 0x76, "i32.shr_u";
            I32Rotl = 0x77, "i32.rotl";
            I32Rotr = 0x78, "i32.rotr";

            I64Clz = 0x79, "i64.clz";
            I64Ctz = 0x7a, "i64.ctz";
            I64Popcnt = 0x7b, "i64.popcnt";
            I64Add = 0x7c, "i64.add";
            I64Sub = 0x7d, "i64.sub";
            I64Mul = 0x7e, "i64.mul";
            I64DivS = 0x7f, "i64.div_s";
            I64DivU = 0x80, "i64.div_u";
            I64RemS = 0x81, "i64.rem_s";
            I64RemU = 0x82, "i64.rem_u";
            I64And = 0x83, "i64.and";
            I64Or = 0x84, "i64.or";
            I64Xor = 0x85, "i64.xor";
            I64Shl = 0x86, "i64.shl";
            I64ShrS = 0x87, "i64.shr_s";
            I64ShrU = 0x88, "i64.shr_u";
            I64Rotl = 0x89, "i64.rotl";
            I64Rotr = 0x8a, "i64.rotr";

            F32Abs = 0x8b, "f32.abs";
            F32Neg = 0x8c, "f32.neg";
            F32Ceil = 0x8d, "f32.ceil";
            F32Floor = 0x8e, "f32.floor";
            F32Trunc = 0x8f, "f32.trunc";
            F32Nearest = 0x90, "f32.nearest";
            F32Sqrt = 0x91, "f32.sqrt";
            F32Add = 0x92, "f32.add";
            F32Sub = 0x93, "f32.sub";
            F32Mul = 0x94, "f32.mul";
            F32Div = 0x95, "f32.div";
            F32Min = 0x96, "f32.min";
            F32Max = 0x97, "f32.max";
            F32Copysign = 0x98, "f32.copysign";

            F64Abs = 0x99, "f64.abs";
            F64Neg = 0x9a, "f64.neg";
            F64Ceil = 0x9b, "f64.ceil";
            F64Floor = 0x9c, "f64.floor";
            F64Trunc = 0x9d, "f64.trunc";
            F64Nearest = 0x9e, "f64.nearest";
            F64Sqrt = 0x9f, "f64.sqrt";
            F64Add = 0xa0, "f64.add";
            F64Sub = 0xa1, "f64.sub";
            F64Mul = 0xa2, "f64.mul";
            F64Div = 0xa3, "f64.div";
            F64Min = 0xa4, "f64.min";
            F64Max = 0xa5, "f64.max";
            F64Copysign = 0xa6, "f64.copysign";

            I32WrapI64 = 0xa7, "i32.wrap_i64";
            I32TruncF32S = 0xa8, "i32.trunc_f32_s";
            I32TruncF32U = 0xa9, "i32.trunc_f32_u";
            I32TruncF64S = 0xaa, "i32.trunc_f64_s";
            I32TruncF64U = 0xab, "i32.trunc_f64_u";
            I64ExtendI32S = 0xac, "i64.extend_i32_s";
            I64ExtendI32U = 0xad, "i64.extend_i32_u";
            I64TruncF32S = 0xae, "i64.trunc_f32_s";
            I64TruncF32U = 0xaf, "i64.trunc_f32_u";
            I64TruncF64S = 0xb0, "i64.trunc_f64_s";
            I64TruncF64U = 0xb1, "i64.trunc_f64_u";
            F32ConvertI32S = 0xb2, "f32.convert_i32_s";
            F32ConvertI32U = 0xb3, "f32.convert_i32_u";
            F32ConvertI64S = 0xb4, "f32.convert_i64_s";
            F32ConvertI64U = 0xb5, "f32.convert_i64_u";
            F32DemoteF64 = 0xb6, "f32.demote_f64";
            F64ConvertI32S = 0xb7, "f64.convert_i32_s";
            F64ConvertI32U = 0xb8, "f64.convert_i32_u";
            F64ConvertI64S = 0xb9, "f64.convert_i64_s";
            F64ConvertI64U = 0xba, "f64.convert_i64_u";
            F64PromoteF32 = 0xbb, "f64.promote_f32";
            I32ReinterpretF32 = 0xbc, "i32.reinterpret_f32";
            I64ReinterpretF64 = 0xbd, "i64.reinterpret_f64";
            F32ReinterpretI32 = 0xbe, "f32.reinterpret_i32";
            F64ReinterpretI64 = 0xbf, "f64.reinterpret_i64";

            I32Extend8S = 0xc0, "i32.extend8_s";
            I32Extend16S = 0xc1, "i32.extend16_s";
            I64Extend8S = 0xc2, "i64.extend8_s";
            I64Extend16S = 0xc3, "i64.extend16_s";
            I64Extend32S = 0xc4, "i64.extend32_s";
        }
    };
}

/// Immediate-free instructions behind the 0xFC prefix.
macro_rules! for_each_misc_simple_op {
    ($mac:ident) => {
        $mac! {
            I32TruncSatF32S = 0, "i32.trunc_sat_f32_s";
            I32TruncSatF32U = 1, "i32.trunc_sat_f32_u";
            I32TruncSatF64S = 2, "i32.trunc_sat_f64_s";
            I32TruncSatF64U = 3, "i32.trunc_sat_f64_u";
            I64TruncSatF32S = 4, "i64.trunc_sat_f32_s";
            I64TruncSatF32U = 5, "i64.trunc_sat_f32_u";
            I64TruncSatF64S = 6, "i64.trunc_sat_f64_s";
            I64TruncSatF64U = 7, "i64.trunc_sat_f64_u";
        }
    };
}

/// Loads and stores: variant, opcode, mnemonic, natural alignment (log2).
macro_rules! for_each_memory_op {
    ($mac:ident) => {
        $mac! {
            I32Load = 0x28, "i32.load", 2;
            I64Load = 0x29, "i64.load", 3;
            F32Load = 0x2a, "f32.load", 2;
            F64Load = 0x2b, "f64.load", 3;
            I32Load8S = 0x2c, "i32.load8_s", 0;
            I32Load8U = 0x2d, "i32.load8_u", 0;
            I32Load16S = 0x2e, "i32.load16_s", 1;
            I32Load16U = 0x2f, "i32.load16_u", 1;
            I64Load8S = 0x30, "i64.load8_s", 0;
            I64Load8U = 0x31, "i64.load8_u", 0;
            I64Load16S = 0x32, "i64.load16_s", 1;
            I64Load16U = 0x33, "i64.load16_u", 1;
            I64Load32S = 0x34, "i64.load32_s", 2;
            I64Load32U = 0x35, "i64.load32_u", 2;
            I32Store = 0x36, "i32.store", 2;
            I64Store = 0x37, "i64.store", 3;
            F32Store = 0x38, "f32.store", 2;
            F64Store = 0x39, "f64.store", 3;
            I32Store8 = 0x3a, "i32.store8", 0;
            I32Store16 = 0x3b, "i32.store16", 1;
            I64Store8 = 0x3c, "i64.store8", 0;
            I64Store16 = 0x3d, "i64.store16", 1;
            I64Store32 = 0x3e, "i64.store32", 2;
        }
    };
}

pub(crate) use for_each_memory_op;
pub(crate) use for_each_misc_simple_op;
pub(crate) use for_each_simple_op;

/// Memory argument for loads and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemArg {
    /// Alignment hint as a power of two
    pub align: u32,
    pub offset: u32,
}

/// Block type for structured control instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// No parameters, no results
    Empty,
    /// No parameters, one result
    Value(ValueType),
    /// Index into the type section, for multi-value blocks
    FuncType(u32),
}


/// Every instruction this engine decodes, with its immediates.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Control instructions
    Unreachable,
    Nop,
    Block { block_type: BlockType },
    Loop { block_type: BlockType },
    If { block_type: BlockType },
    Else,
    End,
    Br { label_idx: u32 },
    BrIf { label_idx: u32 },
    BrTable { labels: Vec<u32>, default: u32 },
    Return,
    Call { func_idx: u32 },
    CallIndirect { type_idx: u32, table_idx: u32 },

    // Reference instructions
    RefNull { ref_type: RefType },
    RefIsNull,
    RefFunc { func_idx: u32 },

    // Parametric instructions
    Drop,
    Select,
    SelectTyped { val_types: Vec<ValueType> },

    // Variable instructions
    LocalGet { local_idx: u32 },
    LocalSet { local_idx: u32 },
    LocalTee { local_idx: u32 },
    GlobalGet { global_idx: u32 },
    GlobalSet { global_idx: u32 },

    // Table instructions
    TableGet { table_idx: u32 },
    TableSet { table_idx: u32 },
    TableInit { elem_idx: u32, table_idx: u32 },
    ElemDrop { elem_idx: u32 },
    TableCopy { dst_table: u32, src_table: u32 },
    TableGrow { table_idx: u32 },
    TableSize { table_idx: u32 },
    TableFill { table_idx: u32 },

    // Memory instructions
    I32Load { memarg: MemArg },
    I64Load { memarg: MemArg },
    F32Load { memarg: MemArg },
    F64Load { memarg: MemArg },
    I32Load8S { memarg: MemArg },
    I32Load8U { memarg: MemArg },
    I32Load16S { memarg: MemArg },
    I32Load16U { memarg: MemArg },
    I64Load8S { memarg: MemArg },
    I64Load8U { memarg: MemArg },
    I64Load16S { memarg: MemArg },
    I64Load16U { memarg: MemArg },
    I64Load32S { memarg: MemArg },
    I64Load32U { memarg: MemArg },
    I32Store { memarg: MemArg },
    I64Store { memarg: MemArg },
    F32Store { memarg: MemArg },
    F64Store { memarg: MemArg },
    I32Store8 { memarg: MemArg },
    I32Store16 { memarg: MemArg },
    I64Store8 { memarg: MemArg },
    I64Store16 { memarg: MemArg },
    I64Store32 { memarg: MemArg },
    MemorySize,
    MemoryGrow,
    MemoryInit { data_idx: u32 },
    DataDrop { data_idx: u32 },
    MemoryCopy,
    MemoryFill,

    // Numeric instructions
    I32Const { value: i32 },
    I64Const { value: i64 },
    F32Const { value: f32 },
    F64Const { value: f64 },

    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,

    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64GtS,
    I64GtU,
    I64LeS,
    I64LeU,
    I64GeS,
    I64GeU,

    F32Eq,
    F32Ne,
    F32Lt,
    F32Gt,
    F32Le,
    F32Ge,

    F64Eq,
    F64Ne,
    F64Lt,
    F64Gt,
    F64Le,
    F64Ge,

    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Rotr,

    I64Clz,
    I64Ctz,
    I64Popcnt,
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    I64And,
    I64Or,
    I64Xor,
    I64Shl,
    I64ShrS,
    I64ShrU,
    I64Rotl,
    I64Rotr,

    F32Abs,
    F32Neg,
    F32Ceil,
    F32Floor,
    F32Trunc,
    F32Nearest,
    F32Sqrt,
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Min,
    F32Max,
    F32Copysign,

    F64Abs,
    F64Neg,
    F64Ceil,
    F64Floor,
    F64Trunc,
    F64Nearest,
    F64Sqrt,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Min,
    F64Max,
    F64Copysign,

    I32WrapI64,
    I32TruncF32S,
    I32TruncF32U,
    I32TruncF64S,
    I32TruncF64U,
    I64ExtendI32S,
    I64ExtendI32U,
    I64TruncF32S,
    I64TruncF32U,
    I64TruncF64S,
    I64TruncF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F32DemoteF64,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F64PromoteF32,
    I32ReinterpretF32,
    I64ReinterpretF64,
    F32ReinterpretI32,
    F64ReinterpretI64,

    I32Extend8S,
    I32Extend16S,
    I64Extend8S,
    I64Extend16S,
    I64Extend32S,

    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
}

impl Instruction {
    /// Text-format name of the instruction.
    pub fn mnemonic(&self) -> &'static str {
        macro_rules! simple_mnemonic {
            ($($name:ident = $op:literal, $text:expr;)*) => {
                match self {
                    $(Instruction::$name => return $text,)*
                    _ => {}
                }
            };
        }
        macro_rules! memory_mnemonic {
            ($($name:ident = $op:literal, $text:expr, $align:literal;)*) => {
                match self {
                    $(Instruction::$name { .. } => return $text,)*
                    _ => {}
                }
            };
        }
        for_each_simple_op!(simple_mnemonic);
        for_each_misc_simple_op!(simple_mnemonic);
        for_each_memory_op!(memory_mnemonic);

        match self {
            Instruction::Block { .. } => "block",
            Instruction::Loop { .. } => "loop",
            Instruction::If { .. } => "if",
            Instruction::Br { .. } => "br",
            Instruction::BrIf { .. } => "br_if",
            Instruction::BrTable { .. } => "br_table",
            Instruction::Call { .. } => "call",
            Instruction::CallIndirect { .. } => "call_indirect",
            Instruction::RefNull { .. } => "ref.null",
            Instruction::RefFunc { .. } => "ref.func",
            Instruction::SelectTyped { .. } => "select",
            Instruction::LocalGet { .. } => "local.get",
            Instruction::LocalSet { .. } => "local.set",
            Instruction::LocalTee { .. } => "local.tee",
            Instruction::GlobalGet { .. } => "global.get",
            Instruction::GlobalSet { .. } => "global.set",
            Instruction::TableGet { .. } => "table.get",
            Instruction::TableSet { .. } => "table.set",
            Instruction::TableInit { .. } => "table.init",
            Instruction::ElemDrop { .. } => "elem.drop",
            Instruction::TableCopy { .. } => "table.copy",
            Instruction::TableGrow { .. } => "table.grow",
            Instruction::TableSize { .. } => "table.size",
            Instruction::TableFill { .. } => "table.fill",
            Instruction::MemorySize => "memory.size",
            Instruction::MemoryGrow => "memory.grow",
            Instruction::MemoryInit { .. } => "memory.init",
            Instruction::DataDrop { .. } => "data.drop",
            Instruction::MemoryCopy => "memory.copy",
            Instruction::MemoryFill => "memory.fill",
            Instruction::I32Const { .. } => "i32.const",
            Instruction::I64Const { .. } => "i64.const",
            Instruction::F32Const { .. } => "f32.const",
            Instruction::F64Const { .. } => "f64.const",
            _ => "<unknown>",
        }
    }

    /// For loads and stores, the memory argument and the natural alignment
    /// (log2 of the access width).
    pub fn memory_access(&self) -> Option<(MemArg, u32)> {
        macro_rules! access {
            ($($name:ident = $op:literal, $text:expr, $align:literal;)*) => {
                match self {
                    $(Instruction::$name { memarg } => Some((*memarg, $align)),)*
                    _ => None,
                }
            };
        }
        for_each_memory_op!(access)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic();
        if let Some((memarg, natural)) = self.memory_access() {
            write!(f, "{name}")?;
            if memarg.offset != 0 {
                write!(f, " offset={}", memarg.offset)?;
            }
            if memarg.align != natural {
                write!(f, " align={}", 1u64 << memarg.align.min(63))?;
            }
            return Ok(());
        }
        match self {
            Instruction::Block { block_type } | Instruction::Loop { block_type } | Instruction::If { block_type } => {
                match block_type {
                    BlockType::Empty => write!(f, "{name}"),
                    BlockType::Value(t) => write!(f, "{name} (result {t})"),
                    BlockType::FuncType(i) => write!(f, "{name} (type {i})"),
                }
            }
            Instruction::Br { label_idx } | Instruction::BrIf { label_idx } => write!(f, "{name} {label_idx}"),
            Instruction::BrTable { labels, default } => {
                write!(f, "{name}")?;
                for l in labels {
                    write!(f, " {l}")?;
                }
                write!(f, " {default}")
            }
            Instruction::Call { func_idx } | Instruction::RefFunc { func_idx } => write!(f, "{name} {func_idx}"),
            Instruction::CallIndirect { type_idx, table_idx } => {
                write!(f, "{name} {table_idx} (type {type_idx})")
            }
            Instruction::RefNull { ref_type } => match ref_type {
                RefType::FuncRef => write!(f, "{name} func"),
                RefType::ExternRef => write!(f, "{name} extern"),
            },
            Instruction::SelectTyped { val_types } => {
                write!(f, "{name} (result")?;
                for t in val_types {
                    write!(f, " {t}")?;
                }
                write!(f, ")")
            }
            Instruction::LocalGet { local_idx }
            | Instruction::LocalSet { local_idx }
            | Instruction::LocalTee { local_idx } => write!(f, "{name} {local_idx}"),
            Instruction::GlobalGet { global_idx } | Instruction::GlobalSet { global_idx } => {
                write!(f, "{name} {global_idx}")
            }
            Instruction::TableGet { table_idx }
            | Instruction::TableSet { table_idx }
            | Instruction::TableGrow { table_idx }
            | Instruction::TableSize { table_idx }
            | Instruction::TableFill { table_idx } => write!(f, "{name} {table_idx}"),
            Instruction::TableInit { elem_idx, table_idx } => write!(f, "{name} {table_idx} {elem_idx}"),
            Instruction::ElemDrop { elem_idx } => write!(f, "{name} {elem_idx}"),
            Instruction::TableCopy { dst_table, src_table } => write!(f, "{name} {dst_table} {src_table}"),
            Instruction::MemoryInit { data_idx } | Instruction::DataDrop { data_idx } => {
                write!(f, "{name} {data_idx}")
            }
            Instruction::I32Const { value } => write!(f, "{name} {value}"),
            Instruction::I64Const { value } => write!(f, "{name} {value}"),
            Instruction::F32Const { value } => write!(f, "{name} {}", value.to_hex()),
            Instruction::F64Const { value } => write!(f, "{name} {}", value.to_hex()),
            _ => write!(f, "{name}"),
        }
    }
}

pub mod decode;
pub mod encode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Instruction::I32Add.to_string(), "i32.add");
        assert_eq!(Instruction::I32Const { value: -7 }.to_string(), "i32.const -7");
        assert_eq!(Instruction::I32TruncSatF64U.to_string(), "i32.trunc_sat_f64_u");
        assert_eq!(
            Instruction::BrTable {
                labels: vec![0, 1],
                default: 2
            }
            .to_string(),
            "br_table 0 1 2"
        );
        assert_eq!(
            Instruction::I64Load32U {
                memarg: MemArg { align: 2, offset: 8 }
            }
            .to_string(),
            "i64.load32_u offset=8"
        );
        assert_eq!(
            Instruction::Block {
                block_type: BlockType::Value(ValueType::F64)
            }
            .to_string(),
            "block (result f64)"
        );
    }

    #[test]
    fn test_memory_access_natural_alignment() {
        let memarg = MemArg { align: 0, offset: 0 };
        assert_eq!(Instruction::I64Load { memarg }.memory_access(), Some((memarg, 3)));
        assert_eq!(Instruction::I32Store16 { memarg }.memory_access(), Some((memarg, 1)));
        assert_eq!(Instruction::MemorySize.memory_access(), None);
    }
}
