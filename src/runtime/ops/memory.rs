//! Memory instructions
//!
//! The effective address of a load or store is the popped i32 operand,
//! read as unsigned, plus the static offset, computed in 64 bits. The whole
//! access must fit inside the memory or it traps before touching anything.

use super::{MemArg, Memory, Stack, Trap, Value};

#[inline]
fn effective_address(stack: &mut Stack, memarg: &MemArg) -> Result<u64, Trap> {
    let base = stack.pop_u32()?;
    Ok(base as u64 + memarg.offset as u64)
}

macro_rules! load {
    ($name:ident, $read:ident, |$raw:ident| $value:expr) => {
        pub fn $name(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), Trap> {
            let addr = effective_address(stack, memarg)?;
            let $raw = memory.$read(addr)?;
            stack.push($value);
            Ok(())
        }
    };
}

macro_rules! store {
    ($name:ident, $pop:ident, $write:ident, |$value:ident| $raw:expr) => {
        pub fn $name(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), Trap> {
            let $value = stack.$pop()?;
            let addr = effective_address(stack, memarg)?;
            memory.$write(addr, $raw)
        }
    };
}

// ============================================================================
// Loads
// ============================================================================

load!(i32_load, read_u32, |v| Value::I32(v as i32));
load!(i64_load, read_u64, |v| Value::I64(v as i64));
load!(f32_load, read_u32, |v| Value::F32(f32::from_bits(v)));
load!(f64_load, read_u64, |v| Value::F64(f64::from_bits(v)));
load!(i32_load8_s, read_u8, |v| Value::I32(v as i8 as i32));
load!(i32_load8_u, read_u8, |v| Value::I32(v as i32));
load!(i32_load16_s, read_u16, |v| Value::I32(v as i16 as i32));
load!(i32_load16_u, read_u16, |v| Value::I32(v as i32));
load!(i64_load8_s, read_u8, |v| Value::I64(v as i8 as i64));
load!(i64_load8_u, read_u8, |v| Value::I64(v as i64));
load!(i64_load16_s, read_u16, |v| Value::I64(v as i16 as i64));
load!(i64_load16_u, read_u16, |v| Value::I64(v as i64));
load!(i64_load32_s, read_u32, |v| Value::I64(v as i32 as i64));
load!(i64_load32_u, read_u32, |v| Value::I64(v as i64));

// ============================================================================
// Stores
// ============================================================================

store!(i32_store, pop_i32, write_u32, |v| v as u32);
store!(i64_store, pop_i64, write_u64, |v| v as u64);
store!(f32_store, pop_f32, write_u32, |v| v.to_bits());
store!(f64_store, pop_f64, write_u64, |v| v.to_bits());
store!(i32_store8, pop_i32, write_u8, |v| v as u8);
store!(i32_store16, pop_i32, write_u16, |v| v as u16);
store!(i64_store8, pop_i64, write_u8, |v| v as u8);
store!(i64_store16, pop_i64, write_u16, |v| v as u16);
store!(i64_store32, pop_i64, write_u32, |v| v as u32);

// ============================================================================
// Size and bulk operations
// ============================================================================

pub fn memory_size(stack: &mut Stack, memory: &Memory) -> Result<(), Trap> {
    stack.push(Value::I32(memory.size() as i32));
    Ok(())
}

/// memory.grow
/// 1. Pop the page delta n
/// 2. Try to grow by n pages
/// 3. Push the old size in pages, or -1 if the memory could not grow, in
///    which case it is unchanged
pub fn memory_grow(stack: &mut Stack, memory: &mut Memory) -> Result<(), Trap> {
    let delta = stack.pop_u32()?;
    stack.push(Value::I32(memory.grow(delta)));
    Ok(())
}

/// memory.fill: pops length, byte value and destination, in that order.
pub fn memory_fill(stack: &mut Stack, memory: &mut Memory) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let value = stack.pop_i32()?;
    let dst = stack.pop_u32()?;
    memory.fill(dst, value as u8, len)
}

/// memory.copy: overlapping ranges copy as if through a temporary buffer.
pub fn memory_copy(stack: &mut Stack, memory: &mut Memory) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let src = stack.pop_u32()?;
    let dst = stack.pop_u32()?;
    memory.copy_within(dst, src, len)
}

/// memory.init: a dropped segment behaves as an empty one, so only a
/// zero-length init at an in-bounds offset succeeds.
pub fn memory_init(stack: &mut Stack, memory: &mut Memory, data: &[u8]) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let src = stack.pop_u32()?;
    let dst = stack.pop_u32()?;
    memory.init(dst, data, src, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::Limits;
    use crate::runtime::TrapKind;

    const NO_OFFSET: MemArg = MemArg { align: 0, offset: 0 };

    fn one_page() -> Memory {
        Memory::new(Limits::new(1, Some(2)), 65536).unwrap()
    }

    #[test]
    fn test_store_then_load() {
        let mut memory = one_page();
        let mut stack = Stack::new();
        stack.push(Value::I32(16));
        stack.push(Value::I32(-2));
        i32_store(&mut stack, &mut memory, &NO_OFFSET).unwrap();

        stack.push(Value::I32(16));
        i32_load8_u(&mut stack, &memory, &NO_OFFSET).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(0xfe));

        stack.push(Value::I32(12));
        i64_load32_s(&mut stack, &memory, &MemArg { align: 2, offset: 4 }).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I64(-2));
    }

    #[test]
    fn test_load_straddling_end_traps() {
        let memory = one_page();
        let mut stack = Stack::new();
        stack.push(Value::I32(65535));
        let err = i32_load(&mut stack, &memory, &NO_OFFSET).unwrap_err();
        assert_eq!(err.kind, TrapKind::MemoryOutOfBounds);

        stack.push(Value::I32(-1));
        let err = i32_load8_u(&mut stack, &memory, &MemArg { align: 0, offset: u32::MAX }).unwrap_err();
        assert_eq!(err.kind, TrapKind::MemoryOutOfBounds);
    }

    #[test]
    fn test_grow_reports_old_size() {
        let mut memory = one_page();
        let mut stack = Stack::new();
        stack.push(Value::I32(1));
        memory_grow(&mut stack, &mut memory).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(1));

        stack.push(Value::I32(1));
        memory_grow(&mut stack, &mut memory).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(-1));

        memory_size(&mut stack, &memory).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(2));
    }

    #[test]
    fn test_fill_and_copy() {
        let mut memory = one_page();
        let mut stack = Stack::new();
        stack.push_all([Value::I32(0), Value::I32(0xab), Value::I32(4)]);
        memory_fill(&mut stack, &mut memory).unwrap();
        stack.push_all([Value::I32(2), Value::I32(0), Value::I32(4)]);
        memory_copy(&mut stack, &mut memory).unwrap();
        assert_eq!(&memory.data()[..7], &[0xab, 0xab, 0xab, 0xab, 0xab, 0xab, 0]);

        stack.push_all([Value::I32(65535), Value::I32(0), Value::I32(2)]);
        assert_eq!(
            memory_fill(&mut stack, &mut memory).unwrap_err().kind,
            TrapKind::MemoryOutOfBounds
        );
    }

    #[test]
    fn test_init_from_dropped_segment() {
        let mut memory = one_page();
        let mut stack = Stack::new();
        stack.push_all([Value::I32(0), Value::I32(0), Value::I32(0)]);
        memory_init(&mut stack, &mut memory, &[]).unwrap();
        stack.push_all([Value::I32(0), Value::I32(0), Value::I32(1)]);
        assert!(memory_init(&mut stack, &mut memory, &[]).is_err());
    }
}
