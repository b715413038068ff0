//! Conversion instructions
//!
//! Covers wrapping and extension between integer widths, float to integer
//! truncation in trapping and saturating forms, integer to float
//! conversion, demotion and promotion, bit reinterpretation, and the
//! in-place sign-extension operators.

use super::{Stack, Trap, TrapKind, Value};

/// Truncate toward zero, trapping unless the result lies in
/// `[min, max_exclusive)`. Both bounds are exact powers of two, so the
/// comparison in f64 is exact for f32 and f64 inputs alike.
fn trunc_checked(x: f64, min: f64, max_exclusive: f64) -> Result<f64, Trap> {
    if x.is_nan() {
        return Err(TrapKind::InvalidConversionToInteger.into());
    }
    let t = x.trunc();
    if t < min || t >= max_exclusive {
        return Err(TrapKind::IntegerOverflow.into());
    }
    Ok(t)
}

const I32_MIN: f64 = -2147483648.0;
const I32_END: f64 = 2147483648.0;
const U32_END: f64 = 4294967296.0;
const I64_MIN: f64 = -9223372036854775808.0;
const I64_END: f64 = 9223372036854775808.0;
const U64_END: f64 = 18446744073709551616.0;

macro_rules! convert {
    ($name:ident, $pop:ident, |$a:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $a = stack.$pop()?;
            stack.push($body);
            Ok(())
        }
    };
}

macro_rules! trunc {
    ($name:ident, $pop:ident, $variant:ident, $target:ty, $min:expr, $end:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let a = stack.$pop()? as f64;
            let t = trunc_checked(a, $min, $end)?;
            stack.push(Value::$variant(t as $target as _));
            Ok(())
        }
    };
}

// ============================================================================
// Integer width changes
// ============================================================================

convert!(i32_wrap_i64, pop_i64, |a| Value::I32(a as i32));
convert!(i64_extend_i32_s, pop_i32, |a| Value::I64(a as i64));
convert!(i64_extend_i32_u, pop_i32, |a| Value::I64(a as u32 as i64));

convert!(i32_extend8_s, pop_i32, |a| Value::I32(a as i8 as i32));
convert!(i32_extend16_s, pop_i32, |a| Value::I32(a as i16 as i32));
convert!(i64_extend8_s, pop_i64, |a| Value::I64(a as i8 as i64));
convert!(i64_extend16_s, pop_i64, |a| Value::I64(a as i16 as i64));
convert!(i64_extend32_s, pop_i64, |a| Value::I64(a as i32 as i64));

// ============================================================================
// Float to integer
// ============================================================================

trunc!(i32_trunc_f32_s, pop_f32, I32, i32, I32_MIN, I32_END);
trunc!(i32_trunc_f32_u, pop_f32, I32, u32, 0.0, U32_END);
trunc!(i32_trunc_f64_s, pop_f64, I32, i32, I32_MIN, I32_END);
trunc!(i32_trunc_f64_u, pop_f64, I32, u32, 0.0, U32_END);
trunc!(i64_trunc_f32_s, pop_f32, I64, i64, I64_MIN, I64_END);
trunc!(i64_trunc_f32_u, pop_f32, I64, u64, 0.0, U64_END);
trunc!(i64_trunc_f64_s, pop_f64, I64, i64, I64_MIN, I64_END);
trunc!(i64_trunc_f64_u, pop_f64, I64, u64, 0.0, U64_END);

// Rust's float to int `as` already saturates and maps NaN to 0.
convert!(i32_trunc_sat_f32_s, pop_f32, |a| Value::I32(a as i32));
convert!(i32_trunc_sat_f32_u, pop_f32, |a| Value::I32(a as u32 as i32));
convert!(i32_trunc_sat_f64_s, pop_f64, |a| Value::I32(a as i32));
convert!(i32_trunc_sat_f64_u, pop_f64, |a| Value::I32(a as u32 as i32));
convert!(i64_trunc_sat_f32_s, pop_f32, |a| Value::I64(a as i64));
convert!(i64_trunc_sat_f32_u, pop_f32, |a| Value::I64(a as u64 as i64));
convert!(i64_trunc_sat_f64_s, pop_f64, |a| Value::I64(a as i64));
convert!(i64_trunc_sat_f64_u, pop_f64, |a| Value::I64(a as u64 as i64));

// ============================================================================
// Integer to float
// ============================================================================

convert!(f32_convert_i32_s, pop_i32, |a| Value::F32(a as f32));
convert!(f32_convert_i32_u, pop_i32, |a| Value::F32(a as u32 as f32));
convert!(f32_convert_i64_s, pop_i64, |a| Value::F32(a as f32));
convert!(f32_convert_i64_u, pop_i64, |a| Value::F32(a as u64 as f32));
convert!(f64_convert_i32_s, pop_i32, |a| Value::F64(a as f64));
convert!(f64_convert_i32_u, pop_i32, |a| Value::F64(a as u32 as f64));
convert!(f64_convert_i64_s, pop_i64, |a| Value::F64(a as f64));
convert!(f64_convert_i64_u, pop_i64, |a| Value::F64(a as u64 as f64));

// ============================================================================
// Float width changes
// ============================================================================

pub fn f32_demote_f64(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f64()?;
    stack.push_f32_result(a as f32);
    Ok(())
}

pub fn f64_promote_f32(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f32()?;
    stack.push_f64_result(a as f64);
    Ok(())
}

// ============================================================================
// Reinterpretation
// ============================================================================

convert!(i32_reinterpret_f32, pop_f32, |a| Value::I32(a.to_bits() as i32));
convert!(i64_reinterpret_f64, pop_f64, |a| Value::I64(a.to_bits() as i64));
convert!(f32_reinterpret_i32, pop_i32, |a| Value::F32(f32::from_bits(a as u32)));
convert!(f64_reinterpret_i64, pop_i64, |a| Value::F64(f64::from_bits(a as u64)));
