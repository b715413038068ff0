//! Arithmetic instructions
//!
//! Integer arithmetic wraps modulo 2^N except for division and remainder,
//! which trap on a zero divisor, and signed division, which traps on the
//! one overflowing case. Float arithmetic follows IEEE 754 with
//! round-to-nearest-even; NaN results go through
//! [`Stack::push_f32_result`] so the store's NaN policy applies.

use super::{Stack, Trap, TrapKind, Value};

// ============================================================================
// Constants
// ============================================================================

pub fn i32_const(stack: &mut Stack, value: i32) -> Result<(), Trap> {
    stack.push(Value::I32(value));
    Ok(())
}

pub fn i64_const(stack: &mut Stack, value: i64) -> Result<(), Trap> {
    stack.push(Value::I64(value));
    Ok(())
}

/// Pushed bit-for-bit: NaN payloads in constants are preserved.
pub fn f32_const(stack: &mut Stack, value: f32) -> Result<(), Trap> {
    stack.push(Value::F32(value));
    Ok(())
}

pub fn f64_const(stack: &mut Stack, value: f64) -> Result<(), Trap> {
    stack.push(Value::F64(value));
    Ok(())
}

// ============================================================================
// Integer arithmetic
// ============================================================================

macro_rules! int_binop {
    ($name:ident, $pop:ident, $variant:ident, $method:ident) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let c2 = stack.$pop()?;
            let c1 = stack.$pop()?;
            stack.push(Value::$variant(c1.$method(c2)));
            Ok(())
        }
    };
}

int_binop!(i32_add, pop_i32, I32, wrapping_add);
int_binop!(i32_sub, pop_i32, I32, wrapping_sub);
int_binop!(i32_mul, pop_i32, I32, wrapping_mul);
int_binop!(i64_add, pop_i64, I64, wrapping_add);
int_binop!(i64_sub, pop_i64, I64, wrapping_sub);
int_binop!(i64_mul, pop_i64, I64, wrapping_mul);

/// i32.div_s
/// 1. Pop c2, then c1
/// 2. Trap with `IntegerDivideByZero` if c2 is 0
/// 3. Trap with `IntegerOverflow` if c1 is i32::MIN and c2 is -1, since
///    2^31 is not representable
/// 4. Push c1 / c2 truncated toward zero
pub fn i32_div_s(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    if c1 == i32::MIN && c2 == -1 {
        return Err(TrapKind::IntegerOverflow.into());
    }
    stack.push(Value::I32(c1 / c2));
    Ok(())
}

/// i32.div_u: operands are reinterpreted as unsigned; traps on a zero divisor.
pub fn i32_div_u(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I32((c1 / c2) as i32));
    Ok(())
}

/// i32.rem_s
/// 1. Pop c2, then c1
/// 2. Trap with `IntegerDivideByZero` if c2 is 0
/// 3. Push the remainder, which takes the sign of c1. i32::MIN rem -1 is 0
///    rather than a trap.
pub fn i32_rem_s(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I32(c1.wrapping_rem(c2)));
    Ok(())
}

pub fn i32_rem_u(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I32((c1 % c2) as i32));
    Ok(())
}

/// i64.div_s: as `i32.div_s`, with i64::MIN / -1 trapping.
pub fn i64_div_s(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    if c1 == i64::MIN && c2 == -1 {
        return Err(TrapKind::IntegerOverflow.into());
    }
    stack.push(Value::I64(c1 / c2));
    Ok(())
}

pub fn i64_div_u(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I64((c1 / c2) as i64));
    Ok(())
}

pub fn i64_rem_s(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I64(c1.wrapping_rem(c2)));
    Ok(())
}

pub fn i64_rem_u(stack: &mut Stack) -> Result<(), Trap> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(TrapKind::IntegerDivideByZero.into());
    }
    stack.push(Value::I64((c1 % c2) as i64));
    Ok(())
}

// ============================================================================
// Float arithmetic
// ============================================================================

macro_rules! float_binop {
    ($name:ident, $pop:ident, $push:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.$push($body);
            Ok(())
        }
    };
}

macro_rules! float_unop {
    ($name:ident, $pop:ident, $push:ident, |$a:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $a = stack.$pop()?;
            stack.$push($body);
            Ok(())
        }
    };
}

float_binop!(f32_add, pop_f32, push_f32_result, |a, b| a + b);
float_binop!(f32_sub, pop_f32, push_f32_result, |a, b| a - b);
float_binop!(f32_mul, pop_f32, push_f32_result, |a, b| a * b);
float_binop!(f32_div, pop_f32, push_f32_result, |a, b| a / b);
float_binop!(f32_min, pop_f32, push_f32_result, |a, b| wasm_min_f32(a, b));
float_binop!(f32_max, pop_f32, push_f32_result, |a, b| wasm_max_f32(a, b));
float_binop!(f64_add, pop_f64, push_f64_result, |a, b| a + b);
float_binop!(f64_sub, pop_f64, push_f64_result, |a, b| a - b);
float_binop!(f64_mul, pop_f64, push_f64_result, |a, b| a * b);
float_binop!(f64_div, pop_f64, push_f64_result, |a, b| a / b);
float_binop!(f64_min, pop_f64, push_f64_result, |a, b| wasm_min_f64(a, b));
float_binop!(f64_max, pop_f64, push_f64_result, |a, b| wasm_max_f64(a, b));

float_unop!(f32_sqrt, pop_f32, push_f32_result, |a| a.sqrt());
float_unop!(f32_ceil, pop_f32, push_f32_result, |a| a.ceil());
float_unop!(f32_floor, pop_f32, push_f32_result, |a| a.floor());
float_unop!(f32_trunc, pop_f32, push_f32_result, |a| a.trunc());
float_unop!(f32_nearest, pop_f32, push_f32_result, |a| a.round_ties_even());
float_unop!(f64_sqrt, pop_f64, push_f64_result, |a| a.sqrt());
float_unop!(f64_ceil, pop_f64, push_f64_result, |a| a.ceil());
float_unop!(f64_floor, pop_f64, push_f64_result, |a| a.floor());
float_unop!(f64_trunc, pop_f64, push_f64_result, |a| a.trunc());
float_unop!(f64_nearest, pop_f64, push_f64_result, |a| a.round_ties_even());

// abs, neg and copysign only touch the sign bit, NaN payloads included.

pub fn f32_abs(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f32()?;
    stack.push(Value::F32(f32::from_bits(a.to_bits() & 0x7fff_ffff)));
    Ok(())
}

pub fn f32_neg(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f32()?;
    stack.push(Value::F32(f32::from_bits(a.to_bits() ^ 0x8000_0000)));
    Ok(())
}

pub fn f32_copysign(stack: &mut Stack) -> Result<(), Trap> {
    let b = stack.pop_f32()?;
    let a = stack.pop_f32()?;
    let bits = (a.to_bits() & 0x7fff_ffff) | (b.to_bits() & 0x8000_0000);
    stack.push(Value::F32(f32::from_bits(bits)));
    Ok(())
}

pub fn f64_abs(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f64()?;
    stack.push(Value::F64(f64::from_bits(a.to_bits() & 0x7fff_ffff_ffff_ffff)));
    Ok(())
}

pub fn f64_neg(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_f64()?;
    stack.push(Value::F64(f64::from_bits(a.to_bits() ^ 0x8000_0000_0000_0000)));
    Ok(())
}

pub fn f64_copysign(stack: &mut Stack) -> Result<(), Trap> {
    let b = stack.pop_f64()?;
    let a = stack.pop_f64()?;
    let bits = (a.to_bits() & 0x7fff_ffff_ffff_ffff) | (b.to_bits() & 0x8000_0000_0000_0000);
    stack.push(Value::F64(f64::from_bits(bits)));
    Ok(())
}

/// min: NaN if either operand is NaN, and -0 is less than +0.
fn wasm_min_f32(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        return f32::NAN;
    }
    if a == 0.0 && b == 0.0 {
        return if a.is_sign_negative() { a } else { b };
    }
    a.min(b)
}

fn wasm_max_f32(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        return f32::NAN;
    }
    if a == 0.0 && b == 0.0 {
        return if a.is_sign_positive() { a } else { b };
    }
    a.max(b)
}

fn wasm_min_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == 0.0 && b == 0.0 {
        return if a.is_sign_negative() { a } else { b };
    }
    a.min(b)
}

fn wasm_max_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == 0.0 && b == 0.0 {
        return if a.is_sign_positive() { a } else { b };
    }
    a.max(b)
}
