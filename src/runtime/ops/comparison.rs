//! Test and comparison instructions
//!
//! Every comparison pushes an i32 that is 1 or 0. Float comparisons with a
//! NaN operand are false, except `ne`, which is true.

use super::{Stack, Trap, Value};

macro_rules! compare {
    ($name:ident, $pop:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.push(Value::I32(($body) as i32));
            Ok(())
        }
    };
}

pub fn i32_eqz(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_i32()?;
    stack.push(Value::I32((a == 0) as i32));
    Ok(())
}

pub fn i64_eqz(stack: &mut Stack) -> Result<(), Trap> {
    let a = stack.pop_i64()?;
    stack.push(Value::I32((a == 0) as i32));
    Ok(())
}

compare!(i32_eq, pop_i32, |a, b| a == b);
compare!(i32_ne, pop_i32, |a, b| a != b);
compare!(i32_lt_s, pop_i32, |a, b| a < b);
compare!(i32_lt_u, pop_i32, |a, b| (a as u32) < (b as u32));
compare!(i32_gt_s, pop_i32, |a, b| a > b);
compare!(i32_gt_u, pop_i32, |a, b| (a as u32) > (b as u32));
compare!(i32_le_s, pop_i32, |a, b| a <= b);
compare!(i32_le_u, pop_i32, |a, b| (a as u32) <= (b as u32));
compare!(i32_ge_s, pop_i32, |a, b| a >= b);
compare!(i32_ge_u, pop_i32, |a, b| (a as u32) >= (b as u32));

compare!(i64_eq, pop_i64, |a, b| a == b);
compare!(i64_ne, pop_i64, |a, b| a != b);
compare!(i64_lt_s, pop_i64, |a, b| a < b);
compare!(i64_lt_u, pop_i64, |a, b| (a as u64) < (b as u64));
compare!(i64_gt_s, pop_i64, |a, b| a > b);
compare!(i64_gt_u, pop_i64, |a, b| (a as u64) > (b as u64));
compare!(i64_le_s, pop_i64, |a, b| a <= b);
compare!(i64_le_u, pop_i64, |a, b| (a as u64) <= (b as u64));
compare!(i64_ge_s, pop_i64, |a, b| a >= b);
compare!(i64_ge_u, pop_i64, |a, b| (a as u64) >= (b as u64));

compare!(f32_eq, pop_f32, |a, b| a == b);
compare!(f32_ne, pop_f32, |a, b| a != b);
compare!(f32_lt, pop_f32, |a, b| a < b);
compare!(f32_gt, pop_f32, |a, b| a > b);
compare!(f32_le, pop_f32, |a, b| a <= b);
compare!(f32_ge, pop_f32, |a, b| a >= b);

compare!(f64_eq, pop_f64, |a, b| a == b);
compare!(f64_ne, pop_f64, |a, b| a != b);
compare!(f64_lt, pop_f64, |a, b| a < b);
compare!(f64_gt, pop_f64, |a, b| a > b);
compare!(f64_le, pop_f64, |a, b| a <= b);
compare!(f64_ge, pop_f64, |a, b| a >= b);
