//! Parametric instructions: `drop` and `select`

use super::{Stack, Trap};

pub fn drop(stack: &mut Stack) -> Result<(), Trap> {
    stack.pop()?;
    Ok(())
}

/// select (typed or untyped)
/// 1. Pop the i32 condition c
/// 2. Pop val2, then val1
/// 3. Push val1 if c is non-zero, else val2
pub fn select(stack: &mut Stack) -> Result<(), Trap> {
    let c = stack.pop_i32()?;
    let val2 = stack.pop()?;
    let val1 = stack.pop()?;
    stack.push(if c != 0 { val1 } else { val2 });
    Ok(())
}
