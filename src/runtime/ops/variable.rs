//! Variable instructions: locals of the current frame and globals
//!
//! Indices are checked by validation; an index that is still out of range
//! reports a stack type mismatch instead of panicking.

use super::{Stack, Trap, TrapKind};
use crate::runtime::frame::Frame;
use crate::runtime::global::Global;

fn local_slot(frame: &mut Frame, local_idx: u32) -> Result<&mut crate::runtime::Value, Trap> {
    frame
        .locals
        .get_mut(local_idx as usize)
        .ok_or_else(|| Trap::new(TrapKind::StackTypeMismatch))
}

pub fn local_get(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), Trap> {
    let value = *local_slot(frame, local_idx)?;
    stack.push(value);
    Ok(())
}

pub fn local_set(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), Trap> {
    let value = stack.pop()?;
    *local_slot(frame, local_idx)? = value;
    Ok(())
}

/// local.tee: like `local.set`, but the value stays on the stack.
pub fn local_tee(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), Trap> {
    let value = *stack.peek().ok_or_else(|| Trap::new(TrapKind::StackTypeMismatch))?;
    *local_slot(frame, local_idx)? = value;
    Ok(())
}

pub fn global_get(stack: &mut Stack, global: &Global) -> Result<(), Trap> {
    stack.push(global.get());
    Ok(())
}

pub fn global_set(stack: &mut Stack, global: &mut Global) -> Result<(), Trap> {
    global.set_unchecked(stack.pop()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::{GlobalType, ValueType};
    use crate::runtime::Value;

    #[test]
    fn test_tee_keeps_value() {
        let mut stack = Stack::new();
        let mut global = Global::new(
            GlobalType {
                value_type: ValueType::I32,
                mutable: true,
            },
            Value::I32(0),
        );
        stack.push(Value::I32(9));
        global_set(&mut stack, &mut global).unwrap();
        global_get(&mut stack, &global).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(9));
    }
}
