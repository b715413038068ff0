//! WebAssembly operand stack
//!
//! One stack serves a whole invocation; each activation frame owns the
//! values above its recorded base. Validation guarantees operands are present
//! and correctly typed, so the typed pops only fail on internal errors.

use super::{Trap, TrapKind, Value};

const CANONICAL_NAN_F32: u32 = 0x7fc0_0000;
const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
    /// Replace NaN results of float arithmetic with the canonical NaN
    canonicalize_nans: bool,
}

fn mismatch() -> Trap {
    Trap::new(TrapKind::StackTypeMismatch)
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    pub fn with_nan_canonicalization(canonicalize_nans: bool) -> Self {
        Stack {
            values: Vec::new(),
            canonicalize_nans,
        }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn push_all(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    /// Push the result of a float arithmetic operator.
    pub fn push_f32_result(&mut self, value: f32) {
        let value = if self.canonicalize_nans && value.is_nan() {
            f32::from_bits(CANONICAL_NAN_F32)
        } else {
            value
        };
        self.values.push(Value::F32(value));
    }

    /// Push the result of a float arithmetic operator.
    pub fn push_f64_result(&mut self, value: f64) {
        let value = if self.canonicalize_nans && value.is_nan() {
            f64::from_bits(CANONICAL_NAN_F64)
        } else {
            value
        };
        self.values.push(Value::F64(value));
    }

    pub fn pop(&mut self) -> Result<Value, Trap> {
        self.values.pop().ok_or_else(mismatch)
    }

    pub fn pop_i32(&mut self) -> Result<i32, Trap> {
        self.pop()?.as_i32().ok_or_else(mismatch)
    }

    pub fn pop_i64(&mut self) -> Result<i64, Trap> {
        self.pop()?.as_i64().ok_or_else(mismatch)
    }

    pub fn pop_f32(&mut self) -> Result<f32, Trap> {
        self.pop()?.as_f32().ok_or_else(mismatch)
    }

    pub fn pop_f64(&mut self) -> Result<f64, Trap> {
        self.pop()?.as_f64().ok_or_else(mismatch)
    }

    /// Pop an `i32` used as an unsigned address, length or index
    pub fn pop_u32(&mut self) -> Result<u32, Trap> {
        Ok(self.pop_i32()? as u32)
    }

    /// Pop a reference of either type
    pub fn pop_ref(&mut self) -> Result<Value, Trap> {
        match self.pop()? {
            v @ (Value::FuncRef(_) | Value::ExternRef(_)) => Ok(v),
            _ => Err(mismatch()),
        }
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Remove the top `count` values, returning them bottom first.
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, Trap> {
        let start = self.values.len().checked_sub(count).ok_or_else(mismatch)?;
        Ok(self.values.split_off(start))
    }

    /// Keep the top `arity` values and discard everything between them and
    /// `height`. This is how a branch unwinds a block.
    pub fn unwind(&mut self, height: usize, arity: usize) {
        let keep_from = self.values.len().saturating_sub(arity);
        if keep_from > height {
            self.values.drain(height..keep_from);
        }
    }

    pub fn drain(&mut self) -> Vec<Value> {
        self.values.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();

        stack.push(Value::I32(42));
        stack.push(Value::I64(100));

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap(), Value::I64(100));
        assert_eq!(stack.pop().unwrap(), Value::I32(42));
        assert!(stack.pop().is_err());
    }

    #[test]
    fn test_typed_pop_mismatch() {
        let mut stack = Stack::new();
        stack.push(Value::F32(1.0));
        assert_eq!(stack.pop_i32().unwrap_err().kind, TrapKind::StackTypeMismatch);
    }

    #[test]
    fn test_unwind_keeps_results() {
        let mut stack = Stack::new();
        stack.push_all([1, 2, 3, 4, 5].map(Value::I32));
        stack.unwind(1, 2);
        assert_eq!(stack.drain(), vec![Value::I32(1), Value::I32(4), Value::I32(5)]);

        stack.push_all([1, 2].map(Value::I32));
        stack.unwind(2, 0);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_pop_n() {
        let mut stack = Stack::new();
        stack.push_all([1, 2, 3].map(Value::I32));
        assert_eq!(stack.pop_n(2).unwrap(), vec![Value::I32(2), Value::I32(3)]);
        assert!(stack.pop_n(2).is_err());
    }

    #[test]
    fn test_nan_canonicalization() {
        let payload = f32::from_bits(0x7fa0_0001);
        let mut stack = Stack::with_nan_canonicalization(true);
        stack.push_f32_result(payload);
        assert_eq!(stack.pop_f32().unwrap().to_bits(), CANONICAL_NAN_F32);
        stack.push_f64_result(f64::NAN.copysign(-1.0));
        assert_eq!(stack.pop_f64().unwrap().to_bits(), CANONICAL_NAN_F64);

        let mut stack = Stack::new();
        stack.push_f32_result(payload);
        assert_eq!(stack.pop_f32().unwrap().to_bits(), 0x7fa0_0001);
    }
}
