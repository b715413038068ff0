//! Instruction implementations, grouped by instruction class
//!
//! Each operation is a free function over the operand [`Stack`] and
//! whatever store objects it touches. Control flow lives in the
//! [`Executor`](super::executor::Executor) instead, since it moves the
//! program counter and the label stack.

pub mod bitwise;
pub mod comparison;
pub mod conversion;
pub mod memory;
pub mod numeric;
pub mod parametric;
pub mod table;
pub mod variable;

pub(crate) use crate::parser::instruction::MemArg;
pub(crate) use crate::runtime::memory::Memory;
pub(crate) use crate::runtime::stack::Stack;
pub(crate) use crate::runtime::{Trap, TrapKind, Value};
