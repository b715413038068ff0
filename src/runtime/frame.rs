//! Activation frame for one executing guest function

use super::{control::LabelStack, instance::ModuleInstance, Value};
use crate::parser::validate::CompiledFunction;
use std::sync::Arc;

#[derive(Debug)]
pub struct Frame {
    pub instance: Arc<ModuleInstance>,
    pub code: Arc<CompiledFunction>,
    /// Position to resume at once the callee returns
    pub pc: usize,
    /// Parameters followed by declared locals
    pub locals: Vec<Value>,
    pub labels: LabelStack,
    /// Operand stack height when the frame was entered, below its arguments
    pub stack_base: usize,
    /// Number of results the function returns
    pub arity: usize,
}

impl Frame {
    /// Enter `code` with `args` already popped from the caller's operands.
    pub fn new(instance: Arc<ModuleInstance>, code: Arc<CompiledFunction>, args: Vec<Value>, stack_base: usize) -> Self {
        let mut locals = args;
        locals.reserve(code.locals.len());
        locals.extend(code.locals.iter().map(|t| Value::default_for(*t)));
        let arity = code.func_type.return_types.len();
        Frame {
            instance,
            code,
            pc: 0,
            locals,
            labels: LabelStack::new(),
            stack_base,
            arity,
        }
    }
}
