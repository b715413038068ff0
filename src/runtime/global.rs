//! Global instances

use super::{RuntimeError, Value};
use crate::parser::module::GlobalType;

#[derive(Debug, Clone)]
pub struct Global {
    global_type: GlobalType,
    value: Value,
}

impl Global {
    pub fn new(global_type: GlobalType, value: Value) -> Self {
        Global { global_type, value }
    }

    pub fn global_type(&self) -> GlobalType {
        self.global_type
    }

    pub fn get(&self) -> Value {
        self.value
    }

    /// Host-facing write: checks mutability and type.
    pub fn set(&mut self, value: Value) -> Result<(), RuntimeError> {
        if !self.global_type.mutable {
            return Err(RuntimeError::ImmutableGlobal);
        }
        if value.typ() != self.global_type.value_type {
            return Err(RuntimeError::GlobalType {
                expected: self.global_type.value_type,
                actual: value.typ(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Write from validated code, which only ever targets mutable globals
    /// with a value of the right type.
    pub(crate) fn set_unchecked(&mut self, value: Value) {
        self.value = value;
    }
}
