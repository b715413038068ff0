//! WebAssembly runtime
//!
//! The [`Store`] owns every runtime object. Instantiating a validated
//! module allocates its functions, tables, memories and globals in the
//! store and returns an [`InstanceId`]; invoking an export runs the
//! interpreter in [`executor`] until the call returns or traps.

pub mod control;
pub mod executor;
pub mod frame;
pub mod global;
pub mod host;
pub mod imports;
pub mod instance;
pub mod memory;
pub mod ops;
pub mod stack;
pub mod store;
pub mod table;
pub mod test_utils;
pub mod trap;
pub mod value;

pub use global::Global;
pub use host::{spectest_imports, HostFunc};
pub use imports::{Extern, Imports, LinkError};
pub use instance::ModuleInstance;
pub use memory::{Memory, PAGE_SIZE};
pub use store::{
    DataAddr, ElemAddr, FuncAddr, FunctionInstance, GlobalAddr, InstanceId, Instantiated, MemoryAddr, Store, StoreId, TableAddr,
};
pub use table::Table;
pub use trap::{Trap, TrapKind};
pub use value::Value;

use crate::parser::module::ValueType;
use crate::parser::validate::ValidationError;
use thiserror::Error;

/// Why instantiation failed. Nothing stays allocated unless the failure is
/// a trap while initialising segments, which leaves the instance and the
/// writes that already happened.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstantiationError {
    #[error("invalid module: {0}")]
    Validation(#[from] ValidationError),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("instantiation trapped: {0}")]
    Trap(Trap),

    #[error("resource limit: {0}")]
    Resource(String),
}

/// Errors from invoking or inspecting a live instance
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("unknown instance {0}")]
    UnknownInstance(usize),

    #[error("unknown export: {0}")]
    UnknownExport(String),

    #[error("export {name} is a {kind}, not a function")]
    NotAFunction { name: String, kind: &'static str },

    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("argument {index} has type {actual}, expected {expected}")]
    ArgumentType {
        index: usize,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("global is immutable")]
    ImmutableGlobal,

    #[error("global has type {expected}, cannot store {actual}")]
    GlobalType { expected: ValueType, actual: ValueType },

    #[error(transparent)]
    Trap(#[from] Trap),
}
