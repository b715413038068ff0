//! A WebAssembly 2.0 core engine: decoder, validator and interpreter.
//!
//! tern runs untrusted WebAssembly modules from a host Rust program. The
//! pipeline has four stages, each with its own error type:
//!
//! - [`decode`] reads `.wasm` bytes into a [`Module`] ([`DecodeError`])
//! - [`validate`] type-checks it and caches the result ([`ValidationError`])
//! - [`Store::instantiate`] links imports and allocates state
//!   ([`InstantiationError`], wrapping [`LinkError`] and [`Trap`])
//! - [`Store::invoke`] calls an export ([`RuntimeError`], wrapping [`Trap`])
//!
//! Everything after decoding works on `Arc<Module>`, so one decoded module
//! can be instantiated many times, in one store or several.
//!
//! # Modules
//!
//! - [`parser`] -- binary decoder, module representation and validator
//! - [`encoder`] -- serialises a [`Module`] back to `.wasm` bytes
//! - [`runtime`] -- store, instances, host functions and the interpreter
//! - [`config`] -- resource limits, loadable from JSON
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tern::{Imports, Store, Value};
//!
//! // (module (func (export "add") (param i32 i32) (result i32)
//! //   local.get 0 local.get 1 i32.add))
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
//!     0x01, 0x07, 0x01, 0x60, 0x02, 0x7f, 0x7f, 0x01, 0x7f, // type
//!     0x03, 0x02, 0x01, 0x00, // function
//!     0x07, 0x07, 0x01, 0x03, b'a', b'd', b'd', 0x00, 0x00, // export
//!     0x0a, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b, // code
//! ];
//!
//! let module = Arc::new(tern::decode(&bytes).unwrap());
//! tern::validate(&module).unwrap();
//!
//! let mut store = Store::new();
//! let instance = store.instantiate(&module, &Imports::new()).unwrap().instance;
//! let results = store.invoke(instance, "add", &[Value::I32(2), Value::I32(3)]).unwrap();
//! assert_eq!(results, vec![Value::I32(5)]);
//! ```

pub mod config;
pub mod encoder;
pub mod parser;
pub mod runtime;

pub use config::{Config, ConfigError};
pub use parser::decode;
pub use parser::module::{FunctionType, Module, ValueType};
pub use parser::validate::ValidationError;
pub use parser::{DecodeError, DecodeErrorKind};
pub use runtime::{
    spectest_imports, Extern, FuncAddr, GlobalAddr, Imports, InstanceId, Instantiated, InstantiationError, LinkError,
    MemoryAddr, ModuleInstance, RuntimeError, Store, StoreId, TableAddr, Trap, TrapKind, Value,
};

/// Validate a decoded module. The result is cached in the module, so
/// validating again, or instantiating afterwards, does not repeat the work.
pub fn validate(module: &Module) -> Result<(), ValidationError> {
    module.validate()
}
