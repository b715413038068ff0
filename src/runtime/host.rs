//! Host functions and the standard `spectest` host module.
//!
//! A host function is a closure with a declared signature. It receives the
//! store, so it can read guest memory or call back into guest code, and the
//! arguments already checked against its parameter types. Its results are
//! checked against the declared result types before they reach the guest.

use super::global::Global;
use super::imports::{Extern, Imports};
use super::store::Store;
use super::{InstantiationError, Trap, Value};
use crate::parser::module::{FunctionType, GlobalType, Limits, MemoryType, RefType, TableType, ValueType};
use std::sync::Arc;
use tracing::info;

pub type HostFunc = Arc<dyn Fn(&mut Store, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync>;

/// Check what a host function returned against its declared results.
pub(crate) fn check_results(store: &Store, func_type: &FunctionType, results: &[Value]) -> Result<(), Trap> {
    if results.len() != func_type.return_types.len() {
        return Err(Trap::host(format!(
            "host function returned {} values, expected {}",
            results.len(),
            func_type.return_types.len()
        )));
    }
    for (i, (value, expected)) in results.iter().zip(&func_type.return_types).enumerate() {
        if value.typ() != *expected {
            return Err(Trap::host(format!(
                "host function result {i} has type {}, expected {expected}",
                value.typ()
            )));
        }
        if !store.is_valid_ref(value) {
            return Err(Trap::host(format!("host function result {i} is a dangling reference")));
        }
    }
    Ok(())
}

/// Allocate the conventional `spectest` module: `print*` functions that log
/// their arguments, `global_{i32,i64,f32,f64}` holding 666, a one-page
/// memory (max 2) and a ten-slot funcref table (max 20).
///
/// Fails if the store's limits are too small for the memory or table.
pub fn spectest_imports(store: &mut Store) -> Result<Imports, InstantiationError> {
    use ValueType::*;

    let mut imports = Imports::new();
    let prints: [(&str, Vec<ValueType>); 7] = [
        ("print", vec![]),
        ("print_i32", vec![I32]),
        ("print_i64", vec![I64]),
        ("print_f32", vec![F32]),
        ("print_f64", vec![F64]),
        ("print_i32_f32", vec![I32, F32]),
        ("print_f64_f64", vec![F64, F64]),
    ];
    for (name, params) in prints {
        let addr = store.host_func(FunctionType::new(params, vec![]), move |_store, args| {
            let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
            info!(target: "spectest", "{name}({})", rendered.join(", "));
            Ok(vec![])
        });
        imports.define("spectest", name, Extern::Func(addr));
    }

    let globals = [
        ("global_i32", Value::I32(666)),
        ("global_i64", Value::I64(666)),
        ("global_f32", Value::F32(666.6)),
        ("global_f64", Value::F64(666.6)),
    ];
    for (name, value) in globals {
        let global_type = GlobalType {
            value_type: value.typ(),
            mutable: false,
        };
        let addr = store.push_global(Global::new(global_type, value));
        imports.define("spectest", name, Extern::Global(addr));
    }

    let memory = store.alloc_memory(MemoryType {
        limits: Limits::new(1, Some(2)),
    })?;
    imports.define("spectest", "memory", Extern::Memory(memory));
    let table = store.alloc_table(TableType {
        ref_type: RefType::FuncRef,
        limits: Limits::new(10, Some(20)),
    })?;
    imports.define("spectest", "table", Extern::Table(table));

    Ok(imports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectest_contents() {
        let mut store = Store::new();
        let imports = spectest_imports(&mut store).unwrap();

        let Some(Extern::Global(addr)) = imports.get("spectest", "global_i32") else {
            panic!("global_i32 missing");
        };
        assert_eq!(store.get_global(addr).unwrap(), Value::I32(666));

        let Some(Extern::Memory(addr)) = imports.get("spectest", "memory") else {
            panic!("memory missing");
        };
        assert_eq!(store.memory(addr).unwrap().limits(), Limits::new(1, Some(2)));

        let Some(Extern::Func(addr)) = imports.get("spectest", "print_i32") else {
            panic!("print_i32 missing");
        };
        assert_eq!(store.call(addr, &[Value::I32(1)]).unwrap(), vec![]);
        assert!(imports.get("spectest", "table").is_some());
    }

    #[test]
    fn test_spectest_respects_store_limits() {
        let mut store = Store::with_config(crate::Config {
            max_table_elements: 5,
            ..crate::Config::default()
        })
        .unwrap();
        assert!(matches!(
            spectest_imports(&mut store),
            Err(InstantiationError::Resource(_))
        ));
    }

    #[test]
    fn test_result_checking() {
        let store = Store::new();
        let ty = FunctionType::new(vec![], vec![ValueType::I32]);
        assert!(check_results(&store, &ty, &[Value::I32(1)]).is_ok());
        assert!(check_results(&store, &ty, &[]).is_err());
        assert!(check_results(&store, &ty, &[Value::I64(1)]).is_err());
    }
}
