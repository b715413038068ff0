#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use tern::{Config, Extern, Store, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(module) = tern::decode(data) else {
        return;
    };
    let module = Arc::new(module);

    // a small budget keeps loops and deep recursion from timing out
    let config = Config {
        fuel: Some(100_000),
        max_call_depth: 500,
        max_memory_pages: 64,
        max_table_elements: 10_000,
        ..Config::default()
    };
    let Ok(mut store) = Store::with_config(config) else {
        return;
    };
    let Ok(imports) = tern::spectest_imports(&mut store) else {
        return;
    };
    let Ok(instantiated) = store.instantiate(&module, &imports) else {
        return;
    };
    let instance = instantiated.instance;

    for export in &module.exports {
        let Ok(Extern::Func(addr)) = store.export(instance, &export.name) else {
            continue;
        };
        let Some(func_type) = store.func_type(addr).cloned() else {
            continue;
        };
        let args: Vec<Value> = func_type.parameters.iter().map(|t| Value::default_for(*t)).collect();
        // traps are fine; panics are not
        let _ = store.call(addr, &args);
    }
});
