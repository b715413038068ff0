//! Common test utilities shared between integration tests

#![allow(dead_code)]

use std::sync::Arc;
use tern::{Imports, InstanceId, Module, Store, Value};

/// Assemble WAT text and decode it.
pub fn module(source: &str) -> Arc<Module> {
    let bytes = wat::parse_str(source).expect("test module should assemble");
    Arc::new(tern::decode(&bytes).expect("test module should decode"))
}

/// Assemble WAT text to a binary without decoding it.
pub fn binary(source: &str) -> Vec<u8> {
    wat::parse_str(source).expect("test module should assemble")
}

/// Instantiate `source` with no imports in a fresh store.
pub fn instantiate(source: &str) -> (Store, InstanceId) {
    let mut store = Store::new();
    let instance = store
        .instantiate(&module(source), &Imports::new())
        .expect("test module should instantiate")
        .instance;
    (store, instance)
}

/// Invoke an export and unwrap a single i32 result.
pub fn call_i32(store: &mut Store, instance: InstanceId, name: &str, args: &[Value]) -> i32 {
    match store.invoke(instance, name, args).expect("call should succeed").as_slice() {
        [Value::I32(v)] => *v,
        other => panic!("expected a single i32, got {other:?}"),
    }
}
