//! Execution benchmarks for the interpreter.
//!
//! These measure instruction dispatch, call overhead and memory access on
//! small hand-written modules.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use tern::{Imports, InstanceId, Module, Store, Value};

const NOOP_LOOP: &str = r#"
(module
  (func (export "run") (param $n i32) (result i32)
    (local $i i32)
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $n)))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (local.get $i)))
"#;

const FIB_ITERATIVE: &str = r#"
(module
  (func (export "fib") (param $n i32) (result i32)
    (local $a i32) (local $b i32) (local $t i32)
    (local.set $b (i32.const 1))
    (block $done
      (loop $next
        (br_if $done (i32.eqz (local.get $n)))
        (local.set $t (i32.add (local.get $a) (local.get $b)))
        (local.set $a (local.get $b))
        (local.set $b (local.get $t))
        (local.set $n (i32.sub (local.get $n) (i32.const 1)))
        (br $next)))
    (local.get $a)))
"#;

const FIB_RECURSIVE: &str = r#"
(module
  (func $fib (export "fib") (param $n i32) (result i32)
    (if (result i32) (i32.lt_u (local.get $n) (i32.const 2))
      (then (local.get $n))
      (else
        (i32.add
          (call $fib (i32.sub (local.get $n) (i32.const 1)))
          (call $fib (i32.sub (local.get $n) (i32.const 2))))))))
"#;

const MEMSUM: &str = r#"
(module
  (memory 1)
  (func (export "fill") (param $len i32)
    (memory.fill (i32.const 0) (i32.const 1) (local.get $len)))
  (func (export "sum") (param $len i32) (result i32)
    (local $i i32) (local $acc i32)
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
        (local.set $acc (i32.add (local.get $acc) (i32.load8_u (local.get $i))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (local.get $acc)))
"#;

fn load(source: &str) -> Arc<Module> {
    let bytes = wat::parse_str(source).expect("benchmark module should assemble");
    Arc::new(tern::decode(&bytes).expect("benchmark module should decode"))
}

fn instantiate(module: &Arc<Module>) -> (Store, InstanceId) {
    let mut store = Store::new();
    let instance = store
        .instantiate(module, &Imports::new())
        .expect("benchmark module should instantiate")
        .instance;
    (store, instance)
}

fn bench_dispatch(c: &mut Criterion) {
    let module = load(NOOP_LOOP);
    let mut group = c.benchmark_group("dispatch");
    for n in [1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("noop_loop", n), &n, |b, &n| {
            let (mut store, instance) = instantiate(&module);
            b.iter(|| black_box(store.invoke(instance, "run", &[Value::I32(n)]).unwrap()));
        });
    }
    group.finish();
}

fn bench_compute(c: &mut Criterion) {
    let iterative = load(FIB_ITERATIVE);
    let recursive = load(FIB_RECURSIVE);
    let mut group = c.benchmark_group("compute");
    for n in [20, 40] {
        group.bench_with_input(BenchmarkId::new("fib_iterative", n), &n, |b, &n| {
            let (mut store, instance) = instantiate(&iterative);
            b.iter(|| black_box(store.invoke(instance, "fib", &[Value::I32(n)]).unwrap()));
        });
    }
    for n in [10, 20] {
        group.bench_with_input(BenchmarkId::new("fib_recursive", n), &n, |b, &n| {
            let (mut store, instance) = instantiate(&recursive);
            b.iter(|| black_box(store.invoke(instance, "fib", &[Value::I32(n)]).unwrap()));
        });
    }
    group.finish();
}

fn bench_memory(c: &mut Criterion) {
    let module = load(MEMSUM);
    let mut group = c.benchmark_group("memory");
    for len in [1_000, 60_000] {
        group.bench_with_input(BenchmarkId::new("sum_bytes", len), &len, |b, &len| {
            let (mut store, instance) = instantiate(&module);
            store.invoke(instance, "fill", &[Value::I32(len)]).unwrap();
            b.iter(|| black_box(store.invoke(instance, "sum", &[Value::I32(len)]).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_compute, bench_memory);
criterion_main!(benches);
