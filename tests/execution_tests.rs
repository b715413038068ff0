//! End-to-end execution of assembled modules through the public API

mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use std::sync::Arc;
use tern::{Config, Extern, Imports, InstanceId, RuntimeError, Store, TrapKind, Value};

fn trap_kind(result: Result<Vec<Value>, RuntimeError>) -> TrapKind {
    match result {
        Err(RuntimeError::Trap(trap)) => trap.kind,
        other => panic!("expected a trap, got {other:?}"),
    }
}

fn with_config(source: &str, config: Config) -> (Store, InstanceId) {
    let mut store = Store::with_config(config).unwrap();
    let instance = store
        .instantiate(&common::module(source), &Imports::new())
        .unwrap()
        .instance;
    (store, instance)
}

fn memory_of(store: &Store, instance: InstanceId) -> tern::MemoryAddr {
    match store.export(instance, "mem").unwrap() {
        Extern::Memory(addr) => addr,
        other => panic!("mem is a {}", other.kind_name()),
    }
}

const ARITH: &str = r#"
(module
  (func (export "div_s") (param i32 i32) (result i32) (i32.div_s (local.get 0) (local.get 1)))
  (func (export "rem_s") (param i32 i32) (result i32) (i32.rem_s (local.get 0) (local.get 1)))
  (func (export "div_u64") (param i64 i64) (result i64) (i64.div_u (local.get 0) (local.get 1)))
  (func (export "trunc") (param f32) (result i32) (i32.trunc_f32_s (local.get 0)))
  (func (export "trunc_sat") (param f32) (result i32) (i32.trunc_sat_f32_s (local.get 0))))
"#;

#[rstest]
#[case::division("div_s", &[Value::I32(7), Value::I32(-2)], Value::I32(-3))]
#[case::remainder_sign("rem_s", &[Value::I32(-7), Value::I32(2)], Value::I32(-1))]
#[case::remainder_overflow("rem_s", &[Value::I32(i32::MIN), Value::I32(-1)], Value::I32(0))]
#[case::unsigned_64("div_u64", &[Value::I64(-1), Value::I64(2)], Value::I64(i64::MAX))]
#[case::truncate("trunc", &[Value::F32(-3.9)], Value::I32(-3))]
#[case::saturate_nan("trunc_sat", &[Value::F32(f32::NAN)], Value::I32(0))]
#[case::saturate_high("trunc_sat", &[Value::F32(3e9)], Value::I32(i32::MAX))]
fn integer_arithmetic(#[case] export: &str, #[case] args: &[Value], #[case] expected: Value) {
    let (mut store, instance) = common::instantiate(ARITH);
    assert_eq!(store.invoke(instance, export, args).unwrap(), vec![expected]);
}

#[rstest]
#[case::divide_by_zero("div_s", &[Value::I32(5), Value::I32(0)], TrapKind::IntegerDivideByZero)]
#[case::remainder_by_zero("rem_s", &[Value::I32(5), Value::I32(0)], TrapKind::IntegerDivideByZero)]
#[case::overflow("div_s", &[Value::I32(i32::MIN), Value::I32(-1)], TrapKind::IntegerOverflow)]
#[case::unsigned_by_zero("div_u64", &[Value::I64(1), Value::I64(0)], TrapKind::IntegerDivideByZero)]
#[case::nan_to_int("trunc", &[Value::F32(f32::NAN)], TrapKind::InvalidConversionToInteger)]
#[case::out_of_range("trunc", &[Value::F32(3e9)], TrapKind::IntegerOverflow)]
fn arithmetic_traps(#[case] export: &str, #[case] args: &[Value], #[case] expected: TrapKind) {
    let (mut store, instance) = common::instantiate(ARITH);
    assert_eq!(trap_kind(store.invoke(instance, export, args)), expected);
}

#[test]
fn trap_records_function_and_offset() {
    let bytes = common::binary(ARITH);
    let module = Arc::new(tern::decode(&bytes).unwrap());
    let mut store = Store::new();
    let instance = store.instantiate(&module, &Imports::new()).unwrap().instance;

    let err = store
        .invoke(instance, "div_s", &[Value::I32(5), Value::I32(0)])
        .unwrap_err();
    let RuntimeError::Trap(trap) = err else {
        panic!("expected a trap, got {err:?}");
    };
    assert_eq!(trap.func, Some(0));
    assert_eq!(bytes[trap.offset.unwrap()], 0x6d);
    assert!(trap.to_string().contains("integer divide by zero"), "{trap}");
}

const LOADS: &str = r#"
(module
  (memory (export "mem") 1)
  (data (i32.const 0) "\01\02\03\04\05\06\07\08")
  (func (export "load") (param i32) (result i32) (i32.load (local.get 0)))
  (func (export "load_offset") (param i32) (result i32) (i32.load offset=4 (local.get 0)))
  (func (export "load8_s") (param i32) (result i32) (i32.load8_s (local.get 0)))
  (func (export "store16") (param i32 i32) (i32.store16 (local.get 0) (local.get 1)))
  (func (export "load64") (param i32) (result i64) (i64.load (local.get 0))))
"#;

#[test]
fn loads_are_little_endian() {
    let (mut store, instance) = common::instantiate(LOADS);
    assert_eq!(common::call_i32(&mut store, instance, "load", &[Value::I32(0)]), 0x0403_0201);
    assert_eq!(common::call_i32(&mut store, instance, "load_offset", &[Value::I32(0)]), 0x0807_0605);
    assert_eq!(
        store.invoke(instance, "load64", &[Value::I32(0)]).unwrap(),
        vec![Value::I64(0x0807_0605_0403_0201)]
    );
    store
        .invoke(instance, "store16", &[Value::I32(1), Value::I32(0xfffe)])
        .unwrap();
    assert_eq!(common::call_i32(&mut store, instance, "load8_s", &[Value::I32(2)]), -1);
    assert_eq!(common::call_i32(&mut store, instance, "load8_s", &[Value::I32(1)]), -2);
}

#[rstest]
#[case::last_whole_word("load", 65532, false)]
#[case::straddles_end("load", 65533, true)]
#[case::last_byte("load", 65535, true)]
#[case::past_end("load", 65536, true)]
#[case::negative_address("load", -1, true)]
#[case::offset_pushes_past_end("load_offset", 65530, true)]
#[case::offset_in_bounds("load_offset", 65528, false)]
fn load_bounds(#[case] export: &str, #[case] address: i32, #[case] traps: bool) {
    let (mut store, instance) = common::instantiate(LOADS);
    let result = store.invoke(instance, export, &[Value::I32(address)]);
    if traps {
        assert_eq!(trap_kind(result), TrapKind::MemoryOutOfBounds);
    } else {
        assert!(result.is_ok(), "{result:?}");
    }
}

#[test]
fn trapping_store_writes_nothing() {
    let source = r#"
    (module
      (memory (export "mem") 1)
      (func (export "store") (param i32 i64) (i64.store (local.get 0) (local.get 1))))"#;
    let (mut store, instance) = common::instantiate(source);
    let mem = memory_of(&store, instance);
    let result = store.invoke(instance, "store", &[Value::I32(65530), Value::I64(-1)]);
    assert_eq!(trap_kind(result), TrapKind::MemoryOutOfBounds);
    assert!(store.memory(mem).unwrap().data()[65530..].iter().all(|b| *b == 0));
}

const GROW: &str = r#"
(module
  (memory (export "mem") 1 8)
  (func (export "grow") (param i32) (result i32) (memory.grow (local.get 0)))
  (func (export "size") (result i32) (memory.size)))
"#;

#[test]
fn memory_grow_success_and_failure() {
    let (mut store, instance) = common::instantiate(GROW);
    let mem = memory_of(&store, instance);
    store.write_memory(mem, 65535, &[0xab]).unwrap();

    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(2)]), 1);
    assert_eq!(common::call_i32(&mut store, instance, "size", &[]), 3);
    assert_eq!(store.memory(mem).unwrap().len(), 3 * 65536);
    assert_eq!(store.memory(mem).unwrap().data()[65535], 0xab);
    assert_eq!(store.memory(mem).unwrap().data()[65536], 0);

    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(6)]), -1);
    assert_eq!(common::call_i32(&mut store, instance, "size", &[]), 3);
    assert_eq!(store.memory(mem).unwrap().len(), 3 * 65536);

    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(0)]), 3);
}

#[test]
fn memory_grow_matches_model() {
    let (mut store, instance) = common::instantiate(GROW);
    let mem = memory_of(&store, instance);
    let mut rng = StdRng::seed_from_u64(0x7e57);
    let mut pages = 1u32;

    for _ in 0..64 {
        let delta = rng.gen_range(0..4u32);
        let marker = rng.gen::<u8>() | 1;
        let last = pages as u64 * 65536 - 1;
        store.write_memory(mem, last, &[marker]).unwrap();

        let result = common::call_i32(&mut store, instance, "grow", &[Value::I32(delta as i32)]);
        if pages + delta <= 8 {
            assert_eq!(result, pages as i32);
            pages += delta;
        } else {
            assert_eq!(result, -1);
        }

        let memory = store.memory(mem).unwrap();
        assert_eq!(memory.len(), pages as usize * 65536);
        assert_eq!(memory.data()[last as usize], marker);
        if delta > 0 && result != -1 {
            assert_eq!(memory.data()[last as usize + 1..].iter().filter(|b| **b != 0).count(), 0);
        }
    }
}

#[test]
fn memory_grow_respects_store_limit() {
    let config = Config {
        max_memory_pages: 2,
        ..Config::default()
    };
    let (mut store, instance) = with_config(GROW, config);
    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(1)]), 1);
    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(1)]), -1);
}

#[test]
fn bulk_memory() {
    let source = r#"
    (module
      (memory (export "mem") 1)
      (data $d "hello")
      (func (export "init") (param i32 i32 i32) (memory.init $d (local.get 0) (local.get 1) (local.get 2)))
      (func (export "drop") (data.drop $d))
      (func (export "copy") (param i32 i32 i32) (memory.copy (local.get 0) (local.get 1) (local.get 2)))
      (func (export "fill") (param i32 i32 i32) (memory.fill (local.get 0) (local.get 1) (local.get 2))))"#;
    let (mut store, instance) = common::instantiate(source);
    let mem = memory_of(&store, instance);
    let args = |a: i32, b: i32, c: i32| [Value::I32(a), Value::I32(b), Value::I32(c)];

    store.invoke(instance, "init", &args(0, 0, 5)).unwrap();
    store.invoke(instance, "copy", &args(2, 0, 5)).unwrap();
    assert_eq!(&store.memory(mem).unwrap().data()[..7], b"hehello");

    store.invoke(instance, "fill", &args(65534, 7, 2)).unwrap();
    let result = store.invoke(instance, "fill", &args(65535, 9, 2));
    assert_eq!(trap_kind(result), TrapKind::MemoryOutOfBounds);
    assert_eq!(store.memory(mem).unwrap().data()[65535], 7);

    store.invoke(instance, "drop", &[]).unwrap();
    store.invoke(instance, "init", &args(0, 0, 0)).unwrap();
    let result = store.invoke(instance, "init", &args(0, 0, 1));
    assert_eq!(trap_kind(result), TrapKind::MemoryOutOfBounds);
}

const TABLES: &str = r#"
(module
  (type $i (func (result i32)))
  (type $ii (func (param i32) (result i32)))
  (table $t (export "tab") 2 10 funcref)
  (elem $e func $one $two)
  (func $one (result i32) i32.const 1)
  (func $two (result i32) i32.const 2)
  (func $double (param i32) (result i32) (i32.mul (local.get 0) (i32.const 2)))
  (elem declare func $double)
  (func (export "init") (param i32 i32 i32) (table.init $t $e (local.get 0) (local.get 1) (local.get 2)))
  (func (export "drop") (elem.drop $e))
  (func (export "grow") (param i32) (result i32) (table.grow $t (ref.null func) (local.get 0)))
  (func (export "size") (result i32) (table.size $t))
  (func (export "is_null") (param i32) (result i32) (ref.is_null (table.get $t (local.get 0))))
  (func (export "set_double") (param i32) (table.set $t (local.get 0) (ref.func $double)))
  (func (export "fill_one") (param i32 i32) (table.fill $t (local.get 0) (ref.func $one) (local.get 1)))
  (func (export "call") (param i32) (result i32) (call_indirect $t (type $i) (local.get 0)))
  (func (export "call_ii") (param i32 i32) (result i32)
    (call_indirect $t (type $ii) (local.get 1) (local.get 0))))
"#;

#[test]
fn call_indirect_dispatch_and_traps() {
    let (mut store, instance) = common::instantiate(TABLES);
    store
        .invoke(instance, "init", &[Value::I32(0), Value::I32(0), Value::I32(2)])
        .unwrap();
    assert_eq!(common::call_i32(&mut store, instance, "call", &[Value::I32(0)]), 1);
    assert_eq!(common::call_i32(&mut store, instance, "call", &[Value::I32(1)]), 2);

    let result = store.invoke(instance, "call_ii", &[Value::I32(0), Value::I32(21)]);
    assert_eq!(trap_kind(result), TrapKind::IndirectCallTypeMismatch);

    store.invoke(instance, "set_double", &[Value::I32(1)]).unwrap();
    assert_eq!(common::call_i32(&mut store, instance, "call_ii", &[Value::I32(1), Value::I32(21)]), 42);
    let result = store.invoke(instance, "call", &[Value::I32(1)]);
    assert_eq!(trap_kind(result), TrapKind::IndirectCallTypeMismatch);

    let result = store.invoke(instance, "call", &[Value::I32(2)]);
    assert_eq!(trap_kind(result), TrapKind::TableOutOfBounds);
}

#[test]
fn table_grow_fill_and_segments() {
    let (mut store, instance) = common::instantiate(TABLES);
    assert_eq!(common::call_i32(&mut store, instance, "size", &[]), 2);
    assert_eq!(common::call_i32(&mut store, instance, "is_null", &[Value::I32(0)]), 1);

    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(3)]), 2);
    assert_eq!(common::call_i32(&mut store, instance, "size", &[]), 5);
    let result = store.invoke(instance, "call", &[Value::I32(4)]);
    assert_eq!(trap_kind(result), TrapKind::IndirectCallToNull);
    assert_eq!(common::call_i32(&mut store, instance, "grow", &[Value::I32(100)]), -1);
    assert_eq!(common::call_i32(&mut store, instance, "size", &[]), 5);

    store
        .invoke(instance, "fill_one", &[Value::I32(2), Value::I32(3)])
        .unwrap();
    assert_eq!(common::call_i32(&mut store, instance, "call", &[Value::I32(4)]), 1);
    let result = store.invoke(instance, "fill_one", &[Value::I32(4), Value::I32(2)]);
    assert_eq!(trap_kind(result), TrapKind::TableOutOfBounds);

    store.invoke(instance, "drop", &[]).unwrap();
    let result = store.invoke(instance, "init", &[Value::I32(0), Value::I32(0), Value::I32(1)]);
    assert_eq!(trap_kind(result), TrapKind::TableOutOfBounds);

    let result = store.invoke(instance, "is_null", &[Value::I32(5)]);
    assert_eq!(trap_kind(result), TrapKind::TableOutOfBounds);
}

#[test]
fn externref_round_trip() {
    let source = r#"
    (module
      (func (export "id") (param externref) (result externref) (local.get 0))
      (func (export "is_null") (param externref) (result i32) (ref.is_null (local.get 0))))"#;
    let (mut store, instance) = common::instantiate(source);
    assert_eq!(
        store.invoke(instance, "id", &[Value::ExternRef(Some(7))]).unwrap(),
        vec![Value::ExternRef(Some(7))]
    );
    assert_eq!(common::call_i32(&mut store, instance, "is_null", &[Value::ExternRef(None)]), 1);
    assert_eq!(common::call_i32(&mut store, instance, "is_null", &[Value::ExternRef(Some(0))]), 0);
}

const CONTROL: &str = r#"
(module
  (func $fac (export "fac") (param i64) (result i64)
    (if (result i64) (i64.eqz (local.get 0))
      (then (i64.const 1))
      (else (i64.mul (local.get 0) (call $fac (i64.sub (local.get 0) (i64.const 1)))))))
  (func $down (export "down") (param i32) (result i32)
    (if (result i32) (i32.eqz (local.get 0))
      (then (i32.const 0))
      (else (call $down (i32.sub (local.get 0) (i32.const 1))))))
  (func $forever (export "forever") (call $forever))
  (func (export "spin") (loop (br 0)))
  (func (export "one") (result i32) (i32.const 1))
  (func (export "classify") (param i32) (result i32)
    (block (block (block (br_table 0 1 2 (local.get 0)))
      (return (i32.const 10)))
      (return (i32.const 20)))
    (i32.const 30))
  (func (export "swap") (param i32 i32) (result i32 i32) (local.get 1) (local.get 0)))
"#;

#[test]
fn recursion_and_multi_value() {
    let (mut store, instance) = common::instantiate(CONTROL);
    assert_eq!(
        store.invoke(instance, "fac", &[Value::I64(20)]).unwrap(),
        vec![Value::I64(2_432_902_008_176_640_000)]
    );
    assert_eq!(
        store.invoke(instance, "swap", &[Value::I32(1), Value::I32(2)]).unwrap(),
        vec![Value::I32(2), Value::I32(1)]
    );
}

#[test]
fn block_parameters_and_results() {
    let source = r#"
    (module
      (type $pair (func (param i32) (result i32 i32)))
      (func (export "spread") (param i32) (result i32 i32 i32)
        i32.const 100
        local.get 0
        block (type $pair)
          i32.const 1
          i32.const 2
          i32.const 7
          i32.const 8
          br 0
        end)
      (func (export "sum_to") (param i32) (result i32)
        i32.const 0
        local.get 0
        loop $l (param i32 i32) (result i32)
          local.set 0
          local.get 0
          i32.eqz
          if (param i32) (result i32)
          else
            local.get 0
            i32.add
            local.get 0
            i32.const 1
            i32.sub
            br $l
          end
        end))"#;
    let (mut store, instance) = common::instantiate(source);
    assert_eq!(
        store.invoke(instance, "spread", &[Value::I32(5)]).unwrap(),
        vec![Value::I32(100), Value::I32(7), Value::I32(8)]
    );
    assert_eq!(common::call_i32(&mut store, instance, "sum_to", &[Value::I32(10)]), 55);
}

#[rstest]
#[case(0, 10)]
#[case(1, 20)]
#[case(2, 30)]
#[case(3, 30)]
#[case(-1, 30)]
fn br_table_selects_target(#[case] input: i32, #[case] expected: i32) {
    let (mut store, instance) = common::instantiate(CONTROL);
    assert_eq!(common::call_i32(&mut store, instance, "classify", &[Value::I32(input)]), expected);
}

#[test]
fn deep_recursion_uses_heap_frames() {
    let (mut store, instance) = common::instantiate(CONTROL);
    assert_eq!(common::call_i32(&mut store, instance, "down", &[Value::I32(9_000)]), 0);
}

#[test]
fn call_depth_is_limited() {
    let config = Config {
        max_call_depth: 100,
        ..Config::default()
    };
    let (mut store, instance) = with_config(CONTROL, config);
    assert_eq!(common::call_i32(&mut store, instance, "down", &[Value::I32(50)]), 0);
    let result = store.invoke(instance, "down", &[Value::I32(200)]);
    assert_eq!(trap_kind(result), TrapKind::CallStackExhausted);
    assert_eq!(trap_kind(store.invoke(instance, "forever", &[])), TrapKind::CallStackExhausted);

    // the store stays usable after exhaustion
    assert_eq!(common::call_i32(&mut store, instance, "down", &[Value::I32(50)]), 0);
}

#[test]
fn value_stack_is_limited() {
    let mut body = String::new();
    for i in 0..20 {
        body.push_str(&format!("(i32.const {i}) "));
    }
    for _ in 0..19 {
        body.push_str("i32.add ");
    }
    let source = format!(r#"(module (func (export "wide") (result i32) {body}))"#);
    let config = Config {
        max_value_stack: 16,
        ..Config::default()
    };
    let (mut store, instance) = with_config(&source, config);
    assert_eq!(trap_kind(store.invoke(instance, "wide", &[])), TrapKind::ValueStackExhausted);

    let (mut store, instance) = common::instantiate(&source);
    assert_eq!(common::call_i32(&mut store, instance, "wide", &[]), 190);
}

#[test]
fn fuel_bounds_execution() {
    let config = Config {
        fuel: Some(10_000),
        ..Config::default()
    };
    let (mut store, instance) = with_config(CONTROL, config);
    assert_eq!(trap_kind(store.invoke(instance, "spin", &[])), TrapKind::OutOfFuel);
    assert_eq!(store.fuel(), Some(0));
    assert_eq!(trap_kind(store.invoke(instance, "one", &[])), TrapKind::OutOfFuel);

    store.set_fuel(Some(100));
    assert_eq!(common::call_i32(&mut store, instance, "one", &[]), 1);
    let left = store.fuel().unwrap();
    assert!((90..100).contains(&left), "{left} fuel left");

    store.set_fuel(None);
    assert_eq!(common::call_i32(&mut store, instance, "down", &[Value::I32(1_000)]), 0);
}

const FLOATS: &str = r#"
(module
  (func (export "div_zero") (result i32) (i32.reinterpret_f32 (f32.div (f32.const 0) (f32.const 0))))
  (func (export "add_payload") (result i32) (i32.reinterpret_f32 (f32.add (f32.const nan:0x200000) (f32.const 1))))
  (func (export "neg_payload") (result i32) (i32.reinterpret_f32 (f32.neg (f32.const nan:0x200000))))
  (func (export "sqrt_negative") (result i64) (i64.reinterpret_f64 (f64.sqrt (f64.const -1))))
  (func (export "min_zero") (result f64) (f64.min (f64.const 0) (f64.const -0)))
  (func (export "nearest") (param f32) (result f32) (f32.nearest (local.get 0))))
"#;

#[test]
fn canonical_nans_when_configured() {
    let config = Config {
        canonicalize_nans: true,
        ..Config::default()
    };
    let (mut store, instance) = with_config(FLOATS, config);
    assert_eq!(common::call_i32(&mut store, instance, "div_zero", &[]), 0x7fc0_0000);
    assert_eq!(common::call_i32(&mut store, instance, "add_payload", &[]), 0x7fc0_0000);
    assert_eq!(
        common::call_i32(&mut store, instance, "neg_payload", &[]) as u32,
        0xffa0_0000
    );
    assert_eq!(
        store.invoke(instance, "sqrt_negative", &[]).unwrap(),
        vec![Value::I64(0x7ff8_0000_0000_0000)]
    );
}

#[test]
fn nan_results_without_canonicalization() {
    let (mut store, instance) = common::instantiate(FLOATS);
    let is_nan = |bits: i32| f32::from_bits(bits as u32).is_nan();
    assert!(is_nan(common::call_i32(&mut store, instance, "div_zero", &[])));
    assert!(is_nan(common::call_i32(&mut store, instance, "add_payload", &[])));
    assert_eq!(
        common::call_i32(&mut store, instance, "neg_payload", &[]) as u32,
        0xffa0_0000
    );
}

#[test]
fn float_edge_cases() {
    let (mut store, instance) = common::instantiate(FLOATS);
    match store.invoke(instance, "min_zero", &[]).unwrap().as_slice() {
        [Value::F64(v)] => assert!(*v == 0.0 && v.is_sign_negative()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        store.invoke(instance, "nearest", &[Value::F32(2.5)]).unwrap(),
        vec![Value::F32(2.0)]
    );
    assert_eq!(
        store.invoke(instance, "nearest", &[Value::F32(-3.5)]).unwrap(),
        vec![Value::F32(-4.0)]
    );
}

#[test]
fn invocation_errors() {
    let (mut store, instance) = common::instantiate(LOADS);
    assert_eq!(
        store.invoke(instance, "missing", &[]).unwrap_err(),
        RuntimeError::UnknownExport("missing".to_string())
    );
    assert!(matches!(
        store.invoke(instance, "mem", &[]).unwrap_err(),
        RuntimeError::NotAFunction { kind: "memory", .. }
    ));
    assert_eq!(
        store.invoke(instance, "load", &[]).unwrap_err(),
        RuntimeError::ArgumentCount { expected: 1, actual: 0 }
    );
    assert!(matches!(
        store.invoke(instance, "load", &[Value::I64(0)]).unwrap_err(),
        RuntimeError::ArgumentType { index: 0, .. }
    ));
    assert_eq!(
        store.invoke(InstanceId(42), "load", &[Value::I32(0)]).unwrap_err(),
        RuntimeError::UnknownInstance(42)
    );
}
