//! The store: every runtime object, addressed by index
//!
//! All functions, tables, memories, globals and segments live in flat arenas
//! owned by the [`Store`]. Module instances hold addresses into those arenas
//! rather than the objects themselves, so an export of one instance can be
//! imported by another without shared ownership or interior mutability.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        Store                         │
//! │  funcs     [0] Host print   [1] Wasm #0.f0  ...      │
//! │  tables    [0] spectest.table  [1] #0.t0 ...         │
//! │  memories  [0] #0.m0 ...                             │
//! │  globals   [0] spectest.global_i32 ...               │
//! │  elems / datas  (segments, emptied when dropped)     │
//! │  instances [0] ModuleInstance { funcs: [1, ..], .. } │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing handed out is ever removed, so an address stays valid for the
//! life of the store. Every address carries the [`StoreId`] of its store,
//! and a store treats addresses from any other store as invalid. A store is
//! `Send`; embedders that need sharing put it behind a mutex.

use super::executor::Executor;
use super::global::Global;
use super::host::HostFunc;
use super::imports::{self, Extern, Imports};
use super::instance::ModuleInstance;
use super::memory::Memory;
use super::table::Table;
use super::{InstantiationError, RuntimeError, Trap, TrapKind, Value};
use crate::config::{Config, ConfigError};
use crate::parser::module::{
    ConstExpr, DataMode, ElementMode, ExportIndex, FunctionType, GlobalType, MemoryType, Module, RefType, TableType,
};
use crate::parser::validate::CompiledFunction;
use crate::parser::instruction::Instruction;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifies the store that issued an address. Unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub(crate) u64);

impl StoreId {
    fn allocate() -> StoreId {
        // 0 is never issued
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        StoreId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Addresses handed to embedders: an arena index plus the issuing store.
/// A store rejects addresses it did not issue.
macro_rules! addr_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize, pub(crate) StoreId);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }

            pub fn store(self) -> StoreId {
                self.1
            }
        }
    };
}

/// Store-internal indices that never leave the store.
macro_rules! index_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);
    };
}

addr_type!(
    /// A function in the store
    FuncAddr
);
addr_type!(TableAddr);
addr_type!(MemoryAddr);
addr_type!(GlobalAddr);
index_type!(ElemAddr);
index_type!(DataAddr);
index_type!(
    /// Index of a module instance in the store
    InstanceId
);

#[derive(Clone)]
pub enum FunctionInstance {
    Wasm {
        func_type: FunctionType,
        instance: InstanceId,
        code: Arc<CompiledFunction>,
    },
    Host {
        func_type: FunctionType,
        func: HostFunc,
    },
}

impl FunctionInstance {
    pub fn func_type(&self) -> &FunctionType {
        match self {
            FunctionInstance::Wasm { func_type, .. } | FunctionInstance::Host { func_type, .. } => func_type,
        }
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionInstance::Wasm {
                func_type,
                instance,
                code,
            } => f
                .debug_struct("Wasm")
                .field("func_type", func_type)
                .field("instance", instance)
                .field("index", &code.index)
                .finish(),
            FunctionInstance::Host { func_type, .. } => {
                f.debug_struct("Host").field("func_type", func_type).finish_non_exhaustive()
            }
        }
    }
}

/// An element segment; `items` is emptied when the segment is dropped.
#[derive(Debug, Clone)]
pub(crate) struct ElemInstance {
    pub ref_type: RefType,
    pub items: Vec<Value>,
}

/// A data segment; `bytes` is emptied when the segment is dropped.
#[derive(Debug, Clone)]
pub(crate) struct DataInstance {
    pub bytes: Vec<u8>,
}

/// Result of a successful instantiation.
///
/// A trap in the start function does not undo instantiation: the instance
/// stays in the store and its exports remain usable, with the trap reported
/// in `start_trap`.
#[derive(Debug, Clone)]
pub struct Instantiated {
    pub instance: InstanceId,
    pub start_trap: Option<Trap>,
}

/// Arena lengths before an instantiation, restored if it fails.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    funcs: usize,
    tables: usize,
    memories: usize,
    globals: usize,
    elems: usize,
    datas: usize,
}

#[derive(Debug)]
pub struct Store {
    id: StoreId,
    pub(crate) config: Config,
    pub(crate) funcs: Vec<FunctionInstance>,
    pub(crate) tables: Vec<Table>,
    pub(crate) memories: Vec<Memory>,
    pub(crate) globals: Vec<Global>,
    pub(crate) elems: Vec<ElemInstance>,
    pub(crate) datas: Vec<DataInstance>,
    pub(crate) instances: Vec<Arc<ModuleInstance>>,
    /// Remaining instruction budget, shared by every invocation
    pub(crate) fuel: Option<u64>,
    /// Guest frames active while a host function runs
    pub(crate) call_depth: usize,
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Store::build(Config::default())
    }

    /// A store with the given limits; fails if `config` does not validate.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Store::build(config))
    }

    fn build(config: Config) -> Self {
        let fuel = config.fuel;
        Store {
            id: StoreId::allocate(),
            config,
            funcs: Vec::new(),
            tables: Vec::new(),
            memories: Vec::new(),
            globals: Vec::new(),
            elems: Vec::new(),
            datas: Vec::new(),
            instances: Vec::new(),
            fuel,
            call_depth: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Remaining fuel, or `None` when execution is unmetered.
    pub fn fuel(&self) -> Option<u64> {
        self.fuel
    }

    pub fn set_fuel(&mut self, fuel: Option<u64>) {
        self.fuel = fuel;
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Register a host function with the given signature.
    pub fn host_func<F>(&mut self, func_type: FunctionType, func: F) -> FuncAddr
    where
        F: Fn(&mut Store, &[Value]) -> Result<Vec<Value>, Trap> + Send + Sync + 'static,
    {
        self.push_func(FunctionInstance::Host {
            func_type,
            func: Arc::new(func),
        })
    }

    pub fn alloc_table(&mut self, table_type: TableType) -> Result<TableAddr, InstantiationError> {
        let table = Table::new(table_type, self.config.max_table_elements)?;
        self.tables.push(table);
        Ok(TableAddr(self.tables.len() - 1, self.id))
    }

    pub fn alloc_memory(&mut self, memory_type: MemoryType) -> Result<MemoryAddr, InstantiationError> {
        let memory = Memory::new(memory_type.limits, self.config.max_memory_pages)?;
        self.memories.push(memory);
        Ok(MemoryAddr(self.memories.len() - 1, self.id))
    }

    pub fn alloc_global(&mut self, global_type: GlobalType, value: Value) -> Result<GlobalAddr, RuntimeError> {
        if value.typ() != global_type.value_type {
            return Err(RuntimeError::GlobalType {
                expected: global_type.value_type,
                actual: value.typ(),
            });
        }
        self.check_ref(&value)?;
        Ok(self.push_global(Global::new(global_type, value)))
    }

    fn push_func(&mut self, func: FunctionInstance) -> FuncAddr {
        self.funcs.push(func);
        FuncAddr(self.funcs.len() - 1, self.id)
    }

    pub(crate) fn push_global(&mut self, global: Global) -> GlobalAddr {
        self.globals.push(global);
        GlobalAddr(self.globals.len() - 1, self.id)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            funcs: self.funcs.len(),
            tables: self.tables.len(),
            memories: self.memories.len(),
            globals: self.globals.len(),
            elems: self.elems.len(),
            datas: self.datas.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.funcs.truncate(checkpoint.funcs);
        self.tables.truncate(checkpoint.tables);
        self.memories.truncate(checkpoint.memories);
        self.globals.truncate(checkpoint.globals);
        self.elems.truncate(checkpoint.elems);
        self.datas.truncate(checkpoint.datas);
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub(crate) fn func(&self, addr: FuncAddr) -> Option<&FunctionInstance> {
        (addr.1 == self.id).then(|| self.funcs.get(addr.0)).flatten()
    }

    pub fn func_type(&self, addr: FuncAddr) -> Option<&FunctionType> {
        self.func(addr).map(FunctionInstance::func_type)
    }

    pub fn table(&self, addr: TableAddr) -> Option<&Table> {
        (addr.1 == self.id).then(|| self.tables.get(addr.0)).flatten()
    }

    pub fn table_mut(&mut self, addr: TableAddr) -> Option<&mut Table> {
        if addr.1 != self.id {
            return None;
        }
        self.tables.get_mut(addr.0)
    }

    pub fn memory(&self, addr: MemoryAddr) -> Option<&Memory> {
        (addr.1 == self.id).then(|| self.memories.get(addr.0)).flatten()
    }

    pub fn memory_mut(&mut self, addr: MemoryAddr) -> Option<&mut Memory> {
        if addr.1 != self.id {
            return None;
        }
        self.memories.get_mut(addr.0)
    }

    pub fn global(&self, addr: GlobalAddr) -> Option<&Global> {
        (addr.1 == self.id).then(|| self.globals.get(addr.0)).flatten()
    }

    fn global_mut(&mut self, addr: GlobalAddr) -> Option<&mut Global> {
        if addr.1 != self.id {
            return None;
        }
        self.globals.get_mut(addr.0)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Arc<ModuleInstance>> {
        self.instances.get(id.0)
    }

    /// Look up an export of an instance by name.
    pub fn export(&self, instance: InstanceId, name: &str) -> Result<Extern, RuntimeError> {
        self.instance(instance)
            .ok_or(RuntimeError::UnknownInstance(instance.0))?
            .export(name)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    /// Reference values must point into this store.
    pub(crate) fn is_valid_ref(&self, value: &Value) -> bool {
        match value {
            Value::FuncRef(Some(addr)) => self.func(*addr).is_some(),
            _ => true,
        }
    }

    fn check_ref(&self, value: &Value) -> Result<(), RuntimeError> {
        match value {
            Value::FuncRef(Some(addr)) if !self.is_valid_ref(value) => {
                Err(RuntimeError::InvalidAddress(format!("function #{}", addr.0)))
            }
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Host access to memories, globals and tables
    // ========================================================================

    pub fn read_memory(&self, addr: MemoryAddr, offset: u64, buf: &mut [u8]) -> Result<(), RuntimeError> {
        let memory = self.memory(addr).ok_or_else(|| invalid("memory", addr.0))?;
        Ok(memory.read(offset, buf)?)
    }

    pub fn write_memory(&mut self, addr: MemoryAddr, offset: u64, bytes: &[u8]) -> Result<(), RuntimeError> {
        let memory = self.memory_mut(addr).ok_or_else(|| invalid("memory", addr.0))?;
        Ok(memory.write(offset, bytes)?)
    }

    /// Grow a memory by `delta` pages; returns the old size, or -1 on failure.
    pub fn grow_memory(&mut self, addr: MemoryAddr, delta: u32) -> Result<i32, RuntimeError> {
        let memory = self.memory_mut(addr).ok_or_else(|| invalid("memory", addr.0))?;
        Ok(memory.grow(delta))
    }

    pub fn get_global(&self, addr: GlobalAddr) -> Result<Value, RuntimeError> {
        Ok(self.global(addr).ok_or_else(|| invalid("global", addr.0))?.get())
    }

    pub fn set_global(&mut self, addr: GlobalAddr, value: Value) -> Result<(), RuntimeError> {
        self.check_ref(&value)?;
        self.global_mut(addr).ok_or_else(|| invalid("global", addr.0))?.set(value)
    }

    pub fn table_get(&self, addr: TableAddr, index: u32) -> Result<Value, RuntimeError> {
        Ok(self.table(addr).ok_or_else(|| invalid("table", addr.0))?.get(index)?)
    }

    pub fn table_set(&mut self, addr: TableAddr, index: u32, value: Value) -> Result<(), RuntimeError> {
        self.check_ref(&value)?;
        let table = self.table_mut(addr).ok_or_else(|| invalid("table", addr.0))?;
        if value.typ() != table.ref_type().value_type() {
            return Err(RuntimeError::ArgumentType {
                index: 0,
                expected: table.ref_type().value_type(),
                actual: value.typ(),
            });
        }
        Ok(table.set(index, value)?)
    }

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Link `module` against `imports`, allocate its state, initialise its
    /// tables and memories, and run its start function.
    ///
    /// Validation and linking happen before anything is allocated, and a
    /// failure while allocating (a resource limit, say) releases whatever
    /// this call allocated. A segment that does not fit fails instantiation
    /// with a trap; writes made by earlier segments are not rolled back.
    pub fn instantiate(&mut self, module: &Arc<Module>, imports: &Imports) -> Result<Instantiated, InstantiationError> {
        let validated = module.validated()?;
        let externs = imports::resolve(self, module, imports)?;
        let id = InstanceId(self.instances.len());
        debug!(instance = id.0, imports = externs.len(), "instantiating module");

        let checkpoint = self.checkpoint();
        let instance = match self.allocate_instance(id, module, &validated.functions, &externs) {
            Ok(instance) => Arc::new(instance),
            Err(err) => {
                self.rollback(checkpoint);
                return Err(err);
            }
        };
        self.instances.push(Arc::clone(&instance));

        self.initialize_segments(module, &instance)?;

        let start_trap = match module.start {
            Some(idx) => {
                let addr = instance.funcs[idx as usize];
                match Executor::call(self, addr, &[]) {
                    Ok(_) => None,
                    Err(trap) => {
                        warn!(instance = id.0, %trap, "start function trapped");
                        Some(trap)
                    }
                }
            }
            None => None,
        };

        Ok(Instantiated {
            instance: id,
            start_trap,
        })
    }

    /// Allocate the functions, tables, memories, globals and segments a
    /// module defines and build its instance.
    fn allocate_instance(
        &mut self,
        id: InstanceId,
        module: &Arc<Module>,
        code: &[Arc<CompiledFunction>],
        externs: &[Extern],
    ) -> Result<ModuleInstance, InstantiationError> {
        let mut funcs = Vec::new();
        let mut tables = Vec::new();
        let mut memories = Vec::new();
        let mut globals = Vec::new();
        for ext in externs {
            match *ext {
                Extern::Func(addr) => funcs.push(addr),
                Extern::Table(addr) => tables.push(addr),
                Extern::Memory(addr) => memories.push(addr),
                Extern::Global(addr) => globals.push(addr),
            }
        }

        for code in code {
            funcs.push(self.push_func(FunctionInstance::Wasm {
                func_type: code.func_type.clone(),
                instance: id,
                code: Arc::clone(code),
            }));
        }
        for table_type in &module.tables {
            tables.push(self.alloc_table(*table_type)?);
        }
        for memory_type in &module.memories {
            memories.push(self.alloc_memory(*memory_type)?);
        }
        for global in &module.globals {
            let value = self.eval_const(&global.init, &globals, &funcs)?;
            globals.push(self.push_global(Global::new(global.global_type, value)));
        }

        let mut elems = Vec::with_capacity(module.elements.len());
        for segment in &module.elements {
            let items = segment
                .items
                .iter()
                .map(|item| self.eval_const(item, &globals, &funcs))
                .collect::<Result<Vec<_>, _>>()?;
            self.elems.push(ElemInstance {
                ref_type: segment.ref_type,
                items,
            });
            elems.push(ElemAddr(self.elems.len() - 1));
        }
        let mut datas = Vec::with_capacity(module.data.len());
        for segment in &module.data {
            self.datas.push(DataInstance {
                bytes: segment.init.clone(),
            });
            datas.push(DataAddr(self.datas.len() - 1));
        }

        let exports: HashMap<String, Extern> = module
            .exports
            .iter()
            .map(|export| {
                let i = export.index.index() as usize;
                let ext = match export.index {
                    ExportIndex::Function(_) => Extern::Func(funcs[i]),
                    ExportIndex::Table(_) => Extern::Table(tables[i]),
                    ExportIndex::Memory(_) => Extern::Memory(memories[i]),
                    ExportIndex::Global(_) => Extern::Global(globals[i]),
                };
                (export.name.clone(), ext)
            })
            .collect();

        Ok(ModuleInstance {
            id,
            module: Arc::clone(module),
            funcs,
            tables,
            memories,
            globals,
            elems,
            datas,
            exports,
        })
    }

    /// Copy active segments into place in declaration order, elements first,
    /// then drop every active and declarative segment.
    fn initialize_segments(&mut self, module: &Module, instance: &ModuleInstance) -> Result<(), InstantiationError> {
        for (i, segment) in module.elements.iter().enumerate() {
            let elem = instance.elems[i];
            match &segment.mode {
                ElementMode::Active { table_index, offset } => {
                    let offset = self.eval_offset(offset, instance)?;
                    let items = std::mem::take(&mut self.elems[elem.0].items);
                    let table = &mut self.tables[instance.tables[*table_index as usize].0];
                    table
                        .init(offset, &items, 0, items.len() as u32)
                        .map_err(InstantiationError::Trap)?;
                }
                ElementMode::Declarative => self.elems[elem.0].items.clear(),
                ElementMode::Passive => {}
            }
        }

        for (i, segment) in module.data.iter().enumerate() {
            if let DataMode::Active { memory_index, offset } = &segment.mode {
                let offset = self.eval_offset(offset, instance)?;
                let data = instance.datas[i];
                let bytes = std::mem::take(&mut self.datas[data.0].bytes);
                let memory = &mut self.memories[instance.memories[*memory_index as usize].0];
                memory
                    .init(offset, &bytes, 0, bytes.len() as u32)
                    .map_err(InstantiationError::Trap)?;
            }
        }
        Ok(())
    }

    fn eval_offset(&self, expr: &ConstExpr, instance: &ModuleInstance) -> Result<u32, InstantiationError> {
        match self.eval_const(expr, &instance.globals, &instance.funcs)? {
            Value::I32(offset) => Ok(offset as u32),
            _ => Err(InstantiationError::Trap(Trap::new(TrapKind::StackTypeMismatch))),
        }
    }

    /// Evaluate a validated constant expression.
    fn eval_const(&self, expr: &ConstExpr, globals: &[GlobalAddr], funcs: &[FuncAddr]) -> Result<Value, InstantiationError> {
        let value = match expr.instructions.first() {
            Some(Instruction::I32Const { value }) => Value::I32(*value),
            Some(Instruction::I64Const { value }) => Value::I64(*value),
            Some(Instruction::F32Const { value }) => Value::F32(*value),
            Some(Instruction::F64Const { value }) => Value::F64(*value),
            Some(Instruction::RefNull { ref_type }) => Value::null(*ref_type),
            Some(Instruction::RefFunc { func_idx }) => Value::FuncRef(funcs.get(*func_idx as usize).copied()),
            Some(Instruction::GlobalGet { global_idx }) => globals
                .get(*global_idx as usize)
                .and_then(|addr| self.global(*addr))
                .map(Global::get)
                .ok_or(InstantiationError::Trap(Trap::new(TrapKind::StackTypeMismatch)))?,
            _ => return Err(InstantiationError::Trap(Trap::new(TrapKind::StackTypeMismatch))),
        };
        Ok(value)
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Call the function exported as `name` by `instance`.
    pub fn invoke(&mut self, instance: InstanceId, name: &str, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let addr = match self.export(instance, name)? {
            Extern::Func(addr) => addr,
            other => {
                return Err(RuntimeError::NotAFunction {
                    name: name.to_string(),
                    kind: other.kind_name(),
                })
            }
        };
        debug!(instance = instance.0, export = name, "invoking");
        self.call(addr, args)
    }

    /// Call a function by address after checking `args` against its type.
    pub fn call(&mut self, addr: FuncAddr, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let func_type = self.func_type(addr).ok_or_else(|| invalid("function", addr.0))?;
        if args.len() != func_type.parameters.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: func_type.parameters.len(),
                actual: args.len(),
            });
        }
        for (index, (arg, expected)) in args.iter().zip(&func_type.parameters).enumerate() {
            if arg.typ() != *expected {
                return Err(RuntimeError::ArgumentType {
                    index,
                    expected: *expected,
                    actual: arg.typ(),
                });
            }
        }
        for arg in args {
            self.check_ref(arg)?;
        }
        Ok(Executor::call(self, addr, args)?)
    }
}

fn invalid(kind: &str, index: usize) -> RuntimeError {
    RuntimeError::InvalidAddress(format!("{kind} #{index}"))
}
