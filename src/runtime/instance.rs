//! Module instances
//!
//! A `ModuleInstance` maps a module's index spaces onto store addresses and
//! names its exports. It is immutable once instantiation finishes; all
//! mutable state lives in the [`Store`](super::Store).

use super::imports::Extern;
use super::store::{DataAddr, ElemAddr, FuncAddr, GlobalAddr, InstanceId, MemoryAddr, TableAddr};
use crate::parser::module::{FunctionType, Module};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct ModuleInstance {
    pub(crate) id: InstanceId,
    pub(crate) module: Arc<Module>,
    pub(crate) funcs: Vec<FuncAddr>,
    pub(crate) tables: Vec<TableAddr>,
    pub(crate) memories: Vec<MemoryAddr>,
    pub(crate) globals: Vec<GlobalAddr>,
    pub(crate) elems: Vec<ElemAddr>,
    pub(crate) datas: Vec<DataAddr>,
    pub(crate) exports: HashMap<String, Extern>,
}

impl ModuleInstance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn export(&self, name: &str) -> Option<Extern> {
        self.exports.get(name).copied()
    }

    /// Exports in declaration order
    pub fn exports(&self) -> impl Iterator<Item = (&str, Extern)> + '_ {
        self.module
            .exports
            .iter()
            .filter_map(|e| self.exports.get(&e.name).map(|ext| (e.name.as_str(), *ext)))
    }

    pub(crate) fn func_type(&self, type_idx: u32) -> &FunctionType {
        &self.module.types[type_idx as usize]
    }

    pub fn func(&self, idx: u32) -> Option<FuncAddr> {
        self.funcs.get(idx as usize).copied()
    }

    pub fn memory(&self, idx: u32) -> Option<MemoryAddr> {
        self.memories.get(idx as usize).copied()
    }

    pub fn table(&self, idx: u32) -> Option<TableAddr> {
        self.tables.get(idx as usize).copied()
    }

    pub fn global(&self, idx: u32) -> Option<GlobalAddr> {
        self.globals.get(idx as usize).copied()
    }
}
