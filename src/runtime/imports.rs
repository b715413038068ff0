//! Import resolution
//!
//! An [`Imports`] set maps `(module, name)` pairs to store addresses. Linking
//! looks up and type-checks every import of a module before instantiation
//! allocates anything, so a link failure leaves the store untouched.

use super::instance::ModuleInstance;
use super::store::{FuncAddr, GlobalAddr, MemoryAddr, Store, StoreId, TableAddr};
use crate::parser::module::{ExternalKind, Import, Module};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Something a module can import or export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extern {
    Func(FuncAddr),
    Table(TableAddr),
    Memory(MemoryAddr),
    Global(GlobalAddr),
}

impl Extern {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Extern::Func(_) => "function",
            Extern::Table(_) => "table",
            Extern::Memory(_) => "memory",
            Extern::Global(_) => "global",
        }
    }

    /// The store that issued this extern's address
    pub fn store(&self) -> StoreId {
        match self {
            Extern::Func(a) => a.store(),
            Extern::Table(a) => a.store(),
            Extern::Memory(a) => a.store(),
            Extern::Global(a) => a.store(),
        }
    }
}

impl fmt::Display for Extern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extern::Func(a) => write!(f, "function #{}", a.0),
            Extern::Table(a) => write!(f, "table #{}", a.0),
            Extern::Memory(a) => write!(f, "memory #{}", a.0),
            Extern::Global(a) => write!(f, "global #{}", a.0),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("unknown import {module}.{name}")]
    UnknownImport { module: String, name: String },

    #[error("incompatible import type for {module}.{name}: expected {expected}, found {actual}")]
    IncompatibleImportType {
        module: String,
        name: String,
        expected: String,
        actual: String,
    },
}

/// Named externs available to a module being instantiated
#[derive(Debug, Clone, Default)]
pub struct Imports {
    entries: HashMap<(String, String), Extern>,
}

impl Imports {
    pub fn new() -> Self {
        Imports::default()
    }

    /// Define (or replace) `module.name`.
    pub fn define(&mut self, module: impl Into<String>, name: impl Into<String>, ext: Extern) -> &mut Self {
        self.entries.insert((module.into(), name.into()), ext);
        self
    }

    pub fn get(&self, module: &str, name: &str) -> Option<Extern> {
        self.entries.get(&(module.to_string(), name.to_string())).copied()
    }

    /// Make every export of `instance` importable as `module_name.<export>`.
    pub fn register_instance(&mut self, module_name: &str, instance: &ModuleInstance) -> &mut Self {
        for (name, ext) in instance.exports() {
            self.define(module_name, name, ext);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn incompatible(import: &Import, expected: impl fmt::Display, actual: impl fmt::Display) -> LinkError {
    LinkError::IncompatibleImportType {
        module: import.module.clone(),
        name: import.name.clone(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Resolve every import of `module`, in order, checking each against what
/// the module declares.
pub(crate) fn resolve(store: &Store, module: &Module, imports: &Imports) -> Result<Vec<Extern>, LinkError> {
    module
        .imports
        .iter()
        .map(|import| {
            let ext = imports
                .get(&import.module, &import.name)
                .ok_or_else(|| LinkError::UnknownImport {
                    module: import.module.clone(),
                    name: import.name.clone(),
                })?;
            check_import(store, module, import, ext)?;
            Ok(ext)
        })
        .collect()
}

fn check_import(store: &Store, module: &Module, import: &Import, ext: Extern) -> Result<(), LinkError> {
    if ext.store() != store.id() {
        return Err(incompatible(import, ext.kind_name(), format!("{ext} of another store")));
    }
    match (&import.external_kind, ext) {
        (ExternalKind::Function(type_idx), Extern::Func(addr)) => {
            let expected = module
                .types
                .get(*type_idx as usize)
                .ok_or_else(|| incompatible(import, format!("type {type_idx}"), "nothing"))?;
            let actual = store
                .func_type(addr)
                .ok_or_else(|| incompatible(import, expected, "dangling function"))?;
            if actual != expected {
                return Err(incompatible(import, expected, actual));
            }
        }
        (ExternalKind::Table(expected), Extern::Table(addr)) => {
            let actual = store
                .table(addr)
                .map(|t| t.table_type())
                .ok_or_else(|| incompatible(import, "table", "dangling table"))?;
            if actual.ref_type != expected.ref_type || !actual.limits.is_subtype_of(&expected.limits) {
                return Err(incompatible(
                    import,
                    format!("{} {}", expected.ref_type, expected.limits),
                    format!("{} {}", actual.ref_type, actual.limits),
                ));
            }
        }
        (ExternalKind::Memory(expected), Extern::Memory(addr)) => {
            let actual = store
                .memory(addr)
                .map(|m| m.limits())
                .ok_or_else(|| incompatible(import, "memory", "dangling memory"))?;
            if !actual.is_subtype_of(&expected.limits) {
                return Err(incompatible(import, expected.limits, actual));
            }
        }
        (ExternalKind::Global(expected), Extern::Global(addr)) => {
            let actual = store
                .global(addr)
                .map(|g| g.global_type())
                .ok_or_else(|| incompatible(import, "global", "dangling global"))?;
            if actual != *expected {
                let describe = |g: &crate::parser::module::GlobalType| {
                    format!("{} {}", if g.mutable { "mut" } else { "const" }, g.value_type)
                };
                return Err(incompatible(import, describe(expected), describe(&actual)));
            }
        }
        (kind, ext) => {
            let expected = match kind {
                ExternalKind::Function(_) => "function",
                ExternalKind::Table(_) => "table",
                ExternalKind::Memory(_) => "memory",
                ExternalKind::Global(_) => "global",
            };
            return Err(incompatible(import, expected, ext.kind_name()));
        }
    }
    Ok(())
}
