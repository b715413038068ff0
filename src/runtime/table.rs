//! WebAssembly tables
//!
//! Tables are typed vectors of references (`funcref` or `externref`). They
//! back `call_indirect`, so the bounds check on every access is what stands
//! between a guest-controlled index and an arbitrary slot.

use super::{InstantiationError, Trap, TrapKind, Value};
use crate::parser::module::{Limits, RefType, TableType};

#[derive(Debug)]
pub struct Table {
    ref_type: RefType,
    elements: Vec<Value>,
    max: Option<u32>,
    /// Host-imposed ceiling on the number of elements
    element_limit: u32,
}

fn out_of_bounds() -> Trap {
    Trap::new(TrapKind::TableOutOfBounds)
}

impl Table {
    /// Create a table of `limits.min` null references.
    pub fn new(table_type: TableType, element_limit: u32) -> Result<Self, InstantiationError> {
        let TableType { ref_type, limits } = table_type;
        if limits.min > element_limit {
            return Err(InstantiationError::Resource(format!(
                "initial table size {} exceeds the limit of {element_limit} elements",
                limits.min
            )));
        }
        Ok(Table {
            ref_type,
            elements: vec![Value::null(ref_type); limits.min as usize],
            max: limits.max,
            element_limit,
        })
    }

    pub fn ref_type(&self) -> RefType {
        self.ref_type
    }

    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    pub fn limits(&self) -> Limits {
        Limits::new(self.size(), self.max)
    }

    pub fn table_type(&self) -> TableType {
        TableType {
            ref_type: self.ref_type,
            limits: self.limits(),
        }
    }

    pub fn get(&self, index: u32) -> Result<Value, Trap> {
        self.elements.get(index as usize).copied().ok_or_else(out_of_bounds)
    }

    pub fn set(&mut self, index: u32, value: Value) -> Result<(), Trap> {
        let slot = self.elements.get_mut(index as usize).ok_or_else(out_of_bounds)?;
        *slot = value;
        Ok(())
    }

    /// Grow by `delta` slots filled with `init`. Returns the previous size,
    /// or -1 with the table unchanged.
    pub fn grow(&mut self, delta: u32, init: Value) -> i32 {
        let old_size = self.size();
        let Some(new_size) = old_size.checked_add(delta) else {
            return -1;
        };
        let max = self.max.unwrap_or(u32::MAX).min(self.element_limit);
        if new_size > max {
            return -1;
        }
        if self.elements.try_reserve_exact(delta as usize).is_err() {
            return -1;
        }
        self.elements.resize(new_size as usize, init);
        old_size as i32
    }

    fn range(&self, start: u32, len: u32) -> Result<std::ops::Range<usize>, Trap> {
        let end = start as u64 + len as u64;
        if end > self.elements.len() as u64 {
            return Err(out_of_bounds());
        }
        Ok(start as usize..end as usize)
    }

    /// `table.fill`
    pub fn fill(&mut self, start: u32, value: Value, len: u32) -> Result<(), Trap> {
        let range = self.range(start, len)?;
        self.elements[range].fill(value);
        Ok(())
    }

    /// `table.copy` within one table
    pub fn copy_within(&mut self, dst: u32, src: u32, len: u32) -> Result<(), Trap> {
        let src = self.range(src, len)?;
        let dst = self.range(dst, len)?;
        self.elements.copy_within(src, dst.start);
        Ok(())
    }

    /// `table.copy` from another table
    pub fn copy_from(&mut self, dst: u32, other: &Table, src: u32, len: u32) -> Result<(), Trap> {
        let src = other.range(src, len)?;
        let dst = self.range(dst, len)?;
        self.elements[dst].copy_from_slice(&other.elements[src]);
        Ok(())
    }

    /// `table.init` and active element segments
    pub fn init(&mut self, dst: u32, items: &[Value], src: u32, len: u32) -> Result<(), Trap> {
        let src_end = src as u64 + len as u64;
        if src_end > items.len() as u64 {
            return Err(out_of_bounds());
        }
        let dst = self.range(dst, len)?;
        self.elements[dst].copy_from_slice(&items[src as usize..src_end as usize]);
        Ok(())
    }
}
