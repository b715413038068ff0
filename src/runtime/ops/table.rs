//! Table instructions
//!
//! Tables live in the store; instructions that touch two tables receive the
//! whole arena and split it so both can be borrowed at once.

use super::{Stack, Trap, Value};
use crate::runtime::table::Table;

pub fn table_get(stack: &mut Stack, table: &Table) -> Result<(), Trap> {
    let index = stack.pop_u32()?;
    stack.push(table.get(index)?);
    Ok(())
}

pub fn table_set(stack: &mut Stack, table: &mut Table) -> Result<(), Trap> {
    let value = stack.pop_ref()?;
    let index = stack.pop_u32()?;
    table.set(index, value)
}

pub fn table_size(stack: &mut Stack, table: &Table) -> Result<(), Trap> {
    stack.push(Value::I32(table.size() as i32));
    Ok(())
}

/// table.grow: pops the delta, then the fill value; pushes the old size or -1.
pub fn table_grow(stack: &mut Stack, table: &mut Table) -> Result<(), Trap> {
    let delta = stack.pop_u32()?;
    let init = stack.pop_ref()?;
    stack.push(Value::I32(table.grow(delta, init)));
    Ok(())
}

pub fn table_fill(stack: &mut Stack, table: &mut Table) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let value = stack.pop_ref()?;
    let start = stack.pop_u32()?;
    table.fill(start, value, len)
}

/// table.copy between `tables[dst]` and `tables[src]`, which may be the same.
pub fn table_copy(stack: &mut Stack, tables: &mut [Table], dst: usize, src: usize) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let s = stack.pop_u32()?;
    let d = stack.pop_u32()?;
    if dst == src {
        return tables[dst].copy_within(d, s, len);
    }
    let (to, from) = if dst < src {
        let (low, high) = tables.split_at_mut(src);
        (&mut low[dst], &high[0])
    } else {
        let (low, high) = tables.split_at_mut(dst);
        (&mut high[0], &low[src])
    };
    to.copy_from(d, from, s, len)
}

/// table.init from an element segment; a dropped segment has no items.
pub fn table_init(stack: &mut Stack, table: &mut Table, items: &[Value]) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let src = stack.pop_u32()?;
    let dst = stack.pop_u32()?;
    table.init(dst, items, src, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::{Limits, RefType, TableType};
    use crate::runtime::{FuncAddr, StoreId, TrapKind};

    fn funcref_table(min: u32) -> Table {
        Table::new(
            TableType {
                ref_type: RefType::FuncRef,
                limits: Limits::new(min, Some(8)),
            },
            100,
        )
        .unwrap()
    }

    #[test]
    fn test_copy_between_tables() {
        let f = Value::FuncRef(Some(FuncAddr(5, StoreId(0))));
        let mut tables = vec![funcref_table(4), funcref_table(4)];
        tables[1].set(0, f).unwrap();

        let mut stack = Stack::new();
        stack.push_all([Value::I32(3), Value::I32(0), Value::I32(1)]);
        table_copy(&mut stack, &mut tables, 0, 1).unwrap();
        assert_eq!(tables[0].get(3).unwrap(), f);

        stack.push_all([Value::I32(0), Value::I32(3), Value::I32(1)]);
        table_copy(&mut stack, &mut tables, 1, 0).unwrap();
        assert_eq!(tables[1].get(0).unwrap(), f);

        stack.push_all([Value::I32(3), Value::I32(0), Value::I32(2)]);
        assert_eq!(
            table_copy(&mut stack, &mut tables, 0, 0).unwrap_err().kind,
            TrapKind::TableOutOfBounds
        );
    }

    #[test]
    fn test_grow_and_size() {
        let mut table = funcref_table(1);
        let mut stack = Stack::new();
        stack.push_all([Value::FuncRef(None), Value::I32(2)]);
        table_grow(&mut stack, &mut table).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(1));

        stack.push_all([Value::FuncRef(None), Value::I32(10)]);
        table_grow(&mut stack, &mut table).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(-1));

        table_size(&mut stack, &table).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(3));
    }
}
