//! The interpreter
//!
//! Guest calls never recurse on the native stack. Each call pushes a
//! [`Frame`] onto an explicit vector and the main loop always runs the top
//! frame, so guest recursion depth is bounded by
//! [`Config::max_call_depth`](crate::Config::max_call_depth) rather than by
//! the host thread's stack.
//!
//! Control flow works on the flat instruction vector produced by
//! validation. `block`, `loop` and `if` push a [`Label`] recording the
//! operand height and result arity; branches unwind to that height and jump
//! to the position stored in the side table, so no instruction is ever
//! scanned at run time to find its matching `end`.
//!
//! A host function is called directly from the loop with `&mut Store`. If
//! it calls back into the store, the nested call gets its own executor, and
//! the frames already active count toward the depth limit.

use super::control::Label;
use super::frame::Frame;
use super::host::{check_results, HostFunc};
use super::memory::Memory;
use super::ops;
use super::stack::Stack;
use super::store::{FuncAddr, FunctionInstance, InstanceId, Store};
use super::{Trap, TrapKind, Value};
use crate::parser::instruction::Instruction;
use crate::parser::module::FunctionType;
use crate::parser::validate::CompiledFunction;
use std::sync::Arc;
use tracing::trace;

/// What the main loop does after an instruction
enum Flow {
    Next,
    Call(FuncAddr),
    Return,
}

enum Callee {
    Wasm(InstanceId, Arc<CompiledFunction>),
    Host(FunctionType, HostFunc),
}

pub(crate) struct Executor<'s> {
    store: &'s mut Store,
    stack: Stack,
    frames: Vec<Frame>,
    /// Frames active in enclosing executors, for re-entrant host calls
    base_depth: usize,
    max_call_depth: usize,
    max_value_stack: usize,
}

impl<'s> Executor<'s> {
    /// Run the function at `addr` to completion. Arguments are assumed to
    /// have been checked against its type.
    pub(crate) fn call(store: &'s mut Store, addr: FuncAddr, args: &[Value]) -> Result<Vec<Value>, Trap> {
        let arity = store
            .func_type(addr)
            .map(|t| t.return_types.len())
            .ok_or_else(|| Trap::host(format!("no function at address {}", addr.0)))?;

        let mut executor = Executor {
            stack: Stack::with_nan_canonicalization(store.config.canonicalize_nans),
            frames: Vec::new(),
            base_depth: store.call_depth,
            max_call_depth: store.config.max_call_depth,
            max_value_stack: store.config.max_value_stack,
            store,
        };
        executor.stack.push_all(args.iter().copied());
        executor.enter(addr)?;
        executor.run()?;
        executor.stack.pop_n(arity)
    }

    fn depth(&self) -> usize {
        self.base_depth + self.frames.len()
    }

    /// Start executing `addr` with its arguments on top of the stack. Guest
    /// functions get a new frame; host functions run to completion here.
    fn enter(&mut self, addr: FuncAddr) -> Result<(), Trap> {
        let callee = match self.store.func(addr) {
            Some(FunctionInstance::Wasm { instance, code, .. }) => Callee::Wasm(*instance, Arc::clone(code)),
            Some(FunctionInstance::Host { func_type, func }) => Callee::Host(func_type.clone(), Arc::clone(func)),
            None => return Err(Trap::host(format!("no function at address {}", addr.0))),
        };

        if self.depth() >= self.max_call_depth {
            return Err(TrapKind::CallStackExhausted.into());
        }

        match callee {
            Callee::Wasm(instance, code) => {
                let args = self.stack.pop_n(code.func_type.parameters.len())?;
                let stack_base = self.stack.depth();
                let instance = self
                    .store
                    .instances
                    .get(instance.0)
                    .cloned()
                    .ok_or_else(|| Trap::host(format!("no instance {}", instance.0)))?;
                trace!(func = code.index, depth = self.depth(), "enter");
                self.frames.push(Frame::new(instance, code, args, stack_base));
            }
            Callee::Host(func_type, func) => {
                let args = self.stack.pop_n(func_type.parameters.len())?;
                trace!(addr = addr.0, "calling host function");

                let saved = self.store.call_depth;
                self.store.call_depth = self.depth() + 1;
                let results = func(self.store, &args);
                self.store.call_depth = saved;

                let results = results?;
                check_results(self.store, &func_type, &results)?;
                self.stack.push_all(results);
            }
        }
        Ok(())
    }

    fn leave(&mut self) {
        if let Some(frame) = self.frames.pop() {
            trace!(func = frame.code.index, "return");
            self.stack.unwind(frame.stack_base, frame.arity);
        }
    }

    fn run(&mut self) -> Result<(), Trap> {
        while let Some(frame) = self.frames.last_mut() {
            let code = Arc::clone(&frame.code);
            let mut pc = frame.pc;

            let call = loop {
                if let Some(fuel) = self.store.fuel.as_mut() {
                    if *fuel == 0 {
                        return Err(Trap::new(TrapKind::OutOfFuel).at(code.index, code.offset_of(pc)));
                    }
                    *fuel -= 1;
                }
                if self.stack.depth() > self.max_value_stack {
                    return Err(Trap::new(TrapKind::ValueStackExhausted).at(code.index, code.offset_of(pc)));
                }

                match Self::step(frame, &mut self.stack, self.store, &code, &mut pc) {
                    Ok(Flow::Next) => {}
                    Ok(Flow::Call(addr)) => break Some(addr),
                    Ok(Flow::Return) => break None,
                    Err(trap) => return Err(trap.at(code.index, code.offset_of(pc))),
                }
            };

            match call {
                Some(addr) => {
                    frame.pc = pc + 1;
                    self.enter(addr).map_err(|trap| trap.at(code.index, code.offset_of(pc)))?;
                }
                None => self.leave(),
            }
        }
        Ok(())
    }

    /// Branch to the label `depth` levels out. Branching past the outermost
    /// label returns from the function.
    fn branch(frame: &mut Frame, stack: &mut Stack, depth: u32, pc: &mut usize) -> Flow {
        let Some(label) = frame.labels.get(depth).copied() else {
            return Flow::Return;
        };
        stack.unwind(label.height, label.arity);
        let target_len = frame.labels.depth() - depth as usize;
        if label.is_loop {
            frame.labels.truncate(target_len);
        } else {
            frame.labels.truncate(target_len - 1);
        }
        *pc = label.target as usize + 1;
        Flow::Next
    }

    fn step(
        frame: &mut Frame,
        stack: &mut Stack,
        store: &mut Store,
        code: &CompiledFunction,
        pc: &mut usize,
    ) -> Result<Flow, Trap> {
        use Instruction::*;

        let Some(inst) = code.body.get(*pc) else {
            return Ok(Flow::Return);
        };

        match inst {
            // ================================================================
            // Control
            // ================================================================
            Unreachable => return Err(TrapKind::Unreachable.into()),
            Nop => {}
            Block { .. } => {
                let target = code.blocks[*pc];
                let height = stack.depth() - target.params as usize;
                frame
                    .labels
                    .push(Label::block(target.results as usize, height, target.end_pc));
            }
            Loop { .. } => {
                let target = code.blocks[*pc];
                let height = stack.depth() - target.params as usize;
                frame
                    .labels
                    .push(Label::looping(target.params as usize, height, *pc as u32));
            }
            If { .. } => {
                let condition = stack.pop_i32()?;
                let target = code.blocks[*pc];
                let height = stack.depth() - target.params as usize;
                frame
                    .labels
                    .push(Label::block(target.results as usize, height, target.end_pc));
                if condition == 0 {
                    // without an else the `end` pops the label
                    *pc = match target.else_pc {
                        Some(else_pc) => else_pc as usize + 1,
                        None => target.end_pc as usize,
                    };
                    return Ok(Flow::Next);
                }
            }
            Else => {
                *pc = code.blocks[*pc].end_pc as usize;
                return Ok(Flow::Next);
            }
            End => match frame.labels.pop() {
                None => return Ok(Flow::Return),
                Some(label) if !label.is_loop => {
                    debug_assert_eq!(stack.depth(), label.height + label.arity, "block exit height");
                }
                Some(_) => {}
            },
            Br { label_idx } => return Ok(Self::branch(frame, stack, *label_idx, pc)),
            BrIf { label_idx } => {
                if stack.pop_i32()? != 0 {
                    return Ok(Self::branch(frame, stack, *label_idx, pc));
                }
            }
            BrTable { labels, default } => {
                let index = stack.pop_u32()? as usize;
                let depth = labels.get(index).copied().unwrap_or(*default);
                return Ok(Self::branch(frame, stack, depth, pc));
            }
            Return => return Ok(Flow::Return),
            Call { func_idx } => return Ok(Flow::Call(frame.instance.funcs[*func_idx as usize])),
            CallIndirect { type_idx, table_idx } => {
                let index = stack.pop_u32()?;
                let table = &store.tables[frame.instance.tables[*table_idx as usize].0];
                let addr = match table.get(index)? {
                    Value::FuncRef(Some(addr)) => addr,
                    Value::FuncRef(None) => return Err(TrapKind::IndirectCallToNull.into()),
                    _ => return Err(TrapKind::StackTypeMismatch.into()),
                };
                let actual = store.func_type(addr).ok_or(TrapKind::IndirectCallToNull)?;
                if actual != frame.instance.func_type(*type_idx) {
                    return Err(TrapKind::IndirectCallTypeMismatch.into());
                }
                return Ok(Flow::Call(addr));
            }

            // ================================================================
            // References
            // ================================================================
            RefNull { ref_type } => stack.push(Value::null(*ref_type)),
            RefIsNull => {
                let value = stack.pop_ref()?;
                stack.push(Value::I32(value.is_null() as i32));
            }
            RefFunc { func_idx } => stack.push(Value::FuncRef(Some(frame.instance.funcs[*func_idx as usize]))),

            // ================================================================
            // Parametric and variables
            // ================================================================
            Drop => ops::parametric::drop(stack)?,
            Select | SelectTyped { .. } => ops::parametric::select(stack)?,
            LocalGet { local_idx } => ops::variable::local_get(stack, frame, *local_idx)?,
            LocalSet { local_idx } => ops::variable::local_set(stack, frame, *local_idx)?,
            LocalTee { local_idx } => ops::variable::local_tee(stack, frame, *local_idx)?,
            GlobalGet { global_idx } => {
                let global = &store.globals[frame.instance.globals[*global_idx as usize].0];
                ops::variable::global_get(stack, global)?
            }
            GlobalSet { global_idx } => {
                let global = &mut store.globals[frame.instance.globals[*global_idx as usize].0];
                ops::variable::global_set(stack, global)?
            }

            // ================================================================
            // Tables
            // ================================================================
            TableGet { table_idx } => {
                let table = &store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_get(stack, table)?
            }
            TableSet { table_idx } => {
                let table = &mut store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_set(stack, table)?
            }
            TableSize { table_idx } => {
                let table = &store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_size(stack, table)?
            }
            TableGrow { table_idx } => {
                let table = &mut store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_grow(stack, table)?
            }
            TableFill { table_idx } => {
                let table = &mut store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_fill(stack, table)?
            }
            TableCopy { dst_table, src_table } => {
                let dst = frame.instance.tables[*dst_table as usize].0;
                let src = frame.instance.tables[*src_table as usize].0;
                ops::table::table_copy(stack, &mut store.tables, dst, src)?
            }
            TableInit { elem_idx, table_idx } => {
                let items = &store.elems[frame.instance.elems[*elem_idx as usize].0].items;
                let table = &mut store.tables[frame.instance.tables[*table_idx as usize].0];
                ops::table::table_init(stack, table, items)?
            }
            ElemDrop { elem_idx } => {
                store.elems[frame.instance.elems[*elem_idx as usize].0].items = Vec::new();
            }

            // ================================================================
            // Memory
            // ================================================================
            I32Load { memarg } => ops::memory::i32_load(stack, memory(store, frame), memarg)?,
            I64Load { memarg } => ops::memory::i64_load(stack, memory(store, frame), memarg)?,
            F32Load { memarg } => ops::memory::f32_load(stack, memory(store, frame), memarg)?,
            F64Load { memarg } => ops::memory::f64_load(stack, memory(store, frame), memarg)?,
            I32Load8S { memarg } => ops::memory::i32_load8_s(stack, memory(store, frame), memarg)?,
            I32Load8U { memarg } => ops::memory::i32_load8_u(stack, memory(store, frame), memarg)?,
            I32Load16S { memarg } => ops::memory::i32_load16_s(stack, memory(store, frame), memarg)?,
            I32Load16U { memarg } => ops::memory::i32_load16_u(stack, memory(store, frame), memarg)?,
            I64Load8S { memarg } => ops::memory::i64_load8_s(stack, memory(store, frame), memarg)?,
            I64Load8U { memarg } => ops::memory::i64_load8_u(stack, memory(store, frame), memarg)?,
            I64Load16S { memarg } => ops::memory::i64_load16_s(stack, memory(store, frame), memarg)?,
            I64Load16U { memarg } => ops::memory::i64_load16_u(stack, memory(store, frame), memarg)?,
            I64Load32S { memarg } => ops::memory::i64_load32_s(stack, memory(store, frame), memarg)?,
            I64Load32U { memarg } => ops::memory::i64_load32_u(stack, memory(store, frame), memarg)?,
            I32Store { memarg } => ops::memory::i32_store(stack, memory_mut(store, frame), memarg)?,
            I64Store { memarg } => ops::memory::i64_store(stack, memory_mut(store, frame), memarg)?,
            F32Store { memarg } => ops::memory::f32_store(stack, memory_mut(store, frame), memarg)?,
            F64Store { memarg } => ops::memory::f64_store(stack, memory_mut(store, frame), memarg)?,
            I32Store8 { memarg } => ops::memory::i32_store8(stack, memory_mut(store, frame), memarg)?,
            I32Store16 { memarg } => ops::memory::i32_store16(stack, memory_mut(store, frame), memarg)?,
            I64Store8 { memarg } => ops::memory::i64_store8(stack, memory_mut(store, frame), memarg)?,
            I64Store16 { memarg } => ops::memory::i64_store16(stack, memory_mut(store, frame), memarg)?,
            I64Store32 { memarg } => ops::memory::i64_store32(stack, memory_mut(store, frame), memarg)?,
            MemorySize => ops::memory::memory_size(stack, memory(store, frame))?,
            MemoryGrow => ops::memory::memory_grow(stack, memory_mut(store, frame))?,
            MemoryFill => ops::memory::memory_fill(stack, memory_mut(store, frame))?,
            MemoryCopy => ops::memory::memory_copy(stack, memory_mut(store, frame))?,
            MemoryInit { data_idx } => {
                let data = &store.datas[frame.instance.datas[*data_idx as usize].0].bytes;
                let memory = &mut store.memories[frame.instance.memories[0].0];
                ops::memory::memory_init(stack, memory, data)?
            }
            DataDrop { data_idx } => {
                store.datas[frame.instance.datas[*data_idx as usize].0].bytes = Vec::new();
            }

            // ================================================================
            // Numeric
            // ================================================================
            I32Const { value } => ops::numeric::i32_const(stack, *value)?,
            I64Const { value } => ops::numeric::i64_const(stack, *value)?,
            F32Const { value } => ops::numeric::f32_const(stack, *value)?,
            F64Const { value } => ops::numeric::f64_const(stack, *value)?,

            I32Eqz => ops::comparison::i32_eqz(stack)?,
            I32Eq => ops::comparison::i32_eq(stack)?,
            I32Ne => ops::comparison::i32_ne(stack)?,
            I32LtS => ops::comparison::i32_lt_s(stack)?,
            I32LtU => ops::comparison::i32_lt_u(stack)?,
            I32GtS => ops::comparison::i32_gt_s(stack)?,
            I32GtU => ops::comparison::i32_gt_u(stack)?,
            I32LeS => ops::comparison::i32_le_s(stack)?,
            I32LeU => ops::comparison::i32_le_u(stack)?,
            I32GeS => ops::comparison::i32_ge_s(stack)?,
            I32GeU => ops::comparison::i32_ge_u(stack)?,
            I64Eqz => ops::comparison::i64_eqz(stack)?,
            I64Eq => ops::comparison::i64_eq(stack)?,
            I64Ne => ops::comparison::i64_ne(stack)?,
            I64LtS => ops::comparison::i64_lt_s(stack)?,
            I64LtU => ops::comparison::i64_lt_u(stack)?,
            I64GtS => ops::comparison::i64_gt_s(stack)?,
            I64GtU => ops::comparison::i64_gt_u(stack)?,
            I64LeS => ops::comparison::i64_le_s(stack)?,
            I64LeU => ops::comparison::i64_le_u(stack)?,
            I64GeS => ops::comparison::i64_ge_s(stack)?,
            I64GeU => ops::comparison::i64_ge_u(stack)?,
            F32Eq => ops::comparison::f32_eq(stack)?,
            F32Ne => ops::comparison::f32_ne(stack)?,
            F32Lt => ops::comparison::f32_lt(stack)?,
            F32Gt => ops::comparison::f32_gt(stack)?,
            F32Le => ops::comparison::f32_le(stack)?,
            F32Ge => ops::comparison::f32_ge(stack)?,
            F64Eq => ops::comparison::f64_eq(stack)?,
            F64Ne => ops::comparison::f64_ne(stack)?,
            F64Lt => ops::comparison::f64_lt(stack)?,
            F64Gt => ops::comparison::f64_gt(stack)?,
            F64Le => ops::comparison::f64_le(stack)?,
            F64Ge => ops::comparison::f64_ge(stack)?,

            I32Clz => ops::bitwise::i32_clz(stack)?,
            I32Ctz => ops::bitwise::i32_ctz(stack)?,
            I32Popcnt => ops::bitwise::i32_popcnt(stack)?,
            I32Add => ops::numeric::i32_add(stack)?,
            I32Sub => ops::numeric::i32_sub(stack)?,
            I32Mul => ops::numeric::i32_mul(stack)?,
            I32DivS => ops::numeric::i32_div_s(stack)?,
            I32DivU => ops::numeric::i32_div_u(stack)?,
            I32RemS => ops::numeric::i32_rem_s(stack)?,
            I32RemU => ops::numeric::i32_rem_u(stack)?,
            I32And => ops::bitwise::i32_and(stack)?,
            I32Or => ops::bitwise::i32_or(stack)?,
            I32Xor => ops::bitwise::i32_xor(stack)?,
            I32Shl => ops::bitwise::i32_shl(stack)?,
            I32ShrS => ops::bitwise::i32_shr_s(stack)?,
            I32ShrU => ops::bitwise::i32_shr_u(stack)?,
            I32Rotl => ops::bitwise::i32_rotl(stack)?,
            I32Rotr => ops::bitwise::i32_rotr(stack)?,

            I64Clz => ops::bitwise::i64_clz(stack)?,
            I64Ctz => ops::bitwise::i64_ctz(stack)?,
            I64Popcnt => ops::bitwise::i64_popcnt(stack)?,
            I64Add => ops::numeric::i64_add(stack)?,
            I64Sub => ops::numeric::i64_sub(stack)?,
            I64Mul => ops::numeric::i64_mul(stack)?,
            I64DivS => ops::numeric::i64_div_s(stack)?,
            I64DivU => ops::numeric::i64_div_u(stack)?,
            I64RemS => ops::numeric::i64_rem_s(stack)?,
            I64RemU => ops::numeric::i64_rem_u(stack)?,
            I64And => ops::bitwise::i64_and(stack)?,
            I64Or => ops::bitwise::i64_or(stack)?,
            I64Xor => ops::bitwise::i64_xor(stack)?,
            I64Shl => ops::bitwise::i64_shl(stack)?,
            I64ShrS => ops::bitwise::i64_shr_s(stack)?,
            I64ShrU => ops::bitwise::i64_shr_u(stack)?,
            I64Rotl => ops::bitwise::i64_rotl(stack)?,
            I64Rotr => ops::bitwise::i64_rotr(stack)?,

            F32Abs => ops::numeric::f32_abs(stack)?,
            F32Neg => ops::numeric::f32_neg(stack)?,
            F32Ceil => ops::numeric::f32_ceil(stack)?,
            F32Floor => ops::numeric::f32_floor(stack)?,
            F32Trunc => ops::numeric::f32_trunc(stack)?,
            F32Nearest => ops::numeric::f32_nearest(stack)?,
            F32Sqrt => ops::numeric::f32_sqrt(stack)?,
            F32Add => ops::numeric::f32_add(stack)?,
            F32Sub => ops::numeric::f32_sub(stack)?,
            F32Mul => ops::numeric::f32_mul(stack)?,
            F32Div => ops::numeric::f32_div(stack)?,
            F32Min => ops::numeric::f32_min(stack)?,
            F32Max => ops::numeric::f32_max(stack)?,
            F32Copysign => ops::numeric::f32_copysign(stack)?,

            F64Abs => ops::numeric::f64_abs(stack)?,
            F64Neg => ops::numeric::f64_neg(stack)?,
            F64Ceil => ops::numeric::f64_ceil(stack)?,
            F64Floor => ops::numeric::f64_floor(stack)?,
            F64Trunc => ops::numeric::f64_trunc(stack)?,
            F64Nearest => ops::numeric::f64_nearest(stack)?,
            F64Sqrt => ops::numeric::f64_sqrt(stack)?,
            F64Add => ops::numeric::f64_add(stack)?,
            F64Sub => ops::numeric::f64_sub(stack)?,
            F64Mul => ops::numeric::f64_mul(stack)?,
            F64Div => ops::numeric::f64_div(stack)?,
            F64Min => ops::numeric::f64_min(stack)?,
            F64Max => ops::numeric::f64_max(stack)?,
            F64Copysign => ops::numeric::f64_copysign(stack)?,

            // ================================================================
            // Conversions
            // ================================================================
            I32WrapI64 => ops::conversion::i32_wrap_i64(stack)?,
            I32TruncF32S => ops::conversion::i32_trunc_f32_s(stack)?,
            I32TruncF32U => ops::conversion::i32_trunc_f32_u(stack)?,
            I32TruncF64S => ops::conversion::i32_trunc_f64_s(stack)?,
            I32TruncF64U => ops::conversion::i32_trunc_f64_u(stack)?,
            I64ExtendI32S => ops::conversion::i64_extend_i32_s(stack)?,
            I64ExtendI32U => ops::conversion::i64_extend_i32_u(stack)?,
            I64TruncF32S => ops::conversion::i64_trunc_f32_s(stack)?,
            I64TruncF32U => ops::conversion::i64_trunc_f32_u(stack)?,
            I64TruncF64S => ops::conversion::i64_trunc_f64_s(stack)?,
            I64TruncF64U => ops::conversion::i64_trunc_f64_u(stack)?,
            F32ConvertI32S => ops::conversion::f32_convert_i32_s(stack)?,
            F32ConvertI32U => ops::conversion::f32_convert_i32_u(stack)?,
            F32ConvertI64S => ops::conversion::f32_convert_i64_s(stack)?,
            F32ConvertI64U => ops::conversion::f32_convert_i64_u(stack)?,
            F32DemoteF64 => ops::conversion::f32_demote_f64(stack)?,
            F64ConvertI32S => ops::conversion::f64_convert_i32_s(stack)?,
            F64ConvertI32U => ops::conversion::f64_convert_i32_u(stack)?,
            F64ConvertI64S => ops::conversion::f64_convert_i64_s(stack)?,
            F64ConvertI64U => ops::conversion::f64_convert_i64_u(stack)?,
            F64PromoteF32 => ops::conversion::f64_promote_f32(stack)?,
            I32ReinterpretF32 => ops::conversion::i32_reinterpret_f32(stack)?,
            I64ReinterpretF64 => ops::conversion::i64_reinterpret_f64(stack)?,
            F32ReinterpretI32 => ops::conversion::f32_reinterpret_i32(stack)?,
            F64ReinterpretI64 => ops::conversion::f64_reinterpret_i64(stack)?,
            I32Extend8S => ops::conversion::i32_extend8_s(stack)?,
            I32Extend16S => ops::conversion::i32_extend16_s(stack)?,
            I64Extend8S => ops::conversion::i64_extend8_s(stack)?,
            I64Extend16S => ops::conversion::i64_extend16_s(stack)?,
            I64Extend32S => ops::conversion::i64_extend32_s(stack)?,
            I32TruncSatF32S => ops::conversion::i32_trunc_sat_f32_s(stack)?,
            I32TruncSatF32U => ops::conversion::i32_trunc_sat_f32_u(stack)?,
            I32TruncSatF64S => ops::conversion::i32_trunc_sat_f64_s(stack)?,
            I32TruncSatF64U => ops::conversion::i32_trunc_sat_f64_u(stack)?,
            I64TruncSatF32S => ops::conversion::i64_trunc_sat_f32_s(stack)?,
            I64TruncSatF32U => ops::conversion::i64_trunc_sat_f32_u(stack)?,
            I64TruncSatF64S => ops::conversion::i64_trunc_sat_f64_s(stack)?,
            I64TruncSatF64U => ops::conversion::i64_trunc_sat_f64_u(stack)?,
        }

        *pc += 1;
        Ok(Flow::Next)
    }
}

/// Memory 0 of the executing instance, which validation guarantees exists
/// for every memory instruction.
#[inline]
fn memory<'a>(store: &'a Store, frame: &Frame) -> &'a Memory {
    &store.memories[frame.instance.memories[0].0]
}

#[inline]
fn memory_mut<'a>(store: &'a mut Store, frame: &Frame) -> &'a mut Memory {
    &mut store.memories[frame.instance.memories[0].0]
}
