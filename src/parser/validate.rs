//! Module validation.
//!
//! Function bodies are checked by abstract interpretation over a stack of
//! operand types and a stack of control frames, the standard WebAssembly
//! validation algorithm. While walking each body the
//! validator also pairs every `block`/`loop`/`if` with its `else` and `end`
//! and records label arities, producing a [`CompiledFunction`] the
//! interpreter can run without ever scanning for block boundaries.
//!
//! The result is computed once per [`Module`] and cached, pass or fail.

use super::instruction::{BlockType, Instruction};
use super::module::*;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use MaybeValue::{Unknown, Val};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("unknown type {0}")]
    UnknownType(u32),

    #[error("unknown function {0}")]
    UnknownFunction(u32),

    #[error("unknown table {0}")]
    UnknownTable(u32),

    #[error("unknown memory {0}")]
    UnknownMemory(u32),

    #[error("unknown global {0}")]
    UnknownGlobal(u32),

    #[error("unknown local {0}")]
    UnknownLocal(u32),

    #[error("unknown label {0}")]
    UnknownLabel(u32),

    #[error("unknown elem segment {0}")]
    UnknownElemSegment(u32),

    #[error("unknown data segment {0}")]
    UnknownDataSegment(u32),

    #[error("global {0} is immutable")]
    ImmutableGlobal(u32),

    #[error("alignment must not be larger than natural")]
    BadAlignment,

    #[error("data count section required")]
    DataCountRequired,

    #[error("invalid result arity")]
    InvalidResultArity,

    #[error("constant expression required")]
    ConstantExpressionRequired,

    #[error("size minimum must not be greater than maximum")]
    InvalidLimits,

    #[error("memory size must be at most 65536 pages (4GiB)")]
    MemoryTooLarge,

    #[error("multiple memories")]
    MultipleMemories,

    #[error("duplicate export name {0:?}")]
    DuplicateExport(String),

    #[error("start function must have type [] -> [], found {0}")]
    InvalidStartFunction(FunctionType),

    #[error("undeclared function reference {0}")]
    UndeclaredFunctionReference(u32),

    #[error("else without matching if")]
    ElseWithoutIf,

    #[error("instructions after the final end")]
    OperatorsAfterEnd,

    #[error("function body must end with end")]
    MissingEnd,

    #[error("function {func} at offset {offset:#x}: {error}")]
    InFunction {
        func: u32,
        offset: usize,
        error: Box<ValidationError>,
    },
}

fn mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> ValidationError {
    ValidationError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Resolved control structure for one `block`, `loop`, `if` or `else`,
/// stored at the instruction's position in [`CompiledFunction::blocks`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockTarget {
    /// Position of the matching `else`, for `if` only
    pub else_pc: Option<u32>,
    /// Position of the matching `end`
    pub end_pc: u32,
    pub params: u32,
    pub results: u32,
}

/// A validated function body with everything the interpreter needs.
#[derive(Debug)]
pub struct CompiledFunction {
    /// Index in the module's function index space
    pub index: u32,
    pub func_type: FunctionType,
    /// Declared locals, flattened; parameters are not included
    pub locals: Vec<ValueType>,
    pub body: Vec<Instruction>,
    pub offsets: Vec<usize>,
    /// Parallel to `body`; meaningful at `block`, `loop`, `if` and `else`
    pub blocks: Vec<BlockTarget>,
}

impl CompiledFunction {
    pub fn offset_of(&self, pc: usize) -> Option<usize> {
        self.offsets.get(pc).copied()
    }
}

#[derive(Debug)]
pub struct ValidatedModule {
    /// One entry per defined function, in definition order
    pub functions: Vec<Arc<CompiledFunction>>,
}

#[derive(Default, Clone)]
pub(crate) struct ValidationCache(OnceCell<Result<Arc<ValidatedModule>, ValidationError>>);

impl fmt::Debug for ValidationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            None => write!(f, "ValidationCache(pending)"),
            Some(Ok(_)) => write!(f, "ValidationCache(valid)"),
            Some(Err(e)) => write!(f, "ValidationCache(invalid: {e})"),
        }
    }
}

impl Module {
    /// Validate the module. The outcome is cached; later calls are free.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validated().map(|_| ())
    }

    pub(crate) fn validated(&self) -> Result<Arc<ValidatedModule>, ValidationError> {
        self.validation
            .0
            .get_or_init(|| {
                let result = validate_module(self).map(Arc::new);
                match &result {
                    Ok(v) => debug!(functions = v.functions.len(), "module validated"),
                    Err(e) => debug!(error = %e, "module failed validation"),
                }
                result
            })
            .clone()
    }
}

/// Everything a body or constant expression may refer to.
struct Context<'a> {
    types: &'a [FunctionType],
    funcs: Vec<u32>,
    tables: Vec<TableType>,
    memories: Vec<MemoryType>,
    globals: Vec<GlobalType>,
    elems: Vec<RefType>,
    data_count: Option<u32>,
    refs: HashSet<u32>,
}

impl Context<'_> {
    fn func_type(&self, func_idx: u32) -> Result<&FunctionType, ValidationError> {
        let type_idx = *self
            .funcs
            .get(func_idx as usize)
            .ok_or(ValidationError::UnknownFunction(func_idx))?;
        self.types
            .get(type_idx as usize)
            .ok_or(ValidationError::UnknownType(type_idx))
    }

    fn type_at(&self, type_idx: u32) -> Result<&FunctionType, ValidationError> {
        self.types
            .get(type_idx as usize)
            .ok_or(ValidationError::UnknownType(type_idx))
    }

    fn table(&self, table_idx: u32) -> Result<&TableType, ValidationError> {
        self.tables
            .get(table_idx as usize)
            .ok_or(ValidationError::UnknownTable(table_idx))
    }

    fn memory(&self, memory_idx: u32) -> Result<&MemoryType, ValidationError> {
        self.memories
            .get(memory_idx as usize)
            .ok_or(ValidationError::UnknownMemory(memory_idx))
    }

    fn global(&self, global_idx: u32) -> Result<&GlobalType, ValidationError> {
        self.globals
            .get(global_idx as usize)
            .ok_or(ValidationError::UnknownGlobal(global_idx))
    }

    fn elem(&self, elem_idx: u32) -> Result<RefType, ValidationError> {
        self.elems
            .get(elem_idx as usize)
            .copied()
            .ok_or(ValidationError::UnknownElemSegment(elem_idx))
    }

    fn data(&self, data_idx: u32) -> Result<(), ValidationError> {
        let count = self.data_count.ok_or(ValidationError::DataCountRequired)?;
        if data_idx >= count {
            return Err(ValidationError::UnknownDataSegment(data_idx));
        }
        Ok(())
    }

    fn block_type(&self, block_type: &BlockType) -> Result<(Vec<ValueType>, Vec<ValueType>), ValidationError> {
        match block_type {
            BlockType::Empty => Ok((vec![], vec![])),
            BlockType::Value(t) => Ok((vec![], vec![*t])),
            BlockType::FuncType(idx) => {
                let ft = self.type_at(*idx)?;
                Ok((ft.parameters.clone(), ft.return_types.clone()))
            }
        }
    }
}

fn validate_limits(limits: &Limits, max_allowed: Option<u32>) -> Result<(), ValidationError> {
    if let Some(max) = limits.max {
        if limits.min > max {
            return Err(ValidationError::InvalidLimits);
        }
    }
    if let Some(bound) = max_allowed {
        if limits.min > bound || limits.max.map_or(false, |m| m > bound) {
            return Err(ValidationError::MemoryTooLarge);
        }
    }
    Ok(())
}

fn validate_module(module: &Module) -> Result<ValidatedModule, ValidationError> {
    use super::limits::MAX_MEMORY_PAGES;

    for type_idx in module.imported_functions().chain(module.functions.iter().copied()) {
        if type_idx as usize >= module.types.len() {
            return Err(ValidationError::UnknownType(type_idx));
        }
    }

    let tables = module.all_tables();
    for table in &tables {
        validate_limits(&table.limits, None)?;
    }

    let memories = module.all_memories();
    if memories.len() > 1 {
        return Err(ValidationError::MultipleMemories);
    }
    for memory in &memories {
        validate_limits(&memory.limits, Some(MAX_MEMORY_PAGES))?;
    }

    // function references allowed in code
    let mut refs = HashSet::new();
    let mut collect_refs = |expr: &ConstExpr| {
        for inst in &expr.instructions {
            if let Instruction::RefFunc { func_idx } = inst {
                refs.insert(*func_idx);
            }
        }
    };
    for global in &module.globals {
        collect_refs(&global.init);
    }
    for segment in &module.elements {
        segment.items.iter().for_each(&mut collect_refs);
    }
    for export in &module.exports {
        if let ExportIndex::Function(idx) = export.index {
            refs.insert(idx);
        }
    }

    let mut ctx = Context {
        types: &module.types,
        funcs: module.function_type_indices(),
        tables,
        memories,
        // global initialisers only see imported globals
        globals: module.imported_globals().copied().collect(),
        elems: module.elements.iter().map(|e| e.ref_type).collect(),
        data_count: module.data_count,
        refs,
    };

    for global in &module.globals {
        validate_const_expr(&ctx, &global.init, global.global_type.value_type)?;
        ctx.globals.push(global.global_type);
    }

    let mut names = HashSet::new();
    for export in &module.exports {
        if !names.insert(export.name.as_str()) {
            return Err(ValidationError::DuplicateExport(export.name.clone()));
        }
        match export.index {
            ExportIndex::Function(i) => ctx.func_type(i).map(|_| ())?,
            ExportIndex::Table(i) => ctx.table(i).map(|_| ())?,
            ExportIndex::Memory(i) => ctx.memory(i).map(|_| ())?,
            ExportIndex::Global(i) => ctx.global(i).map(|_| ())?,
        }
    }

    if let Some(start) = module.start {
        let ft = ctx.func_type(start)?;
        if !ft.parameters.is_empty() || !ft.return_types.is_empty() {
            return Err(ValidationError::InvalidStartFunction(ft.clone()));
        }
    }

    for segment in &module.elements {
        for item in &segment.items {
            validate_const_expr(&ctx, item, segment.ref_type.value_type())?;
        }
        if let ElementMode::Active { table_index, offset } = &segment.mode {
            let table = ctx.table(*table_index)?;
            if table.ref_type != segment.ref_type {
                return Err(mismatch(table.ref_type, segment.ref_type));
            }
            validate_const_expr(&ctx, offset, ValueType::I32)?;
        }
    }

    for segment in &module.data {
        if let DataMode::Active { memory_index, offset } = &segment.mode {
            ctx.memory(*memory_index)?;
            validate_const_expr(&ctx, offset, ValueType::I32)?;
        }
    }

    let imported = module.num_imported_functions();
    let mut functions = Vec::with_capacity(module.code.len());
    for (i, body) in module.code.iter().enumerate() {
        let index = imported + i as u32;
        let compiled = CodeValidator::new(&ctx, index, body)?.run()?;
        functions.push(Arc::new(compiled));
    }

    Ok(ValidatedModule { functions })
}

fn validate_const_expr(ctx: &Context, expr: &ConstExpr, expected: ValueType) -> Result<(), ValidationError> {
    let mut stack = Vec::new();
    for inst in &expr.instructions {
        let t = match inst {
            Instruction::I32Const { .. } => ValueType::I32,
            Instruction::I64Const { .. } => ValueType::I64,
            Instruction::F32Const { .. } => ValueType::F32,
            Instruction::F64Const { .. } => ValueType::F64,
            Instruction::RefNull { ref_type } => ref_type.value_type(),
            Instruction::RefFunc { func_idx } => {
                ctx.func_type(*func_idx)?;
                ValueType::FuncRef
            }
            Instruction::GlobalGet { global_idx } => {
                let global = ctx.global(*global_idx)?;
                if global.mutable {
                    return Err(ValidationError::ConstantExpressionRequired);
                }
                global.value_type
            }
            _ => return Err(ValidationError::ConstantExpressionRequired),
        };
        stack.push(t);
    }
    match stack.as_slice() {
        [t] if *t == expected => Ok(()),
        [t] => Err(mismatch(expected, t)),
        [] => Err(mismatch(expected, "nothing")),
        _ => Err(mismatch(expected, "multiple values")),
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum MaybeValue {
    Val(ValueType),
    Unknown,
}

impl fmt::Display for MaybeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val(t) => write!(f, "{t}"),
            Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CtrlKind {
    Function,
    Block,
    Loop,
    If,
    Else,
}

#[derive(Debug, Clone)]
struct CtrlFrame {
    kind: CtrlKind,
    start_types: Vec<ValueType>,
    end_types: Vec<ValueType>,
    height: usize,
    unreachable: bool,
    /// Position of the opening instruction
    pc: usize,
}

struct CodeValidator<'a> {
    ctx: &'a Context<'a>,
    index: u32,
    func_type: FunctionType,
    body: &'a FunctionBody,
    /// Parameters followed by declared locals
    locals: Vec<ValueType>,
    vals: Vec<MaybeValue>,
    ctrls: Vec<CtrlFrame>,
    blocks: Vec<BlockTarget>,
}

impl<'a> CodeValidator<'a> {
    fn new(ctx: &'a Context<'a>, index: u32, body: &'a FunctionBody) -> Result<Self, ValidationError> {
        let func_type = ctx.func_type(index)?.clone();
        let mut locals = func_type.parameters.clone();
        for decl in &body.locals {
            locals.extend(std::iter::repeat(decl.value_type).take(decl.count as usize));
        }
        Ok(CodeValidator {
            ctx,
            index,
            func_type,
            body,
            locals,
            vals: Vec::new(),
            ctrls: Vec::new(),
            blocks: vec![BlockTarget::default(); body.body.len()],
        })
    }

    fn run(mut self) -> Result<CompiledFunction, ValidationError> {
        let results = self.func_type.return_types.clone();
        self.push_ctrl(CtrlKind::Function, vec![], results, 0);

        for (pc, inst) in self.body.body.iter().enumerate() {
            let step = if self.ctrls.is_empty() {
                Err(ValidationError::OperatorsAfterEnd)
            } else {
                self.validate(pc, inst)
            };
            if let Err(error) = step {
                return Err(ValidationError::InFunction {
                    func: self.index,
                    offset: self.body.offset_of(pc).unwrap_or(pc),
                    error: Box::new(error),
                });
            }
        }
        if !self.ctrls.is_empty() {
            return Err(ValidationError::InFunction {
                func: self.index,
                offset: self.body.offsets.last().copied().unwrap_or(0),
                error: Box::new(ValidationError::MissingEnd),
            });
        }

        let declared = self.locals.split_off(self.func_type.parameters.len());
        Ok(CompiledFunction {
            index: self.index,
            func_type: self.func_type,
            locals: declared,
            body: self.body.body.clone(),
            offsets: self.body.offsets.clone(),
            blocks: self.blocks,
        })
    }

    // Operand and control stacks -----------------------------------------------

    fn push_val(&mut self, val: MaybeValue) {
        self.vals.push(val);
    }

    fn push_vals(&mut self, types: &[ValueType]) {
        self.vals.extend(types.iter().map(|t| Val(*t)));
    }

    fn pop_val(&mut self) -> Result<MaybeValue, ValidationError> {
        let frame = self.ctrls.last().ok_or(ValidationError::OperatorsAfterEnd)?;
        if self.vals.len() == frame.height {
            if frame.unreachable {
                return Ok(Unknown);
            }
            return Err(mismatch("a value", "nothing"));
        }
        self.vals.pop().ok_or_else(|| mismatch("a value", "nothing"))
    }

    fn pop_expected(&mut self, expected: ValueType) -> Result<MaybeValue, ValidationError> {
        match self.pop_val() {
            Ok(Val(actual)) if actual != expected => Err(mismatch(expected, actual)),
            Ok(v) => Ok(v),
            Err(_) => Err(mismatch(expected, "nothing")),
        }
    }

    fn pop_expecteds(&mut self, types: &[ValueType]) -> Result<Vec<MaybeValue>, ValidationError> {
        let mut popped = Vec::with_capacity(types.len());
        for t in types.iter().rev() {
            popped.push(self.pop_expected(*t)?);
        }
        popped.reverse();
        Ok(popped)
    }

    fn push_ctrl(&mut self, kind: CtrlKind, start_types: Vec<ValueType>, end_types: Vec<ValueType>, pc: usize) {
        let height = self.vals.len();
        self.push_vals(&start_types);
        self.ctrls.push(CtrlFrame {
            kind,
            start_types,
            end_types,
            height,
            unreachable: false,
            pc,
        });
    }

    fn pop_ctrl(&mut self) -> Result<CtrlFrame, ValidationError> {
        let frame = self.ctrls.last().cloned().ok_or(ValidationError::OperatorsAfterEnd)?;
        self.pop_expecteds(&frame.end_types)?;
        if self.vals.len() != frame.height {
            return Err(mismatch(
                format!("{} value(s) at end of block", frame.end_types.len()),
                format!("{}", self.vals.len() - frame.height + frame.end_types.len()),
            ));
        }
        self.ctrls.pop();
        Ok(frame)
    }

    fn label_types(&self, label: u32) -> Result<Vec<ValueType>, ValidationError> {
        let depth = label as usize;
        if depth >= self.ctrls.len() {
            return Err(ValidationError::UnknownLabel(label));
        }
        let frame = &self.ctrls[self.ctrls.len() - 1 - depth];
        Ok(match frame.kind {
            CtrlKind::Loop => frame.start_types.clone(),
            _ => frame.end_types.clone(),
        })
    }

    fn unreachable(&mut self) {
        if let Some(frame) = self.ctrls.last_mut() {
            self.vals.truncate(frame.height);
            frame.unreachable = true;
        }
    }

    fn local(&self, local_idx: u32) -> Result<ValueType, ValidationError> {
        self.locals
            .get(local_idx as usize)
            .copied()
            .ok_or(ValidationError::UnknownLocal(local_idx))
    }

    // Signatures ---------------------------------------------------------------

    fn sig(&mut self, inputs: &[ValueType], output: Option<ValueType>) -> Result<(), ValidationError> {
        self.pop_expecteds(inputs)?;
        if let Some(t) = output {
            self.push_val(Val(t));
        }
        Ok(())
    }

    fn unary(&mut self, input: ValueType, output: ValueType) -> Result<(), ValidationError> {
        self.sig(&[input], Some(output))
    }

    fn binary(&mut self, input: ValueType, output: ValueType) -> Result<(), ValidationError> {
        self.sig(&[input, input], Some(output))
    }

    fn memarg(&self, inst: &Instruction) -> Result<(), ValidationError> {
        self.ctx.memory(0)?;
        if let Some((memarg, natural)) = inst.memory_access() {
            if memarg.align > natural {
                return Err(ValidationError::BadAlignment);
            }
        }
        Ok(())
    }

    fn validate(&mut self, pc: usize, inst: &Instruction) -> Result<(), ValidationError> {
        use Instruction::*;
        use ValueType::{F32, F64, I32, I64};

        match inst {
            // Control -----------------------------------------------------------
            Unreachable => self.unreachable(),
            Nop => {}
            Block { block_type } | Loop { block_type } => {
                let (params, results) = self.ctx.block_type(block_type)?;
                self.pop_expecteds(&params)?;
                let kind = if matches!(inst, Block { .. }) {
                    CtrlKind::Block
                } else {
                    CtrlKind::Loop
                };
                self.record_block(pc, &params, &results);
                self.push_ctrl(kind, params, results, pc);
            }
            If { block_type } => {
                let (params, results) = self.ctx.block_type(block_type)?;
                self.pop_expected(I32)?;
                self.pop_expecteds(&params)?;
                self.record_block(pc, &params, &results);
                self.push_ctrl(CtrlKind::If, params, results, pc);
            }
            Else => {
                let frame = self.pop_ctrl()?;
                if frame.kind != CtrlKind::If {
                    return Err(ValidationError::ElseWithoutIf);
                }
                self.blocks[frame.pc].else_pc = Some(pc as u32);
                self.blocks[pc] = self.blocks[frame.pc];
                self.push_ctrl(CtrlKind::Else, frame.start_types, frame.end_types, frame.pc);
            }
            End => {
                let frame = self.pop_ctrl()?;
                if frame.kind == CtrlKind::If && frame.start_types != frame.end_types {
                    // an if without else must leave its inputs as its outputs
                    return Err(mismatch(
                        format!("{:?}", frame.end_types),
                        format!("{:?}", frame.start_types),
                    ));
                }
                if frame.kind != CtrlKind::Function {
                    let end_pc = pc as u32;
                    self.blocks[frame.pc].end_pc = end_pc;
                    if let Some(else_pc) = self.blocks[frame.pc].else_pc {
                        self.blocks[else_pc as usize].end_pc = end_pc;
                    }
                }
                self.push_vals(&frame.end_types);
            }
            Br { label_idx } => {
                let types = self.label_types(*label_idx)?;
                self.pop_expecteds(&types)?;
                self.unreachable();
            }
            BrIf { label_idx } => {
                self.pop_expected(I32)?;
                let types = self.label_types(*label_idx)?;
                self.pop_expecteds(&types)?;
                self.push_vals(&types);
            }
            BrTable { labels, default } => {
                self.pop_expected(I32)?;
                let default_types = self.label_types(*default)?;
                let arity = default_types.len();
                for label in labels {
                    let types = self.label_types(*label)?;
                    if types.len() != arity {
                        return Err(mismatch(
                            format!("{arity} branch value(s)"),
                            format!("{} for label {label}", types.len()),
                        ));
                    }
                    let popped = self.pop_expecteds(&types)?;
                    self.vals.extend(popped);
                }
                self.pop_expecteds(&default_types)?;
                self.unreachable();
            }
            Return => {
                let results = self.func_type.return_types.clone();
                self.pop_expecteds(&results)?;
                self.unreachable();
            }
            Call { func_idx } => {
                let ft = self.ctx.func_type(*func_idx)?.clone();
                self.pop_expecteds(&ft.parameters)?;
                self.push_vals(&ft.return_types);
            }
            CallIndirect { type_idx, table_idx } => {
                let table = self.ctx.table(*table_idx)?;
                if table.ref_type != RefType::FuncRef {
                    return Err(mismatch(RefType::FuncRef, table.ref_type));
                }
                let ft = self.ctx.type_at(*type_idx)?.clone();
                self.pop_expected(I32)?;
                self.pop_expecteds(&ft.parameters)?;
                self.push_vals(&ft.return_types);
            }

            // Reference ---------------------------------------------------------
            RefNull { ref_type } => self.push_val(Val(ref_type.value_type())),
            RefIsNull => {
                match self.pop_val()? {
                    Val(t) if !t.is_ref() => return Err(mismatch("reference", t)),
                    _ => {}
                }
                self.push_val(Val(I32));
            }
            RefFunc { func_idx } => {
                self.ctx.func_type(*func_idx)?;
                if !self.ctx.refs.contains(func_idx) {
                    return Err(ValidationError::UndeclaredFunctionReference(*func_idx));
                }
                self.push_val(Val(ValueType::FuncRef));
            }

            // Parametric --------------------------------------------------------
            Drop => {
                self.pop_val()?;
            }
            Select => {
                self.pop_expected(I32)?;
                let t1 = self.pop_val()?;
                let t2 = self.pop_val()?;
                for t in [t1, t2] {
                    if let Val(v) = t {
                        if !v.is_num() {
                            return Err(mismatch("numeric operand", v));
                        }
                    }
                }
                if let (Val(a), Val(b)) = (t1, t2) {
                    if a != b {
                        return Err(mismatch(a, b));
                    }
                }
                self.push_val(if t1 == Unknown { t2 } else { t1 });
            }
            SelectTyped { val_types } => {
                if val_types.len() != 1 {
                    return Err(ValidationError::InvalidResultArity);
                }
                let t = val_types[0];
                self.pop_expected(I32)?;
                self.pop_expected(t)?;
                self.pop_expected(t)?;
                self.push_val(Val(t));
            }

            // Variable ----------------------------------------------------------
            LocalGet { local_idx } => {
                let t = self.local(*local_idx)?;
                self.push_val(Val(t));
            }
            LocalSet { local_idx } => {
                let t = self.local(*local_idx)?;
                self.pop_expected(t)?;
            }
            LocalTee { local_idx } => {
                let t = self.local(*local_idx)?;
                self.pop_expected(t)?;
                self.push_val(Val(t));
            }
            GlobalGet { global_idx } => {
                let t = self.ctx.global(*global_idx)?.value_type;
                self.push_val(Val(t));
            }
            GlobalSet { global_idx } => {
                let global = *self.ctx.global(*global_idx)?;
                if !global.mutable {
                    return Err(ValidationError::ImmutableGlobal(*global_idx));
                }
                self.pop_expected(global.value_type)?;
            }

            // Table -------------------------------------------------------------
            TableGet { table_idx } => {
                let t = self.ctx.table(*table_idx)?.ref_type.value_type();
                self.unary(I32, t)?;
            }
            TableSet { table_idx } => {
                let t = self.ctx.table(*table_idx)?.ref_type.value_type();
                self.sig(&[I32, t], None)?;
            }
            TableSize { table_idx } => {
                self.ctx.table(*table_idx)?;
                self.push_val(Val(I32));
            }
            TableGrow { table_idx } => {
                let t = self.ctx.table(*table_idx)?.ref_type.value_type();
                self.sig(&[t, I32], Some(I32))?;
            }
            TableFill { table_idx } => {
                let t = self.ctx.table(*table_idx)?.ref_type.value_type();
                self.sig(&[I32, t, I32], None)?;
            }
            TableCopy { dst_table, src_table } => {
                let dst = self.ctx.table(*dst_table)?.ref_type;
                let src = self.ctx.table(*src_table)?.ref_type;
                if dst != src {
                    return Err(mismatch(dst, src));
                }
                self.sig(&[I32, I32, I32], None)?;
            }
            TableInit { elem_idx, table_idx } => {
                let table = self.ctx.table(*table_idx)?.ref_type;
                let elem = self.ctx.elem(*elem_idx)?;
                if table != elem {
                    return Err(mismatch(table, elem));
                }
                self.sig(&[I32, I32, I32], None)?;
            }
            ElemDrop { elem_idx } => {
                self.ctx.elem(*elem_idx)?;
            }

            // Memory ------------------------------------------------------------
            I32Load { .. } | I32Load8S { .. } | I32Load8U { .. } | I32Load16S { .. } | I32Load16U { .. } => {
                self.memarg(inst)?;
                self.unary(I32, I32)?;
            }
            I64Load { .. }
            | I64Load8S { .. }
            | I64Load8U { .. }
            | I64Load16S { .. }
            | I64Load16U { .. }
            | I64Load32S { .. }
            | I64Load32U { .. } => {
                self.memarg(inst)?;
                self.unary(I32, I64)?;
            }
            F32Load { .. } => {
                self.memarg(inst)?;
                self.unary(I32, F32)?;
            }
            F64Load { .. } => {
                self.memarg(inst)?;
                self.unary(I32, F64)?;
            }
            I32Store { .. } | I32Store8 { .. } | I32Store16 { .. } => {
                self.memarg(inst)?;
                self.sig(&[I32, I32], None)?;
            }
            I64Store { .. } | I64Store8 { .. } | I64Store16 { .. } | I64Store32 { .. } => {
                self.memarg(inst)?;
                self.sig(&[I32, I64], None)?;
            }
            F32Store { .. } => {
                self.memarg(inst)?;
                self.sig(&[I32, F32], None)?;
            }
            F64Store { .. } => {
                self.memarg(inst)?;
                self.sig(&[I32, F64], None)?;
            }
            MemorySize => {
                self.ctx.memory(0)?;
                self.push_val(Val(I32));
            }
            MemoryGrow => {
                self.ctx.memory(0)?;
                self.unary(I32, I32)?;
            }
            MemoryInit { data_idx } => {
                self.ctx.memory(0)?;
                self.ctx.data(*data_idx)?;
                self.sig(&[I32, I32, I32], None)?;
            }
            DataDrop { data_idx } => {
                self.ctx.data(*data_idx)?;
            }
            MemoryCopy | MemoryFill => {
                self.ctx.memory(0)?;
                self.sig(&[I32, I32, I32], None)?;
            }

            // Numeric -----------------------------------------------------------
            I32Const { .. } => self.push_val(Val(I32)),
            I64Const { .. } => self.push_val(Val(I64)),
            F32Const { .. } => self.push_val(Val(F32)),
            F64Const { .. } => self.push_val(Val(F64)),

            // itestop, iunop, cvtop (i32):i32
            I32Eqz | I32Clz | I32Ctz | I32Popcnt | I32Extend8S | I32Extend16S => self.unary(I32, I32)?,

            // irelop, ibinop (i32,i32):i32
            I32Eq | I32Ne | I32LtS | I32LtU | I32GtS | I32GtU | I32LeS | I32LeU | I32GeS | I32GeU | I32Add
            | I32Sub | I32Mul | I32DivS | I32DivU | I32RemS | I32RemU | I32And | I32Or | I32Xor | I32Shl
            | I32ShrS | I32ShrU | I32Rotl | I32Rotr => self.binary(I32, I32)?,

            // (i64):i32
            I64Eqz | I32WrapI64 => self.unary(I64, I32)?,

            // irelop (i64,i64):i32
            I64Eq | I64Ne | I64LtS | I64LtU | I64GtS | I64GtU | I64LeS | I64LeU | I64GeS | I64GeU => {
                self.binary(I64, I32)?
            }

            // iunop, cvtop (i64):i64
            I64Clz | I64Ctz | I64Popcnt | I64Extend8S | I64Extend16S | I64Extend32S => self.unary(I64, I64)?,

            // ibinop (i64,i64):i64
            I64Add | I64Sub | I64Mul | I64DivS | I64DivU | I64RemS | I64RemU | I64And | I64Or | I64Xor | I64Shl
            | I64ShrS | I64ShrU | I64Rotl | I64Rotr => self.binary(I64, I64)?,

            // frelop
            F32Eq | F32Ne | F32Lt | F32Gt | F32Le | F32Ge => self.binary(F32, I32)?,
            F64Eq | F64Ne | F64Lt | F64Gt | F64Le | F64Ge => self.binary(F64, I32)?,

            // funop, fbinop
            F32Abs | F32Neg | F32Ceil | F32Floor | F32Trunc | F32Nearest | F32Sqrt => self.unary(F32, F32)?,
            F32Add | F32Sub | F32Mul | F32Div | F32Min | F32Max | F32Copysign => self.binary(F32, F32)?,
            F64Abs | F64Neg | F64Ceil | F64Floor | F64Trunc | F64Nearest | F64Sqrt => self.unary(F64, F64)?,
            F64Add | F64Sub | F64Mul | F64Div | F64Min | F64Max | F64Copysign => self.binary(F64, F64)?,

            // conversions
            I32TruncF32S | I32TruncF32U | I32TruncSatF32S | I32TruncSatF32U | I32ReinterpretF32 => {
                self.unary(F32, I32)?
            }
            I32TruncF64S | I32TruncF64U | I32TruncSatF64S | I32TruncSatF64U => self.unary(F64, I32)?,
            I64ExtendI32S | I64ExtendI32U => self.unary(I32, I64)?,
            I64TruncF32S | I64TruncF32U | I64TruncSatF32S | I64TruncSatF32U => self.unary(F32, I64)?,
            I64TruncF64S | I64TruncF64U | I64TruncSatF64S | I64TruncSatF64U | I64ReinterpretF64 => {
                self.unary(F64, I64)?
            }
            F32ConvertI32S | F32ConvertI32U | F32ReinterpretI32 => self.unary(I32, F32)?,
            F32ConvertI64S | F32ConvertI64U => self.unary(I64, F32)?,
            F32DemoteF64 => self.unary(F64, F32)?,
            F64ConvertI32S | F64ConvertI32U => self.unary(I32, F64)?,
            F64ConvertI64S | F64ConvertI64U | F64ReinterpretI64 => self.unary(I64, F64)?,
            F64PromoteF32 => self.unary(F32, F64)?,
        }
        Ok(())
    }

    fn record_block(&mut self, pc: usize, params: &[ValueType], results: &[ValueType]) {
        self.blocks[pc] = BlockTarget {
            else_pc: None,
            end_pc: 0,
            params: params.len() as u32,
            results: results.len() as u32,
        };
    }
}
