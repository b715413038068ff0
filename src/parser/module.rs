//! Decoded module representation.
//!
//! A [`Module`] is the direct, structural image of a binary: index spaces are
//! not yet resolved to anything and no instruction has been checked. It is
//! immutable once decoded and is shared by every instance created from it,
//! typically behind an `Arc`. Build a module completely before validating it:
//! the validation result is computed once and cached.

use super::instruction::Instruction;
use super::validate::ValidationCache;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    // Number types
    I32,
    I64,
    F32,
    F64,
    // Reference types
    FuncRef,
    ExternRef,
}

impl ValueType {
    pub fn is_num(&self) -> bool {
        matches!(self, ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64)
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, ValueType::FuncRef | ValueType::ExternRef)
    }

    pub fn byte(&self) -> u8 {
        use super::encoding::*;
        match self {
            ValueType::I32 => TYPE_I32,
            ValueType::I64 => TYPE_I64,
            ValueType::F32 => TYPE_F32,
            ValueType::F64 => TYPE_F64,
            ValueType::FuncRef => TYPE_FUNCREF,
            ValueType::ExternRef => TYPE_EXTERNREF,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    FuncRef,
    ExternRef,
}

impl RefType {
    pub fn value_type(&self) -> ValueType {
        match self {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.value_type(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionType {
    pub parameters: Vec<ValueType>,
    pub return_types: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(parameters: Vec<ValueType>, return_types: Vec<ValueType>) -> Self {
        FunctionType {
            parameters,
            return_types,
        }
    }
}

fn join_types(types: &[ValueType]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<String>>().join(", ")
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let results = match self.return_types.len() {
            0 => "nil".to_string(),
            1 => self.return_types[0].to_string(),
            _ => format!("({})", join_types(&self.return_types)),
        };
        write!(f, "({}) -> {}", join_types(&self.parameters), results)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Limits { min, max }
    }

    /// Import matching: `self` (the provided entity) may stand in for
    /// `required` when it is at least as large and at most as permissive.
    pub fn is_subtype_of(&self, required: &Limits) -> bool {
        if self.min < required.min {
            return false;
        }
        match (self.max, required.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(have), Some(want)) => have <= want,
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "initial={} max={}", self.min, max),
            None => write!(f, "initial={}", self.min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableType {
    pub ref_type: RefType,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool,
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} mutable={}", self.value_type, self.mutable as u8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalKind {
    Function(u32),
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
}

impl ExternalKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExternalKind::Function(_) => "func",
            ExternalKind::Table(_) => "table",
            ExternalKind::Memory(_) => "memory",
            ExternalKind::Global(_) => "global",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub external_kind: ExternalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportIndex {
    Function(u32),
    Table(u32),
    Memory(u32),
    Global(u32),
}

impl ExportIndex {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExportIndex::Function(_) => "func",
            ExportIndex::Table(_) => "table",
            ExportIndex::Memory(_) => "memory",
            ExportIndex::Global(_) => "global",
        }
    }

    pub fn index(&self) -> u32 {
        match *self {
            ExportIndex::Function(i) | ExportIndex::Table(i) | ExportIndex::Memory(i) | ExportIndex::Global(i) => i,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub index: ExportIndex,
}

/// A constant expression: the instruction sequence without its closing
/// `end`. Validation decides whether it is actually constant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstExpr {
    pub instructions: Vec<Instruction>,
}

impl ConstExpr {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        ConstExpr { instructions }
    }

    pub fn i32(value: i32) -> Self {
        ConstExpr::new(vec![Instruction::I32Const { value }])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: ConstExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementMode {
    Passive,
    Active { table_index: u32, offset: ConstExpr },
    Declarative,
}

/// Element segment. Index-form segments are normalised to `ref.func`
/// expressions when decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSegment {
    pub ref_type: RefType,
    pub items: Vec<ConstExpr>,
    pub mode: ElementMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataMode {
    Passive,
    Active { memory_index: u32, offset: ConstExpr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub init: Vec<u8>,
    pub mode: DataMode,
}

/// A run of locals of one type, as declared in a code entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalDecl {
    pub count: u32,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionBody {
    pub locals: Vec<LocalDecl>,
    /// Flat instruction sequence, including every `end` and the final one.
    pub body: Vec<Instruction>,
    /// Absolute byte offset of each instruction in `body`. Empty for
    /// hand-built bodies.
    pub offsets: Vec<usize>,
}

impl FunctionBody {
    pub fn new(locals: Vec<LocalDecl>, body: Vec<Instruction>) -> Self {
        FunctionBody {
            locals,
            body,
            offsets: Vec::new(),
        }
    }

    pub fn local_count(&self) -> u64 {
        self.locals.iter().map(|l| l.count as u64).sum()
    }

    pub fn offset_of(&self, pc: usize) -> Option<usize> {
        self.offsets.get(pc).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// Where a section sat in the binary, kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPosition {
    pub id: u8,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub types: Vec<FunctionType>,
    pub imports: Vec<Import>,
    /// Type index of each defined function.
    pub functions: Vec<u32>,
    pub tables: Vec<TableType>,
    pub memories: Vec<MemoryType>,
    pub globals: Vec<Global>,
    pub exports: Vec<Export>,
    pub start: Option<u32>,
    pub elements: Vec<ElementSegment>,
    pub data_count: Option<u32>,
    pub code: Vec<FunctionBody>,
    pub data: Vec<DataSegment>,
    pub customs: Vec<CustomSection>,
    pub positions: Vec<SectionPosition>,
    pub(crate) validation: ValidationCache,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    pub fn imported_functions(&self) -> impl Iterator<Item = u32> + '_ {
        self.imports.iter().filter_map(|i| match i.external_kind {
            ExternalKind::Function(type_index) => Some(type_index),
            _ => None,
        })
    }

    pub fn imported_tables(&self) -> impl Iterator<Item = &TableType> + '_ {
        self.imports.iter().filter_map(|i| match &i.external_kind {
            ExternalKind::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn imported_memories(&self) -> impl Iterator<Item = &MemoryType> + '_ {
        self.imports.iter().filter_map(|i| match &i.external_kind {
            ExternalKind::Memory(m) => Some(m),
            _ => None,
        })
    }

    pub fn imported_globals(&self) -> impl Iterator<Item = &GlobalType> + '_ {
        self.imports.iter().filter_map(|i| match &i.external_kind {
            ExternalKind::Global(g) => Some(g),
            _ => None,
        })
    }

    pub fn num_imported_functions(&self) -> u32 {
        self.imported_functions().count() as u32
    }

    pub fn num_imported_globals(&self) -> u32 {
        self.imported_globals().count() as u32
    }

    /// Type index of every function in the function index space.
    pub fn function_type_indices(&self) -> Vec<u32> {
        self.imported_functions().chain(self.functions.iter().copied()).collect()
    }

    /// Signature of the function at `func_index` in the function index space.
    pub fn function_type(&self, func_index: u32) -> Option<&FunctionType> {
        let imported = self.num_imported_functions();
        let type_index = if func_index < imported {
            self.imported_functions().nth(func_index as usize)?
        } else {
            *self.functions.get((func_index - imported) as usize)?
        };
        self.types.get(type_index as usize)
    }

    pub fn all_tables(&self) -> Vec<TableType> {
        self.imported_tables().chain(self.tables.iter()).copied().collect()
    }

    pub fn all_memories(&self) -> Vec<MemoryType> {
        self.imported_memories().chain(self.memories.iter()).copied().collect()
    }

    pub fn all_globals(&self) -> Vec<GlobalType> {
        self.imported_globals()
            .copied()
            .chain(self.globals.iter().map(|g| g.global_type))
            .collect()
    }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    pub fn custom_section(&self, name: &str) -> Option<&CustomSection> {
        self.customs.iter().find(|c| c.name == name)
    }

    fn export_name(&self, index: ExportIndex) -> Option<&str> {
        self.exports.iter().find(|e| e.index == index).map(|e| e.name.as_str())
    }
}

/// Section-by-section dump in the spirit of `wasm-objdump -x`.
impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Sections:")?;
        for p in &self.positions {
            writeln!(
                f,
                "  {:>9} start={:#010x} end={:#010x} (size={:#010x})",
                super::encoding::section_name(p.id),
                p.start,
                p.end,
                p.end - p.start
            )?;
        }

        if !self.types.is_empty() {
            writeln!(f, "Type[{}]:", self.types.len())?;
            for (i, t) in self.types.iter().enumerate() {
                writeln!(f, " - type[{i}] {t}")?;
            }
        }

        if !self.imports.is_empty() {
            writeln!(f, "Import[{}]:", self.imports.len())?;
            let (mut funcs, mut tables, mut mems, mut globals) = (0, 0, 0, 0);
            for import in &self.imports {
                let from = format!("<- {}.{}", import.module, import.name);
                match &import.external_kind {
                    ExternalKind::Function(sig) => {
                        writeln!(f, " - func[{funcs}] sig={sig} {from}")?;
                        funcs += 1;
                    }
                    ExternalKind::Table(t) => {
                        writeln!(f, " - table[{tables}] type={} {} {from}", t.ref_type, t.limits)?;
                        tables += 1;
                    }
                    ExternalKind::Memory(m) => {
                        writeln!(f, " - memory[{mems}] pages: {} {from}", m.limits)?;
                        mems += 1;
                    }
                    ExternalKind::Global(g) => {
                        writeln!(f, " - global[{globals}] {g} {from}")?;
                        globals += 1;
                    }
                }
            }
        }

        let imported_funcs = self.num_imported_functions();
        if !self.functions.is_empty() {
            writeln!(f, "Function[{}]:", self.functions.len())?;
            for (i, sig) in self.functions.iter().enumerate() {
                let index = imported_funcs + i as u32;
                match self.export_name(ExportIndex::Function(index)) {
                    Some(name) => writeln!(f, " - func[{index}] sig={sig} <{name}>")?,
                    None => writeln!(f, " - func[{index}] sig={sig}")?,
                }
            }
        }

        if !self.tables.is_empty() {
            writeln!(f, "Table[{}]:", self.tables.len())?;
            for (i, t) in self.tables.iter().enumerate() {
                writeln!(f, " - table[{i}] type={} {}", t.ref_type, t.limits)?;
            }
        }

        if !self.memories.is_empty() {
            writeln!(f, "Memory[{}]:", self.memories.len())?;
            for (i, m) in self.memories.iter().enumerate() {
                writeln!(f, " - memory[{i}] pages: {}", m.limits)?;
            }
        }

        if !self.globals.is_empty() {
            writeln!(f, "Global[{}]:", self.globals.len())?;
            let imported = self.num_imported_globals();
            for (i, g) in self.globals.iter().enumerate() {
                let init = g.init.instructions.first().map(ToString::to_string).unwrap_or_default();
                writeln!(f, " - global[{}] {} - init {}", imported + i as u32, g.global_type, init)?;
            }
        }

        if !self.exports.is_empty() {
            writeln!(f, "Export[{}]:", self.exports.len())?;
            for e in &self.exports {
                writeln!(f, " - {}[{}] -> \"{}\"", e.index.kind_name(), e.index.index(), e.name)?;
            }
        }

        if let Some(start) = self.start {
            writeln!(f, "Start:\n - start function: {start}")?;
        }

        if !self.elements.is_empty() {
            writeln!(f, "Elem[{}]:", self.elements.len())?;
            for (i, e) in self.elements.iter().enumerate() {
                let mode = match &e.mode {
                    ElementMode::Passive => "passive".to_string(),
                    ElementMode::Declarative => "declarative".to_string(),
                    ElementMode::Active { table_index, .. } => format!("table={table_index}"),
                };
                writeln!(f, " - segment[{i}] {} {} count={}", e.ref_type, mode, e.items.len())?;
            }
        }

        if !self.code.is_empty() {
            writeln!(f, "Code[{}]:", self.code.len())?;
            for (i, body) in self.code.iter().enumerate() {
                writeln!(
                    f,
                    " - func[{}] locals={} instructions={}",
                    imported_funcs + i as u32,
                    body.local_count(),
                    body.body.len()
                )?;
            }
        }

        if !self.data.is_empty() {
            writeln!(f, "Data[{}]:", self.data.len())?;
            for (i, d) in self.data.iter().enumerate() {
                let mode = match &d.mode {
                    DataMode::Passive => "passive".to_string(),
                    DataMode::Active { memory_index, .. } => format!("memory={memory_index}"),
                };
                writeln!(f, " - segment[{i}] {} size={}", mode, d.init.len())?;
            }
        }

        if !self.customs.is_empty() {
            writeln!(f, "Custom:")?;
            for c in &self.customs {
                let preview = &c.data[..c.data.len().min(16)];
                writeln!(f, " - \"{}\" ({} bytes) {}", c.name, c.data.len(), hex::encode(preview))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type_display() {
        let t = FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::F32]);
        assert_eq!(t.to_string(), "(i32, i64) -> f32");
        let t = FunctionType::new(vec![], vec![]);
        assert_eq!(t.to_string(), "() -> nil");
        let t = FunctionType::new(vec![], vec![ValueType::I32, ValueType::I32]);
        assert_eq!(t.to_string(), "() -> (i32, i32)");
    }

    #[test]
    fn test_limits_subtyping() {
        let required = Limits::new(1, Some(4));
        assert!(Limits::new(1, Some(4)).is_subtype_of(&required));
        assert!(Limits::new(2, Some(3)).is_subtype_of(&required));
        assert!(!Limits::new(0, Some(4)).is_subtype_of(&required));
        assert!(!Limits::new(1, None).is_subtype_of(&required));
        assert!(!Limits::new(1, Some(5)).is_subtype_of(&required));
        assert!(Limits::new(3, None).is_subtype_of(&Limits::new(1, None)));
    }

    #[test]
    fn test_function_index_space_includes_imports() {
        let mut module = Module::new();
        module.types = vec![
            FunctionType::new(vec![ValueType::I32], vec![]),
            FunctionType::new(vec![], vec![ValueType::I64]),
        ];
        module.imports.push(Import {
            module: "env".to_string(),
            name: "log".to_string(),
            external_kind: ExternalKind::Function(0),
        });
        module.functions = vec![1];

        assert_eq!(module.function_type_indices(), vec![0, 1]);
        assert_eq!(module.function_type(0), Some(&module.types[0]));
        assert_eq!(module.function_type(1), Some(&module.types[1]));
        assert_eq!(module.function_type(2), None);
    }
}
