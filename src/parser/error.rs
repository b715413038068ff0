//! Errors produced while decoding the binary format.

use thiserror::Error;

/// A malformed binary. Carries the absolute byte offset at which decoding
/// stopped and what was expected there.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset:#x}")]
pub struct DecodeError {
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        DecodeError { offset, kind }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeErrorKind {
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("magic header not detected")]
    BadMagic,

    #[error("unknown binary version {0:#x}")]
    UnsupportedVersion(u32),

    #[error("malformed LEB128 integer")]
    MalformedLeb128,

    #[error("integer representation too long")]
    IntegerTooLarge,

    #[error("malformed section id {0}")]
    UnknownSection(u8),

    #[error("section {0} out of order or duplicated")]
    SectionOutOfOrder(u8),

    #[error("section size mismatch: declared {declared} bytes, consumed {consumed}")]
    SectionSizeMismatch { declared: u32, consumed: usize },

    #[error("malformed UTF-8 encoding")]
    InvalidUtf8,

    #[error("illegal opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("illegal opcode {0:#04x} {1}")]
    UnknownPrefixedOpcode(u8, u32),

    #[error("malformed value type {0:#04x}")]
    InvalidValueType(u8),

    #[error("malformed reference type {0:#04x}")]
    InvalidRefType(u8),

    #[error("malformed limits flags {0:#04x}")]
    InvalidLimits(u8),

    #[error("malformed mutability {0:#04x}")]
    InvalidMutability(u8),

    #[error("malformed function type form {0:#04x}")]
    InvalidTypeForm(u8),

    #[error("malformed import kind {0:#04x}")]
    InvalidExternalKind(u8),

    #[error("malformed element segment flags {0}")]
    InvalidElementFlags(u32),

    #[error("malformed data segment flags {0}")]
    InvalidDataFlags(u32),

    #[error("malformed element kind {0:#04x}")]
    InvalidElementKind(u8),

    #[error("zero byte expected")]
    ZeroByteExpected,

    #[error("function and code section have inconsistent lengths ({functions} vs {bodies})")]
    FunctionCodeMismatch { functions: u32, bodies: u32 },

    #[error("data count and data section have inconsistent lengths ({declared} vs {actual})")]
    DataCountMismatch { declared: u32, actual: u32 },

    #[error("too many {what}: {count} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        count: u64,
        limit: u32,
    },

    #[error("END opcode expected")]
    MissingEnd,

    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),
}
