//! Traps: abrupt termination of an invocation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrapKind {
    #[error("unreachable")]
    Unreachable,
    #[error("integer divide by zero")]
    IntegerDivideByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("invalid conversion to integer")]
    InvalidConversionToInteger,
    #[error("out of bounds memory access")]
    MemoryOutOfBounds,
    #[error("out of bounds table access")]
    TableOutOfBounds,
    #[error("uninitialized element")]
    IndirectCallToNull,
    #[error("indirect call type mismatch")]
    IndirectCallTypeMismatch,
    #[error("call stack exhausted")]
    CallStackExhausted,
    #[error("value stack exhausted")]
    ValueStackExhausted,
    #[error("all fuel consumed")]
    OutOfFuel,
    #[error("host: {0}")]
    Host(String),
    /// Operand stack did not hold what validation promised. Never raised for
    /// validated code.
    #[error("operand stack type mismatch")]
    StackTypeMismatch,
}

/// A trap together with where it happened, when known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{}", location(.func, .offset))]
pub struct Trap {
    pub kind: TrapKind,
    /// Function index within the defining module
    pub func: Option<u32>,
    /// Byte offset of the trapping instruction in the module binary
    pub offset: Option<usize>,
}

fn location(func: &Option<u32>, offset: &Option<usize>) -> String {
    match (func, offset) {
        (Some(func), Some(offset)) => format!(" in function {func} at offset {offset:#x}"),
        (Some(func), None) => format!(" in function {func}"),
        _ => String::new(),
    }
}

impl Trap {
    pub fn new(kind: TrapKind) -> Self {
        Trap {
            kind,
            func: None,
            offset: None,
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        Trap::new(TrapKind::Host(message.into()))
    }

    /// Attach a location unless one is already recorded.
    pub(crate) fn at(mut self, func: u32, offset: Option<usize>) -> Self {
        if self.func.is_none() {
            self.func = Some(func);
            self.offset = offset;
        }
        self
    }
}

impl From<TrapKind> for Trap {
    fn from(kind: TrapKind) -> Self {
        Trap::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Trap::new(TrapKind::Unreachable).to_string(), "unreachable");
        let trap = Trap::new(TrapKind::IntegerDivideByZero).at(3, Some(0x2a));
        assert_eq!(trap.to_string(), "integer divide by zero in function 3 at offset 0x2a");
        assert_eq!(Trap::host("boom").to_string(), "host: boom");
    }

    #[test]
    fn test_location_is_kept_from_innermost() {
        let trap = Trap::new(TrapKind::Unreachable).at(1, Some(10)).at(2, Some(20));
        assert_eq!(trap.func, Some(1));
        assert_eq!(trap.offset, Some(10));
    }
}
