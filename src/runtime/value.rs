//! WebAssembly value representation

use super::store::FuncAddr;
use crate::parser::module::{RefType, ValueType};
use fhex::ToHex;
use std::fmt;

/// Runtime representation of WebAssembly values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Function reference; `None` is `ref.null func`
    FuncRef(Option<FuncAddr>),
    /// Opaque host reference; `None` is `ref.null extern`
    ExternRef(Option<u32>),
}

impl Value {
    /// Get the WebAssembly type of this value
    pub fn typ(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::FuncRef(_) => ValueType::FuncRef,
            Value::ExternRef(_) => ValueType::ExternRef,
        }
    }

    /// The zero value locals and fresh globals start with
    pub fn default_for(typ: ValueType) -> Value {
        match typ {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::FuncRef => Value::FuncRef(None),
            ValueType::ExternRef => Value::ExternRef(None),
        }
    }

    pub fn null(ref_type: RefType) -> Value {
        match ref_type {
            RefType::FuncRef => Value::FuncRef(None),
            RefType::ExternRef => Value::ExternRef(None),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_funcref(&self) -> Option<Option<FuncAddr>> {
        match self {
            Value::FuncRef(v) => Some(*v),
            _ => None,
        }
    }

    /// True for `ref.null` of either reference type
    pub fn is_null(&self) -> bool {
        matches!(self, Value::FuncRef(None) | Value::ExternRef(None))
    }

    /// Parse a command-line argument as a value of the given type.
    ///
    /// Integers accept signed or unsigned decimal and `0x` hex; floats accept
    /// decimal, `nan`, `inf`, or raw bits written as `0x` hex.
    pub fn parse(typ: ValueType, text: &str) -> Result<Value, String> {
        let hex = text.strip_prefix("0x");
        let bad = |e: &dyn fmt::Display| format!("invalid {typ} value {text:?}: {e}");
        match typ {
            ValueType::I32 => match hex {
                Some(h) => u32::from_str_radix(h, 16).map(|v| Value::I32(v as i32)).map_err(|e| bad(&e)),
                None => text
                    .parse::<i32>()
                    .or_else(|_| text.parse::<u32>().map(|v| v as i32))
                    .map(Value::I32)
                    .map_err(|e| bad(&e)),
            },
            ValueType::I64 => match hex {
                Some(h) => u64::from_str_radix(h, 16).map(|v| Value::I64(v as i64)).map_err(|e| bad(&e)),
                None => text
                    .parse::<i64>()
                    .or_else(|_| text.parse::<u64>().map(|v| v as i64))
                    .map(Value::I64)
                    .map_err(|e| bad(&e)),
            },
            ValueType::F32 => match hex {
                Some(h) => u32::from_str_radix(h, 16)
                    .map(|bits| Value::F32(f32::from_bits(bits)))
                    .map_err(|e| bad(&e)),
                None => text.parse::<f32>().map(Value::F32).map_err(|e| bad(&e)),
            },
            ValueType::F64 => match hex {
                Some(h) => u64::from_str_radix(h, 16)
                    .map(|bits| Value::F64(f64::from_bits(bits)))
                    .map_err(|e| bad(&e)),
                None => text.parse::<f64>().map(Value::F64).map_err(|e| bad(&e)),
            },
            ValueType::FuncRef | ValueType::ExternRef => match text {
                "null" => Ok(Value::default_for(typ)),
                _ if typ == ValueType::ExternRef => text
                    .parse::<u32>()
                    .map(|v| Value::ExternRef(Some(v)))
                    .map_err(|e| bad(&e)),
                _ => Err(format!("function references cannot be passed as arguments: {text:?}")),
            },
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.to_hex()),
            Value::F64(v) => write!(f, "f64:{}", v.to_hex()),
            Value::FuncRef(None) => write!(f, "funcref:null"),
            Value::FuncRef(Some(addr)) => write!(f, "funcref:{}", addr.0),
            Value::ExternRef(None) => write!(f, "externref:null"),
            Value::ExternRef(Some(v)) => write!(f, "externref:{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StoreId;
    use rstest::rstest;

    #[test]
    fn test_value_type() {
        assert_eq!(Value::I32(42).typ(), ValueType::I32);
        assert_eq!(Value::I64(42).typ(), ValueType::I64);
        assert_eq!(Value::F32(42.0).typ(), ValueType::F32);
        assert_eq!(Value::F64(42.0).typ(), ValueType::F64);
        assert_eq!(Value::FuncRef(None).typ(), ValueType::FuncRef);
        assert_eq!(Value::ExternRef(Some(1)).typ(), ValueType::ExternRef);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::I32(42).as_i32(), Some(42));
        assert_eq!(Value::I32(42).as_i64(), None);
        assert_eq!(Value::I64(42).as_i64(), Some(42));
        assert_eq!(Value::F32(42.0).as_f32(), Some(42.0));
        assert_eq!(Value::F64(42.0).as_f64(), Some(42.0));
        let addr = FuncAddr(3, StoreId(0));
        assert_eq!(Value::FuncRef(Some(addr)).as_funcref(), Some(Some(addr)));
    }

    #[test]
    fn test_defaults_and_null() {
        assert_eq!(Value::default_for(ValueType::F64), Value::F64(0.0));
        assert!(Value::default_for(ValueType::FuncRef).is_null());
        assert!(Value::null(RefType::ExternRef).is_null());
        assert!(!Value::ExternRef(Some(0)).is_null());
    }

    #[rstest]
    #[case(ValueType::I32, "42", Value::I32(42))]
    #[case(ValueType::I32, "-1", Value::I32(-1))]
    #[case(ValueType::I32, "4294967295", Value::I32(-1))]
    #[case(ValueType::I32, "0xff", Value::I32(255))]
    #[case(ValueType::I64, "-9", Value::I64(-9))]
    #[case(ValueType::F32, "1.5", Value::F32(1.5))]
    #[case(ValueType::F32, "0x42280000", Value::F32(42.0))]
    #[case(ValueType::F64, "-0.25", Value::F64(-0.25))]
    #[case(ValueType::ExternRef, "null", Value::ExternRef(None))]
    #[case(ValueType::ExternRef, "7", Value::ExternRef(Some(7)))]
    fn test_parse(#[case] typ: ValueType, #[case] text: &str, #[case] expected: Value) {
        assert_eq!(Value::parse(typ, text).unwrap(), expected);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Value::parse(ValueType::I32, "abc").is_err());
        assert!(Value::parse(ValueType::FuncRef, "1").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::I32(42)), "i32:42");
        assert_eq!(format!("{}", Value::I64(42)), "i64:42");
        assert!(format!("{}", Value::F32(42.0)).starts_with("f32:"));
        assert!(format!("{}", Value::F64(42.0)).starts_with("f64:"));
        assert_eq!(format!("{}", Value::FuncRef(None)), "funcref:null");
    }
}
