//! Enumerates the scalar element types understood by the native tensor runtime.

use std::fmt;
use std::str::FromStr;

use crate::error::P10Error;

/// Logical dtype identifier shared between the Rust surface and the C ABI.
///
/// The discriminants mirror the native `P10DTypeEnum` exactly; the runtime
/// reports dtypes as raw integers and this enum is the only translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point following IEEE-754 semantics.
    F32,
    /// 64-bit floating point.
    F64,
    /// 16-bit floating point (IEEE half precision).
    F16,
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
}

impl DType {
    /// Returns the number of bytes required per scalar element.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
            DType::F16 => 2,
            DType::U8 => 1,
            DType::U16 => 2,
            DType::U32 => 4,
            DType::I8 => 1,
            DType::I16 => 2,
            DType::I32 => 4,
            DType::I64 => 8,
        }
    }

    /// Produces the raw code used when crossing the C ABI.
    pub fn code(self) -> i32 {
        match self {
            DType::F32 => 0,
            DType::F64 => 1,
            DType::F16 => 2,
            DType::U8 => 3,
            DType::U16 => 4,
            DType::U32 => 5,
            DType::I8 => 6,
            DType::I16 => 7,
            DType::I32 => 8,
            DType::I64 => 9,
        }
    }

    /// Reconstructs a `DType` from its raw ABI code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DType::F32),
            1 => Some(DType::F64),
            2 => Some(DType::F16),
            3 => Some(DType::U8),
            4 => Some(DType::U16),
            5 => Some(DType::U32),
            6 => Some(DType::I8),
            7 => Some(DType::I16),
            8 => Some(DType::I32),
            9 => Some(DType::I64),
            _ => None,
        }
    }

    /// Returns the spelled-out name the runtime uses in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::F16 => "float16",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = P10Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float32" => Ok(DType::F32),
            "float64" => Ok(DType::F64),
            "float16" => Ok(DType::F16),
            "uint8" => Ok(DType::U8),
            "uint16" => Ok(DType::U16),
            "uint32" => Ok(DType::U32),
            "int8" => Ok(DType::I8),
            "int16" => Ok(DType::I16),
            "int32" => Ok(DType::I32),
            "int64" => Ok(DType::I64),
            other => Err(P10Error::UnknownDTypeName {
                name: other.to_string(),
            }),
        }
    }
}
