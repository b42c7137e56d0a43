//! Maps Rust scalar types onto runtime dtypes for typed tensor access.

use half::f16;

use crate::dtype::DType;

mod sealed {
    use half::f16;

    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for f16 {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// Scalar types that can cross the boundary as tensor payloads.
///
/// The trait is sealed: the set of implementations matches the runtime's
/// dtype enumeration exactly, so a typed read can rely on `DTYPE` agreeing
/// with the element's in-memory layout.
pub trait Element: sealed::Sealed + Copy + Send + Sync + 'static {
    /// The runtime dtype corresponding to this scalar type.
    const DTYPE: DType;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for f16 {
    const DTYPE: DType = DType::F16;
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
}

impl Element for u16 {
    const DTYPE: DType = DType::U16;
}

impl Element for u32 {
    const DTYPE: DType = DType::U32;
}

impl Element for i8 {
    const DTYPE: DType = DType::I8;
}

impl Element for i16 {
    const DTYPE: DType = DType::I16;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}
