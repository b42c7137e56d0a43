//! Safe Rust binding for the ptensor native tensor runtime.
//!
//! Every tensor operation is a pass-through call into the prebuilt `p10_*`
//! C API; this crate marshals buffers and shapes across the boundary, maps
//! status codes onto typed errors, and guards handle lifetimes. No numeric
//! kernel lives here.

pub use half;

pub mod dtype;
pub mod element;
pub mod error;
pub mod ffi;
pub mod shape;
pub mod tensor;

pub use dtype::DType;
pub use element::Element;
pub use error::{check_status, ErrorCode, P10Error, P10Result};
pub use ffi::{is_available, library, LibraryFns, P10Library, P10TensorHandle};
pub use shape::Shape;
pub use tensor::Tensor;
