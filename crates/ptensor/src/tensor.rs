//! Safe tensor wrapper over the native runtime's opaque handles.

use std::fmt;
use std::mem::{size_of, ManuallyDrop};
use std::ptr;
use std::sync::Arc;

use half::f16;

use crate::dtype::DType;
use crate::element::Element;
use crate::error::{check_status, P10Error, P10Result};
use crate::ffi::{P10Library, P10Status, P10TensorHandle};
use crate::shape::Shape;

/// Owned tensor handle backed by the native library.
///
/// The wrapper retains the marshaled payload: the native constructor stores
/// the caller's pointer without copying, so the bytes must stay alive until
/// the handle is released.
pub struct Tensor {
    lib: Arc<P10Library>,
    // Opaque native pointer stored as an integer; 0 encodes the disposed state.
    handle: usize,
    // Retained payload; the native side aliases it until the handle is released.
    _data: Vec<u8>,
}

impl Tensor {
    /// Builds a tensor from an owned vector, consuming it without copying.
    ///
    /// The element count is validated against `shape` before the native call.
    pub fn from_vec<E: Element>(
        lib: Arc<P10Library>,
        shape: Shape,
        data: Vec<E>,
    ) -> P10Result<Self> {
        let expected = checked_num_elements(&shape)?;
        if data.len() != expected {
            return Err(P10Error::LengthMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Self::create(lib, shape, E::DTYPE, vec_into_bytes(data))
    }

    /// Builds a tensor by copying a borrowed slice.
    pub fn from_slice<E: Element>(
        lib: Arc<P10Library>,
        shape: Shape,
        data: &[E],
    ) -> P10Result<Self> {
        Self::from_vec(lib, shape, data.to_vec())
    }

    /// Builds a tensor from raw bytes with an explicit dtype.
    ///
    /// The byte length must equal the shape's element count times the dtype
    /// width; no alignment is required of the buffer.
    pub fn from_bytes(
        lib: Arc<P10Library>,
        shape: Shape,
        dtype: DType,
        data: Vec<u8>,
    ) -> P10Result<Self> {
        let expected = checked_byte_len(&shape, dtype)?;
        if data.len() != expected {
            return Err(P10Error::ByteLengthMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Self::create(lib, shape, dtype, data)
    }

    /// Builds a zero-filled tensor of the given shape and dtype.
    pub fn zeros(lib: Arc<P10Library>, shape: Shape, dtype: DType) -> P10Result<Self> {
        // Every supported dtype encodes zero as the all-zeroes bit pattern.
        let bytes = checked_byte_len(&shape, dtype)?;
        Self::create(lib, shape, dtype, vec![0u8; bytes])
    }

    /// Builds a one-filled tensor of the given shape and dtype.
    pub fn ones(lib: Arc<P10Library>, shape: Shape, dtype: DType) -> P10Result<Self> {
        let count = checked_num_elements(&shape)?;
        match dtype {
            DType::F32 => Self::from_vec(lib, shape, vec![1.0f32; count]),
            DType::F64 => Self::from_vec(lib, shape, vec![1.0f64; count]),
            DType::F16 => Self::from_vec(lib, shape, vec![f16::ONE; count]),
            DType::U8 => Self::from_vec(lib, shape, vec![1u8; count]),
            DType::U16 => Self::from_vec(lib, shape, vec![1u16; count]),
            DType::U32 => Self::from_vec(lib, shape, vec![1u32; count]),
            DType::I8 => Self::from_vec(lib, shape, vec![1i8; count]),
            DType::I16 => Self::from_vec(lib, shape, vec![1i16; count]),
            DType::I32 => Self::from_vec(lib, shape, vec![1i32; count]),
            DType::I64 => Self::from_vec(lib, shape, vec![1i64; count]),
        }
    }

    fn create(
        lib: Arc<P10Library>,
        shape: Shape,
        dtype: DType,
        data: Vec<u8>,
    ) -> P10Result<Self> {
        let wire_shape = wire_dims(&shape)?;
        let mut handle: P10TensorHandle = ptr::null_mut();
        // SAFETY: The out handle and dims buffer are locals valid for the call.
        // The data buffer's heap address is stable across the move into the
        // wrapper below, which keeps it alive for the handle's lifetime.
        let status = unsafe {
            (lib.fns().from_data)(
                &mut handle,
                dtype.code(),
                wire_shape.as_ptr(),
                wire_shape.len(),
                data.as_ptr(),
            )
        };
        check_status(status, || lib.last_error_message())?;
        if handle.is_null() {
            return Err(P10Error::NullHandle);
        }
        Ok(Tensor {
            lib,
            handle: handle as usize,
            _data: data,
        })
    }

    /// Reads the tensor's dtype from the library.
    pub fn dtype(&self) -> P10Result<DType> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live and owned by this wrapper.
        let code = unsafe { (self.lib.fns().get_dtype)(handle) };
        DType::from_code(code).ok_or(P10Error::UnknownDType { code })
    }

    /// Reads the tensor's rank from the library.
    pub fn ndim(&self) -> P10Result<usize> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live and owned by this wrapper.
        Ok(unsafe { (self.lib.fns().get_dimensions)(handle) })
    }

    /// Reads the tensor's element count from the library.
    pub fn size(&self) -> P10Result<usize> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live and owned by this wrapper.
        Ok(unsafe { (self.lib.fns().get_size)(handle) })
    }

    /// Reads the tensor's shape from the library.
    pub fn shape(&self) -> P10Result<Shape> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live; the out buffer holds exactly the rank
        // the library just reported.
        let wire = unsafe {
            let rank = (self.lib.fns().get_dimensions)(handle);
            let mut wire = vec![0i64; rank];
            let status = (self.lib.fns().get_shape)(handle, wire.as_mut_ptr(), rank);
            self.check(status)?;
            wire
        };
        let dims = wire
            .into_iter()
            .map(|dim| usize::try_from(dim).map_err(|_| P10Error::InvalidDimension { dim }))
            .collect::<P10Result<Vec<usize>>>()?;
        Ok(Shape::new(dims))
    }

    /// Copies the tensor's contents out of the library as raw bytes.
    pub fn to_bytes(&self) -> P10Result<Vec<u8>> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live; these reads take no pointers.
        let (count, code) = unsafe {
            (
                (self.lib.fns().get_size)(handle),
                (self.lib.fns().get_dtype)(handle),
            )
        };
        let dtype = DType::from_code(code).ok_or(P10Error::UnknownDType { code })?;
        let bytes = count * dtype.size_in_bytes();
        if bytes == 0 {
            return Ok(Vec::new());
        }
        // SAFETY: The handle is live and its data pointer covers `bytes` bytes.
        let src = unsafe { (self.lib.fns().get_data)(handle) };
        if src.is_null() {
            return Err(P10Error::NullHandle);
        }
        let mut out = vec![0u8; bytes];
        // SAFETY: `src` points at the tensor payload of exactly `bytes` bytes
        // and `out` was just allocated with that length.
        unsafe { ptr::copy_nonoverlapping(src as *const u8, out.as_mut_ptr(), bytes) };
        Ok(out)
    }

    /// Copies the tensor's contents out as a typed vector.
    ///
    /// Fails with `DTypeMismatch` when `E` differs from the handle's dtype.
    pub fn to_vec<E: Element>(&self) -> P10Result<Vec<E>> {
        let handle = self.live_handle()?;
        // SAFETY: The handle is live; these reads take no pointers.
        let (count, code) = unsafe {
            (
                (self.lib.fns().get_size)(handle),
                (self.lib.fns().get_dtype)(handle),
            )
        };
        let actual = DType::from_code(code).ok_or(P10Error::UnknownDType { code })?;
        if actual != E::DTYPE {
            return Err(P10Error::DTypeMismatch {
                expected: E::DTYPE,
                actual,
            });
        }
        let mut out: Vec<E> = Vec::with_capacity(count);
        if count != 0 {
            // SAFETY: The handle is live and its data pointer covers `count`
            // elements.
            let src = unsafe { (self.lib.fns().get_data)(handle) };
            if src.is_null() {
                return Err(P10Error::NullHandle);
            }
            // SAFETY: The payload holds `count` elements of `E`'s layout; the
            // copy is byte-wise because the library does not guarantee element
            // alignment of the source.
            unsafe {
                ptr::copy_nonoverlapping(
                    src as *const u8,
                    out.as_mut_ptr() as *mut u8,
                    count * size_of::<E>(),
                );
                out.set_len(count);
            }
        }
        Ok(out)
    }

    /// Formats the tensor's metadata in a single line.
    pub fn describe(&self) -> P10Result<String> {
        Ok(format!(
            "Tensor(shape={}, dtype={}, size={})",
            self.shape()?,
            self.dtype()?,
            self.size()?
        ))
    }

    /// Exposes the raw native handle for interop with other C API consumers.
    ///
    /// The handle stays owned by this wrapper: it must not be destroyed
    /// through the escape hatch and must not be used after disposal.
    pub fn as_raw_handle(&self) -> P10Result<P10TensorHandle> {
        self.live_handle()
    }

    /// Releases the native handle, leaving the tensor in the terminal
    /// disposed state.
    ///
    /// A second call fails with `Disposed` without reaching the library. The
    /// wrapper is marked disposed before the status is inspected, so a
    /// reported failure can never lead to another release attempt.
    pub fn dispose(&mut self) -> P10Result<()> {
        let mut handle = self.live_handle()?;
        self.handle = 0;
        // SAFETY: `handle` holds the only live copy of the pointer; the
        // library nulls it as part of a successful destroy.
        let status = unsafe { (self.lib.fns().destroy)(&mut handle) };
        self.check(status)
    }

    fn live_handle(&self) -> P10Result<P10TensorHandle> {
        if self.handle == 0 {
            return Err(P10Error::Disposed);
        }
        Ok(self.handle as P10TensorHandle)
    }

    fn check(&self, status: P10Status) -> P10Result<()> {
        check_status(status, || self.lib.last_error_message())
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        if self.handle != 0 {
            let mut handle = self.handle as P10TensorHandle;
            self.handle = 0;
            // SAFETY: Handle was created by this library and is released once
            // on drop.
            let _ = unsafe { (self.lib.fns().destroy)(&mut handle) };
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("handle", &self.handle)
            .field("disposed", &(self.handle == 0))
            .finish()
    }
}

/// Converts an owned vector into a raw byte buffer without copying.
fn vec_into_bytes<T>(data: Vec<T>) -> Vec<u8> {
    let mut data = ManuallyDrop::new(data);
    let ptr = data.as_mut_ptr() as *mut u8;
    let len = data.len() * size_of::<T>();
    let cap = data.capacity() * size_of::<T>();
    unsafe { Vec::from_raw_parts(ptr, len, cap) }
}

/// Encodes shape dimensions in the ABI's int64 form.
fn wire_dims(shape: &Shape) -> P10Result<Vec<i64>> {
    shape
        .dims()
        .iter()
        .map(|&dim| i64::try_from(dim).map_err(|_| P10Error::DimensionOverflow { dim }))
        .collect()
}

fn checked_num_elements(shape: &Shape) -> P10Result<usize> {
    shape
        .dims()
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| P10Error::ByteLenOverflow {
            shape: shape.clone(),
        })
}

fn checked_byte_len(shape: &Shape, dtype: DType) -> P10Result<usize> {
    checked_num_elements(shape)?
        .checked_mul(dtype.size_in_bytes())
        .ok_or_else(|| P10Error::ByteLenOverflow {
            shape: shape.clone(),
        })
}
