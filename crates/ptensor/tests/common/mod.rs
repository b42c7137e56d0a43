//! In-process stand-in for the native library, injected through `from_fns`.
//!
//! The stub mirrors the real C API's contract: handles are heap allocations,
//! `from_data` aliases the caller's buffer instead of copying it, the last
//! error message lives in thread-local state, and `destroy` nulls the handle.
//! Counters and failure injection are thread-local too, so tests stay
//! isolated under the one-thread-per-test harness.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_void, CString};
use std::ptr;
use std::sync::Arc;

use ptensor::{LibraryFns, P10Library, P10TensorHandle};

struct FakeTensor {
    dtype: i32,
    dims: Vec<i64>,
    data: *const u8,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static FORCED_STATUS: Cell<Option<i32>> = const { Cell::new(None) };
    static FORCE_NULL_HANDLE: Cell<bool> = const { Cell::new(false) };
    static FROM_DATA_CALLS: Cell<usize> = const { Cell::new(0) };
    static DESTROY_CALLS: Cell<usize> = const { Cell::new(0) };
}

/// Builds a library handle wrapping the stub's function table.
pub fn stub_library() -> Arc<P10Library> {
    Arc::new(P10Library::from_fns(stub_fns()))
}

pub fn stub_fns() -> LibraryFns {
    LibraryFns {
        from_data: stub_from_data,
        destroy: stub_destroy,
        get_size: stub_get_size,
        get_dtype: stub_get_dtype,
        get_shape: stub_get_shape,
        get_dimensions: stub_get_dimensions,
        get_data: stub_get_data,
        get_last_error_message: stub_get_last_error_message,
    }
}

/// Makes the next `from_data` or `destroy` call fail with `status`.
///
/// `message` becomes the thread's detailed error text; `None` clears it, the
/// way the real library overwrites its error state per failing call.
pub fn force_next_failure(status: i32, message: Option<&str>) {
    FORCED_STATUS.with(|cell| cell.set(Some(status)));
    set_last_error(message);
}

/// Makes the next `from_data` call report success without writing a handle.
pub fn force_null_handle() {
    FORCE_NULL_HANDLE.with(|cell| cell.set(true));
}

pub fn set_last_error(message: Option<&str>) {
    let message = message.map(|m| CString::new(m).expect("stub message contains NUL"));
    LAST_ERROR.with(|cell| *cell.borrow_mut() = message);
}

pub fn from_data_calls() -> usize {
    FROM_DATA_CALLS.with(Cell::get)
}

pub fn destroy_calls() -> usize {
    DESTROY_CALLS.with(Cell::get)
}

pub fn reset_counters() {
    FROM_DATA_CALLS.with(|cell| cell.set(0));
    DESTROY_CALLS.with(|cell| cell.set(0));
}

/// Rewrites the dtype code stored behind a live handle.
///
/// # Safety
/// `handle` must be a live handle produced by this stub.
pub unsafe fn override_dtype(handle: P10TensorHandle, code: i32) {
    (*(handle as *mut FakeTensor)).dtype = code;
}

unsafe extern "C" fn stub_from_data(
    out_tensor: *mut P10TensorHandle,
    dtype: i32,
    shape: *const i64,
    num_dims: usize,
    data: *const u8,
) -> i32 {
    FROM_DATA_CALLS.with(|cell| cell.set(cell.get() + 1));
    if let Some(status) = FORCED_STATUS.with(Cell::take) {
        return status;
    }
    if FORCE_NULL_HANDLE.with(Cell::take) {
        return 0;
    }
    let dims = if num_dims == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(shape, num_dims).to_vec()
    };
    let tensor = Box::new(FakeTensor { dtype, dims, data });
    *out_tensor = Box::into_raw(tensor) as P10TensorHandle;
    0
}

unsafe extern "C" fn stub_destroy(tensor: *mut P10TensorHandle) -> i32 {
    DESTROY_CALLS.with(|cell| cell.set(cell.get() + 1));
    if let Some(status) = FORCED_STATUS.with(Cell::take) {
        return status;
    }
    if tensor.is_null() {
        return 0;
    }
    let handle = *tensor;
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut FakeTensor));
        *tensor = ptr::null_mut();
    }
    0
}

unsafe extern "C" fn stub_get_size(tensor: P10TensorHandle) -> usize {
    let tensor = &*(tensor as *const FakeTensor);
    tensor.dims.iter().product::<i64>() as usize
}

unsafe extern "C" fn stub_get_dtype(tensor: P10TensorHandle) -> i32 {
    (*(tensor as *const FakeTensor)).dtype
}

unsafe extern "C" fn stub_get_shape(
    tensor: P10TensorHandle,
    out_shape: *mut i64,
    num_dims: usize,
) -> i32 {
    let tensor = &*(tensor as *const FakeTensor);
    for (i, &dim) in tensor.dims.iter().take(num_dims).enumerate() {
        *out_shape.add(i) = dim;
    }
    0
}

unsafe extern "C" fn stub_get_dimensions(tensor: P10TensorHandle) -> usize {
    (*(tensor as *const FakeTensor)).dims.len()
}

unsafe extern "C" fn stub_get_data(tensor: P10TensorHandle) -> *mut c_void {
    (*(tensor as *const FakeTensor)).data as *mut c_void
}

unsafe extern "C" fn stub_get_last_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| match &*cell.borrow() {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    })
}
