//! Raw C ABI surface: function table, dynamic loading, and library discovery.

use std::env;
use std::ffi::{c_char, c_void, CStr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use libloading::Library;

use crate::error::{P10Error, P10Result};

/// Opaque tensor handle owned by the native library.
pub type P10TensorHandle = *mut c_void;

/// Raw status value as returned by every fallible entry point.
pub type P10Status = i32;

/// Environment variable naming an explicit library file to load.
pub const PTENSOR_LIB_PATH: &str = "PTENSOR_LIB_PATH";

pub type FromDataFn = unsafe extern "C" fn(
    out_tensor: *mut P10TensorHandle,
    dtype: i32,
    shape: *const i64,
    num_dims: usize,
    data: *const u8,
) -> P10Status;
pub type DestroyFn = unsafe extern "C" fn(tensor: *mut P10TensorHandle) -> P10Status;
pub type GetSizeFn = unsafe extern "C" fn(tensor: P10TensorHandle) -> usize;
pub type GetDTypeFn = unsafe extern "C" fn(tensor: P10TensorHandle) -> i32;
pub type GetShapeFn = unsafe extern "C" fn(
    tensor: P10TensorHandle,
    out_shape: *mut i64,
    num_dims: usize,
) -> P10Status;
pub type GetDimensionsFn = unsafe extern "C" fn(tensor: P10TensorHandle) -> usize;
pub type GetDataFn = unsafe extern "C" fn(tensor: P10TensorHandle) -> *mut c_void;
pub type GetLastErrorMessageFn = unsafe extern "C" fn() -> *const c_char;

/// Resolved entry points of the native library.
///
/// Fields are public so an alternative table (a statically linked build, an
/// in-process stub in tests) can stand in for a dynamically loaded library
/// through [`P10Library::from_fns`].
#[derive(Clone, Copy)]
pub struct LibraryFns {
    pub from_data: FromDataFn,
    pub destroy: DestroyFn,
    pub get_size: GetSizeFn,
    pub get_dtype: GetDTypeFn,
    pub get_shape: GetShapeFn,
    pub get_dimensions: GetDimensionsFn,
    pub get_data: GetDataFn,
    pub get_last_error_message: GetLastErrorMessageFn,
}

/// Loaded native library plus its resolved function table.
pub struct P10Library {
    // Keeps the mapped library alive for as long as the table's pointers are used.
    _lib: Option<Library>,
    fns: LibraryFns,
    path: Option<PathBuf>,
}

impl P10Library {
    /// Loads the library by probing the standard locations in order.
    pub fn open() -> P10Result<Self> {
        let (path, lib) = load_native_library()?;
        tracing::debug!("loaded ptensor library from {}", path.display());
        Self::resolve(lib, Some(path))
    }

    /// Loads the library from an explicit file path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> P10Result<Self> {
        let path = path.as_ref();
        // SAFETY: Loading only maps the library; no symbols are invoked here.
        let lib = unsafe { Library::new(path) }.map_err(P10Error::LibraryLoad)?;
        tracing::debug!("loaded ptensor library from {}", path.display());
        Self::resolve(lib, Some(path.to_path_buf()))
    }

    /// Wraps an already resolved function table.
    pub fn from_fns(fns: LibraryFns) -> Self {
        P10Library {
            _lib: None,
            fns,
            path: None,
        }
    }

    fn resolve(lib: Library, path: Option<PathBuf>) -> P10Result<Self> {
        let fns = LibraryFns {
            from_data: load_symbol(&lib, b"p10_from_data\0")?,
            destroy: load_symbol(&lib, b"p10_destroy\0")?,
            get_size: load_symbol(&lib, b"p10_get_size\0")?,
            get_dtype: load_symbol(&lib, b"p10_get_dtype\0")?,
            get_shape: load_symbol(&lib, b"p10_get_shape\0")?,
            get_dimensions: load_symbol(&lib, b"p10_get_dimensions\0")?,
            get_data: load_symbol(&lib, b"p10_get_data\0")?,
            get_last_error_message: load_symbol(&lib, b"p10_get_last_error_message\0")?,
        };
        Ok(P10Library {
            _lib: Some(lib),
            fns,
            path,
        })
    }

    /// Borrows the resolved function table.
    pub fn fns(&self) -> &LibraryFns {
        &self.fns
    }

    /// Returns the file the library was loaded from.
    ///
    /// Injected tables report `None`; loads that went through the system
    /// linker search report the bare file name.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the library's last detailed error message, if one is set.
    ///
    /// The native side keeps the message in thread-local state and reports
    /// null when the current thread has none.
    pub fn last_error_message(&self) -> Option<String> {
        // SAFETY: The entry point takes no arguments and returns either null or
        // a NUL-terminated string owned by the library's thread-local state.
        let ptr = unsafe { (self.fns.get_last_error_message)() };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: Non-null return values point at a valid C string that stays
        // alive at least until the next native call on this thread.
        let message = unsafe { CStr::from_ptr(ptr) };
        Some(message.to_string_lossy().into_owned())
    }
}

static LIBRARY: OnceLock<Result<Arc<P10Library>, String>> = OnceLock::new();

/// Reports whether the native library can be loaded on this system.
pub fn is_available() -> bool {
    library().is_ok()
}

/// Returns the process-wide library handle, loading it on first use.
///
/// The first call performs discovery and symbol resolution; the outcome,
/// success or failure, is memoized for the lifetime of the process.
pub fn library() -> P10Result<Arc<P10Library>> {
    let init = LIBRARY.get_or_init(|| match P10Library::open() {
        Ok(lib) => Ok(Arc::new(lib)),
        Err(err) => Err(err.to_string()),
    });
    match init {
        Ok(lib) => Ok(Arc::clone(lib)),
        Err(message) => Err(P10Error::Unavailable {
            message: message.clone(),
        }),
    }
}

const BUILD_DIRS: [&str; 5] = [
    "build/lin-release/native/c",
    "build/lin-debug/native/c",
    "build/lin-dev/native/c",
    "build/msbuild/native/c/Release",
    "build/msbuild/native/c/Debug",
];

const SYSTEM_DIRS: [&str; 2] = ["/usr/local/lib", "/usr/lib"];

// Current `ptensor_capi` stems first, then the legacy `ptensor` stems.
const LIBRARY_FILE_NAMES: [&str; 6] = [
    "libptensor_capi.so",
    "ptensor_capi.dll",
    "libptensor_capi.dylib",
    "libptensor.so",
    "ptensor.dll",
    "libptensor.dylib",
];

/// Computes the ordered file-path candidates for the native library.
///
/// Build-tree outputs are probed first, then the system library directories,
/// then an explicit `PTENSOR_LIB_PATH` override. The bare file names are not
/// part of this list; they go through the system linker search as a final
/// fallback.
fn candidate_paths(cwd: &Path, env_override: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for dir in BUILD_DIRS {
        for name in LIBRARY_FILE_NAMES {
            candidates.push(cwd.join(dir).join(name));
        }
    }
    for dir in SYSTEM_DIRS {
        for name in LIBRARY_FILE_NAMES {
            candidates.push(PathBuf::from(dir).join(name));
        }
    }
    if let Some(path) = env_override {
        candidates.push(path.to_path_buf());
    }
    candidates
}

fn load_native_library() -> P10Result<(PathBuf, Library)> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_override = env::var_os(PTENSOR_LIB_PATH).map(PathBuf::from);

    for candidate in candidate_paths(&cwd, env_override.as_deref()) {
        if !candidate.exists() {
            tracing::trace!("ptensor library candidate absent: {}", candidate.display());
            continue;
        }
        // The first extant file is chosen; a broken file at that location is an
        // error rather than a reason to keep probing.
        // SAFETY: Loading only maps the library; no symbols are invoked here.
        let lib = unsafe { Library::new(&candidate) }.map_err(P10Error::LibraryLoad)?;
        return Ok((candidate, lib));
    }

    for name in LIBRARY_FILE_NAMES {
        // SAFETY: Probe through the system linker search; no symbols invoked.
        if let Ok(lib) = unsafe { Library::new(name) } {
            return Ok((PathBuf::from(name), lib));
        }
        tracing::trace!("ptensor library candidate rejected by linker: {name}");
    }

    Err(P10Error::LibraryNotFound)
}

fn load_symbol<T: Copy>(lib: &Library, name: &'static [u8]) -> P10Result<T> {
    // SAFETY: Caller provides the fn-pointer type matching the C declaration.
    let sym = unsafe { lib.get::<T>(name) }.map_err(|err| P10Error::MissingSymbol {
        symbol: display_symbol(name),
        source: err,
    })?;
    Ok(*sym)
}

fn display_symbol(name: &[u8]) -> String {
    String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned()
}
