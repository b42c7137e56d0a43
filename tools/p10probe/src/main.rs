use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use ptensor::ffi::PTENSOR_LIB_PATH;
use ptensor::{DType, P10Error, P10Library, Shape, Tensor};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_help();
        return Ok(());
    };

    match cmd.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("p10probe 0.1.0");
            Ok(())
        }
        "probe" => run_probe(args.collect()),
        "demo" => run_demo(args.collect()),
        "dtypes" => run_dtypes(),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn run_probe(raw_args: Vec<String>) -> Result<(), String> {
    let lib_path = parse_lib_flag(raw_args)?;
    if let Ok(value) = env::var(PTENSOR_LIB_PATH) {
        println!("{PTENSOR_LIB_PATH}={value}");
    }
    let lib = load_library(lib_path)?;
    match lib.path() {
        Some(path) => println!("loaded={}", path.display()),
        None => println!("loaded=<injected>"),
    }
    println!("symbols=resolved");
    Ok(())
}

fn run_demo(raw_args: Vec<String>) -> Result<(), String> {
    let lib_path = parse_lib_flag(raw_args)?;
    let lib = load_library(lib_path)?;

    let mut tensor = Tensor::from_vec(
        lib,
        Shape::new(vec![2, 3]),
        vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
    )
    .map_err(describe_error)?;
    println!("{}", tensor.describe().map_err(describe_error)?);
    println!("values={:?}", tensor.to_vec::<f32>().map_err(describe_error)?);
    println!("bytes={}", tensor.to_bytes().map_err(describe_error)?.len());
    tensor.dispose().map_err(describe_error)?;
    println!("disposed=true");
    Ok(())
}

fn run_dtypes() -> Result<(), String> {
    const DTYPES: [DType; 10] = [
        DType::F32,
        DType::F64,
        DType::F16,
        DType::U8,
        DType::U16,
        DType::U32,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
    ];
    for dtype in DTYPES {
        println!(
            "{name} code={code} bytes={bytes}",
            name = dtype,
            code = dtype.code(),
            bytes = dtype.size_in_bytes()
        );
    }
    Ok(())
}

fn parse_lib_flag(raw_args: Vec<String>) -> Result<Option<PathBuf>, String> {
    let mut lib: Option<PathBuf> = None;
    let mut i = 0usize;
    while i < raw_args.len() {
        match raw_args[i].as_str() {
            "--lib" => {
                i += 1;
                lib = raw_args.get(i).map(PathBuf::from);
                if lib.is_none() {
                    return Err("missing value for --lib".to_string());
                }
            }
            flag => return Err(format!("unknown flag '{flag}'")),
        }
        i += 1;
    }
    Ok(lib)
}

fn load_library(path: Option<PathBuf>) -> Result<Arc<P10Library>, String> {
    match path {
        Some(path) => Ok(Arc::new(
            P10Library::open_at(path).map_err(describe_error)?,
        )),
        None => ptensor::library().map_err(describe_error),
    }
}

fn describe_error(err: P10Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn print_help() {
    println!("p10probe 0.1.0");
    println!("Usage:");
    println!("  p10probe probe [--lib <path>]");
    println!("  p10probe demo [--lib <path>]");
    println!("  p10probe dtypes");
    println!("  p10probe version");
}
