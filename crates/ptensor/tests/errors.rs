mod common;

use ptensor::{DType, ErrorCode, P10Error, Shape, Tensor};

#[test]
fn native_failure_carries_the_detailed_message() {
    let lib = common::stub_library();
    common::force_next_failure(3, Some("shape rank exceeds maximum"));
    let err = Tensor::from_vec(lib, Shape::new(vec![1]), vec![1.0f32]).unwrap_err();
    match err {
        P10Error::Native { code, message } => {
            assert_eq!(code, ErrorCode::InvalidArgument);
            assert_eq!(message, "shape rank exceeds maximum");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn native_failure_falls_back_to_the_default_message() {
    let lib = common::stub_library();
    common::force_next_failure(5, None);
    let err = Tensor::from_vec(lib, Shape::new(vec![1]), vec![1.0f32]).unwrap_err();
    match err {
        P10Error::Native { code, message } => {
            assert_eq!(code, ErrorCode::OutOfMemory);
            assert_eq!(message, "Out of memory");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn later_failure_does_not_reuse_a_stale_message() {
    let lib = common::stub_library();
    common::force_next_failure(3, Some("first failure detail"));
    let _ = Tensor::from_vec(lib.clone(), Shape::new(vec![1]), vec![1.0f32]).unwrap_err();

    common::force_next_failure(6, None);
    let err = Tensor::from_vec(lib, Shape::new(vec![1]), vec![1.0f32]).unwrap_err();
    match err {
        P10Error::Native { code, message } => {
            assert_eq!(code, ErrorCode::OutOfRange);
            assert_eq!(message, "Out of range");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unrecognized_status_maps_to_unknown() {
    let lib = common::stub_library();
    common::force_next_failure(77, None);
    let err = Tensor::from_vec(lib, Shape::new(vec![1]), vec![1.0f32]).unwrap_err();
    match err {
        P10Error::Native { code, message } => {
            assert_eq!(code, ErrorCode::Unknown);
            assert!(message.contains("77"), "got {message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unknown_dtype_code_from_the_library_is_surfaced() {
    let lib = common::stub_library();
    let tensor = Tensor::from_vec(lib, Shape::new(vec![2]), vec![1.0f32, 2.0]).unwrap();
    // SAFETY: The handle is live and was produced by the stub.
    unsafe { common::override_dtype(tensor.as_raw_handle().unwrap(), 99) };

    assert!(matches!(
        tensor.dtype(),
        Err(P10Error::UnknownDType { code: 99 })
    ));
    assert!(matches!(
        tensor.to_vec::<f32>(),
        Err(P10Error::UnknownDType { code: 99 })
    ));
    assert!(matches!(
        tensor.to_bytes(),
        Err(P10Error::UnknownDType { code: 99 })
    ));
}

#[test]
fn status_codes_cover_the_native_table() {
    let cases = [
        (1, ErrorCode::Unknown, "Unknown error"),
        (2, ErrorCode::Assertion, "Assertion failed"),
        (3, ErrorCode::InvalidArgument, "Invalid argument"),
        (4, ErrorCode::InvalidOperation, "Invalid operation"),
        (5, ErrorCode::OutOfMemory, "Out of memory"),
        (6, ErrorCode::OutOfRange, "Out of range"),
        (7, ErrorCode::NotImplemented, "Not implemented"),
        (8, ErrorCode::Os, "Operating system error"),
        (9, ErrorCode::Io, "Input/output error"),
    ];
    for (raw, expected_code, default_message) in cases {
        let lib = common::stub_library();
        common::force_next_failure(raw, None);
        let err = Tensor::zeros(lib, Shape::new(vec![1]), DType::U8).unwrap_err();
        match err {
            P10Error::Native { code, message } => {
                assert_eq!(code, expected_code);
                assert_eq!(message, default_message);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn error_displays_are_stable() {
    assert_eq!(P10Error::Disposed.to_string(), "tensor was already disposed");
    let err = P10Error::LengthMismatch {
        shape: Shape::new(vec![2, 3]),
        expected: 6,
        actual: 5,
    };
    assert_eq!(
        err.to_string(),
        "data length 5 does not match shape [2, 3] (6 elements)"
    );
    let err = P10Error::Native {
        code: ErrorCode::Io,
        message: "read past end of stream".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "native call failed with Io: read past end of stream"
    );
    let err = P10Error::DTypeMismatch {
        expected: DType::I32,
        actual: DType::F32,
    };
    assert_eq!(err.to_string(), "requested int32 data from a float32 tensor");
}
