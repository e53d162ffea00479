//! Integration tests for error handling

use simcast::error::{ResultExt, SimcastError};

#[test]
fn test_error_context_chaining() {
    let base = SimcastError::backend("pipeline exited");
    let with_context = base.with_context("initializing camera 'cam0'");

    let msg = format!("{}", with_context);
    assert!(msg.contains("initializing camera 'cam0'"));
    assert!(msg.contains("pipeline exited"));
}

#[test]
fn test_result_ext_context() {
    let result: Result<(), SimcastError> = Err(SimcastError::config("unknown backend"));
    let with_context = result.context("building streamer registry");

    let err = with_context.unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("building streamer registry"));
    assert!(msg.contains("unknown backend"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
    let err: SimcastError = io.into();
    assert!(matches!(err, SimcastError::Io(_)));
}
