//! Uncaught-panic hook tests, isolated in their own binary because the
//! panic hook is process-global.

use hierlog::{
    handle_exceptions, unhandle_exceptions, Formatter, Handler, Registry, StreamHandler, ALL,
    TO_JSON,
};
use std::panic;
use std::sync::{Arc, Mutex};

// both tests manipulate the process-wide hook
static HOOK_GUARD: Mutex<()> = Mutex::new(());

#[test]
fn test_panic_is_logged_as_uncaught_critical() {
    let _guard = HOOK_GUARD.lock().unwrap();
    let registry = Registry::new();
    let sink = Arc::new(StreamHandler::new(Vec::new()));
    sink.core().set_formatter(Formatter::new(TO_JSON));
    let logger = registry.get_logger("crashes");
    logger.set_level(ALL).unwrap();
    logger.add_handler(sink.clone());

    handle_exceptions(Arc::clone(&logger), false);
    let result = panic::catch_unwind(|| {
        panic!("things fell apart");
    });
    unhandle_exceptions();
    assert!(result.is_err());

    let output = sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
    let line = output.lines().next().expect("one record logged");
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["name"], "crashes");
    assert_eq!(value["levelname"], "CRITICAL");
    assert_eq!(value["uncaughtException"], true);
    assert_eq!(value["exception"], true);
    assert!(value["args"][0]
        .as_str()
        .unwrap()
        .contains("things fell apart"));
}

#[test]
fn test_reinstall_retargets_existing_hook() {
    let _guard = HOOK_GUARD.lock().unwrap();
    let registry = Registry::new();
    let first_sink = Arc::new(StreamHandler::new(Vec::new()));
    let second_sink = Arc::new(StreamHandler::new(Vec::new()));

    let first = registry.get_logger("first");
    first.set_level(ALL).unwrap();
    first.add_handler(first_sink.clone());

    let second = registry.get_logger("second");
    second.set_level(ALL).unwrap();
    second.add_handler(second_sink.clone());

    handle_exceptions(Arc::clone(&first), false);
    handle_exceptions(Arc::clone(&second), false);
    let _ = panic::catch_unwind(|| panic!("redirected"));
    unhandle_exceptions();

    let first_out = first_sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
    let second_out = second_sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
    assert!(first_out.is_empty());
    assert!(second_out.contains("redirected"));
}
