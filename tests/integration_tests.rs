//! Integration tests for wrapping, classification, reporting and dispatch.
//!
//! These run outside of the crate, so stack frames of this file are user
//! frames and show up in report stack traces.
//!
//! The handler slot is process-wide: every test that touches it holds
//! [`serial`] for its whole duration.

use std::sync::{Mutex, MutexGuard};

use scanerror::{
    ErrorLevel, ErrorReport, Exception, Fault, Guard, Guarded, Options,
    error_type::{ErrorType, builtin},
    handler::{clear_error_handler, set_error_handler},
    report::{LineKind, Relation},
    report_error,
};

static SERIAL: Mutex<()> = Mutex::new(());
static REPORTS: Mutex<Vec<ErrorReport>> = Mutex::new(Vec::new());

static STORAGE_ERROR: ErrorType = ErrorType::new("StorageError", Some(&builtin::OS_ERROR));

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    clear_error_handler();
    REPORTS.lock().unwrap().clear();
    guard
}

fn collect(report: &ErrorReport) {
    REPORTS.lock().unwrap().push(report.clone());
}

fn take_reports() -> Vec<ErrorReport> {
    std::mem::take(&mut *REPORTS.lock().unwrap())
}

fn divide(a: i64, b: i64) -> Result<i64, Fault> {
    if b == 0 {
        return Err(Fault::new(&builtin::ZERO_DIVISION_ERROR, "division by zero")
            .local("a", &a)
            .local("b", &b));
    }
    Ok(a / b)
}

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("cannot load configuration")]
    Io(#[from] std::io::Error),
}

#[test]
fn test_division_is_reported() {
    let _serial = serial();
    set_error_handler(collect);

    let outcome = Guard::new().call(|| divide(10, 0)).unwrap();
    assert_eq!(outcome, Guarded::Swallowed("ZeroDivisionError"));

    let reports = take_reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.error.type_name, "ZeroDivisionError");
    assert_eq!(report.error.message, "division by zero");
    assert_eq!(report.error.level, ErrorLevel::Debug);
    assert_eq!(report.location.function, "divide");
    assert_eq!(report.location.module, "integration_tests");
    assert!(report.location.file.ends_with("integration_tests.rs"));
    assert!(
        report
            .location
            .source_line
            .as_deref()
            .is_some_and(|line| line.contains("ZERO_DIVISION_ERROR"))
    );

    let window = report.code_context.as_ref().unwrap();
    assert_eq!(window.error_line, report.location.line);
    assert!(window.lines[window.error_line_index].contains("ZERO_DIVISION_ERROR"));

    let highlighted = report.highlighted_code.as_ref().unwrap();
    let error_lines: Vec<_> = highlighted
        .lines
        .iter()
        .filter(|line| line.kind == LineKind::Error)
        .collect();
    assert_eq!(error_lines.len(), 1);
    assert_eq!(error_lines[0].line_no, report.location.line);
    assert_eq!(error_lines[0].indent_level, 8);

    assert!(!report.stack_trace.is_empty());
    assert!(report.stack_trace.len() <= 10);
    assert_eq!(report.stack_trace[0].function, "divide");
    assert!(report.locals.is_none());
}

#[test]
fn test_returned_values_are_untouched() {
    let _serial = serial();
    set_error_handler(collect);
    assert_eq!(Guard::new().call(|| divide(10, 2)).unwrap(), Guarded::Returned(5));
    assert!(take_reports().is_empty());
}

#[test]
fn test_ignored_error_is_not_reported() {
    let _serial = serial();
    set_error_handler(collect);

    let guard = Guard::with_options(Options::new().ignore(&builtin::ARITHMETIC_ERROR));
    let outcome = guard.call(|| divide(1, 0)).unwrap();
    assert_eq!(outcome, Guarded::Swallowed("ZeroDivisionError"));
    assert!(take_reports().is_empty());
}

#[test]
fn test_propagated_error_is_unchanged() {
    let _serial = serial();
    set_error_handler(collect);

    let guard = Guard::with_options(Options::new().propagate(&builtin::OS_ERROR));
    let error = guard
        .call(|| -> Result<(), Fault> {
            Err(Fault::new(&STORAGE_ERROR, "volume detached")
                .caused_by(Fault::new(&builtin::OS_ERROR, "no response")))
        })
        .unwrap_err();

    assert_eq!(error.error_type(), STORAGE_ERROR);
    assert_eq!(error.message(), "volume detached");
    assert_eq!(error.cause().unwrap().to_string(), "no response");
    assert!(take_reports().is_empty());
}

#[test]
fn test_propagate_wins_over_ignore() {
    let _serial = serial();
    set_error_handler(collect);

    let guard = Guard::with_options(
        Options::new()
            .ignore(&builtin::ZERO_DIVISION_ERROR)
            .propagate(&builtin::EXCEPTION),
    );
    assert!(guard.call(|| divide(1, 0)).is_err());
    assert!(take_reports().is_empty());
}

#[test]
fn test_handler_replacement() {
    let _serial = serial();
    static FIRST: Mutex<usize> = Mutex::new(0);

    set_error_handler(|_: &ErrorReport| *FIRST.lock().unwrap() += 1);
    set_error_handler(collect);
    let _ = Guard::new().call(|| divide(1, 0));

    assert_eq!(*FIRST.lock().unwrap(), 0);
    assert_eq!(take_reports().len(), 1);
}

#[test]
fn test_setting_the_same_handler_twice() {
    let _serial = serial();
    set_error_handler(collect);
    set_error_handler(collect);
    let _ = Guard::new().call(|| divide(1, 0));
    assert_eq!(take_reports().len(), 1);
}

#[test]
fn test_cleared_handler_drops_reports() {
    let _serial = serial();
    set_error_handler(collect);
    assert!(clear_error_handler().is_some());
    assert!(clear_error_handler().is_none());

    let outcome = Guard::new().call(|| divide(1, 0)).unwrap();
    assert_eq!(outcome, Guarded::Swallowed("ZeroDivisionError"));
    assert!(take_reports().is_empty());
}

#[test]
fn test_zero_stack_depth() {
    let _serial = serial();
    set_error_handler(collect);

    let guard = Guard::with_options(Options::new().max_stack_depth(0));
    let _ = guard.call(|| divide(1, 0));

    let report = &take_reports()[0];
    assert!(report.stack_trace.is_empty());
    assert_eq!(report.location.function, "divide");
    assert_ne!(report.location.line, 0);
}

#[test]
fn test_panicking_handler_does_not_affect_the_call() {
    let _serial = serial();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    set_error_handler(|_: &ErrorReport| panic!("handler is broken"));
    let outcome = Guard::new().call(|| divide(1, 0)).unwrap();
    assert_eq!(outcome, Guarded::Swallowed("ZeroDivisionError"));
    clear_error_handler();
}

const OVERRUN_LINE: u32 = line!() + 3;
fn overrun(values: &[u8]) -> Result<u8, Fault> {
    let past_the_end = values.len();
    Ok(values[past_the_end])
}

#[test]
fn test_panics_are_reported() {
    let _serial = serial();
    set_error_handler(collect);

    let outcome = Guard::new().call(|| overrun(&[1, 2, 3])).unwrap();
    assert_eq!(outcome, Guarded::Swallowed("Panic"));

    let reports = take_reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.error.message.contains("index out of bounds"));
    assert_eq!(report.location.line, OVERRUN_LINE);
    assert_eq!(report.location.function, "overrun");
    assert!(report.location.file.ends_with("integration_tests.rs"));
    assert_eq!(report.stack_trace[0].function, "overrun");
    assert_eq!(report.stack_trace[0].line, OVERRUN_LINE);
}

#[test]
fn test_frames_carry_their_surroundings() {
    let _serial = serial();
    set_error_handler(collect);

    let guarded_divide = scanerror::wrap::wrap(|(a, b): (i64, i64)| divide(a, b));
    let wrapped_line = line!() - 1;
    let _ = guarded_divide((1, 0));

    let report = &take_reports()[0];
    let wrapped = report.wrapped_function.as_ref().unwrap();
    assert_eq!(wrapped.name, "test_frames_carry_their_surroundings");
    assert_eq!(wrapped.module, "integration_tests");
    assert_eq!(wrapped.line, wrapped_line);

    let frame = &report.stack_trace[0];
    let window = frame.source_context.as_ref().unwrap();
    assert_eq!(window.error_line, frame.line);
    assert!(window.lines.len() <= 11);
    assert!(window.lines[window.error_line_index].contains("ZERO_DIVISION_ERROR"));
    assert!(report.location.source_context.is_none());

    let raw = report.raw_backtrace.as_deref().unwrap();
    assert!(raw.contains("divide"));
}

#[test]
fn test_locals_capture() {
    let _serial = serial();
    set_error_handler(collect);

    let login = |user: &str, password: &str| -> Result<(), Fault> {
        Err(Fault::new(&builtin::VALUE_ERROR, "rejected")
            .local("user", &user)
            .local("password", &password)
            .local("_attempt", &1)
            .local("payload", &"x".repeat(400)))
    };

    let _ = Guard::new().call(|| login("ada", "hunter2"));
    let _ = Guard::with_options(Options::new().capture_locals(true)).call(|| login("ada", "hunter2"));

    let reports = take_reports();
    assert!(reports[0].locals.is_none());

    let locals = reports[1].locals.as_ref().unwrap();
    assert_eq!(locals["user"], "\"ada\"");
    assert_eq!(locals["password"], "<filtered>");
    assert_eq!(locals["_attempt"], "<filtered>");
    assert_eq!(locals["payload"].chars().count(), 153);
    assert!(locals["payload"].ends_with("..."));
}

#[test]
fn test_exception_chain_root_cause_first() {
    let _serial = serial();
    set_error_handler(collect);

    let _ = Guard::new().call(|| -> Result<(), Fault> {
        Err(Fault::new(&builtin::RUNTIME_ERROR, "sync failed")
            .caused_by(Fault::new(&builtin::KEY_ERROR, "'remote'"))
            .during(Fault::new(&builtin::VALUE_ERROR, "ignored because a cause exists")))
    });

    let chain = &take_reports()[0].error.exception_chain;
    let summary: Vec<_> = chain
        .iter()
        .map(|link| (link.type_name.as_str(), link.relation))
        .collect();
    assert_eq!(
        summary,
        [("KeyError", None), ("RuntimeError", Some(Relation::RaisedFrom))]
    );
}

#[test]
fn test_std_errors_through_fault() {
    let _serial = serial();
    set_error_handler(collect);

    let load = || -> Result<String, Fault> {
        let error = ConfigError::from(std::io::Error::other("permission denied"));
        Err(Fault::from_error(&error))
    };
    let outcome = Guard::with_options(Options::new().ignore(&builtin::OS_ERROR))
        .call(load)
        .unwrap();
    assert_eq!(outcome, Guarded::Swallowed("ConfigError"));

    let chain = &take_reports()[0].error.exception_chain;
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].type_name, "OsError");
    assert_eq!(chain[1].message, "cannot load configuration");
}

#[test]
fn test_manual_report() {
    let _serial = serial();
    set_error_handler(collect);

    let line = line!() + 1;
    report_error("CustomError", "disk full", Options::new().capture_code_context(false));

    let reports = take_reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.error.type_name, "CustomError");
    assert_eq!(report.error.message, "disk full");
    assert_eq!(report.location.line, line);
    assert!(report.location.file.ends_with("integration_tests.rs"));
    assert_eq!(report.location.function, "test_manual_report");
    assert!(report.code_context.is_none());
    assert!(report.highlighted_code.is_none());
}

#[test]
fn test_manual_report_macro() {
    let _serial = serial();
    set_error_handler(collect);

    let free = 0;
    scanerror::report_error!(
        Options::new().error_level(ErrorLevel::Error);
        &STORAGE_ERROR,
        "{free} bytes free"
    );

    let report = &take_reports()[0];
    assert_eq!(report.error.type_name, "StorageError");
    assert_eq!(report.error.message, "0 bytes free");
    assert_eq!(report.error.level, ErrorLevel::Error);
    assert!(report.code_context.is_some());
}

#[test]
fn test_configuration_echo() {
    let _serial = serial();
    set_error_handler(collect);

    let guard = Guard::with_options(
        Options::new()
            .ignore(&builtin::KEY_ERROR)
            .error_level(ErrorLevel::Warning)
            .capture_code_context(false)
            .context("request_id", "r-17")
            .context("attempt", 2),
    );
    let _ = guard.call(|| divide(1, 0));

    let report = &take_reports()[0];
    assert_eq!(&*report.configuration, &**guard.config());

    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["error"]["type"], "ZeroDivisionError");
    assert_eq!(json["error"]["level"], "WARNING");
    assert_eq!(json["code_context"], serde_json::Value::Null);
    assert_eq!(json["configuration"]["ignore_types"], serde_json::json!(["KeyError"]));
    assert_eq!(
        json["configuration"]["custom_context"],
        serde_json::json!({"request_id": "r-17", "attempt": 2})
    );
    assert_eq!(json["configuration"]["max_stack_depth"], 10);
}

#[test]
fn test_report_display() {
    let _serial = serial();
    set_error_handler(collect);

    let _ = Guard::with_options(Options::new().context("tenant", "acme")).call(|| divide(1, 0));

    let rendered = take_reports()[0].to_string();
    assert!(rendered.starts_with("● ZeroDivisionError: division by zero\n"));
    assert!(rendered.contains("integration_tests::divide ("));
    assert!(rendered.contains("Stack trace"));
    assert!(rendered.contains("tenant = \"acme\""));
}
