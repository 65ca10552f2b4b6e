//! Wrapped futures: settling after completion, and cancellation.

use std::time::Duration;

use scanerror::{
    ErrorReport, Fault, Guard, Guarded, Options,
    error_type::builtin,
    handler::{clear_error_handler, set_error_handler},
    wrap::wrap_async,
};
use tokio::sync::{Mutex, MutexGuard};

static SERIAL: Mutex<()> = Mutex::const_new(());
static REPORTS: std::sync::Mutex<Vec<ErrorReport>> = std::sync::Mutex::new(Vec::new());

async fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().await;
    REPORTS.lock().unwrap().clear();
    set_error_handler(|report: &ErrorReport| REPORTS.lock().unwrap().push(report.clone()));
    guard
}

fn take_reports() -> Vec<ErrorReport> {
    std::mem::take(&mut *REPORTS.lock().unwrap())
}

async fn fetch(id: u32) -> Result<String, Fault> {
    tokio::task::yield_now().await;
    if id == 0 {
        return Err(Fault::new(&builtin::KEY_ERROR, "no record 0"));
    }
    Ok(format!("record {id}"))
}

#[tokio::test]
async fn test_call_async_reports_after_completion() {
    let _serial = serial().await;

    let guard = Guard::new();
    assert_eq!(
        guard.call_async(fetch(7)).await.unwrap(),
        Guarded::Returned(String::from("record 7"))
    );
    assert_eq!(
        guard.call_async(fetch(0)).await.unwrap(),
        Guarded::Swallowed("KeyError")
    );

    let reports = take_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].location.function, "fetch");
    clear_error_handler();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrapped_async_function_on_other_tasks() {
    let _serial = serial().await;

    let fetch = wrap_async(fetch);
    let handles: Vec<_> = (0..4).map(|id| tokio::spawn(fetch(id))).collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(outcomes[0], Guarded::Swallowed("KeyError"));
    assert_eq!(outcomes[3], Guarded::Returned(String::from("record 3")));
    assert_eq!(take_reports().len(), 1);
    clear_error_handler();
}

#[tokio::test]
async fn test_propagated_async_error() {
    let _serial = serial().await;

    let guard = Guard::with_options(Options::new().propagate(&builtin::LOOKUP_ERROR));
    let error = guard.call_async(fetch(0)).await.unwrap_err();
    assert_eq!(error.message(), "no record 0");
    assert!(take_reports().is_empty());
    clear_error_handler();
}

#[tokio::test]
async fn test_async_panic_is_reported() {
    let _serial = serial().await;

    let line = line!() + 5;
    let outcome = Guard::new()
        .call_async(async {
            tokio::task::yield_now().await;
            if true {
                panic!("poisoned state");
            }
            Ok::<(), Fault>(())
        })
        .await
        .unwrap();
    assert_eq!(outcome, Guarded::Swallowed("Panic"));

    let report = &take_reports()[0];
    assert_eq!(report.error.message, "poisoned state");
    assert_eq!(report.location.line, line);
    assert!(report.location.file.ends_with("async_tests.rs"));
    clear_error_handler();
}

#[tokio::test]
async fn test_timeout_cancels_the_wrapped_future() {
    let _serial = serial().await;

    let guard = Guard::new();
    let slow = guard.call_async(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok::<(), Fault>(())
    });
    assert!(tokio::time::timeout(Duration::from_millis(10), slow).await.is_err());

    let reports = take_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error.type_name, "Cancelled");
    clear_error_handler();
}

#[tokio::test]
async fn test_ignored_cancellation() {
    let _serial = serial().await;

    let guard = Guard::with_options(Options::new().ignore(&builtin::CANCELLED));
    let slow = guard.call_async(std::future::pending::<Result<(), Fault>>());
    assert!(tokio::time::timeout(Duration::from_millis(10), slow).await.is_err());
    assert!(take_reports().is_empty());
    clear_error_handler();
}
