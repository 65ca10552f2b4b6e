//! Reporting an error without raising it.

use alloc::borrow::Cow;
use core::panic::Location;

use triomphe::Arc;

use crate::{
    config::Options,
    error_type::ErrorType,
    exception::Fault,
    handler,
    report::builder,
};

/// Builds a report describing an error of `error_type` with message
/// `reason`, and dispatches it to the registered handler.
///
/// The report's location is the caller of this function. The ignore and
/// propagate lists of `options` are not consulted: a manual report is always
/// dispatched. Other options, including custom context entries, apply as for
/// a wrapper.
///
/// ```rust
/// use scanerror::{Options, report_error};
///
/// let free_bytes = 0u64;
/// if free_bytes == 0 {
///     report_error(
///         "CustomError",
///         "disk full",
///         Options::new().capture_code_context(false).context("volume", "/var"),
///     );
/// }
/// ```
#[track_caller]
pub fn report_error(
    error_type: impl Into<ErrorType>,
    reason: impl Into<Cow<'static, str>>,
    options: Options,
) {
    let caller = Location::caller();
    let config = Arc::new(options.resolve_default());
    let fault = Fault::new(error_type, reason);
    let report = builder::build(&fault, Some(caller.into()), None, &config);
    handler::dispatch(&report);
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use std::sync::Mutex;

    use super::*;
    use crate::{
        ErrorLevel, ErrorReport,
        error_type::builtin,
        handler::{clear_error_handler, set_error_handler, tests::serial},
    };

    static REPORTS: Mutex<Vec<ErrorReport>> = Mutex::new(Vec::new());

    fn capture(f: impl FnOnce()) -> Vec<ErrorReport> {
        REPORTS.lock().unwrap().clear();
        set_error_handler(|report: &ErrorReport| REPORTS.lock().unwrap().push(report.clone()));
        f();
        clear_error_handler();
        core::mem::take(&mut *REPORTS.lock().unwrap())
    }

    #[test]
    fn test_report_custom_error() {
        let _serial = serial();
        let mut line = 0;
        let reports = capture(|| {
            line = line!() + 1;
            report_error("CustomError", "disk full", Options::new().capture_code_context(false));
        });

        let [report] = &reports[..] else {
            panic!("expected one report, got {}", reports.len());
        };
        assert_eq!(report.error.type_name, "CustomError");
        assert_eq!(report.error.message, "disk full");
        assert_eq!(report.error.level, ErrorLevel::Debug);
        assert!(report.code_context.is_none());
        assert!(report.location.file.ends_with("manual.rs"));
        assert_eq!(report.location.line, line);
    }

    #[test]
    fn test_ignore_list_is_not_consulted() {
        let _serial = serial();
        let reports = capture(|| {
            report_error(
                &builtin::VALUE_ERROR,
                "still reported",
                Options::new().ignore(&builtin::EXCEPTION).context("attempt", 3),
            );
        });
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].configuration.custom_context["attempt"],
            serde_json::json!(3)
        );
    }
}
