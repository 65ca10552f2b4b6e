//! The process-wide error handler.
//!
//! Every report, whether produced by a wrapper or by
//! [`report_error`](crate::report_error()), is handed to the single handler
//! registered here. Registering a handler replaces the previous one; with no
//! handler registered reports are dropped.
//!
//! ```rust
//! use scanerror::{ErrorReport, handler::set_error_handler};
//!
//! set_error_handler(|report: &ErrorReport| {
//!     eprintln!("{report}");
//! });
//! ```
//!
//! Handlers run on the thread that raised the error, outside of any engine
//! lock, so a handler may itself register a new handler. A panicking handler
//! is logged and otherwise ignored.

mod hook_lock;

use triomphe::Arc;
use unsize::CoerceUnsize;

use self::hook_lock::HookLock;
use crate::report::ErrorReport;

type Hook = Arc<dyn ErrorHandler>;

static HOOK: HookLock<Hook> = HookLock::new();

/// Receives every dispatched [`ErrorReport`].
///
/// Implemented for all `Fn(&ErrorReport)` closures that are `Send + Sync`.
///
/// ```rust
/// use std::sync::Mutex;
///
/// use scanerror::{ErrorReport, handler::ErrorHandler};
///
/// /// Keeps the type names of every report.
/// #[derive(Default)]
/// struct Collector(Mutex<Vec<String>>);
///
/// impl ErrorHandler for Collector {
///     fn handle(&self, report: &ErrorReport) {
///         if let Ok(mut names) = self.0.lock() {
///             names.push(report.error.type_name.clone());
///         }
///     }
/// }
///
/// scanerror::handler::set_error_handler(Collector::default());
/// ```
pub trait ErrorHandler: 'static + Send + Sync {
    /// Handles one report. The report is dropped when this returns.
    fn handle(&self, report: &ErrorReport);
}

impl<F> ErrorHandler for F
where
    F: Fn(&ErrorReport) + 'static + Send + Sync,
{
    fn handle(&self, report: &ErrorReport) {
        self(report)
    }
}

/// Registers `handler`, replacing the previous one for every wrapper and
/// manual report in the process.
pub fn set_error_handler(handler: impl ErrorHandler) {
    *HOOK.write().get() = Some(Arc::new(handler).unsize(unsize::Coercion!(to dyn ErrorHandler)));
}

/// Removes the registered handler and returns it. Reports dispatched while
/// no handler is registered are dropped.
pub fn clear_error_handler() -> Option<Arc<dyn ErrorHandler>> {
    HOOK.write().get().take()
}

/// Whether a handler is currently registered.
pub fn has_error_handler() -> bool {
    HOOK.read().get().is_some()
}

/// Hands `report` to the current handler.
pub(crate) fn dispatch(report: &ErrorReport) {
    // Released before the call so the handler may replace itself.
    let hook = HOOK.read().get().cloned();
    let Some(hook) = hook else {
        tracing::trace!(
            error_type = %report.error.type_name,
            "no error handler registered, dropping report"
        );
        return;
    };

    let result =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hook.handle(report)));
    if let Err(payload) = result {
        let message = payload
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| payload.downcast_ref::<alloc::string::String>().map(|s| s.as_str()))
            .unwrap_or("Box<dyn Any>");
        tracing::warn!(
            error_type = %report.error.type_name,
            panic = message,
            "error handler panicked, report discarded"
        );
    }
}
