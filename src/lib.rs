#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Capture, classify and report errors raised by wrapped calls.
//!
//! ## Overview
//!
//! This crate intercepts the errors of the calls you wrap, decides per error
//! whether to ignore it, hand it back to the caller, or report it, and turns
//! reported errors into a structured [`ErrorReport`] delivered to a single
//! process-wide handler.
//!
//! ## Quick Example
//!
//! ```
//! use scanerror::{
//!     ErrorReport, Fault, Guard, Guarded, Options, error_type::builtin, handler::set_error_handler,
//! };
//!
//! fn divide(a: i64, b: i64) -> Result<i64, Fault> {
//!     if b == 0 {
//!         return Err(Fault::new(&builtin::ZERO_DIVISION_ERROR, "division by zero").local("a", &a));
//!     }
//!     Ok(a / b)
//! }
//!
//! set_error_handler(|report: &ErrorReport| eprintln!("{report}"));
//!
//! let guard = Guard::with_options(Options::new().capture_locals(true));
//! assert_eq!(guard.call(|| divide(10, 2)).unwrap(), Guarded::Returned(5));
//! assert_eq!(guard.call(|| divide(1, 0)).unwrap(), Guarded::Swallowed("ZeroDivisionError"));
//! ```
//!
//! ## Core Concepts
//!
//! Every error the engine sees implements [`Exception`], which places it in a
//! hierarchy of [`ErrorType`](error_type::ErrorType)s. A call's
//! [`Options`] list the types to ignore and to propagate; a type matches a
//! list when it or any of its ancestors is on it, and propagation wins when
//! both lists match. Everything else is reported.
//!
//! A report carries:
//! - the error's type, message, level, timestamp and exception chain,
//! - where it was raised, with the surrounding source lines,
//! - the function the wrapper was applied to,
//! - the call stack, up to `max_stack_depth` frames, and the full raw
//!   backtrace,
//! - the locals recorded on the error, when `capture_locals` is set,
//! - the configuration it was produced under.
//!
//! Panics inside wrapped calls are classified as
//! [`builtin::PANIC`](error_type::builtin::PANIC) and located at the panicking
//! line through a panic hook the first wrapped call chains in front of the
//! current one; async calls dropped before
//! completion as [`builtin::CANCELLED`](error_type::builtin::CANCELLED).
//!
//! Outside of a wrapped call, [`report_error()`] produces the same report on
//! demand.
//!
//! ## Logging
//!
//! The engine logs through [`tracing`]: handler panics at `warn`, ignored
//! errors and skipped introspection at `debug`, and propagated errors at
//! `trace`.

extern crate alloc;

#[macro_use]
mod macros;

pub mod classify;
pub mod compat;
pub mod config;
pub mod error_type;
pub mod exception;
pub mod handler;
pub mod introspect;
mod manual;
mod panic_site;
pub mod prelude;
pub mod report;
pub mod wrap;

pub use self::{
    config::{EffectiveConfiguration, ErrorLevel, Options},
    exception::{Exception, Fault},
    handler::{clear_error_handler, set_error_handler},
    manual::report_error,
    report::{ErrorReport, ReportFormatter},
    wrap::{Guard, Guarded},
};

#[doc(hidden)]
pub mod __private {
    pub use alloc::format;
}
