//! Commonly used items for convenient importing.
//!
//! ```rust
//! use scanerror::prelude::*;
//!
//! fn lookup(key: &str) -> Result<u32, Fault> {
//!     Err(Fault::new(&builtin::KEY_ERROR, format!("{key:?}")).local("key", &key))
//! }
//!
//! let guard = Guard::with_options(Options::new().ignore(&builtin::LOOKUP_ERROR));
//! assert_eq!(guard.call(|| lookup("id")).unwrap(), Guarded::Swallowed("KeyError"));
//! ```

pub use crate::{
    ErrorLevel, ErrorReport, Exception, Fault, Guard, Guarded, Options,
    error_type::{ErrorType, builtin},
    handler::{ErrorHandler, set_error_handler},
    report_error,
    wrap::{wrap, wrap_async},
};
