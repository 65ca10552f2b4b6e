//! Integration with the [`anyhow`] 1.x error handling library.
//!
//! This module specifically supports `anyhow` version 1.x. To enable this
//! integration, add the `compat-anyhow1` feature flag to your `Cargo.toml`.
//!
//! Wrapped calls need errors implementing [`Exception`](crate::Exception),
//! which `anyhow::Error` does not. Convert at the boundary with
//! [`IntoScanerror`]: a [`Fault`] that was boxed into an `anyhow::Error` is
//! recovered as is; any other error becomes an [`ANYHOW_ERROR`] fault whose
//! causes follow the `anyhow` chain.
//!
//! ```
//! use scanerror::{Guard, Guarded, compat::anyhow1::IntoScanerror};
//!
//! fn load() -> anyhow::Result<String> {
//!     anyhow::bail!("config missing");
//! }
//!
//! let outcome = Guard::new().call(|| load().into_scanerror()).unwrap();
//! assert_eq!(outcome, Guarded::Swallowed("AnyhowError"));
//! ```
//!
//! The other direction goes through [`IntoAnyhow`], or through `?` since a
//! [`Fault`] is a `std::error::Error`.

use crate::{
    error_type::{ErrorType, builtin},
    exception::Fault,
};

/// The type of errors converted from `anyhow` without a known type.
pub static ANYHOW_ERROR: ErrorType = ErrorType::new("AnyhowError", Some(&builtin::EXCEPTION));

/// Converts `anyhow` errors, and results carrying them, into [`Fault`]s.
pub trait IntoScanerror {
    /// The converted type.
    type Output;

    /// Performs the conversion. The new fault is located at the caller.
    fn into_scanerror(self) -> Self::Output;
}

impl IntoScanerror for anyhow::Error {
    type Output = Fault;

    #[track_caller]
    fn into_scanerror(self) -> Self::Output {
        match self.downcast::<Fault>() {
            Ok(fault) => fault,
            Err(error) => Fault::from_dyn_error(ANYHOW_ERROR, &*error),
        }
    }
}

impl<T> IntoScanerror for anyhow::Result<T> {
    type Output = Result<T, Fault>;

    #[track_caller]
    fn into_scanerror(self) -> Self::Output {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(error.into_scanerror()),
        }
    }
}

/// Converts [`Fault`]s, and results carrying them, into `anyhow` errors.
pub trait IntoAnyhow {
    /// The converted type.
    type Output;

    /// Performs the conversion.
    fn into_anyhow(self) -> Self::Output;
}

impl IntoAnyhow for Fault {
    type Output = anyhow::Error;

    fn into_anyhow(self) -> Self::Output {
        anyhow::Error::new(self)
    }
}

impl<T> IntoAnyhow for Result<T, Fault> {
    type Output = anyhow::Result<T>;

    fn into_anyhow(self) -> Self::Output {
        self.map_err(IntoAnyhow::into_anyhow)
    }
}
