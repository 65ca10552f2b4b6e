//! Interoperability with other error handling libraries.
//!
//! - [`anyhow1`] - Conversions between [`Fault`](crate::Fault) and `anyhow`
//!   1.x errors (requires the `compat-anyhow1` feature flag)

#[cfg(feature = "compat-anyhow1")]
#[cfg_attr(docsrs, doc(cfg(feature = "compat-anyhow1")))]
pub mod anyhow1;
