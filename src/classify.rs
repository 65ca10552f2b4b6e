//! Deciding what happens to a raised error.

use crate::{config::EffectiveConfiguration, error_type::ErrorType};

/// What a wrapper does with a raised error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Swallow the error without a report.
    Ignore,
    /// Return the error to the caller unchanged.
    Propagate,
    /// Build and dispatch a report, then swallow the error.
    Report,
}

/// Classifies `error_type` against the ignore and propagate lists.
///
/// A list matches when it contains the type itself or any of its ancestors.
/// The propagate list is consulted over the whole ancestry first, so a type
/// matched by both lists propagates.
///
/// ```rust
/// use scanerror::{Options, classify::{Outcome, classify}, error_type::builtin};
///
/// let config = Options::new()
///     .ignore(&builtin::ARITHMETIC_ERROR)
///     .propagate(&builtin::EXCEPTION)
///     .resolve_default();
///
/// assert_eq!(classify(builtin::ZERO_DIVISION_ERROR, &config), Outcome::Propagate);
/// assert_eq!(classify(builtin::PANIC, &config), Outcome::Report);
/// ```
pub fn classify(error_type: ErrorType, config: &EffectiveConfiguration) -> Outcome {
    if matches_any(error_type, &config.propagate_types) {
        Outcome::Propagate
    } else if matches_any(error_type, &config.ignore_types) {
        Outcome::Ignore
    } else {
        Outcome::Report
    }
}

fn matches_any(error_type: ErrorType, list: &indexmap::IndexSet<ErrorType>) -> bool {
    !list.is_empty() && error_type.ancestors().any(|ancestor| list.contains(&ancestor))
}
