//! Rendering of recorded local bindings.
//!
//! Values are rendered to strings the moment they are recorded, so a report
//! never holds a live reference into the frame that raised it.

use alloc::{
    format,
    string::{String, ToString},
};
use core::fmt;

use indexmap::IndexMap;

use crate::config::EffectiveConfiguration;

/// Local bindings by name, in recording order, rendered to strings.
pub type Locals = IndexMap<String, String>;

/// Shown instead of values whose names look sensitive.
pub const FILTERED: &str = "<filtered>";

/// Shown instead of values whose `Debug` implementation panicked.
pub const UNREPRESENTABLE: &str = "<unable to represent>";

/// Longest rendered value kept before truncation.
pub const MAX_VALUE_CHARS: usize = 150;

const SENSITIVE_NAMES: &[&str] = &[
    "password",
    "token",
    "secret",
    "key",
    "api_key",
    "auth_token",
    "credentials",
];

fn is_sensitive(name: &str) -> bool {
    name.starts_with('_')
        || SENSITIVE_NAMES
            .iter()
            .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// Renders one binding the way it is stored in [`Locals`].
pub(crate) fn render_value(name: &str, value: &dyn fmt::Debug) -> String {
    if is_sensitive(name) {
        return FILTERED.to_string();
    }

    let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| format!("{value:?}")));
    match rendered {
        Ok(rendered) => truncate(rendered, MAX_VALUE_CHARS),
        Err(_) => UNREPRESENTABLE.to_string(),
    }
}

pub(crate) fn truncate(mut value: String, max_chars: usize) -> String {
    if let Some((cut, _)) = value.char_indices().nth(max_chars) {
        value.truncate(cut);
        value.push_str("...");
    }
    value
}

/// The locals section of a report: present only when capture is enabled and
/// something was recorded.
pub(crate) fn snapshot(locals: Option<&Locals>, config: &EffectiveConfiguration) -> Option<Locals> {
    if !config.capture_locals {
        return None;
    }
    locals.filter(|locals| !locals.is_empty()).cloned()
}
