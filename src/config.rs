//! Per-call options and their resolution into an effective configuration.
//!
//! Call sites describe only what they want to change through [`Options`];
//! [`Options::resolve`] fills every other field from the process [`Defaults`]
//! and produces the immutable [`EffectiveConfiguration`] a wrapper or manual
//! report works with.
//!
//! # Environment Variables
//!
//! - `SCANERROR` - Comma-separated options adjusting the process defaults:
//!   - `locals` - Capture recorded locals by default
//!   - `no_code_context` - Do not read source code by default
//!   - `depth=N` - Default maximum stack depth
//!   - `level=LEVEL` - Default level, one of `ERROR`, `WARNING`, `INFO`,
//!     `DEBUG`

use alloc::string::String;
use core::{fmt, str::FromStr};
use std::sync::OnceLock;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error_type::ErrorType;

/// Severity attached to a report.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorLevel {
    /// A failure that needs attention.
    Error,
    /// A failure the program recovered from.
    Warning,
    /// Informational.
    Info,
    /// Diagnostic detail, the default.
    #[default]
    Debug,
}

impl ErrorLevel {
    /// The upper-case name used in reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorLevel::Error => "ERROR",
            ErrorLevel::Warning => "WARNING",
            ErrorLevel::Info => "INFO",
            ErrorLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ErrorLevel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error level {:?}", self.0)
    }
}

impl core::error::Error for UnknownLevel {}

impl FromStr for ErrorLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ErrorLevel::Error,
            ErrorLevel::Warning,
            ErrorLevel::Info,
            ErrorLevel::Debug,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownLevel(String::from(s)))
    }
}

/// Process-wide default values for every configuration field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
    /// Read source lines around the failing line.
    pub capture_code_context: bool,
    /// Level attached to reports.
    pub error_level: ErrorLevel,
    /// Include recorded locals in reports.
    pub capture_locals: bool,
    /// Maximum number of frames in a report's stack trace.
    pub max_stack_depth: usize,
}

impl Defaults {
    /// The built-in defaults, ignoring the environment.
    pub const BUILTIN: Self = Self {
        capture_code_context: true,
        error_level: ErrorLevel::Debug,
        capture_locals: false,
        max_stack_depth: 10,
    };

    /// The built-in defaults adjusted by the `SCANERROR` environment
    /// variable, read once per process.
    pub fn from_env() -> &'static Self {
        static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

        DEFAULTS.get_or_init(|| {
            std::env::var_os("SCANERROR")
                .map(|var| Self::BUILTIN.with_overrides(&var.to_string_lossy()))
                .unwrap_or(Self::BUILTIN)
        })
    }

    fn with_overrides(mut self, overrides: &str) -> Self {
        for option in overrides.split(',').map(str::trim) {
            if option.eq_ignore_ascii_case("locals") {
                self.capture_locals = true;
            } else if option.eq_ignore_ascii_case("no_code_context") {
                self.capture_code_context = false;
            } else if let Some((key, value)) = option.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                if key.eq_ignore_ascii_case("depth") {
                    if let Ok(depth) = value.parse() {
                        self.max_stack_depth = depth;
                    }
                } else if key.eq_ignore_ascii_case("level")
                    && let Ok(level) = value.parse()
                {
                    self.error_level = level;
                }
            }
        }
        self
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::BUILTIN
    }
}

/// Call-site options. Every field left unset falls back to [`Defaults`].
///
/// ```rust
/// use scanerror::{ErrorLevel, Options, error_type::builtin};
///
/// let config = Options::new()
///     .ignore(&builtin::VALUE_ERROR)
///     .error_level(ErrorLevel::Error)
///     .context("service", "billing")
///     .resolve_default();
///
/// assert_eq!(config.error_level, ErrorLevel::Error);
/// assert_eq!(config.max_stack_depth, 10);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Options {
    ignore_types: IndexSet<ErrorType>,
    propagate_types: IndexSet<ErrorType>,
    custom_context: IndexMap<String, serde_json::Value>,
    capture_code_context: Option<bool>,
    error_level: Option<ErrorLevel>,
    capture_locals: Option<bool>,
    max_stack_depth: Option<usize>,
}

impl Options {
    /// Options with nothing overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swallows errors of this type, or of a type below it, without a report.
    pub fn ignore(mut self, error_type: impl Into<ErrorType>) -> Self {
        self.ignore_types.insert(error_type.into());
        self
    }

    /// Returns errors of this type, or of a type below it, to the caller
    /// unchanged.
    pub fn propagate(mut self, error_type: impl Into<ErrorType>) -> Self {
        self.propagate_types.insert(error_type.into());
        self
    }

    /// Adds a custom context entry to every report.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.custom_context.insert(key.into(), value.into());
        self
    }

    /// Whether to read the source around the failing line and each stack
    /// frame.
    pub fn capture_code_context(mut self, capture: bool) -> Self {
        self.capture_code_context = Some(capture);
        self
    }

    /// The level attached to reports.
    pub fn error_level(mut self, level: ErrorLevel) -> Self {
        self.error_level = Some(level);
        self
    }

    /// Whether reports include the locals recorded on the error.
    pub fn capture_locals(mut self, capture: bool) -> Self {
        self.capture_locals = Some(capture);
        self
    }

    /// The maximum number of frames in a report's stack trace. `0` leaves the
    /// stack trace empty.
    ///
    /// At most [`MAX_RESOLVED_FRAMES`](crate::introspect::stack::MAX_RESOLVED_FRAMES)
    /// frames are resolved per report, so larger values act as that bound.
    pub fn max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = Some(depth);
        self
    }

    /// Merges these options over `defaults`.
    pub fn resolve(self, defaults: &Defaults) -> EffectiveConfiguration {
        EffectiveConfiguration {
            ignore_types: self.ignore_types,
            propagate_types: self.propagate_types,
            custom_context: self.custom_context,
            capture_code_context: self
                .capture_code_context
                .unwrap_or(defaults.capture_code_context),
            error_level: self.error_level.unwrap_or(defaults.error_level),
            capture_locals: self.capture_locals.unwrap_or(defaults.capture_locals),
            max_stack_depth: self.max_stack_depth.unwrap_or(defaults.max_stack_depth),
        }
    }

    /// Merges these options over the process defaults.
    pub fn resolve_default(self) -> EffectiveConfiguration {
        self.resolve(Defaults::from_env())
    }
}

/// The fully merged configuration for one wrapper or manual report.
///
/// Built once and never mutated; reports echo it for audit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectiveConfiguration {
    /// Types swallowed without a report.
    pub ignore_types: IndexSet<ErrorType>,
    /// Types returned to the caller unchanged. Wins over `ignore_types`.
    pub propagate_types: IndexSet<ErrorType>,
    /// Caller supplied context, echoed in every report.
    pub custom_context: IndexMap<String, serde_json::Value>,
    /// Read source lines around the failing line and each stack frame.
    pub capture_code_context: bool,
    /// Level attached to reports.
    pub error_level: ErrorLevel,
    /// Include recorded locals in reports.
    pub capture_locals: bool,
    /// Maximum number of frames in a report's stack trace.
    pub max_stack_depth: usize,
}

impl Default for EffectiveConfiguration {
    fn default() -> Self {
        Options::new().resolve_default()
    }
}
