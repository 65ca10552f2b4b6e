//! The structured report handed to the error handler.
//!
//! An [`ErrorReport`] is created once per reported error, owned by the
//! dispatching call and dropped when the handler returns. It serializes with
//! `serde` and renders as a tree with [`Display`](core::fmt::Display).

pub(crate) mod builder;
pub mod format;

use alloc::{string::String, vec::Vec};

use serde::Serialize;
use triomphe::Arc;

pub use self::format::ReportFormatter;
use crate::{
    config::{EffectiveConfiguration, ErrorLevel},
    introspect::{UNKNOWN, locals::Locals},
};

/// A structured description of one reported error.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorReport {
    /// What went wrong.
    pub error: ErrorBlock,
    /// Where it was raised.
    pub location: FrameRecord,
    /// The function the wrapper was applied to; `None` for manual reports.
    pub wrapped_function: Option<WrappedFunction>,
    /// Source lines around [`location`](Self::location), when captured.
    pub code_context: Option<CodeContextWindow>,
    /// The call stack, innermost first, at most `max_stack_depth` frames.
    pub stack_trace: Vec<FrameRecord>,
    /// Every frame of the captured stack, unfiltered, in the `backtrace`
    /// crate's format. `None` when the stack could not be resolved.
    pub raw_backtrace: Option<String>,
    /// Locals recorded at the raise site, when captured.
    pub locals: Option<Locals>,
    /// Display annotation of the code window.
    pub highlighted_code: Option<HighlightedCode>,
    /// The configuration the report was produced under.
    pub configuration: Arc<EffectiveConfiguration>,
}

/// The error section of an [`ErrorReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBlock {
    /// The name of the error's type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The error's `Display` output.
    pub message: String,
    /// Local wall-clock time of capture, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    /// The error and its causes, root cause first.
    pub exception_chain: Vec<ChainLink>,
    /// The configured severity.
    pub level: ErrorLevel,
}

/// One call-stack location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    /// The source file, as recorded by the compiler.
    pub file: String,
    /// The function name, without its module path. Closures carry the name
    /// of the function defining them.
    pub function: String,
    /// The module path of the function, or the file stem when unknown.
    pub module: String,
    /// 1-based line, 0 when unknown.
    pub line: u32,
    /// The trimmed source line, when code context is captured.
    pub source_line: Option<String>,
    /// Source lines around `line` for stack-trace frames, when code context
    /// is captured. The report's location carries its window in
    /// [`ErrorReport::code_context`] instead.
    pub source_context: Option<CodeContextWindow>,
}

impl FrameRecord {
    pub(crate) fn unknown() -> Self {
        Self {
            file: String::from(UNKNOWN),
            function: String::from(UNKNOWN),
            module: String::from(UNKNOWN),
            line: 0,
            source_line: None,
            source_context: None,
        }
    }
}

/// The function a wrapper was applied to.
///
/// Name and module come from the function's type name; file and line are
/// those of the wrapping call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WrappedFunction {
    /// The function name. A closure is named after the function defining it.
    pub name: String,
    /// The module path of the function.
    pub module: String,
    /// File of the call to [`Guard::wrap`](crate::Guard::wrap) or
    /// [`Guard::call`](crate::Guard::call).
    pub file: String,
    /// Line of that call.
    pub line: u32,
}

/// Source lines surrounding a failing line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CodeContextWindow {
    /// The lines, without line endings.
    pub lines: Vec<String>,
    /// Line number of `lines[0]`.
    pub first_line: u32,
    /// Line number of the failing line.
    pub error_line: u32,
    /// Index of the failing line in `lines`.
    pub error_line_index: usize,
}

/// One entry of an exception chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    /// The name of the link's error type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The link's `Display` output.
    pub message: String,
    /// How this link came out of the previous one; `None` for the root cause.
    pub relation: Option<Relation>,
}

/// How an exception relates to the one that led to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Explicitly raised from the previous exception.
    RaisedFrom,
    /// Raised while the previous exception was being handled.
    DuringHandling,
}

/// The code window annotated line by line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HighlightedCode {
    /// One entry per line of the window.
    pub lines: Vec<HighlightedLine>,
    /// Line number of the failing line.
    pub error_line: u32,
    /// Index of the failing line in `lines`.
    pub error_line_index: usize,
}

/// One annotated source line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HighlightedLine {
    /// 1-based line number.
    pub line_no: u32,
    /// The line without its trailing whitespace.
    pub code: String,
    /// Position relative to the failing line.
    #[serde(rename = "type")]
    pub kind: LineKind,
    /// Leading whitespace, in bytes.
    pub indent_level: usize,
}

/// Position of a line relative to the failing line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Above the failing line.
    Before,
    /// The failing line.
    Error,
    /// Below the failing line.
    After,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_send_sync() {
        static_assertions::assert_impl_all!(ErrorReport: Send, Sync, Clone);
    }

    #[test]
    fn test_block_serialization_names() {
        let block = ErrorBlock {
            type_name: String::from("KeyError"),
            message: String::from("'id'"),
            timestamp: String::from("2026-10-19 12:00:00"),
            exception_chain: alloc::vec![ChainLink {
                type_name: String::from("KeyError"),
                message: String::from("'id'"),
                relation: None,
            }],
            level: ErrorLevel::Warning,
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            serde_json::json!({
                "type": "KeyError",
                "message": "'id'",
                "timestamp": "2026-10-19 12:00:00",
                "exception_chain": [{"type": "KeyError", "message": "'id'", "relation": null}],
                "level": "WARNING",
            })
        );
        assert_eq!(
            serde_json::to_value(Relation::DuringHandling).unwrap(),
            serde_json::json!("during_handling")
        );
    }
}
