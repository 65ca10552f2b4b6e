//! Extraction of diagnostic context from a raised exception.
//!
//! Everything here runs after the wrapped call has settled and is allowed to
//! fail only silently: unreadable sources, unresolvable frames and panicking
//! `Display`/`Debug` implementations degrade the report instead of changing
//! what happens to the error.
//!
//! - [`source`] reads code around a line.
//! - [`locals`] renders recorded local bindings.
//! - [`stack`] resolves call-stack frames.
//! - [`chain`] flattens cause and context links.

pub(crate) mod chain;
pub mod locals;
pub mod source;
pub mod stack;

use alloc::{string::ToString, vec::Vec};
use core::panic::Location;

use self::{source::SourceFile, stack::ResolvedFrame};
use crate::{
    config::EffectiveConfiguration,
    report::{CodeContextWindow, FrameRecord},
};

/// Runs `f`, turning a panic into `None`.
pub(crate) fn guarded<T>(what: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(step = what, "introspection step panicked, omitting its data");
            None
        }
    }
}

/// A file and line an error was raised at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RaisePoint<'a> {
    pub(crate) file: &'a str,
    pub(crate) line: u32,
}

impl<'a> From<&'a Location<'a>> for RaisePoint<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// The location block and code window for an error.
pub(crate) struct Site {
    pub(crate) location: FrameRecord,
    pub(crate) code_context: Option<CodeContextWindow>,
}

/// Describes where an error was raised.
///
/// The raise location, when known, names file and line; function and module
/// come from the resolved frame at that line, or are unknown when no frame
/// is. Without a location the innermost frame stands in for it.
pub(crate) fn locate(
    raised_at: Option<RaisePoint<'_>>,
    frames: &[ResolvedFrame],
    config: &EffectiveConfiguration,
) -> Site {
    let mut location = match raised_at {
        Some(raised_at) => {
            let frame = frames
                .iter()
                .find(|frame| frame.is_at(raised_at.file, raised_at.line));
            FrameRecord {
                file: raised_at.file.to_string(),
                function: frame.map_or_else(|| UNKNOWN.to_string(), |f| f.function().to_string()),
                module: frame.map_or_else(|| module_from_file(raised_at.file), |f| {
                    f.module().to_string()
                }),
                line: raised_at.line,
                source_line: None,
                source_context: None,
            }
        }
        None => frames
            .first()
            .map(|frame| frame.to_record(false))
            .unwrap_or_else(FrameRecord::unknown),
    };

    if !config.capture_code_context {
        return Site {
            location,
            code_context: None,
        };
    }

    let source = SourceFile::load(&location.file);
    location.source_line = source
        .as_ref()
        .and_then(|source| source.line(location.line))
        .map(|line| line.trim().to_string());
    let code_context = source
        .as_ref()
        .and_then(|source| source.window(location.line, source::CODE_CONTEXT_RADIUS));
    Site {
        location,
        code_context,
    }
}

pub(crate) const UNKNOWN: &str = "<unknown>";

fn module_from_file(file: &str) -> alloc::string::String {
    let file = file.replace('\\', "/");
    let stem = file
        .rsplit('/')
        .next()
        .and_then(|name| name.strip_suffix(".rs"))
        .unwrap_or(UNKNOWN);
    stem.to_string()
}

/// Stack-trace records for the report, innermost first.
pub(crate) fn stack_trace(frames: &[ResolvedFrame], config: &EffectiveConfiguration) -> Vec<FrameRecord> {
    frames
        .iter()
        .take(config.max_stack_depth)
        .map(|frame| frame.to_record(config.capture_code_context))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;

    fn frames() -> Vec<ResolvedFrame> {
        alloc::vec![
            ResolvedFrame {
                symbol: "app::inner".to_string(),
                file: "/nowhere/src/inner.rs".to_string(),
                line: Some(3),
            },
            ResolvedFrame {
                symbol: "app::outer::run".to_string(),
                file: "/nowhere/src/outer.rs".to_string(),
                line: Some(9),
            },
        ]
    }

    #[test]
    fn test_guarded() {
        assert_eq!(guarded("ok", || 5), Some(5));
        assert_eq!(guarded("boom", || -> u8 { panic!("boom") }), None);
    }

    #[test]
    fn test_locate_matches_frame() {
        let config = Options::new().capture_code_context(false).resolve_default();
        let raised_at = Location::caller();
        let mut frames = frames();
        frames[1].file = alloc::format!("/build/{}", raised_at.file());
        frames[1].line = Some(raised_at.line());

        let site = locate(Some(raised_at.into()), &frames, &config);
        assert_eq!(site.location.function, "run");
        assert_eq!(site.location.module, "app::outer");
        assert_eq!(site.location.line, raised_at.line());
        assert!(site.code_context.is_none());
        assert!(site.location.source_line.is_none());
    }

    #[test]
    fn test_locate_reads_source() {
        let config = Options::new().capture_code_context(true).resolve_default();
        let raised_at = Location::caller();
        let site = locate(Some(raised_at.into()), &[], &config);

        assert_eq!(site.location.function, UNKNOWN);
        assert_eq!(site.location.module, "mod");
        assert!(
            site.location
                .source_line
                .as_deref()
                .is_some_and(|line| line.contains("Location::caller()"))
        );
        let window = site.code_context.unwrap();
        assert_eq!(window.error_line, raised_at.line());
        assert!(window.lines[window.error_line_index].contains("Location::caller()"));
    }

    #[test]
    fn test_locate_without_matching_frame() {
        let config = Options::new().capture_code_context(false).resolve_default();
        let raised_at = RaisePoint {
            file: "src/billing/invoice.rs",
            line: 12,
        };
        let site = locate(Some(raised_at), &frames(), &config);
        assert_eq!(site.location.file, "src/billing/invoice.rs");
        assert_eq!(site.location.line, 12);
        assert_eq!(site.location.function, UNKNOWN);
        assert_eq!(site.location.module, "invoice");
    }

    #[test]
    fn test_locate_without_location() {
        let config = Options::new().capture_code_context(true).resolve_default();
        let site = locate(None, &frames(), &config);
        assert_eq!(site.location.function, "inner");
        assert_eq!(site.location.file, "/nowhere/src/inner.rs");
        // Unreadable source degrades to no context.
        assert!(site.code_context.is_none());

        let site = locate(None, &[], &config);
        assert_eq!(site.location, FrameRecord::unknown());
    }

    #[test]
    fn test_stack_trace_depth() {
        let frames = frames();
        let none = Options::new().max_stack_depth(0).resolve_default();
        assert!(stack_trace(&frames, &none).is_empty());

        let one = Options::new().max_stack_depth(1).resolve_default();
        let trace = stack_trace(&frames, &one);
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].function, "inner");
    }
}
