//! Reading source code around a failing line.

use alloc::{string::String, vec::Vec};
use std::path::{Path, PathBuf};

use crate::report::{CodeContextWindow, HighlightedCode, HighlightedLine, LineKind};

/// Lines shown before and after the failing line.
pub const CODE_CONTEXT_RADIUS: u32 = 10;

/// Lines shown before and after the current line of each stack frame.
pub const FRAME_CONTEXT_RADIUS: u32 = 5;

/// The lines of one source file.
#[derive(Debug)]
pub(crate) struct SourceFile {
    lines: Vec<String>,
}

impl SourceFile {
    /// Loads `file`, trying it as given and then relative to
    /// `CARGO_MANIFEST_DIR`. Paths recorded by the compiler are relative to
    /// the workspace root for local crates.
    pub(crate) fn load(file: &str) -> Option<Self> {
        candidates(file).find_map(|path| {
            let text = std::fs::read_to_string(&path).ok()?;
            Some(Self {
                lines: text.lines().map(String::from).collect(),
            })
        })
    }

    /// The 1-based line `line_no`, without its line ending.
    pub(crate) fn line(&self, line_no: u32) -> Option<&str> {
        let index = usize::try_from(line_no).ok()?.checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }

    /// The lines within `radius` of `line_no`.
    pub(crate) fn window(&self, line_no: u32, radius: u32) -> Option<CodeContextWindow> {
        self.line(line_no)?;
        let first_line = line_no.saturating_sub(radius).max(1);
        let last_line = line_no
            .saturating_add(radius)
            .min(u32::try_from(self.lines.len()).unwrap_or(u32::MAX));
        let lines = (first_line..=last_line)
            .filter_map(|n| self.line(n))
            .map(|line| String::from(line.trim_end()))
            .collect();
        Some(CodeContextWindow {
            lines,
            first_line,
            error_line: line_no,
            error_line_index: (line_no - first_line) as usize,
        })
    }
}

fn candidates(file: &str) -> impl Iterator<Item = PathBuf> {
    let direct = PathBuf::from(file);
    let from_manifest = if direct.is_relative() {
        std::env::var_os("CARGO_MANIFEST_DIR").map(|dir| Path::new(&dir).join(file))
    } else {
        None
    };
    core::iter::once(direct).chain(from_manifest)
}

/// Annotates each line of a window with its position relative to the
/// failing line.
pub(crate) fn highlight(window: &CodeContextWindow) -> HighlightedCode {
    let lines = window
        .lines
        .iter()
        .enumerate()
        .map(|(index, code)| {
            let kind = match index.cmp(&window.error_line_index) {
                core::cmp::Ordering::Less => LineKind::Before,
                core::cmp::Ordering::Equal => LineKind::Error,
                core::cmp::Ordering::Greater => LineKind::After,
            };
            HighlightedLine {
                line_no: window.first_line + index as u32,
                code: code.clone(),
                kind,
                indent_level: code.len() - code.trim_start().len(),
            }
        })
        .collect();
    HighlightedCode {
        lines,
        error_line: window.error_line,
        error_line_index: window.error_line_index,
    }
}
