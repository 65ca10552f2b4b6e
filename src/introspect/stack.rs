//! Walking and resolving the call stack.
//!
//! Frames come from the [`backtrace`] crate, either from a [`Trace`] captured
//! at the raise site or from the live stack. Frames without a symbol or a
//! file are dropped, as are frames from the engine itself, from
//! `backtrace`, and from the runtime crates surrounding user code.

use alloc::{
    borrow::Cow,
    format,
    string::{String, ToString},
    vec::Vec,
};
use std::sync::OnceLock;

use crate::{
    exception::Trace,
    introspect::source::{FRAME_CONTEXT_RADIUS, SourceFile},
    report::FrameRecord,
};

/// Upper bound on user frames kept for a single report, whatever the
/// configured `max_stack_depth`.
pub const MAX_RESOLVED_FRAMES: usize = 128;

/// Crates whose frames never appear in a report's stack trace.
const SKIPPED_CRATES: &[&str] = &[
    "alloc",
    "backtrace",
    "core",
    "futures_core",
    "futures_util",
    "scanerror",
    "std",
    "test",
    "tokio",
];

/// C runtime entry points that close most native stacks.
const RUNTIME_ENTRY_SYMBOLS: &[&str] = &[
    "__libc_start_call_main",
    "__libc_start_main_impl",
    "__libc_start_main",
    "_start",
    "main",
];

/// A resolved frame from user code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedFrame {
    /// The demangled symbol without its hash.
    pub(crate) symbol: String,
    pub(crate) file: String,
    pub(crate) line: Option<u32>,
}

impl ResolvedFrame {
    pub(crate) fn function(&self) -> &str {
        function_and_module(&self.symbol).0
    }

    pub(crate) fn module(&self) -> &str {
        function_and_module(&self.symbol).1
    }

    /// Whether this frame is at `line` of a file whose path ends with `file`.
    pub(crate) fn is_at(&self, file: &str, line: u32) -> bool {
        self.line == Some(line) && paths_match(&self.file, file)
    }

    pub(crate) fn to_record(&self, capture_code_context: bool) -> FrameRecord {
        let line = self.line.unwrap_or(0);
        let source = capture_code_context
            .then(|| SourceFile::load(&self.file))
            .flatten();
        FrameRecord {
            file: self.file.clone(),
            function: self.function().to_string(),
            module: self.module().to_string(),
            line,
            source_line: source
                .as_ref()
                .and_then(|source| source.line(line).map(|code| code.trim().to_string())),
            source_context: source
                .as_ref()
                .and_then(|source| source.window(line, FRAME_CONTEXT_RADIUS)),
        }
    }
}

/// Splits a demangled symbol into its function name and module path.
/// Closures are attributed to the function defining them.
pub(crate) fn function_and_module(symbol: &str) -> (&str, &str) {
    let symbol = strip_closures(symbol);
    (get_function_name(symbol), module_path(symbol))
}

/// Resolves `trace`, or captures and resolves the live stack when there is
/// none.
pub(crate) fn capture(trace: Option<&Trace>) -> backtrace::Backtrace {
    match trace {
        Some(trace) => trace.resolved(),
        None => backtrace::Backtrace::new(),
    }
}

/// The frames of `backtrace` that belong to user code, innermost first.
pub(crate) fn user_frames(backtrace: &backtrace::Backtrace) -> Vec<ResolvedFrame> {
    let mut frames = Vec::new();
    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            // Don't consider frames without symbol names or filenames.
            let (Some(name), Some(path)) = (symbol.name(), symbol.filename()) else {
                continue;
            };
            if frames.len() >= MAX_RESOLVED_FRAMES {
                return trim_runtime_tail(frames);
            }

            let symbol_demangled = format!("{name:#}");
            let file = path.to_string_lossy().into_owned();
            if let Some(crate_name) = crate_name(&symbol_demangled, &file)
                && SKIPPED_CRATES.contains(&&*crate_name)
            {
                continue;
            }

            frames.push(ResolvedFrame {
                symbol: symbol_demangled,
                file,
                line: symbol.lineno(),
            });
        }
    }
    trim_runtime_tail(frames)
}

fn trim_runtime_tail(mut frames: Vec<ResolvedFrame>) -> Vec<ResolvedFrame> {
    while frames
        .last()
        .is_some_and(|frame| RUNTIME_ENTRY_SYMBOLS.contains(&frame.symbol.as_str()))
    {
        frames.pop();
    }
    frames
}

/// The crate a frame belongs to, from its path when it points into the
/// standard library or the cargo registry, and from its symbol otherwise.
fn crate_name<'a>(symbol: &'a str, file: &str) -> Option<Cow<'a, str>> {
    static REGEXES: OnceLock<[regex::Regex; 3]> = OnceLock::new();
    let [std_regex, registry_regex, symbol_regex] = REGEXES.get_or_init(|| {
        [
            // Matches Rust standard library paths:
            // - /lib/rustlib/src/rust/library/{std|core|alloc}/src/...
            // - /rustc/{40-char-hash}/library/{std|core|alloc}/src/...
            regex::Regex::new(
                r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
            )
            .expect("built-in regex pattern for std library paths should be valid"),
            // Matches Cargo registry paths:
            // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
            regex::Regex::new(
                r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
            )
            .expect("built-in regex pattern for cargo registry paths should be valid"),
            // Matches the leading path segment of a demangled symbol, looking
            // through `<T as Trait>` qualification.
            regex::Regex::new(r"^<*&?(?:mut )?([A-Za-z_][A-Za-z0-9_]*)::")
                .expect("built-in regex pattern for symbol paths should be valid"),
        ]
    });

    let file = file.replace('\\', "/");
    for regex in [std_regex, registry_regex] {
        if let Some(captures) = regex.captures(&file) {
            let name = captures.get(1)?.as_str().replace('-', "_");
            return Some(Cow::Owned(name));
        }
    }
    let captures = symbol_regex.captures(symbol)?;
    Some(Cow::Borrowed(captures.get(1)?.as_str()))
}

fn strip_closures(mut symbol: &str) -> &str {
    while let Some(stripped) = symbol.strip_suffix("::{{closure}}") {
        symbol = stripped;
    }
    symbol
}

fn module_path(symbol: &str) -> &str {
    if let Some(qualified) = symbol.strip_prefix('<') {
        // `<path::Type as Trait>::method` belongs to the module of `Type`.
        let end = qualified.find(" as ").or_else(|| qualified.find('>'));
        let self_type = end.map_or(qualified, |end| &qualified[..end]);
        return module_path(self_type);
    }
    let generics_start = symbol.find('<').unwrap_or(symbol.len());
    symbol[..generics_start]
        .rfind("::")
        .map_or("", |end| &symbol[..end])
}

fn paths_match(frame_file: &str, location_file: &str) -> bool {
    let frame_file = frame_file.replace('\\', "/");
    let location_file = location_file.replace('\\', "/");
    frame_file == location_file
        || frame_file.ends_with(&format!("/{}", location_file.trim_start_matches("./")))
}

fn get_function_name(s: &str) -> &str {
    let mut word_start = 0usize;
    let mut word_end = 0usize;
    let mut angle_nesting_level = 0u64;
    let mut curly_nesting_level = 0u64;
    let mut potential_function_arrow = false;
    let mut inside_word = false;

    for (i, c) in s.char_indices() {
        if curly_nesting_level == 0 && angle_nesting_level == 0 {
            if !inside_word && unicode_ident::is_xid_start(c) {
                word_start = i;
                inside_word = true;
            } else if inside_word && !unicode_ident::is_xid_continue(c) {
                word_end = i;
                inside_word = false;
            }
        }

        let was_potential_function_arrow = potential_function_arrow;
        potential_function_arrow = c == '-';

        if c == '<' {
            angle_nesting_level = angle_nesting_level.saturating_add(1);
        } else if c == '>' && !was_potential_function_arrow {
            angle_nesting_level = angle_nesting_level.saturating_sub(1);
        } else if c == '{' {
            curly_nesting_level = curly_nesting_level.saturating_add(1);
            if !inside_word && curly_nesting_level == 1 && angle_nesting_level == 0 {
                word_start = i;
                inside_word = true;
            }
        } else if c == '}' {
            curly_nesting_level = curly_nesting_level.saturating_sub(1);
            if inside_word && curly_nesting_level == 0 {
                word_end = i + 1;
                inside_word = false;
            }
        }
    }

    if word_start < word_end {
        &s[word_start..word_end]
    } else {
        &s[word_start..]
    }
}
