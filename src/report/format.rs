//! Human readable rendering of an [`ErrorReport`].
//!
//! The layout is a tree: a header naming the error, followed by one node per
//! non-empty section of the report.
//!
//! ```text
//! ● KeyError: 'id'
//! ├ DEBUG at 2026-10-19 12:00:00
//! ├ orders::load (src/orders.rs:42)
//! ├ wrapped orders::load (src/main.rs:7)
//! ├ Code
//! │ ├   41 | let row = rows[index];
//! │ ╰ > 42 | let id = row["id"];
//! ╰ Stack trace
//!   ├ orders::load (src/orders.rs:42)
//!   ╰ app::main (src/main.rs:8)
//! ```

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::{self, Write};

use crate::report::{ErrorReport, FrameRecord, LineKind, Relation};

/// Prefix and suffix written around one line.
#[derive(Copy, Clone, Debug)]
pub struct LineFormatting {
    /// Written before the line's text.
    pub prefix: &'static str,
    /// Written after the line's text, usually a newline.
    pub suffix: &'static str,
}

impl LineFormatting {
    /// Creates a new line formatting.
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        Self { prefix, suffix }
    }
}

/// Formatting for a tree node that has siblings below it, or that is the
/// last of its siblings.
#[derive(Copy, Clone, Debug)]
pub struct NodeConfig {
    /// The node's own line.
    pub header: LineFormatting,
    /// Prefix of every line nested below the node.
    pub prefix_children: &'static str,
}

impl NodeConfig {
    /// Creates a node config from the `(prefix, suffix)` of its own line and
    /// the prefix of its children's lines.
    pub const fn new(header: (&'static str, &'static str), prefix_children: &'static str) -> Self {
        Self {
            header: LineFormatting::new(header.0, header.1),
            prefix_children,
        }
    }
}

/// Renders reports as text trees.
///
/// [`ErrorReport`]'s `Display` implementation uses [`ReportFormatter::DEFAULT`];
/// use [`ReportFormatter::render`] to pick another style.
///
/// ```rust
/// use scanerror::{ErrorReport, ReportFormatter};
///
/// fn log_plain(report: &ErrorReport) {
///     eprintln!("{}", ReportFormatter::ASCII.render(report));
/// }
/// ```
#[derive(Copy, Clone, Debug)]
pub struct ReportFormatter {
    /// The line naming the error.
    pub header: LineFormatting,
    /// A section or item with siblings below it.
    pub middle: NodeConfig,
    /// The last section or item.
    pub last: NodeConfig,
    /// Marker in front of the failing line of the code window.
    pub error_line_marker: &'static str,
    /// Marker in front of the other lines of the code window.
    pub context_line_marker: &'static str,
}

impl ReportFormatter {
    /// Unicode box-drawing characters, no colors.
    pub const UNICODE: Self = Self {
        header: LineFormatting::new("● ", "\n"),
        middle: NodeConfig::new(("├ ", "\n"), "│ "),
        last: NodeConfig::new(("╰ ", "\n"), "  "),
        error_line_marker: "> ",
        context_line_marker: "  ",
    };
    /// Plain ASCII, for log files and limited terminals.
    pub const ASCII: Self = Self {
        header: LineFormatting::new("o ", "\n"),
        middle: NodeConfig::new(("|- ", "\n"), "|  "),
        last: NodeConfig::new(("`- ", "\n"), "   "),
        error_line_marker: "> ",
        context_line_marker: "  ",
    };
    /// Alias for [`UNICODE`](Self::UNICODE).
    pub const DEFAULT: Self = Self::UNICODE;

    /// Wraps `report` in a value displaying it with this formatter.
    pub fn render<'a>(&'a self, report: &'a ErrorReport) -> impl fmt::Display + 'a {
        Rendered {
            formatter: self,
            report,
        }
    }

    /// Writes `report` to `f`.
    pub fn format(&self, report: &ErrorReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = TreeWriter {
            formatter: self,
            out: f,
            line_prefix: String::new(),
        };
        writer.line(
            &self.header,
            &format!("{}: {}", report.error.type_name, report.error.message),
        )?;
        writer.nodes(&sections(report, self))
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReportFormatter::DEFAULT.format(self, f)
    }
}

struct Rendered<'a> {
    formatter: &'a ReportFormatter,
    report: &'a ErrorReport,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formatter.format(self.report, f)
    }
}

/// A line of output with the nodes nested below it.
struct Node {
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    fn branch(text: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            text: text.into(),
            children,
        }
    }
}

fn sections(report: &ErrorReport, formatter: &ReportFormatter) -> Vec<Node> {
    let mut sections = Vec::new();
    sections.push(Node::leaf(format!(
        "{} at {}",
        report.error.level, report.error.timestamp
    )));
    sections.push(Node::leaf(describe_frame(&report.location)));
    if let Some(wrapped) = &report.wrapped_function {
        let function = if wrapped.module.is_empty() {
            wrapped.name.clone()
        } else {
            format!("{}::{}", wrapped.module, wrapped.name)
        };
        sections.push(Node::leaf(format!(
            "wrapped {function} ({}:{})",
            wrapped.file, wrapped.line
        )));
    }

    // A lone link repeats the header.
    if report.error.exception_chain.len() > 1 {
        let links = report
            .error
            .exception_chain
            .iter()
            .map(|link| {
                let relation = match link.relation {
                    None => "",
                    Some(Relation::RaisedFrom) => " (raised from the above)",
                    Some(Relation::DuringHandling) => " (while handling the above)",
                };
                Node::leaf(format!("{}: {}{relation}", link.type_name, link.message))
            })
            .collect();
        sections.push(Node::branch("Exception chain", links));
    }

    if let Some(code) = &report.highlighted_code {
        let width = code
            .lines
            .last()
            .map_or(1, |line| line.line_no.to_string().len());
        let lines = code
            .lines
            .iter()
            .map(|line| {
                let marker = if line.kind == LineKind::Error {
                    formatter.error_line_marker
                } else {
                    formatter.context_line_marker
                };
                Node::leaf(format!("{marker}{:>width$} | {}", line.line_no, line.code))
            })
            .collect();
        sections.push(Node::branch("Code", lines));
    }

    if let Some(locals) = report.locals.as_ref().filter(|locals| !locals.is_empty()) {
        let locals = locals
            .iter()
            .map(|(name, value)| Node::leaf(format!("{name} = {value}")))
            .collect();
        sections.push(Node::branch("Locals", locals));
    }

    if !report.stack_trace.is_empty() {
        let frames = report
            .stack_trace
            .iter()
            .map(|frame| Node::leaf(describe_frame(frame)))
            .collect();
        sections.push(Node::branch("Stack trace", frames));
    }

    if !report.configuration.custom_context.is_empty() {
        let context = report
            .configuration
            .custom_context
            .iter()
            .map(|(key, value)| Node::leaf(format!("{key} = {value}")))
            .collect();
        sections.push(Node::branch("Context", context));
    }
    sections
}

fn describe_frame(frame: &FrameRecord) -> String {
    let function = if frame.module.is_empty() {
        frame.function.clone()
    } else {
        format!("{}::{}", frame.module, frame.function)
    };
    format!("{function} ({}:{})", frame.file, frame.line)
}

struct TreeWriter<'a, 'b> {
    formatter: &'a ReportFormatter,
    out: &'a mut fmt::Formatter<'b>,
    line_prefix: String,
}

impl TreeWriter<'_, '_> {
    fn nodes(&mut self, nodes: &[Node]) -> fmt::Result {
        let mut nodes = nodes.iter().peekable();
        while let Some(node) = nodes.next() {
            let config = if nodes.peek().is_some() {
                self.formatter.middle
            } else {
                self.formatter.last
            };
            self.node(&config, node)?;
        }
        Ok(())
    }

    fn node(&mut self, config: &NodeConfig, node: &Node) -> fmt::Result {
        self.line(&config.header, &node.text)?;

        let len_before = self.line_prefix.len();
        self.line_prefix.push_str(config.prefix_children);
        let result = self.nodes(&node.children);
        self.line_prefix.truncate(len_before);
        result
    }

    fn line(&mut self, formatting: &LineFormatting, text: &str) -> fmt::Result {
        // Multi-line messages continue under the same prefix.
        let mut lines = text.trim_end().lines();
        let first = lines.next().unwrap_or("");
        self.out.write_str(&self.line_prefix)?;
        self.out.write_str(formatting.prefix)?;
        self.out.write_str(first)?;
        self.out.write_str(formatting.suffix)?;
        for line in lines {
            self.out.write_str(&self.line_prefix)?;
            for _ in formatting.prefix.chars() {
                self.out.write_char(' ')?;
            }
            self.out.write_str(line)?;
            self.out.write_str(formatting.suffix)?;
        }
        Ok(())
    }
}
