//! The contract between raised errors and the engine.
//!
//! Anything a wrapped call returns as its error must implement [`Exception`]:
//! it names its [`ErrorType`], and may expose the links and the raise-site
//! data the engine turns into a report. [`Fault`] is a ready-made
//! implementation that records all of it.

use alloc::{borrow::Cow, boxed::Box, string::String};
use core::{any::Any, fmt, panic::Location};

use crate::{
    error_type::{ErrorType, builtin},
    introspect::{
        RaisePoint,
        locals::{Locals, render_value},
    },
    panic_site::{PanicSite, Panicked},
};

/// An error the engine can classify and report.
///
/// Only [`error_type`](Self::error_type) is required. The remaining methods
/// feed the report builder; their defaults yield "no data", which degrades
/// the report but never fails it.
///
/// ```rust
/// use std::fmt;
///
/// use scanerror::{Exception, error_type::{ErrorType, builtin}};
///
/// static PARSE_ERROR: ErrorType = ErrorType::new("ParseError", Some(&builtin::VALUE_ERROR));
///
/// #[derive(Debug)]
/// struct ParseError(String);
///
/// impl fmt::Display for ParseError {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "cannot parse {:?}", self.0)
///     }
/// }
///
/// impl Exception for ParseError {
///     fn error_type(&self) -> ErrorType {
///         PARSE_ERROR
///     }
/// }
/// ```
pub trait Exception: fmt::Display + fmt::Debug {
    /// The position of this error in the type hierarchy.
    fn error_type(&self) -> ErrorType;

    /// The error this one was explicitly raised from.
    fn cause(&self) -> Option<&dyn Exception> {
        None
    }

    /// The error that was being handled when this one was raised.
    ///
    /// Only followed when [`cause`](Self::cause) is `None`.
    fn context(&self) -> Option<&dyn Exception> {
        None
    }

    /// Where the error was raised.
    fn location(&self) -> Option<&'static Location<'static>> {
        None
    }

    /// Local bindings recorded at the raise site.
    fn locals(&self) -> Option<&Locals> {
        None
    }

    /// The stack captured at the raise site.
    fn trace(&self) -> Option<&Trace> {
        None
    }
}

impl<E: Exception + ?Sized> Exception for Box<E> {
    fn error_type(&self) -> ErrorType {
        (**self).error_type()
    }

    fn cause(&self) -> Option<&dyn Exception> {
        (**self).cause()
    }

    fn context(&self) -> Option<&dyn Exception> {
        (**self).context()
    }

    fn location(&self) -> Option<&'static Location<'static>> {
        (**self).location()
    }

    fn locals(&self) -> Option<&Locals> {
        (**self).locals()
    }

    fn trace(&self) -> Option<&Trace> {
        (**self).trace()
    }
}

/// An unresolved stack capture.
///
/// Capturing is cheap; symbols are only resolved when a report is built.
#[derive(Clone)]
pub struct Trace(backtrace::Backtrace);

impl Trace {
    /// Captures the current stack without resolving symbols.
    pub fn capture() -> Self {
        Self(backtrace::Backtrace::new_unresolved())
    }

    pub(crate) fn resolved(&self) -> backtrace::Backtrace {
        let mut backtrace = self.0.clone();
        backtrace.resolve();
        backtrace
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("frames", &self.0.frames().len())
            .finish()
    }
}

/// A general purpose [`Exception`].
///
/// A `Fault` records its type, message, optional cause and context links,
/// the locals you choose to record, the location of its construction and an
/// unresolved stack trace.
///
/// ```rust
/// use scanerror::{Fault, error_type::builtin};
///
/// fn divide(a: i64, b: i64) -> Result<i64, Fault> {
///     if b == 0 {
///         return Err(Fault::new(&builtin::ZERO_DIVISION_ERROR, "division by zero")
///             .local("a", &a)
///             .local("b", &b));
///     }
///     Ok(a / b)
/// }
/// ```
pub struct Fault {
    error_type: ErrorType,
    message: Cow<'static, str>,
    cause: Option<Box<dyn Exception + Send + Sync>>,
    context: Option<Box<dyn Exception + Send + Sync>>,
    location: &'static Location<'static>,
    locals: Locals,
    trace: Trace,
}

impl Fault {
    /// Creates a new fault raised at the caller's location.
    #[track_caller]
    pub fn new(error_type: impl Into<ErrorType>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            cause: None,
            context: None,
            location: Location::caller(),
            locals: Locals::default(),
            trace: Trace::capture(),
        }
    }

    /// Converts any [`core::error::Error`] and its `source()` chain.
    ///
    /// The outer error is typed after its Rust type name; [`std::io::Error`]s
    /// anywhere in the chain become [`builtin::OS_ERROR`], other sources
    /// become [`builtin::EXCEPTION`].
    #[track_caller]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: core::error::Error + 'static,
    {
        let error_type = if (error as &dyn Any).is::<std::io::Error>() {
            builtin::OS_ERROR
        } else {
            ErrorType::new(short_type_name::<E>(), Some(&builtin::EXCEPTION))
        };
        Self::from_dyn_error(error_type, error)
    }

    /// Converts a type-erased error, typing the outer error as `error_type`.
    #[track_caller]
    pub(crate) fn from_dyn_error(
        error_type: ErrorType,
        error: &(dyn core::error::Error + 'static),
    ) -> Self {
        let mut fault = Fault::new(error_type, alloc::format!("{error}"));
        if let Some(source) = error.source() {
            let error_type = if source.is::<std::io::Error>() {
                builtin::OS_ERROR
            } else {
                builtin::EXCEPTION
            };
            fault.cause = Some(Box::new(Self::from_dyn_error(error_type, source)));
        }
        fault
    }

    /// Sets the error this fault was explicitly raised from.
    pub fn caused_by(mut self, cause: impl Exception + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Sets the error that was being handled when this fault was raised.
    pub fn during(mut self, context: impl Exception + Send + Sync + 'static) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Records a local binding, rendered with its `Debug` implementation now.
    ///
    /// Sensitive names are masked and long values truncated, see
    /// [`Locals`].
    pub fn local(mut self, name: impl Into<String>, value: &dyn fmt::Debug) -> Self {
        let name = name.into();
        let rendered = render_value(&name, value);
        self.locals.insert(name, rendered);
        self
    }

    /// The message given at construction.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("error_type", &self.error_type.name())
            .field("message", &self.message)
            .field("location", &self.location)
            .field("cause", &self.cause)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl core::error::Error for Fault {}

impl Exception for Fault {
    fn error_type(&self) -> ErrorType {
        self.error_type
    }

    fn cause(&self) -> Option<&dyn Exception> {
        self.cause.as_deref().map(|e| e as &dyn Exception)
    }

    fn context(&self) -> Option<&dyn Exception> {
        self.context.as_deref().map(|e| e as &dyn Exception)
    }

    fn location(&self) -> Option<&'static Location<'static>> {
        Some(self.location)
    }

    fn locals(&self) -> Option<&Locals> {
        Some(&self.locals)
    }

    fn trace(&self) -> Option<&Trace> {
        Some(&self.trace)
    }
}

/// An unwinding panic intercepted by a wrapper.
pub(crate) struct PanicFault {
    message: String,
    panicked: Panicked,
}

impl PanicFault {
    pub(crate) fn new(panicked: Panicked) -> Self {
        let payload = &panicked.payload;
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            String::from(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            String::from("Box<dyn Any>")
        };
        Self { message, panicked }
    }

    /// Where the panic was raised, when the wrapper's panic hook saw it.
    pub(crate) fn raise_point(&self) -> Option<RaisePoint<'_>> {
        self.panicked.site.as_ref().map(PanicSite::raise_point)
    }

    pub(crate) fn into_panicked(self) -> Panicked {
        self.panicked
    }
}

impl fmt::Display for PanicFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for PanicFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicFault").field(&self.message).finish()
    }
}

impl Exception for PanicFault {
    fn error_type(&self) -> ErrorType {
        builtin::PANIC
    }

    fn trace(&self) -> Option<&Trace> {
        self.panicked.site.as_ref().map(|site| &site.trace)
    }
}

/// A wrapped future that was dropped before it settled.
#[derive(Debug)]
pub(crate) struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("future dropped before completion")
    }
}

impl Exception for Cancelled {
    fn error_type(&self) -> ErrorType {
        builtin::CANCELLED
    }
}

/// Strips the module path from a type name, keeping generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = core::any::type_name::<T>();
    let generics_start = full.find('<').unwrap_or(full.len());
    let start = full[..generics_start].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}
