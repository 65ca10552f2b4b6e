use alloc::{format, string::String, vec::Vec};

use triomphe::Arc;

use crate::{
    config::EffectiveConfiguration,
    exception::Exception,
    introspect::{self, RaisePoint, chain, locals, source, stack},
    report::{ErrorBlock, ErrorReport, FrameRecord, WrappedFunction},
};

/// Timestamp format used in reports.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Assembles the report for `exception` under `config`.
///
/// The exception's own location is used when it has one; `fallback_location`
/// stands in otherwise. Introspection failures leave their section empty.
pub(crate) fn build(
    exception: &dyn Exception,
    fallback_location: Option<RaisePoint<'_>>,
    wrapped_function: Option<WrappedFunction>,
    config: &Arc<EffectiveConfiguration>,
) -> ErrorReport {
    let timestamp = timestamp();
    let error_type = exception.error_type();

    let message = introspect::guarded("message", || exception.to_string())
        .unwrap_or_else(|| String::from(locals::UNREPRESENTABLE));
    let exception_chain = introspect::guarded("exception chain", || chain::walk(exception))
        .unwrap_or_default();
    let backtrace = introspect::guarded("stack", || stack::capture(exception.trace()));
    let frames = backtrace
        .as_ref()
        .and_then(|backtrace| introspect::guarded("stack frames", || stack::user_frames(backtrace)))
        .unwrap_or_default();
    let raw_backtrace = backtrace
        .as_ref()
        .and_then(|backtrace| introspect::guarded("raw backtrace", || format!("{backtrace:?}")));

    let raised_at = exception
        .location()
        .map(RaisePoint::from)
        .or(fallback_location);
    let site = introspect::guarded("location", || introspect::locate(raised_at, &frames, config));
    let (location, code_context) = match site {
        Some(site) => (site.location, site.code_context),
        None => (FrameRecord::unknown(), None),
    };
    let stack_trace: Vec<FrameRecord> =
        introspect::guarded("stack trace", || introspect::stack_trace(&frames, config))
            .unwrap_or_default();
    let highlighted_code = code_context.as_ref().map(source::highlight);

    ErrorReport {
        error: ErrorBlock {
            type_name: String::from(error_type.name()),
            message,
            timestamp,
            exception_chain,
            level: config.error_level,
        },
        location,
        wrapped_function,
        code_context,
        stack_trace,
        raw_backtrace,
        locals: locals::snapshot(exception.locals(), config),
        highlighted_code,
        configuration: config.clone(),
    }
}
