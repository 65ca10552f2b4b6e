/// Reports an error with a formatted reason, without raising it.
///
/// This is a shorthand for [`report_error`](crate::report_error()) that
/// evaluates its reason in the same way as the [`format!()`] macro. Options
/// may be given first, followed by a semicolon.
///
/// [`format!()`]: std::format
///
/// # Examples
///
/// ```
/// use scanerror::{Options, error_type::builtin, report_error};
///
/// let path = "/etc/app.toml";
/// report_error!(&builtin::OS_ERROR, "cannot read {path}");
/// report_error!(
///     Options::new().context("retry", true);
///     "QuotaError",
///     "quota of {} exceeded",
///     100
/// );
/// ```
#[macro_export]
macro_rules! report_error {
    ($options:expr; $error_type:expr, $($arg:tt)+) => {
        $crate::report_error(
            $error_type,
            $crate::__private::format!($($arg)+),
            $options,
        )
    };
    ($error_type:expr, $($arg:tt)+) => {
        $crate::report_error(
            $error_type,
            $crate::__private::format!($($arg)+),
            $crate::Options::new(),
        )
    };
}
