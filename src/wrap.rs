//! Wrapping calls so their errors are classified and reported.
//!
//! A [`Guard`] binds one [`EffectiveConfiguration`] and runs calls under it.
//! When a call returns `Err` or panics, the error is classified:
//!
//! - **propagate**: the original error is returned as `Err` (a panic resumes
//!   unwinding with its original payload);
//! - **ignore**: the call yields [`Guarded::Swallowed`] with the error's type
//!   name, and no report is produced;
//! - **report**: a report is built and dispatched to the
//!   [registered handler](crate::handler), then the call yields
//!   [`Guarded::Swallowed`].
//!
//! ```rust
//! use scanerror::{Fault, Guard, Guarded, Options, error_type::builtin};
//!
//! fn parse(input: &str) -> Result<u32, Fault> {
//!     input
//!         .parse()
//!         .map_err(|_| Fault::new(&builtin::VALUE_ERROR, "not a number"))
//! }
//!
//! let guard = Guard::with_options(Options::new().ignore(&builtin::VALUE_ERROR));
//! assert_eq!(guard.call(|| parse("12")).unwrap(), Guarded::Returned(12));
//! assert_eq!(guard.call(|| parse("twelve")).unwrap(), Guarded::Swallowed("ValueError"));
//! ```

use alloc::string::ToString;
use core::{future::Future, panic::Location, pin::pin, task::Poll};

use futures::{FutureExt, future::BoxFuture};
use triomphe::Arc;

use crate::{
    classify::{Outcome, classify},
    config::{EffectiveConfiguration, Options},
    exception::{Cancelled, Exception, PanicFault},
    handler,
    introspect::{RaisePoint, stack},
    panic_site::{self, Panicked},
    report::{WrappedFunction, builder},
};

/// The result of a wrapped call that did not propagate an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Guarded<T> {
    /// The call returned normally.
    Returned(T),
    /// The call failed with an error of the named type, which was ignored or
    /// reported.
    Swallowed(&'static str),
}

impl<T> Guarded<T> {
    /// The returned value, if the call returned normally.
    pub fn returned(self) -> Option<T> {
        match self {
            Guarded::Returned(value) => Some(value),
            Guarded::Swallowed(_) => None,
        }
    }

    /// The type name of the swallowed error, if there was one.
    pub fn swallowed(&self) -> Option<&'static str> {
        match self {
            Guarded::Returned(_) => None,
            Guarded::Swallowed(name) => Some(*name),
        }
    }

    /// Whether the call failed and its error was swallowed.
    pub fn is_swallowed(&self) -> bool {
        matches!(self, Guarded::Swallowed(_))
    }
}

/// The callable behind a wrapped call and where it was wrapped.
#[derive(Copy, Clone, Debug)]
struct Callee {
    type_name: &'static str,
    site: &'static Location<'static>,
}

impl Callee {
    #[track_caller]
    fn of<F>() -> Self {
        Self {
            type_name: core::any::type_name::<F>(),
            site: Location::caller(),
        }
    }

    fn describe(&self) -> WrappedFunction {
        let (name, module) = stack::function_and_module(self.type_name);
        WrappedFunction {
            name: name.to_string(),
            module: module.to_string(),
            file: self.site.file().to_string(),
            line: self.site.line(),
        }
    }
}

/// Runs calls under a fixed configuration.
///
/// The configuration is resolved once at construction and shared by every
/// call and every report produced through this guard.
#[derive(Clone, Debug)]
pub struct Guard {
    config: Arc<EffectiveConfiguration>,
}

impl Guard {
    /// A guard using the process defaults.
    pub fn new() -> Self {
        Self::with_options(Options::new())
    }

    /// A guard using `options` over the process defaults.
    pub fn with_options(options: Options) -> Self {
        Self {
            config: Arc::new(options.resolve_default()),
        }
    }

    /// The configuration this guard runs under.
    pub fn config(&self) -> &Arc<EffectiveConfiguration> {
        &self.config
    }

    /// Runs `f` and settles its error, if any.
    ///
    /// Panics raised by `f` are classified as
    /// [`builtin::PANIC`](crate::error_type::builtin::PANIC) and reported at
    /// the line that panicked.
    #[track_caller]
    pub fn call<T, E, F>(&self, f: F) -> Result<Guarded<T>, E>
    where
        E: Exception,
        F: FnOnce() -> Result<T, E>,
    {
        self.run(Callee::of::<F>(), f)
    }

    /// Awaits `future` and settles its error, if any.
    ///
    /// Panics are handled as in [`call`](Self::call). If the returned future
    /// is dropped after it started but before `future` completed, a
    /// [`builtin::CANCELLED`](crate::error_type::builtin::CANCELLED) error is
    /// classified and, unless ignored or propagated, reported from the drop.
    #[track_caller]
    pub fn call_async<T, E, Fut>(
        &self,
        future: Fut,
    ) -> impl Future<Output = Result<Guarded<T>, E>> + use<'_, T, E, Fut>
    where
        E: Exception,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_async(Callee::of::<Fut>(), future)
    }

    /// Wraps `f` so every invocation runs through [`call`](Self::call).
    ///
    /// Functions of several arguments take them as a tuple; methods are
    /// wrapped through a closure capturing or taking their receiver.
    #[track_caller]
    pub fn wrap<A, T, E, F>(&self, f: F) -> impl Fn(A) -> Result<Guarded<T>, E> + use<A, T, E, F>
    where
        E: Exception,
        F: Fn(A) -> Result<T, E>,
    {
        let guard = self.clone();
        let callee = Callee::of::<F>();
        move |arg| guard.run(callee, || f(arg))
    }

    /// Wraps an async function so every invocation runs through
    /// [`call_async`](Self::call_async).
    #[track_caller]
    pub fn wrap_async<A, T, E, F, Fut>(
        &self,
        f: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Result<Guarded<T>, E>> + use<A, T, E, F, Fut>
    where
        T: Send + 'static,
        E: Exception + Send + 'static,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let guard = self.clone();
        let callee = Callee::of::<F>();
        move |arg| {
            let guard = guard.clone();
            let future = f(arg);
            async move { guard.run_async(callee, future).await }.boxed()
        }
    }

    fn run<T, E: Exception>(
        &self,
        callee: Callee,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<Guarded<T>, E> {
        let result = panic_site::catch(f);
        self.settle_result(result, callee)
    }

    async fn run_async<T, E, Fut>(&self, callee: Callee, future: Fut) -> Result<Guarded<T>, E>
    where
        E: Exception,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut cancellation = CancellationGuard {
            guard: self,
            callee,
            armed: true,
        };
        let mut future = pin!(future);
        // Each poll runs in its own scope: the task may move between threads.
        let result = futures::future::poll_fn(|cx| {
            match panic_site::catch(|| future.as_mut().poll(cx)) {
                Ok(Poll::Pending) => Poll::Pending,
                Ok(Poll::Ready(output)) => Poll::Ready(Ok(output)),
                Err(panicked) => Poll::Ready(Err(panicked)),
            }
        })
        .await;
        cancellation.armed = false;
        self.settle_result(result, callee)
    }

    fn settle_result<T, E: Exception>(
        &self,
        result: Result<Result<T, E>, Panicked>,
        callee: Callee,
    ) -> Result<Guarded<T>, E> {
        match result {
            Ok(Ok(value)) => Ok(Guarded::Returned(value)),
            Ok(Err(error)) => match self.settle(&error, None, callee) {
                Some(name) => Ok(Guarded::Swallowed(name)),
                None => Err(error),
            },
            Err(panicked) => {
                let panic = PanicFault::new(panicked);
                match self.settle(&panic, panic.raise_point(), callee) {
                    Some(name) => Ok(Guarded::Swallowed(name)),
                    None => panic_site::resume(panic.into_panicked()),
                }
            }
        }
    }

    /// Classifies `error` and reports it when asked to. Returns the name to
    /// swallow it under, or `None` to propagate it.
    fn settle(
        &self,
        error: &dyn Exception,
        raised_at: Option<RaisePoint<'_>>,
        callee: Callee,
    ) -> Option<&'static str> {
        let error_type = error.error_type();
        match classify(error_type, &self.config) {
            Outcome::Propagate => {
                tracing::trace!(error_type = error_type.name(), "propagating error");
                None
            }
            Outcome::Ignore => {
                tracing::debug!(error_type = error_type.name(), "ignoring error");
                Some(error_type.name())
            }
            Outcome::Report => {
                let report = builder::build(error, raised_at, Some(callee.describe()), &self.config);
                handler::dispatch(&report);
                Some(error_type.name())
            }
        }
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

/// Settles a [`Cancelled`] error when dropped while armed.
struct CancellationGuard<'a> {
    guard: &'a Guard,
    callee: Callee,
    armed: bool,
}

impl Drop for CancellationGuard<'_> {
    fn drop(&mut self) {
        if self.armed && !std::thread::panicking() {
            self.guard.settle(&Cancelled, None, self.callee);
        }
    }
}

/// Wraps `f` under the process defaults. See [`Guard::wrap`].
#[track_caller]
pub fn wrap<A, T, E, F>(f: F) -> impl Fn(A) -> Result<Guarded<T>, E>
where
    E: Exception,
    F: Fn(A) -> Result<T, E>,
{
    Guard::new().wrap(f)
}

/// Wraps an async function under the process defaults. See
/// [`Guard::wrap_async`].
#[track_caller]
pub fn wrap_async<A, T, E, F, Fut>(f: F) -> impl Fn(A) -> BoxFuture<'static, Result<Guarded<T>, E>>
where
    T: Send + 'static,
    E: Exception + Send + 'static,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Guard::new().wrap_async(f)
}
