//! Remembering where a panic inside a wrapped call was raised.
//!
//! A caught panic carries only its payload. While a wrapped call runs on a
//! thread, a panic hook chained in front of the previously installed one
//! records the panic's location and stack there, for the wrapper to pick up
//! once the unwind is caught. The previous hook still runs for every panic.
//!
//! A hook installed with [`std::panic::set_hook`] after the first wrapped call
//! replaces this one; panics are then still caught and reported, but without
//! their raise site.

use alloc::{boxed::Box, string::String};
use core::{
    any::Any,
    cell::{Cell, RefCell},
    panic::AssertUnwindSafe,
};
use std::{panic::PanicHookInfo, sync::Once};

use crate::{exception::Trace, introspect::RaisePoint};

/// Where a panic was raised.
#[derive(Clone, Debug)]
pub(crate) struct PanicSite {
    pub(crate) file: String,
    pub(crate) line: u32,
    pub(crate) trace: Trace,
}

impl PanicSite {
    pub(crate) fn raise_point(&self) -> RaisePoint<'_> {
        RaisePoint {
            file: &self.file,
            line: self.line,
        }
    }
}

/// A panic caught by [`catch`].
pub(crate) struct Panicked {
    pub(crate) payload: Box<dyn Any + Send>,
    pub(crate) site: Option<PanicSite>,
}

std::thread_local! {
    /// Number of [`catch`] scopes running on this thread.
    static ACTIVE: Cell<usize> = const { Cell::new(0) };
    /// The site of the latest panic raised inside a scope.
    static LAST: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Runs `f`, catching a panic together with the site it was raised at.
pub(crate) fn catch<T>(f: impl FnOnce() -> T) -> Result<T, Panicked> {
    install_hook();
    store(None);

    let _ = ACTIVE.try_with(|active| active.set(active.get() + 1));
    let result = std::panic::catch_unwind(AssertUnwindSafe(f));
    let _ = ACTIVE.try_with(|active| active.set(active.get().saturating_sub(1)));

    result.map_err(|payload| Panicked {
        payload,
        site: take(),
    })
}

/// Resumes a caught panic, leaving its site for an enclosing [`catch`].
pub(crate) fn resume(panicked: Panicked) -> ! {
    store(panicked.site);
    std::panic::resume_unwind(panicked.payload)
}

fn install_hook() {
    static INSTALL: Once = Once::new();

    // `set_hook` panics on a panicking thread.
    if std::thread::panicking() {
        return;
    }
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if ACTIVE.try_with(Cell::get).unwrap_or(0) > 0
                && let Some(location) = info.location()
            {
                store(Some(PanicSite {
                    file: String::from(location.file()),
                    line: location.line(),
                    trace: Trace::capture(),
                }));
            }
            previous(info);
        }));
    });
}

fn store(site: Option<PanicSite>) {
    let _ = LAST.try_with(|last| {
        if let Ok(mut last) = last.try_borrow_mut() {
            *last = site;
        }
    });
}

fn take() -> Option<PanicSite> {
    LAST.try_with(|last| last.try_borrow_mut().ok().and_then(|mut last| last.take()))
        .ok()
        .flatten()
}
