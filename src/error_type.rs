//! A closed hierarchy of error types used for classification.
//!
//! Rust errors do not form an inheritance tree, so every [`Exception`] names
//! its place in an explicit one: an [`ErrorType`] is a name plus an optional
//! parent. Ignore and propagate lists are matched against the full ancestry
//! of a raised type, nearest ancestor first.
//!
//! ```rust
//! use scanerror::error_type::{ErrorType, builtin};
//!
//! static STORAGE_ERROR: ErrorType = ErrorType::new("StorageError", Some(&builtin::OS_ERROR));
//! static DISK_FULL: ErrorType = ErrorType::new("DiskFullError", Some(&STORAGE_ERROR));
//!
//! assert!(DISK_FULL.is_a(&builtin::EXCEPTION));
//! assert!(!DISK_FULL.is_a(&builtin::VALUE_ERROR));
//! ```
//!
//! [`Exception`]: crate::Exception

use core::fmt;

use serde::{Serialize, Serializer};

/// A node in the error type hierarchy.
///
/// Two types are equal when their names and their whole ancestries are equal.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ErrorType {
    name: &'static str,
    parent: Option<&'static ErrorType>,
}

impl ErrorType {
    /// Creates a new error type below `parent`.
    ///
    /// Types without a parent are roots of their own hierarchy; most user types
    /// should descend from [`builtin::EXCEPTION`].
    pub const fn new(name: &'static str, parent: Option<&'static ErrorType>) -> Self {
        Self { name, parent }
    }

    /// The type name, as reported in [`ErrorReport`](crate::ErrorReport)s.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The direct parent, if any.
    pub const fn parent(&self) -> Option<&'static ErrorType> {
        self.parent
    }

    /// Iterates over this type and its ancestors, nearest first.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(*self),
        }
    }

    /// Whether this type is `other` or descends from it.
    pub fn is_a(&self, other: &ErrorType) -> bool {
        self.ancestors().any(|ancestor| ancestor == *other)
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ancestor in self.ancestors() {
            if !first {
                f.write_str(" < ")?;
            }
            first = false;
            f.write_str(ancestor.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for ErrorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// A bare name is treated as a direct child of [`builtin::EXCEPTION`].
impl From<&'static str> for ErrorType {
    fn from(name: &'static str) -> Self {
        ErrorType::new(name, Some(&builtin::EXCEPTION))
    }
}

impl From<&'static ErrorType> for ErrorType {
    fn from(error_type: &'static ErrorType) -> Self {
        *error_type
    }
}

/// Iterator returned by [`ErrorType::ancestors`].
#[derive(Clone, Debug)]
#[allow(missing_copy_implementations)]
pub struct Ancestors {
    next: Option<ErrorType>,
}

impl Iterator for Ancestors {
    type Item = ErrorType;

    fn next(&mut self) -> Option<ErrorType> {
        let current = self.next.take()?;
        self.next = current.parent.copied();
        Some(current)
    }
}

/// Builtin error types.
///
/// ```text
/// BaseException
/// ├── Exception
/// │   ├── ArithmeticError
/// │   │   └── ZeroDivisionError
/// │   ├── LookupError
/// │   │   ├── IndexError
/// │   │   └── KeyError
/// │   ├── OsError
/// │   ├── RuntimeError
/// │   ├── TypeError
/// │   └── ValueError
/// ├── Panic
/// └── Cancelled
/// ```
pub mod builtin {
    use super::ErrorType;

    /// Root of the builtin hierarchy.
    pub static BASE_EXCEPTION: ErrorType = ErrorType::new("BaseException", None);
    /// Ordinary recoverable errors.
    pub static EXCEPTION: ErrorType = ErrorType::new("Exception", Some(&BASE_EXCEPTION));
    /// An unwinding panic caught by a wrapper.
    pub static PANIC: ErrorType = ErrorType::new("Panic", Some(&BASE_EXCEPTION));
    /// A wrapped future dropped before it settled.
    pub static CANCELLED: ErrorType = ErrorType::new("Cancelled", Some(&BASE_EXCEPTION));

    /// Failed arithmetic.
    pub static ARITHMETIC_ERROR: ErrorType = ErrorType::new("ArithmeticError", Some(&EXCEPTION));
    /// Division or remainder by zero.
    pub static ZERO_DIVISION_ERROR: ErrorType =
        ErrorType::new("ZeroDivisionError", Some(&ARITHMETIC_ERROR));
    /// A missing key or index.
    pub static LOOKUP_ERROR: ErrorType = ErrorType::new("LookupError", Some(&EXCEPTION));
    /// An index out of range.
    pub static INDEX_ERROR: ErrorType = ErrorType::new("IndexError", Some(&LOOKUP_ERROR));
    /// A key absent from a map.
    pub static KEY_ERROR: ErrorType = ErrorType::new("KeyError", Some(&LOOKUP_ERROR));
    /// I/O and operating system failures.
    pub static OS_ERROR: ErrorType = ErrorType::new("OsError", Some(&EXCEPTION));
    /// An error fitting no other type.
    pub static RUNTIME_ERROR: ErrorType = ErrorType::new("RuntimeError", Some(&EXCEPTION));
    /// A value of the wrong kind.
    pub static TYPE_ERROR: ErrorType = ErrorType::new("TypeError", Some(&EXCEPTION));
    /// A value of the right kind but unacceptable content.
    pub static VALUE_ERROR: ErrorType = ErrorType::new("ValueError", Some(&EXCEPTION));
}
