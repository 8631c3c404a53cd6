use std::fmt;

use crate::short_type_name;

/// Describes one argument as `Type: value`, using the short type name and the `Debug` output.
///
/// Usually called through [`describe_args!`][crate::describe_args].
///
/// # Example
///
/// ```rust
/// use lifetime_trace::describe_arg;
///
/// assert_eq!(describe_arg(&42_u16), "u16: 42");
/// ```
#[must_use]
pub fn describe_arg<T: fmt::Debug + ?Sized>(value: &T) -> String {
    format!("{}: {value:?}", short_type_name::<T>())
}

/// Describes a list of arguments as `Type: value, Type: value, ...`.
///
/// The result is meant for the detail of an [`Enter`][crate::TraceEvent::Enter] record. With no
/// arguments the result is empty, which [`Trace::entered()`][crate::Trace::entered] leaves out.
///
/// ```
/// use lifetime_trace::describe_args;
///
/// let value_a = 100;
/// let value_b = 1.5;
///
/// assert_eq!(describe_args!(value_a, value_b), "i32: 100, f64: 1.5");
/// assert_eq!(describe_args!(), "");
/// ```
#[macro_export]
macro_rules! describe_args {
    () => {
        ::std::string::String::new()
    };
    ($($arg:expr),+ $(,)?) => {
        [$($crate::describe_arg(&$arg)),+].join(", ")
    };
}
