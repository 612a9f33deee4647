//! Live managed objects and the helpers used to marshal values across
//! [`Method::invoke`](crate::types::Method::invoke).
use std::ffi::c_void;

pub mod object;

pub use object::ObjectRef;

/// Argument slot for a value-type parameter: the runtime reads the value
/// through this pointer, so `value` must outlive the call.
pub fn value_arg<T>(value: &mut T) -> *mut c_void {
    (value as *mut T).cast()
}
