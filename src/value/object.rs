use crate::{
    handle::{kind, Managed, ObjectHandle},
    types::{Class, Field, Method, Property},
};
use std::ffi::c_void;

/// A reference to a live managed object.
///
/// This does not root the object: the caller has to keep it reachable (on the
/// managed side, or pinned through a GC handle) for as long as it is used.
pub type ObjectRef<'rt> = Managed<'rt, kind::Object>;

// reference-type arguments are passed to the runtime as the object pointer itself
const _: () = assert!(std::mem::size_of::<ObjectHandle>() == std::mem::size_of::<usize>());

impl<'rt> ObjectRef<'rt> {
    /// The object's runtime class, which may be more derived than the
    /// declared type it was obtained through.
    pub fn class(self) -> Option<Class<'rt>> {
        let handle = self.runtime().object_get_class(self.live()?);
        self.sibling(handle)
    }

    pub fn find_field(self, name: &str) -> Option<Field<'rt>> {
        self.class()?.find_field(name)
    }

    pub fn find_property(self, name: &str) -> Option<Property<'rt>> {
        self.class()?.find_property(name)
    }

    /// First method named `name` on the object's class, of any arity.
    pub fn find_method(self, name: &str) -> Option<Method<'rt>> {
        self.class()?.find_method(name, None)
    }

    /// Argument slot for a reference-type parameter.
    pub fn as_arg(self) -> *mut c_void {
        self.raw().as_ptr()
    }

    /// Copies the payload out of a boxed value type.
    ///
    /// # Safety
    /// The object must be a boxed instance of a value type whose layout is
    /// exactly `T`.
    pub unsafe fn unbox<T: Copy>(self) -> Option<T> {
        let payload = self.runtime().object_unbox(self.live()?);
        if payload.is_null() {
            return None;
        }
        Some(payload.cast::<T>().read_unaligned())
    }

    /// Contents of a `System.String` object; `None` for any other class.
    pub fn to_string_lossy(self) -> Option<String> {
        let class = self.class()?;
        let is_string = class.namespace().as_deref() == Some("System")
            && class.name().as_deref() == Some("String");
        if !is_string {
            return None;
        }
        self.runtime().string_to_utf8(self.raw())
    }
}
