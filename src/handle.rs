//! Typed views over the opaque pointers handed out by the managed runtime.
//!
//! [`RawHandle`] is the bare pointer tagged with a zero-sized kind, so a class
//! handle can never be passed where a method handle is expected. [`Managed`]
//! pairs a raw handle with the [`RuntimeApi`] that produced it; every
//! reflection wrapper in this crate ([`Class`](crate::types::Class),
//! [`Field`](crate::types::Field), ...) is an alias of it with its own
//! inherent methods.
use crate::runtime::RuntimeApi;
use std::{
    ffi::c_void,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

pub trait HandleKind: 'static {
    /// Name of the runtime structure this handle points at.
    const NAME: &'static str;
}

macro_rules! handle_kinds {
    ($($(#[$meta:meta])* $kind:ident => $name:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $kind {}

            impl super::HandleKind for $kind {
                const NAME: &'static str = $name;
            }
        )*
    };
}

pub mod kind {
    handle_kinds! {
        Type => "MonoType",
        Class => "MonoClass",
        Field => "MonoClassField",
        Property => "MonoProperty",
        Method => "MonoMethod",
        /// Only ever used internally to walk a method's parameters.
        Signature => "MonoMethodSignature",
        Object => "MonoObject",
        Domain => "MonoDomain",
        Assembly => "MonoAssembly",
        Image => "MonoImage",
    }
}

#[repr(transparent)]
pub struct RawHandle<K: HandleKind> {
    ptr: *mut c_void,
    _kind: PhantomData<K>,
}

pub type TypeHandle = RawHandle<kind::Type>;
pub type ClassHandle = RawHandle<kind::Class>;
pub type FieldHandle = RawHandle<kind::Field>;
pub type PropertyHandle = RawHandle<kind::Property>;
pub type MethodHandle = RawHandle<kind::Method>;
pub type SignatureHandle = RawHandle<kind::Signature>;
pub type ObjectHandle = RawHandle<kind::Object>;
pub type DomainHandle = RawHandle<kind::Domain>;
pub type AssemblyHandle = RawHandle<kind::Assembly>;
pub type ImageHandle = RawHandle<kind::Image>;

impl<K: HandleKind> RawHandle<K> {
    pub const fn null() -> Self {
        Self::from_ptr(std::ptr::null_mut())
    }

    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self {
            ptr,
            _kind: PhantomData,
        }
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.ptr
    }

    pub fn is_null(self) -> bool {
        self.ptr.is_null()
    }
}

impl<K: HandleKind> Clone for RawHandle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HandleKind> Copy for RawHandle<K> {}

impl<K: HandleKind> Default for RawHandle<K> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K: HandleKind> PartialEq for RawHandle<K> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ptr, other.ptr)
    }
}

impl<K: HandleKind> Eq for RawHandle<K> {}

impl<K: HandleKind> Hash for RawHandle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.ptr, state);
    }
}

impl<K: HandleKind> Debug for RawHandle<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#?})", K::NAME, self.ptr)
    }
}

impl<K: HandleKind> From<*mut c_void> for RawHandle<K> {
    fn from(ptr: *mut c_void) -> Self {
        Self::from_ptr(ptr)
    }
}

impl<K: HandleKind> From<RawHandle<K>> for *mut c_void {
    fn from(handle: RawHandle<K>) -> Self {
        handle.ptr
    }
}

/// Opaque iteration state for the runtime's `get_next(thing, &iter)` style
/// enumerators. Starts null; the runtime advances it on each call.
#[derive(Debug)]
pub struct Cursor(*mut c_void);

impl Cursor {
    pub fn start() -> Self {
        Cursor(std::ptr::null_mut())
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    pub fn set(&mut self, state: *mut c_void) {
        self.0 = state;
    }

    /// Pointer suitable for passing as the `gpointer *iter` argument.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_void {
        &mut self.0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

/// A raw handle bound to the runtime that issued it.
///
/// Equality and hashing only look at the handle; two wrappers of the same
/// handle compare equal regardless of which binding they came through.
pub struct Managed<'rt, K: HandleKind> {
    runtime: &'rt dyn RuntimeApi,
    handle: RawHandle<K>,
}

impl<'rt, K: HandleKind> Managed<'rt, K> {
    /// Wraps `handle` as-is, null included.
    pub fn from_raw(runtime: &'rt dyn RuntimeApi, handle: RawHandle<K>) -> Self {
        Self { runtime, handle }
    }

    /// Wraps `handle`, mapping null to `None`.
    pub fn new(runtime: &'rt dyn RuntimeApi, handle: RawHandle<K>) -> Option<Self> {
        (!handle.is_null()).then(|| Self::from_raw(runtime, handle))
    }

    pub fn null(runtime: &'rt dyn RuntimeApi) -> Self {
        Self::from_raw(runtime, RawHandle::null())
    }

    pub fn raw(self) -> RawHandle<K> {
        self.handle
    }

    pub fn is_null(self) -> bool {
        self.handle.is_null()
    }

    pub fn runtime(self) -> &'rt dyn RuntimeApi {
        self.runtime
    }

    /// Wraps another handle coming out of the same runtime.
    pub(crate) fn sibling<J: HandleKind>(self, handle: RawHandle<J>) -> Option<Managed<'rt, J>> {
        Managed::new(self.runtime, handle)
    }

    /// `None` for a null handle, otherwise the handle itself.
    pub(crate) fn live(self) -> Option<RawHandle<K>> {
        (!self.handle.is_null()).then_some(self.handle)
    }
}

impl<K: HandleKind> Clone for Managed<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HandleKind> Copy for Managed<'_, K> {}

impl<K: HandleKind> PartialEq for Managed<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<K: HandleKind> Eq for Managed<'_, K> {}

impl<K: HandleKind> Hash for Managed<'_, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<K: HandleKind> Debug for Managed<'_, K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.handle, f)
    }
}

impl<'rt, K: HandleKind> From<Managed<'rt, K>> for RawHandle<K> {
    fn from(value: Managed<'rt, K>) -> Self {
        value.handle
    }
}
