use crate::{
    handle::{kind, Cursor, Managed, SignatureHandle},
    types::Type,
    utils::ByteOffset,
    value::ObjectRef,
};
use std::{ffi::c_void, mem::MaybeUninit};

pub type Field<'rt> = Managed<'rt, kind::Field>;
pub type Property<'rt> = Managed<'rt, kind::Property>;
pub type Method<'rt> = Managed<'rt, kind::Method>;

impl<'rt> Field<'rt> {
    pub fn name(self) -> Option<String> {
        self.runtime().field_get_name(self.live()?)
    }

    pub fn field_type(self) -> Option<Type<'rt>> {
        let handle = self.runtime().field_get_type(self.live()?);
        self.sibling(handle)
    }

    /// Offset from the start of the object, including the object header.
    pub fn offset(self) -> Option<ByteOffset> {
        let offset = self.runtime().field_get_offset(self.live()?);
        Some(ByteOffset(offset as usize))
    }

    /// Copies the field's current value out of `obj` into `out`. Does
    /// nothing on a null field.
    ///
    /// # Safety
    /// `out` must be valid for writes of the field type's size and `obj` must
    /// be a live instance of a class declaring this field.
    pub unsafe fn read_raw(self, obj: ObjectRef<'rt>, out: *mut c_void) {
        let Some(field) = self.live() else {
            return;
        };
        self.runtime().field_get_value(obj.raw(), field, out);
    }

    /// Copies `value` into the field on `obj`. Does nothing on a null field.
    ///
    /// # Safety
    /// `value` must be valid for reads of the field type's size and `obj`
    /// must be a live instance of a class declaring this field.
    pub unsafe fn write_raw(self, obj: ObjectRef<'rt>, value: *const c_void) {
        let Some(field) = self.live() else {
            return;
        };
        self.runtime().field_set_value(obj.raw(), field, value);
    }

    /// Reads the field as a `T`; `None` on a null field.
    ///
    /// # Safety
    /// `T` must have exactly the size and layout of the field's type.
    /// Reference-typed fields are read as a raw object pointer.
    pub unsafe fn get_value<T: Copy>(self, obj: ObjectRef<'rt>) -> Option<T> {
        self.live()?;
        let mut out = MaybeUninit::<T>::uninit();
        self.read_raw(obj, out.as_mut_ptr().cast());
        Some(out.assume_init())
    }

    /// # Safety
    /// Same layout requirement as [`Field::get_value`].
    pub unsafe fn set_value<T: Copy>(self, obj: ObjectRef<'rt>, value: &T) {
        self.write_raw(obj, (value as *const T).cast());
    }
}

impl<'rt> Property<'rt> {
    pub fn name(self) -> Option<String> {
        self.runtime().property_get_name(self.live()?)
    }

    pub fn getter(self) -> Option<Method<'rt>> {
        let handle = self.runtime().property_get_get_method(self.live()?);
        self.sibling(handle)
    }

    pub fn setter(self) -> Option<Method<'rt>> {
        let handle = self.runtime().property_get_set_method(self.live()?);
        self.sibling(handle)
    }
}

impl<'rt> Method<'rt> {
    /// Sentinel returned by [`Method::param_count`] for a null method.
    pub const NO_METHOD: i32 = -1;

    pub fn name(self) -> Option<String> {
        self.runtime().method_get_name(self.live()?)
    }

    fn signature(self) -> Option<SignatureHandle> {
        let sig = self.runtime().method_signature(self.live()?);
        (!sig.is_null()).then_some(sig)
    }

    /// Number of declared parameters, or [`Method::NO_METHOD`] for a null
    /// method so that "no method" stays distinct from "no parameters".
    ///
    /// A live method whose signature the runtime cannot load reports zero
    /// parameters, matching what [`Method::param_types`] yields for it.
    pub fn param_count(self) -> i32 {
        let Some(method) = self.live() else {
            return Self::NO_METHOD;
        };
        match self.signature() {
            Some(sig) => self.runtime().signature_get_param_count(sig) as i32,
            None => {
                tracing::warn!(?method, "runtime returned no signature");
                0
            }
        }
    }

    pub fn return_type(self) -> Option<Type<'rt>> {
        let handle = self.runtime().signature_get_return_type(self.signature()?);
        self.sibling(handle)
    }

    /// Parameter types in declaration order. Each call starts a fresh walk.
    pub fn param_types(self) -> ParamTypes<'rt> {
        ParamTypes {
            method: self,
            signature: self.signature(),
            cursor: Cursor::start(),
        }
    }

    /// Calls the method on `target`, or statically when `target` is `None`,
    /// returning the (boxed, for value types) result. `None` for a null
    /// method or a void return.
    ///
    /// Managed exceptions are not caught here; they follow the runtime's
    /// unhandled-exception policy.
    ///
    /// # Safety
    /// `args` must hold one pointer per declared parameter, each pointing at
    /// a value of that parameter's type (an object pointer for reference
    /// types). Arity and type mismatches are not checked.
    pub unsafe fn invoke(
        self,
        target: Option<ObjectRef<'rt>>,
        args: &mut [*mut c_void],
    ) -> Option<ObjectRef<'rt>> {
        let method = self.live()?;
        let obj = target.map(ObjectRef::raw).unwrap_or_default();
        let args_ptr = if args.is_empty() {
            std::ptr::null_mut()
        } else {
            args.as_mut_ptr()
        };

        tracing::trace!(
            method = ?method,
            target = ?obj,
            argc = args.len(),
            "invoking managed method"
        );
        let result = self.runtime().runtime_invoke(method, obj, args_ptr);
        self.sibling(result)
    }
}

/// Lazy walk over a method's parameter types.
pub struct ParamTypes<'rt> {
    method: Method<'rt>,
    signature: Option<SignatureHandle>,
    cursor: Cursor,
}

impl<'rt> Iterator for ParamTypes<'rt> {
    type Item = Type<'rt>;

    fn next(&mut self) -> Option<Self::Item> {
        let sig = self.signature?;
        let ty = self
            .method
            .runtime()
            .signature_get_params(sig, &mut self.cursor);
        if ty.is_null() {
            self.signature = None;
            return None;
        }
        self.method.sibling(ty)
    }
}

impl std::iter::FusedIterator for ParamTypes<'_> {}
