use crate::handle::{
    AssemblyHandle, ClassHandle, Cursor, DomainHandle, FieldHandle, ImageHandle, MethodHandle,
    ObjectHandle, PropertyHandle, SignatureHandle, TypeHandle,
};
use std::ffi::c_void;

/// The native entry points the reflection wrappers are built on.
///
/// Every method mirrors one call of the embedding API. Implementations never
/// report errors: "nothing" is a null handle, and enumerators return a null
/// handle once `iter` is exhausted. Callers guarantee that every non-null
/// handle they pass in was produced by the same implementation and is still
/// alive.
///
/// Name getters return owned strings; implementations copy (and where
/// required free) whatever the runtime hands back.
pub trait RuntimeApi {
    fn type_get_name(&self, ty: TypeHandle) -> Option<String>;
    fn type_get_class(&self, ty: TypeHandle) -> ClassHandle;

    fn field_get_name(&self, field: FieldHandle) -> Option<String>;
    fn field_get_type(&self, field: FieldHandle) -> TypeHandle;
    fn field_get_offset(&self, field: FieldHandle) -> u32;
    /// # Safety
    /// `out` must be valid for writes of the field type's size and `obj`
    /// must be a live instance declaring `field`.
    unsafe fn field_get_value(&self, obj: ObjectHandle, field: FieldHandle, out: *mut c_void);
    /// # Safety
    /// `value` must be valid for reads of the field type's size and `obj`
    /// must be a live instance declaring `field`.
    unsafe fn field_set_value(&self, obj: ObjectHandle, field: FieldHandle, value: *const c_void);

    fn property_get_name(&self, property: PropertyHandle) -> Option<String>;
    fn property_get_get_method(&self, property: PropertyHandle) -> MethodHandle;
    fn property_get_set_method(&self, property: PropertyHandle) -> MethodHandle;

    fn method_get_name(&self, method: MethodHandle) -> Option<String>;
    fn method_signature(&self, method: MethodHandle) -> SignatureHandle;
    fn signature_get_param_count(&self, sig: SignatureHandle) -> u32;
    fn signature_get_return_type(&self, sig: SignatureHandle) -> TypeHandle;
    fn signature_get_params(&self, sig: SignatureHandle, iter: &mut Cursor) -> TypeHandle;
    /// Managed exceptions are left to the runtime's unhandled-exception path.
    ///
    /// # Safety
    /// `args` must point at one valid pointer per declared parameter, each
    /// referring to a value of the parameter's type (or a boxed object for
    /// reference types). It may be null for parameterless methods.
    unsafe fn runtime_invoke(
        &self,
        method: MethodHandle,
        obj: ObjectHandle,
        args: *mut *mut c_void,
    ) -> ObjectHandle;

    fn class_get_name(&self, class: ClassHandle) -> Option<String>;
    fn class_get_namespace(&self, class: ClassHandle) -> Option<String>;
    fn class_get_type(&self, class: ClassHandle) -> TypeHandle;
    fn class_get_parent(&self, class: ClassHandle) -> ClassHandle;
    fn class_get_field_from_name(&self, class: ClassHandle, name: &str) -> FieldHandle;
    fn class_get_property_from_name(&self, class: ClassHandle, name: &str) -> PropertyHandle;
    /// `param_count` of `-1` matches any arity.
    fn class_get_method_from_name(
        &self,
        class: ClassHandle,
        name: &str,
        param_count: i32,
    ) -> MethodHandle;
    fn class_get_fields(&self, class: ClassHandle, iter: &mut Cursor) -> FieldHandle;
    fn class_get_properties(&self, class: ClassHandle, iter: &mut Cursor) -> PropertyHandle;
    fn class_get_methods(&self, class: ClassHandle, iter: &mut Cursor) -> MethodHandle;

    fn object_get_class(&self, obj: ObjectHandle) -> ClassHandle;
    /// Pointer to the payload of a boxed value type.
    fn object_unbox(&self, obj: ObjectHandle) -> *mut c_void;
    fn string_to_utf8(&self, obj: ObjectHandle) -> Option<String>;

    fn root_domain(&self) -> DomainHandle;
    fn domain_assembly_open(&self, domain: DomainHandle, path: &str) -> AssemblyHandle;
    fn assembly_get_image(&self, assembly: AssemblyHandle) -> ImageHandle;
    fn image_get_name(&self, image: ImageHandle) -> Option<String>;
    /// Number of rows in the image's type definition table.
    fn image_type_count(&self, image: ImageHandle) -> usize;
    /// Class for type definition row `row` (one-based, like metadata tokens).
    fn image_type_at(&self, image: ImageHandle, row: usize) -> ClassHandle;
    fn class_from_name(&self, image: ImageHandle, namespace: &str, name: &str) -> ClassHandle;
    fn object_new(&self, domain: DomainHandle, class: ClassHandle) -> ObjectHandle;
    /// Runs the parameterless constructor of a freshly allocated object.
    fn runtime_object_init(&self, obj: ObjectHandle);
    fn string_new(&self, domain: DomainHandle, text: &str) -> ObjectHandle;

    /// Enables debug symbol loading for assemblies opened afterwards.
    fn debug_init(&self);

    /// # Safety
    /// `function` must stay valid for the life of the process and match the
    /// signature of the managed `extern` method registered under `name`.
    unsafe fn add_internal_call(&self, name: &str, function: *const c_void);
}
