//! [`RuntimeApi`] backed by the Mono embedding API, loaded at runtime.
//!
//! The shared library is opened with `libloading` and every entry point the
//! wrappers need is resolved up front, so a missing symbol is reported once at
//! load time rather than on first use.
use crate::{
    config::RuntimeConfig,
    error::MonoLoadError,
    handle::{
        AssemblyHandle, ClassHandle, Cursor, DomainHandle, FieldHandle, ImageHandle,
        MethodHandle, ObjectHandle, PropertyHandle, SignatureHandle, TypeHandle,
    },
    runtime::RuntimeApi,
};
use libloading::{Library, Symbol};
use std::ffi::{c_char, c_int, c_void, CStr, CString};

type Ptr = *mut c_void;

/// `MONO_TABLE_TYPEDEF` in the metadata table enumeration.
const TABLE_TYPEDEF: c_int = 2;
/// `MONO_TOKEN_TYPE_DEF`; the low 24 bits hold the row.
const TOKEN_TYPE_DEF: u32 = 0x0200_0000;

macro_rules! mono_functions {
    ($($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        struct MonoFunctions {
            $($name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
        }

        impl MonoFunctions {
            /// # Safety
            /// The returned pointers are only valid while `lib` stays loaded.
            unsafe fn resolve(lib: &Library) -> Result<Self, MonoLoadError> {
                Ok(Self {
                    $($name: {
                        let sym: Symbol<unsafe extern "C" fn($($arg),*) $(-> $ret)?> = lib
                            .get(concat!(stringify!($name), "\0").as_bytes())
                            .map_err(|source| MonoLoadError::MissingSymbol {
                                name: stringify!($name),
                                source,
                            })?;
                        *sym
                    },)*
                })
            }
        }
    };
}

mono_functions! {
    mono_free: fn(Ptr);
    mono_jit_init: fn(*const c_char) -> Ptr;
    mono_debug_init: fn(c_int);
    mono_get_root_domain: fn() -> Ptr;
    mono_domain_assembly_open: fn(Ptr, *const c_char) -> Ptr;
    mono_assembly_get_image: fn(Ptr) -> Ptr;
    mono_image_get_name: fn(Ptr) -> *const c_char;
    mono_image_get_table_rows: fn(Ptr, c_int) -> c_int;
    mono_class_get: fn(Ptr, u32) -> Ptr;
    mono_class_from_name: fn(Ptr, *const c_char, *const c_char) -> Ptr;

    mono_type_get_name: fn(Ptr) -> *mut c_char;
    mono_type_get_class: fn(Ptr) -> Ptr;

    mono_field_get_name: fn(Ptr) -> *const c_char;
    mono_field_get_type: fn(Ptr) -> Ptr;
    mono_field_get_offset: fn(Ptr) -> u32;
    mono_field_get_value: fn(Ptr, Ptr, Ptr);
    mono_field_set_value: fn(Ptr, Ptr, Ptr);

    mono_property_get_name: fn(Ptr) -> *const c_char;
    mono_property_get_get_method: fn(Ptr) -> Ptr;
    mono_property_get_set_method: fn(Ptr) -> Ptr;

    mono_method_get_name: fn(Ptr) -> *const c_char;
    mono_method_signature: fn(Ptr) -> Ptr;
    mono_signature_get_param_count: fn(Ptr) -> u32;
    mono_signature_get_return_type: fn(Ptr) -> Ptr;
    mono_signature_get_params: fn(Ptr, *mut Ptr) -> Ptr;
    mono_runtime_invoke: fn(Ptr, Ptr, *mut Ptr, *mut Ptr) -> Ptr;

    mono_class_get_name: fn(Ptr) -> *const c_char;
    mono_class_get_namespace: fn(Ptr) -> *const c_char;
    mono_class_get_type: fn(Ptr) -> Ptr;
    mono_class_get_parent: fn(Ptr) -> Ptr;
    mono_class_get_field_from_name: fn(Ptr, *const c_char) -> Ptr;
    mono_class_get_property_from_name: fn(Ptr, *const c_char) -> Ptr;
    mono_class_get_method_from_name: fn(Ptr, *const c_char, c_int) -> Ptr;
    mono_class_get_fields: fn(Ptr, *mut Ptr) -> Ptr;
    mono_class_get_properties: fn(Ptr, *mut Ptr) -> Ptr;
    mono_class_get_methods: fn(Ptr, *mut Ptr) -> Ptr;

    mono_object_get_class: fn(Ptr) -> Ptr;
    mono_object_new: fn(Ptr, Ptr) -> Ptr;
    mono_object_unbox: fn(Ptr) -> Ptr;
    mono_runtime_object_init: fn(Ptr);
    mono_string_new: fn(Ptr, *const c_char) -> Ptr;
    mono_string_to_utf8: fn(Ptr) -> *mut c_char;

    mono_add_internal_call: fn(*const c_char, *const c_void);
}

pub struct MonoApi {
    fns: MonoFunctions,
    // dropped after `fns`
    _library: Library,
}

impl MonoApi {
    /// Opens the first loadable candidate from `config`.
    pub fn load(config: &RuntimeConfig) -> Result<Self, MonoLoadError> {
        let candidates = config.library_candidates();
        for path in &candidates {
            match unsafe { Library::new(path) } {
                Ok(library) => {
                    tracing::debug!(path = %path.display(), "loaded Mono runtime library");
                    return Self::from_library(library);
                }
                Err(e) if config.library.is_some() => return Err(e.into()),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "candidate rejected"),
            }
        }
        Err(MonoLoadError::LibraryNotFound { tried: candidates })
    }

    pub fn from_library(library: Library) -> Result<Self, MonoLoadError> {
        let fns = unsafe { MonoFunctions::resolve(&library)? };
        Ok(Self {
            fns,
            _library: library,
        })
    }

    /// Starts the JIT and creates the root domain. Only needed when the host
    /// process is not already running inside Mono; the runtime cannot be
    /// started twice in one process.
    pub fn jit_init(&self, domain_name: &str) -> Result<DomainHandle, MonoLoadError> {
        let name = CString::new(domain_name)
            .map_err(|_| MonoLoadError::JitInit("domain name contains a NUL byte".into()))?;
        let domain = unsafe { (self.fns.mono_jit_init)(name.as_ptr()) };
        if domain.is_null() {
            return Err(MonoLoadError::JitInit(format!(
                "mono_jit_init({domain_name:?}) returned null"
            )));
        }
        tracing::info!(domain_name, "Mono JIT initialised");
        Ok(DomainHandle::from_ptr(domain))
    }
}

/// Copies a runtime-owned C string.
unsafe fn borrowed_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn c_string(s: &str) -> Option<CString> {
    match CString::new(s) {
        Ok(c) => Some(c),
        Err(_) => {
            tracing::warn!(value = s, "string with interior NUL cannot be passed to the runtime");
            None
        }
    }
}

impl MonoApi {
    /// Copies and releases a string the runtime allocated for the caller.
    unsafe fn owned_str(&self, ptr: *mut c_char) -> Option<String> {
        let s = borrowed_str(ptr);
        if !ptr.is_null() {
            (self.fns.mono_free)(ptr.cast());
        }
        s
    }
}

impl RuntimeApi for MonoApi {
    fn type_get_name(&self, ty: TypeHandle) -> Option<String> {
        unsafe { self.owned_str((self.fns.mono_type_get_name)(ty.as_ptr())) }
    }

    fn type_get_class(&self, ty: TypeHandle) -> ClassHandle {
        unsafe { (self.fns.mono_type_get_class)(ty.as_ptr()).into() }
    }

    fn field_get_name(&self, field: FieldHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_field_get_name)(field.as_ptr())) }
    }

    fn field_get_type(&self, field: FieldHandle) -> TypeHandle {
        unsafe { (self.fns.mono_field_get_type)(field.as_ptr()).into() }
    }

    fn field_get_offset(&self, field: FieldHandle) -> u32 {
        unsafe { (self.fns.mono_field_get_offset)(field.as_ptr()) }
    }

    unsafe fn field_get_value(&self, obj: ObjectHandle, field: FieldHandle, out: *mut c_void) {
        (self.fns.mono_field_get_value)(obj.as_ptr(), field.as_ptr(), out)
    }

    unsafe fn field_set_value(&self, obj: ObjectHandle, field: FieldHandle, value: *const c_void) {
        // the runtime only reads through this pointer despite its signature
        (self.fns.mono_field_set_value)(obj.as_ptr(), field.as_ptr(), value.cast_mut())
    }

    fn property_get_name(&self, property: PropertyHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_property_get_name)(property.as_ptr())) }
    }

    fn property_get_get_method(&self, property: PropertyHandle) -> MethodHandle {
        unsafe { (self.fns.mono_property_get_get_method)(property.as_ptr()).into() }
    }

    fn property_get_set_method(&self, property: PropertyHandle) -> MethodHandle {
        unsafe { (self.fns.mono_property_get_set_method)(property.as_ptr()).into() }
    }

    fn method_get_name(&self, method: MethodHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_method_get_name)(method.as_ptr())) }
    }

    fn method_signature(&self, method: MethodHandle) -> SignatureHandle {
        unsafe { (self.fns.mono_method_signature)(method.as_ptr()).into() }
    }

    fn signature_get_param_count(&self, sig: SignatureHandle) -> u32 {
        unsafe { (self.fns.mono_signature_get_param_count)(sig.as_ptr()) }
    }

    fn signature_get_return_type(&self, sig: SignatureHandle) -> TypeHandle {
        unsafe { (self.fns.mono_signature_get_return_type)(sig.as_ptr()).into() }
    }

    fn signature_get_params(&self, sig: SignatureHandle, iter: &mut Cursor) -> TypeHandle {
        unsafe { (self.fns.mono_signature_get_params)(sig.as_ptr(), iter.as_mut_ptr()).into() }
    }

    unsafe fn runtime_invoke(
        &self,
        method: MethodHandle,
        obj: ObjectHandle,
        args: *mut *mut c_void,
    ) -> ObjectHandle {
        (self.fns.mono_runtime_invoke)(method.as_ptr(), obj.as_ptr(), args, std::ptr::null_mut())
            .into()
    }

    fn class_get_name(&self, class: ClassHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_class_get_name)(class.as_ptr())) }
    }

    fn class_get_namespace(&self, class: ClassHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_class_get_namespace)(class.as_ptr())) }
    }

    fn class_get_type(&self, class: ClassHandle) -> TypeHandle {
        unsafe { (self.fns.mono_class_get_type)(class.as_ptr()).into() }
    }

    fn class_get_parent(&self, class: ClassHandle) -> ClassHandle {
        unsafe { (self.fns.mono_class_get_parent)(class.as_ptr()).into() }
    }

    fn class_get_field_from_name(&self, class: ClassHandle, name: &str) -> FieldHandle {
        let Some(name) = c_string(name) else {
            return FieldHandle::null();
        };
        unsafe { (self.fns.mono_class_get_field_from_name)(class.as_ptr(), name.as_ptr()).into() }
    }

    fn class_get_property_from_name(&self, class: ClassHandle, name: &str) -> PropertyHandle {
        let Some(name) = c_string(name) else {
            return PropertyHandle::null();
        };
        unsafe {
            (self.fns.mono_class_get_property_from_name)(class.as_ptr(), name.as_ptr()).into()
        }
    }

    fn class_get_method_from_name(
        &self,
        class: ClassHandle,
        name: &str,
        param_count: i32,
    ) -> MethodHandle {
        let Some(name) = c_string(name) else {
            return MethodHandle::null();
        };
        unsafe {
            (self.fns.mono_class_get_method_from_name)(class.as_ptr(), name.as_ptr(), param_count)
                .into()
        }
    }

    fn class_get_fields(&self, class: ClassHandle, iter: &mut Cursor) -> FieldHandle {
        unsafe { (self.fns.mono_class_get_fields)(class.as_ptr(), iter.as_mut_ptr()).into() }
    }

    fn class_get_properties(&self, class: ClassHandle, iter: &mut Cursor) -> PropertyHandle {
        unsafe { (self.fns.mono_class_get_properties)(class.as_ptr(), iter.as_mut_ptr()).into() }
    }

    fn class_get_methods(&self, class: ClassHandle, iter: &mut Cursor) -> MethodHandle {
        unsafe { (self.fns.mono_class_get_methods)(class.as_ptr(), iter.as_mut_ptr()).into() }
    }

    fn object_get_class(&self, obj: ObjectHandle) -> ClassHandle {
        unsafe { (self.fns.mono_object_get_class)(obj.as_ptr()).into() }
    }

    fn object_unbox(&self, obj: ObjectHandle) -> *mut c_void {
        unsafe { (self.fns.mono_object_unbox)(obj.as_ptr()) }
    }

    fn string_to_utf8(&self, obj: ObjectHandle) -> Option<String> {
        unsafe { self.owned_str((self.fns.mono_string_to_utf8)(obj.as_ptr())) }
    }

    fn root_domain(&self) -> DomainHandle {
        unsafe { (self.fns.mono_get_root_domain)().into() }
    }

    fn domain_assembly_open(&self, domain: DomainHandle, path: &str) -> AssemblyHandle {
        let Some(path) = c_string(path) else {
            return AssemblyHandle::null();
        };
        unsafe { (self.fns.mono_domain_assembly_open)(domain.as_ptr(), path.as_ptr()).into() }
    }

    fn assembly_get_image(&self, assembly: AssemblyHandle) -> ImageHandle {
        unsafe { (self.fns.mono_assembly_get_image)(assembly.as_ptr()).into() }
    }

    fn image_get_name(&self, image: ImageHandle) -> Option<String> {
        unsafe { borrowed_str((self.fns.mono_image_get_name)(image.as_ptr())) }
    }

    fn image_type_count(&self, image: ImageHandle) -> usize {
        let rows = unsafe { (self.fns.mono_image_get_table_rows)(image.as_ptr(), TABLE_TYPEDEF) };
        usize::try_from(rows).unwrap_or(0)
    }

    fn image_type_at(&self, image: ImageHandle, row: usize) -> ClassHandle {
        let Ok(row) = u32::try_from(row) else {
            return ClassHandle::null();
        };
        if row == 0 || row > 0x00FF_FFFF {
            return ClassHandle::null();
        }
        unsafe { (self.fns.mono_class_get)(image.as_ptr(), TOKEN_TYPE_DEF | row).into() }
    }

    fn class_from_name(&self, image: ImageHandle, namespace: &str, name: &str) -> ClassHandle {
        let (Some(namespace), Some(name)) = (c_string(namespace), c_string(name)) else {
            return ClassHandle::null();
        };
        unsafe {
            (self.fns.mono_class_from_name)(image.as_ptr(), namespace.as_ptr(), name.as_ptr())
                .into()
        }
    }

    fn object_new(&self, domain: DomainHandle, class: ClassHandle) -> ObjectHandle {
        unsafe { (self.fns.mono_object_new)(domain.as_ptr(), class.as_ptr()).into() }
    }

    fn runtime_object_init(&self, obj: ObjectHandle) {
        unsafe { (self.fns.mono_runtime_object_init)(obj.as_ptr()) }
    }

    fn string_new(&self, domain: DomainHandle, text: &str) -> ObjectHandle {
        let Some(text) = c_string(text) else {
            return ObjectHandle::null();
        };
        unsafe { (self.fns.mono_string_new)(domain.as_ptr(), text.as_ptr()).into() }
    }

    fn debug_init(&self) {
        // MONO_DEBUG_FORMAT_MONO
        unsafe { (self.fns.mono_debug_init)(1) }
    }

    unsafe fn add_internal_call(&self, name: &str, function: *const c_void) {
        let Some(name) = c_string(name) else {
            return;
        };
        tracing::debug!(name = ?name, "registering internal call");
        // copied by the runtime
        (self.fns.mono_add_internal_call)(name.as_ptr(), function)
    }
}
