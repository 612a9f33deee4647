//! In-memory stand-in for the managed runtime.
//!
//! Handles are one-based indices into the tables below, cast to pointers.
//! They are never dereferenced, which is all the wrappers assume of them.
#![allow(dead_code)]

use mono_reflect::handle::{
    AssemblyHandle, ClassHandle, Cursor, DomainHandle, FieldHandle, HandleKind, ImageHandle,
    MethodHandle, ObjectHandle, PropertyHandle, RawHandle, SignatureHandle, TypeHandle,
};
use mono_reflect::RuntimeApi;
use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
};

pub const OBJECT_HEADER: usize = 16;
pub const IMAGE_NAME: &str = "Game";
pub const ASSEMBLY_PATH: &str = "Game.dll";

pub type Body = fn(&FakeRuntime, ObjectHandle, &[*mut c_void]) -> ObjectHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeId(pub usize);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassId(pub usize);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldId(pub usize);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyId(pub usize);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodId(pub usize);

struct FakeType {
    name: String,
    class: Option<ClassId>,
    size: usize,
}

struct FakeClass {
    namespace: String,
    name: String,
    parent: Option<ClassId>,
    ty: TypeId,
    instance_size: usize,
    fields: Vec<FieldId>,
    properties: Vec<PropertyId>,
    methods: Vec<MethodId>,
}

struct FakeField {
    name: String,
    ty: TypeId,
    offset: usize,
}

struct FakeProperty {
    name: String,
    getter: Option<MethodId>,
    setter: Option<MethodId>,
}

struct FakeMethod {
    name: String,
    params: Vec<TypeId>,
    ret: TypeId,
    body: Option<Body>,
    signature_loads: bool,
}

struct FakeObject {
    class: ClassId,
    data: Box<[u8]>,
}

/// A single-image runtime built up by the test.
pub struct FakeRuntime {
    types: Vec<FakeType>,
    classes: Vec<FakeClass>,
    fields: Vec<FakeField>,
    properties: Vec<FakeProperty>,
    methods: Vec<FakeMethod>,
    objects: RefCell<Vec<FakeObject>>,
    pub void: TypeId,
    pub int32: TypeId,
    pub string: ClassId,
    pub boxed_int32: ClassId,
    pub constructed: Cell<u32>,
    pub invocations: RefCell<Vec<(MethodId, bool)>>,
    pub internal_calls: RefCell<Vec<(String, usize)>>,
    pub debug_inits: Cell<u32>,
}

fn handle<K: HandleKind>(index: usize) -> RawHandle<K> {
    RawHandle::from_ptr((index + 1) as *mut c_void)
}

fn index<K: HandleKind>(h: RawHandle<K>) -> usize {
    assert!(!h.is_null(), "fake runtime called with a null {}", K::NAME);
    h.as_ptr() as usize - 1
}

fn opt_handle<K: HandleKind>(index: Option<usize>) -> RawHandle<K> {
    index.map_or(RawHandle::null(), handle)
}

impl FakeRuntime {
    pub fn new() -> Self {
        let mut rt = Self {
            types: Vec::new(),
            classes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            objects: RefCell::new(Vec::new()),
            void: TypeId(0),
            int32: TypeId(0),
            string: ClassId(0),
            boxed_int32: ClassId(0),
            constructed: Cell::new(0),
            invocations: RefCell::new(Vec::new()),
            internal_calls: RefCell::new(Vec::new()),
            debug_inits: Cell::new(0),
        };
        rt.void = rt.add_primitive("System.Void", 0);
        rt.int32 = rt.add_primitive("System.Int32", 4);
        rt.string = rt.add_class("System", "String", None);
        rt.boxed_int32 = rt.add_class("System", "Int32", None);
        rt
    }

    pub fn add_primitive(&mut self, name: &str, size: usize) -> TypeId {
        self.types.push(FakeType {
            name: name.to_string(),
            class: None,
            size,
        });
        TypeId(self.types.len() - 1)
    }

    /// Parents must be fully populated before children are added.
    pub fn add_class(&mut self, namespace: &str, name: &str, parent: Option<ClassId>) -> ClassId {
        let id = ClassId(self.classes.len());
        let ty = TypeId(self.types.len());
        self.types.push(FakeType {
            name: if namespace.is_empty() {
                name.to_string()
            } else {
                format!("{namespace}.{name}")
            },
            class: Some(id),
            size: std::mem::size_of::<usize>(),
        });
        let instance_size = parent.map_or(OBJECT_HEADER, |p| self.classes[p.0].instance_size);
        self.classes.push(FakeClass {
            namespace: namespace.to_string(),
            name: name.to_string(),
            parent,
            ty,
            instance_size,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        });
        id
    }

    pub fn add_field(&mut self, class: ClassId, name: &str, ty: TypeId) -> FieldId {
        let size = self.types[ty.0].size;
        let c = &mut self.classes[class.0];
        let offset = c.instance_size;
        c.instance_size += size;
        let id = FieldId(self.fields.len());
        c.fields.push(id);
        self.fields.push(FakeField {
            name: name.to_string(),
            ty,
            offset,
        });
        id
    }

    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
        body: Option<Body>,
    ) -> MethodId {
        let id = MethodId(self.methods.len());
        self.classes[class.0].methods.push(id);
        self.methods.push(FakeMethod {
            name: name.to_string(),
            params: params.to_vec(),
            ret,
            body,
            signature_loads: true,
        });
        id
    }

    /// Makes the runtime fail to produce a signature for `method`.
    pub fn break_signature(&mut self, method: MethodId) {
        self.methods[method.0].signature_loads = false;
    }

    pub fn add_property(
        &mut self,
        class: ClassId,
        name: &str,
        getter: Option<MethodId>,
        setter: Option<MethodId>,
    ) -> PropertyId {
        let id = PropertyId(self.properties.len());
        self.classes[class.0].properties.push(id);
        self.properties.push(FakeProperty {
            name: name.to_string(),
            getter,
            setter,
        });
        id
    }

    pub fn class_type(&self, class: ClassId) -> TypeId {
        self.classes[class.0].ty
    }

    pub fn class_handle(&self, class: ClassId) -> ClassHandle {
        handle(class.0)
    }

    pub fn field_handle(&self, field: FieldId) -> FieldHandle {
        handle(field.0)
    }

    pub fn method_handle(&self, method: MethodId) -> MethodHandle {
        handle(method.0)
    }

    pub fn type_handle(&self, ty: TypeId) -> TypeHandle {
        handle(ty.0)
    }

    pub fn alloc(&self, class: ClassId, data: Box<[u8]>) -> ObjectHandle {
        let mut objects = self.objects.borrow_mut();
        objects.push(FakeObject { class, data });
        handle(objects.len() - 1)
    }

    pub fn instantiate(&self, class: ClassId) -> ObjectHandle {
        let size = self.classes[class.0].instance_size;
        self.alloc(class, vec![0; size].into_boxed_slice())
    }

    pub fn box_i32(&self, value: i32) -> ObjectHandle {
        self.alloc(self.boxed_int32, Box::new(value.to_ne_bytes()))
    }

    pub fn object_bytes(&self, obj: ObjectHandle) -> Vec<u8> {
        self.objects.borrow()[index(obj)].data.to_vec()
    }

    fn field_size(&self, field: FieldHandle) -> (usize, usize) {
        let f = &self.fields[index(field)];
        (f.offset, self.types[f.ty.0].size)
    }

    fn find_method(&self, class: &FakeClass, name: &str, param_count: i32) -> Option<MethodId> {
        class.methods.iter().copied().find(|m| {
            let m = &self.methods[m.0];
            m.name == name && (param_count < 0 || m.params.len() == param_count as usize)
        })
    }
}

fn next<K: HandleKind, T: Copy>(
    items: &[T],
    iter: &mut Cursor,
    to_index: fn(T) -> usize,
) -> RawHandle<K> {
    let position = iter.as_ptr() as usize;
    match items.get(position) {
        Some(&item) => {
            iter.set((position + 1) as *mut c_void);
            handle(to_index(item))
        }
        None => RawHandle::null(),
    }
}

impl RuntimeApi for FakeRuntime {
    fn type_get_name(&self, ty: TypeHandle) -> Option<String> {
        Some(self.types[index(ty)].name.clone())
    }

    fn type_get_class(&self, ty: TypeHandle) -> ClassHandle {
        opt_handle(self.types[index(ty)].class.map(|c| c.0))
    }

    fn field_get_name(&self, field: FieldHandle) -> Option<String> {
        Some(self.fields[index(field)].name.clone())
    }

    fn field_get_type(&self, field: FieldHandle) -> TypeHandle {
        handle(self.fields[index(field)].ty.0)
    }

    fn field_get_offset(&self, field: FieldHandle) -> u32 {
        self.fields[index(field)].offset as u32
    }

    unsafe fn field_get_value(&self, obj: ObjectHandle, field: FieldHandle, out: *mut c_void) {
        let (offset, size) = self.field_size(field);
        let objects = self.objects.borrow();
        let src = &objects[index(obj)].data[offset..offset + size];
        std::ptr::copy_nonoverlapping(src.as_ptr(), out.cast::<u8>(), size);
    }

    unsafe fn field_set_value(&self, obj: ObjectHandle, field: FieldHandle, value: *const c_void) {
        let (offset, size) = self.field_size(field);
        let mut objects = self.objects.borrow_mut();
        let dst = &mut objects[index(obj)].data[offset..offset + size];
        std::ptr::copy_nonoverlapping(value.cast::<u8>(), dst.as_mut_ptr(), size);
    }

    fn property_get_name(&self, property: PropertyHandle) -> Option<String> {
        Some(self.properties[index(property)].name.clone())
    }

    fn property_get_get_method(&self, property: PropertyHandle) -> MethodHandle {
        opt_handle(self.properties[index(property)].getter.map(|m| m.0))
    }

    fn property_get_set_method(&self, property: PropertyHandle) -> MethodHandle {
        opt_handle(self.properties[index(property)].setter.map(|m| m.0))
    }

    fn method_get_name(&self, method: MethodHandle) -> Option<String> {
        Some(self.methods[index(method)].name.clone())
    }

    fn method_signature(&self, method: MethodHandle) -> SignatureHandle {
        let id = index(method);
        if self.methods[id].signature_loads {
            handle(id)
        } else {
            SignatureHandle::null()
        }
    }

    fn signature_get_param_count(&self, sig: SignatureHandle) -> u32 {
        self.methods[index(sig)].params.len() as u32
    }

    fn signature_get_return_type(&self, sig: SignatureHandle) -> TypeHandle {
        handle(self.methods[index(sig)].ret.0)
    }

    fn signature_get_params(&self, sig: SignatureHandle, iter: &mut Cursor) -> TypeHandle {
        next(&self.methods[index(sig)].params, iter, |t| t.0)
    }

    unsafe fn runtime_invoke(
        &self,
        method: MethodHandle,
        obj: ObjectHandle,
        args: *mut *mut c_void,
    ) -> ObjectHandle {
        let id = index(method);
        self.invocations.borrow_mut().push((MethodId(id), obj.is_null()));
        let m = &self.methods[id];
        let args: &[*mut c_void] = if m.params.is_empty() {
            &[]
        } else {
            std::slice::from_raw_parts(args, m.params.len())
        };
        match m.body {
            Some(body) => body(self, obj, args),
            None => ObjectHandle::null(),
        }
    }

    fn class_get_name(&self, class: ClassHandle) -> Option<String> {
        Some(self.classes[index(class)].name.clone())
    }

    fn class_get_namespace(&self, class: ClassHandle) -> Option<String> {
        Some(self.classes[index(class)].namespace.clone())
    }

    fn class_get_type(&self, class: ClassHandle) -> TypeHandle {
        handle(self.classes[index(class)].ty.0)
    }

    fn class_get_parent(&self, class: ClassHandle) -> ClassHandle {
        opt_handle(self.classes[index(class)].parent.map(|c| c.0))
    }

    fn class_get_field_from_name(&self, class: ClassHandle, name: &str) -> FieldHandle {
        let c = &self.classes[index(class)];
        opt_handle(
            c.fields
                .iter()
                .find(|f| self.fields[f.0].name == name)
                .map(|f| f.0),
        )
    }

    fn class_get_property_from_name(&self, class: ClassHandle, name: &str) -> PropertyHandle {
        let c = &self.classes[index(class)];
        opt_handle(
            c.properties
                .iter()
                .find(|p| self.properties[p.0].name == name)
                .map(|p| p.0),
        )
    }

    fn class_get_method_from_name(
        &self,
        class: ClassHandle,
        name: &str,
        param_count: i32,
    ) -> MethodHandle {
        let c = &self.classes[index(class)];
        opt_handle(self.find_method(c, name, param_count).map(|m| m.0))
    }

    fn class_get_fields(&self, class: ClassHandle, iter: &mut Cursor) -> FieldHandle {
        next(&self.classes[index(class)].fields, iter, |f| f.0)
    }

    fn class_get_properties(&self, class: ClassHandle, iter: &mut Cursor) -> PropertyHandle {
        next(&self.classes[index(class)].properties, iter, |p| p.0)
    }

    fn class_get_methods(&self, class: ClassHandle, iter: &mut Cursor) -> MethodHandle {
        next(&self.classes[index(class)].methods, iter, |m| m.0)
    }

    fn object_get_class(&self, obj: ObjectHandle) -> ClassHandle {
        handle(self.objects.borrow()[index(obj)].class.0)
    }

    fn object_unbox(&self, obj: ObjectHandle) -> *mut c_void {
        // boxed payloads have no header here; the boxed slice never moves
        self.objects.borrow_mut()[index(obj)].data.as_mut_ptr().cast()
    }

    fn string_to_utf8(&self, obj: ObjectHandle) -> Option<String> {
        let objects = self.objects.borrow();
        let o = &objects[index(obj)];
        // the real runtime reads any object as a string header
        assert!(o.class == self.string, "string_to_utf8 called on a non-string object");
        Some(String::from_utf8_lossy(&o.data).into_owned())
    }

    fn root_domain(&self) -> DomainHandle {
        handle(0)
    }

    fn domain_assembly_open(&self, _domain: DomainHandle, path: &str) -> AssemblyHandle {
        if path == ASSEMBLY_PATH {
            handle(0)
        } else {
            AssemblyHandle::null()
        }
    }

    fn assembly_get_image(&self, _assembly: AssemblyHandle) -> ImageHandle {
        handle(0)
    }

    fn image_get_name(&self, _image: ImageHandle) -> Option<String> {
        Some(IMAGE_NAME.to_string())
    }

    fn image_type_count(&self, _image: ImageHandle) -> usize {
        self.classes.len()
    }

    fn image_type_at(&self, _image: ImageHandle, row: usize) -> ClassHandle {
        if row == 0 || row > self.classes.len() {
            return ClassHandle::null();
        }
        handle(row - 1)
    }

    fn class_from_name(&self, _image: ImageHandle, namespace: &str, name: &str) -> ClassHandle {
        opt_handle(
            self.classes
                .iter()
                .position(|c| c.namespace == namespace && c.name == name),
        )
    }

    fn object_new(&self, _domain: DomainHandle, class: ClassHandle) -> ObjectHandle {
        self.instantiate(ClassId(index(class)))
    }

    fn runtime_object_init(&self, _obj: ObjectHandle) {
        self.constructed.set(self.constructed.get() + 1);
    }

    fn string_new(&self, _domain: DomainHandle, text: &str) -> ObjectHandle {
        self.alloc(self.string, text.as_bytes().into())
    }

    fn debug_init(&self) {
        self.debug_inits.set(self.debug_inits.get() + 1);
    }

    unsafe fn add_internal_call(&self, name: &str, function: *const c_void) {
        self.internal_calls
            .borrow_mut()
            .push((name.to_string(), function as usize));
    }
}

/// `Shape` <- `Rect` <- `Square`, with `tag` declared on both `Rect` and `Square`.
pub struct Shapes {
    pub rt: FakeRuntime,
    pub shape: ClassId,
    pub rect: ClassId,
    pub square: ClassId,
    pub get_area: MethodId,
    pub set_width: MethodId,
}

fn rect_area(rt: &FakeRuntime, this: ObjectHandle, _args: &[*mut c_void]) -> ObjectHandle {
    let bytes = rt.object_bytes(this);
    let read = |at: usize| i32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
    // width and height follow Shape.id and Rect.tag
    rt.box_i32(read(OBJECT_HEADER + 8) * read(OBJECT_HEADER + 12))
}

fn add(rt: &FakeRuntime, _this: ObjectHandle, args: &[*mut c_void]) -> ObjectHandle {
    let a = unsafe { *args[0].cast::<i32>() };
    let b = unsafe { *args[1].cast::<i32>() };
    rt.box_i32(a + b)
}

pub fn shapes() -> Shapes {
    let mut rt = FakeRuntime::new();
    let int32 = rt.int32;
    let void = rt.void;

    let shape = rt.add_class("Geometry", "Shape", None);
    rt.add_field(shape, "id", int32);
    let describe = rt.add_method(shape, "Describe", &[], void, None);
    rt.add_method(shape, "Add", &[int32, int32], int32, Some(add));
    rt.add_property(shape, "Description", Some(describe), None);

    let rect = rt.add_class("Geometry", "Rect", Some(shape));
    rt.add_field(rect, "tag", int32);
    rt.add_field(rect, "width", int32);
    rt.add_field(rect, "height", int32);
    let get_area = rt.add_method(rect, "get_Area", &[], int32, Some(rect_area));
    let set_width = rt.add_method(rect, "set_Width", &[int32], void, None);
    rt.add_method(rect, "Scale", &[int32], void, None);
    rt.add_method(rect, "Scale", &[int32, int32], void, None);
    rt.add_property(rect, "Area", Some(get_area), None);
    rt.add_property(rect, "Width", None, Some(set_width));

    let square = rt.add_class("Geometry", "Square", Some(rect));
    rt.add_field(square, "tag", int32);
    rt.add_method(square, "Describe", &[], void, None);

    Shapes {
        rt,
        shape,
        rect,
        square,
        get_area,
        set_width,
    }
}
