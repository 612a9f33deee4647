use crate::{
    handle::{kind, ClassHandle, Cursor, HandleKind, Managed, RawHandle},
    runtime::RuntimeApi,
    types::{Field, Method, Property, Type},
    utils::qualified_name,
};

pub type Class<'rt> = Managed<'rt, kind::Class>;

impl<'rt> Class<'rt> {
    pub fn name(self) -> Option<String> {
        self.runtime().class_get_name(self.live()?)
    }

    /// Empty string for classes in the global namespace.
    pub fn namespace(self) -> Option<String> {
        self.runtime().class_get_namespace(self.live()?)
    }

    pub fn full_name(self) -> Option<String> {
        let name = self.name()?;
        Some(qualified_name(&self.namespace().unwrap_or_default(), &name))
    }

    /// The type this class declares.
    pub fn reflected_type(self) -> Option<Type<'rt>> {
        let handle = self.runtime().class_get_type(self.live()?);
        self.sibling(handle)
    }

    /// `None` for `System.Object`, interfaces and null classes.
    pub fn parent(self) -> Option<Class<'rt>> {
        let handle = self.runtime().class_get_parent(self.live()?);
        self.sibling(handle)
    }

    /// Looks up a field declared directly on this class.
    pub fn find_field(self, name: &str) -> Option<Field<'rt>> {
        let handle = self.runtime().class_get_field_from_name(self.live()?, name);
        if handle.is_null() {
            tracing::trace!(class = ?self.raw(), name, "field not found");
        }
        self.sibling(handle)
    }

    pub fn find_property(self, name: &str) -> Option<Property<'rt>> {
        let handle = self
            .runtime()
            .class_get_property_from_name(self.live()?, name);
        if handle.is_null() {
            tracing::trace!(class = ?self.raw(), name, "property not found");
        }
        self.sibling(handle)
    }

    /// Looks up a method declared directly on this class. `param_count`
    /// narrows overloads by arity; `None` takes the first match of any arity.
    pub fn find_method(self, name: &str, param_count: Option<usize>) -> Option<Method<'rt>> {
        let arity = match param_count {
            Some(n) => i32::try_from(n).ok()?,
            None => -1,
        };
        let handle = self
            .runtime()
            .class_get_method_from_name(self.live()?, name, arity);
        if handle.is_null() {
            tracing::trace!(class = ?self.raw(), name, arity, "method not found");
        }
        self.sibling(handle)
    }

    /// Fields declared directly on this class, in the runtime's order.
    pub fn fields(self) -> Members<'rt, kind::Field> {
        Members::new(self)
    }

    pub fn properties(self) -> Members<'rt, kind::Property> {
        Members::new(self)
    }

    pub fn methods(self) -> Members<'rt, kind::Method> {
        Members::new(self)
    }

    /// This class followed by each of its ancestors up to the root.
    pub fn ancestors(self) -> Ancestors<'rt> {
        Ancestors {
            next: self.live().map(|_| self),
        }
    }

    /// Fields of this class, then of its parent, and so on up to the root,
    /// each paired with the class that declares it.
    ///
    /// Shadowed members are not collapsed: a field declared under the same
    /// name at two levels is yielded once per level.
    pub fn fields_upward(self) -> Upward<'rt, kind::Field> {
        Upward::new(self)
    }

    pub fn properties_upward(self) -> Upward<'rt, kind::Property> {
        Upward::new(self)
    }

    /// Overrides show up once for every class that declares them.
    pub fn methods_upward(self) -> Upward<'rt, kind::Method> {
        Upward::new(self)
    }
}

/// Member kinds a class can enumerate through the runtime's cursor protocol.
pub trait MemberKind: HandleKind + Sized {
    fn next_member(
        runtime: &dyn RuntimeApi,
        class: ClassHandle,
        iter: &mut Cursor,
    ) -> RawHandle<Self>;
}

impl MemberKind for kind::Field {
    fn next_member(
        runtime: &dyn RuntimeApi,
        class: ClassHandle,
        iter: &mut Cursor,
    ) -> RawHandle<Self> {
        runtime.class_get_fields(class, iter)
    }
}

impl MemberKind for kind::Property {
    fn next_member(
        runtime: &dyn RuntimeApi,
        class: ClassHandle,
        iter: &mut Cursor,
    ) -> RawHandle<Self> {
        runtime.class_get_properties(class, iter)
    }
}

impl MemberKind for kind::Method {
    fn next_member(
        runtime: &dyn RuntimeApi,
        class: ClassHandle,
        iter: &mut Cursor,
    ) -> RawHandle<Self> {
        runtime.class_get_methods(class, iter)
    }
}

/// Members declared directly on one class.
pub struct Members<'rt, K: MemberKind> {
    class: Option<Class<'rt>>,
    cursor: Cursor,
    _kind: std::marker::PhantomData<K>,
}

impl<'rt, K: MemberKind> Members<'rt, K> {
    fn new(class: Class<'rt>) -> Self {
        Self {
            class: class.live().map(|_| class),
            cursor: Cursor::start(),
            _kind: std::marker::PhantomData,
        }
    }
}

impl<'rt, K: MemberKind> Iterator for Members<'rt, K> {
    type Item = Managed<'rt, K>;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.class?;
        let handle = K::next_member(class.runtime(), class.raw(), &mut self.cursor);
        if handle.is_null() {
            self.class = None;
            return None;
        }
        class.sibling(handle)
    }
}

impl<K: MemberKind> std::iter::FusedIterator for Members<'_, K> {}

/// Walks the parent chain starting from (and including) a class.
pub struct Ancestors<'rt> {
    next: Option<Class<'rt>>,
}

impl<'rt> Iterator for Ancestors<'rt> {
    type Item = Class<'rt>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

impl std::iter::FusedIterator for Ancestors<'_> {}

/// Members of a class and all of its ancestors, paired with the declaring
/// class, most-derived level first.
pub struct Upward<'rt, K: MemberKind> {
    levels: Ancestors<'rt>,
    current: Option<(Class<'rt>, Members<'rt, K>)>,
}

impl<'rt, K: MemberKind> Upward<'rt, K> {
    fn new(class: Class<'rt>) -> Self {
        Self {
            levels: class.ancestors(),
            current: None,
        }
    }
}

impl<'rt, K: MemberKind> Iterator for Upward<'rt, K> {
    type Item = (Managed<'rt, K>, Class<'rt>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((declaring, members)) = &mut self.current {
                if let Some(member) = members.next() {
                    return Some((member, *declaring));
                }
            }
            let level = self.levels.next()?;
            self.current = Some((level, Members::new(level)));
        }
    }
}

impl<K: MemberKind> std::iter::FusedIterator for Upward<'_, K> {}
