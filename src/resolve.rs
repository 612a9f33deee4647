//! Getting from an assembly path to classes: domains, assemblies and images.
use crate::{
    handle::{kind, Managed},
    runtime::RuntimeApi,
    types::Class,
    utils::split_qualified_name,
    value::ObjectRef,
};
use std::path::Path;

pub type Domain<'rt> = Managed<'rt, kind::Domain>;
pub type Assembly<'rt> = Managed<'rt, kind::Assembly>;
pub type Image<'rt> = Managed<'rt, kind::Image>;

impl<'rt> Domain<'rt> {
    /// `None` until the runtime has been initialised.
    pub fn root(runtime: &'rt dyn RuntimeApi) -> Option<Self> {
        Self::new(runtime, runtime.root_domain())
    }

    pub fn open_assembly(self, path: impl AsRef<Path>) -> Option<Assembly<'rt>> {
        let path = path.as_ref();
        let Some(path_str) = path.to_str() else {
            tracing::warn!(path = %path.display(), "assembly path is not valid UTF-8");
            return None;
        };
        let handle = self.runtime().domain_assembly_open(self.live()?, path_str);
        if handle.is_null() {
            tracing::debug!(path = %path.display(), "runtime could not open assembly");
        }
        self.sibling(handle)
    }

    /// Allocates an instance of `class` and runs its parameterless
    /// constructor.
    pub fn new_object(self, class: Class<'rt>) -> Option<ObjectRef<'rt>> {
        let handle = self.runtime().object_new(self.live()?, class.live()?);
        let obj = self.sibling(handle)?;
        self.runtime().runtime_object_init(obj.raw());
        Some(obj)
    }

    pub fn new_string(self, text: &str) -> Option<ObjectRef<'rt>> {
        let handle = self.runtime().string_new(self.live()?, text);
        self.sibling(handle)
    }
}

impl<'rt> Assembly<'rt> {
    pub fn image(self) -> Option<Image<'rt>> {
        let handle = self.runtime().assembly_get_image(self.live()?);
        self.sibling(handle)
    }
}

impl<'rt> Image<'rt> {
    pub fn name(self) -> Option<String> {
        self.runtime().image_get_name(self.live()?)
    }

    pub fn find_class(self, namespace: &str, name: &str) -> Option<Class<'rt>> {
        let handle = self
            .runtime()
            .class_from_name(self.live()?, namespace, name);
        self.sibling(handle)
    }

    /// Resolves `Namespace.Name`, splitting at the last dot.
    pub fn find_class_by_full_name(self, full_name: &str) -> Option<Class<'rt>> {
        let (namespace, name) = split_qualified_name(full_name);
        self.find_class(namespace, name)
    }

    /// Every class defined in this image, in metadata order. Rows the
    /// runtime fails to load are skipped.
    pub fn classes(self) -> impl Iterator<Item = Class<'rt>> + 'rt {
        let count = self
            .live()
            .map_or(0, |image| self.runtime().image_type_count(image));
        (1..=count).filter_map(move |row| {
            let handle = self.runtime().image_type_at(self.raw(), row);
            if handle.is_null() {
                tracing::debug!(row, "skipping type definition the runtime could not load");
            }
            self.sibling(handle)
        })
    }
}
