//! Reflection wrappers for type metadata: types, classes and their members.
use crate::handle::{kind, Managed};

pub mod class;
pub mod members;

pub use class::{Ancestors, Class, MemberKind, Members, Upward};
pub use members::{Field, Method, ParamTypes, Property};

/// A type descriptor, e.g. the declared type of a field or parameter.
pub type Type<'rt> = Managed<'rt, kind::Type>;

impl<'rt> Type<'rt> {
    /// The runtime's display name, e.g. `System.Int32` or `Game.Unit[]`.
    pub fn name(self) -> Option<String> {
        self.runtime().type_get_name(self.live()?)
    }

    /// The class backing this type. Primitive and array types resolve to
    /// their corlib classes.
    pub fn class(self) -> Option<Class<'rt>> {
        let handle = self.runtime().type_get_class(self.live()?);
        self.sibling(handle)
    }
}
