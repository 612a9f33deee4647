use std::fmt::{self, Display, Formatter};

/// Position of a field inside an object's memory layout, header included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ByteOffset(pub usize);

impl Display for ByteOffset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ByteOffset {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// `Namespace.Name`, or just `Name` for the global namespace.
pub fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Splits `Namespace.Name` at the last dot. Nested types are not handled.
pub fn split_qualified_name(full_name: &str) -> (&str, &str) {
    match full_name.rfind('.') {
        Some(i) => (&full_name[..i], &full_name[i + 1..]),
        None => ("", full_name),
    }
}
