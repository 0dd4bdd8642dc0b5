use rustc_hash::FxHashSet;
use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

/// An element or attribute name.
///
/// Names from the static element vocabulary are `&'static str` and compare
/// by pointer in the common case. Everything else is a shared, immutable
/// string; an [`AtomTable`] can be used to canonicalize those.
#[derive(Clone)]
pub enum Atom {
    Static(&'static str),
    Shared(Arc<str>),
}

impl Atom {
    pub const fn from_static(name: &'static str) -> Self {
        Atom::Static(name)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Atom::Static(name) => name,
            Atom::Shared(name) => name,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Atom::Static(_))
    }

    /// Re-homes a dynamic name in `interner`. Static names are returned as-is.
    pub fn reintern(&self, interner: &mut dyn NameInterner) -> Atom {
        match self {
            Atom::Static(_) => self.clone(),
            Atom::Shared(name) => interner.intern(name),
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.as_str(), other.as_str());
        (a.as_ptr() == b.as_ptr() && a.len() == b.len()) || a == b
    }
}

impl Eq for Atom {}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Deref for Atom {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Atom::Shared(Arc::from(name))
    }
}

impl From<String> for Atom {
    fn from(name: String) -> Self {
        Atom::Shared(Arc::from(name))
    }
}

/// Canonicalizes dynamic names so that equal names share one allocation.
pub trait NameInterner {
    fn intern(&mut self, name: &str) -> Atom;
}

/// The default [`NameInterner`].
#[derive(Debug, Default)]
pub struct AtomTable {
    names: FxHashSet<Arc<str>>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameInterner for AtomTable {
    fn intern(&mut self, name: &str) -> Atom {
        if let Some(known) = self.names.get(name) {
            return Atom::Shared(known.clone());
        }
        let shared: Arc<str> = Arc::from(name);
        self.names.insert(shared.clone());
        Atom::Shared(shared)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn static_and_shared_atoms_compare_by_contents() {
        let a = Atom::from_static("custom-element");
        let b = Atom::from("custom-element");
        assert_eq!(a, b);
        assert_ne!(a, Atom::from("custom-elements"));
        assert_eq!(b, "custom-element");
    }

    #[test]
    fn interning_shares_one_allocation() {
        let mut table = AtomTable::new();
        let first = table.intern("x-foo");
        let second = table.intern("x-foo");
        match (&first, &second) {
            (Atom::Shared(a), Atom::Shared(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("interned atoms must be shared"),
        }
        assert_eq!(1, table.len());
    }

    #[test]
    fn reintern_keeps_static_names() {
        let mut table = AtomTable::new();
        let atom = Atom::from_static("div");
        assert!(atom.reintern(&mut table).is_static());
        assert!(table.is_empty());
        assert!(!Atom::from("x-bar").reintern(&mut table).is_static());
        assert_eq!(1, table.len());
    }
}
