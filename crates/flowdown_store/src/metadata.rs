//! Property declarations and their resolution.
//!
//! A component type declares, per local property, how the property links to
//! the store. Component types can refine a base type's declarations, so a
//! component carries a [`MetadataChain`]: one [`Declarations`] set per level,
//! from the most general base to the component's own type. [`collect`]
//! flattens the chain into the effective [`Properties`].

use std::sync::Arc;

use flowdown_foundation::ValueKind;

/// How one local property links to the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyMeta {
    /// Path of the bound value, relative to the tree root.
    pub link_state: Option<Arc<str>>,
    /// Name of the local property holding the items of a selection.
    pub link_array: Option<Arc<str>>,
    /// Name of the local property holding the selected index.
    pub link_index: Option<Arc<str>>,
    /// Declared kind of the property.
    pub kind: Option<ValueKind>,
}

impl PropertyMeta {
    /// Creates a declaration with no links.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a declaration linked to a tree path.
    #[must_use]
    pub fn linked(path: impl Into<Arc<str>>) -> Self {
        Self {
            link_state: Some(path.into()),
            ..Self::default()
        }
    }

    /// Creates a selection declaration: the property mirrors
    /// `items[index]`, naming the two local properties involved.
    #[must_use]
    pub fn selection(items: impl Into<Arc<str>>, index: impl Into<Arc<str>>) -> Self {
        Self {
            link_array: Some(items.into()),
            link_index: Some(index.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the declared kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns true if the property declares an ordered sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.kind.is_some_and(ValueKind::is_sequence)
    }
}

/// Ordered property declarations, keyed by property name.
///
/// Keeps declaration order; a later entry for an existing name replaces the
/// earlier one in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(Arc<str>, PropertyMeta)>,
}

impl Properties {
    /// Creates an empty declaration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to declare a property.
    #[must_use]
    pub fn with(mut self, name: impl Into<Arc<str>>, meta: PropertyMeta) -> Self {
        self.insert(name, meta);
        self
    }

    /// Declares a property, replacing any earlier declaration of the name.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, meta: PropertyMeta) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = meta,
            None => self.entries.push((name, meta)),
        }
    }

    /// Returns the declaration of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyMeta> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, meta)| meta)
    }

    /// Returns the number of declared properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &PropertyMeta)> {
        self.entries.iter().map(|(name, meta)| (name, meta))
    }
}

/// One level of a metadata chain.
pub type Declarations = Properties;

/// The declarations of a component type and its bases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataChain {
    levels: Vec<Declarations>,
}

impl MetadataChain {
    /// Creates a chain with a single level.
    #[must_use]
    pub fn new(declarations: Declarations) -> Self {
        Self {
            levels: vec![declarations],
        }
    }

    /// Builder method adding a level more specific than every existing one.
    #[must_use]
    pub fn refine(mut self, declarations: Declarations) -> Self {
        self.levels.push(declarations);
        self
    }

    /// Returns the levels from most general to most specific.
    #[must_use]
    pub fn levels(&self) -> &[Declarations] {
        &self.levels
    }
}

impl From<Declarations> for MetadataChain {
    fn from(declarations: Declarations) -> Self {
        Self::new(declarations)
    }
}

/// Flattens a chain into the effective declarations.
///
/// Levels are merged from most general to most specific and the most specific
/// declaration of a name wins as a whole; fields are not merged across levels.
#[must_use]
pub fn collect(chain: &MetadataChain) -> Properties {
    let mut merged = Properties::new();
    for level in chain.levels() {
        for (name, meta) in level.iter() {
            merged.insert(Arc::clone(name), meta.clone());
        }
    }
    merged
}
