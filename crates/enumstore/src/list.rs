#![forbid(unsafe_code)]

//! Shared, in-place-updated containers.
//!
//! [`EnumList`] and [`GetterViews`] are cheap-clone handles over
//! `Rc<RefCell<..>>` storage. Every clone aliases the same container, so a
//! handle obtained before an update observes the post-update contents — the
//! registry overwrites containers in place, it never replaces them.
//!
//! # Invariants
//!
//! 1. Cloning a handle never copies the underlying container.
//! 2. The public API of both types is read-only; only the registry mutates
//!    the contents (crate-private [`EnumList::overwrite`]).
//! 3. Overwriting preserves container identity: [`EnumList::same_list`]
//!    stays true across any number of updates.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::entity::{Entity, EnumId};

/// A shared, ordered sequence of entities, overwritten in place on update.
///
/// Cloning creates a new handle to the **same** container.
#[derive(Clone, Default)]
pub struct EnumList {
    inner: Rc<RefCell<Vec<Entity>>>,
}

impl EnumList {
    pub(crate) fn from_entities(entities: Vec<Entity>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(entities)),
        }
    }

    /// Clear the container, then append every item in order. The container
    /// identity is unchanged; all aliasing handles see the new contents.
    pub(crate) fn overwrite(&self, entities: impl IntoIterator<Item = Entity>) {
        let mut slot = self.inner.borrow_mut();
        slot.clear();
        slot.extend(entities);
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Entity at `index`, cloned out.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Entity> {
        self.inner.borrow().get(index).cloned()
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Entity> {
        self.inner.borrow().clone()
    }

    /// Access the current contents by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure mutates the registry that owns this list
    /// (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&[Entity]) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// First entity with the given identifier.
    #[must_use]
    pub fn find(&self, id: &EnumId) -> Option<Entity> {
        self.inner.borrow().iter().find(|e| &e.id == id).cloned()
    }

    /// Display value of the first entity with the given identifier.
    #[must_use]
    pub fn value_of(&self, id: &EnumId) -> Option<String> {
        self.inner
            .borrow()
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.value.clone())
    }

    /// Whether any entity carries the given identifier.
    #[must_use]
    pub fn contains(&self, id: &EnumId) -> bool {
        self.inner.borrow().iter().any(|e| &e.id == id)
    }

    /// Whether two handles alias the same container.
    #[must_use]
    pub fn same_list(&self, other: &EnumList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for EnumList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumList").field(&self.inner.borrow()).finish()
    }
}

/// A shared mapping from view name to its [`EnumList`].
///
/// Cloning creates a new handle to the **same** map. Views are inserted when
/// their predicate is registered and their containers persist across
/// recomputation.
#[derive(Clone, Default)]
pub struct GetterViews {
    inner: Rc<RefCell<AHashMap<String, EnumList>>>,
}

impl GetterViews {
    /// View for `name`, inserting an empty one for a new name. Existing
    /// views keep their container.
    pub(crate) fn ensure(&self, name: &str) -> EnumList {
        let mut map = self.inner.borrow_mut();
        if let Some(view) = map.get(name) {
            return view.clone();
        }
        let view = EnumList::default();
        map.insert(name.to_string(), view.clone());
        view
    }

    /// View registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<EnumList> {
        self.inner.borrow().get(name).cloned()
    }

    /// Registered view names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether no view is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl fmt::Debug for GetterViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.borrow();
        let mut entries: Vec<(&String, &EnumList)> = map.iter().collect();
        entries.sort_by_key(|(name, _)| name.as_str());
        f.debug_map().entries(entries).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
