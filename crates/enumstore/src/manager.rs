#![forbid(unsafe_code)]

//! The enum registry state machine.
//!
//! [`EnumsManager`] owns a fixed seed dataset, a working dataset served to
//! readers, name→id symbol aliases, named filtered views recomputed on every
//! update, subscriber callbacks, and an optional remote fetch procedure
//! behind a four-state lazy-load gate.
//!
//! # Architecture
//!
//! The manager is a cheap-clone handle over `Rc<RefCell<..>>` shared state;
//! clones share everything. All mutation and read logic is synchronous. The
//! only asynchronous piece is the user-supplied fetch procedure, driven as a
//! local task: triggering a fetch requires a current-thread runtime inside a
//! [`tokio::task::LocalSet`]. Reads never block — they return the current
//! (possibly pre-fetch) contents immediately.
//!
//! # Invariants
//!
//! 1. The working set always contains every seed entry as an (id, value)
//!    match; [`update_enums`](EnumsManager::update_enums) rejects datasets
//!    that break this.
//! 2. Symbols resolve against the seed set at assignment time.
//! 3. After any successful update, every view equals the filter of the
//!    working set by its predicate, and views are recomputed before any
//!    subscriber runs.
//! 4. Subscribers fire in registration order, exactly once per update.
//! 5. The lazy fetch is attempted only in [`LoadState::Wait`]; redundant
//!    triggers while `Loading` or `Finish` are no-ops, so overlapping
//!    readers collapse onto a single in-flight fetch.
//! 6. Containers are overwritten in place, never replaced: handles obtained
//!    before an update observe the post-update contents.
//!
//! # Failure Modes
//!
//! - **Fetch procedure fails**: the state reverts to `Wait` so the next read
//!   retries; the failure is logged at `warn` level and is otherwise
//!   unobserved. Pending [`wait_for_enums`](EnumsManager::wait_for_enums)
//!   callers stay pending until a later fetch succeeds.
//! - **Fetched dataset drops a seed entry**: treated like a fetch failure
//!   (state back to `Wait`, logged), since the rejection happens inside the
//!   fetch continuation.
//! - **Fetch never resolves**: the manager stays in `Loading` forever and
//!   pending waiters never resolve. There is no timeout.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tokio::sync::oneshot;

use crate::entity::{Entity, EnumId};
use crate::error::{EnumsError, Result};
use crate::list::{EnumList, GetterViews};

/// Remote-load lifecycle of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No remote fetch configured; reads serve the working set directly.
    Empty,
    /// Fetch configured but not yet triggered.
    Wait,
    /// Fetch in flight.
    Loading,
    /// Fetch completed successfully at least once.
    Finish,
}

/// Predicate deciding membership of one entity in a named view.
///
/// Receives the entity, its index, and the full working set, enabling
/// position- and context-aware filters.
pub type GetterFn = Box<dyn Fn(&Entity, usize, &[Entity]) -> bool>;

type FetchFn = Rc<dyn Fn() -> LocalBoxFuture<'static, anyhow::Result<Vec<Entity>>>>;
type SubscriberFn = Box<dyn FnMut(&EnumList)>;

struct Inner {
    /// Baseline entries guaranteed present in every future dataset.
    seed: Vec<Entity>,
    /// Live dataset served to readers and view recomputation.
    working: EnumList,
    /// Name → id aliases, validated against the seed.
    symbols: AHashMap<String, EnumId>,
    /// Named filtered projections of the working set.
    views: GetterViews,
    /// Predicates retained for recomputation on every update.
    predicates: AHashMap<String, GetterFn>,
    /// Update callbacks in registration order. Never removed.
    subscribers: Vec<SubscriberFn>,
    /// Remote fetch procedure; defaults to an empty dataset.
    fetch: FetchFn,
    state: LoadState,
}

/// In-process registry for enumeration reference data with lazy remote
/// loading, named filtered views, symbol aliases, and update subscribers.
///
/// Cloning creates a new handle to the **same** registry.
///
/// Predicates and subscribers run while the registry is mid-mutation and
/// must not call back into it; a re-entrant mutation from a predicate
/// panics, and one from a subscriber skips notification for that cycle.
pub struct EnumsManager {
    inner: Rc<RefCell<Inner>>,
}

impl Clone for EnumsManager {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for EnumsManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for EnumsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EnumsManager")
            .field("state", &inner.state)
            .field("seed_len", &inner.seed.len())
            .field("working", &inner.working)
            .field("views", &inner.views)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl EnumsManager {
    /// Create a registry whose working set starts as a copy of `seed`.
    #[must_use]
    pub fn new(seed: Vec<Entity>) -> Self {
        let working = EnumList::from_entities(seed.clone());
        Self {
            inner: Rc::new(RefCell::new(Inner {
                seed,
                working,
                symbols: AHashMap::new(),
                views: GetterViews::default(),
                predicates: AHashMap::new(),
                subscribers: Vec::new(),
                fetch: Rc::new(|| futures::future::ready(Ok(Vec::new())).boxed_local()),
                state: LoadState::Empty,
            })),
        }
    }

    /// The live working set. Triggers the lazy-load check first; if a fetch
    /// is armed it starts in the background and the pre-fetch contents are
    /// returned immediately.
    #[must_use]
    pub fn enums(&self) -> EnumList {
        self.load();
        self.inner.borrow().working.clone()
    }

    /// The live view map. Triggers the lazy-load check, like
    /// [`enums`](Self::enums).
    #[must_use]
    pub fn getters(&self) -> GetterViews {
        self.load();
        self.inner.borrow().views.clone()
    }

    /// Current load state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.inner.borrow().state
    }

    /// Copy of the seed set.
    #[must_use]
    pub fn seed(&self) -> Vec<Entity> {
        self.inner.borrow().seed.clone()
    }

    /// Copy of the symbol table.
    #[must_use]
    pub fn symbols(&self) -> AHashMap<String, EnumId> {
        self.inner.borrow().symbols.clone()
    }

    /// Identifier aliased by `name`, if assigned.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<EnumId> {
        self.inner.borrow().symbols.get(name).cloned()
    }

    /// Resolve a symbol through the current working set.
    #[must_use]
    pub fn entity_for_symbol(&self, name: &str) -> Option<Entity> {
        let id = self.symbol(name)?;
        self.enums().find(&id)
    }

    /// Assign symbol aliases. Every identifier must match a seed entry's id,
    /// otherwise [`EnumsError::SymbolNotInSeed`] is returned and the table
    /// is left unchanged. Existing names are overwritten.
    pub fn set_symbols<S, I>(&self, symbols: I) -> Result<&Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, EnumId)>,
    {
        let staged: Vec<(String, EnumId)> = symbols
            .into_iter()
            .map(|(name, id)| (name.into(), id))
            .collect();
        let mut inner = self.inner.borrow_mut();
        for (name, id) in &staged {
            if !inner.seed.iter().any(|e| &e.id == id) {
                return Err(EnumsError::SymbolNotInSeed {
                    name: name.clone(),
                    id: id.clone(),
                });
            }
        }
        for (name, id) in staged {
            inner.symbols.insert(name, id);
        }
        Ok(self)
    }

    /// Register one named view predicate. See [`set_getters`](Self::set_getters).
    pub fn set_getter(
        &self,
        name: impl Into<String>,
        predicate: impl Fn(&Entity, usize, &[Entity]) -> bool + 'static,
    ) -> &Self {
        self.set_getters([(name.into(), Box::new(predicate) as GetterFn)])
    }

    /// Register view predicates. New names get an empty view container;
    /// same-named predicates are overwritten while their view container is
    /// kept. All views are recomputed immediately against the current
    /// working set.
    pub fn set_getters<S, I>(&self, getters: I) -> &Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, GetterFn)>,
    {
        let staged: Vec<(String, GetterFn)> = getters
            .into_iter()
            .map(|(name, predicate)| (name.into(), predicate))
            .collect();
        {
            let mut inner = self.inner.borrow_mut();
            for (name, predicate) in staged {
                inner.views.ensure(&name);
                inner.predicates.insert(name, predicate);
            }
        }
        self.refresh_getters();
        self
    }

    /// Register an update callback, invoked with the working set after every
    /// successful update, in registration order. There is no unsubscribe.
    pub fn subscribe(&self, callback: impl FnMut(&EnumList) + 'static) -> &Self {
        self.inner.borrow_mut().subscribers.push(Box::new(callback));
        self
    }

    /// Replace the whole dataset. The input must retain every seed entry as
    /// an (id, value) match, otherwise [`EnumsError::SeedNotRetained`] is
    /// returned with no side effects. On success, in order: the working set
    /// is overwritten in place, every view is recomputed, every subscriber
    /// is notified.
    ///
    /// This is the single authoritative mutation path; the lazy-load success
    /// path routes through it too.
    pub fn update_enums(&self, entities: Vec<Entity>) -> Result<&Self> {
        {
            let inner = self.inner.borrow();
            for seeded in &inner.seed {
                if !entities.iter().any(|e| seeded.matches(e)) {
                    return Err(EnumsError::SeedNotRetained {
                        id: seeded.id.clone(),
                        value: seeded.value.clone(),
                    });
                }
            }
            inner.working.overwrite(entities);
        }
        self.refresh_getters();
        self.notify_subscribers();
        Ok(self)
    }

    /// Register the remote fetch procedure and arm lazy loading: the state
    /// becomes [`LoadState::Wait`], even after a previous fetch reached
    /// `Finish`, so a subsequent read re-fetches.
    pub fn set_fetch_callback<F, Fut>(&self, fetch: F) -> &Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<Vec<Entity>>> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.fetch = Rc::new(move || fetch().boxed_local());
        let previous = inner.state;
        inner.state = LoadState::Wait;
        tracing::debug!(message = "enums.fetch_armed", ?previous);
        self
    }

    /// Wait for the first completed fetch.
    ///
    /// Resolves immediately with the working set when no fetch is configured
    /// (`Empty`) or one already completed (`Finish`). Otherwise registers a
    /// one-shot resolution subscriber and triggers the lazy load; overlapping
    /// callers collapse onto the single in-flight fetch and all resolve with
    /// the working set as of the completing update. The resolution
    /// subscriber entry is never removed — later fires are no-ops.
    pub async fn wait_for_enums(&self) -> EnumList {
        {
            let inner = self.inner.borrow();
            if matches!(inner.state, LoadState::Empty | LoadState::Finish) {
                return inner.working.clone();
            }
        }
        let (sender, receiver) = oneshot::channel();
        let mut slot = Some(sender);
        self.subscribe(move |enums: &EnumList| {
            if let Some(sender) = slot.take() {
                let _ = sender.send(enums.clone());
            }
        });
        self.load();
        receiver
            .await
            .expect("manager keeps the resolving subscriber alive while a waiter is pending")
    }

    /// Lazy fetch trigger: no-op unless the state is exactly `Wait`.
    ///
    /// Spawns the fetch as a local task, so the caller must be running
    /// inside a `LocalSet` whenever a fetch is armed.
    fn load(&self) {
        let fetch = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != LoadState::Wait {
                return;
            }
            inner.state = LoadState::Loading;
            Rc::clone(&inner.fetch)
        };
        tracing::debug!(message = "enums.load", from = "wait", to = "loading");
        let manager = self.clone();
        tokio::task::spawn_local(async move {
            match fetch().await {
                Ok(entities) => match manager.update_enums(entities) {
                    Ok(_) => {
                        manager.inner.borrow_mut().state = LoadState::Finish;
                        tracing::debug!(message = "enums.load", from = "loading", to = "finish");
                    }
                    Err(err) => {
                        manager.inner.borrow_mut().state = LoadState::Wait;
                        tracing::warn!(error = %err, "fetched enums rejected; state reverted to wait");
                    }
                },
                Err(err) => {
                    manager.inner.borrow_mut().state = LoadState::Wait;
                    tracing::warn!(error = %err, "enum fetch failed; will retry on next read");
                }
            }
        });
    }

    /// Recompute every registered view against the working set. Views are
    /// overwritten in place; names are processed in map order (views are
    /// independent).
    fn refresh_getters(&self) {
        let inner = self.inner.borrow();
        inner.working.with(|all| {
            for (name, predicate) in &inner.predicates {
                let filtered: Vec<Entity> = all
                    .iter()
                    .enumerate()
                    .filter(|(index, entity)| predicate(entity, *index, all))
                    .map(|(_, entity)| entity.clone())
                    .collect();
                inner.views.ensure(name).overwrite(filtered);
            }
        });
    }

    /// Invoke subscribers in registration order with the working set.
    ///
    /// The list is taken out for the duration of the cycle, so subscribers
    /// registered mid-notification join subsequent cycles only.
    fn notify_subscribers(&self) {
        let (mut notifying, working) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.subscribers), inner.working.clone())
        };
        for callback in &mut notifying {
            callback(&working);
        }
        let mut inner = self.inner.borrow_mut();
        let registered_during = std::mem::take(&mut inner.subscribers);
        notifying.extend(registered_during);
        inner.subscribers = notifying;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
