//! Owned holder for the single `ViewState`.
//!
//! The store performs no validation. Callers hand it values that are already
//! clamped, and every `update` notifies listeners exactly once.

use std::fmt;

use tracing::trace;

use crate::{ViewState, ViewStateUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ViewState)>;

#[derive(Default)]
pub struct ViewStore {
    state: ViewState,
    loading: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for ViewStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStore")
            .field("state", &self.state)
            .field("loading", &self.loading)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ViewStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.state
    }

    /// Merge `partial` into the current state and notify listeners.
    ///
    /// Returns whether the merged state differs from the previous one.
    pub fn update(&mut self, partial: ViewStateUpdate) -> bool {
        let changed = self.state.merge(&partial);
        trace!(?partial, changed, state = ?self.state, "view state merged");
        let snapshot = self.state;
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
        changed
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            trace!(loading, "loading flag changed");
        }
        self.loading = loading;
    }
}
