//! In-process view invalidation bus.
//!
//! # Responsibility
//! - Carry "this view is stale" signals from mutating services to renderers.
//! - Track a generation counter per scope so caches can detect staleness
//!   without a subscription.
//!
//! # Invariants
//! - Signals carry no payload, only a [`ViewScope`].
//! - `Layout` covers every view: it advances the effective generation of all
//!   scopes and reaches every subscriber.
//! - Subscriber callbacks run after the bus lock is released.

use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Named region whose rendered output must be rebuilt from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewScope {
    /// The home page task list.
    Home,
    /// The whole layout, including modals shared across pages.
    Layout,
}

impl ViewScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Layout => "layout",
        }
    }

    fn covers(self, other: ViewScope) -> bool {
        self == Self::Layout || self == other
    }
}

impl Display for ViewScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of invalidation signals.
pub trait InvalidationSubscriber: Send + Sync {
    fn on_invalidated(&self, scope: ViewScope);
}

impl<F> InvalidationSubscriber for F
where
    F: Fn(ViewScope) + Send + Sync,
{
    fn on_invalidated(&self, scope: ViewScope) {
        self(scope)
    }
}

#[derive(Default)]
struct BusState {
    published: BTreeMap<ViewScope, u64>,
    subscribers: Vec<(ViewScope, Arc<dyn InvalidationSubscriber>)>,
}

/// Cloneable handle to one process-wide bus.
#[derive(Clone, Default)]
pub struct InvalidationBus {
    state: Arc<Mutex<BusState>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber` for `scope`. Layout signals always reach it.
    pub fn subscribe(&self, scope: ViewScope, subscriber: Arc<dyn InvalidationSubscriber>) {
        self.lock().subscribers.push((scope, subscriber));
    }

    /// Declares `scope` stale and notifies matching subscribers.
    pub fn publish(&self, scope: ViewScope) {
        let targets = {
            let mut state = self.lock();
            *state.published.entry(scope).or_insert(0) += 1;
            state
                .subscribers
                .iter()
                .filter(|(subscribed, _)| scope.covers(*subscribed))
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect::<Vec<_>>()
        };

        debug!(
            "event=view_invalidate module=view scope={} subscribers={}",
            scope,
            targets.len()
        );
        for subscriber in targets {
            subscriber.on_invalidated(scope);
        }
    }

    /// Effective generation of `scope`; changes whenever a covering signal is
    /// published.
    pub fn generation(&self, scope: ViewScope) -> u64 {
        let state = self.lock();
        state
            .published
            .iter()
            .filter(|(published, _)| published.covers(scope))
            .map(|(_, count)| *count)
            .sum()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        // Bus state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidationBus, ViewScope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_advances_generation_of_scope_only() {
        let bus = InvalidationBus::new();
        bus.publish(ViewScope::Home);
        assert_eq!(bus.generation(ViewScope::Home), 1);
        assert_eq!(bus.generation(ViewScope::Layout), 0);
    }

    #[test]
    fn layout_signal_advances_every_scope() {
        let bus = InvalidationBus::new();
        bus.publish(ViewScope::Home);
        bus.publish(ViewScope::Layout);
        assert_eq!(bus.generation(ViewScope::Home), 2);
        assert_eq!(bus.generation(ViewScope::Layout), 1);
    }

    #[test]
    fn subscribers_receive_matching_and_layout_signals() {
        let bus = InvalidationBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(
            ViewScope::Home,
            Arc::new(move |scope: ViewScope| sink.lock().expect("sink lock").push(scope)),
        );

        bus.publish(ViewScope::Home);
        bus.publish(ViewScope::Layout);

        let seen = seen.lock().expect("seen lock");
        assert_eq!(*seen, vec![ViewScope::Home, ViewScope::Layout]);
    }

    #[test]
    fn home_signal_does_not_reach_layout_subscribers() {
        let bus = InvalidationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bus.subscribe(
            ViewScope::Layout,
            Arc::new(move |_: ViewScope| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.publish(ViewScope::Home);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        bus.publish(ViewScope::Layout);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_one_bus() {
        let bus = InvalidationBus::new();
        let clone = bus.clone();
        clone.publish(ViewScope::Home);
        assert_eq!(bus.generation(ViewScope::Home), 1);
    }
}
