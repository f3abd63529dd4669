//! Per-plan fan-out of execution state changes.
//!
//! Delivery is synchronous and in subscription order. A listener that returns
//! an error or panics is logged and skipped; the remaining listeners and the
//! scheduler are unaffected.

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError, Weak},
};

use log::warn;

use crate::models::ExecutionState;

/// Callback invoked with a snapshot after every state transition.
pub type Listener = Arc<dyn Fn(&ExecutionState) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    by_plan: HashMap<String, Vec<(u64, Listener)>>,
}

/// Registry of listeners keyed by plan ID.
#[derive(Clone, Default)]
pub struct ObserverBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

/// Handle returned by [`ObserverBus::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    plan_id: String,
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    /// Removes the listener. Safe to call after the plan has finished.
    pub fn unsubscribe(self) {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return;
        };
        let mut guard = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(listeners) = guard.by_plan.get_mut(&self.plan_id) {
            listeners.retain(|(id, _)| *id != self.id);
            if listeners.is_empty() {
                guard.by_plan.remove(&self.plan_id);
            }
        }
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for state changes of `plan_id`.
    pub fn subscribe<F>(&self, plan_id: &str, listener: F) -> Subscription
    where
        F: Fn(&ExecutionState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut guard = self.lock();
        guard.next_id += 1;
        let id = guard.next_id;
        guard
            .by_plan
            .entry(plan_id.to_string())
            .or_default()
            .push((id, Arc::new(listener)));

        Subscription {
            plan_id: plan_id.to_string(),
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Delivers `state` to every listener of `plan_id`.
    ///
    /// The subscriber list is copied before delivery, so listeners may
    /// subscribe, unsubscribe or query the engine from inside the callback.
    pub fn notify(&self, plan_id: &str, state: &ExecutionState) {
        let listeners: Vec<Listener> = match self.lock().by_plan.get(plan_id) {
            Some(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(state))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Listener for plan '{plan_id}' failed: {e:#}"),
                Err(_) => warn!("Listener for plan '{plan_id}' panicked"),
            }
        }
    }

    /// Number of listeners registered for `plan_id`.
    pub fn listener_count(&self, plan_id: &str) -> usize {
        self.lock().by_plan.get(plan_id).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
