use fractal_domain::{OwnerId, ProjectChange, ProjectChangeSink, SubscriptionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

struct Subscriber {
    owner_id: OwnerId,
    sink: ProjectChangeSink,
}

/// Push-subscription registry, filtered by owner.
#[derive(Default)]
pub(crate) struct Subscriptions {
    next_id: AtomicU64,
    entries: Mutex<HashMap<SubscriptionId, Subscriber>>,
}

impl Subscriptions {
    pub(crate) fn add(&self, owner_id: OwnerId, sink: ProjectChangeSink) -> SubscriptionId {
        let id = SubscriptionId::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries().insert(id, Subscriber { owner_id, sink });
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        self.entries().remove(&id).is_some()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    pub(crate) fn notify(&self, owner_id: &OwnerId, change: &ProjectChange) {
        // Sinks run outside the lock so they may unsubscribe.
        let sinks = self
            .entries()
            .values()
            .filter(|s| &s.owner_id == owner_id)
            .map(|s| s.sink.clone())
            .collect::<Vec<_>>();
        for sink in sinks {
            sink(change.clone());
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Subscriber>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
