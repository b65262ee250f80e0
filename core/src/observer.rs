use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::GameState;

/// Shared, immutable view of one committed state.
pub type Snapshot = Arc<GameState>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Snapshot) + Send>;

/// Subscribers notified synchronously, in subscription order, on every commit.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    subscribers: BTreeMap<SubscriptionId, Callback>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, callback);
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub(crate) fn notify(&mut self, snapshot: &Snapshot) {
        for callback in self.subscribers.values_mut() {
            callback(snapshot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

impl core::fmt::Debug for Observers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observers")
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
