//! Per-identifier change subscriptions
//!
//! There are two tiers: the engine owns one global bus shared by every
//! store, and each `Storehouse` owns a local bus. Both see every `oper`
//! call with the same [`Change`], global first. Within one identifier,
//! subscribers are called in registration order.

use crate::error::CallbackError;
use crate::evaluator::Oper;
use crate::registry::Id;
use crate::storehouse::Storehouse;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// A mutation as seen by listeners: the operator and its operand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub id: Id,
    pub oper: Oper,
    pub value: f64,
}

pub type ListenFn = Rc<dyn Fn(&mut Storehouse<'_>, Change) -> Result<(), CallbackError>>;

/// Handle of one subscription.
///
/// Subscriptions are keyed by handle, so adding the same closure twice
/// yields two independent subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(u64);

#[derive(Default)]
pub struct ListenerBus {
    subscribers: RefCell<HashMap<Id, Vec<(ListenerKey, ListenFn)>>>,
    next_key: Cell<u64>,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        id: Id,
        callback: impl Fn(&mut Storehouse<'_>, Change) -> Result<(), CallbackError> + 'static,
    ) -> ListenerKey {
        self.add_shared(id, Rc::new(callback))
    }

    pub fn add_shared(&self, id: Id, callback: ListenFn) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.subscribers
            .borrow_mut()
            .entry(id)
            .or_default()
            .push((key, callback));
        key
    }

    /// Remove one subscription. Returns whether it existed.
    pub fn remove(&self, id: Id, key: ListenerKey) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(entries) = subscribers.get_mut(&id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != key);
        let removed = entries.len() != before;
        if entries.is_empty() {
            subscribers.remove(&id);
        }
        removed
    }

    /// Drop every subscription of `id`, returning how many there were
    pub fn remove_by_id(&self, id: Id) -> usize {
        self.subscribers
            .borrow_mut()
            .remove(&id)
            .map_or(0, |entries| entries.len())
    }

    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
    }

    pub fn subscriber_count(&self, id: Id) -> usize {
        self.subscribers.borrow().get(&id).map_or(0, Vec::len)
    }

    pub fn total_count(&self) -> usize {
        self.subscribers.borrow().values().map(Vec::len).sum()
    }

    /// Snapshot of the callbacks of `id`, so delivery may re-enter the bus
    pub(crate) fn snapshot(&self, id: Id) -> Vec<ListenFn> {
        self.subscribers
            .borrow()
            .get(&id)
            .map(|entries| entries.iter().map(|(_, callback)| callback.clone()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ListenerBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBus")
            .field("subscribers", &self.total_count())
            .finish()
    }
}

/// Call each callback in order. Failures are logged and delivery continues.
pub(crate) fn deliver(store: &mut Storehouse<'_>, callbacks: Vec<ListenFn>, change: Change) {
    for callback in callbacks {
        if let Err(err) = callback(store, change) {
            warn!(id = %change.id, oper = %change.oper, error = %err, "listener callback failed");
        }
    }
}
