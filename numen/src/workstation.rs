//! Execution coordinator
//!
//! A `Workstation` runs operation sets and processes against a store and
//! remembers, per store, which identifiers it produced and which
//! conditions it watches. The workstation itself holds no state beyond its
//! identity: the bookkeeping lives in the store's [`WorkstatLog`].

use crate::ast::ExpressionId;
use crate::error::CallbackError;
use crate::evaluator::check_condition;
use crate::listener::{Change, ListenFn, ListenerKey};
use crate::registry::Id;
use crate::semantic::{Condition, OperationSet, Process};
use crate::storehouse::Storehouse;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkstationId(u64);

impl WorkstationId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WorkstationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws_{}", self.0)
    }
}

/// Bookkeeping of one workstation against one store
#[derive(Debug, Default)]
pub(crate) struct WorkstatLog {
    /// Expressions whose targets were already recorded
    tracked: HashSet<ExpressionId>,
    produced: IndexSet<Id>,
    watches: HashMap<ExpressionId, Vec<(Id, ListenerKey)>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workstation {
    id: WorkstationId,
}

impl Workstation {
    pub(crate) fn new(id: WorkstationId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> WorkstationId {
        self.id
    }

    /// Run every statement of `operations` against `store`.
    ///
    /// With `track`, the first run of this operation set records its
    /// targets as produced by this workstation.
    pub fn exec_oper(&self, store: &mut Storehouse<'_>, operations: &OperationSet, track: bool) {
        if track {
            let targets = operations.operations.iter().map(|operation| operation.target);
            self.record_produced(store, operations.id, targets);
        }
        operations.execute(store);
    }

    /// Load, execute and save `process`, returning its return slot.
    ///
    /// Tracking records the global identifiers the process assigns.
    pub fn exec_proc(&self, store: &mut Storehouse<'_>, process: &Process, track: bool) -> f64 {
        if track {
            self.record_produced(store, process.id, process.global_targets());
        }
        let trace = store.engine().config().trace_steps;
        process.run(store, trace)
    }

    fn record_produced(
        &self,
        store: &mut Storehouse<'_>,
        expression: ExpressionId,
        targets: impl IntoIterator<Item = Id>,
    ) {
        let log = store.log_mut(self.id);
        if log.tracked.insert(expression) {
            log.produced.extend(targets);
        }
    }

    /// Identifiers this workstation produced in `store`, in first-seen order
    pub fn produced(&self, store: &Storehouse<'_>) -> Vec<Id> {
        store
            .log(self.id)
            .map(|log| log.produced.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Reset the identifiers this workstation produced in `store`; ordered
    /// targets keep their values, as with [`Storehouse::reset_by_id`]
    pub fn reset_my_data(&self, store: &mut Storehouse<'_>) {
        for id in self.produced(store) {
            store.reset_by_id(id);
        }
    }

    /// Watch `condition` in `store`.
    ///
    /// Installs one local listener per distinct identifier in the
    /// condition. Each mutation of any of them re-checks the whole
    /// condition and calls `callback` with `extra` while it holds, so the
    /// callback fires on every qualifying mutation, not only on the
    /// transition to true. Watching the same condition instance again is a
    /// no-op.
    pub fn listen_cond<P: 'static>(
        &self,
        store: &mut Storehouse<'_>,
        condition: &Condition,
        callback: impl Fn(&mut Storehouse<'_>, &P) -> Result<(), CallbackError> + 'static,
        extra: P,
    ) {
        if self.is_listening(store, condition) {
            return;
        }

        let ids: IndexSet<Id> = condition.referenced_ids().into_iter().collect();
        if ids.is_empty() {
            warn!(condition = %condition, "watched condition references no names");
        }

        let watched = Rc::new(condition.root.clone());
        let listener: ListenFn = Rc::new(move |store: &mut Storehouse<'_>, _: Change| {
            if check_condition(&watched, &*store) {
                callback(store, &extra)
            } else {
                Ok(())
            }
        });

        let keys = ids
            .into_iter()
            .map(|id| (id, store.listeners().add_shared(id, listener.clone())))
            .collect();
        store.log_mut(self.id).watches.insert(condition.id, keys);
    }

    /// Remove the listeners installed for `condition`. Returns whether the
    /// condition was being watched.
    pub fn cancel_cond_listen(&self, store: &mut Storehouse<'_>, condition: &Condition) -> bool {
        let Some(keys) = store.log_mut(self.id).watches.remove(&condition.id) else {
            return false;
        };
        for (id, key) in keys {
            store.listeners().remove(id, key);
        }
        true
    }

    pub fn is_listening(&self, store: &Storehouse<'_>, condition: &Condition) -> bool {
        store
            .log(self.id)
            .is_some_and(|log| log.watches.contains_key(&condition.id))
    }
}
