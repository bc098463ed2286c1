//! Runtime value store
//!
//! A `Storehouse` holds the current values of one logical owner. Ordered
//! identifiers live in a dense array indexed by raw id, sized once from the
//! registry. Every other identifier gets a sparse [`Data`] entry on first
//! touch. All writes go through [`Storehouse::oper`], which clamps, honours
//! hooks and then notifies the global and local listener buses.

use crate::engine::Engine;
use crate::evaluator::{Oper, Scope, ScopeMut};
use crate::listener::{deliver, Change, ListenerBus};
use crate::registry::{Id, NameRecord, ResetCycle};
use crate::semantic::{Condition, Formula};
use crate::workstation::{WorkstatLog, WorkstationId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// A sparse entry: the current value and the name it belongs to
#[derive(Debug, Clone)]
pub struct Data<'e> {
    value: f64,
    record: &'e NameRecord,
}

impl<'e> Data<'e> {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn record(&self) -> &'e NameRecord {
        self.record
    }

    pub fn id(&self) -> Id {
        self.record.id()
    }

    pub fn raw_id(&self) -> u32 {
        self.record.id().raw()
    }

    pub fn name(&self) -> &'e str {
        self.record.name()
    }

    pub fn cycle(&self) -> ResetCycle {
        self.record.cycle()
    }

    fn initial(&self) -> f64 {
        if self.record.cycle() == ResetCycle::Event {
            0.0
        } else {
            self.record.bounds().init
        }
    }
}

pub struct Storehouse<'e> {
    engine: &'e Engine,
    ordered: Vec<f64>,
    sparse: HashMap<Id, Data<'e>>,
    by_cycle: HashMap<ResetCycle, Vec<Id>>,
    owner: Option<Rc<dyn Any>>,
    listeners: ListenerBus,
    logs: HashMap<WorkstationId, WorkstatLog>,
}

impl<'e> Storehouse<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        let ordered_count = engine.registry().ordered_count() as usize;
        Self {
            engine,
            ordered: vec![0.0; ordered_count + 1],
            sparse: HashMap::new(),
            by_cycle: HashMap::new(),
            owner: None,
            listeners: ListenerBus::new(),
            logs: HashMap::new(),
        }
    }

    /// A store tagged with an opaque owner handle
    pub fn with_owner<T: Any>(engine: &'e Engine, owner: Rc<T>) -> Self {
        let mut store = Self::new(engine);
        store.owner = Some(owner);
        store
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// The owner handle, if one of type `T` was attached
    pub fn owner<T: Any>(&self) -> Option<Rc<T>> {
        self.owner.clone()?.downcast::<T>().ok()
    }

    /// The store-local listener bus
    pub fn listeners(&self) -> &ListenerBus {
        &self.listeners
    }

    /// Apply `op` with `value` to `id` and return the retained value.
    ///
    /// Listener failures are logged and never reach the caller.
    pub fn oper(&mut self, id: Id, op: Oper, value: f64) -> f64 {
        let engine = self.engine;
        let Some(record) = engine.registry().record(id) else {
            warn!(%id, "oper on unregistered identifier ignored");
            return 0.0;
        };

        let retained = if id.is_ordered() {
            self.oper_ordered(record, op, value)
        } else {
            self.oper_sparse(record, op, value)
        };

        let change = Change { id, oper: op, value };
        deliver(self, engine.listeners().snapshot(id), change);
        let local = self.listeners.snapshot(id);
        deliver(self, local, change);
        retained
    }

    fn oper_ordered(&mut self, record: &NameRecord, op: Oper, value: f64) -> f64 {
        let Some(slot) = self.ordered.get_mut(record.id().raw() as usize) else {
            return 0.0;
        };
        *slot = record.bounds().clamp(op.apply(*slot, value));
        *slot
    }

    fn oper_sparse(&mut self, record: &'e NameRecord, op: Oper, value: f64) -> f64 {
        let id = record.id();
        self.touch(record);

        if record.cycle() == ResetCycle::Event {
            return 0.0;
        }
        if let Some(hook) = record.set_hook() {
            return match hook(self, id, op, value) {
                Ok(retained) => {
                    if let Some(data) = self.sparse.get_mut(&id) {
                        data.value = retained;
                    }
                    retained
                }
                Err(err) => {
                    warn!(%id, name = record.name(), error = %err, "set hook failed, write ignored");
                    self.stored(id)
                }
            };
        }
        // A get hook without a set hook makes the name read-only
        if record.get_hook().is_some() {
            return self.stored(id);
        }

        let Some(data) = self.sparse.get_mut(&id) else {
            return 0.0;
        };
        data.value = record.bounds().clamp(op.apply(data.value, value));
        data.value
    }

    fn touch(&mut self, record: &'e NameRecord) {
        let id = record.id();
        if self.sparse.contains_key(&id) {
            return;
        }
        self.sparse.insert(id, Data { value: 0.0, record });
        self.by_cycle.entry(record.cycle()).or_default().push(id);
    }

    fn stored(&self, id: Id) -> f64 {
        self.sparse.get(&id).map_or(0.0, |data| data.value)
    }

    pub fn set(&mut self, id: Id, value: f64) -> f64 {
        self.oper(id, Oper::Set, value)
    }

    /// Current value of `id`: the dense slot, else the get hook, else the
    /// stored value, else 0
    pub fn get(&self, id: Id) -> f64 {
        if id.is_ordered() {
            return self.ordered.get(id.raw() as usize).copied().unwrap_or(0.0);
        }
        let Some(record) = self.engine.registry().record(id) else {
            return 0.0;
        };
        match record.get_hook() {
            Some(hook) => hook(self, id).unwrap_or_else(|err| {
                warn!(%id, name = record.name(), error = %err, "get hook failed");
                0.0
            }),
            None => self.stored(id),
        }
    }

    /// Value of a registered name; 0 when the name is unknown
    pub fn get_by_name(&self, name: &str) -> f64 {
        self.engine
            .registry()
            .id_by_name(name)
            .map_or(0.0, |id| self.get(id))
    }

    /// Restore `id` to its initial value without notifying listeners.
    ///
    /// Only touched sparse entries reset; ordered slots and untouched names
    /// are left alone and read 0.
    pub fn reset_by_id(&mut self, id: Id) -> f64 {
        match self.sparse.get_mut(&id) {
            Some(data) => {
                data.value = data.initial();
                data.value
            }
            None => 0.0,
        }
    }

    /// Restore every touched sparse entry; ordered slots keep their values
    pub fn reset(&mut self) {
        for data in self.sparse.values_mut() {
            data.value = data.initial();
        }
    }

    /// Restore the touched entries of one reset cycle
    pub fn reset_by_cycle(&mut self, cycle: ResetCycle) {
        let Some(ids) = self.by_cycle.get(&cycle) else {
            return;
        };
        for id in ids {
            if let Some(data) = self.sparse.get_mut(id) {
                data.value = data.initial();
            }
        }
    }

    /// The sparse entry of `id`, if it was ever touched
    pub fn data(&self, id: Id) -> Option<&Data<'e>> {
        self.sparse.get(&id)
    }

    /// Touched entries of one reset cycle, in first-touch order
    pub fn data_by_cycle(&self, cycle: ResetCycle) -> Vec<&Data<'e>> {
        self.by_cycle
            .get(&cycle)
            .map(|ids| ids.iter().filter_map(|id| self.sparse.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn check(&self, condition: &Condition) -> bool {
        condition.check(self)
    }

    pub fn evaluate(&self, formula: &Formula) -> f64 {
        formula.evaluate(self)
    }

    pub(crate) fn log(&self, workstation: WorkstationId) -> Option<&WorkstatLog> {
        self.logs.get(&workstation)
    }

    pub(crate) fn log_mut(&mut self, workstation: WorkstationId) -> &mut WorkstatLog {
        self.logs.entry(workstation).or_default()
    }
}

impl Scope for Storehouse<'_> {
    fn value(&self, id: Id) -> f64 {
        self.get(id)
    }
}

impl ScopeMut for Storehouse<'_> {
    fn apply(&mut self, id: Id, op: Oper, operand: f64) -> f64 {
        self.oper(id, op, operand)
    }
}

impl fmt::Debug for Storehouse<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storehouse")
            .field("ordered", &self.ordered)
            .field("sparse", &self.sparse)
            .field("has_owner", &self.owner.is_some())
            .field("listeners", &self.listeners)
            .finish()
    }
}
