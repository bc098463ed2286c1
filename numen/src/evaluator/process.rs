//! Process execution
//!
//! A process runs against its own scratch array in three phases:
//! 1. Load: globally-backed slots take the caller's values, the return
//!    slot and private slots reset to 0
//! 2. Execute: steps run in order until one halts
//! 3. Save: slots that differ from what was loaded are written back to the
//!    caller's store through `set`

use super::expression::{execute_step, render_step_values};
use super::Scope;
use crate::semantic::{Process, Step, RETURN_SLOT};
use crate::storehouse::Storehouse;
use tracing::debug;

impl Process {
    /// Run the process against `store` and return its return slot
    pub fn run(&self, store: &mut Storehouse<'_>, trace: bool) -> f64 {
        let mut guard = self.scratch.try_borrow_mut();
        let mut fallback: Vec<f64>;
        let scratch: &mut Vec<f64> = match guard.as_deref_mut() {
            Ok(scratch) => scratch,
            // Re-entered through a get hook while loading
            Err(_) => {
                fallback = vec![0.0; self.slots.len() + 1];
                &mut fallback
            }
        };

        let loaded = self.load(store, scratch);
        for (index, step) in self.steps.iter().enumerate() {
            if trace {
                trace_step(index, step, &*scratch);
            }
            if execute_step(step, scratch) {
                break;
            }
        }

        let changes: Vec<_> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let raw = index + 1;
                let global = slot.global?;
                let value = scratch.get(raw).copied().unwrap_or(0.0);
                (value != loaded[raw]).then_some((global, value))
            })
            .collect();
        let result = scratch
            .get(RETURN_SLOT as usize)
            .copied()
            .unwrap_or(0.0);
        drop(guard);

        for (id, value) in changes {
            store.set(id, value);
        }
        result
    }

    /// Copy the caller's values into `scratch`, returning a snapshot of it
    fn load(&self, store: &Storehouse<'_>, scratch: &mut Vec<f64>) -> Vec<f64> {
        scratch.clear();
        scratch.push(0.0);
        scratch.extend(
            self.slots
                .iter()
                .map(|slot| slot.global.map_or(0.0, |id| store.get(id))),
        );
        scratch.clone()
    }

    /// Steps with values substituted, after loading the caller's values
    pub fn render_values(&self, store: &Storehouse<'_>) -> String {
        let mut scratch = Vec::with_capacity(self.slots.len() + 1);
        self.load(store, &mut scratch);
        self.steps
            .iter()
            .map(|step| render_step_values(step, &scratch))
            .collect::<Vec<_>>()
            .join(&self.separator.to_string())
    }
}

fn trace_step(index: usize, step: &Step, scratch: &dyn Scope) {
    debug!(
        step = index + 1,
        names = %step,
        values = %render_step_values(step, scratch),
        "process step"
    );
}
