//! Process grammar
//!
//! A process is an operation list that may also contain `Return(value)` and
//! `Return(condition, value)`. Every name it mentions is bound to a private
//! ordered slot; names that also exist in the engine registry remember their
//! global identifier so values can be loaded and saved around a run.

use super::operation::parse_statements;
use super::{Cursor, NameResolver, ParseContext, Source};
use crate::engine::Engine;
use crate::error::Stage;
use crate::registry::{Bounds, Id, Registry};
use crate::semantic::{LocalSlot, Process, RETURN_SLOT};
use crate::NumenResult;

/// Name of the reserved slot a `Return` writes into
pub const RETURN_NAME: &str = "return";

/// Resolves process names to private ordered slots
struct ProcessNames<'r> {
    global: &'r Registry,
    locals: Registry,
    slots: Vec<LocalSlot>,
}

impl<'r> ProcessNames<'r> {
    fn new(global: &'r Registry) -> NumenResult<Self> {
        let mut locals = Registry::new();
        let raw = locals.register_ordered(RETURN_NAME, RETURN_SLOT, Bounds::default())?;
        debug_assert_eq!(raw, RETURN_SLOT);
        Ok(Self {
            global,
            locals,
            slots: vec![LocalSlot {
                name: RETURN_NAME.to_string(),
                global: None,
            }],
        })
    }
}

impl NameResolver for ProcessNames<'_> {
    fn resolve(&mut self, name: &str) -> Option<Id> {
        if let Some(id) = self.locals.id_by_name(name) {
            return Some(id);
        }
        let raw = self.locals.register_ordered(name, 0, Bounds::default()).ok()?;
        self.slots.push(LocalSlot {
            name: name.to_string(),
            global: self.global.id_by_name(name),
        });
        Id::ordered(raw)
    }
}

pub(crate) fn parse_process_source(engine: &Engine, source: &Source) -> NumenResult<Process> {
    let mut names = ProcessNames::new(engine.registry())?;
    let mut cursor = Cursor::new(source, Stage::Process);
    let steps = {
        let mut ctx = ParseContext::new(engine, &mut names);
        parse_statements(&mut cursor, &mut ctx, true)?
    };
    if steps.is_empty() {
        return Err(cursor.error("empty process"));
    }
    Ok(Process::new(
        engine.id_generator().next_id(),
        steps,
        names.slots,
        engine.config().step_separator,
    ))
}
