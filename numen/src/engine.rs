use crate::ast::ExpressionIdGenerator;
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::functions::{FunctionRegistry, MATH_CONSTANTS};
use crate::listener::ListenerBus;
use crate::parser;
use crate::registry::Registry;
use crate::semantic::{Condition, Formula, OperationSet, Process};
use crate::storehouse::Storehouse;
use crate::workstation::{Workstation, WorkstationId};
use crate::{NumenError, NumenResult};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use tracing::warn;

/// Type whose names compare by identity: reading one yields its packed id
pub const TEXT_TYPE: &str = "text";

/// Type holding the mathematical constants `E`, `PI`, ...
pub const MATH_CONST_TYPE: &str = "mathconst";

/// The numen engine context.
///
/// Owns the name registry, the function table, the global listener bus and
/// the configuration. Populate the registry first; stores and parsed
/// expressions then borrow the engine for the rest of its life.
pub struct Engine {
    registry: Registry,
    functions: FunctionRegistry,
    listeners: ListenerBus,
    config: EngineConfig,
    ids: ExpressionIdGenerator,
    workstations: Cell<u64>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom separators and limits
    pub fn with_config(config: EngineConfig) -> Self {
        let mut engine = Self {
            registry: Registry::new(),
            functions: FunctionRegistry::with_builtins(),
            listeners: ListenerBus::new(),
            config,
            ids: ExpressionIdGenerator::new(),
            workstations: Cell::new(0),
        };
        if let Err(err) = engine.register_builtin_names() {
            warn!(error = %err, "built-in names unavailable");
        }
        engine
    }

    /// Build an engine from a catalog, honouring its `config` section
    pub fn from_catalog(catalog: &Catalog) -> NumenResult<Self> {
        let mut engine = Self::with_config(catalog.config.clone().unwrap_or_default());
        engine.load_catalog(catalog)?;
        Ok(engine)
    }

    fn register_builtin_names(&mut self) -> NumenResult<()> {
        self.registry.register_type(TEXT_TYPE)?;
        self.registry
            .register_get_hook_by_type(TEXT_TYPE, |_, id| Ok(f64::from(id.bits())))?;

        self.registry.register_type(MATH_CONST_TYPE)?;
        for (raw, (name, _)) in (1u32..).zip(MATH_CONSTANTS) {
            self.registry.register_name(MATH_CONST_TYPE, name, raw)?;
        }
        self.registry.register_get_hook_by_type(MATH_CONST_TYPE, |_, id| {
            Ok((id.raw() as usize)
                .checked_sub(1)
                .and_then(|index| MATH_CONSTANTS.get(index))
                .map_or(0.0, |(_, value)| *value))
        })
    }

    /// Register the types and names of `catalog` in declaration order.
    ///
    /// Stops at the first registration failure.
    pub fn load_catalog(&mut self, catalog: &Catalog) -> NumenResult<()> {
        for label in &catalog.types {
            self.registry.register_type(label)?;
        }
        for entry in &catalog.names {
            self.registry
                .register_name_by_info(
                    &entry.type_label,
                    &entry.name,
                    entry.raw_id,
                    entry.cycle,
                    entry.bounds,
                )
                .map_err(|err| NumenError::Catalog(format!("name '{}': {}", entry.name, err)))?;
        }
        for entry in &catalog.ordered {
            self.registry
                .register_ordered(&entry.name, entry.raw_id, entry.bounds)
                .map_err(|err| NumenError::Catalog(format!("ordered name '{}': {}", entry.name, err)))?;
        }
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// The global listener bus shared by every store of this engine
    pub fn listeners(&self) -> &ListenerBus {
        &self.listeners
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn id_generator(&self) -> &ExpressionIdGenerator {
        &self.ids
    }

    pub fn parse_formula(&self, text: &str) -> NumenResult<Formula> {
        parser::parse_formula(self, text)
    }

    pub fn parse_condition(&self, text: &str) -> NumenResult<Condition> {
        parser::parse_condition(self, text)
    }

    pub fn parse_operations(&self, text: &str) -> NumenResult<OperationSet> {
        parser::parse_operations(self, text)
    }

    pub fn parse_process(&self, text: &str) -> NumenResult<Process> {
        parser::parse_process(self, text)
    }

    /// A fresh store sized for the current registry
    pub fn storehouse(&self) -> Storehouse<'_> {
        Storehouse::new(self)
    }

    pub fn storehouse_with_owner<T: Any>(&self, owner: Rc<T>) -> Storehouse<'_> {
        Storehouse::with_owner(self, owner)
    }

    /// A new workstation with its own identity
    pub fn workstation(&self) -> Workstation {
        let id = self.workstations.get();
        self.workstations.set(id + 1);
        Workstation::new(WorkstationId::new(id))
    }
}
