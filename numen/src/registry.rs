//! Name registry
//!
//! Allocates packed 32-bit identifiers for symbolic names and keeps the
//! per-name configuration (reset cycle, bounds, hooks).
//!
//! Identifier layout: the top 8 bits hold the type tag, the low 24 bits the
//! raw id within that type. Type tag 0 is reserved for *ordered* identifiers,
//! which index the dense region of a storehouse directly. Hard limits:
//! 255 types, 16,777,215 names per type, 16,777,215 ordered names.
//! Allocation is monotonic; nothing is renumbered or removed.

use crate::error::{CallbackError, NumenError};
use crate::evaluator::Oper;
use crate::storehouse::Storehouse;
use crate::NumenResult;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::{NonZeroU32, NonZeroU8};
use std::rc::Rc;

/// Maximum number of registered types
pub const MAX_TYPES: usize = 0xFF;

/// Largest raw id within one type (and largest ordered id)
pub const MAX_RAW_ID: u32 = 0x00FF_FFFF;

const TYPE_SHIFT: u32 = 24;

/// Label used when a name is registered with an empty type label
pub const DEFAULT_TYPE: &str = "default";

/// Reads a value on behalf of the store. Errors are logged and read as 0.
pub type GetHook = Rc<dyn Fn(&Storehouse<'_>, Id) -> Result<f64, CallbackError>>;

/// Replaces the default arithmetic for a write. Receives the operator and
/// operand and returns the value to retain. Errors are logged and the write
/// has no effect.
pub type SetHook = Rc<dyn Fn(&mut Storehouse<'_>, Id, Oper, f64) -> Result<f64, CallbackError>>;

/// Packed identifier: 8-bit type tag + 24-bit raw id. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Ordered identifier with the given dense index (1..=MAX_RAW_ID)
    pub fn ordered(raw: u32) -> Option<Id> {
        if raw > MAX_RAW_ID {
            return None;
        }
        NonZeroU32::new(raw).map(Id)
    }

    /// Typed identifier; `raw` must be 1..=MAX_RAW_ID
    pub fn typed(tag: TypeTag, raw: u32) -> Option<Id> {
        if raw == 0 || raw > MAX_RAW_ID {
            return None;
        }
        NonZeroU32::new((u32::from(tag.get()) << TYPE_SHIFT) | raw).map(Id)
    }

    /// Rebuild an identifier from its packed representation
    pub fn from_bits(bits: u32) -> Option<Id> {
        if bits & MAX_RAW_ID == 0 {
            return None;
        }
        NonZeroU32::new(bits).map(Id)
    }

    pub fn bits(self) -> u32 {
        self.0.get()
    }

    /// Type tag; 0 for ordered identifiers
    pub fn type_tag(self) -> u8 {
        (self.0.get() >> TYPE_SHIFT) as u8
    }

    pub fn raw(self) -> u32 {
        self.0.get() & MAX_RAW_ID
    }

    pub fn is_ordered(self) -> bool {
        self.type_tag() == 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ordered() {
            write!(f, "#{}", self.raw())
        } else {
            write!(f, "{}:{}", self.type_tag(), self.raw())
        }
    }
}

/// Type tag of a registered type (1..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(NonZeroU8);

impl TypeTag {
    pub fn get(self) -> u8 {
        self.0.get()
    }
}

/// Groups values for bulk reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetCycle {
    #[default]
    Temp,
    /// Write-only signal: never retained, never readable
    Event,
    Permanent,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl fmt::Display for ResetCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResetCycle::Temp => "temp",
            ResetCycle::Event => "event",
            ResetCycle::Permanent => "permanent",
            ResetCycle::Minute => "minute",
            ResetCycle::Hour => "hour",
            ResetCycle::Day => "day",
            ResetCycle::Week => "week",
            ResetCycle::Month => "month",
            ResetCycle::Year => "year",
        };
        f.write_str(name)
    }
}

/// Initial value and clamping range of a name.
///
/// A `max` of zero means "unbounded above". The default is all zeros, so
/// values floor at 0 unless a name is registered with a lower `min`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub init: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            init: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }
}

impl Bounds {
    pub fn new(init: f64, min: f64, max: f64) -> Self {
        Self { init, min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if self.max != 0.0 && value > self.max {
            self.max
        } else if value < self.min {
            self.min
        } else {
            value
        }
    }
}

/// Configuration of one registered name
#[derive(Clone)]
pub struct NameRecord {
    id: Id,
    name: String,
    cycle: ResetCycle,
    bounds: Bounds,
    get_hook: Option<GetHook>,
    set_hook: Option<SetHook>,
}

impl NameRecord {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cycle(&self) -> ResetCycle {
        self.cycle
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn get_hook(&self) -> Option<&GetHook> {
        self.get_hook.as_ref()
    }

    pub fn set_hook(&self) -> Option<&SetHook> {
        self.set_hook.as_ref()
    }
}

impl fmt::Debug for NameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cycle", &self.cycle)
            .field("bounds", &self.bounds)
            .field("get_hook", &self.get_hook.is_some())
            .field("set_hook", &self.set_hook.is_some())
            .finish()
    }
}

/// Allocation state of one type
pub struct TypeRecord {
    tag: TypeTag,
    label: String,
    allocated: u32,
    claimed: HashSet<u32>,
    members: Vec<Id>,
    get_hook: Option<GetHook>,
    set_hook: Option<SetHook>,
}

impl TypeRecord {
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Names registered under this type, in registration order
    pub fn members(&self) -> &[Id] {
        &self.members
    }
}

/// Process-wide table of types and names
#[derive(Default)]
pub struct Registry {
    types: Vec<TypeRecord>,
    type_by_label: HashMap<String, TypeTag>,
    ids_by_name: HashMap<String, Id>,
    records: HashMap<Id, NameRecord>,
    ordered_count: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type label, returning the existing tag if already known
    pub fn register_type(&mut self, label: &str) -> NumenResult<TypeTag> {
        let label = if label.is_empty() { DEFAULT_TYPE } else { label };
        if let Some(tag) = self.type_by_label.get(label) {
            return Ok(*tag);
        }
        if self.types.len() >= MAX_TYPES {
            return Err(NumenError::registry(format!(
                "cannot register type '{}': the limit of {} types is reached",
                label, MAX_TYPES
            )));
        }

        let tag = NonZeroU8::new((self.types.len() + 1) as u8)
            .map(TypeTag)
            .ok_or_else(|| NumenError::registry("type tag overflow"))?;
        self.types.push(TypeRecord {
            tag,
            label: label.to_string(),
            allocated: 0,
            claimed: HashSet::new(),
            members: Vec::new(),
            get_hook: None,
            set_hook: None,
        });
        self.type_by_label.insert(label.to_string(), tag);
        Ok(tag)
    }

    /// Register `name` under `type_label` with default cycle and bounds.
    /// `raw_id` 0 allocates the next free raw id.
    pub fn register_name(&mut self, type_label: &str, name: &str, raw_id: u32) -> NumenResult<Id> {
        self.register_name_by_info(type_label, name, raw_id, ResetCycle::Temp, Bounds::default())
    }

    pub fn register_name_by_cycle(
        &mut self,
        type_label: &str,
        name: &str,
        raw_id: u32,
        cycle: ResetCycle,
    ) -> NumenResult<Id> {
        self.register_name_by_info(type_label, name, raw_id, cycle, Bounds::default())
    }

    pub fn register_name_by_info(
        &mut self,
        type_label: &str,
        name: &str,
        raw_id: u32,
        cycle: ResetCycle,
        bounds: Bounds,
    ) -> NumenResult<Id> {
        self.check_new_name(name)?;
        if raw_id > MAX_RAW_ID {
            return Err(NumenError::registry(format!(
                "raw id {} of '{}' exceeds the per-type limit {}",
                raw_id, name, MAX_RAW_ID
            )));
        }

        let tag = self.register_type(type_label)?;
        let index = usize::from(tag.get()) - 1;
        let type_record = &mut self.types[index];

        let raw = if raw_id != 0 {
            if type_record.claimed.contains(&raw_id) {
                return Err(NumenError::registry(format!(
                    "raw id {} of '{}' is already claimed in type '{}'",
                    raw_id, name, type_record.label
                )));
            }
            type_record.allocated = type_record.allocated.max(raw_id);
            raw_id
        } else {
            if type_record.allocated >= MAX_RAW_ID {
                return Err(NumenError::registry(format!(
                    "type '{}' cannot hold more than {} names",
                    type_record.label, MAX_RAW_ID
                )));
            }
            type_record.allocated += 1;
            type_record.allocated
        };

        let id = Id::typed(tag, raw)
            .ok_or_else(|| NumenError::registry(format!("invalid raw id {} for '{}'", raw, name)))?;
        type_record.claimed.insert(raw);
        type_record.members.push(id);

        let record = NameRecord {
            id,
            name: name.to_string(),
            cycle,
            bounds,
            get_hook: type_record.get_hook.clone(),
            set_hook: type_record.set_hook.clone(),
        };
        self.insert(record);
        Ok(id)
    }

    /// Register an ordered (dense) name and return its raw id.
    /// `raw_id` 0 takes the next index after the highest one in use.
    pub fn register_ordered(&mut self, name: &str, raw_id: u32, bounds: Bounds) -> NumenResult<u32> {
        if self.ordered_count >= MAX_RAW_ID && raw_id == 0 {
            return Err(NumenError::registry(format!(
                "cannot register ordered name '{}': the limit of {} is reached",
                name, MAX_RAW_ID
            )));
        }
        self.check_new_name(name)?;

        let raw = if raw_id == 0 { self.ordered_count + 1 } else { raw_id };
        let id = Id::ordered(raw).ok_or_else(|| {
            NumenError::registry(format!("ordered raw id {} of '{}' is out of range", raw, name))
        })?;
        if self.records.contains_key(&id) {
            return Err(NumenError::registry(format!(
                "ordered raw id {} of '{}' is already claimed",
                raw, name
            )));
        }
        self.ordered_count = self.ordered_count.max(raw);

        self.insert(NameRecord {
            id,
            name: name.to_string(),
            cycle: ResetCycle::Temp,
            bounds,
            get_hook: None,
            set_hook: None,
        });
        Ok(raw)
    }

    fn check_new_name(&self, name: &str) -> NumenResult<()> {
        if name.is_empty() {
            return Err(NumenError::registry("names cannot be empty"));
        }
        if self.ids_by_name.contains_key(name) {
            return Err(NumenError::registry(format!("name '{}' is already registered", name)));
        }
        Ok(())
    }

    fn insert(&mut self, record: NameRecord) {
        self.ids_by_name.insert(record.name.clone(), record.id);
        self.records.insert(record.id, record);
    }

    pub fn id_by_name(&self, name: &str) -> Option<Id> {
        self.ids_by_name.get(name).copied()
    }

    pub fn name_by_id(&self, id: Id) -> Option<&str> {
        self.records.get(&id).map(|record| record.name.as_str())
    }

    pub fn record(&self, id: Id) -> Option<&NameRecord> {
        self.records.get(&id)
    }

    pub fn type_tag(&self, label: &str) -> Option<TypeTag> {
        self.type_by_label.get(label).copied()
    }

    pub fn type_record(&self, tag: TypeTag) -> Option<&TypeRecord> {
        self.types.get(usize::from(tag.get()) - 1)
    }

    /// Label of the type `id` belongs to; `None` for ordered identifiers
    pub fn type_label(&self, id: Id) -> Option<&str> {
        let tag = NonZeroU8::new(id.type_tag()).map(TypeTag)?;
        self.type_record(tag).map(TypeRecord::label)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Highest ordered raw id in use; the dense region of a store has this many slots
    pub fn ordered_count(&self) -> u32 {
        self.ordered_count
    }

    /// All records ordered by identifier
    pub fn records(&self) -> Vec<&NameRecord> {
        let mut records: Vec<&NameRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn register_get_hook_by_type(
        &mut self,
        type_label: &str,
        hook: impl Fn(&Storehouse<'_>, Id) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        let hook: GetHook = Rc::new(hook);
        let members = {
            let type_record = self.type_record_mut(type_label)?;
            type_record.get_hook = Some(hook.clone());
            type_record.members.clone()
        };
        for id in members {
            self.record_mut(id)?.get_hook = Some(hook.clone());
        }
        Ok(())
    }

    pub fn register_get_hook_by_id(
        &mut self,
        id: Id,
        hook: impl Fn(&Storehouse<'_>, Id) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        self.record_mut(id)?.get_hook = Some(Rc::new(hook));
        Ok(())
    }

    pub fn register_get_hook_by_name(
        &mut self,
        name: &str,
        hook: impl Fn(&Storehouse<'_>, Id) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        let id = self.require_name(name)?;
        self.register_get_hook_by_id(id, hook)
    }

    pub fn register_set_hook_by_type(
        &mut self,
        type_label: &str,
        hook: impl Fn(&mut Storehouse<'_>, Id, Oper, f64) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        let hook: SetHook = Rc::new(hook);
        let members = {
            let type_record = self.type_record_mut(type_label)?;
            type_record.set_hook = Some(hook.clone());
            type_record.members.clone()
        };
        for id in members {
            self.record_mut(id)?.set_hook = Some(hook.clone());
        }
        Ok(())
    }

    pub fn register_set_hook_by_id(
        &mut self,
        id: Id,
        hook: impl Fn(&mut Storehouse<'_>, Id, Oper, f64) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        self.record_mut(id)?.set_hook = Some(Rc::new(hook));
        Ok(())
    }

    pub fn register_set_hook_by_name(
        &mut self,
        name: &str,
        hook: impl Fn(&mut Storehouse<'_>, Id, Oper, f64) -> Result<f64, CallbackError> + 'static,
    ) -> NumenResult<()> {
        let id = self.require_name(name)?;
        self.register_set_hook_by_id(id, hook)
    }

    fn require_name(&self, name: &str) -> NumenResult<Id> {
        self.id_by_name(name)
            .ok_or_else(|| NumenError::registry(format!("name '{}' is not registered", name)))
    }

    fn type_record_mut(&mut self, label: &str) -> NumenResult<&mut TypeRecord> {
        let tag = self
            .type_tag(label)
            .ok_or_else(|| NumenError::registry(format!("type '{}' is not registered", label)))?;
        Ok(&mut self.types[usize::from(tag.get()) - 1])
    }

    /// Hooks can only be attached to typed names
    fn record_mut(&mut self, id: Id) -> NumenResult<&mut NameRecord> {
        if id.is_ordered() {
            let name = self.name_by_id(id).unwrap_or("?").to_string();
            return Err(NumenError::registry(format!(
                "ordered name '{}' cannot carry get/set hooks",
                name
            )));
        }
        self.records
            .get_mut(&id)
            .ok_or_else(|| NumenError::registry(format!("identifier {} is not registered", id)))
    }
}
