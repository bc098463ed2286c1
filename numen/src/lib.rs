//! # Numen Engine
//!
//! **Numeric rules loaded as text**
//!
//! Numen parses four small languages over a registry of named values and
//! evaluates them against a mutable, observable store. Game and business
//! logic (stat formulas, rewards, gating conditions) can then live in
//! configuration instead of code.
//!
//! ## Quick Start
//!
//! ```rust
//! use numen::{Engine, NumenResult};
//!
//! fn main() -> NumenResult<()> {
//!     let mut engine = Engine::new();
//!     engine.registry_mut().register_name("stat", "atk", 0)?;
//!     engine.registry_mut().register_name("stat", "def", 0)?;
//!
//!     let damage = engine.parse_formula("atk*2-Min(def,10)")?;
//!     let buff = engine.parse_operations("atk+=5 def=3")?;
//!
//!     let mut store = engine.storehouse();
//!     let workstation = engine.workstation();
//!     workstation.exec_oper(&mut store, &buff, true);
//!
//!     assert_eq!(damage.evaluate(&store), 7.0);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Names
//! Every value is addressed by a registered name with a packed 32-bit
//! [`Id`]: a type tag and a per-type raw id. Ordered names (type tag 0)
//! live in a dense array, everything else in a sparse map.
//!
//! ### Languages
//! - **Formula**: `+ - * / %`, parentheses and function calls
//! - **Condition**: comparisons joined by `&&` and `||`
//! - **Operation**: `name = expr`, `name += expr`, ... separated by spaces or newlines
//! - **Process**: operations plus `Return(value)` and `Return(cond, value)`
//!
//! ### Stores and workstations
//! A [`Storehouse`] holds the values of one owner and notifies listeners on
//! every write. A [`Workstation`] runs operation sets and processes against
//! a store, remembers what it produced and turns conditions into listeners.

pub mod ast;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod listener;
pub mod parser;
pub mod registry;
pub mod semantic;
pub mod storehouse;
pub mod workstation;

pub use ast::{ExpressionId, Span};
pub use catalog::Catalog;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{CallbackError, NumenError, Stage};
pub use evaluator::{format_number, Oper, Scope, ScopeMut};
pub use functions::{Args, FunctionRegistry};
pub use listener::{Change, ListenerBus, ListenerKey};
pub use registry::{Bounds, Id, Registry, ResetCycle};
pub use semantic::{Condition, Formula, OperationSet, Process};
pub use storehouse::Storehouse;
pub use workstation::{Workstation, WorkstationId};

/// Result type for numen operations
pub type NumenResult<T> = Result<T, NumenError>;

#[cfg(test)]
mod tests;
