//! Evaluation of parsed expressions
//!
//! Every node family evaluates against a [`Scope`], which is how the same
//! tree runs against a caller's `Storehouse` or a process's scratch array:
//! 1. Formulas evaluate to a number
//! 2. Conditions evaluate to a boolean, short-circuiting `&&`/`||`
//! 3. Operations mutate a [`ScopeMut`] through an [`Oper`]
//! 4. Processes load, execute and save (see [`process`])
//!
//! Each family can also render a value-annotated form, with every name
//! replaced by its current value.

pub mod expression;
pub mod operations;
pub mod process;

use crate::registry::{Bounds, Id};
use std::fmt;

pub use expression::{
    check_condition, evaluate_formula, execute_operation, execute_step, render_condition_values,
    render_formula_values, render_operation_values, render_step_values,
};
pub use operations::{binary_operation, comparison_operation};

/// Mutation operator applied to a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Oper {
    Set,
    Inc,
    Dec,
    Mul,
    Div,
}

impl Oper {
    /// Source symbol of the assignment form
    pub fn symbol(&self) -> &'static str {
        match self {
            Oper::Set => "=",
            Oper::Inc => "+=",
            Oper::Dec => "-=",
            Oper::Mul => "*=",
            Oper::Div => "/=",
        }
    }

    /// The operator written as `<c>=` in source, `None` for a bare `=`
    pub fn compound(c: char) -> Option<Oper> {
        match c {
            '+' => Some(Oper::Inc),
            '-' => Some(Oper::Dec),
            '*' => Some(Oper::Mul),
            '/' => Some(Oper::Div),
            _ => None,
        }
    }

    /// New value of `current` after applying `operand`.
    ///
    /// Division by zero leaves `current` unchanged.
    pub fn apply(&self, current: f64, operand: f64) -> f64 {
        match self {
            Oper::Set => operand,
            Oper::Inc => current + operand,
            Oper::Dec => current - operand,
            Oper::Mul => current * operand,
            Oper::Div => {
                if operand == 0.0 {
                    current
                } else {
                    current / operand
                }
            }
        }
    }
}

impl fmt::Display for Oper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Read access to values by identifier
pub trait Scope {
    fn value(&self, id: Id) -> f64;
}

/// Write access to values by identifier
pub trait ScopeMut: Scope {
    /// Apply `op` with `operand` to `id`, returning the retained value
    fn apply(&mut self, id: Id, op: Oper, operand: f64) -> f64;
}

/// Dense scratch values indexed by ordered raw id, as used by processes
impl Scope for Vec<f64> {
    fn value(&self, id: Id) -> f64 {
        usize::try_from(id.raw())
            .ok()
            .and_then(|index| self.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Process slots are registered with default bounds, so writes floor at 0
impl ScopeMut for Vec<f64> {
    fn apply(&mut self, id: Id, op: Oper, operand: f64) -> f64 {
        let Some(slot) = usize::try_from(id.raw()).ok().and_then(|index| self.get_mut(index)) else {
            return 0.0;
        };
        *slot = Bounds::default().clamp(op.apply(*slot, operand));
        *slot
    }
}

/// Render a number in its shortest round-trip decimal form
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
