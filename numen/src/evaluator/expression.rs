//! Expression evaluation
//!
//! Recursively evaluates node trees against a scope, and renders their
//! value-annotated forms.

use super::operations::{binary_operation, comparison_operation};
use super::{format_number, Oper, Scope, ScopeMut};
use crate::functions::Args;
use crate::registry::Id;
use crate::semantic::{CallKind, ConditionNode, FormulaNode, FunctionCall, LogicOp, Operation, Step, RETURN_SLOT};

/// Evaluate a Formula node to a number
pub fn evaluate_formula(node: &FormulaNode, scope: &dyn Scope) -> f64 {
    match node {
        FormulaNode::Constant(value) => *value,
        FormulaNode::Identifier { id, .. } => scope.value(*id),
        FormulaNode::Binary(left, op, right) => {
            binary_operation(evaluate_formula(left, scope), *op, evaluate_formula(right, scope))
        }
        FormulaNode::Negate(inner) => 0.0 - evaluate_formula(inner, scope),
        FormulaNode::Call(call) => evaluate_call(call, scope),
    }
}

fn evaluate_call(call: &FunctionCall, scope: &dyn Scope) -> f64 {
    match &call.kind {
        CallKind::Native(eval) => eval(&Args::new(scope, &call.args)),
        // Only the selected branch runs
        CallKind::If(condition) => {
            let branch = if check_condition(condition, scope) { 0 } else { 1 };
            call.args
                .get(branch)
                .map_or(0.0, |node| evaluate_formula(node, scope))
        }
    }
}

/// Evaluate a Condition node, short-circuiting `&&` and `||`
pub fn check_condition(node: &ConditionNode, scope: &dyn Scope) -> bool {
    match node {
        ConditionNode::Literal(value) => *value,
        ConditionNode::Comparison(left, op, right) => {
            comparison_operation(evaluate_formula(left, scope), *op, evaluate_formula(right, scope))
        }
        ConditionNode::Logic(left, LogicOp::And, right) => {
            check_condition(left, scope) && check_condition(right, scope)
        }
        ConditionNode::Logic(left, LogicOp::Or, right) => {
            check_condition(left, scope) || check_condition(right, scope)
        }
    }
}

/// Run one assignment, returning the value retained by the scope
pub fn execute_operation<S: ScopeMut>(operation: &Operation, scope: &mut S) -> f64 {
    let operand = evaluate_formula(&operation.value, &*scope);
    scope.apply(operation.target, operation.op, operand)
}

/// Run one process step. Returns `true` when the process must halt.
pub fn execute_step<S: ScopeMut>(step: &Step, scope: &mut S) -> bool {
    match step {
        Step::Assign(operation) => {
            execute_operation(operation, scope);
            false
        }
        Step::Return { condition, value } => {
            if let Some(condition) = condition {
                if !check_condition(condition, &*scope) {
                    return false;
                }
            }
            let result = evaluate_formula(value, &*scope);
            if let Some(slot) = Id::ordered(RETURN_SLOT) {
                scope.apply(slot, Oper::Set, result);
            }
            true
        }
    }
}

/// Formula with every name replaced by its current value
pub fn render_formula_values(node: &FormulaNode, scope: &dyn Scope) -> String {
    match node {
        FormulaNode::Constant(value) => format_number(*value),
        FormulaNode::Identifier { id, .. } => format_number(scope.value(*id)),
        FormulaNode::Binary(left, op, right) => format!(
            "({}{}{})",
            render_formula_values(left, scope),
            op.symbol(),
            render_formula_values(right, scope)
        ),
        FormulaNode::Negate(inner) => {
            let rendered = render_formula_values(inner, scope);
            if rendered.starts_with('-') {
                format!("-({})", rendered)
            } else {
                format!("-{}", rendered)
            }
        }
        FormulaNode::Call(call) => {
            let mut parts = Vec::with_capacity(call.args.len() + 1);
            if let CallKind::If(condition) = &call.kind {
                parts.push(render_condition_values(condition, scope));
            }
            parts.extend(call.args.iter().map(|arg| render_formula_values(arg, scope)));
            format!("{}({})", call.name, parts.join(","))
        }
    }
}

pub fn render_condition_values(node: &ConditionNode, scope: &dyn Scope) -> String {
    match node {
        ConditionNode::Literal(value) => value.to_string(),
        ConditionNode::Comparison(left, op, right) => format!(
            "({}{}{})",
            render_formula_values(left, scope),
            op.symbol(),
            render_formula_values(right, scope)
        ),
        ConditionNode::Logic(left, op, right) => format!(
            "({}{}{})",
            render_condition_values(left, scope),
            op.symbol(),
            render_condition_values(right, scope)
        ),
    }
}

/// `<current target value><op><value form>`, e.g. `5+=(3*2)`
pub fn render_operation_values(operation: &Operation, scope: &dyn Scope) -> String {
    format!(
        "{}{}{}",
        format_number(scope.value(operation.target)),
        operation.op.symbol(),
        render_formula_values(&operation.value, scope)
    )
}

pub fn render_step_values(step: &Step, scope: &dyn Scope) -> String {
    match step {
        Step::Assign(operation) => render_operation_values(operation, scope),
        Step::Return {
            condition: Some(condition),
            value,
        } => format!(
            "Return({},{})",
            render_condition_values(condition, scope),
            render_formula_values(value, scope)
        ),
        Step::Return { condition: None, value } => {
            format!("Return({})", render_formula_values(value, scope))
        }
    }
}

impl crate::semantic::Formula {
    pub fn evaluate(&self, scope: &dyn Scope) -> f64 {
        evaluate_formula(&self.root, scope)
    }

    pub fn render_values(&self, scope: &dyn Scope) -> String {
        render_formula_values(&self.root, scope)
    }
}

impl crate::semantic::Condition {
    pub fn check(&self, scope: &dyn Scope) -> bool {
        check_condition(&self.root, scope)
    }

    pub fn render_values(&self, scope: &dyn Scope) -> String {
        render_condition_values(&self.root, scope)
    }
}

impl crate::semantic::OperationSet {
    /// Run every statement in order against `scope`
    pub fn execute<S: ScopeMut>(&self, scope: &mut S) {
        for operation in &self.operations {
            execute_operation(operation, scope);
        }
    }

    pub fn render_values(&self, scope: &dyn Scope) -> String {
        self.operations
            .iter()
            .map(|operation| render_operation_values(operation, scope))
            .collect::<Vec<_>>()
            .join(&self.separator.to_string())
    }
}
