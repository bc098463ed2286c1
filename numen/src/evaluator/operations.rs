//! Arithmetic and comparison on plain numbers

use crate::semantic::{BinaryOp, ComparisonOperator};

/// Apply a binary Formula operator.
///
/// Division and modulo by zero are defined: they yield `left` unchanged.
/// Modulo truncates both operands to integers first.
///
/// # Examples
/// ```text
/// 5 / 0   = 5
/// 7.9 % 2 = 1
/// 5 % 0.5 = 5
/// ```
pub fn binary_operation(left: f64, op: BinaryOp, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => {
            if right == 0.0 {
                left
            } else {
                left / right
            }
        }
        BinaryOp::Modulo => {
            let divisor = right as i64;
            if divisor == 0 {
                left
            } else {
                (left as i64).wrapping_rem(divisor) as f64
            }
        }
    }
}

pub fn comparison_operation(left: f64, op: ComparisonOperator, right: f64) -> bool {
    match op {
        ComparisonOperator::GreaterThan => left > right,
        ComparisonOperator::LessThan => left < right,
        ComparisonOperator::GreaterThanOrEqual => left >= right,
        ComparisonOperator::LessThanOrEqual => left <= right,
        ComparisonOperator::Equal => left == right,
        ComparisonOperator::NotEqual => left != right,
    }
}
