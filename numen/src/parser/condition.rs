//! Condition grammar
//!
//! ```text
//! cond    := operand (('&&'|'||') cond)?
//! operand := '(' cond ')' | formula cmp formula | 'true' | 'false'
//! cmp     := '>' | '<' | '>=' | '<=' | '=' | '!='
//! ```
//!
//! The right side of `&&`/`||` consumes everything up to the closing
//! parenthesis or end of input, so `a && b || c` groups as
//! `a && (b || c)`. The two connectives have no relative precedence, and
//! each one nests its right side a level deeper.

use super::formula::parse_formula_range;
use super::{Cursor, ParseContext, Source};
use crate::error::Stage;
use crate::semantic::{ComparisonOperator, ConditionNode, LogicOp};
use crate::NumenResult;
use std::ops::Range;

/// Parse `range` of `source` as one complete condition
pub(crate) fn parse_condition_range(
    source: &Source,
    range: Range<usize>,
    stage: Stage,
    ctx: &mut ParseContext<'_>,
) -> NumenResult<ConditionNode> {
    let mut cursor = Cursor::bounded(source, range, stage);
    let node = parse_condition(&mut cursor, ctx)?;
    cursor.expect_end()?;
    Ok(node)
}

/// Parse up to end of input or an unmatched `)`, which is left unconsumed
fn parse_condition(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<ConditionNode> {
    let mut result: Option<ConditionNode> = None;
    loop {
        cursor.skip_trivia();
        let Some(c) = cursor.peek() else {
            break;
        };
        match c {
            ')' => break,
            '&' | '|' => {
                let Some(left) = result.take() else {
                    return Err(cursor.error(format!(
                        "logic operator '{}{}' is missing its left operand",
                        c, c
                    )));
                };
                result = Some(parse_logic(cursor, ctx, left, c)?);
            }
            _ if result.is_some() => {
                return Err(cursor.error("extra symbol after condition"));
            }
            '(' if !opens_formula(cursor) => result = Some(parse_group(cursor, ctx)?),
            _ => result = Some(parse_comparison(cursor, ctx)?),
        }
    }
    result.ok_or_else(|| cursor.error("empty condition"))
}

fn parse_group(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<ConditionNode> {
    let open = cursor.pos();
    ctx.enter(cursor)?;
    cursor.bump();
    let inner = parse_condition(cursor, ctx)?;
    cursor.skip_trivia();
    if cursor.peek() != Some(')') {
        return Err(cursor.error_at(open, "missing right parenthesis"));
    }
    cursor.bump();
    ctx.leave();
    Ok(inner)
}

/// Whether the `(` under the cursor starts a parenthesised formula operand
/// (`(a+b)*2 > c`) rather than a nested condition.
fn opens_formula(cursor: &Cursor<'_>) -> bool {
    let mut depth = 0usize;
    let mut ahead = 0;
    while let Some(c) = cursor.peek_at(ahead) {
        ahead += 1;
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    while let Some(c) = cursor.peek_at(ahead) {
        if !super::is_trivia(c) {
            return matches!(c, '<' | '>' | '=' | '!' | '+' | '-' | '*' | '/' | '%');
        }
        ahead += 1;
    }
    false
}

fn parse_logic(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    left: ConditionNode,
    symbol: char,
) -> NumenResult<ConditionNode> {
    if cursor.peek_at(1) != Some(symbol) {
        return Err(cursor.error(format!("expected '{}{}'", symbol, symbol)));
    }
    let op = LogicOp::from_symbol(symbol)
        .ok_or_else(|| cursor.error(format!("invalid logic operator '{}'", symbol)))?;
    cursor.bump();
    cursor.bump();

    cursor.skip_trivia();
    if matches!(cursor.peek(), None | Some(')')) {
        return Err(cursor.error(format!(
            "logic operator '{}' is missing its right operand",
            op.symbol()
        )));
    }
    ctx.enter(cursor)?;
    let right = parse_condition(cursor, ctx)?;
    ctx.leave();
    Ok(ConditionNode::logic(left, op, right))
}

/// `formula cmp formula`, or a boolean literal
fn parse_comparison(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<ConditionNode> {
    let left_start = cursor.pos();
    scan_operand(cursor, true);
    let left = left_start..cursor.pos();
    let left_text = cursor.text(left.clone());
    let left_text = left_text.trim();
    if left_text.is_empty() {
        return Err(cursor.error("comparison is missing its left operand"));
    }

    let symbol_start = cursor.pos();
    while let Some('<' | '>' | '=' | '!') = cursor.peek() {
        cursor.bump();
    }
    let symbol = cursor.text(symbol_start..cursor.pos());
    if symbol.is_empty() {
        if left_text.eq_ignore_ascii_case("true") {
            return Ok(ConditionNode::Literal(true));
        }
        if left_text.eq_ignore_ascii_case("false") {
            return Ok(ConditionNode::Literal(false));
        }
        return Err(cursor.error(format!(
            "missing comparison operator after '{}'",
            left_text
        )));
    }
    let op = ComparisonOperator::from_symbol(&symbol).ok_or_else(|| {
        cursor.error_at(symbol_start, format!("invalid comparison operator '{}'", symbol))
    })?;

    let right_start = cursor.pos();
    scan_operand(cursor, false);
    let right = right_start..cursor.pos();
    if cursor.is_blank(right.clone()) {
        return Err(cursor.error(format!(
            "comparison operator '{}' is missing its right operand",
            symbol
        )));
    }

    let source = cursor.source();
    let stage = cursor.stage();
    let left = parse_formula_range(source, left, stage, ctx)?;
    let right = parse_formula_range(source, right, stage, ctx)?;
    Ok(ConditionNode::Comparison(left, op, right))
}

/// Advance over one formula operand: stop at a top-level `&`, `|`, an
/// unmatched `)`, or, on the left side, a comparison symbol.
fn scan_operand(cursor: &mut Cursor<'_>, stop_at_comparison: bool) {
    let mut depth = 0usize;
    while let Some(c) = cursor.peek() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return,
            ')' => depth -= 1,
            '&' | '|' if depth == 0 => return,
            '<' | '>' | '=' | '!' if depth == 0 && stop_at_comparison => return,
            _ => {}
        }
        cursor.bump();
    }
}
