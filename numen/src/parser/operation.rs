//! Operation grammar
//!
//! ```text
//! list      := statement (separator statement)*
//! statement := name ('=' | ':' | '+=' | '-=' | '*=' | '/=') formula
//! ```
//!
//! Statements are separated by newlines or the configured step separator
//! (a space by default), and `//` starts a line comment. A value ends at
//! the first separator that is not inside parentheses and does not follow
//! an operator, so `x = a +` on one line continues on the next.
//!
//! Processes reuse this scanner and additionally accept `Return(...)`.

use super::formula::parse_formula_range;
use super::{condition, is_trivia, Cursor, ParseContext, Source};
use crate::error::Stage;
use crate::evaluator::Oper;
use crate::semantic::{Operation, Step};
use crate::NumenResult;
use std::ops::Range;

/// Parse the whole source as an operation set
pub(crate) fn parse_operation_list(
    source: &Source,
    ctx: &mut ParseContext<'_>,
) -> NumenResult<Vec<Operation>> {
    let mut cursor = Cursor::new(source, Stage::Operation);
    let mut operations = Vec::new();
    for step in parse_statements(&mut cursor, ctx, false)? {
        if let Step::Assign(operation) = step {
            operations.push(operation);
        }
    }
    if operations.is_empty() {
        return Err(cursor.error("empty operation list"));
    }
    Ok(operations)
}

/// Parse statements until end of input. `Return(...)` is accepted only
/// when `allow_return` is set.
pub(crate) fn parse_statements(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    allow_return: bool,
) -> NumenResult<Vec<Step>> {
    let separator = ctx.config.step_separator;
    let mut steps = Vec::new();
    loop {
        skip_separators(cursor, separator);
        if cursor.at_end() {
            return Ok(steps);
        }
        steps.push(parse_statement(cursor, ctx, allow_return)?);
    }
}

fn skip_separators(cursor: &mut Cursor<'_>, separator: char) {
    loop {
        cursor.skip_trivia();
        if cursor.peek() == Some(separator) {
            cursor.bump();
        } else {
            return;
        }
    }
}

fn parse_statement(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    allow_return: bool,
) -> NumenResult<Step> {
    let separator = ctx.config.step_separator;
    let name_start = cursor.pos();
    while let Some(c) = cursor.peek() {
        if is_trivia(c) || c == separator || matches!(c, '=' | ':' | '+' | '-' | '*' | '/' | '(' | ')') {
            break;
        }
        cursor.bump();
    }
    let name = cursor.text(name_start..cursor.pos());
    cursor.skip_trivia();

    let compound = cursor
        .peek()
        .filter(|_| cursor.peek_at(1) == Some('='))
        .and_then(Oper::compound);
    let op = match (cursor.peek(), compound) {
        (Some('('), _) if !name.is_empty() && allow_return && name.eq_ignore_ascii_case("return") => {
            return parse_return(cursor, ctx);
        }
        (Some('('), _) if !name.is_empty() => {
            return Err(cursor.error_at(
                name_start,
                format!("'{}' is not a statement; only Return(...) may be called here", name),
            ));
        }
        (Some('=' | ':'), _) => {
            cursor.bump();
            Oper::Set
        }
        (_, Some(op)) => {
            cursor.bump();
            cursor.bump();
            op
        }
        (Some(c @ ('+' | '-' | '*' | '/')), None) => {
            return Err(cursor.error(format!("operator '{}' must be followed by '='", c)));
        }
        (None, _) => {
            return Err(cursor.error_at(
                name_start,
                format!("statement '{}' is missing an assignment operator", name),
            ));
        }
        (Some(c), _) => {
            return Err(cursor.error(format!(
                "expected an assignment operator after '{}', found '{}'",
                name, c
            )));
        }
    };
    if name.is_empty() {
        return Err(cursor.error_at(name_start, format!("missing name before '{}'", op.symbol())));
    }

    let target = ctx
        .names
        .resolve(&name)
        .ok_or_else(|| cursor.error_at(name_start, format!("unknown name '{}'", name)))?;

    cursor.skip_trivia();
    let value_range = scan_value(cursor, separator, ctx.config.param_separator)?;
    if value_range.is_empty() {
        return Err(cursor.error(format!("'{}' is missing its value expression", name)));
    }
    let value = parse_formula_range(cursor.source(), value_range, cursor.stage(), ctx)?;
    Ok(Step::Assign(Operation {
        target,
        name,
        op,
        value,
    }))
}

fn parse_return(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<Step> {
    let open = cursor.pos();
    let params = cursor.read_params(ctx.config.param_separator)?;
    let source = cursor.source();
    let stage = cursor.stage();
    match params.as_slice() {
        [value] => Ok(Step::Return {
            condition: None,
            value: parse_formula_range(source, value.clone(), stage, ctx)?,
        }),
        [test, value] => Ok(Step::Return {
            condition: Some(condition::parse_condition_range(source, test.clone(), stage, ctx)?),
            value: parse_formula_range(source, value.clone(), stage, ctx)?,
        }),
        _ => Err(cursor.error_at(
            open,
            format!("Return takes 1 or 2 arguments, got {}", params.len()),
        )),
    }
}

/// Operator characters that keep a value open across a separator
fn continues_value(c: char, param_separator: char) -> bool {
    c == param_separator
        || matches!(
            c,
            '+' | '-' | '*' | '/' | '%' | '&' | '|' | '<' | '>' | '=' | '!' | ':' | ','
        )
}

/// Find the extent of a statement's value expression.
///
/// With a space step separator, a space at the top level after a complete
/// operand ends the value. With any other separator such a space must be
/// followed by an operator, a newline or the separator. Inside parentheses
/// two operands may never be separated by whitespace alone.
fn scan_value(
    cursor: &mut Cursor<'_>,
    separator: char,
    param_separator: char,
) -> NumenResult<Range<usize>> {
    let start = cursor.pos();
    let mut end = start;
    let mut depth = 0usize;
    // A newline or separator was seen at the top level
    let mut ended = false;
    // Whitespace since the last token
    let mut spaced = false;
    // The last token was an operator
    let mut pending_op = false;

    while let Some(c) = cursor.peek() {
        if c == '/' && cursor.peek_at(1) == Some('/') {
            cursor.skip_line();
            ended |= depth == 0;
            spaced = depth > 0;
            continue;
        }
        match c {
            '\n' => {
                ended |= depth == 0;
                spaced = depth > 0;
            }
            c if c == separator && separator != ' ' && depth == 0 => {
                ended = true;
                spaced = false;
            }
            c if is_trivia(c) => spaced = true,
            ')' => {
                if depth == 0 {
                    return Err(cursor.error("unmatched right parenthesis"));
                }
                depth -= 1;
                end = cursor.pos() + 1;
                ended = false;
                spaced = false;
                pending_op = false;
            }
            c if continues_value(c, param_separator) => {
                pending_op = true;
                spaced = false;
                end = cursor.pos() + 1;
            }
            _ => {
                if depth == 0 && !pending_op {
                    if ended {
                        break;
                    }
                    if spaced {
                        if separator == ' ' {
                            break;
                        }
                        return Err(cursor.error("extra symbol after expression"));
                    }
                } else if spaced && !pending_op {
                    return Err(cursor.error("unexpected space between operands"));
                }
                if c == '(' {
                    depth += 1;
                }
                end = cursor.pos() + 1;
                ended = false;
                spaced = false;
                pending_op = false;
            }
        }
        cursor.bump();
    }
    Ok(start..end)
}
