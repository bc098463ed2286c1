//! Formula grammar
//!
//! ```text
//! expr := term (('+'|'-'|'*'|'/'|'%') term)*
//! term := number | name | '-' term | '(' expr ')' | func '(' expr (',' expr)* ')'
//! ```
//!
//! Precedence is resolved incrementally: the parser keeps a pending
//! `(left, op, right)` triple. A new operator that binds no tighter than the
//! pending one folds the triple into the left operand; a tighter one nests
//! into the pending right operand. Operator chains count towards the
//! nesting limit, one level per operator the tree grows by.

use super::{condition, is_trivia, Cursor, ParseContext, Source};
use crate::error::{NumenError, Stage};
use crate::functions::{FunctionDef, FunctionKind};
use crate::semantic::{BinaryOp, CallKind, FormulaNode, FunctionCall};
use crate::NumenResult;
use std::ops::Range;

/// Parse `range` of `source` as one complete formula
pub(crate) fn parse_formula_range(
    source: &Source,
    range: Range<usize>,
    stage: Stage,
    ctx: &mut ParseContext<'_>,
) -> NumenResult<FormulaNode> {
    let mut cursor = Cursor::bounded(source, range, stage);
    let node = parse_expression(&mut cursor, ctx)?;
    cursor.expect_end()?;
    Ok(node)
}

/// Operands and operators seen so far at one nesting level, with the
/// height of the tree each side would build
#[derive(Default)]
struct Chain {
    left: Option<FormulaNode>,
    pending: Option<(BinaryOp, FormulaNode)>,
    left_depth: usize,
    right_depth: usize,
}

impl Chain {
    fn start(&mut self, term: FormulaNode) {
        self.left_depth = term.depth();
        self.left = Some(term);
    }

    /// Append `op term` and return the height of the resulting tree
    fn push(&mut self, op: BinaryOp, term: FormulaNode) -> usize {
        let term_depth = term.depth();
        self.pending = Some(match self.pending.take() {
            None => {
                self.right_depth = term_depth;
                (op, term)
            }
            Some((pending_op, right)) if op.precedence() <= pending_op.precedence() => {
                if let Some(left) = self.left.take() {
                    self.left = Some(FormulaNode::binary(left, pending_op, right));
                }
                self.left_depth = 1 + self.left_depth.max(self.right_depth);
                self.right_depth = term_depth;
                (op, term)
            }
            Some((pending_op, right)) => {
                self.right_depth = 1 + self.right_depth.max(term_depth);
                (pending_op, FormulaNode::binary(right, op, term))
            }
        });
        self.depth()
    }

    fn depth(&self) -> usize {
        match self.pending {
            Some(_) => 1 + self.left_depth.max(self.right_depth),
            None => self.left_depth,
        }
    }

    fn finish(self) -> Option<FormulaNode> {
        let left = self.left?;
        Some(match self.pending {
            Some((op, right)) => FormulaNode::binary(left, op, right),
            None => left,
        })
    }
}

/// Parse up to end of input or an unmatched `)`, which is left unconsumed
fn parse_expression(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<FormulaNode> {
    let mut chain = Chain::default();
    loop {
        cursor.skip_trivia();
        let Some(c) = cursor.peek() else {
            break;
        };
        if c == ')' {
            break;
        }
        match (BinaryOp::from_symbol(c), chain.left.is_some()) {
            (Some(op), true) => {
                cursor.bump();
                let term = parse_term(cursor, ctx, Some(op))?;
                let depth = chain.push(op, term);
                ctx.check_height(cursor, depth)?;
            }
            // A leading minus belongs to the operand
            (Some(BinaryOp::Subtract), false) => {
                chain.start(parse_term(cursor, ctx, None)?);
            }
            (Some(op), false) => {
                return Err(cursor.error(format!(
                    "operator '{}' is missing its left operand",
                    op.symbol()
                )));
            }
            (None, true) => return Err(cursor.error("extra symbol after expression")),
            (None, false) => chain.start(parse_term(cursor, ctx, None)?),
        }
    }
    chain.finish().ok_or_else(|| cursor.error("empty expression"))
}

fn missing_operand(cursor: &Cursor<'_>, after: Option<BinaryOp>) -> NumenError {
    match after {
        Some(op) => cursor.error(format!(
            "operator '{}' is missing its right operand",
            op.symbol()
        )),
        None => cursor.error("missing operand"),
    }
}

fn parse_term(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    after: Option<BinaryOp>,
) -> NumenResult<FormulaNode> {
    cursor.skip_trivia();
    match cursor.peek() {
        None | Some(')') => Err(missing_operand(cursor, after)),
        Some('(') => parse_group(cursor, ctx),
        Some(_) => parse_atom(cursor, ctx, after),
    }
}

fn parse_group(cursor: &mut Cursor<'_>, ctx: &mut ParseContext<'_>) -> NumenResult<FormulaNode> {
    let open = cursor.pos();
    ctx.enter(cursor)?;
    cursor.bump();
    let inner = parse_expression(cursor, ctx)?;
    cursor.skip_trivia();
    if cursor.peek() != Some(')') {
        return Err(cursor.error_at(open, "missing right parenthesis"));
    }
    cursor.bump();
    ctx.leave();
    Ok(inner)
}

/// A number, a name or a call, with an optional leading minus
fn parse_atom(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    after: Option<BinaryOp>,
) -> NumenResult<FormulaNode> {
    let start = cursor.pos();
    let separator = ctx.config.param_separator;
    let mut token = String::new();
    while let Some(c) = cursor.peek() {
        if is_trivia(c) || c == separator {
            break;
        }
        match c {
            '+' | '*' | '/' | '%' | '(' | ')' | ',' => break,
            '-' if !token.is_empty() => break,
            '<' | '>' | '=' | '!' | ':' => {
                return Err(cursor.error(format!("unexpected '{}' in formula", c)));
            }
            _ => {
                token.push(c);
                cursor.bump();
            }
        }
    }

    let (negated, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.as_str()),
    };

    if is_numeric(body) {
        return parse_number(&token)
            .map(FormulaNode::Constant)
            .ok_or_else(|| cursor.error_at(start, format!("invalid number '{}'", token)));
    }

    let node = if body.is_empty() {
        if !negated || cursor.peek() != Some('(') {
            return Err(missing_operand(cursor, after));
        }
        parse_group(cursor, ctx)?
    } else if cursor.peek() == Some('(') {
        let name_start = if negated { start + 1 } else { start };
        parse_call(cursor, ctx, name_start, body)?
    } else {
        let id = ctx
            .names
            .resolve(body)
            .ok_or_else(|| cursor.error_at(start, format!("unknown name '{}'", body)))?;
        FormulaNode::Identifier {
            id,
            name: body.to_string(),
        }
    };

    Ok(if negated { FormulaNode::negate(node) } else { node })
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// `-?[0-9]+(.[0-9]+)?`
fn parse_number(token: &str) -> Option<f64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let mut parts = digits.split('.');
    let whole = parts.next()?;
    let fraction = parts.next();
    let well_formed = parts.next().is_none()
        && !whole.is_empty()
        && fraction.map_or(true, |fraction| !fraction.is_empty());
    if well_formed {
        token.parse().ok()
    } else {
        None
    }
}

fn parse_call(
    cursor: &mut Cursor<'_>,
    ctx: &mut ParseContext<'_>,
    start: usize,
    name: &str,
) -> NumenResult<FormulaNode> {
    let functions = ctx.functions;
    let Some(def) = functions.get(name) else {
        return Err(cursor.error_at(start, format!("undefined function '{}'", name)));
    };

    ctx.enter(cursor)?;
    let params = cursor.read_params(ctx.config.param_separator)?;
    let source = cursor.source();
    let stage = cursor.stage();

    let call = match &def.kind {
        FunctionKind::If => {
            let [test, then, otherwise] = params.as_slice() else {
                return Err(arity_error(cursor, start, def, params.len()));
            };
            let condition = condition::parse_condition_range(source, test.clone(), stage, ctx)?;
            let then = parse_formula_range(source, then.clone(), stage, ctx)?;
            let otherwise = parse_formula_range(source, otherwise.clone(), stage, ctx)?;
            FunctionCall {
                name: name.to_string(),
                kind: CallKind::If(Box::new(condition)),
                args: vec![then, otherwise],
            }
        }
        FunctionKind::Native(_) => {
            let Some(eval) = def.overload(params.len()).cloned() else {
                return Err(arity_error(cursor, start, def, params.len()));
            };
            let args = params
                .iter()
                .map(|param| parse_formula_range(source, param.clone(), stage, ctx))
                .collect::<NumenResult<Vec<_>>>()?;
            FunctionCall {
                name: name.to_string(),
                kind: CallKind::Native(eval),
                args,
            }
        }
    };
    ctx.leave();
    Ok(FormulaNode::Call(call))
}

fn arity_error(cursor: &Cursor<'_>, start: usize, def: &FunctionDef, given: usize) -> NumenError {
    let expected = def
        .arities()
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    cursor.error_at(
        start,
        format!(
            "function '{}' takes {} argument(s), got {}",
            def.name(),
            expected,
            given
        ),
    )
}
