//! AST infrastructure types
//!
//! This module contains metadata types used throughout the parsers:
//! - `Position` and `Span` for tracking source code locations
//! - `ExpressionId` for identifying parsed expression instances
//! - `ExpressionIdGenerator` for handing out unique IDs during parsing

use std::cell::Cell;
use std::fmt;

/// A single location in source text. `line` and `col` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

/// Span representing a location in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(start: Position, end: usize) -> Self {
        Self {
            start: start.offset,
            end: end.max(start.offset),
            line: start.line,
            col: start.col,
        }
    }
}

/// Unique identifier for a parsed top-level expression.
///
/// Workstations key their bookkeeping on this: two parses of the same text
/// are two distinct instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(u64);

impl ExpressionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr_{}", self.0)
    }
}

/// Counter for generating unique expression IDs
///
/// Lives inside the engine, which parses through a shared reference, so the
/// counter is a `Cell`.
#[derive(Debug, Default)]
pub struct ExpressionIdGenerator {
    next_id: Cell<u64>,
}

impl ExpressionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ExpressionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ExpressionId(id)
    }
}
