//! Parsers for the four numen languages
//!
//! All four grammars are hand-written recursive descent over a shared
//! [`Cursor`]. The first error aborts the parse and is returned as a
//! [`NumenError::Parse`] carrying the stage, position and the source that
//! was left unconsumed.

pub mod condition;
pub mod formula;
pub mod operation;
pub mod process;

use crate::ast::{Position, Span};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{NumenError, Stage};
use crate::functions::FunctionRegistry;
use crate::registry::{Id, Registry};
use crate::semantic::{Condition, Formula, OperationSet, Process};
use crate::NumenResult;
use std::ops::Range;
use std::sync::Arc;

/// Longest snippet of remaining source quoted in a diagnostic
const SNIPPET_CHARS: usize = 40;

/// Parse a Formula such as `atk*2+Max(def,10)`
pub fn parse_formula(engine: &Engine, text: &str) -> NumenResult<Formula> {
    let source = Source::checked(engine, text)?;
    let mut names = GlobalNames(engine.registry());
    let mut ctx = ParseContext::new(engine, &mut names);
    let root = formula::parse_formula_range(&source, source.full(), Stage::Formula, &mut ctx)?;
    Ok(Formula {
        id: engine.id_generator().next_id(),
        root,
    })
}

/// Parse a Condition such as `hp<=0 || (mp>10 && lvl>=5)`
pub fn parse_condition(engine: &Engine, text: &str) -> NumenResult<Condition> {
    let source = Source::checked(engine, text)?;
    let mut names = GlobalNames(engine.registry());
    let mut ctx = ParseContext::new(engine, &mut names);
    let root =
        condition::parse_condition_range(&source, source.full(), Stage::Condition, &mut ctx)?;
    Ok(Condition {
        id: engine.id_generator().next_id(),
        root,
    })
}

/// Parse an operation set such as `gold+=10 exp*=2`
pub fn parse_operations(engine: &Engine, text: &str) -> NumenResult<OperationSet> {
    let source = Source::checked(engine, text)?;
    let mut names = GlobalNames(engine.registry());
    let mut ctx = ParseContext::new(engine, &mut names);
    let operations = operation::parse_operation_list(&source, &mut ctx)?;
    Ok(OperationSet {
        id: engine.id_generator().next_id(),
        operations,
        separator: engine.config().step_separator,
    })
}

/// Parse a process such as `Return(hp<=0, 0) hp-=dmg Return(hp)`
pub fn parse_process(engine: &Engine, text: &str) -> NumenResult<Process> {
    let source = Source::checked(engine, text)?;
    process::parse_process_source(engine, &source)
}

/// Source text split into characters with their positions
pub(crate) struct Source {
    text: Arc<str>,
    chars: Vec<char>,
    /// One entry per character plus the end-of-input position
    positions: Vec<Position>,
}

impl Source {
    pub(crate) fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut positions = Vec::with_capacity(text.len() + 1);
        let (mut line, mut col) = (1, 1);
        for (offset, c) in text.char_indices() {
            chars.push(c);
            positions.push(Position { offset, line, col });
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        positions.push(Position {
            offset: text.len(),
            line,
            col,
        });
        Self {
            text: Arc::from(text),
            chars,
            positions,
        }
    }

    fn checked(engine: &Engine, text: &str) -> NumenResult<Self> {
        let limit = engine.config().max_source_bytes;
        if text.len() > limit {
            return Err(NumenError::ResourceLimitExceeded {
                limit_name: "max_source_bytes".to_string(),
                limit_value: format!("{} bytes", limit),
                actual_value: format!("{} bytes", text.len()),
            });
        }
        Ok(Self::new(text))
    }

    pub(crate) fn full(&self) -> Range<usize> {
        0..self.chars.len()
    }

    fn position(&self, index: usize) -> Position {
        let last = self.positions.len() - 1;
        self.positions[index.min(last)]
    }
}

/// Whitespace and control characters separate tokens
pub(crate) fn is_trivia(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// A position within a bounded range of a [`Source`]
pub(crate) struct Cursor<'s> {
    source: &'s Source,
    pos: usize,
    end: usize,
    stage: Stage,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(source: &'s Source, stage: Stage) -> Self {
        Self::bounded(source, source.full(), stage)
    }

    /// A cursor that treats `range.end` as end of input
    pub(crate) fn bounded(source: &'s Source, range: Range<usize>, stage: Stage) -> Self {
        let end = range.end.min(source.chars.len());
        Self {
            source,
            pos: range.start.min(end),
            end,
            stage,
        }
    }

    pub(crate) fn source(&self) -> &'s Source {
        self.source
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, ahead: usize) -> Option<char> {
        let index = self.pos + ahead;
        if index < self.end {
            Some(self.source.chars[index])
        } else {
            None
        }
    }

    pub(crate) fn bump(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
    }

    /// Skip whitespace, control characters and `//` comments
    pub(crate) fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if is_trivia(c) => self.bump(),
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line(),
                _ => return,
            }
        }
    }

    /// Skip up to and including the next newline
    pub(crate) fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            self.bump();
            if c == '\n' {
                return;
            }
        }
    }

    pub(crate) fn text(&self, range: Range<usize>) -> String {
        self.source.chars[range].iter().collect()
    }

    /// Whether `range` holds nothing but trivia
    pub(crate) fn is_blank(&self, range: Range<usize>) -> bool {
        self.source.chars[range].iter().all(|c| is_trivia(*c))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> NumenError {
        self.error_at(self.pos, message)
    }

    /// A diagnostic located at character index `at`
    pub(crate) fn error_at(&self, at: usize, message: impl Into<String>) -> NumenError {
        let start = self.source.position(at);
        let end = self.source.position(self.pos.max(at)).offset;
        let remaining: String = self.source.chars[at.min(self.source.chars.len())..]
            .iter()
            .take_while(|c| **c != '\n')
            .take(SNIPPET_CHARS)
            .collect();
        NumenError::parse(
            self.stage,
            message,
            Span::new(start, end),
            remaining.trim_end(),
            self.source.text.clone(),
        )
    }

    /// Fail unless only trivia is left
    pub(crate) fn expect_end(&mut self) -> NumenResult<()> {
        self.skip_trivia();
        match self.peek() {
            None => Ok(()),
            Some(')') => Err(self.error("unmatched right parenthesis")),
            Some(c) => Err(self.error(format!("unexpected '{}' after expression", c))),
        }
    }

    /// Scan a parenthesised argument list starting at `(`.
    ///
    /// Returns the range of each argument, split at top-level separators;
    /// the cursor ends after the matching `)`. `()` yields no arguments.
    pub(crate) fn read_params(&mut self, separator: char) -> NumenResult<Vec<Range<usize>>> {
        let open = self.pos;
        self.bump();
        let mut params = Vec::new();
        let mut start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error_at(open, "missing right parenthesis for argument list")),
                Some('(') => depth += 1,
                Some(')') if depth > 0 => depth -= 1,
                Some(')') => {
                    let last = start..self.pos;
                    if self.is_blank(last.clone()) {
                        if !params.is_empty() {
                            return Err(self.error("missing argument after separator"));
                        }
                    } else {
                        params.push(last);
                    }
                    self.bump();
                    return Ok(params);
                }
                Some(c) if c == separator && depth == 0 => {
                    if self.is_blank(start..self.pos) {
                        return Err(self.error(format!("extra argument separator '{}'", c)));
                    }
                    params.push(start..self.pos);
                    start = self.pos + 1;
                }
                Some(_) => {}
            }
            self.bump();
        }
    }
}

/// Maps a name in source text to an identifier
pub(crate) trait NameResolver {
    fn resolve(&mut self, name: &str) -> Option<Id>;
}

/// Resolves against the engine registry; unknown names are errors
pub(crate) struct GlobalNames<'r>(pub(crate) &'r Registry);

impl NameResolver for GlobalNames<'_> {
    fn resolve(&mut self, name: &str) -> Option<Id> {
        self.0.id_by_name(name)
    }
}

/// Everything a grammar needs besides the cursor
pub(crate) struct ParseContext<'a> {
    pub(crate) functions: &'a FunctionRegistry,
    pub(crate) config: &'a EngineConfig,
    pub(crate) names: &'a mut dyn NameResolver,
    depth: usize,
}

impl<'a> ParseContext<'a> {
    pub(crate) fn new(engine: &'a Engine, names: &'a mut dyn NameResolver) -> Self {
        Self {
            functions: engine.functions(),
            config: engine.config(),
            names,
            depth: 0,
        }
    }

    /// Enter one nesting level (group, call or logic connective), enforcing
    /// the depth limit
    pub(crate) fn enter(&mut self, cursor: &Cursor<'_>) -> NumenResult<()> {
        if self.depth >= self.config.max_expression_depth {
            return Err(cursor.error(format!(
                "expression nesting exceeds the limit of {}",
                self.config.max_expression_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    /// Fail when a tree `height` levels tall, placed at the current nesting
    /// level, would exceed the depth limit
    pub(crate) fn check_height(&self, cursor: &Cursor<'_>, height: usize) -> NumenResult<()> {
        if self.depth + height > self.config.max_expression_depth {
            return Err(cursor.error(format!(
                "expression nesting exceeds the limit of {}",
                self.config.max_expression_depth
            )));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
