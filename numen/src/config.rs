use serde::Deserialize;

/// Settings read by every parser and by process execution.
///
/// Fixed when the engine is built. The nesting and size limits protect
/// against hostile inputs while staying far above real rule texts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separates operation and process statements besides newlines
    pub step_separator: char,

    /// Separates function call arguments
    pub param_separator: char,

    /// Log every process step at debug level before running it
    pub trace_steps: bool,

    /// Maximum source text size in bytes
    /// Real usage: <1KB, Limit: 1MB
    pub max_source_bytes: usize,

    /// Maximum expression depth: parentheses, calls, logic connectives
    /// and operator chains each add a level
    /// Real usage: ~10 levels, Limit: 100
    pub max_expression_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_separator: ' ',
            param_separator: ',',
            trace_steps: false,
            max_source_bytes: 1024 * 1024, // 1 MB
            max_expression_depth: 100,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
