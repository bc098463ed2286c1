use crate::ast::Span;
use std::fmt;
use std::sync::Arc;

/// Which grammar produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Formula,
    Condition,
    Operation,
    Process,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Formula => "Formula",
            Stage::Condition => "Condition",
            Stage::Operation => "Operation",
            Stage::Process => "Process",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detailed error information with source location
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub stage: Stage,
    pub message: String,
    pub span: Span,
    /// The unconsumed source from the failure point onwards
    pub remaining: String,
    pub source_text: Arc<str>,
}

/// Error types for the numen engine
#[derive(Debug, Clone)]
pub enum NumenError {
    /// Grammar violation in one of the four languages, with source location
    Parse(Box<ErrorDetails>),

    /// Name or type registration failure
    Registry(String),

    /// Function registration failure
    Function(String),

    /// Malformed configuration catalog
    Catalog(String),

    /// Engine error without specific source location
    Engine(String),

    /// Input exceeded one of the configured size limits
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
    },
}

impl NumenError {
    /// Create a parse error with source information
    pub fn parse(
        stage: Stage,
        message: impl Into<String>,
        span: Span,
        remaining: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            stage,
            message: message.into(),
            span,
            remaining: remaining.into(),
            source_text,
        }))
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry(message.into())
    }

    /// Details of a parse error, `None` for every other kind
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            NumenError::Parse(details) => Some(details),
            _ => None,
        }
    }
}

impl fmt::Display for NumenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumenError::Parse(details) => {
                write!(
                    f,
                    "{} error: {} at line {}, column {}",
                    details.stage, details.message, details.span.line, details.span.col
                )?;
                if !details.remaining.is_empty() {
                    write!(f, " near `{}`", details.remaining)?;
                }
                Ok(())
            }
            NumenError::Registry(msg) => write!(f, "Registry error: {}", msg),
            NumenError::Function(msg) => write!(f, "Function error: {}", msg),
            NumenError::Catalog(msg) => write!(f, "Catalog error: {}", msg),
            NumenError::Engine(msg) => write!(f, "Engine error: {}", msg),
            NumenError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "Resource limit exceeded: {} (limit: {}, actual: {})",
                limit_name, limit_value, actual_value
            ),
        }
    }
}

impl std::error::Error for NumenError {}

impl From<serde_json::Error> for NumenError {
    fn from(err: serde_json::Error) -> Self {
        NumenError::Catalog(format!("invalid catalog JSON: {}", err))
    }
}

/// Failure raised by a user-supplied hook or listener callback
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;
