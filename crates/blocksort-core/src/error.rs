use thiserror::Error;

/// A configured pattern that could not be used.
///
/// The engine keeps running with the default pattern for the affected rule; hosts read
/// these back through [`Session::config_errors`](crate::Session::config_errors).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid regex for {rule}: '{pattern}': {message}")]
    /// A regex pattern failed to compile.
    InvalidRegex {
        /// Name of the configuration rule (e.g. `incompleteBlockRegex`).
        rule: String,
        /// The offending pattern source.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("invalid tab size {0}, using 4")]
    /// Tab size must be at least one column.
    InvalidTabSize(usize),

    #[error("unknown folding family '{key}' referenced by '{family}'")]
    /// An `abortOn` entry names a family that is not configured.
    UnknownFoldingFamily {
        /// Family carrying the `abortOn` entry.
        family: String,
        /// The missing family key.
        key: String,
    },
}

/// A `@blocksort` directive that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("line {0} does not contain a @blocksort directive")]
    /// The line has no directive.
    Missing(usize),

    #[error("invalid sort depth '{0}'")]
    /// The depth argument is neither a number nor `inf`/`infinite`.
    InvalidDepth(String),
}

/// Returned internally when a [`CancellationToken`](crate::CancellationToken) fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;
