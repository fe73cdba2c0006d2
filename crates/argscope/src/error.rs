//! Error taxonomy for the framework.
//!
//! Three families of failure flow through one enum:
//!
//! - **Authoring errors**: programmer misuse of the registration API
//!   (missing dest, positional on a group scope, stale context reuse).
//!   These surface during command-module development, not to end users.
//! - **User input errors**: unknown subcommands (with suggestions),
//!   parse failures, validator failures. These exit with status 2.
//! - **Handler errors**: whatever the command's business logic raised,
//!   carried as `anyhow::Error` and not re-wrapped here.
//!
//! [`CliError`] is the one error type validators and handlers may raise
//! that propagates to the user verbatim instead of being normalized into
//! a validation error.

use thiserror::Error;

/// A user-facing error with a message that is shown as-is.
///
/// Validators raising `CliError` bypass the validation-error normalization:
/// the message reaches the user unchanged. Any other validator error is
/// re-wrapped as [`Error::Validation`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CliError(pub String);

impl CliError {
    /// Creates a new user-facing error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors produced by registration, parsing, and invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Programmer misuse of the registration API.
    #[error("command authoring error: {0}")]
    Authoring(String),

    /// An [`ArgumentsContext`](crate::ArgumentsContext) was used after close.
    #[error("command authoring error: argument context '{0}' is stale! Check that the context is not used after it has been closed.")]
    StaleContext(String),

    /// The loader produced no commands at all.
    #[error("command table is empty; nothing to invoke")]
    EmptyCommandTable,

    /// A validator failed with an error that was not a [`CliError`].
    #[error("validation error: {0}")]
    Validation(String),

    /// An unrecognized subcommand, with fuzzy suggestions when any scored
    /// above the parser's cutoff.
    #[error("{}", unknown_subcommand_message(.group, .value, .suggestions))]
    UnknownSubcommand {
        /// The command group that was searched.
        group: String,
        /// The unrecognized token.
        value: String,
        /// Closest registered choices, best first.
        suggestions: Vec<String>,
    },

    /// Argument parsing failed (missing required value, bad choice, ...).
    #[error("{0}")]
    Parsing(String),

    /// An event handler failed.
    #[error(transparent)]
    Event(#[from] crate::events::EventError),

    /// A user-facing error raised by a validator or handler.
    #[error(transparent)]
    Cli(#[from] CliError),

    /// The command handler itself failed; not re-wrapped at this layer.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl Error {
    /// The process exit status this error maps to.
    ///
    /// Parse-level failures (unknown subcommand, bad arguments, validation)
    /// exit with 2, matching conventional parser behavior; everything else
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnknownSubcommand { .. } | Error::Parsing(_) | Error::Validation(_) => 2,
            _ => 1,
        }
    }
}

fn unknown_subcommand_message(group: &str, value: &str, suggestions: &[String]) -> String {
    let searched = if group.is_empty() {
        "the top-level command group".to_string()
    } else {
        format!("the '{group}' command group")
    };
    let mut msg = format!("'{value}' is not a command in {searched}.");
    if !suggestions.is_empty() {
        msg.push_str(&format!("\n\nThe most similar choices to '{value}':"));
        for s in suggestions {
            msg.push_str(&format!("\n    {s}"));
        }
    }
    msg
}
