//! Scoped argument registration and command invocation for clap-based CLIs.
//!
//! `argscope` is the framework core for large, modular command-line tools:
//! hundreds of thin command modules register commands and argument
//! overrides against a shared session, and a single invoker drives the
//! end-to-end pipeline from raw argv to a packaged result.
//!
//! # Features
//!
//! - **Scoped argument registry**: argument settings layer across
//!   whitespace-joined command-path prefixes: group-level defaults with
//!   per-command refinement, no explicit tree required
//! - **Registration contexts**: `argument`/`positional`/`extra`/`ignore`
//!   operations gated by staleness and applicability checks
//! - **Lazy parser tree**: group nodes materialize on demand into
//!   `clap::Command` values; expired deprecations are silently pruned
//! - **Invocation pipeline**: case-insensitive command resolution, events,
//!   validator precedence, deprecation/preview/experimental notices, and
//!   uniform result packaging
//! - **Structured output**: JSON/YAML/XML/CSV serialization of results
//!
//! # Example
//!
//! ```rust
//! use argscope::{
//!     ArgumentType, CliCommand, CommandInvoker, CommandSession, CommandsLoader, Error,
//!     ValueKind,
//! };
//!
//! struct Loader;
//!
//! impl CommandsLoader for Loader {
//!     fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
//!         session.add_command(
//!             CliCommand::new("item list")
//!                 .description("List items.")
//!                 .arg_with("top", ArgumentType::new().value_kind(ValueKind::Int).default(10))
//!                 .handler(|values| Ok::<_, anyhow::Error>(values.clone())),
//!         );
//!         Ok(())
//!     }
//! }
//!
//! let session = CommandSession::new("invy", "1.0.0");
//! let mut invoker = CommandInvoker::new(session, Box::new(Loader));
//! let args: Vec<String> = ["item", "list", "--top", "3"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let result = invoker.execute(&args)?;
//! assert_eq!(result.exit_code, 0);
//! assert_eq!(result.result["top"], serde_json::json!(3));
//! # Ok::<(), argscope::Error>(())
//! ```

// Core modules
mod arguments;
mod commands;
mod context;
mod error;
mod events;
mod invocation;
mod logging;
mod markers;
mod output;
mod parser;
mod serialize;

// Re-export core types
pub use arguments::{
    ignore_type, ArgAction, ArgKind, ArgumentRegistry, ArgumentType, Choices, CommandArgument,
    Completer, Nargs, OptionSpelling, ParserOptions, Setting, SettingField, Validator, ValueKind,
};

pub use commands::{
    ArgumentValues, CliCommand, CommandGroup, CommandSession, CommandsLoader, Description,
    Handler, TableTransformer,
};

pub use context::ArgumentsContext;

pub use error::{CliError, Error};

pub use events::{EventDispatcher, EventError, EventHandler, EventId, EventPayload};

pub use invocation::{CommandInvoker, CommandNamespace, CommandResult, InvocationData};

pub use markers::{Deprecated, Experimental, Preview, TargetKind};

pub use logging::{
    is_verbosity_flag, VerbosityConfig, DEBUG_FLAG, LOGGING_DESTS, ONLY_SHOW_ERRORS_FLAG,
    VERBOSE_FLAG,
};

pub use output::{format_result, OutputFormat};

pub use parser::{CommandParser, ParseOutcome};

pub use serialize::{serialize_csv, serialize_structured, to_json, to_xml, to_yaml, SerializeError};

/// Shells supported by completion-script generation, re-exported from
/// `clap_complete` for convenience.
pub use clap_complete::Shell;
