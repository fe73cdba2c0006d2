//! The command-invocation pipeline.
//!
//! [`CommandInvoker::execute`] drives one end-to-end invocation:
//!
//! 1. table-create event, command-table load
//! 2. rudimentary command resolution (case-insensitive command tokens),
//!    then lazy argument loading for just that command
//! 3. post-create and table-loaded events
//! 4. the no-argument fast path (welcome screen, exit 0)
//! 5. `help` token normalization, pre/post-parse events around the parse
//! 6. validator dispatch: a command-level validator supersedes every
//!    per-argument validator; all failures surface through one fatal
//!    validation channel unless they are user-facing [`CliError`]s
//! 7. deprecation/preview/experimental notices (explicit, accumulated
//!    from parsing, and inherited from the nearest marked ancestor group),
//!    printed to stderr in that fixed order unless only-show-errors mode
//!    is active
//! 8. handler dispatch over the filtered value map, result normalization,
//!    transform/filter events, and packaging with exit code 0
//!
//! The whole pipeline is one synchronous call stack; no concurrent
//! invocations are supported.

use serde_json::Value;

use crate::arguments::Validator;
use crate::commands::{
    ArgumentValues, CommandSession, CommandsLoader, Handler, TableTransformer,
};
use crate::error::{CliError, Error};
use crate::events::{EventDispatcher, EventId, EventPayload};
use crate::logging::{is_verbosity_flag, VerbosityConfig};
use crate::markers::{Deprecated, Experimental, Preview};
use crate::parser::{CommandParser, ParseOutcome};

/// The parsed result of one command line.
///
/// Values live in a plain map keyed by destination; validators may read
/// and rewrite them. Status markers accumulated during parsing ride in
/// dedicated lists rather than underscore-prefixed value keys, but the
/// handler filter still drops any underscore-prefixed key a validator may
/// have stashed.
#[derive(Debug, Clone, Default)]
pub struct CommandNamespace {
    /// The resolved full command name.
    pub command: String,
    /// Parsed values keyed by destination.
    pub values: ArgumentValues,
    /// Deprecation markers for arguments/aliases actually supplied.
    pub argument_deprecations: Vec<Deprecated>,
    /// Preview markers for arguments actually supplied.
    pub argument_previews: Vec<Preview>,
    /// Experimental markers for arguments actually supplied.
    pub argument_experimentals: Vec<Experimental>,
    pub(crate) func: Option<Handler>,
    pub(crate) validator: Option<Validator>,
    pub(crate) argument_validators: Vec<(String, Validator)>,
}

impl CommandNamespace {
    /// A fresh namespace for the named command.
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Self::default()
        }
    }

    /// Reads a parsed value.
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    /// Writes a value; validators use this to rewrite arguments.
    pub fn set(&mut self, dest: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(dest.into(), value.into());
    }

    /// The value map handed to the handler: every underscore-prefixed key
    /// is dropped (validator-private bookkeeping), and dispatch data never
    /// lives in the map to begin with.
    pub fn handler_values(&self) -> ArgumentValues {
        self.values
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Per-invocation bookkeeping, created fresh for each `execute` call.
#[derive(Debug, Clone, Default)]
pub struct InvocationData {
    /// The dispatched command, once known.
    pub command: String,
    /// The command string used for scope-applicability tests.
    pub command_string: String,
    /// Quiet mode: suppress status notices.
    pub only_show_errors: bool,
    /// Set when a result-filter collaborator rewrote the result.
    pub query_active: bool,
}

/// A packaged invocation result.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The handler's result, normalized to plain JSON data.
    pub result: Value,
    /// Always 0; failures surface as [`Error`] instead.
    pub exit_code: i32,
    /// The command's declared tabular projection, if any.
    pub table_transformer: Option<TableTransformer>,
    /// Whether a query collaborator rewrote the result.
    pub is_query_active: bool,
}

impl CommandResult {
    /// A successful, empty result (help screens, fast paths).
    pub fn empty() -> Self {
        Self {
            result: Value::Null,
            exit_code: 0,
            table_transformer: None,
            is_query_active: false,
        }
    }
}

/// Orchestrates one CLI invocation; see the module docs.
pub struct CommandInvoker {
    /// The session owning all registration state.
    pub session: CommandSession,
    loader: Box<dyn CommandsLoader>,
    /// The live parser tree.
    pub parser: CommandParser,
    /// Event registry for external collaborators.
    pub events: EventDispatcher,
    /// Per-invocation data; reset at the start of each `execute`.
    pub data: InvocationData,
}

impl CommandInvoker {
    /// Builds an invoker around a session and its loader.
    pub fn new(session: CommandSession, loader: Box<dyn CommandsLoader>) -> Self {
        let parser = CommandParser::new(session.cli_name.clone(), session.version.clone());
        Self {
            session,
            loader,
            parser,
            events: EventDispatcher::new(),
            data: InvocationData::default(),
        }
    }

    /// Runs one complete invocation over raw argv (program name excluded).
    pub fn execute(&mut self, args: &[String]) -> Result<CommandResult, Error> {
        self.data = InvocationData::default();

        let mut payload = EventPayload::Args(args.to_vec());
        self.events.emit(EventId::CommandTableCreate, &mut payload)?;

        self.loader.load_command_table(&mut self.session)?;

        let mut args = args.to_vec();
        let command = self.rudimentary_get_command(&mut args);
        log::debug!("resolved command: '{command}'");
        self.session.set_command_string(&command);
        self.data.command_string = command.clone();

        self.loader.load_arguments(&mut self.session, &command)?;
        self.session.resolve_arguments(&command)?;

        let mut payload = EventPayload::Args(args.clone());
        self.events.emit(EventId::PostCommandTableCreate, &mut payload)?;
        self.parser.load_command_table(&self.session)?;
        self.events
            .emit(EventId::CommandTableLoaded, &mut EventPayload::None)?;

        let verbosity = VerbosityConfig::from_args(&args);
        self.data.only_show_errors = verbosity.only_show_errors;

        // nothing but verbosity flags: show the welcome screen and succeed
        if args.is_empty() || args.iter().all(|arg| is_verbosity_flag(arg)) {
            println!("{}", self.parser.render_welcome());
            return Ok(CommandResult::empty());
        }

        if args[0] == "help" {
            args[0] = "--help".to_string();
        }

        let mut payload = EventPayload::Args(args.clone());
        self.events.emit(EventId::PreParseArgs, &mut payload)?;
        let outcome = self.parser.parse(&args)?;
        let mut payload = EventPayload::Args(args.clone());
        self.events.emit(EventId::PostParseArgs, &mut payload)?;

        let mut namespace = match outcome {
            ParseOutcome::Help(text) => {
                println!("{text}");
                return Ok(CommandResult::empty());
            }
            ParseOutcome::Parsed(namespace) => namespace,
        };

        self.run_validators(&mut namespace)?;

        self.data.command = namespace.command.clone();
        let func = namespace.func.clone().ok_or_else(|| {
            Error::Parsing(format!("command '{}' is not runnable", namespace.command))
        })?;

        let (deprecations, previews, experimentals) = self.collect_markers(&namespace);
        if !self.data.only_show_errors {
            for marker in &deprecations {
                eprintln!("{}", marker.message());
            }
            for marker in &previews {
                eprintln!("{}", marker.message());
            }
            for marker in &experimentals {
                eprintln!("{}", marker.message());
            }
        }

        let kwargs = namespace.handler_values();
        let result = func.invoke(&kwargs).map_err(Error::Handler)?;

        let mut payload = EventPayload::Result {
            value: result,
            query_active: self.data.query_active,
        };
        self.events.emit(EventId::TransformResult, &mut payload)?;
        self.events.emit(EventId::FilterResult, &mut payload)?;
        let (result, query_active) = payload.into_result();
        self.data.query_active = query_active;

        let table_transformer = self
            .session
            .command_table
            .get(&namespace.command)
            .and_then(|command| command.table_transformer.clone());

        Ok(CommandResult {
            result,
            exit_code: 0,
            table_transformer,
            is_query_active: query_active,
        })
    }

    /// Determines the dispatched command before real parsing: greedily
    /// collect leading non-flag tokens, then drop trailing tokens until the
    /// joined lowercase prefix matches some registered command name's
    /// prefix (a positional may directly follow the command name). The
    /// identified command tokens are lowercased in place, making command
    /// dispatch case-insensitive while argument values stay untouched.
    fn rudimentary_get_command(&self, args: &mut [String]) -> String {
        let mut nouns: Vec<String> = args
            .iter()
            .take_while(|arg| !arg.starts_with('-'))
            .cloned()
            .collect();

        let table = &self.session.command_table;
        let matches_prefix = |nouns: &[String]| {
            let search = nouns.join(" ").to_lowercase();
            table.keys().any(|name| name.starts_with(&search))
        };

        while !nouns.is_empty() && !matches_prefix(&nouns) {
            nouns.pop();
        }
        for index in 0..nouns.len() {
            args[index] = args[index].to_lowercase();
        }
        nouns.join(" ").to_lowercase()
    }

    /// Runs validators per the precedence contract: the command-level
    /// validator alone when present, otherwise every per-argument validator
    /// in registration order.
    fn run_validators(&self, namespace: &mut CommandNamespace) -> Result<(), Error> {
        if let Some(validator) = namespace.validator.clone() {
            return validator.run(namespace).map_err(normalize_validator_error);
        }
        for (_, validator) in namespace.argument_validators.clone() {
            validator.run(namespace).map_err(normalize_validator_error)?;
        }
        Ok(())
    }

    /// Combines argument-accumulated markers, the command's own markers,
    /// and implicit markers inherited from the nearest marked ancestor
    /// group (independently per category).
    pub(crate) fn collect_markers(
        &self,
        namespace: &CommandNamespace,
    ) -> (Vec<Deprecated>, Vec<Preview>, Vec<Experimental>) {
        let mut deprecations = namespace.argument_deprecations.clone();
        let mut previews = namespace.argument_previews.clone();
        let mut experimentals = namespace.argument_experimentals.clone();

        if let Some(command) = self.session.command_table.get(&namespace.command) {
            if let Some(info) = &command.deprecate_info {
                deprecations.push(info.clone());
            }
            if let Some(info) = &command.preview_info {
                previews.push(info.clone());
            }
            if let Some(info) = &command.experimental_info {
                experimentals.push(info.clone());
            }
        }

        let segments: Vec<&str> = namespace.command.split_whitespace().collect();
        let mut implicit_deprecation = None;
        let mut implicit_preview = None;
        let mut implicit_experimental = None;
        for depth in (1..segments.len()).rev() {
            let prefix = segments[..depth].join(" ");
            let Some(group) = self.session.command_group_table.get(&prefix) else {
                continue;
            };
            if implicit_deprecation.is_none() {
                if let Some(info) = &group.deprecate_info {
                    implicit_deprecation = Some(info.as_implicit_command(&namespace.command));
                }
            }
            if implicit_preview.is_none() {
                if let Some(info) = &group.preview_info {
                    implicit_preview = Some(info.as_implicit_command(&namespace.command));
                }
            }
            if implicit_experimental.is_none() {
                if let Some(info) = &group.experimental_info {
                    implicit_experimental = Some(info.as_implicit_command(&namespace.command));
                }
            }
        }
        deprecations.extend(implicit_deprecation);
        previews.extend(implicit_preview);
        experimentals.extend(implicit_experimental);

        (deprecations, previews, experimentals)
    }
}

impl std::fmt::Debug for CommandInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInvoker")
            .field("session", &self.session)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

fn normalize_validator_error(err: anyhow::Error) -> Error {
    match err.downcast::<CliError>() {
        Ok(cli_error) => Error::Cli(cli_error),
        Err(other) => Error::Validation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{ArgumentType, ValueKind};
    use crate::commands::CliCommand;
    use crate::markers::{Experimental, TargetKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn to_args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    struct StaticLoader {
        calls: Rc<Cell<u32>>,
    }

    impl CommandsLoader for StaticLoader {
        fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
            let calls = self.calls.clone();
            session.add_command(
                CliCommand::new("item list")
                    .description("List items.")
                    .arg_with("top", ArgumentType::new().value_kind(ValueKind::Int).default(10))
                    .handler(move |values| {
                        calls.set(calls.get() + 1);
                        Ok::<_, anyhow::Error>(values.clone())
                    }),
            );
            session.add_command(
                CliCommand::new("item show")
                    .arg("name")
                    .handler(|values| Ok::<_, anyhow::Error>(values.clone())),
            );
            Ok(())
        }

        fn load_arguments(
            &mut self,
            session: &mut CommandSession,
            _command: &str,
        ) -> Result<(), Error> {
            let mut ctx = session.argument_context("item");
            ctx.argument("top", ArgumentType::new().help("Limit."))?;
            ctx.close();
            let mut ctx = session.argument_context("item show");
            ctx.positional("name", ArgumentType::new())?;
            ctx.close();
            Ok(())
        }
    }

    fn invoker() -> (CommandInvoker, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let session = CommandSession::new("invy", "1.0.0");
        let loader = StaticLoader {
            calls: calls.clone(),
        };
        (CommandInvoker::new(session, Box::new(loader)), calls)
    }

    #[test]
    fn test_end_to_end_dispatch() {
        let (mut invoker, calls) = invoker();
        let result = invoker
            .execute(&to_args(&["item", "list", "--top", "3"]))
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(calls.get(), 1);
        assert_eq!(result.result["top"], serde_json::json!(3));
    }

    #[test]
    fn test_command_dispatch_is_case_insensitive() {
        let (mut invoker, _) = invoker();
        let result = invoker
            .execute(&to_args(&["ITEM", "Show", "BoLt"]))
            .unwrap();
        // command tokens lowercased, the positional value untouched
        assert_eq!(invoker.data.command, "item show");
        assert_eq!(result.result["name"], serde_json::json!("BoLt"));
    }

    #[test]
    fn test_rudimentary_command_stops_at_flags() {
        let (mut invoker, _) = invoker();
        invoker
            .loader
            .load_command_table(&mut invoker.session)
            .unwrap();
        let mut args = to_args(&["item", "list", "--top", "x"]);
        let command = invoker.rudimentary_get_command(&mut args);
        assert_eq!(command, "item list");
    }

    #[test]
    fn test_rudimentary_command_drops_trailing_positional() {
        let (mut invoker, _) = invoker();
        invoker
            .loader
            .load_command_table(&mut invoker.session)
            .unwrap();
        let mut args = to_args(&["item", "show", "bolt"]);
        let command = invoker.rudimentary_get_command(&mut args);
        assert_eq!(command, "item show");
        assert_eq!(args, to_args(&["item", "show", "bolt"]));
    }

    #[test]
    fn test_empty_args_fast_path_skips_handler() {
        let (mut invoker, calls) = invoker();
        let result = invoker.execute(&[]).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_verbose_only_fast_path_skips_handler() {
        let (mut invoker, calls) = invoker();
        let result = invoker.execute(&to_args(&["--verbose"])).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_help_token_behaves_like_help_flag() {
        let (mut invoker, calls) = invoker();
        let result = invoker.execute(&to_args(&["help"])).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_command_validator_supersedes_argument_validators() {
        let command_ran = Rc::new(Cell::new(false));
        let argument_ran = Rc::new(Cell::new(false));

        struct Loader {
            command_ran: Rc<Cell<bool>>,
            argument_ran: Rc<Cell<bool>>,
        }
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                let command_ran = self.command_ran.clone();
                let argument_ran = self.argument_ran.clone();
                session.add_command(
                    CliCommand::new("run")
                        .arg_with(
                            "x",
                            ArgumentType::new().validator(move |_| {
                                argument_ran.set(true);
                                Ok(())
                            }),
                        )
                        .validator(move |_| {
                            command_ran.set(true);
                            Ok(())
                        })
                        .handler(|_| Ok::<_, anyhow::Error>(())),
                );
                Ok(())
            }
        }

        let mut invoker = CommandInvoker::new(
            CommandSession::new("invy", "1.0.0"),
            Box::new(Loader {
                command_ran: command_ran.clone(),
                argument_ran: argument_ran.clone(),
            }),
        );
        invoker.execute(&to_args(&["run"])).unwrap();
        assert!(command_ran.get());
        assert!(!argument_ran.get());
    }

    #[test]
    fn test_validator_error_normalized() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_command(
                    CliCommand::new("run")
                        .validator(|_| Err(anyhow::anyhow!("bad combination")))
                        .handler(|_| Ok::<_, anyhow::Error>(())),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        let err = invoker.execute(&to_args(&["run"])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("bad combination"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_validator_cli_error_passes_through() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_command(
                    CliCommand::new("run")
                        .validator(|_| Err(CliError::new("told you so").into()))
                        .handler(|_| Ok::<_, anyhow::Error>(())),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        let err = invoker.execute(&to_args(&["run"])).unwrap_err();
        assert!(matches!(err, Error::Cli(_)));
        assert_eq!(err.to_string(), "told you so");
    }

    #[test]
    fn test_implicit_experimental_from_ancestor_group() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_group(
                    "lab",
                    crate::commands::CommandGroup::new().experimental(Experimental::new(
                        "lab",
                        TargetKind::CommandGroup,
                    )),
                );
                session.add_command(
                    CliCommand::new("lab run").handler(|_| Ok::<_, anyhow::Error>(())),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        invoker.execute(&to_args(&["lab", "run"])).unwrap();

        let namespace = CommandNamespace::new("lab run");
        let (deprecations, previews, experimentals) = invoker.collect_markers(&namespace);
        assert!(deprecations.is_empty());
        assert!(previews.is_empty());
        assert_eq!(experimentals.len(), 1);
        assert_eq!(experimentals[0].target, "lab run");
        assert_eq!(experimentals[0].object_type, TargetKind::Command);
    }

    #[test]
    fn test_nearest_ancestor_marker_wins() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_group(
                    "a",
                    crate::commands::CommandGroup::new()
                        .preview(Preview::new("a", TargetKind::CommandGroup).with_message("outer")),
                );
                session.add_group(
                    "a b",
                    crate::commands::CommandGroup::new()
                        .preview(Preview::new("a b", TargetKind::CommandGroup).with_message("inner")),
                );
                session.add_command(
                    CliCommand::new("a b run").handler(|_| Ok::<_, anyhow::Error>(())),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        invoker.execute(&to_args(&["a", "b", "run"])).unwrap();

        let namespace = CommandNamespace::new("a b run");
        let (_, previews, _) = invoker.collect_markers(&namespace);
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].message(), "inner");
    }

    #[test]
    fn test_transform_event_rewrites_result() {
        let (mut invoker, _) = invoker();
        invoker.events.register(EventId::TransformResult, |payload| {
            if let Some(value) = payload.result_mut() {
                *value = serde_json::json!({"projected": true});
            }
            payload.set_query_active(true);
            Ok(())
        });
        let result = invoker.execute(&to_args(&["item", "list"])).unwrap();
        assert_eq!(result.result, serde_json::json!({"projected": true}));
        assert!(result.is_query_active);
    }

    #[test]
    fn test_table_transformer_carried_on_result() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_command(
                    CliCommand::new("run")
                        .table_transformer(|value| serde_json::json!([{ "v": value }]))
                        .handler(|_| Ok::<_, anyhow::Error>(1)),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        let result = invoker.execute(&to_args(&["run"])).unwrap();
        let transformer = result.table_transformer.expect("transformer carried");
        assert_eq!(
            transformer.apply(&result.result),
            serde_json::json!([{ "v": 1 }])
        );
    }

    #[test]
    fn test_handler_error_not_rewrapped() {
        struct Loader;
        impl CommandsLoader for Loader {
            fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
                session.add_command(
                    CliCommand::new("run")
                        .handler(|_| Err::<(), _>(anyhow::anyhow!("backend down"))),
                );
                Ok(())
            }
        }
        let mut invoker =
            CommandInvoker::new(CommandSession::new("invy", "1.0.0"), Box::new(Loader));
        let err = invoker.execute(&to_args(&["run"])).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert!(err.to_string().contains("backend down"));
    }

    #[test]
    fn test_namespace_handler_values_filter_private_keys() {
        let mut namespace = CommandNamespace::new("run");
        namespace.set("top", 3);
        namespace.set("_private", "stash");
        let values = namespace.handler_values();
        assert!(values.contains_key("top"));
        assert!(!values.contains_key("_private"));
    }

    #[test]
    fn test_unknown_command_surfaces_suggestions() {
        let (mut invoker, _) = invoker();
        let err = invoker
            .execute(&to_args(&["item", "lst"]))
            .unwrap_err();
        match err {
            Error::UnknownSubcommand { suggestions, .. } => {
                assert!(suggestions.contains(&"item list".to_string()));
            }
            other => panic!("expected UnknownSubcommand, got {other:?}"),
        }
    }
}
