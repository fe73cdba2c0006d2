//! Command table, command groups, handlers, and the command-loading session.
//!
//! [`CommandSession`] is the explicit object that owns all registration
//! state for one CLI process: the command table, the group table, the
//! scoped argument registry, and the extra-argument registry. It is
//! constructed once per invocation and passed by reference to contexts,
//! the parser, and the invoker; there is no module-level singleton, so
//! tests can build independent sessions freely.
//!
//! [`CommandsLoader`] is the collaborator contract: something that can
//! populate a session's command table up front and, lazily, the argument
//! registrations for one specific command.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use serde::Serialize;
use serde_json::Value;

use crate::arguments::{ArgumentRegistry, ArgumentType, CommandArgument, Validator};
use crate::context::ArgumentsContext;
use crate::error::Error;
use crate::markers::{Deprecated, Experimental, Preview};

/// The filtered mapping of parsed values a handler receives.
pub type ArgumentValues = BTreeMap<String, Value>;

/// A command's business-logic entry point.
///
/// Handlers receive the filtered value map and return any serializable
/// value; the framework normalizes it to plain JSON data at the seam, so
/// downstream transform/filter collaborators always see
/// nested-mapping/sequence/scalar structure.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&ArgumentValues) -> anyhow::Result<Value>>);

impl Handler {
    /// Wraps a handler function, normalizing its output to JSON data.
    pub fn new<T, F>(f: F) -> Self
    where
        T: Serialize,
        F: Fn(&ArgumentValues) -> anyhow::Result<T> + 'static,
    {
        Self(Rc::new(move |values| {
            let result = f(values)?;
            serde_json::to_value(result).map_err(Into::into)
        }))
    }

    /// Runs the handler.
    pub fn invoke(&self, values: &ArgumentValues) -> anyhow::Result<Value> {
        (self.0)(values)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Rewrites a result for tabular presentation.
#[derive(Clone)]
pub struct TableTransformer(Rc<dyn Fn(&Value) -> Value>);

impl TableTransformer {
    /// Wraps a transformation function.
    pub fn new(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Applies the transformation.
    pub fn apply(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for TableTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TableTransformer(..)")
    }
}

/// A command or group description: plain text, or a thunk resolved and
/// cached on first read.
///
/// The thunk form defers expensive help-text assembly until help is
/// actually requested; it is evaluated at most once.
#[derive(Clone, Default)]
pub struct Description {
    source: Option<DescriptionSource>,
    cached: Rc<OnceCell<String>>,
}

#[derive(Clone)]
enum DescriptionSource {
    Text(String),
    Thunk(Rc<dyn Fn() -> String>),
}

impl Description {
    /// A plain text description.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            source: Some(DescriptionSource::Text(text.into())),
            cached: Rc::new(OnceCell::new()),
        }
    }

    /// A deferred description, computed and cached on first access.
    pub fn lazy(f: impl Fn() -> String + 'static) -> Self {
        Self {
            source: Some(DescriptionSource::Thunk(Rc::new(f))),
            cached: Rc::new(OnceCell::new()),
        }
    }

    /// The description text, computing and caching a thunk on first call.
    pub fn resolve(&self) -> Option<&str> {
        match &self.source {
            None => None,
            Some(DescriptionSource::Text(text)) => Some(text),
            Some(DescriptionSource::Thunk(thunk)) => {
                Some(self.cached.get_or_init(|| thunk()).as_str())
            }
        }
    }

    /// True when no description was supplied.
    pub fn is_unset(&self) -> bool {
        self.source.is_none()
    }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            None => f.write_str("Description(unset)"),
            Some(DescriptionSource::Text(text)) => write!(f, "Description({text:?})"),
            Some(DescriptionSource::Thunk(_)) => f.write_str("Description(lazy)"),
        }
    }
}

/// One entry in the command table: metadata plus the handler.
#[derive(Debug, Clone)]
pub struct CliCommand {
    /// The full space-joined command name (e.g. `"item list"`).
    pub name: String,
    handler: Option<Handler>,
    argument_decls: Vec<(String, ArgumentType)>,
    arguments: Vec<CommandArgument>,
    /// Command-level validator; when present it supersedes every
    /// per-argument validator.
    pub validator: Option<Validator>,
    /// Short description shown in listings.
    pub description: Description,
    /// Long-form help appended after the generated usage.
    pub help: Option<String>,
    /// Deprecation marker for the whole command.
    pub deprecate_info: Option<Deprecated>,
    /// Preview marker for the whole command.
    pub preview_info: Option<Preview>,
    /// Experimental marker for the whole command.
    pub experimental_info: Option<Experimental>,
    /// Declared tabular projection for the result.
    pub table_transformer: Option<TableTransformer>,
}

impl CliCommand {
    /// A new command with no handler (a placeholder until one is attached).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
            argument_decls: Vec::new(),
            arguments: Vec::new(),
            validator: None,
            description: Description::default(),
            help: None,
            deprecate_info: None,
            preview_info: None,
            experimental_info: None,
            table_transformer: None,
        }
    }

    /// Attaches the handler function.
    pub fn handler<T, F>(mut self, f: F) -> Self
    where
        T: Serialize,
        F: Fn(&ArgumentValues) -> anyhow::Result<T> + 'static,
    {
        self.handler = Some(Handler::new(f));
        self
    }

    /// Declares an argument destination with no baseline settings; the
    /// registry supplies everything at resolution time.
    pub fn arg(self, dest: impl Into<String>) -> Self {
        self.arg_with(dest, ArgumentType::new())
    }

    /// Declares an argument destination with baseline settings the registry
    /// may refine.
    pub fn arg_with(mut self, dest: impl Into<String>, base: ArgumentType) -> Self {
        let dest = dest.into();
        match self.argument_decls.iter_mut().find(|(d, _)| *d == dest) {
            Some((_, existing)) => *existing = base,
            None => self.argument_decls.push((dest, base)),
        }
        self
    }

    /// Sets the command-level validator.
    pub fn validator(
        mut self,
        f: impl Fn(&mut crate::invocation::CommandNamespace) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.validator = Some(Validator::new(f));
        self
    }

    /// Sets a plain-text description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Description::text(text);
        self
    }

    /// Sets a deferred description, resolved on first help access.
    pub fn description_lazy(mut self, f: impl Fn() -> String + 'static) -> Self {
        self.description = Description::lazy(f);
        self
    }

    /// Sets the long-form help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Marks the whole command deprecated.
    pub fn deprecated(mut self, info: Deprecated) -> Self {
        self.deprecate_info = Some(info);
        self
    }

    /// Marks the whole command as preview.
    pub fn preview(mut self, info: Preview) -> Self {
        self.preview_info = Some(info);
        self
    }

    /// Marks the whole command experimental.
    pub fn experimental(mut self, info: Experimental) -> Self {
        self.experimental_info = Some(info);
        self
    }

    /// Declares the tabular projection for the result.
    pub fn table_transformer(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.table_transformer = Some(TableTransformer::new(f));
        self
    }

    /// The handler, if one is attached.
    pub fn handler_ref(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// The resolved arguments (empty until the session resolves them).
    pub fn arguments(&self) -> &[CommandArgument] {
        &self.arguments
    }

    /// Looks up a resolved argument by destination.
    pub fn argument(&self, dest: &str) -> Option<&CommandArgument> {
        self.arguments.iter().find(|a| a.name() == dest)
    }

    pub(crate) fn argument_decls(&self) -> &[(String, ArgumentType)] {
        &self.argument_decls
    }

    pub(crate) fn set_arguments(&mut self, arguments: Vec<CommandArgument>) {
        self.arguments = arguments;
    }
}

/// Metadata for a non-leaf command group.
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    /// Short description shown in listings.
    pub description: Description,
    /// Long-form help for the group.
    pub help: Option<String>,
    /// Deprecation marker; commands underneath inherit an implicit one.
    pub deprecate_info: Option<Deprecated>,
    /// Preview marker; inherited implicitly by commands underneath.
    pub preview_info: Option<Preview>,
    /// Experimental marker; inherited implicitly by commands underneath.
    pub experimental_info: Option<Experimental>,
}

impl CommandGroup {
    /// A new, empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a plain-text description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Description::text(text);
        self
    }

    /// Sets the long-form help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Marks the group deprecated.
    pub fn deprecated(mut self, info: Deprecated) -> Self {
        self.deprecate_info = Some(info);
        self
    }

    /// Marks the group as preview.
    pub fn preview(mut self, info: Preview) -> Self {
        self.preview_info = Some(info);
        self
    }

    /// Marks the group experimental.
    pub fn experimental(mut self, info: Experimental) -> Self {
        self.experimental_info = Some(info);
        self
    }
}

/// All registration state for one CLI process.
pub struct CommandSession {
    /// The CLI's program name (used for help and completions).
    pub cli_name: String,
    /// The CLI's version, compared against deprecation expirations.
    pub version: String,
    /// Full command name -> command metadata.
    pub command_table: BTreeMap<String, CliCommand>,
    /// Group path -> group metadata.
    pub command_group_table: BTreeMap<String, CommandGroup>,
    /// The scoped argument registry.
    pub argument_registry: ArgumentRegistry,
    /// When true, applicability checks pass unconditionally; used when
    /// generating help for every command at once.
    pub skip_applicability: bool,
    extra_arguments: HashMap<String, Vec<CommandArgument>>,
    command_string: String,
}

impl CommandSession {
    /// A fresh session for the named CLI.
    pub fn new(cli_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            cli_name: cli_name.into(),
            version: version.into(),
            command_table: BTreeMap::new(),
            command_group_table: BTreeMap::new(),
            argument_registry: ArgumentRegistry::new(),
            skip_applicability: false,
            extra_arguments: HashMap::new(),
            command_string: String::new(),
        }
    }

    /// Adds (or replaces) a command in the table.
    pub fn add_command(&mut self, command: CliCommand) {
        self.command_table.insert(command.name.clone(), command);
    }

    /// Adds (or replaces) group metadata.
    pub fn add_group(&mut self, name: impl Into<String>, group: CommandGroup) {
        self.command_group_table.insert(name.into(), group);
    }

    /// Opens a registration context bound to one scope.
    pub fn argument_context(&mut self, scope: impl Into<String>) -> ArgumentsContext<'_> {
        ArgumentsContext::new(self, scope.into())
    }

    /// The command string of the current invocation, used by applicability
    /// checks. Empty until the invoker resolves a command.
    pub fn command_string(&self) -> &str {
        &self.command_string
    }

    pub(crate) fn set_command_string(&mut self, command: &str) {
        self.command_string = command.to_string();
    }

    pub(crate) fn add_extra_argument(&mut self, scope: &str, argument: CommandArgument) {
        let entries = self.extra_arguments.entry(scope.to_string()).or_default();
        match entries.iter_mut().find(|a| a.name() == argument.name()) {
            Some(existing) => *existing = argument,
            None => entries.push(argument),
        }
    }

    /// Resolves the effective arguments for one command: each declared
    /// destination merged with the registry's scope hierarchy, plus any
    /// extra arguments registered for the command.
    ///
    /// Unknown command names resolve to nothing; the parser reports them.
    pub fn resolve_arguments(&mut self, command: &str) -> Result<(), Error> {
        let Some(cmd) = self.command_table.get(command) else {
            return Ok(());
        };
        let decls = cmd.argument_decls().to_vec();
        let mut resolved = Vec::with_capacity(decls.len());
        for (dest, base) in &decls {
            let merged = self
                .argument_registry
                .get_cli_argument(command, dest)
                .overriding(base);
            resolved.push(CommandArgument::new(dest, merged)?);
        }
        if let Some(extras) = self.extra_arguments.get(command) {
            for extra in extras {
                match resolved.iter_mut().find(|a| a.name() == extra.name()) {
                    Some(existing) => *existing = extra.clone(),
                    None => resolved.push(extra.clone()),
                }
            }
        }
        if let Some(cmd) = self.command_table.get_mut(command) {
            cmd.set_arguments(resolved);
        }
        Ok(())
    }

    /// Resolves arguments for every command in the table; used for
    /// whole-tree help and completion generation.
    pub fn resolve_all_arguments(&mut self) -> Result<(), Error> {
        let names: Vec<String> = self.command_table.keys().cloned().collect();
        for name in names {
            self.resolve_arguments(&name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSession")
            .field("cli_name", &self.cli_name)
            .field("version", &self.version)
            .field("commands", &self.command_table.len())
            .field("groups", &self.command_group_table.len())
            .field("skip_applicability", &self.skip_applicability)
            .finish()
    }
}

/// The collaborator that populates a session.
///
/// `load_command_table` runs once per invocation; `load_arguments` runs
/// lazily for the one command being dispatched, so unrelated command
/// modules never pay their argument-registration cost.
pub trait CommandsLoader {
    /// Populates the command and group tables.
    fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error>;

    /// Registers argument overrides relevant to `command`. The default does
    /// nothing, for loaders that declare everything inline on the commands.
    fn load_arguments(&mut self, session: &mut CommandSession, command: &str) -> Result<(), Error> {
        let _ = (session, command);
        Ok(())
    }
}
