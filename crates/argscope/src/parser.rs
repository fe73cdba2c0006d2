//! The command-tree parser.
//!
//! [`CommandParser`] mirrors the command group hierarchy as a tree of
//! parser nodes keyed by path segments, built from the session's command
//! table. Group nodes are created lazily, walking each command's path left
//! to right so every ancestor exists before its children. Commands, groups,
//! and option aliases whose deprecation has expired are silently excluded
//! from the live tree.
//!
//! Parsing walks the tree over the leading non-flag tokens; an unknown
//! segment produces a fatal unknown-subcommand error carrying fuzzy
//! "did you mean" suggestions. Once a leaf is reached, the node is
//! materialized into a `clap::Command` and the remaining tokens are parsed
//! for real. Any argv token starting with `@` is replaced by the named
//! file's content beforehand, best effort.

use std::collections::HashSet;

use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};
use serde_json::Value;

use crate::arguments::{
    ArgAction, ArgKind, Choices, CommandArgument, Completer, Nargs, Validator, ValueKind,
};
use crate::commands::{CommandGroup, CommandSession, Description, Handler};
use crate::error::Error;
use crate::invocation::CommandNamespace;
use crate::markers::{Deprecated, Experimental, Preview};

/// Default minimum Jaro-Winkler similarity for a suggestion to be offered.
const DEFAULT_SUGGESTION_CUTOFF: f64 = 0.7;
/// At most this many suggestions are offered.
const MAX_SUGGESTIONS: usize = 3;

/// An argument after deprecation filtering, ready to hand to clap.
///
/// Completion and status metadata are not parser concepts; they ride along
/// here for the invoker to read after parsing.
#[derive(Debug, Clone)]
pub(crate) struct BuiltArgument {
    pub dest: String,
    pub kind: ArgKind,
    /// Surviving flag spellings; expired deprecated aliases are excluded.
    pub options: Vec<String>,
    /// Live deprecated aliases, target = the spelling.
    pub deprecated_options: Vec<Deprecated>,
    pub help: Option<String>,
    pub hidden: bool,
    pub metavar: Option<String>,
    pub action: ArgAction,
    pub nargs: Option<Nargs>,
    pub const_value: Option<Value>,
    pub default: Option<Value>,
    pub value_kind: ValueKind,
    pub choices: Option<Choices>,
    pub required: bool,
    pub arg_group: Option<String>,
    pub completer: Option<Completer>,
    pub deprecate_info: Option<Deprecated>,
    pub preview_info: Option<Preview>,
    pub experimental_info: Option<Experimental>,
    pub default_value_source: Option<String>,
}

impl BuiltArgument {
    /// Builds the parser-facing argument, or `None` when the argument's own
    /// deprecation has expired.
    fn from_argument(argument: &CommandArgument, cli_version: &str) -> Option<Self> {
        if let Some(info) = argument.deprecate_info() {
            if info.expired(cli_version) {
                return None;
            }
        }
        let opts = argument.options();

        let mut options = Vec::new();
        let mut deprecated_options = Vec::new();
        for spelling in &opts.options_list {
            match &spelling.deprecation {
                Some(info) if info.expired(cli_version) => continue,
                Some(info) => {
                    options.push(spelling.text.clone());
                    let mut info = info.clone();
                    if info.target.is_empty() {
                        info.target = spelling.text.clone();
                    }
                    deprecated_options.push(info);
                }
                None => options.push(spelling.text.clone()),
            }
        }

        let dest = argument.name().to_string();
        let metavar = opts.metavar.clone().or_else(|| {
            if argument.kind() == ArgKind::Positional || opts.default.is_some() {
                Some(dest.to_uppercase())
            } else {
                None
            }
        });
        let hidden =
            opts.hidden || argument.deprecate_info().map(|d| d.hide).unwrap_or(false);

        Some(Self {
            dest,
            kind: argument.kind(),
            options,
            deprecated_options,
            help: opts.help,
            hidden,
            metavar,
            action: opts.action,
            nargs: opts.nargs,
            const_value: opts.const_value,
            default: opts.default,
            value_kind: opts.value_kind,
            choices: opts.choices,
            required: opts.required,
            arg_group: argument.arg_group().map(str::to_string),
            completer: argument.completer().cloned(),
            deprecate_info: argument.deprecate_info().cloned(),
            preview_info: argument.preview_info().cloned(),
            experimental_info: argument.experimental_info().cloned(),
            default_value_source: argument.default_value_source().map(str::to_string),
        })
    }
}

/// Command-level dispatch data attached to a leaf node.
#[derive(Debug, Clone)]
pub(crate) struct NodeDefaults {
    pub func: Option<Handler>,
    pub command: String,
    pub validator: Option<Validator>,
    /// `(dest, validator)` pairs in registration order.
    pub argument_validators: Vec<(String, Validator)>,
}

/// One node in the parser tree: the root, a group, or a command.
#[derive(Debug, Clone)]
pub(crate) struct ParserNode {
    pub name: String,
    pub path: Vec<String>,
    pub description: Description,
    pub help_text: Option<String>,
    pub hidden: bool,
    pub children: Vec<ParserNode>,
    pub arguments: Vec<BuiltArgument>,
    pub defaults: Option<NodeDefaults>,
}

impl ParserNode {
    fn root(prog: &str) -> Self {
        Self {
            name: prog.to_string(),
            path: Vec::new(),
            description: Description::default(),
            help_text: None,
            hidden: false,
            children: Vec::new(),
            arguments: Vec::new(),
            defaults: None,
        }
    }

    fn group(name: &str, prefix: &str, group: Option<&CommandGroup>) -> Self {
        Self {
            name: name.to_string(),
            path: prefix.split_whitespace().map(str::to_string).collect(),
            description: group.map(|g| g.description.clone()).unwrap_or_default(),
            help_text: group.and_then(|g| g.help.clone()),
            hidden: group
                .and_then(|g| g.deprecate_info.as_ref())
                .map(|d| d.hide)
                .unwrap_or(false),
            children: Vec::new(),
            arguments: Vec::new(),
            defaults: None,
        }
    }

    /// A node dispatches only when it carries a handler function; anything
    /// else is a group (including placeholder commands with no function).
    pub fn is_group(&self) -> bool {
        self.defaults
            .as_ref()
            .map_or(true, |defaults| defaults.func.is_none())
    }

    fn child(&self, name: &str) -> Option<&ParserNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// What one parse produced: help text to show, or a parsed namespace.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Help/usage text; show it and exit successfully.
    Help(String),
    /// A fully parsed command namespace, ready for validation.
    Parsed(CommandNamespace),
}

/// The live parser tree for one session. See the module docs.
pub struct CommandParser {
    prog: String,
    version: String,
    root: ParserNode,
    loaded: bool,
    suggestion_cutoff: f64,
}

impl CommandParser {
    /// An empty parser for the named CLI.
    pub fn new(prog: impl Into<String>, version: impl Into<String>) -> Self {
        let prog = prog.into();
        Self {
            root: ParserNode::root(&prog),
            prog,
            version: version.into(),
            loaded: false,
            suggestion_cutoff: DEFAULT_SUGGESTION_CUTOFF,
        }
    }

    /// Adjusts the minimum similarity for "did you mean" suggestions.
    pub fn set_suggestion_cutoff(&mut self, cutoff: f64) {
        self.suggestion_cutoff = cutoff;
    }

    /// True once a command table has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Builds the parser tree from the session's command table.
    ///
    /// Fails when the table is empty. Commands and groups whose deprecation
    /// has expired are skipped rather than failing.
    pub fn load_command_table(&mut self, session: &CommandSession) -> Result<(), Error> {
        if session.command_table.is_empty() {
            return Err(Error::EmptyCommandTable);
        }
        self.root = ParserNode::root(&self.prog);

        for (name, command) in &session.command_table {
            if command
                .deprecate_info
                .as_ref()
                .map(|d| d.expired(&session.version))
                .unwrap_or(false)
            {
                continue;
            }
            let segments: Vec<&str> = name.split_whitespace().collect();
            let Some((leaf, parent_path)) = segments.split_last() else {
                continue;
            };
            let Some(parent) = self.get_subparser(parent_path, session) else {
                // the owning group's deprecation expired; drop the branch
                continue;
            };

            let mut arguments = Vec::new();
            let mut argument_validators = Vec::new();
            for argument in command.arguments() {
                let Some(built) = BuiltArgument::from_argument(argument, &session.version)
                else {
                    continue;
                };
                if let Some(validator) = argument.validator() {
                    argument_validators.push((argument.name().to_string(), validator.clone()));
                }
                arguments.push(built);
            }

            let node = ParserNode {
                name: leaf.to_string(),
                path: segments.iter().map(|s| s.to_string()).collect(),
                description: command.description.clone(),
                help_text: command.help.clone(),
                hidden: command
                    .deprecate_info
                    .as_ref()
                    .map(|d| d.hide)
                    .unwrap_or(false),
                children: Vec::new(),
                arguments,
                defaults: Some(NodeDefaults {
                    func: command.handler_ref().cloned(),
                    command: name.clone(),
                    validator: command.validator.clone(),
                    argument_validators,
                }),
            };
            match parent.children.iter_mut().find(|c| c.name == *leaf) {
                Some(existing) => *existing = node,
                None => parent.children.push(node),
            }
        }

        self.loaded = true;
        Ok(())
    }

    /// Resolves (creating on demand) the chain of group nodes down `path`.
    ///
    /// Walks left to right, so a parent is guaranteed to exist before its
    /// child is created. Returns `None` when a group along the path has an
    /// expired deprecation; the whole branch is skipped.
    fn get_subparser(
        &mut self,
        path: &[&str],
        session: &CommandSession,
    ) -> Option<&mut ParserNode> {
        let mut node = &mut self.root;
        for depth in 0..path.len() {
            let prefix = path[..=depth].join(" ");
            let group = session.command_group_table.get(&prefix);
            if let Some(group) = group {
                if group
                    .deprecate_info
                    .as_ref()
                    .map(|d| d.expired(&session.version))
                    .unwrap_or(false)
                {
                    return None;
                }
            }
            let index = match node.children.iter().position(|c| c.name == path[depth]) {
                Some(index) => index,
                None => {
                    node.children
                        .push(ParserNode::group(path[depth], &prefix, group));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        Some(node)
    }

    /// Replaces any `@path` token with the file's content, verbatim.
    /// Unreadable files leave the token untouched; this is best effort,
    /// not an error condition.
    pub fn expand_prefixed_files(args: &[String]) -> Vec<String> {
        args.iter()
            .map(|arg| match arg.strip_prefix('@') {
                Some(path) => match std::fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(err) => {
                        log::debug!("could not expand '@{path}': {err}");
                        arg.clone()
                    }
                },
                None => arg.clone(),
            })
            .collect()
    }

    /// Parses argv against the tree.
    ///
    /// Walks the leading non-flag tokens through the group hierarchy; an
    /// unknown segment fails with suggestions. A group endpoint yields its
    /// help text; a command endpoint is parsed for real.
    pub fn parse(&self, args: &[String]) -> Result<ParseOutcome, Error> {
        let args = Self::expand_prefixed_files(args);

        let mut node = &self.root;
        let mut index = 0;
        while index < args.len() {
            let token = &args[index];
            if token.starts_with('-') || !node.is_group() {
                break;
            }
            match node.child(token) {
                Some(child) => {
                    node = child;
                    index += 1;
                }
                None => {
                    return Err(Error::UnknownSubcommand {
                        group: node.path.join(" "),
                        value: token.clone(),
                        suggestions: self.suggestions(node, token),
                    });
                }
            }
        }

        if node.is_group() {
            return Ok(ParseOutcome::Help(self.render_help(node)));
        }

        let command = self
            .materialize_leaf(node, node.path.join(" "))
            .no_binary_name(true);
        match command.try_get_matches_from(&args[index..]) {
            Ok(matches) => Ok(ParseOutcome::Parsed(build_namespace(node, &matches, &args)?)),
            Err(err)
                if matches!(
                    err.kind(),
                    clap::error::ErrorKind::DisplayHelp
                        | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                        | clap::error::ErrorKind::DisplayVersion
                ) =>
            {
                Ok(ParseOutcome::Help(err.to_string()))
            }
            Err(err) => Err(Error::Parsing(err.to_string())),
        }
    }

    /// Fuzzy matches for an unknown segment among a group's children,
    /// best first, at most [`MAX_SUGGESTIONS`]. Suggestions carry the
    /// full command path so they can be retyped as-is.
    fn suggestions(&self, node: &ParserNode, value: &str) -> Vec<String> {
        let needle = value.to_lowercase();
        let prefix = node.path.join(" ");
        let mut scored: Vec<(f64, String)> = node
            .children
            .iter()
            .map(|child| {
                let full = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{prefix} {}", child.name)
                };
                (strsim::jaro_winkler(&needle, &child.name), full)
            })
            .filter(|(score, _)| *score >= self.suggestion_cutoff)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, name)| name)
            .collect()
    }

    /// The welcome screen: name, version, and the root group listing.
    pub fn render_welcome(&self) -> String {
        format!(
            "Welcome to {} {}\n\n{}",
            self.prog,
            self.version,
            self.render_help(&self.root)
        )
    }

    fn render_help(&self, node: &ParserNode) -> String {
        let mut command = self.materialize_node(node);
        command.render_long_help().to_string()
    }

    /// Writes a shell-completion script for the whole command tree.
    pub fn write_completions(&self, shell: clap_complete::Shell, buf: &mut dyn std::io::Write) {
        let mut command = self.materialize_node(&self.root);
        clap_complete::generate(shell, &mut command, self.prog.clone(), buf);
    }

    /// Materializes a node: leaves carry their arguments, groups carry
    /// their visible children.
    fn materialize_node(&self, node: &ParserNode) -> Command {
        if node.defaults.is_some() {
            return self.materialize_leaf(node, node.name.clone());
        }
        let name = if node.path.is_empty() {
            self.prog.clone()
        } else {
            node.name.clone()
        };
        let mut command = Command::new(name);
        if let Some(description) = node.description.resolve() {
            command = command.about(description.to_string());
        }
        if let Some(help) = &node.help_text {
            command = command.after_help(help.clone());
        }
        for child in &node.children {
            if child.hidden {
                continue;
            }
            command = command.subcommand(self.materialize_node(child));
        }
        command
    }

    fn materialize_leaf(&self, node: &ParserNode, name: String) -> Command {
        let mut command = Command::new(name);
        if let Some(description) = node.description.resolve() {
            command = command.about(description.to_string());
        }
        if let Some(help) = &node.help_text {
            command = command.after_help(help.clone());
        }
        for built in &node.arguments {
            command = command.arg(build_clap_arg(built));
        }
        add_global_args(command, node)
    }

    /// Runs the registered completer for one argument of one command,
    /// if there is one. This is the programmatic hook behind dynamic
    /// value completion; static command/flag completion comes from
    /// [`write_completions`](Self::write_completions).
    pub fn completions_for(&self, command: &str, dest: &str, prefix: &str) -> Vec<String> {
        self.node_for(command)
            .and_then(|node| node.arguments.iter().find(|a| a.dest == dest))
            .and_then(|argument| argument.completer.as_ref())
            .map(|completer| completer.complete(prefix))
            .unwrap_or_default()
    }

    pub(crate) fn node_for(&self, command: &str) -> Option<&ParserNode> {
        let mut node = &self.root;
        for segment in command.split_whitespace() {
            node = node.child(segment)?;
        }
        Some(node)
    }
}

impl std::fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandParser")
            .field("prog", &self.prog)
            .field("version", &self.version)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

/// Adds the global logging flags, skipping any dest a command already uses.
fn add_global_args(mut command: Command, node: &ParserNode) -> Command {
    let taken: HashSet<&str> = node.arguments.iter().map(|b| b.dest.as_str()).collect();
    if !taken.contains("verbose") {
        command = command.arg(
            Arg::new("verbose")
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("Increase logging verbosity; shows informational logs."),
        );
    }
    if !taken.contains("debug") {
        command = command.arg(
            Arg::new("debug")
                .long("debug")
                .action(clap::ArgAction::SetTrue)
                .help("Show full debug logs."),
        );
    }
    if !taken.contains("only_show_errors") {
        command = command.arg(
            Arg::new("only_show_errors")
                .long("only-show-errors")
                .action(clap::ArgAction::SetTrue)
                .help("Only show errors, suppressing warnings and notices."),
        );
    }
    command
}

/// Translates one built argument into a clap `Arg`.
fn build_clap_arg(built: &BuiltArgument) -> Arg {
    let mut arg = Arg::new(built.dest.clone());

    match built.kind {
        ArgKind::Positional => {
            arg = arg.value_name(
                built
                    .metavar
                    .clone()
                    .unwrap_or_else(|| built.dest.to_uppercase()),
            );
        }
        ArgKind::Named => {
            let mut longs = Vec::new();
            let mut shorts = Vec::new();
            for option in &built.options {
                if let Some(long) = option.strip_prefix("--") {
                    longs.push(long.to_string());
                } else if let Some(short) = option.strip_prefix('-') {
                    if let Some(ch) = short.chars().next() {
                        shorts.push(ch);
                    }
                }
            }
            let mut longs = longs.into_iter();
            if let Some(first) = longs.next() {
                arg = arg.long(first);
            }
            for alias in longs {
                arg = arg.visible_alias(alias);
            }
            let mut shorts = shorts.into_iter();
            if let Some(first) = shorts.next() {
                arg = arg.short(first);
            }
            for alias in shorts {
                arg = arg.short_alias(alias);
            }
            if let Some(metavar) = &built.metavar {
                arg = arg.value_name(metavar.clone());
            }
        }
    }

    if let Some(help) = &built.help {
        arg = arg.help(help.clone());
    }
    if built.hidden {
        arg = arg.hide(true);
    }
    if let Some(group) = &built.arg_group {
        arg = arg.help_heading(group.clone());
    }
    if built.required {
        arg = arg.required(true);
    }

    match built.action {
        ArgAction::StoreTrue => {
            arg = arg.action(clap::ArgAction::SetTrue);
        }
        ArgAction::Count => {
            arg = arg.action(clap::ArgAction::Count);
        }
        ArgAction::Append => {
            arg = apply_value_shape(arg.action(clap::ArgAction::Append), built);
        }
        ArgAction::Store => {
            arg = apply_value_shape(arg.action(clap::ArgAction::Set), built);
            if let Some(nargs) = built.nargs {
                arg = arg.num_args(value_range(nargs));
            }
        }
        ArgAction::Ignore => {
            arg = arg
                .action(clap::ArgAction::Set)
                .num_args(0..=1)
                .default_missing_value("")
                .hide(true);
        }
    }

    if let Some(const_value) = &built.const_value {
        arg = arg
            .num_args(0..=1)
            .default_missing_value(value_to_arg_string(const_value));
    }

    arg
}

fn apply_value_shape(arg: Arg, built: &BuiltArgument) -> Arg {
    if let Some(choices) = &built.choices {
        let mut arg = arg.value_parser(clap::builder::PossibleValuesParser::new(
            choices.values.clone(),
        ));
        if choices.ignore_case {
            arg = arg.ignore_case(true);
        }
        arg
    } else {
        match built.value_kind {
            ValueKind::Str => arg,
            ValueKind::Int => arg
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true),
            ValueKind::Float => arg
                .value_parser(clap::value_parser!(f64))
                .allow_negative_numbers(true),
            ValueKind::Bool => arg.value_parser(clap::value_parser!(bool)),
        }
    }
}

fn value_range(nargs: Nargs) -> clap::builder::ValueRange {
    match nargs {
        Nargs::Optional => (0..=1).into(),
        Nargs::ZeroOrMore => (0..).into(),
        Nargs::OneOrMore => (1..).into(),
        Nargs::Exact(n) => n.into(),
    }
}

fn value_to_arg_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts clap matches into the framework namespace, accumulating
/// status markers for every argument actually supplied on the command
/// line and rejecting supplied ignore-action arguments.
fn build_namespace(
    node: &ParserNode,
    matches: &ArgMatches,
    raw_args: &[String],
) -> Result<CommandNamespace, Error> {
    let Some(defaults) = &node.defaults else {
        return Err(Error::Parsing(format!(
            "'{}' is not a dispatchable command",
            node.path.join(" ")
        )));
    };
    let mut namespace = CommandNamespace::new(&defaults.command);

    for built in &node.arguments {
        let supplied = matches.value_source(&built.dest) == Some(ValueSource::CommandLine);
        if supplied {
            if built.action == ArgAction::Ignore {
                let flag = built
                    .options
                    .first()
                    .cloned()
                    .unwrap_or_else(|| built.dest.clone());
                return Err(Error::Parsing(format!("unrecognized argument: {flag}")));
            }
            if let Some(info) = &built.deprecate_info {
                namespace.argument_deprecations.push(info.clone());
            }
            for alias in &built.deprecated_options {
                let assigned = format!("{}=", alias.target);
                if raw_args
                    .iter()
                    .any(|token| token == &alias.target || token.starts_with(&assigned))
                {
                    namespace.argument_deprecations.push(alias.clone());
                }
            }
            if let Some(info) = &built.preview_info {
                namespace.argument_previews.push(info.clone());
            }
            if let Some(info) = &built.experimental_info {
                namespace.argument_experimentals.push(info.clone());
            }
        }
        if built.action == ArgAction::Ignore {
            continue;
        }
        let value = match extract_value(built, matches) {
            Some(value) => value,
            None => {
                if let (Some(_), Some(source)) = (&built.default, &built.default_value_source) {
                    log::debug!("'{}' defaulted from {source}", built.dest);
                }
                built.default.clone().unwrap_or(Value::Null)
            }
        };
        namespace.values.insert(built.dest.clone(), value);
    }

    namespace.func = defaults.func.clone();
    namespace.validator = defaults.validator.clone();
    namespace.argument_validators = defaults.argument_validators.clone();
    Ok(namespace)
}

fn extract_value(built: &BuiltArgument, matches: &ArgMatches) -> Option<Value> {
    let kind = if built.choices.is_some() {
        ValueKind::Str
    } else {
        built.value_kind
    };
    match built.action {
        ArgAction::StoreTrue => Some(Value::Bool(matches.get_flag(&built.dest))),
        ArgAction::Count => Some(Value::from(matches.get_count(&built.dest))),
        ArgAction::Ignore => None,
        ArgAction::Append => collect_many(&built.dest, kind, matches),
        ArgAction::Store => {
            let multiple = matches!(
                built.nargs,
                Some(Nargs::ZeroOrMore) | Some(Nargs::OneOrMore)
            ) || matches!(built.nargs, Some(Nargs::Exact(n)) if n > 1);
            if multiple {
                collect_many(&built.dest, kind, matches)
            } else {
                single_value(&built.dest, kind, matches)
            }
        }
    }
}

fn single_value(dest: &str, kind: ValueKind, matches: &ArgMatches) -> Option<Value> {
    match kind {
        ValueKind::Str => matches
            .get_one::<String>(dest)
            .map(|v| Value::String(v.clone())),
        ValueKind::Int => matches.get_one::<i64>(dest).map(|v| Value::from(*v)),
        ValueKind::Float => matches.get_one::<f64>(dest).map(|v| Value::from(*v)),
        ValueKind::Bool => matches.get_one::<bool>(dest).map(|v| Value::Bool(*v)),
    }
}

fn collect_many(dest: &str, kind: ValueKind, matches: &ArgMatches) -> Option<Value> {
    match kind {
        ValueKind::Str => matches
            .get_many::<String>(dest)
            .map(|vs| Value::Array(vs.map(|v| Value::String(v.clone())).collect())),
        ValueKind::Int => matches
            .get_many::<i64>(dest)
            .map(|vs| Value::Array(vs.map(|v| Value::from(*v)).collect())),
        ValueKind::Float => matches
            .get_many::<f64>(dest)
            .map(|vs| Value::Array(vs.map(|v| Value::from(*v)).collect())),
        ValueKind::Bool => matches
            .get_many::<bool>(dest)
            .map(|vs| Value::Array(vs.map(|v| Value::Bool(*v)).collect())),
    }
}
