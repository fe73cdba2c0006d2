//! Argument settings, layered overrides, and the scoped argument registry.
//!
//! [`ArgumentType`] is a bag of per-argument settings where every field is a
//! three-state [`Setting`]: inherited (unset), explicitly set, or explicitly
//! removed. Layers of `ArgumentType` values merge with last-write-wins per
//! field, which is what lets a command module register broad defaults at a
//! group scope and refine them per command.
//!
//! [`ArgumentRegistry`] stores one `ArgumentType` per `(scope, dest)` pair.
//! Scopes are whitespace-joined command-path prefixes; no tree structure is
//! stored. Resolution walks every prefix of a command path from shortest to
//! longest and merges whatever overrides exist along the way, so the longest
//! matching scope wins field-by-field.
//!
//! [`CommandArgument`] pairs a resolved `ArgumentType` with a mandatory
//! destination name and an explicit positional/named tag.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Error;
use crate::invocation::CommandNamespace;
use crate::markers::{Deprecated, Experimental, Preview};

/// A three-state override cell: the layering primitive.
///
/// `Inherit` means "no opinion at this layer" and leaves whatever an earlier
/// layer decided in place. `Remove` actively deletes an inherited value, so
/// a later layer can strip a setting a broader scope established. `Set`
/// overrides outright.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting<T> {
    /// No opinion at this layer; earlier layers win.
    Inherit,
    /// Actively delete whatever an earlier layer set.
    Remove,
    /// Override with this value.
    Set(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Inherit
    }
}

impl<T> Setting<T> {
    /// The value, if explicitly set.
    pub fn get(&self) -> Option<&T> {
        match self {
            Setting::Set(value) => Some(value),
            _ => None,
        }
    }

    /// True if this cell carries a value.
    pub fn is_set(&self) -> bool {
        matches!(self, Setting::Set(_))
    }

    /// True if this cell has no opinion.
    pub fn is_inherit(&self) -> bool {
        matches!(self, Setting::Inherit)
    }
}

impl<T: Clone> Setting<T> {
    /// Merges `other` into `self`: anything but `Inherit` overwrites.
    pub(crate) fn merge_from(&mut self, other: &Setting<T>) {
        if !other.is_inherit() {
            *self = other.clone();
        }
    }

    /// The value, cloned, if explicitly set.
    pub fn cloned(&self) -> Option<T> {
        self.get().cloned()
    }
}

/// Whether an argument is supplied positionally or by flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgKind {
    /// Supplied via an option flag (`--name value`).
    #[default]
    Named,
    /// Supplied positionally; at most one per command.
    Positional,
}

/// How a supplied argument maps onto the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgAction {
    /// Store the supplied value (the default).
    #[default]
    Store,
    /// Boolean flag: true when present.
    StoreTrue,
    /// Collect repeated occurrences into a list.
    Append,
    /// Count occurrences.
    Count,
    /// Accept the flag in the grammar but fail if it is ever supplied.
    /// Used by [`ignore_type`] to deactivate introspected parameters.
    Ignore,
}

/// How many values an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// Zero or one value (`?`).
    Optional,
    /// Zero or more values (`*`).
    ZeroOrMore,
    /// One or more values (`+`).
    OneOrMore,
    /// Exactly this many values.
    Exact(usize),
}

/// The scalar type values are coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    /// Keep values as strings (the default).
    #[default]
    Str,
    /// Parse as a signed integer.
    Int,
    /// Parse as a float.
    Float,
    /// Parse as a boolean.
    Bool,
}

/// A fixed choice list, optionally matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choices {
    /// The allowed values.
    pub values: Vec<String>,
    /// Match supplied values case-insensitively.
    pub ignore_case: bool,
}

impl Choices {
    /// A case-sensitive choice list.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ignore_case: false,
        }
    }

    /// A case-insensitive choice list, the moral equivalent of building
    /// choices from an enum's variant names.
    pub fn case_insensitive<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore_case: true,
            ..Self::new(values)
        }
    }
}

/// One option spelling (`--location`, `-l`), optionally carrying a
/// deprecation for that specific alias.
#[derive(Debug, Clone)]
pub struct OptionSpelling {
    /// The literal flag text, dashes included.
    pub text: String,
    /// Set when this particular spelling is a deprecated alias.
    pub deprecation: Option<Deprecated>,
}

impl OptionSpelling {
    /// A live (non-deprecated) spelling.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            deprecation: None,
        }
    }

    /// A deprecated alias spelling.
    pub fn deprecated(text: impl Into<String>, info: Deprecated) -> Self {
        Self {
            text: text.into(),
            deprecation: Some(info),
        }
    }
}

impl From<&str> for OptionSpelling {
    fn from(text: &str) -> Self {
        OptionSpelling::new(text)
    }
}

impl From<String> for OptionSpelling {
    fn from(text: String) -> Self {
        OptionSpelling::new(text)
    }
}

/// A validator callback run against the parsed namespace.
///
/// Returning an error aborts the invocation; a [`CliError`](crate::CliError)
/// propagates verbatim, anything else is normalized into a validation error.
#[derive(Clone)]
pub struct Validator(Rc<dyn Fn(&mut CommandNamespace) -> anyhow::Result<()>>);

impl Validator {
    /// Wraps a validation function.
    pub fn new(f: impl Fn(&mut CommandNamespace) -> anyhow::Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Runs the validator.
    pub fn run(&self, namespace: &mut CommandNamespace) -> anyhow::Result<()> {
        (self.0)(namespace)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// A shell-completion callback: given the partial word, propose candidates.
#[derive(Clone)]
pub struct Completer(Rc<dyn Fn(&str) -> Vec<String>>);

impl Completer {
    /// Wraps a completion function.
    pub fn new(f: impl Fn(&str) -> Vec<String> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Produces candidates for the partial word.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        (self.0)(prefix)
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completer(..)")
    }
}

/// Field selector for [`ArgumentType::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    OptionsList,
    Help,
    Hidden,
    Metavar,
    Action,
    Nargs,
    ConstValue,
    Default,
    ValueKind,
    Choices,
    Required,
    Validator,
    Completer,
    ArgGroup,
    DeprecateInfo,
    PreviewInfo,
    ExperimentalInfo,
    DefaultValueSource,
}

/// A layered bag of argument settings.
///
/// Construct with [`ArgumentType::new`] and chain builder calls; compose
/// layers with [`update`](ArgumentType::update). A reusable base type is a
/// plain value: clone it and keep building to override.
///
/// # Example
///
/// ```rust
/// use argscope::ArgumentType;
///
/// let location = ArgumentType::new()
///     .options(["--location", "-l"])
///     .help("Geographic region");
///
/// let constrained = location.clone().required(true);
/// assert_eq!(constrained.help.get().map(String::as_str), Some("Geographic region"));
/// assert_eq!(constrained.required.get(), Some(&true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArgumentType {
    /// Flag spellings; empty for positionals.
    pub options_list: Setting<Vec<OptionSpelling>>,
    /// The destination variable name.
    pub dest: Setting<String>,
    /// Positional vs named.
    pub kind: Setting<ArgKind>,
    /// Help text.
    pub help: Setting<String>,
    /// Suppress the argument from help output.
    pub hidden: Setting<bool>,
    /// Display name for the value in help/usage.
    pub metavar: Setting<String>,
    /// Parse action.
    pub action: Setting<ArgAction>,
    /// Value arity.
    pub nargs: Setting<Nargs>,
    /// Value used when the flag appears without a value.
    pub const_value: Setting<Value>,
    /// Default when the argument is not supplied.
    pub default: Setting<Value>,
    /// Scalar coercion for supplied values.
    pub value_kind: Setting<ValueKind>,
    /// Fixed choice list.
    pub choices: Setting<Choices>,
    /// Whether the argument must be supplied.
    pub required: Setting<bool>,
    /// Per-argument validator.
    pub validator: Setting<Validator>,
    /// Shell-completion callback.
    pub completer: Setting<Completer>,
    /// Help-grouping label.
    pub arg_group: Setting<String>,
    /// Deprecation marker for the argument itself.
    pub deprecate_info: Setting<Deprecated>,
    /// Preview marker (normally injected via [`preview`](ArgumentType::preview)).
    pub preview_info: Setting<Preview>,
    /// Experimental marker (normally injected via
    /// [`experimental`](ArgumentType::experimental)).
    pub experimental_info: Setting<Experimental>,
    /// Where the default came from, for diagnostics.
    pub default_value_source: Setting<String>,
    /// Request preview decoration at registration time.
    pub is_preview: Setting<bool>,
    /// Request experimental decoration at registration time.
    pub is_experimental: Setting<bool>,
}

impl ArgumentType {
    /// An empty settings bag; every field inherits.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Merges `other` into `self` field by field; anything `other` has an
    /// opinion on (set or removed) wins.
    pub fn update(&mut self, other: &ArgumentType) {
        self.options_list.merge_from(&other.options_list);
        self.dest.merge_from(&other.dest);
        self.kind.merge_from(&other.kind);
        self.help.merge_from(&other.help);
        self.hidden.merge_from(&other.hidden);
        self.metavar.merge_from(&other.metavar);
        self.action.merge_from(&other.action);
        self.nargs.merge_from(&other.nargs);
        self.const_value.merge_from(&other.const_value);
        self.default.merge_from(&other.default);
        self.value_kind.merge_from(&other.value_kind);
        self.choices.merge_from(&other.choices);
        self.required.merge_from(&other.required);
        self.validator.merge_from(&other.validator);
        self.completer.merge_from(&other.completer);
        self.arg_group.merge_from(&other.arg_group);
        self.deprecate_info.merge_from(&other.deprecate_info);
        self.preview_info.merge_from(&other.preview_info);
        self.experimental_info.merge_from(&other.experimental_info);
        self.default_value_source.merge_from(&other.default_value_source);
        self.is_preview.merge_from(&other.is_preview);
        self.is_experimental.merge_from(&other.is_experimental);
    }

    /// `self` merged over `base`: base settings with self's overrides applied.
    pub fn overriding(&self, base: &ArgumentType) -> ArgumentType {
        let mut merged = base.clone();
        merged.update(self);
        merged
    }

    /// Marks a field as actively removed at this layer.
    pub fn remove(mut self, field: SettingField) -> Self {
        match field {
            SettingField::OptionsList => self.options_list = Setting::Remove,
            SettingField::Help => self.help = Setting::Remove,
            SettingField::Hidden => self.hidden = Setting::Remove,
            SettingField::Metavar => self.metavar = Setting::Remove,
            SettingField::Action => self.action = Setting::Remove,
            SettingField::Nargs => self.nargs = Setting::Remove,
            SettingField::ConstValue => self.const_value = Setting::Remove,
            SettingField::Default => self.default = Setting::Remove,
            SettingField::ValueKind => self.value_kind = Setting::Remove,
            SettingField::Choices => self.choices = Setting::Remove,
            SettingField::Required => self.required = Setting::Remove,
            SettingField::Validator => self.validator = Setting::Remove,
            SettingField::Completer => self.completer = Setting::Remove,
            SettingField::ArgGroup => self.arg_group = Setting::Remove,
            SettingField::DeprecateInfo => self.deprecate_info = Setting::Remove,
            SettingField::PreviewInfo => self.preview_info = Setting::Remove,
            SettingField::ExperimentalInfo => self.experimental_info = Setting::Remove,
            SettingField::DefaultValueSource => self.default_value_source = Setting::Remove,
        }
        self
    }

    /// Sets the flag spellings.
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionSpelling>,
    {
        self.options_list = Setting::Set(options.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a single flag spelling.
    pub fn option(self, option: impl Into<OptionSpelling>) -> Self {
        let spelling = option.into();
        self.options([spelling])
    }

    /// Sets the destination name.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Setting::Set(dest.into());
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Setting::Set(help.into());
        self
    }

    /// Hides the argument from help output.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Setting::Set(hidden);
        self
    }

    /// Sets the value display name.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Setting::Set(metavar.into());
        self
    }

    /// Sets the parse action.
    pub fn action(mut self, action: ArgAction) -> Self {
        self.action = Setting::Set(action);
        self
    }

    /// Sets the value arity.
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Setting::Set(nargs);
        self
    }

    /// Sets the value used when the flag appears without a value.
    pub fn const_value(mut self, value: impl Into<Value>) -> Self {
        self.const_value = Setting::Set(value.into());
        self
    }

    /// Sets the default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Setting::Set(value.into());
        self
    }

    /// Sets the scalar coercion.
    pub fn value_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = Setting::Set(kind);
        self
    }

    /// Sets the choice list.
    pub fn choices(mut self, choices: Choices) -> Self {
        self.choices = Setting::Set(choices);
        self
    }

    /// Sets whether the argument is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Setting::Set(required);
        self
    }

    /// Attaches a per-argument validator.
    pub fn validator(
        mut self,
        f: impl Fn(&mut CommandNamespace) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.validator = Setting::Set(Validator::new(f));
        self
    }

    /// Attaches a shell-completion callback.
    pub fn completer(mut self, f: impl Fn(&str) -> Vec<String> + 'static) -> Self {
        self.completer = Setting::Set(Completer::new(f));
        self
    }

    /// Sets the help-grouping label.
    pub fn arg_group(mut self, group: impl Into<String>) -> Self {
        self.arg_group = Setting::Set(group.into());
        self
    }

    /// Attaches a deprecation marker.
    pub fn deprecate_info(mut self, info: Deprecated) -> Self {
        self.deprecate_info = Setting::Set(info);
        self
    }

    /// Requests preview decoration; the registration context turns this
    /// into a [`Preview`] marker targeting the argument's visible name.
    pub fn preview(mut self, is_preview: bool) -> Self {
        self.is_preview = Setting::Set(is_preview);
        self
    }

    /// Requests experimental decoration; see [`preview`](Self::preview).
    pub fn experimental(mut self, is_experimental: bool) -> Self {
        self.is_experimental = Setting::Set(is_experimental);
        self
    }

    /// Records where the default value came from.
    pub fn default_value_source(mut self, source: impl Into<String>) -> Self {
        self.default_value_source = Setting::Set(source.into());
        self
    }
}

/// The hidden/deactivated argument type used by
/// [`ArgumentsContext::ignore`](crate::ArgumentsContext::ignore): suppressed
/// from help, optional, and wired to an action that rejects the flag if it
/// is ever actually supplied.
pub fn ignore_type() -> ArgumentType {
    ArgumentType::new()
        .hidden(true)
        .nargs(Nargs::Optional)
        .action(ArgAction::Ignore)
        .required(false)
}

/// The subset of settings the underlying parser understands, materialized.
///
/// This is the "options" view: named/registry-internal settings and removed
/// fields are excluded, everything else collapses from [`Setting`] to
/// `Option`.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub options_list: Vec<OptionSpelling>,
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
}

/// One argument of one command: settings plus a mandatory destination.
#[derive(Debug, Clone)]
pub struct CommandArgument {
    kind: ArgKind,
    arg_type: ArgumentType,
}

impl CommandArgument {
    /// Builds a command argument from a resolved settings bag.
    ///
    /// Fails if no destination resolves. Named arguments lacking an explicit
    /// options list get a synthesized `--dest-with-dashes` flag.
    pub fn new(dest: &str, arg_type: ArgumentType) -> Result<Self, Error> {
        let mut arg_type = arg_type;
        if !dest.is_empty() {
            arg_type.dest = Setting::Set(dest.to_string());
        }
        let resolved_dest = arg_type
            .dest
            .cloned()
            .ok_or_else(|| Error::Authoring("missing dest for argument registration".into()))?;

        let kind = arg_type.kind.cloned().unwrap_or_default();
        if kind == ArgKind::Named && !arg_type.options_list.is_set() {
            let flag = format!("--{}", resolved_dest.replace('_', "-"));
            arg_type.options_list = Setting::Set(vec![OptionSpelling::new(flag)]);
        }

        Ok(Self { kind, arg_type })
    }

    /// The destination name.
    pub fn name(&self) -> &str {
        self.arg_type
            .dest
            .get()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Positional vs named.
    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    /// The underlying settings bag.
    pub fn arg_type(&self) -> &ArgumentType {
        &self.arg_type
    }

    /// The parser-facing settings, with removed fields excluded.
    pub fn options(&self) -> ParserOptions {
        let t = &self.arg_type;
        ParserOptions {
            options_list: if self.kind == ArgKind::Positional {
                Vec::new()
            } else {
                t.options_list.cloned().unwrap_or_default()
            },
            help: t.help.cloned(),
            hidden: t.hidden.cloned().unwrap_or(false),
            metavar: t.metavar.cloned(),
            action: t.action.cloned().unwrap_or_default(),
            nargs: t.nargs.cloned(),
            const_value: t.const_value.cloned(),
            default: t.default.cloned(),
            value_kind: t.value_kind.cloned().unwrap_or_default(),
            choices: t.choices.cloned(),
            required: t.required.cloned().unwrap_or(false),
        }
    }

    /// The choice list, if any.
    pub fn choices(&self) -> Option<&Choices> {
        self.arg_type.choices.get()
    }

    /// The per-argument validator, if any.
    pub fn validator(&self) -> Option<&Validator> {
        self.arg_type.validator.get()
    }

    /// The completion callback, if any.
    pub fn completer(&self) -> Option<&Completer> {
        self.arg_type.completer.get()
    }

    /// The help-grouping label, if any.
    pub fn arg_group(&self) -> Option<&str> {
        self.arg_type.arg_group.get().map(String::as_str)
    }

    /// The argument's own deprecation marker, if any.
    pub fn deprecate_info(&self) -> Option<&Deprecated> {
        self.arg_type.deprecate_info.get()
    }

    /// The preview marker, if any.
    pub fn preview_info(&self) -> Option<&Preview> {
        self.arg_type.preview_info.get()
    }

    /// The experimental marker, if any.
    pub fn experimental_info(&self) -> Option<&Experimental> {
        self.arg_type.experimental_info.get()
    }

    /// Where the default value came from, if recorded.
    pub fn default_value_source(&self) -> Option<&str> {
        self.arg_type.default_value_source.get().map(String::as_str)
    }
}

/// The scoped argument registry: `(scope, dest) -> ArgumentType`.
///
/// Registration at the same exact `(scope, dest)` pair replaces outright;
/// different scopes layer at resolution time.
#[derive(Debug, Default)]
pub struct ArgumentRegistry {
    arguments: HashMap<String, Vec<(String, ArgumentType)>>,
}

impl ArgumentRegistry {
    /// A fresh, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `arg_type` at `(scope, dest)`, replacing any prior value for
    /// that exact pair.
    pub fn register(&mut self, scope: &str, dest: &str, arg_type: ArgumentType) {
        let entries = self.arguments.entry(scope.to_string()).or_default();
        match entries.iter_mut().find(|(d, _)| d == dest) {
            Some((_, existing)) => *existing = arg_type,
            None => entries.push((dest.to_string(), arg_type)),
        }
    }

    /// Resolves the effective argument settings for `name` on `command` by
    /// merging every matching scope from shortest prefix to longest.
    ///
    /// The root scope `""` applies to everything; the longest matching scope
    /// wins field by field, with unset fields falling back to shorter-scope
    /// values.
    pub fn get_cli_argument(&self, command: &str, name: &str) -> ArgumentType {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let mut result = ArgumentType::new();
        for index in 0..=parts.len() {
            let probe = parts[..index].join(" ");
            if let Some(override_type) = self
                .arguments
                .get(&probe)
                .and_then(|entries| entries.iter().find(|(d, _)| d == name))
                .map(|(_, t)| t)
            {
                result.update(override_type);
            }
        }
        result
    }

    /// Destinations registered as positional at exactly this scope.
    pub(crate) fn scope_positionals(&self, scope: &str) -> Vec<String> {
        self.arguments
            .get(scope)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, t)| t.kind.get() == Some(&ArgKind::Positional))
                    .map(|(d, _)| d.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
