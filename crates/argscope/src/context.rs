//! The scoped argument-registration context.
//!
//! An [`ArgumentsContext`] binds a session to one scope string and exposes
//! the registration operations command modules use: `argument`,
//! `positional`, `extra`, `ignore`, and `deprecate`. Two gates run before
//! every registering operation:
//!
//! - **staleness**: a closed context refuses further use. This catches the
//!   authoring mistake of retaining a context reference past its block.
//! - **applicability**: unless the session is in skip-applicability mode,
//!   registrations only take effect when the command currently being
//!   invoked starts with this context's scope. A module can register for a
//!   broad scope and be silently skipped during unrelated invocations.

use crate::arguments::{ignore_type, ArgKind, ArgumentType, CommandArgument, Setting};
use crate::commands::CommandSession;
use crate::error::Error;
use crate::markers::{Deprecated, Experimental, Preview, TargetKind};

/// A scoped builder over one session; see the module docs.
///
/// # Example
///
/// ```rust
/// use argscope::{ArgumentType, CliCommand, CommandSession};
///
/// let mut session = CommandSession::new("invy", "1.0.0");
/// session.add_command(CliCommand::new("item list").arg("top"));
/// session.skip_applicability = true;
///
/// let mut ctx = session.argument_context("item list");
/// ctx.argument("top", ArgumentType::new().help("Show at most this many items."))?;
/// ctx.close();
/// # Ok::<(), argscope::Error>(())
/// ```
pub struct ArgumentsContext<'a> {
    session: &'a mut CommandSession,
    scope: String,
    stale: bool,
}

impl<'a> ArgumentsContext<'a> {
    pub(crate) fn new(session: &'a mut CommandSession, scope: String) -> Self {
        Self {
            session,
            scope,
            stale: false,
        }
    }

    /// The scope this context registers into.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Marks the context stale; any later operation is an authoring error.
    pub fn close(&mut self) {
        self.stale = true;
    }

    fn check_stale(&self) -> Result<(), Error> {
        if self.stale {
            log::error!("argument context '{}' used after close", self.scope);
            return Err(Error::StaleContext(self.scope.clone()));
        }
        Ok(())
    }

    fn applicable(&self) -> bool {
        if self.session.skip_applicability {
            return true;
        }
        self.session.command_string().starts_with(&self.scope)
    }

    /// Registers a named argument for this scope.
    pub fn argument(&mut self, dest: &str, arg_type: ArgumentType) -> Result<(), Error> {
        self.check_stale()?;
        if !self.applicable() {
            return Ok(());
        }
        let decorated = decorate(dest, arg_type)?;
        self.session
            .argument_registry
            .register(&self.scope, dest, decorated);
        Ok(())
    }

    /// Registers the command's positional argument.
    ///
    /// Fails when the scope names a group instead of one specific command,
    /// or when a different positional destination already exists for the
    /// command. Re-registering the same destination overwrites in place.
    pub fn positional(&mut self, dest: &str, arg_type: ArgumentType) -> Result<(), Error> {
        self.check_stale()?;
        if !self.applicable() {
            return Ok(());
        }
        if !self.session.command_table.contains_key(&self.scope) {
            return Err(Error::Authoring(format!(
                "positional argument '{dest}' cannot be registered to a group-level scope \
                 '{}'; it must be registered to a specific command",
                self.scope
            )));
        }
        let existing = self
            .session
            .argument_registry
            .scope_positionals(&self.scope);
        if !existing.is_empty() && !existing.iter().any(|d| d == dest) {
            return Err(Error::Authoring(format!(
                "commands may have, at most, one positional argument; '{}' already has \
                 positional argument: {}",
                self.scope,
                existing.join(" ")
            )));
        }

        let mut arg_type = arg_type;
        arg_type.kind = Setting::Set(ArgKind::Positional);
        arg_type.options_list = Setting::Remove;
        let decorated = decorate(dest, arg_type)?;
        self.session
            .argument_registry
            .register(&self.scope, dest, decorated);
        Ok(())
    }

    /// Registers a parameter that is not part of the command's own
    /// declaration; used to bolt extra parameters onto generated commands.
    pub fn extra(&mut self, dest: &str, arg_type: ArgumentType) -> Result<(), Error> {
        self.check_stale()?;
        if !self.applicable() {
            return Ok(());
        }
        if self.session.command_group_table.contains_key(&self.scope) {
            return Err(Error::Authoring(format!(
                "extra argument '{dest}' cannot be registered to a group-level scope \
                 '{}'; it must be registered to a specific command",
                self.scope
            )));
        }
        let decorated = decorate(dest, arg_type)?;
        let argument = CommandArgument::new(dest, decorated)?;
        self.session.add_extra_argument(&self.scope, argument);
        Ok(())
    }

    /// Hides and deactivates an otherwise-declared parameter: suppressed
    /// from help, and supplying it fails as an unrecognized argument.
    pub fn ignore(&mut self, dest: &str) -> Result<(), Error> {
        self.check_stale()?;
        if !self.applicable() {
            return Ok(());
        }
        let flag = format!("--__{}", dest.to_uppercase());
        self.argument(dest, ignore_type().option(flag))
    }

    /// Builds a deprecation descriptor for this scope's arguments.
    ///
    /// The object type is inferred: targets spelled like flags deprecate an
    /// option alias, anything else deprecates an argument.
    pub fn deprecate(&self, target: &str) -> Result<Deprecated, Error> {
        self.check_stale()?;
        let object_type = if target.starts_with('-') {
            TargetKind::Option
        } else {
            TargetKind::Argument
        };
        Ok(Deprecated::new(target, object_type))
    }
}

/// Applies the registration-time decoration pipeline: deprecation target
/// fill-in, then preview, then experimental marker synthesis.
fn decorate(dest: &str, mut arg_type: ArgumentType) -> Result<ArgumentType, Error> {
    if let Setting::Set(info) = &mut arg_type.deprecate_info {
        if info.target.is_empty() {
            info.target = dest.to_string();
        }
    }

    let is_preview = arg_type.is_preview.cloned().unwrap_or(false);
    let is_experimental = arg_type.is_experimental.cloned().unwrap_or(false);
    if is_preview && is_experimental {
        return Err(Error::Authoring(format!(
            "failed to register argument '{dest}': is_preview and is_experimental \
             cannot both be true"
        )));
    }
    if is_preview {
        let (target, object_type) = marker_target(dest, &arg_type);
        arg_type.preview_info = Setting::Set(Preview::new(target, object_type));
    }
    if is_experimental {
        let (target, object_type) = marker_target(dest, &arg_type);
        arg_type.experimental_info = Setting::Set(Experimental::new(target, object_type));
    }
    Ok(arg_type)
}

/// The name a preview/experimental notice should use for an argument:
/// positionals go by their metavar, named arguments by their longest
/// spelling (or the flag that would be synthesized from the dest).
fn marker_target(dest: &str, arg_type: &ArgumentType) -> (String, TargetKind) {
    if arg_type.kind.get() == Some(&ArgKind::Positional) {
        let target = arg_type
            .metavar
            .cloned()
            .unwrap_or_else(|| format!("<{}>", dest.to_uppercase()));
        return (target, TargetKind::PositionalArgument);
    }
    match arg_type.options_list.get() {
        Some(options) if !options.is_empty() => {
            let longest = options
                .iter()
                .map(|o| o.text.as_str())
                .max_by_key(|t| t.len())
                .unwrap_or_default()
                .to_string();
            (longest, TargetKind::Argument)
        }
        _ => (format!("--{}", dest.replace('_', "-")), TargetKind::Argument),
    }
}
