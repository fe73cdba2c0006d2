//! Deprecation, preview, and experimental status markers.
//!
//! A marker is a small descriptor attached to a command, command group,
//! argument, or option spelling. During invocation, markers accumulated
//! from the parsed arguments plus the command's own (explicit or
//! ancestor-inherited) markers are printed to stderr as informational
//! notices unless only-show-errors mode is active.
//!
//! Deprecations may carry an expiration version. Once the CLI version
//! reaches it, the deprecated item is silently dropped from the live
//! parser tree instead of producing an error.

use std::fmt;

/// What kind of object a marker is attached to.
///
/// Feeds the notice text ("Command 'x' ...", "Option '--x' ...").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A leaf command.
    Command,
    /// A non-leaf command group.
    CommandGroup,
    /// A named argument (addressed by dest).
    Argument,
    /// A specific option spelling (e.g. a deprecated alias).
    Option,
    /// A positional argument.
    PositionalArgument,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Command => write!(f, "command"),
            TargetKind::CommandGroup => write!(f, "command group"),
            TargetKind::Argument => write!(f, "argument"),
            TargetKind::Option => write!(f, "option"),
            TargetKind::PositionalArgument => write!(f, "positional argument"),
        }
    }
}

/// Capitalizes the first character of a notice.
fn capitalize(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}

/// A deprecation descriptor.
///
/// # Example
///
/// ```rust
/// use argscope::{Deprecated, TargetKind};
///
/// let info = Deprecated::new("vm assess", TargetKind::Command)
///     .redirect("vm check")
///     .expiration("3.0.0");
/// assert!(!info.expired("2.1.0"));
/// assert!(info.expired("3.0.0"));
/// assert!(info.message().contains("Use 'vm check' instead."));
/// ```
#[derive(Debug, Clone)]
pub struct Deprecated {
    /// The item the notice names (command string, dest, or option spelling).
    pub target: String,
    /// What kind of item is deprecated.
    pub object_type: TargetKind,
    /// Replacement the notice should point users at.
    pub redirect: Option<String>,
    /// Hide the item from help listings while it still works.
    pub hide: bool,
    /// Version at which the item stops existing (semver string).
    pub expiration: Option<String>,
    message: Option<String>,
}

impl Deprecated {
    /// Creates a deprecation for the given target.
    pub fn new(target: impl Into<String>, object_type: TargetKind) -> Self {
        Self {
            target: target.into(),
            object_type,
            redirect: None,
            hide: false,
            expiration: None,
            message: None,
        }
    }

    /// Sets the replacement to mention in the notice.
    pub fn redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    /// Hides the item from help listings while keeping it functional.
    pub fn hide(mut self) -> Self {
        self.hide = true;
        self
    }

    /// Sets the version at which the item is removed.
    pub fn expiration(mut self, version: impl Into<String>) -> Self {
        self.expiration = Some(version.into());
        self
    }

    /// The stderr notice for this marker.
    pub fn message(&self) -> String {
        if let Some(custom) = &self.message {
            return custom.clone();
        }
        let mut msg = capitalize(format!(
            "{} '{}' has been deprecated and will be removed ",
            self.object_type, self.target
        ));
        match &self.expiration {
            Some(version) => msg.push_str(&format!("in version '{version}'.")),
            None => msg.push_str("in a future release."),
        }
        if let Some(redirect) = &self.redirect {
            msg.push_str(&format!(" Use '{redirect}' instead."));
        }
        msg
    }

    /// Replaces the generated notice text with a custom one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// True once the CLI version has reached the expiration version.
    ///
    /// Unparsable versions never expire.
    pub fn expired(&self, cli_version: &str) -> bool {
        let Some(expiration) = &self.expiration else {
            return false;
        };
        match (
            semver::Version::parse(cli_version),
            semver::Version::parse(expiration),
        ) {
            (Ok(current), Ok(expiry)) => current >= expiry,
            _ => false,
        }
    }

    /// Synthesizes the implicit command-level marker for a command nested
    /// under a deprecated ancestor group: same redirect/expiry, but the
    /// notice names the command itself.
    pub(crate) fn as_implicit_command(&self, command: &str) -> Self {
        let mut implicit = self.clone();
        implicit.target = command.to_string();
        implicit.object_type = TargetKind::Command;
        implicit
    }
}

/// A preview-status descriptor.
#[derive(Debug, Clone)]
pub struct Preview {
    /// The item the notice names.
    pub target: String,
    /// What kind of item is in preview.
    pub object_type: TargetKind,
    message: Option<String>,
}

impl Preview {
    /// Creates a preview marker for the given target.
    pub fn new(target: impl Into<String>, object_type: TargetKind) -> Self {
        Self {
            target: target.into(),
            object_type,
            message: None,
        }
    }

    /// Replaces the generated notice text with a custom one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The stderr notice for this marker.
    pub fn message(&self) -> String {
        if let Some(custom) = &self.message {
            return custom.clone();
        }
        capitalize(format!(
            "{} '{}' is in preview. It may be changed/removed in a future release.",
            self.object_type, self.target
        ))
    }

    pub(crate) fn as_implicit_command(&self, command: &str) -> Self {
        let mut implicit = self.clone();
        implicit.target = command.to_string();
        implicit.object_type = TargetKind::Command;
        implicit
    }
}

/// An experimental-status descriptor.
#[derive(Debug, Clone)]
pub struct Experimental {
    /// The item the notice names.
    pub target: String,
    /// What kind of item is experimental.
    pub object_type: TargetKind,
    message: Option<String>,
}

impl Experimental {
    /// Creates an experimental marker for the given target.
    pub fn new(target: impl Into<String>, object_type: TargetKind) -> Self {
        Self {
            target: target.into(),
            object_type,
            message: None,
        }
    }

    /// Replaces the generated notice text with a custom one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The stderr notice for this marker.
    pub fn message(&self) -> String {
        if let Some(custom) = &self.message {
            return custom.clone();
        }
        capitalize(format!(
            "{} '{}' is experimental and not covered by customer support. \
             Please use with discretion.",
            self.object_type, self.target
        ))
    }

    pub(crate) fn as_implicit_command(&self, command: &str) -> Self {
        let mut implicit = self.clone();
        implicit.target = command.to_string();
        implicit.object_type = TargetKind::Command;
        implicit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_default_message() {
        let info = Deprecated::new("vm assess", TargetKind::Command);
        assert_eq!(
            info.message(),
            "Command 'vm assess' has been deprecated and will be removed in a future release."
        );
    }

    #[test]
    fn test_deprecated_message_with_expiration_and_redirect() {
        let info = Deprecated::new("--old-flag", TargetKind::Option)
            .expiration("2.0.0")
            .redirect("--new-flag");
        assert_eq!(
            info.message(),
            "Option '--old-flag' has been deprecated and will be removed in version '2.0.0'. \
             Use '--new-flag' instead."
        );
    }

    #[test]
    fn test_deprecated_custom_message() {
        let info =
            Deprecated::new("x", TargetKind::Argument).with_message("gone soon, use y instead");
        assert_eq!(info.message(), "gone soon, use y instead");
    }

    #[test]
    fn test_expired() {
        let info = Deprecated::new("x", TargetKind::Command).expiration("1.2.0");
        assert!(!info.expired("1.1.9"));
        assert!(info.expired("1.2.0"));
        assert!(info.expired("2.0.0"));
    }

    #[test]
    fn test_no_expiration_never_expires() {
        let info = Deprecated::new("x", TargetKind::Command);
        assert!(!info.expired("99.0.0"));
    }

    #[test]
    fn test_unparsable_version_never_expires() {
        let info = Deprecated::new("x", TargetKind::Command).expiration("not-a-version");
        assert!(!info.expired("1.0.0"));
    }

    #[test]
    fn test_preview_message() {
        let info = Preview::new("--tier", TargetKind::Argument);
        assert_eq!(
            info.message(),
            "Argument '--tier' is in preview. It may be changed/removed in a future release."
        );
    }

    #[test]
    fn test_experimental_message() {
        let info = Experimental::new("item forecast", TargetKind::Command);
        assert!(info
            .message()
            .starts_with("Command 'item forecast' is experimental"));
        assert!(info.message().contains("Please use with discretion."));
    }

    #[test]
    fn test_implicit_command_marker() {
        let group = Deprecated::new("vm", TargetKind::CommandGroup).redirect("compute");
        let implicit = group.as_implicit_command("vm create");
        assert_eq!(implicit.target, "vm create");
        assert_eq!(implicit.object_type, TargetKind::Command);
        assert_eq!(implicit.redirect.as_deref(), Some("compute"));
    }
}
