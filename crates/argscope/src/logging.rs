//! Verbosity flags and log initialization.
//!
//! The framework logs through the `log` facade; binaries initialize
//! `env_logger` from the verbosity flags scanned out of raw argv before
//! any parsing happens. The same scan feeds the invoker's no-argument
//! fast path and only-show-errors mode.

use log::LevelFilter;

/// Raises verbosity to info. May appear alongside any command.
pub const VERBOSE_FLAG: &str = "--verbose";
/// Raises verbosity to full debug output.
pub const DEBUG_FLAG: &str = "--debug";
/// Quiet mode: only errors are logged, and deprecation/preview/
/// experimental notices are suppressed.
pub const ONLY_SHOW_ERRORS_FLAG: &str = "--only-show-errors";

/// Destination names reserved by the global logging flags; these never
/// reach command handlers.
pub const LOGGING_DESTS: &[&str] = &["verbose", "debug", "only_show_errors"];

/// True for argv tokens that only affect logging.
pub fn is_verbosity_flag(token: &str) -> bool {
    matches!(token, VERBOSE_FLAG | DEBUG_FLAG | ONLY_SHOW_ERRORS_FLAG)
}

/// Verbosity derived from raw argv.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerbosityConfig {
    /// Occurrences of `--verbose`.
    pub verbose: u8,
    /// `--debug` present.
    pub debug: bool,
    /// `--only-show-errors` present.
    pub only_show_errors: bool,
}

impl VerbosityConfig {
    /// Scans raw argv for the logging flags. Unrelated tokens are ignored;
    /// this runs before parsing, so it must not reject anything.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut config = Self::default();
        for arg in args {
            match arg.as_ref() {
                VERBOSE_FLAG => config.verbose = config.verbose.saturating_add(1),
                DEBUG_FLAG => config.debug = true,
                ONLY_SHOW_ERRORS_FLAG => config.only_show_errors = true,
                _ => {}
            }
        }
        config
    }

    /// The log level these flags imply. Debug wins over verbose wins over
    /// quiet mode; the default is warnings.
    pub fn level_filter(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.verbose > 0 {
            LevelFilter::Info
        } else if self.only_show_errors {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }

    /// Initializes `env_logger` at the implied level. Safe to call more
    /// than once; later calls are ignored.
    pub fn init(&self) {
        let _ = env_logger::Builder::new()
            .filter_level(self.level_filter())
            .try_init();
    }
}
