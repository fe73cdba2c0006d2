//! Output format selection for packaged results.
//!
//! [`OutputFormat`] is the user-facing enum for an `--output` style flag.
//! `Auto` adapts JSON presentation to the terminal: pretty-printed on a
//! TTY, compact single-line when piped. CSV output applies the command's
//! declared table transformer first, so tabular projections reach the
//! rows that actually get written.

use std::str::FromStr;

use crate::invocation::CommandResult;
use crate::serialize::{serialize_csv, serialize_structured, SerializeError};

/// How a packaged result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON, pretty on a TTY and compact when piped.
    #[default]
    Auto,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
    /// XML.
    Xml,
    /// CSV rows (after the table transformer, when one is declared).
    Csv,
}

impl OutputFormat {
    /// True for formats that serialize directly without TTY detection.
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputFormat::Auto)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "auto" => Ok(OutputFormat::Auto),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "xml" => Ok(OutputFormat::Xml),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "invalid output format '{value}'; use auto, json, yaml, xml, or csv"
            )),
        }
    }
}

/// Renders a packaged result in the requested format.
pub fn format_result(
    result: &CommandResult,
    format: OutputFormat,
) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Auto => {
            if atty::is(atty::Stream::Stdout) {
                Ok(serde_json::to_string_pretty(&result.result)?)
            } else {
                Ok(serde_json::to_string(&result.result)?)
            }
        }
        OutputFormat::Csv => {
            let projected = result
                .table_transformer
                .as_ref()
                .map(|t| t.apply(&result.result))
                .unwrap_or_else(|| result.result.clone());
            serialize_csv(&projected)
        }
        other => serialize_structured(&result.result, other),
    }
}
