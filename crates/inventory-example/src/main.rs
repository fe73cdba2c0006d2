//! `invy`: a small inventory CLI built entirely on argscope.
//!
//! Demonstrates the full pipeline: a commands loader with groups and
//! scoped argument registration, validators, deprecation/preview markers,
//! and structured result output via `--output`.

use std::process;

use argscope::{format_result, CommandInvoker, CommandSession, OutputFormat, VerbosityConfig};

use inventory_example::loader::InventoryLoader;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (args, format) = extract_output_format(args);

    VerbosityConfig::from_args(&args).init();

    let session = CommandSession::new("invy", VERSION);
    let mut invoker = CommandInvoker::new(session, Box::new(InventoryLoader::default()));

    match invoker.execute(&args) {
        Ok(result) => {
            if !result.result.is_null() {
                match format_result(&result, format) {
                    Ok(text) => println!("{text}"),
                    Err(err) => {
                        eprintln!("{err}");
                        process::exit(1);
                    }
                }
            }
            process::exit(result.exit_code);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(err.exit_code());
        }
    }
}

/// Strips `--output <format>` from argv before the framework sees it.
fn extract_output_format(args: Vec<String>) -> (Vec<String>, OutputFormat) {
    let mut remaining = Vec::with_capacity(args.len());
    let mut format = OutputFormat::Auto;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--output" {
            if let Some(value) = iter.next() {
                match value.parse() {
                    Ok(parsed) => format = parsed,
                    Err(err) => {
                        eprintln!("{err}");
                        process::exit(2);
                    }
                }
            }
        } else if let Some(value) = arg.strip_prefix("--output=") {
            match value.parse() {
                Ok(parsed) => format = parsed,
                Err(err) => {
                    eprintln!("{err}");
                    process::exit(2);
                }
            }
        } else {
            remaining.push(arg);
        }
    }
    (remaining, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_output_format() {
        let (args, format) = extract_output_format(vec![
            "item".into(),
            "list".into(),
            "--output".into(),
            "yaml".into(),
        ]);
        assert_eq!(args, vec!["item".to_string(), "list".to_string()]);
        assert_eq!(format, OutputFormat::Yaml);
    }

    #[test]
    fn test_extract_output_format_assignment_form() {
        let (args, format) =
            extract_output_format(vec!["item".into(), "list".into(), "--output=csv".into()]);
        assert_eq!(args, vec!["item".to_string(), "list".to_string()]);
        assert_eq!(format, OutputFormat::Csv);
    }

    #[test]
    fn test_extract_output_format_default() {
        let (args, format) = extract_output_format(vec!["item".into()]);
        assert_eq!(args, vec!["item".to_string()]);
        assert_eq!(format, OutputFormat::Auto);
    }
}
