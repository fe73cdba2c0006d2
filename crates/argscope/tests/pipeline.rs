//! End-to-end pipeline tests through the public API: a realistic loader
//! registering commands and scoped argument overrides, driven via
//! `CommandInvoker::execute`.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use argscope::{
    ArgumentType, Choices, CliCommand, CliError, CommandGroup, CommandInvoker, CommandSession,
    CommandsLoader, Deprecated, Error, Experimental, TargetKind, ValueKind,
};

fn to_args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Records which handlers ran and with which values.
#[derive(Default)]
struct Trace {
    calls: Vec<(String, serde_json::Value)>,
}

struct FixtureLoader {
    trace: Rc<RefCell<Trace>>,
}

impl FixtureLoader {
    fn new(trace: Rc<RefCell<Trace>>) -> Self {
        Self { trace }
    }

    fn recording(
        &self,
        name: &'static str,
    ) -> impl Fn(&argscope::ArgumentValues) -> anyhow::Result<serde_json::Value> {
        let trace = self.trace.clone();
        move |values| {
            let value = serde_json::to_value(values)?;
            trace.borrow_mut().calls.push((name.to_string(), value.clone()));
            Ok(value)
        }
    }
}

impl CommandsLoader for FixtureLoader {
    fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
        session.add_group("vm", CommandGroup::new().description("Manage machines."));
        session.add_group(
            "lab",
            CommandGroup::new()
                .experimental(Experimental::new("lab", TargetKind::CommandGroup)),
        );

        session.add_command(
            CliCommand::new("vm create")
                .description("Create a machine.")
                .arg("name")
                .arg("size")
                .handler(self.recording("vm create")),
        );
        session.add_command(
            CliCommand::new("vm list")
                .description("List machines.")
                .arg("size")
                .handler(self.recording("vm list")),
        );
        session.add_command(
            CliCommand::new("vm assess")
                .deprecated(
                    Deprecated::new("vm assess", TargetKind::Command).expiration("0.9.0"),
                )
                .handler(self.recording("vm assess")),
        );
        session.add_command(
            CliCommand::new("lab run").handler(self.recording("lab run")),
        );
        Ok(())
    }

    fn load_arguments(&mut self, session: &mut CommandSession, _command: &str) -> Result<(), Error> {
        // group-level default, refined per command
        let mut ctx = session.argument_context("vm");
        ctx.argument(
            "size",
            ArgumentType::new()
                .options(["--size"])
                .value_kind(ValueKind::Int)
                .default(1),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("vm create");
        ctx.argument("size", ArgumentType::new().default(2))?;
        ctx.positional("name", ArgumentType::new().help("Machine name."))?;
        ctx.close();
        Ok(())
    }
}

fn fixture() -> (CommandInvoker, Rc<RefCell<Trace>>) {
    let trace = Rc::new(RefCell::new(Trace::default()));
    let invoker = CommandInvoker::new(
        CommandSession::new("cloudctl", "1.0.0"),
        Box::new(FixtureLoader::new(trace.clone())),
    );
    (invoker, trace)
}

#[test]
fn scope_layering_most_specific_default_wins() {
    let (mut invoker, trace) = fixture();
    invoker
        .execute(&to_args(&["vm", "create", "web-1"]))
        .unwrap();
    let calls = trace.borrow();
    let (_, values) = &calls.calls[0];
    assert_eq!(values["size"], serde_json::json!(2));
    assert_eq!(values["name"], serde_json::json!("web-1"));
}

#[test]
fn scope_layering_sibling_keeps_group_default() {
    let (mut invoker, trace) = fixture();
    invoker.execute(&to_args(&["vm", "list"])).unwrap();
    let calls = trace.borrow();
    let (_, values) = &calls.calls[0];
    assert_eq!(values["size"], serde_json::json!(1));
}

#[test]
fn registered_option_round_trips_to_dest() {
    let (mut invoker, trace) = fixture();
    invoker
        .execute(&to_args(&["vm", "list", "--size", "8"]))
        .unwrap();
    let calls = trace.borrow();
    let (_, values) = &calls.calls[0];
    assert_eq!(values["size"], serde_json::json!(8));
}

#[test]
fn expired_deprecated_command_is_not_dispatchable() {
    let (mut invoker, trace) = fixture();
    let err = invoker.execute(&to_args(&["vm", "assess"])).unwrap_err();
    assert!(matches!(err, Error::UnknownSubcommand { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(trace.borrow().calls.is_empty());
}

#[test]
fn fuzzy_suggestion_for_misspelled_subcommand() {
    let (mut invoker, _) = fixture();
    let err = invoker.execute(&to_args(&["vm", "craete"])).unwrap_err();
    match &err {
        Error::UnknownSubcommand {
            group,
            value,
            suggestions,
        } => {
            assert_eq!(group, "vm");
            assert_eq!(value, "craete");
            assert!(suggestions.contains(&"vm create".to_string()));
        }
        other => panic!("expected UnknownSubcommand, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn command_tokens_are_case_insensitive_values_untouched() {
    let (mut invoker, trace) = fixture();
    invoker
        .execute(&to_args(&["VM", "Create", "Web-1"]))
        .unwrap();
    let calls = trace.borrow();
    let (command, values) = &calls.calls[0];
    assert_eq!(command, "vm create");
    assert_eq!(values["name"], serde_json::json!("Web-1"));
}

#[test]
fn verbosity_only_argv_short_circuits() {
    let (mut invoker, trace) = fixture();
    let result = invoker.execute(&to_args(&["--verbose"])).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(trace.borrow().calls.is_empty());

    let result = invoker.execute(&[]).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(trace.borrow().calls.is_empty());
}

#[test]
fn implicit_experimental_group_command_still_dispatches() {
    let (mut invoker, trace) = fixture();
    let result = invoker.execute(&to_args(&["lab", "run"])).unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(trace.borrow().calls.len(), 1);
}

#[test]
fn at_file_token_expands_before_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("name.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "from-file").unwrap();

    let (mut invoker, trace) = fixture();
    invoker
        .execute(&to_args(&["vm", "create", &format!("@{}", path.display())]))
        .unwrap();
    let calls = trace.borrow();
    let (_, values) = &calls.calls[0];
    assert_eq!(values["name"], serde_json::json!("from-file"));
}

#[test]
fn validator_precedence_and_cli_error_passthrough() {
    struct Loader;
    impl CommandsLoader for Loader {
        fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
            session.add_command(
                CliCommand::new("deploy")
                    .arg_with(
                        "replicas",
                        ArgumentType::new()
                            .value_kind(ValueKind::Int)
                            .validator(|_| panic!("argument validator must not run")),
                    )
                    .validator(|namespace| {
                        let replicas = namespace
                            .get("replicas")
                            .and_then(|v| v.as_i64())
                            .unwrap_or(0);
                        if replicas > 10 {
                            return Err(CliError::new("too many replicas").into());
                        }
                        Ok(())
                    })
                    .handler(|values| Ok::<_, anyhow::Error>(values.clone())),
            );
            Ok(())
        }
    }

    let mut invoker = CommandInvoker::new(
        CommandSession::new("cloudctl", "1.0.0"),
        Box::new(Loader),
    );
    // the command-level validator runs alone and passes
    invoker
        .execute(&to_args(&["deploy", "--replicas", "3"]))
        .unwrap();
    // and its CliError propagates verbatim
    let err = invoker
        .execute(&to_args(&["deploy", "--replicas", "11"]))
        .unwrap_err();
    assert_eq!(err.to_string(), "too many replicas");
}

#[test]
fn choice_list_matches_case_insensitively() {
    struct Loader;
    impl CommandsLoader for Loader {
        fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
            session.add_command(
                CliCommand::new("deploy")
                    .arg_with(
                        "tier",
                        ArgumentType::new().choices(Choices::case_insensitive(["hot", "cold"])),
                    )
                    .handler(|values| Ok::<_, anyhow::Error>(values.clone())),
            );
            Ok(())
        }
    }

    let mut invoker = CommandInvoker::new(
        CommandSession::new("cloudctl", "1.0.0"),
        Box::new(Loader),
    );
    let result = invoker
        .execute(&to_args(&["deploy", "--tier", "Hot"]))
        .unwrap();
    assert_eq!(result.result["tier"], serde_json::json!("Hot"));

    let err = invoker
        .execute(&to_args(&["deploy", "--tier", "warm"]))
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn transform_and_filter_events_rewrite_in_order() {
    let (mut invoker, _) = fixture();
    invoker
        .events
        .register(argscope::EventId::TransformResult, |payload| {
            if let Some(value) = payload.result_mut() {
                *value = serde_json::json!({"stage": "transformed"});
            }
            Ok(())
        });
    invoker
        .events
        .register(argscope::EventId::FilterResult, |payload| {
            if let Some(value) = payload.result_mut() {
                value["filtered"] = serde_json::json!(true);
            }
            payload.set_query_active(true);
            Ok(())
        });

    let result = invoker.execute(&to_args(&["vm", "list"])).unwrap();
    assert_eq!(result.result["stage"], serde_json::json!("transformed"));
    assert_eq!(result.result["filtered"], serde_json::json!(true));
    assert!(result.is_query_active);
}

#[test]
fn help_token_and_help_flag_both_short_circuit() {
    let (mut invoker, trace) = fixture();
    let result = invoker.execute(&to_args(&["help"])).unwrap();
    assert_eq!(result.exit_code, 0);
    let result = invoker.execute(&to_args(&["vm", "--help"])).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(trace.borrow().calls.is_empty());
}
