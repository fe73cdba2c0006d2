//! End-to-end tests driving the example app through the framework invoker.

use std::cell::RefCell;
use std::rc::Rc;

use argscope::{CommandInvoker, CommandSession, Error};
use inventory_example::loader::InventoryLoader;
use inventory_example::store::Store;

fn to_args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn invoker() -> (CommandInvoker, Rc<RefCell<Store>>) {
    let store = Rc::new(RefCell::new(Store::seeded()));
    let session = CommandSession::new("invy", "1.0.0");
    let invoker = CommandInvoker::new(session, Box::new(InventoryLoader::new(store.clone())));
    (invoker, store)
}

#[test]
fn list_uses_registered_default_top() {
    let (mut invoker, _) = invoker();
    let result = invoker.execute(&to_args(&["item", "list"])).unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.result.as_array().unwrap().len(), 2);
    assert!(result.table_transformer.is_some());
}

#[test]
fn list_filters_by_tier_case_insensitively() {
    let (mut invoker, _) = invoker();
    let result = invoker
        .execute(&to_args(&["item", "list", "--tier", "HOT"]))
        .unwrap();
    let items = result.result.as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], serde_json::json!("bolt"));
}

#[test]
fn create_then_show_round_trips() {
    let (mut invoker, store) = invoker();
    invoker
        .execute(&to_args(&[
            "item", "create", "nut", "--tier", "hot", "--count", "7",
        ]))
        .unwrap();
    assert_eq!(store.borrow().get("nut").unwrap().count, 7);

    let result = invoker
        .execute(&to_args(&["item", "show", "nut"]))
        .unwrap();
    assert_eq!(result.result["tier"], serde_json::json!("hot"));
}

#[test]
fn create_validator_rejects_negative_count() {
    let (mut invoker, _) = invoker();
    let err = invoker
        .execute(&to_args(&["item", "create", "nut", "--count", "-3"]))
        .unwrap_err();
    assert_eq!(err.to_string(), "--count cannot be negative");
}

#[test]
fn deprecated_inspect_still_dispatches() {
    let (mut invoker, _) = invoker();
    let result = invoker
        .execute(&to_args(&["item", "inspect", "bolt"]))
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.result["name"], serde_json::json!("bolt"));
}

#[test]
fn tag_group_commands_share_name_argument() {
    let (mut invoker, store) = invoker();
    invoker
        .execute(&to_args(&[
            "tag", "add", "--name", "washer", "--tag", "metal", "--tag", "round",
        ]))
        .unwrap();
    assert_eq!(store.borrow().get("washer").unwrap().tags.len(), 2);

    invoker
        .execute(&to_args(&[
            "tag", "remove", "--name", "washer", "--tag", "round",
        ]))
        .unwrap();
    assert_eq!(store.borrow().get("washer").unwrap().tags, vec!["metal"]);
}

#[test]
fn misspelled_subcommand_suggests_real_one() {
    let (mut invoker, _) = invoker();
    let err = invoker.execute(&to_args(&["item", "lsit"])).unwrap_err();
    match err {
        Error::UnknownSubcommand { suggestions, .. } => {
            assert!(suggestions.contains(&"item list".to_string()));
        }
        other => panic!("expected UnknownSubcommand, got {other:?}"),
    }
}

#[test]
fn bare_invocation_shows_welcome() {
    let (mut invoker, _) = invoker();
    let result = invoker.execute(&[]).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.result.is_null());
}
