//! The example's commands loader: the command table plus scoped argument
//! registrations, written the way a real command module would be.

use std::cell::RefCell;
use std::rc::Rc;

use argscope::{
    ArgumentType, Choices, CliCommand, CliError, CommandGroup, CommandSession, CommandsLoader,
    Deprecated, Error, Preview, TargetKind, ValueKind,
};

use crate::store::{Item, Store};

/// Loads the inventory command table against a shared store.
pub struct InventoryLoader {
    store: Rc<RefCell<Store>>,
}

impl InventoryLoader {
    pub fn new(store: Rc<RefCell<Store>>) -> Self {
        Self { store }
    }
}

impl Default for InventoryLoader {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(Store::seeded())))
    }
}

impl CommandsLoader for InventoryLoader {
    fn load_command_table(&mut self, session: &mut CommandSession) -> Result<(), Error> {
        session.add_group("item", CommandGroup::new().description("Manage inventory items."));
        session.add_group(
            "tag",
            CommandGroup::new()
                .description("Manage item tags.")
                .preview(Preview::new("tag", TargetKind::CommandGroup)),
        );

        let store = self.store.clone();
        session.add_command(
            CliCommand::new("item list")
                .description("List inventory items.")
                .arg("top")
                .arg("tier")
                .table_transformer(|value| value.clone())
                .handler(move |values| {
                    let top = values
                        .get("top")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(20) as usize;
                    let tier = values.get("tier").and_then(|v| v.as_str());
                    Ok::<_, anyhow::Error>(store.borrow().list(top, tier))
                }),
        );

        let store = self.store.clone();
        session.add_command(
            CliCommand::new("item create")
                .description("Create or replace an inventory item.")
                .arg("name")
                .arg("tier")
                .arg("count")
                .validator(|namespace| {
                    let count = namespace
                        .get("count")
                        .and_then(|v| v.as_i64())
                        .unwrap_or(0);
                    if count < 0 {
                        return Err(CliError::new("--count cannot be negative").into());
                    }
                    Ok(())
                })
                .handler(move |values| {
                    let item = Item {
                        name: values
                            .get("name")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        tier: values
                            .get("tier")
                            .and_then(|v| v.as_str())
                            .unwrap_or("cold")
                            .to_string(),
                        count: values.get("count").and_then(|v| v.as_i64()).unwrap_or(0),
                        tags: Vec::new(),
                    };
                    Ok::<_, anyhow::Error>(store.borrow_mut().create(item))
                }),
        );

        let store = self.store.clone();
        session.add_command(
            CliCommand::new("item show")
                .description("Show one inventory item.")
                .arg("name")
                .handler(move |values| {
                    let name = values
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    store
                        .borrow()
                        .get(name)
                        .ok_or_else(|| CliError::new(format!("no item named '{name}'")).into())
                }),
        );

        // the old spelling still works until 2.0.0
        let store = self.store.clone();
        session.add_command(
            CliCommand::new("item inspect")
                .deprecated(
                    Deprecated::new("item inspect", TargetKind::Command)
                        .redirect("item show")
                        .expiration("2.0.0"),
                )
                .arg("name")
                .handler(move |values| {
                    let name = values
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    store
                        .borrow()
                        .get(name)
                        .ok_or_else(|| CliError::new(format!("no item named '{name}'")).into())
                }),
        );

        let store = self.store.clone();
        session.add_command(
            CliCommand::new("tag add")
                .description("Add tags to an item.")
                .arg("name")
                .arg("tags")
                .handler(move |values| {
                    let name = values
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let tags: Vec<String> = values
                        .get("tags")
                        .and_then(|v| v.as_array())
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(|v| v.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    store
                        .borrow_mut()
                        .tag(name, &tags)
                        .ok_or_else(|| CliError::new(format!("no item named '{name}'")).into())
                }),
        );

        let store = self.store.clone();
        session.add_command(
            CliCommand::new("tag remove")
                .description("Remove one tag from an item.")
                .arg("name")
                .arg("tag")
                .handler(move |values| {
                    let name = values
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let tag = values.get("tag").and_then(|v| v.as_str()).unwrap_or_default();
                    store
                        .borrow_mut()
                        .untag(name, tag)
                        .ok_or_else(|| CliError::new(format!("no item named '{name}'")).into())
                }),
        );
        Ok(())
    }

    fn load_arguments(&mut self, session: &mut CommandSession, command: &str) -> Result<(), Error> {
        log::debug!("loading arguments for '{command}'");

        // tier is shared across the whole item group; list refines the default
        let mut ctx = session.argument_context("item");
        ctx.argument(
            "tier",
            ArgumentType::new()
                .options(["--tier", "-t"])
                .choices(Choices::case_insensitive(["hot", "cold"]))
                .help("Storage tier."),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("item list");
        ctx.argument(
            "top",
            ArgumentType::new()
                .value_kind(ValueKind::Int)
                .default(20)
                .help("Show at most this many items."),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("item create");
        ctx.positional("name", ArgumentType::new().help("Item name."))?;
        ctx.argument(
            "count",
            ArgumentType::new()
                .value_kind(ValueKind::Int)
                .default(0)
                .help("Initial stock count."),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("item show");
        ctx.positional("name", ArgumentType::new().help("Item name."))?;
        ctx.close();

        let mut ctx = session.argument_context("item inspect");
        ctx.positional("name", ArgumentType::new().help("Item name."))?;
        ctx.close();

        let mut ctx = session.argument_context("tag");
        ctx.argument(
            "name",
            ArgumentType::new().options(["--name", "-n"]).required(true).help("Item name."),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("tag add");
        ctx.argument(
            "tags",
            ArgumentType::new()
                .action(argscope::ArgAction::Append)
                .options(["--tag"])
                .help("Tag to add; repeatable."),
        )?;
        ctx.close();

        let mut ctx = session.argument_context("tag remove");
        ctx.argument("tag", ArgumentType::new().options(["--tag"]).required(true))?;
        ctx.close();
        Ok(())
    }
}
