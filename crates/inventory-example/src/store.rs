//! The in-memory inventory store backing the example commands.

use serde::Serialize;

/// One inventory item.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub name: String,
    pub tier: String,
    pub count: i64,
    pub tags: Vec<String>,
}

/// A trivially simple store; a real app would talk to a database here.
#[derive(Debug, Default)]
pub struct Store {
    items: Vec<Item>,
}

impl Store {
    /// A store seeded with a few items so `list` has something to show.
    pub fn seeded() -> Self {
        Self {
            items: vec![
                Item {
                    name: "bolt".into(),
                    tier: "hot".into(),
                    count: 120,
                    tags: vec!["hardware".into()],
                },
                Item {
                    name: "washer".into(),
                    tier: "cold".into(),
                    count: 48,
                    tags: Vec::new(),
                },
            ],
        }
    }

    pub fn list(&self, top: usize, tier: Option<&str>) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| tier.map_or(true, |t| item.tier.eq_ignore_ascii_case(t)))
            .take(top)
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Item> {
        self.items.iter().find(|item| item.name == name).cloned()
    }

    pub fn create(&mut self, item: Item) -> Item {
        self.items.retain(|existing| existing.name != item.name);
        self.items.push(item.clone());
        item
    }

    pub fn tag(&mut self, name: &str, tags: &[String]) -> Option<Item> {
        let item = self.items.iter_mut().find(|item| item.name == name)?;
        for tag in tags {
            if !item.tags.contains(tag) {
                item.tags.push(tag.clone());
            }
        }
        Some(item.clone())
    }

    pub fn untag(&mut self, name: &str, tag: &str) -> Option<Item> {
        let item = self.items.iter_mut().find(|item| item.name == name)?;
        item.tags.retain(|existing| existing != tag);
        Some(item.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_list_and_get() {
        let store = Store::seeded();
        assert_eq!(store.list(10, None).len(), 2);
        assert_eq!(store.list(10, Some("HOT")).len(), 1);
        assert!(store.get("bolt").is_some());
        assert!(store.get("nut").is_none());
    }

    #[test]
    fn test_create_replaces_same_name() {
        let mut store = Store::seeded();
        store.create(Item {
            name: "bolt".into(),
            tier: "cold".into(),
            count: 1,
            tags: Vec::new(),
        });
        assert_eq!(store.list(10, None).len(), 2);
        assert_eq!(store.get("bolt").unwrap().tier, "cold");
    }

    #[test]
    fn test_tag_and_untag() {
        let mut store = Store::seeded();
        let item = store.tag("washer", &["metal".into(), "metal".into()]).unwrap();
        assert_eq!(item.tags, vec!["metal"]);
        let item = store.untag("washer", "metal").unwrap();
        assert!(item.tags.is_empty());
    }
}
