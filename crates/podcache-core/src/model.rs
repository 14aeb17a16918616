//! Inventory records and the immutable snapshots the cache hands out.

use serde::{Deserialize, Serialize};

/// One upstream pod as seen at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub namespace: String,
    pub status: String,
}

impl InventoryItem {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            status: status.into(),
        }
    }

    /// Case-insensitive substring match against any of the three fields.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.namespace, &self.status]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Ordered, immutable list of items in the order upstream reported them.
///
/// A refresh replaces the whole snapshot; items are never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    items: Vec<InventoryItem>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryItem> {
        self.items.iter()
    }
}

impl From<Vec<InventoryItem>> for Snapshot {
    fn from(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }
}

impl FromIterator<InventoryItem> for Snapshot {
    fn from_iter<I: IntoIterator<Item = InventoryItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a InventoryItem;
    type IntoIter = std::slice::Iter<'a, InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_upstream_order() {
        let snapshot: Snapshot = ["c", "a", "b"]
            .into_iter()
            .map(|name| InventoryItem::new(name, "default", "Running"))
            .collect();

        let names: Vec<&str> = snapshot.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn item_serializes_with_three_fields() {
        let item = InventoryItem::new("web-1", "prod", "Running");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "web-1", "namespace": "prod", "status": "Running"})
        );
    }

    #[test]
    fn snapshot_serializes_as_array() {
        let snapshot = Snapshot::from(vec![InventoryItem::new("a", "b", "c")]);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn matches_any_field_ignoring_case() {
        let item = InventoryItem::new("Web-1", "PROD", "Running");
        assert!(item.matches("web"));
        assert!(item.matches("prod"));
        assert!(item.matches("run"));
        assert!(!item.matches("pending"));
    }
}
