//! Tagged resource ledger: items, experience and zone unlocks share one
//! signed-quantity model keyed by `(category, identifier)`.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag categories. `level` only exists in content files and is converted
/// to [`TagType::Xp`] while loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Item,
    Zone,
    Xp,
}

impl TagType {
    pub const ALL: [TagType; 3] = [TagType::Item, TagType::Zone, TagType::Xp];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Item => "item",
            TagType::Zone => "zone",
            TagType::Xp => "xp",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key for a ledger entry, e.g. `(Item, "birch_log")`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub tag_type: TagType,
    pub id: String,
}

impl Tag {
    pub fn new(tag_type: TagType, id: &str) -> Self {
        Self {
            tag_type,
            id: id.to_string(),
        }
    }

    pub fn item(id: &str) -> Self {
        Self::new(TagType::Item, id)
    }

    pub fn zone(id: &str) -> Self {
        Self::new(TagType::Zone, id)
    }

    pub fn xp(id: &str) -> Self {
        Self::new(TagType::Xp, id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag_type, self.id)
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Quantities for one tag category. Stored quantities are never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    tags: BTreeMap<String, i64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held quantity, 0 when absent.
    pub fn get(&self, tag: &str) -> i64 {
        self.tags.get(tag).copied().unwrap_or(0)
    }

    /// Add `quantity` of `tag`. Zero is a no-op, a negative quantity behaves
    /// like [`Inventory::remove`] and reports its outcome.
    pub fn add(&mut self, tag: &str, quantity: i64) -> bool {
        if quantity < 0 {
            return self.remove(tag, -quantity);
        }
        if quantity == 0 {
            return true;
        }
        *self.tags.entry(tag.to_string()).or_insert(0) += quantity;
        true
    }

    /// Remove `quantity` of `tag`. Fails without mutating when the held
    /// quantity is insufficient; non-positive quantities trivially succeed.
    pub fn remove(&mut self, tag: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return true;
        }
        let held = self.get(tag);
        if held < quantity {
            return false;
        }
        let remaining = held - quantity;
        if remaining == 0 {
            self.tags.remove(tag);
        } else {
            self.tags.insert(tag.to_string(), remaining);
        }
        true
    }

    pub fn merge(&mut self, other: &Inventory) {
        for (tag, quantity) in &other.tags {
            self.add(tag, *quantity);
        }
    }

    /// True when every entry of `other` could be removed from `self`.
    pub fn can_subtract(&self, other: &Inventory) -> bool {
        other
            .tags
            .iter()
            .all(|(tag, quantity)| *quantity <= 0 || self.get(tag) >= *quantity)
    }

    /// Remove every entry of `other`, all or nothing.
    pub fn subtract(&mut self, other: &Inventory) -> bool {
        if !self.can_subtract(other) {
            return false;
        }
        for (tag, quantity) in &other.tags {
            self.remove(tag, *quantity);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.tags.iter().map(|(tag, quantity)| (tag.as_str(), *quantity))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for (tag, quantity) in iter {
            inventory.add(&tag.into(), quantity);
        }
        inventory
    }
}

// ============================================================================
// TagCollection
// ============================================================================

/// One [`Inventory`] per tag category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagCollection {
    inventories: BTreeMap<TagType, Inventory>,
}

// Lazily created empty inventories must not affect equality.
impl PartialEq for TagCollection {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for TagCollection {}

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable inventory for a category, created empty on first access.
    pub fn inventory_mut(&mut self, tag_type: TagType) -> &mut Inventory {
        self.inventories.entry(tag_type).or_default()
    }

    pub fn inventory(&self, tag_type: TagType) -> Option<&Inventory> {
        self.inventories.get(&tag_type)
    }

    pub fn quantity(&self, tag_type: TagType, tag: &str) -> i64 {
        self.inventory(tag_type).map(|inv| inv.get(tag)).unwrap_or(0)
    }

    pub fn get(&self, tag: &Tag) -> i64 {
        self.quantity(tag.tag_type, &tag.id)
    }

    pub fn add_tag(&mut self, tag_type: TagType, tag: &str, quantity: i64) -> bool {
        self.inventory_mut(tag_type).add(tag, quantity)
    }

    pub fn remove_tag(&mut self, tag_type: TagType, tag: &str, quantity: i64) -> bool {
        self.inventory_mut(tag_type).remove(tag, quantity)
    }

    pub fn merge(&mut self, other: &TagCollection) {
        for (tag_type, inventory) in &other.inventories {
            self.inventory_mut(*tag_type).merge(inventory);
        }
    }

    /// Remove every entry of `other` across all categories, all or nothing.
    pub fn subtract(&mut self, other: &TagCollection) -> bool {
        let fits = other.inventories.iter().all(|(tag_type, inventory)| {
            match self.inventories.get(tag_type) {
                Some(current) => current.can_subtract(inventory),
                None => Inventory::new().can_subtract(inventory),
            }
        });
        if !fits {
            return false;
        }
        for (tag_type, inventory) in &other.inventories {
            self.inventory_mut(*tag_type).subtract(inventory);
        }
        true
    }

    /// Every stored entry as `(category, tag, quantity)`.
    pub fn iter(&self) -> impl Iterator<Item = (TagType, &str, i64)> {
        self.inventories.iter().flat_map(|(tag_type, inventory)| {
            inventory
                .iter()
                .map(move |(tag, quantity)| (*tag_type, tag, quantity))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inventories.values().all(Inventory::is_empty)
    }
}
