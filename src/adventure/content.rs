//! Content loaders for items, zones and the quest graph.
//!
//! Content lives in JSON files under the configured content directory:
//! `items.json`, `zones.json` and one file per zone under `zones/`. Everything
//! is validated while loading so the simulation never meets a dangling
//! reference; any problem aborts startup with [`AdventureError::Content`].

use log::{debug, info};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::adventure::errors::AdventureError;
use crate::adventure::skills::level_to_xp;
use crate::adventure::tags::{Tag, TagType};
use crate::adventure::types::{
    ItemRecord, Quest, QuestNextStep, QuestRequirement, QuestReward, ZoneRecord,
};

/// Immutable quest graph plus the item and zone tables used for display.
/// Built once at startup and shared by reference with every simulation.
#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    items: BTreeMap<String, ItemRecord>,
    zones: BTreeMap<String, ZoneRecord>,
    quests: HashMap<String, Quest>,
    root_quests: Vec<String>,
}

impl ContentLibrary {
    pub fn builder() -> ContentLibraryBuilder {
        ContentLibraryBuilder::default()
    }

    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.get(quest_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemRecord> {
        self.items.get(item_id)
    }

    pub fn zone(&self, zone_id: &str) -> Option<&ZoneRecord> {
        self.zones.get(zone_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZoneRecord> {
        self.zones.values()
    }

    pub fn quest_count(&self) -> usize {
        self.quests.len()
    }

    /// Root quests in content order.
    pub fn root_quests(&self) -> impl Iterator<Item = &Quest> {
        self.root_quests
            .iter()
            .filter_map(move |quest_id| self.quests.get(quest_id))
    }
}

/// Collects content records and validates cross references on `build`.
#[derive(Debug, Default)]
pub struct ContentLibraryBuilder {
    items: Vec<ItemRecord>,
    zones: Vec<ZoneRecord>,
    quests: Vec<Quest>,
}

impl ContentLibraryBuilder {
    pub fn item(mut self, item: ItemRecord) -> Self {
        self.items.push(item);
        self
    }

    pub fn zone(mut self, zone: ZoneRecord) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn quest(mut self, quest: Quest) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn build(self) -> Result<ContentLibrary, AdventureError> {
        let mut items = BTreeMap::new();
        for item in self.items {
            if items.contains_key(&item.id) {
                return Err(AdventureError::Content(format!(
                    "Duplicate item id found: {}",
                    item.id
                )));
            }
            items.insert(item.id.clone(), item);
        }

        let mut zones = BTreeMap::new();
        for zone in self.zones {
            if zones.contains_key(&zone.id) {
                return Err(AdventureError::Content(format!(
                    "Duplicate zone id found: {}",
                    zone.id
                )));
            }
            zones.insert(zone.id.clone(), zone);
        }

        let mut quests = HashMap::new();
        let mut root_quests = Vec::new();
        for quest in self.quests {
            if quests.contains_key(&quest.id) {
                return Err(AdventureError::Content(format!(
                    "Duplicate quest id found: {}",
                    quest.id
                )));
            }
            if !zones.contains_key(&quest.zone_id) {
                return Err(AdventureError::Content(format!(
                    "Quest {} references unknown zone: {}",
                    quest.id, quest.zone_id
                )));
            }
            let tags = quest
                .requirements
                .iter()
                .map(|req| &req.tag)
                .chain(quest.rewards.iter().map(|reward| &reward.tag));
            for tag in tags {
                check_tag_reference(&items, &zones, &quest.id, tag)?;
            }
            if quest.is_root() {
                root_quests.push(quest.id.clone());
            }
            quests.insert(quest.id.clone(), quest);
        }

        for quest in quests.values() {
            for step in &quest.next_steps {
                if !quests.contains_key(&step.quest_id) {
                    return Err(AdventureError::Content(format!(
                        "Quest {} has unknown next step: {}",
                        quest.id, step.quest_id
                    )));
                }
            }
        }

        Ok(ContentLibrary {
            items,
            zones,
            quests,
            root_quests,
        })
    }
}

fn check_tag_reference(
    items: &BTreeMap<String, ItemRecord>,
    zones: &BTreeMap<String, ZoneRecord>,
    quest_id: &str,
    tag: &Tag,
) -> Result<(), AdventureError> {
    let known = match tag.tag_type {
        TagType::Item => items.contains_key(&tag.id),
        TagType::Zone => zones.contains_key(&tag.id),
        TagType::Xp => true,
    };
    if known {
        Ok(())
    } else {
        Err(AdventureError::Content(format!(
            "Invalid {}_id found in quest {}: {}",
            tag.tag_type, quest_id, tag.id
        )))
    }
}

// ============================================================================
// File loaders
// ============================================================================

/// Load `items.json`, `zones.json` and every `zones/*.json` quest file under
/// `content_dir`. Quest files are read in file-name order.
pub fn load_content<P: AsRef<Path>>(content_dir: P) -> Result<ContentLibrary, AdventureError> {
    let dir = content_dir.as_ref();
    let mut builder = ContentLibrary::builder();

    for item in load_items_from_json(dir.join("items.json"))? {
        builder = builder.item(item);
    }
    for zone in load_zones_from_json(dir.join("zones.json"))? {
        builder = builder.zone(zone);
    }

    let quest_dir = dir.join("zones");
    let mut files: Vec<_> = fs::read_dir(&quest_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();
    for file in files {
        let quests = load_quests_from_json(&file)?;
        debug!("loaded {} quests from {}", quests.len(), file.display());
        for quest in quests {
            builder = builder.quest(quest);
        }
    }

    let library = builder.build()?;
    info!(
        "content loaded: {} items, {} zones, {} quests ({} roots)",
        library.items.len(),
        library.zones.len(),
        library.quests.len(),
        library.root_quests.len()
    );
    Ok(library)
}

/// Load items from an `items.json` array.
pub fn load_items_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<ItemRecord>, AdventureError> {
    let seeds: Vec<ItemSeed> = read_json(path.as_ref())?;
    Ok(seeds
        .into_iter()
        .map(|seed| {
            let mut item = ItemRecord::new(&seed.item);
            if let Some(name) = seed.name {
                item = item.with_name(&name);
                item.plural = format!("{}s", item.name);
            }
            if let Some(plural) = seed.plural {
                item = item.with_plural(&plural);
            }
            item
        })
        .collect())
}

/// Load zones from a `zones.json` array.
pub fn load_zones_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<ZoneRecord>, AdventureError> {
    let seeds: Vec<ZoneSeed> = read_json(path.as_ref())?;
    Ok(seeds
        .into_iter()
        .map(|seed| {
            let mut zone = ZoneRecord::new(&seed.zone);
            if let Some(name) = seed.name {
                zone = zone.with_name(&name);
            }
            if let Some(description) = seed.description {
                zone = zone.with_description(&description);
            }
            if seed.public {
                zone = zone.public();
            }
            zone
        })
        .collect())
}

/// Load quest records from one zone file. Only per-record shape is checked
/// here; cross references are validated by [`ContentLibraryBuilder::build`].
pub fn load_quests_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Quest>, AdventureError> {
    let path = path.as_ref();
    let seeds: Vec<QuestSeed> = read_json(path)?;
    seeds
        .into_iter()
        .map(|seed| {
            let quest_id = seed.quest.clone();
            seed.into_quest().map_err(|reason| {
                AdventureError::Content(format!(
                    "{}: quest {}: {}",
                    path.display(),
                    quest_id,
                    reason
                ))
            })
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AdventureError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        AdventureError::Content(format!("Failed to parse {}: {}", path.display(), e))
    })
}

// ============================================================================
// Seed data structures that match JSON format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemSeed {
    item: String,
    name: Option<String>,
    plural: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneSeed {
    zone: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PromptSeed {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuantitySeed {
    Fixed(i64),
    Range([i64; 2]),
}

/// A requirement or reward entry. Exactly one of the category keys must be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagSeed {
    item: Option<String>,
    zone: Option<String>,
    xp: Option<String>,
    level: Option<String>,
    quantity: Option<QuantitySeed>,
    consume: Option<bool>,
    chance: Option<f64>,
}

/// Parsed category of a tag entry before `level` is folded into `xp`.
enum SeedTag {
    Plain(Tag),
    Level(String),
}

impl TagSeed {
    fn tag(&self) -> Result<SeedTag, String> {
        let mut found = Vec::new();
        if let Some(id) = &self.item {
            found.push(SeedTag::Plain(Tag::item(id)));
        }
        if let Some(id) = &self.zone {
            found.push(SeedTag::Plain(Tag::zone(id)));
        }
        if let Some(id) = &self.xp {
            found.push(SeedTag::Plain(Tag::xp(id)));
        }
        if let Some(id) = &self.level {
            found.push(SeedTag::Level(id.clone()));
        }
        match found.len() {
            0 => Err("tag entry has no item/zone/xp/level key".to_string()),
            1 => Ok(found.remove(0)),
            _ => Err("tag entry has more than one item/zone/xp/level key".to_string()),
        }
    }

    fn into_requirement(self) -> Result<QuestRequirement, String> {
        if self.chance.is_some() {
            return Err("requirements do not take a chance".to_string());
        }
        let quantity = match self.quantity {
            None => 1,
            Some(QuantitySeed::Fixed(n)) => n,
            Some(QuantitySeed::Range(_)) => {
                return Err("requirement quantity must be a single number".to_string())
            }
        };
        if quantity < 0 {
            return Err(format!("negative requirement quantity {}", quantity));
        }
        let (tag, quantity) = match self.tag()? {
            SeedTag::Plain(tag) => (tag, quantity),
            SeedTag::Level(skill) => (Tag::xp(&skill), level_to_xp(quantity)),
        };
        Ok(QuestRequirement {
            tag,
            quantity,
            consume: self.consume.unwrap_or(false),
        })
    }

    fn into_reward(self) -> Result<QuestReward, String> {
        if self.consume.is_some() {
            return Err("rewards cannot be consumed".to_string());
        }
        let tag = match self.tag()? {
            SeedTag::Plain(tag) => tag,
            SeedTag::Level(_) => return Err("Cannot reward skill experience in levels".to_string()),
        };
        let quantity = match self.quantity {
            None => (1, 1),
            Some(QuantitySeed::Fixed(n)) => (n, n),
            Some(QuantitySeed::Range([lo, hi])) => (lo, hi),
        };
        if quantity.0 < 0 {
            return Err(format!("negative reward quantity {:?}", quantity));
        }
        if quantity.0 > quantity.1 {
            return Err(format!("reward range {:?} is inverted", quantity));
        }
        let chance = self.chance.unwrap_or(100.0);
        check_chance(chance)?;
        Ok(QuestReward {
            tag,
            quantity,
            chance,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NextStepSeed {
    quest: String,
    chance: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestSeed {
    quest: String,
    zone: String,
    prompt: Option<PromptSeed>,
    frequency: Option<f64>,
    #[serde(default = "default_repeatable")]
    repeatable: bool,
    #[serde(default)]
    merge: bool,
    #[serde(default)]
    hold_open: bool,
    #[serde(default)]
    reqs: Vec<TagSeed>,
    #[serde(default)]
    rewards: Vec<TagSeed>,
    #[serde(default)]
    next: Vec<NextStepSeed>,
}

fn default_repeatable() -> bool {
    true
}

fn check_chance(chance: f64) -> Result<(), String> {
    if (0.0..=100.0).contains(&chance) {
        Ok(())
    } else {
        Err(format!("chance {} outside 0..=100", chance))
    }
}

impl QuestSeed {
    fn into_quest(self) -> Result<Quest, String> {
        if let Some(frequency) = self.frequency {
            if !frequency.is_finite() || frequency < 0.0 {
                return Err(format!("invalid frequency {}", frequency));
            }
        }
        let prompts = match self.prompt {
            None => Vec::new(),
            Some(PromptSeed::One(prompt)) => vec![prompt],
            Some(PromptSeed::Many(prompts)) => prompts,
        };
        let requirements = self
            .reqs
            .into_iter()
            .map(TagSeed::into_requirement)
            .collect::<Result<Vec<_>, _>>()?;
        let rewards = self
            .rewards
            .into_iter()
            .map(TagSeed::into_reward)
            .collect::<Result<Vec<_>, _>>()?;
        let next_steps = self
            .next
            .into_iter()
            .map(|seed| {
                let chance = seed.chance.unwrap_or(100.0);
                check_chance(chance)?;
                Ok(QuestNextStep {
                    quest_id: seed.quest,
                    chance,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Quest {
            id: self.quest,
            zone_id: self.zone,
            prompts,
            frequency: self.frequency,
            repeatable: self.repeatable,
            merge: self.merge,
            hold_open: self.hold_open,
            requirements,
            rewards,
            next_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Quest, String> {
        let seed: QuestSeed = serde_json::from_str(json).map_err(|e| e.to_string())?;
        seed.into_quest()
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_items_from_json("nonexistent.json");
        assert!(matches!(result, Err(AdventureError::Io(_))));
    }

    #[test]
    fn quest_defaults_apply() {
        let quest = parse(r#"{"quest": "chop", "zone": "forest", "prompt": "You chop."}"#).unwrap();
        assert_eq!(quest.prompts, vec!["You chop.".to_string()]);
        assert!(quest.repeatable);
        assert!(!quest.merge);
        assert!(!quest.hold_open);
        assert!(!quest.is_root());
    }

    #[test]
    fn scalar_and_range_reward_quantities() {
        let quest = parse(
            r#"{"quest": "q", "zone": "z", "rewards": [
                {"item": "log", "quantity": 2},
                {"item": "bark", "quantity": [1, 4], "chance": 25}
            ]}"#,
        )
        .unwrap();
        assert_eq!(quest.rewards[0].quantity, (2, 2));
        assert_eq!(quest.rewards[0].chance, 100.0);
        assert_eq!(quest.rewards[1].quantity, (1, 4));
        assert_eq!(quest.rewards[1].chance, 25.0);
    }

    #[test]
    fn level_requirement_becomes_xp() {
        let quest = parse(
            r#"{"quest": "q", "zone": "z", "reqs": [{"level": "woodcutting", "quantity": 3}]}"#,
        )
        .unwrap();
        assert_eq!(quest.requirements[0].tag, Tag::xp("woodcutting"));
        assert_eq!(quest.requirements[0].quantity, 90);
    }

    #[test]
    fn level_reward_is_rejected() {
        let err = parse(r#"{"quest": "q", "zone": "z", "rewards": [{"level": "mining"}]}"#)
            .unwrap_err();
        assert!(err.contains("levels"));
    }

    #[test]
    fn tag_entry_needs_exactly_one_category() {
        assert!(parse(r#"{"quest": "q", "zone": "z", "reqs": [{"quantity": 1}]}"#).is_err());
        assert!(
            parse(r#"{"quest": "q", "zone": "z", "reqs": [{"item": "a", "zone": "b"}]}"#).is_err()
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse(r#"{"quest": "q", "zone": "z", "colour": "red"}"#).is_err());
    }

    #[test]
    fn inverted_range_and_bad_chance_are_rejected() {
        assert!(parse(r#"{"quest": "q", "zone": "z", "rewards": [{"item": "a", "quantity": [3, 1]}]}"#).is_err());
        assert!(parse(r#"{"quest": "q", "zone": "z", "next": [{"quest": "r", "chance": 120}]}"#).is_err());
    }

    #[test]
    fn builder_rejects_dangling_references() {
        let zone = ZoneRecord::new("forest");
        let missing_item = ContentLibrary::builder()
            .zone(zone.clone())
            .quest(Quest::new("q", "forest").with_reward(Tag::item("ghost"), (1, 1), 100.0))
            .build();
        assert!(matches!(missing_item, Err(AdventureError::Content(_))));

        let missing_step = ContentLibrary::builder()
            .zone(zone.clone())
            .quest(Quest::new("q", "forest").with_next_step("nowhere", 100.0))
            .build();
        assert!(matches!(missing_step, Err(AdventureError::Content(_))));

        let duplicate = ContentLibrary::builder()
            .zone(zone)
            .quest(Quest::new("q", "forest"))
            .quest(Quest::new("q", "forest"))
            .build();
        assert!(matches!(duplicate, Err(AdventureError::Content(_))));
    }

    #[test]
    fn root_quests_keep_content_order() {
        let library = ContentLibrary::builder()
            .zone(ZoneRecord::new("forest"))
            .quest(Quest::new("b", "forest").with_frequency(5.0))
            .quest(Quest::new("step", "forest"))
            .quest(Quest::new("a", "forest").with_frequency(1.0))
            .build()
            .unwrap();
        let roots: Vec<&str> = library.root_quests().map(|q| q.id.as_str()).collect();
        assert_eq!(roots, vec!["b", "a"]);
    }
}
