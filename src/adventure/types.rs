use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::adventure::tags::{Tag, TagCollection, TagType};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const ADVENTURE_SCHEMA_VERSION: u8 = 1;

// ============================================================================
// Content records (immutable after load)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    pub plural: String,
}

impl ItemRecord {
    pub fn new(id: &str) -> Self {
        let name = id.replace('_', " ").to_lowercase();
        let plural = format!("{}s", name);
        Self {
            id: id.to_string(),
            name,
            plural,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_lowercase();
        self
    }

    pub fn with_plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_lowercase();
        self
    }

    /// Singular or plural display name for a quantity.
    pub fn display_name(&self, quantity: i64) -> &str {
        if quantity == 1 {
            &self.name
        } else {
            &self.plural
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Public zones are open to every player without discovering them.
    pub public: bool,
}

impl ZoneRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.replace('_', " ").to_lowercase(),
            description: String::new(),
            public: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_lowercase();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// A tag the player must hold to start a quest step. A quantity of zero
/// means the player must hold none of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestRequirement {
    pub tag: Tag,
    pub quantity: i64,
    pub consume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestReward {
    pub tag: Tag,
    /// Inclusive range, possibly degenerate.
    pub quantity: (i64, i64),
    /// Percent chance in `[0, 100]`.
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestNextStep {
    pub quest_id: String,
    pub chance: f64,
}

/// One step of the quest graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: String,
    pub zone_id: String,
    pub prompts: Vec<String>,
    /// Expected minutes between spontaneous starts; `Some` marks a root quest.
    pub frequency: Option<f64>,
    pub repeatable: bool,
    /// Display only: repeated occurrences are combined in reports.
    pub merge: bool,
    /// Keep the chain open for later ticks when no next step is taken.
    pub hold_open: bool,
    pub requirements: Vec<QuestRequirement>,
    pub rewards: Vec<QuestReward>,
    pub next_steps: Vec<QuestNextStep>,
}

impl Quest {
    pub fn new(id: &str, zone_id: &str) -> Self {
        Self {
            id: id.to_string(),
            zone_id: zone_id.to_string(),
            prompts: Vec::new(),
            frequency: None,
            repeatable: true,
            merge: false,
            hold_open: false,
            requirements: Vec::new(),
            rewards: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.frequency.is_some()
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompts.push(prompt.to_string());
        self
    }

    pub fn with_frequency(mut self, minutes: f64) -> Self {
        self.frequency = Some(minutes);
        self
    }

    pub fn not_repeatable(mut self) -> Self {
        self.repeatable = false;
        self
    }

    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn with_requirement(mut self, tag: Tag, quantity: i64, consume: bool) -> Self {
        self.requirements.push(QuestRequirement {
            tag,
            quantity,
            consume,
        });
        self
    }

    pub fn with_reward(mut self, tag: Tag, quantity: (i64, i64), chance: f64) -> Self {
        self.rewards.push(QuestReward {
            tag,
            quantity,
            chance,
        });
        self
    }

    pub fn with_next_step(mut self, quest_id: &str, chance: f64) -> Self {
        self.next_steps.push(QuestNextStep {
            quest_id: quest_id.to_string(),
            chance,
        });
        self
    }
}

// ============================================================================
// Persisted player state
// ============================================================================

/// Per-player session record. A new one is appended each time the player
/// starts adventuring; `last_updated` is the tick watermark in epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdventureRecord {
    pub adventure_id: u64,
    pub user_id: u64,
    pub zone_id: String,
    pub started_at: i64,
    pub last_updated: i64,
    pub schema_version: u8,
}

impl AdventureRecord {
    pub fn new(adventure_id: u64, user_id: u64, zone_id: &str, started_at: i64) -> Self {
        Self {
            adventure_id,
            user_id,
            zone_id: zone_id.to_string(),
            started_at,
            last_updated: started_at,
            schema_version: ADVENTURE_SCHEMA_VERSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub user_id: u64,
    pub tags: TagCollection,
    /// Zones granted beyond the public ones.
    pub zone_access: BTreeSet<String>,
    /// Held-open chain ids in registration order.
    pub open_quests: Vec<String>,
    /// Completed non-repeatable root quests.
    pub locked_quests: BTreeSet<String>,
    pub current_adventure: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(user_id: u64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            tags: TagCollection::new(),
            zone_access: BTreeSet::new(),
            open_quests: Vec::new(),
            locked_quests: BTreeSet::new(),
            current_adventure: None,
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn quantity(&self, tag_type: TagType, tag: &str) -> i64 {
        self.tags.quantity(tag_type, tag)
    }
}
