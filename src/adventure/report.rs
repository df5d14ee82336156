//! Structured results of one catch-up call and the display aggregation
//! applied to them. Nothing here is random: the same steps always produce
//! the same merged view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::adventure::tags::{Tag, TagCollection, TagType};

/// One completed quest step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdventureStep {
    pub quest_id: String,
    /// Copied from the quest so aggregation needs no content lookups.
    pub merge: bool,
    pub tags_gained: TagCollection,
    pub tags_lost: TagCollection,
}

impl AdventureStep {
    pub fn new(quest_id: &str, merge: bool) -> Self {
        Self {
            quest_id: quest_id.to_string(),
            merge,
            tags_gained: TagCollection::new(),
            tags_lost: TagCollection::new(),
        }
    }

    /// Zones gained with a quantity of at least one.
    pub fn discovered_zones(&self) -> Vec<String> {
        self.tags_gained
            .inventory(TagType::Zone)
            .map(|inv| {
                inv.iter()
                    .filter(|(_, quantity)| *quantity >= 1)
                    .map(|(zone_id, _)| zone_id.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Steps of one chain taken within a single tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdventureGroup {
    pub tick: u64,
    pub steps: Vec<AdventureStep>,
}

impl AdventureGroup {
    pub fn merge(&self) -> bool {
        self.steps.iter().any(|step| step.merge)
    }

    pub fn group_id(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.quest_id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdventureReport {
    /// Watermark before the call (epoch seconds).
    pub start_time: i64,
    /// Watermark after the call; only whole processed ticks are counted.
    pub end_time: i64,
    pub ticks: u64,
    /// Elapsed ticks left for a later call because of the tick budget.
    pub ticks_remaining: u64,
    pub groups: Vec<AdventureGroup>,
    /// Non-repeatable root quests locked during this call.
    pub newly_locked: Vec<String>,
    /// Chains still held open after the call, in registration order.
    pub open_quests: Vec<String>,
}

impl AdventureReport {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.steps.is_empty())
    }

    pub fn steps(&self) -> impl Iterator<Item = &AdventureStep> {
        self.groups.iter().flat_map(|group| group.steps.iter())
    }

    /// Display view: non-merge steps in their original order, followed by
    /// one combined step per merge quest id in first-seen order.
    pub fn merged_entries(&self) -> Vec<AdventureStep> {
        let mut singles = Vec::new();
        let mut merged: Vec<AdventureStep> = Vec::new();
        for step in self.steps() {
            if !step.merge {
                singles.push(step.clone());
                continue;
            }
            match merged.iter_mut().find(|m| m.quest_id == step.quest_id) {
                Some(combined) => {
                    combined.tags_gained.merge(&step.tags_gained);
                    combined.tags_lost.merge(&step.tags_lost);
                }
                None => merged.push(step.clone()),
            }
        }
        singles.extend(merged);
        singles
    }

    /// Zones discovered during the call, first-seen order, no duplicates.
    pub fn discovered_zones(&self) -> Vec<String> {
        let mut zones: Vec<String> = Vec::new();
        for zone_id in self.steps().flat_map(AdventureStep::discovered_zones) {
            if !zones.contains(&zone_id) {
                zones.push(zone_id);
            }
        }
        zones
    }

    pub fn total_gained(&self) -> TagCollection {
        let mut total = TagCollection::new();
        for step in self.steps() {
            total.merge(&step.tags_gained);
        }
        total
    }

    pub fn total_lost(&self) -> TagCollection {
        let mut total = TagCollection::new();
        for step in self.steps() {
            total.merge(&step.tags_lost);
        }
        total
    }

    /// Fold the report of a following call into this one. Tick indices of
    /// the later groups are shifted past this report's ticks.
    pub fn append(&mut self, later: AdventureReport) {
        let offset = self.ticks;
        self.groups
            .extend(later.groups.into_iter().map(|group| AdventureGroup {
                tick: group.tick + offset,
                steps: group.steps,
            }));
        self.end_time = later.end_time;
        self.ticks += later.ticks;
        self.ticks_remaining = later.ticks_remaining;
        self.newly_locked.extend(later.newly_locked);
        self.open_quests = later.open_quests;
    }

    /// Signed per-tag ledger deltas for the persistence write. Tags whose
    /// gains and losses cancel out are omitted.
    pub fn net_changes(&self) -> Vec<(Tag, i64)> {
        let mut net: BTreeMap<Tag, i64> = BTreeMap::new();
        for (tag_type, tag, quantity) in self.total_gained().iter() {
            *net.entry(Tag::new(tag_type, tag)).or_insert(0) += quantity;
        }
        for (tag_type, tag, quantity) in self.total_lost().iter() {
            *net.entry(Tag::new(tag_type, tag)).or_insert(0) -= quantity;
        }
        net.into_iter().filter(|(_, delta)| *delta != 0).collect()
    }
}
