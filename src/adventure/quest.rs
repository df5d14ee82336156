//! Per-step quest resolution: requirement gating, reward rolls and
//! next-step selection.
use rand::Rng;

use crate::adventure::content::ContentLibrary;
use crate::adventure::errors::AdventureError;
use crate::adventure::tags::TagCollection;
use crate::adventure::types::Quest;

/// Tags changed by completing one quest step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedQuest {
    pub quest_id: String,
    pub tags_gained: TagCollection,
    pub tags_lost: TagCollection,
}

/// Uniform draw in `[0, 100)` compared against a percent chance.
fn roll_percent<R: Rng>(rng: &mut R, chance: f64) -> bool {
    rng.gen::<f64>() * 100.0 < chance
}

/// True when the player is in the quest's zone and holds every required
/// tag. A zero-quantity requirement demands the player hold none.
pub fn check_requirements(quest: &Quest, player_tags: &TagCollection, zone_id: &str) -> bool {
    if zone_id != quest.zone_id {
        return false;
    }
    quest.requirements.iter().all(|req| {
        let held = player_tags.get(&req.tag);
        if req.quantity == 0 {
            held <= 0
        } else {
            held >= req.quantity
        }
    })
}

/// Roll every reward independently.
pub fn roll_rewards<R: Rng>(quest: &Quest, rng: &mut R) -> TagCollection {
    let mut gained = TagCollection::new();
    for reward in &quest.rewards {
        if !roll_percent(rng, reward.chance) {
            continue;
        }
        let (lo, hi) = reward.quantity;
        let quantity = if lo >= hi { lo } else { rng.gen_range(lo..=hi) };
        gained.add_tag(reward.tag.tag_type, &reward.tag.id, quantity);
    }
    gained
}

/// Exact quantities of every `consume` requirement.
pub fn consumed_tags(quest: &Quest) -> TagCollection {
    let mut lost = TagCollection::new();
    for req in quest.requirements.iter().filter(|req| req.consume) {
        lost.add_tag(req.tag.tag_type, &req.tag.id, req.quantity);
    }
    lost
}

/// Roll the outcome of a quest step without touching the player ledger.
pub fn complete_quest<R: Rng>(quest: &Quest, rng: &mut R) -> CompletedQuest {
    CompletedQuest {
        quest_id: quest.id.clone(),
        tags_gained: roll_rewards(quest, rng),
        tags_lost: consumed_tags(quest),
    }
}

/// Walk `next_steps` in content order; the first step whose requirements
/// pass gets one chance roll, and the first successful roll wins.
pub fn choose_next_step<'a, R: Rng>(
    library: &'a ContentLibrary,
    quest: &Quest,
    player_tags: &TagCollection,
    zone_id: &str,
    rng: &mut R,
) -> Result<Option<&'a Quest>, AdventureError> {
    for step in &quest.next_steps {
        let next = library.quest(&step.quest_id).ok_or_else(|| {
            AdventureError::Invariant(format!(
                "quest {} points at unknown step {}",
                quest.id, step.quest_id
            ))
        })?;
        if !check_requirements(next, player_tags, zone_id) {
            continue;
        }
        if roll_percent(rng, step.chance) {
            return Ok(Some(next));
        }
    }
    Ok(None)
}
