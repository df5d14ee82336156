//! Adventure tick engine.
//!
//! Replays the time a player was away as whole ticks of `tick_rate_secs`
//! seconds. Each tick has three phases:
//!
//! 1. Every chain held open on an earlier tick is retried, last opened
//!    first, against the ledger as the tick began.
//! 2. The continuations found in phase 1 are drained one chain at a time.
//! 3. Every unlocked root quest whose requirements pass against the ledger
//!    left by phase 2 draws for this tick; the roots that fire are then
//!    drained in content order. Anything their rewards unlock waits for the
//!    next tick.
//!
//! A chain is drained with an explicit stack: the step is completed, its
//! rewards and consumption are applied to the ledger, and the next step is
//! chosen against the updated ledger. A continuation or root whose
//! requirements were spent by an earlier chain in the same tick is skipped
//! (a continuation goes back on the open list). A chain that reaches
//! [`MAX_CHAIN_STEPS`] is parked on the open list and resumes next tick.
//!
//! The engine performs no IO and keeps no state between calls. Everything it
//! mutates lives in the caller-owned [`AdventureState`]; on error the caller
//! must discard that state instead of persisting it.

use log::{debug, trace, warn};
use rand::Rng;
use std::collections::BTreeSet;

use crate::adventure::content::ContentLibrary;
use crate::adventure::errors::AdventureError;
use crate::adventure::quest::{check_requirements, choose_next_step, complete_quest};
use crate::adventure::report::{AdventureGroup, AdventureReport, AdventureStep};
use crate::adventure::tags::TagCollection;
use crate::adventure::types::Quest;

/// Steps one chain may take within one tick. The rest of a longer chain
/// runs on later ticks.
pub const MAX_CHAIN_STEPS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    /// Seconds of wall-clock time represented by one tick.
    pub tick_rate_secs: u64,
    /// Ticks processed per call at most; the rest stay due for the next call.
    pub max_ticks: Option<u64>,
}

impl TickSettings {
    pub fn new(tick_rate_secs: u64) -> Self {
        Self {
            tick_rate_secs,
            max_ticks: None,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }
}

/// Per-player state the engine reads and mutates for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdventureState {
    pub tags: TagCollection,
    pub zone_id: String,
    pub locked_quests: BTreeSet<String>,
    /// Held-open chain ids in registration order.
    pub open_quests: Vec<String>,
    /// Tick watermark in epoch seconds.
    pub last_updated: i64,
}

impl AdventureState {
    pub fn new(zone_id: &str, last_updated: i64) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            last_updated,
            ..Self::default()
        }
    }

    fn hold_open(&mut self, quest_id: &str) {
        if !self.open_quests.iter().any(|id| id == quest_id) {
            self.open_quests.push(quest_id.to_string());
        }
    }
}

/// Whole ticks elapsed between `last_updated` and `now`.
pub fn ticks_due(last_updated: i64, now: i64, tick_rate_secs: u64) -> u64 {
    if tick_rate_secs == 0 || now <= last_updated {
        return 0;
    }
    (now - last_updated) as u64 / tick_rate_secs
}

/// How many times a root quest starts this tick. The whole part of the
/// per-tick rate always fires; the fractional part is one uniform draw.
fn root_fire_count<R: Rng>(frequency_minutes: f64, tick_rate_secs: u64, rng: &mut R) -> u64 {
    let frequency_ticks = frequency_minutes * 60.0 / tick_rate_secs as f64;
    let threshold = if frequency_ticks > 0.0 {
        1.0 / frequency_ticks
    } else {
        1.0
    };
    let whole = threshold.floor();
    let fraction = threshold - whole;
    let extra = u64::from(rng.gen::<f64>() < fraction);
    whole as u64 + extra
}

/// Catch the adventure up to `now`.
///
/// The watermark advances by whole processed ticks only, so the sub-tick
/// remainder (and any ticks beyond `settings.max_ticks`) is carried to the
/// next call.
pub fn process_adventure<R: Rng>(
    library: &ContentLibrary,
    state: &mut AdventureState,
    now: i64,
    settings: &TickSettings,
    rng: &mut R,
) -> Result<AdventureReport, AdventureError> {
    if settings.tick_rate_secs == 0 {
        return Err(AdventureError::Invariant(
            "tick rate must be at least one second".to_string(),
        ));
    }
    let due = ticks_due(state.last_updated, now, settings.tick_rate_secs);
    let ticks = match settings.max_ticks {
        Some(limit) if limit > 0 => due.min(limit),
        _ => due,
    };
    let start_time = state.last_updated;

    let mut report = AdventureReport {
        start_time,
        end_time: start_time,
        ticks,
        ticks_remaining: due - ticks,
        ..AdventureReport::default()
    };
    if ticks == 0 {
        report.open_quests = state.open_quests.clone();
        return Ok(report);
    }

    let advanced_secs = i64::try_from(ticks.saturating_mul(settings.tick_rate_secs))
        .map_err(|_| AdventureError::Invariant(format!("{} ticks overflow the watermark", ticks)))?;
    state.last_updated += advanced_secs;
    report.end_time = state.last_updated;

    for tick in 0..ticks {
        let advanced = advance_open_chains(library, state, tick, rng)?;
        for (origin, next) in advanced {
            if !check_requirements(next, &state.tags, &state.zone_id) {
                trace!(
                    "tick {}: {} no longer affordable, {} stays open",
                    tick, next.id, origin
                );
                state.hold_open(&origin);
                continue;
            }
            let group = run_chain(library, state, next, tick, rng)?;
            report.groups.push(group);
        }
        start_root_quests(library, state, settings, tick, &mut report, rng)?;
    }

    report.open_quests = state.open_quests.clone();
    debug!(
        "processed {} ticks in {}: {} chains, {} open, {} newly locked",
        ticks,
        state.zone_id,
        report.groups.len(),
        report.open_quests.len(),
        report.newly_locked.len()
    );
    Ok(report)
}

/// Retry every open chain, last opened first, and take the advanced ones off
/// the open list. Returns `(open quest, continuation)` pairs in retry order.
fn advance_open_chains<'a, R: Rng>(
    library: &'a ContentLibrary,
    state: &mut AdventureState,
    tick: u64,
    rng: &mut R,
) -> Result<Vec<(String, &'a Quest)>, AdventureError> {
    let mut advanced = Vec::new();
    for quest_id in state.open_quests.iter().rev() {
        let quest = library.quest(quest_id).ok_or_else(|| {
            AdventureError::Invariant(format!("open chain references unknown quest {}", quest_id))
        })?;
        if let Some(next) = choose_next_step(library, quest, &state.tags, &state.zone_id, rng)? {
            trace!("tick {}: open chain {} advanced to {}", tick, quest_id, next.id);
            advanced.push((quest_id.clone(), next));
        }
    }
    state
        .open_quests
        .retain(|id| !advanced.iter().any(|(origin, _)| origin == id));
    Ok(advanced)
}

/// Draw for every eligible root, then drain the roots that fired in
/// content order.
fn start_root_quests<R: Rng>(
    library: &ContentLibrary,
    state: &mut AdventureState,
    settings: &TickSettings,
    tick: u64,
    report: &mut AdventureReport,
    rng: &mut R,
) -> Result<(), AdventureError> {
    let mut fired: Vec<(&Quest, u64)> = Vec::new();
    for root in library.root_quests() {
        if state.locked_quests.contains(&root.id) {
            continue;
        }
        if !check_requirements(root, &state.tags, &state.zone_id) {
            continue;
        }
        let frequency = root.frequency.unwrap_or(0.0);
        let fires = root_fire_count(frequency, settings.tick_rate_secs, rng);
        let fires = if root.repeatable { fires } else { fires.min(1) };
        if fires > 0 {
            fired.push((root, fires));
        }
    }

    for (root, fires) in fired {
        for _ in 0..fires {
            if !check_requirements(root, &state.tags, &state.zone_id) {
                trace!("tick {}: root quest {} no longer affordable", tick, root.id);
                break;
            }
            trace!("tick {}: root quest {} fired", tick, root.id);
            if !root.repeatable {
                state.locked_quests.insert(root.id.clone());
                report.newly_locked.push(root.id.clone());
            }
            let group = run_chain(library, state, root, tick, rng)?;
            report.groups.push(group);
        }
    }
    Ok(())
}

/// Drain one chain depth-first with an explicit stack.
fn run_chain<R: Rng>(
    library: &ContentLibrary,
    state: &mut AdventureState,
    start: &Quest,
    tick: u64,
    rng: &mut R,
) -> Result<AdventureGroup, AdventureError> {
    let mut group = AdventureGroup {
        tick,
        steps: Vec::new(),
    };
    let mut stack: Vec<&Quest> = vec![start];
    while let Some(quest) = stack.pop() {
        if group.steps.len() >= MAX_CHAIN_STEPS {
            if let Some(parked) = group.steps.last().map(|step| step.quest_id.clone()) {
                warn!(
                    "tick {}: chain from {} reached {} steps, parking it at {}",
                    tick, start.id, MAX_CHAIN_STEPS, parked
                );
                state.hold_open(&parked);
            }
            break;
        }
        if quest.zone_id != state.zone_id {
            return Err(AdventureError::Invariant(format!(
                "quest {} belongs to zone {} but the player is in {}",
                quest.id, quest.zone_id, state.zone_id
            )));
        }

        let completed = complete_quest(quest, rng);
        state.tags.merge(&completed.tags_gained);
        if !state.tags.subtract(&completed.tags_lost) {
            return Err(AdventureError::Invariant(format!(
                "ledger cannot pay for quest {} after its requirements passed",
                quest.id
            )));
        }
        group.steps.push(AdventureStep {
            quest_id: quest.id.clone(),
            merge: quest.merge,
            tags_gained: completed.tags_gained,
            tags_lost: completed.tags_lost,
        });

        match choose_next_step(library, quest, &state.tags, &state.zone_id, rng)? {
            Some(next) => stack.push(next),
            None if quest.hold_open => state.hold_open(&quest.id),
            None => {}
        }
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventure::tags::{Tag, TagType};
    use crate::adventure::types::{ItemRecord, ZoneRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TICK: u64 = 60;

    fn forest_library(quests: Vec<Quest>) -> ContentLibrary {
        let mut builder = ContentLibrary::builder()
            .item(ItemRecord::new("stick"))
            .item(ItemRecord::new("key"))
            .item(ItemRecord::new("log"))
            .zone(ZoneRecord::new("forest"))
            .zone(ZoneRecord::new("cave"));
        for quest in quests {
            builder = builder.quest(quest);
        }
        builder.build().expect("library")
    }

    #[test]
    fn ticks_due_floors_and_ignores_clock_skew() {
        assert_eq!(ticks_due(0, 59, 60), 0);
        assert_eq!(ticks_due(0, 179, 60), 2);
        assert_eq!(ticks_due(100, 50, 60), 0);
        assert_eq!(ticks_due(0, 100, 0), 0);
    }

    #[test]
    fn fire_count_handles_fast_and_zero_frequencies() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(root_fire_count(0.0, 60, &mut rng), 1);
        assert_eq!(root_fire_count(1.0, 60, &mut rng), 1);
        // Two occurrences per tick.
        assert_eq!(root_fire_count(0.5, 60, &mut rng), 2);
    }

    #[test]
    fn no_elapsed_ticks_leaves_state_untouched() {
        let library = forest_library(vec![Quest::new("r", "forest").with_frequency(0.0)]);
        let mut state = AdventureState::new("forest", 1_000);
        let before = state.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let report =
            process_adventure(&library, &mut state, 1_059, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.ticks, 0);
        assert!(report.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn watermark_discards_sub_tick_remainder() {
        let library = forest_library(vec![]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let report =
            process_adventure(&library, &mut state, 150, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.ticks, 2);
        assert_eq!(state.last_updated, 120);
        assert_eq!(report.end_time, 120);
    }

    #[test]
    fn zero_frequency_root_fires_every_tick() {
        let library = forest_library(vec![Quest::new("gather", "forest")
            .with_frequency(0.0)
            .with_reward(Tag::item("stick"), (1, 1), 100.0)]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(11);
        let report =
            process_adventure(&library, &mut state, 10 * 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.ticks, 10);
        assert_eq!(report.groups.len(), 10);
        assert_eq!(state.tags.quantity(TagType::Item, "stick"), 10);
    }

    #[test]
    fn non_repeatable_root_locks_on_fire() {
        let library = forest_library(vec![Quest::new("once", "forest")
            .with_frequency(0.0)
            .not_repeatable()]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(5);
        let report =
            process_adventure(&library, &mut state, 5 * 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.steps().count(), 1);
        assert_eq!(report.newly_locked, vec!["once"]);
        assert!(state.locked_quests.contains("once"));
    }

    #[test]
    fn chains_follow_next_steps_within_a_tick() {
        let library = forest_library(vec![
            Quest::new("find_tree", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .with_next_step("chop_tree", 100.0),
            Quest::new("chop_tree", "forest").with_reward(Tag::item("log"), (3, 3), 100.0),
        ]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(5);
        let report =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].group_id(), "find_tree,chop_tree");
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 3);
    }

    #[test]
    fn consumption_is_applied_to_the_ledger() {
        let library = forest_library(vec![Quest::new("burn", "forest")
            .with_frequency(0.0)
            .with_requirement(Tag::item("log"), 2, true)
            .with_reward(Tag::xp("firemaking"), (5, 5), 100.0)]);
        let mut state = AdventureState::new("forest", 0);
        state.tags.add_tag(TagType::Item, "log", 5);
        let mut rng = StdRng::seed_from_u64(2);
        let report =
            process_adventure(&library, &mut state, 3 * 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        // Third tick has only one log left.
        assert_eq!(report.steps().count(), 2);
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 1);
        assert_eq!(state.tags.quantity(TagType::Xp, "firemaking"), 10);
    }

    #[test]
    fn roots_unlocked_by_rewards_wait_for_the_next_tick() {
        let library = forest_library(vec![
            Quest::new("find_key", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .with_reward(Tag::item("key"), (1, 1), 100.0),
            Quest::new("open_chest", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .with_requirement(Tag::item("key"), 1, true)
                .with_reward(Tag::item("stick"), (1, 1), 100.0),
        ]);
        let settings = TickSettings::new(TICK);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(4);

        let report = process_adventure(&library, &mut state, 60, &settings, &mut rng).unwrap();
        assert_eq!(report.newly_locked, vec!["find_key"]);
        assert_eq!(state.tags.quantity(TagType::Item, "key"), 1);
        assert_eq!(state.tags.quantity(TagType::Item, "stick"), 0);

        let report = process_adventure(&library, &mut state, 120, &settings, &mut rng).unwrap();
        assert_eq!(report.newly_locked, vec!["open_chest"]);
        assert_eq!(report.groups[0].tick, 0);
        assert_eq!(state.tags.quantity(TagType::Item, "key"), 0);
        assert_eq!(state.tags.quantity(TagType::Item, "stick"), 1);
    }

    #[test]
    fn fired_root_is_skipped_when_an_earlier_root_spent_its_requirement() {
        let library = forest_library(vec![
            Quest::new("burn_a", "forest")
                .with_frequency(0.0)
                .with_requirement(Tag::item("log"), 1, true),
            Quest::new("burn_b", "forest")
                .with_frequency(0.0)
                .with_requirement(Tag::item("log"), 1, true),
        ]);
        let mut state = AdventureState::new("forest", 0);
        state.tags.add_tag(TagType::Item, "log", 1);
        let mut rng = StdRng::seed_from_u64(6);
        let report =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        let ids: Vec<String> = report.groups.iter().map(|g| g.group_id()).collect();
        assert_eq!(ids, vec!["burn_a"]);
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 0);
    }

    #[test]
    fn hold_open_chain_survives_failed_ticks() {
        let library = forest_library(vec![
            Quest::new("camp", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .held_open()
                .with_next_step("unlock_door", 100.0),
            Quest::new("unlock_door", "forest")
                .with_requirement(Tag::item("key"), 1, true)
                .with_reward(Tag::item("log"), (1, 1), 100.0),
        ]);
        let settings = TickSettings::new(TICK);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(8);

        for tick in 1..=3 {
            let report =
                process_adventure(&library, &mut state, tick * 60, &settings, &mut rng).unwrap();
            assert_eq!(report.ticks, 1);
            assert_eq!(state.open_quests, vec!["camp"]);
            assert_eq!(report.open_quests, vec!["camp"]);
        }

        state.tags.add_tag(TagType::Item, "key", 1);
        let report = process_adventure(&library, &mut state, 4 * 60, &settings, &mut rng).unwrap();
        assert!(state.open_quests.is_empty());
        assert_eq!(report.groups[0].group_id(), "unlock_door");
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 1);
        assert_eq!(state.tags.quantity(TagType::Item, "key"), 0);
    }

    #[test]
    fn open_chains_retry_last_opened_first() {
        let library = forest_library(vec![
            Quest::new("first", "forest")
                .held_open()
                .with_next_step("first_done", 100.0),
            Quest::new("second", "forest")
                .held_open()
                .with_next_step("second_done", 100.0),
            Quest::new("first_done", "forest"),
            Quest::new("second_done", "forest"),
        ]);
        let mut state = AdventureState::new("forest", 0);
        state.open_quests = vec!["first".to_string(), "second".to_string()];
        let mut rng = StdRng::seed_from_u64(8);
        let report =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        let ids: Vec<String> = report.groups.iter().map(|g| g.group_id()).collect();
        assert_eq!(ids, vec!["second_done", "first_done"]);
        assert!(state.open_quests.is_empty());
    }

    #[test]
    fn tick_budget_leaves_remainder_for_next_call() {
        let library = forest_library(vec![Quest::new("gather", "forest")
            .with_frequency(0.0)
            .with_reward(Tag::item("stick"), (1, 1), 100.0)]);
        let settings = TickSettings::new(TICK).with_max_ticks(4);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(9);

        let report = process_adventure(&library, &mut state, 10 * 60, &settings, &mut rng).unwrap();
        assert_eq!(report.ticks, 4);
        assert_eq!(report.ticks_remaining, 6);
        assert_eq!(state.last_updated, 4 * 60);

        let report = process_adventure(&library, &mut state, 10 * 60, &settings, &mut rng).unwrap();
        assert_eq!(report.ticks, 4);
        assert_eq!(report.ticks_remaining, 2);

        let report = process_adventure(&library, &mut state, 10 * 60, &settings, &mut rng).unwrap();
        assert_eq!(report.ticks, 2);
        assert_eq!(report.ticks_remaining, 0);
        assert_eq!(state.tags.quantity(TagType::Item, "stick"), 10);
    }

    #[test]
    fn unknown_open_chain_is_an_invariant_error() {
        let library = forest_library(vec![]);
        let mut state = AdventureState::new("forest", 0);
        state.open_quests.push("vanished".to_string());
        let mut rng = StdRng::seed_from_u64(1);
        let result =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng);
        assert!(matches!(result, Err(AdventureError::Invariant(_))));
    }

    #[test]
    fn open_chains_choose_before_any_continuation_runs() {
        let library = forest_library(vec![
            Quest::new("first", "forest")
                .held_open()
                .with_next_step("first_done", 100.0),
            Quest::new("second", "forest")
                .held_open()
                .with_next_step("second_done", 100.0),
            Quest::new("first_done", "forest").with_requirement(Tag::item("key"), 1, false),
            Quest::new("second_done", "forest").with_reward(Tag::item("key"), (1, 1), 100.0),
        ]);
        let settings = TickSettings::new(TICK);
        let mut state = AdventureState::new("forest", 0);
        state.open_quests = vec!["first".to_string(), "second".to_string()];
        let mut rng = StdRng::seed_from_u64(8);

        let report = process_adventure(&library, &mut state, 60, &settings, &mut rng).unwrap();
        let ids: Vec<String> = report.groups.iter().map(|g| g.group_id()).collect();
        assert_eq!(ids, vec!["second_done"]);
        assert_eq!(state.open_quests, vec!["first"]);

        let report = process_adventure(&library, &mut state, 120, &settings, &mut rng).unwrap();
        assert_eq!(report.groups[0].group_id(), "first_done");
        assert!(state.open_quests.is_empty());
    }

    #[test]
    fn spent_continuation_goes_back_on_the_open_list() {
        let library = forest_library(vec![
            Quest::new("a", "forest").held_open().with_next_step("a_done", 100.0),
            Quest::new("b", "forest").held_open().with_next_step("b_done", 100.0),
            Quest::new("a_done", "forest").with_requirement(Tag::item("log"), 1, true),
            Quest::new("b_done", "forest").with_requirement(Tag::item("log"), 1, true),
        ]);
        let mut state = AdventureState::new("forest", 0);
        state.open_quests = vec!["a".to_string(), "b".to_string()];
        state.tags.add_tag(TagType::Item, "log", 1);
        let mut rng = StdRng::seed_from_u64(8);
        let report =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        let ids: Vec<String> = report.groups.iter().map(|g| g.group_id()).collect();
        assert_eq!(ids, vec!["b_done"]);
        assert_eq!(state.open_quests, vec!["a"]);
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 0);
    }

    #[test]
    fn certain_cycles_are_parked_at_the_step_limit() {
        let library = forest_library(vec![
            Quest::new("ping", "forest")
                .with_frequency(0.0)
                .with_next_step("pong", 100.0),
            Quest::new("pong", "forest").with_next_step("ping", 100.0),
        ]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let report =
            process_adventure(&library, &mut state, 60, &TickSettings::new(TICK), &mut rng)
                .unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].steps.len(), MAX_CHAIN_STEPS);
        assert_eq!(state.open_quests, vec!["pong"]);
    }

    #[test]
    fn long_consuming_chain_resumes_on_the_next_tick() {
        let library = forest_library(vec![
            Quest::new("start_fire", "forest")
                .with_frequency(0.0)
                .with_next_step("burn", 100.0),
            Quest::new("burn", "forest")
                .with_requirement(Tag::item("log"), 1, true)
                .with_next_step("burn", 100.0),
        ]);
        let settings = TickSettings::new(TICK);
        let mut state = AdventureState::new("forest", 0);
        state.tags.add_tag(TagType::Item, "log", 1_500);
        let mut rng = StdRng::seed_from_u64(1);

        let report = process_adventure(&library, &mut state, 60, &settings, &mut rng).unwrap();
        assert_eq!(report.ticks, 1);
        assert_eq!(report.steps().count(), MAX_CHAIN_STEPS);
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 501);
        assert_eq!(state.open_quests, vec!["burn"]);

        let report = process_adventure(&library, &mut state, 120, &settings, &mut rng).unwrap();
        // The parked chain burns the rest, then a fresh fire finds no logs.
        assert_eq!(report.groups[0].steps.len(), 501);
        assert_eq!(report.groups[1].group_id(), "start_fire");
        assert_eq!(state.tags.quantity(TagType::Item, "log"), 0);
        assert!(state.open_quests.is_empty());
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let library = forest_library(vec![]);
        let mut state = AdventureState::new("forest", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let result = process_adventure(&library, &mut state, 60, &TickSettings::new(0), &mut rng);
        assert!(result.is_err());
    }
}
