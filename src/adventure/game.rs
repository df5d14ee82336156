//! Game service: runs catch-up simulations for players and persists their
//! outcome through one unit of work per call.

use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adventure::content::{load_content, ContentLibrary};
use crate::adventure::engine::{process_adventure, AdventureState};
use crate::adventure::errors::AdventureError;
use crate::adventure::report::AdventureReport;
use crate::adventure::storage::{AdventureStore, StoreTransaction};
use crate::adventure::tags::{Tag, TagCollection};
use crate::adventure::types::{AdventureRecord, PlayerRecord};
use crate::config::{Config, GameConfig};

/// Outcome of starting an adventure.
#[derive(Debug, Clone)]
pub struct StartedAdventure {
    /// Catch-up of the adventure that was running before, if any.
    pub previous: Option<AdventureReport>,
    pub adventure: AdventureRecord,
}

pub struct Game {
    config: GameConfig,
    content: Arc<ContentLibrary>,
    store: AdventureStore,
}

impl Game {
    pub fn new(config: GameConfig, content: Arc<ContentLibrary>, store: AdventureStore) -> Self {
        Self {
            config,
            content,
            store,
        }
    }

    /// Load content and open the store named by `config`.
    pub fn open(config: &Config) -> Result<Self, AdventureError> {
        let content = load_content(&config.game.content_dir)?;
        let store = AdventureStore::open(&config.storage.data_dir)?;
        Ok(Self::new(config.game.clone(), Arc::new(content), store))
    }

    pub fn content(&self) -> &ContentLibrary {
        &self.content
    }

    pub fn store(&self) -> &AdventureStore {
        &self.store
    }

    /// Start adventuring in `zone_id` using OS entropy.
    pub fn start_adventure(
        &self,
        user_id: u64,
        zone_id: &str,
        now: i64,
    ) -> Result<StartedAdventure, AdventureError> {
        self.start_adventure_with_rng(user_id, zone_id, now, &mut StdRng::from_entropy())
    }

    /// Catch up the running adventure in full, ignoring the per-call tick
    /// budget, then start a new one in `zone_id`. Open chains that belong
    /// to another zone are dropped.
    pub fn start_adventure_with_rng<R: Rng>(
        &self,
        user_id: u64,
        zone_id: &str,
        now: i64,
        rng: &mut R,
    ) -> Result<StartedAdventure, AdventureError> {
        let zone = self
            .content
            .zone(zone_id)
            .ok_or_else(|| AdventureError::NotFound(format!("zone: {}", zone_id)))?;

        let mut txn = self.store.begin(user_id)?;
        let previous = self.catch_up_fully(&mut txn, now, rng)?;
        if !zone.public && !txn.player().zone_access.contains(zone_id) {
            // The catch-up stands even though the move is refused.
            if previous.is_some() {
                txn.commit()?;
            }
            return Err(AdventureError::ZoneLocked(zone_id.to_string()));
        }

        let open_quests = txn.player().open_quests.clone();
        let (kept, dropped): (Vec<String>, Vec<String>) =
            open_quests.into_iter().partition(|quest_id| {
                self.content
                    .quest(quest_id)
                    .map(|quest| quest.zone_id == zone_id)
                    .unwrap_or(false)
            });
        if !dropped.is_empty() {
            info!(
                "user {} left {} open chain(s) behind: {}",
                user_id,
                dropped.len(),
                dropped.join(", ")
            );
            txn.set_open_quests(kept);
        }

        let adventure = txn.start_adventure(zone_id, now)?.clone();
        txn.commit()?;
        info!(
            "user {} started adventure {} in {}",
            user_id, adventure.adventure_id, zone_id
        );
        Ok(StartedAdventure {
            previous,
            adventure,
        })
    }

    /// Catch up the current adventure using OS entropy.
    pub fn update_adventure(
        &self,
        user_id: u64,
        now: i64,
    ) -> Result<Option<AdventureReport>, AdventureError> {
        self.update_adventure_with_rng(user_id, now, &mut StdRng::from_entropy())
    }

    /// Catch up the current adventure to `now` and persist the result.
    /// Returns `None` when the player has never started an adventure.
    pub fn update_adventure_with_rng<R: Rng>(
        &self,
        user_id: u64,
        now: i64,
        rng: &mut R,
    ) -> Result<Option<AdventureReport>, AdventureError> {
        let mut txn = self.store.begin(user_id)?;
        let report = self.catch_up(&mut txn, now, rng)?;
        if report.is_some() {
            txn.commit()?;
        }
        Ok(report)
    }

    /// Run the engine for the open transaction's current adventure and
    /// stage every resulting write on the transaction.
    fn catch_up<R: Rng>(
        &self,
        txn: &mut StoreTransaction<'_>,
        now: i64,
        rng: &mut R,
    ) -> Result<Option<AdventureReport>, AdventureError> {
        let Some(adventure) = txn.current_adventure() else {
            return Ok(None);
        };
        let player = txn.player();
        let mut state = AdventureState {
            tags: player.tags.clone(),
            zone_id: adventure.zone_id.clone(),
            locked_quests: player.locked_quests.clone(),
            open_quests: player.open_quests.clone(),
            last_updated: adventure.last_updated,
        };

        let settings = self.config.tick_settings();
        let report = process_adventure(&self.content, &mut state, now, &settings, rng)?;
        if report.ticks == 0 {
            return Ok(Some(report));
        }

        txn.update_adventure(state.last_updated)?;
        txn.apply_net_changes(&report.net_changes())?;
        txn.set_open_quests(state.open_quests);
        txn.lock_quests(report.newly_locked.iter().cloned());
        for zone_id in report.discovered_zones() {
            if txn.add_zone_access(&zone_id) {
                debug!("user {} discovered zone {}", txn.user_id(), zone_id);
            }
        }

        info!(
            "user {} caught up {} tick(s) in {}: {} step(s), {} tick(s) still due",
            txn.user_id(),
            report.ticks,
            state.zone_id,
            report.steps().count(),
            report.ticks_remaining
        );
        Ok(Some(report))
    }

    /// Repeat [`Game::catch_up`] on the same transaction until no ticks are
    /// left due, folding the reports into one.
    fn catch_up_fully<R: Rng>(
        &self,
        txn: &mut StoreTransaction<'_>,
        now: i64,
        rng: &mut R,
    ) -> Result<Option<AdventureReport>, AdventureError> {
        let Some(mut report) = self.catch_up(txn, now, rng)? else {
            return Ok(None);
        };
        while report.ticks_remaining > 0 {
            match self.catch_up(txn, now, rng)? {
                Some(next) if next.ticks > 0 => report.append(next),
                _ => break,
            }
        }
        Ok(Some(report))
    }

    /// Stored player record, or a fresh one for an unknown user.
    pub fn player(&self, user_id: u64) -> Result<PlayerRecord, AdventureError> {
        match self.store.get_player(user_id) {
            Ok(player) => Ok(player),
            Err(AdventureError::NotFound(_)) => Ok(PlayerRecord::new(user_id)),
            Err(e) => Err(e),
        }
    }

    pub fn player_tags(&self, user_id: u64) -> Result<TagCollection, AdventureError> {
        Ok(self.player(user_id)?.tags)
    }

    /// Zones the player may adventure in: every public zone plus those granted.
    pub fn zone_access(&self, user_id: u64) -> Result<Vec<String>, AdventureError> {
        let player = self.player(user_id)?;
        Ok(self
            .content
            .zones()
            .filter(|zone| zone.public || player.zone_access.contains(&zone.id))
            .map(|zone| zone.id.clone())
            .collect())
    }

    /// Administrative grant (or removal, for a negative quantity). Returns
    /// false without writing when the ledger cannot cover a removal.
    pub fn give(&self, user_id: u64, tag: &Tag, quantity: i64) -> Result<bool, AdventureError> {
        let mut txn = self.store.begin(user_id)?;
        if !txn.apply_tag_delta(tag.tag_type, &tag.id, quantity) {
            return Ok(false);
        }
        txn.commit()?;
        info!("gave {} {} to user {}", quantity, tag, user_id);
        Ok(true)
    }
}
