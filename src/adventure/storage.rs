use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use sled::IVec;

use crate::adventure::errors::AdventureError;
use crate::adventure::tags::{Tag, TagCollection, TagType};
use crate::adventure::types::{
    AdventureRecord, PlayerRecord, ADVENTURE_SCHEMA_VERSION, PLAYER_SCHEMA_VERSION,
};

const TREE_PRIMARY: &str = "idlequest";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct AdventureStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl AdventureStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Delete the database when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<AdventureStore, AdventureError> {
        AdventureStore::open_with_options(self.path, self.temporary)
    }
}

/// Sled-backed persistence for player ledgers and adventure records.
///
/// All writes go through a [`StoreTransaction`]; at most one may be open per
/// user at a time.
pub struct AdventureStore {
    db: sled::Db,
    primary: sled::Tree,
    in_flight: Mutex<HashSet<u64>>,
}

impl AdventureStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AdventureError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, AdventureError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new()
            .path(path_ref)
            .temporary(temporary)
            .open()?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        Ok(Self {
            db,
            primary,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    fn player_key(user_id: u64) -> Vec<u8> {
        format!("players:{}", user_id).into_bytes()
    }

    fn adventure_prefix(user_id: u64) -> Vec<u8> {
        format!("adventures:{}:", user_id).into_bytes()
    }

    fn adventure_key(user_id: u64, adventure_id: u64) -> Vec<u8> {
        // Zero padded so a prefix scan yields adventures in creation order.
        format!("adventures:{}:{:020}", user_id, adventure_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, AdventureError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, AdventureError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn decode_player(bytes: IVec) -> Result<PlayerRecord, AdventureError> {
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(AdventureError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn decode_adventure(bytes: IVec) -> Result<AdventureRecord, AdventureError> {
        let record: AdventureRecord = Self::deserialize(bytes)?;
        if record.schema_version != ADVENTURE_SCHEMA_VERSION {
            return Err(AdventureError::SchemaMismatch {
                entity: "adventure",
                expected: ADVENTURE_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Fetch a player record by id.
    pub fn get_player(&self, user_id: u64) -> Result<PlayerRecord, AdventureError> {
        let Some(bytes) = self.primary.get(Self::player_key(user_id))? else {
            return Err(AdventureError::NotFound(format!("player: {}", user_id)));
        };
        Self::decode_player(bytes)
    }

    /// Fetch one adventure record.
    pub fn get_adventure(
        &self,
        user_id: u64,
        adventure_id: u64,
    ) -> Result<AdventureRecord, AdventureError> {
        let Some(bytes) = self.primary.get(Self::adventure_key(user_id, adventure_id))? else {
            return Err(AdventureError::NotFound(format!(
                "adventure: {}/{}",
                user_id, adventure_id
            )));
        };
        Self::decode_adventure(bytes)
    }

    /// Every adventure the user has started, oldest first.
    pub fn list_adventures(&self, user_id: u64) -> Result<Vec<AdventureRecord>, AdventureError> {
        let mut records = Vec::new();
        for entry in self.primary.scan_prefix(Self::adventure_prefix(user_id)) {
            let (_, bytes) = entry?;
            records.push(Self::decode_adventure(bytes)?);
        }
        Ok(records)
    }

    /// List all player ids currently stored.
    pub fn list_player_ids(&self) -> Result<Vec<u64>, AdventureError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("players:").and_then(|s| s.parse().ok()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Open the unit of work for `user_id`. The player record is loaded (or
    /// created in memory for a new player) together with the current
    /// adventure. Fails with [`AdventureError::Busy`] while another unit of
    /// work for the same user is open.
    pub fn begin(&self, user_id: u64) -> Result<StoreTransaction<'_>, AdventureError> {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| AdventureError::Invariant("store lock poisoned".to_string()))?;
            if !in_flight.insert(user_id) {
                return Err(AdventureError::Busy(user_id));
            }
        }
        // From here on the guard releases the user on every exit path.
        let mut txn = StoreTransaction {
            store: self,
            user_id,
            player: PlayerRecord::new(user_id),
            adventure: None,
            superseded: Vec::new(),
            persisted: true,
            committed: false,
            dirty: false,
        };
        match self.get_player(user_id) {
            Ok(player) => txn.player = player,
            Err(AdventureError::NotFound(_)) => txn.persisted = false,
            Err(e) => return Err(e),
        }
        if let Some(adventure_id) = txn.player.current_adventure {
            txn.adventure = Some(self.get_adventure(user_id, adventure_id)?);
        }
        Ok(txn)
    }

    fn release(&self, user_id: u64) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&user_id);
        }
    }
}

/// Buffered writes for one user. Nothing reaches the database until
/// [`StoreTransaction::commit`]; dropping the transaction discards them.
pub struct StoreTransaction<'a> {
    store: &'a AdventureStore,
    user_id: u64,
    player: PlayerRecord,
    adventure: Option<AdventureRecord>,
    /// Adventures replaced during this unit of work, still to be written.
    superseded: Vec<AdventureRecord>,
    /// False for a player seen for the first time.
    persisted: bool,
    committed: bool,
    dirty: bool,
}

impl<'a> StoreTransaction<'a> {
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn player(&self) -> &PlayerRecord {
        &self.player
    }

    pub fn current_adventure(&self) -> Option<&AdventureRecord> {
        self.adventure.as_ref()
    }

    /// Append a new adventure record and make it the player's current one.
    /// The record it replaces is still written on commit.
    pub fn start_adventure(
        &mut self,
        zone_id: &str,
        now: i64,
    ) -> Result<&AdventureRecord, AdventureError> {
        let adventure_id = self.store.db.generate_id()?;
        self.player.current_adventure = Some(adventure_id);
        self.dirty = true;
        if let Some(previous) = self.adventure.take() {
            self.superseded.push(previous);
        }
        let record = AdventureRecord::new(adventure_id, self.user_id, zone_id, now);
        Ok(&*self.adventure.insert(record))
    }

    /// Move the current adventure's tick watermark.
    pub fn update_adventure(&mut self, last_updated: i64) -> Result<(), AdventureError> {
        let adventure = self.adventure.as_mut().ok_or_else(|| {
            AdventureError::NotFound(format!("current adventure for {}", self.user_id))
        })?;
        adventure.last_updated = last_updated;
        self.dirty = true;
        Ok(())
    }

    /// Apply one signed delta to the ledger. Removing from an absent tag or
    /// below zero fails without mutating; a result of zero deletes the entry.
    pub fn apply_tag_delta(&mut self, tag_type: TagType, tag: &str, delta: i64) -> bool {
        let applied = apply_delta(&mut self.player.tags, tag_type, tag, delta);
        if applied && delta != 0 {
            self.dirty = true;
        }
        applied
    }

    /// Apply every delta or none of them.
    pub fn apply_net_changes(&mut self, deltas: &[(Tag, i64)]) -> Result<(), AdventureError> {
        let mut tags = self.player.tags.clone();
        for (tag, delta) in deltas {
            if !apply_delta(&mut tags, tag.tag_type, &tag.id, *delta) {
                return Err(AdventureError::Invariant(format!(
                    "cannot apply {} {} to the ledger of user {}",
                    delta, tag, self.user_id
                )));
            }
        }
        self.player.tags = tags;
        self.dirty = true;
        Ok(())
    }

    /// Replace the held-open chain list.
    pub fn set_open_quests(&mut self, open_quests: Vec<String>) {
        self.player.open_quests = open_quests;
        self.dirty = true;
    }

    pub fn lock_quests<I, S>(&mut self, quest_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.player
            .locked_quests
            .extend(quest_ids.into_iter().map(Into::into));
        self.dirty = true;
    }

    /// Grant access to a zone. Returns false if it was already granted.
    pub fn add_zone_access(&mut self, zone_id: &str) -> bool {
        let added = self.player.zone_access.insert(zone_id.to_string());
        self.dirty |= added;
        added
    }

    /// Write the player and every touched adventure record in one batch.
    pub fn commit(mut self) -> Result<(), AdventureError> {
        if self.dirty || !self.persisted {
            let mut batch = sled::Batch::default();
            self.player.schema_version = PLAYER_SCHEMA_VERSION;
            self.player.touch();
            batch.insert(
                AdventureStore::player_key(self.user_id),
                AdventureStore::serialize(&self.player)?,
            );
            for adventure in self.superseded.iter().chain(self.adventure.iter()) {
                batch.insert(
                    AdventureStore::adventure_key(self.user_id, adventure.adventure_id),
                    AdventureStore::serialize(adventure)?,
                );
            }
            self.store.primary.apply_batch(batch)?;
            self.store.primary.flush()?;
            debug!("committed unit of work for user {}", self.user_id);
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.dirty {
            warn!(
                "rolling back uncommitted changes for user {}",
                self.user_id
            );
        }
        self.store.release(self.user_id);
    }
}

fn apply_delta(tags: &mut TagCollection, tag_type: TagType, tag: &str, delta: i64) -> bool {
    match delta {
        0 => true,
        d if d > 0 => tags.add_tag(tag_type, tag, d),
        d => tags.remove_tag(tag_type, tag, -d),
    }
}
