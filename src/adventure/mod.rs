//! Adventure engine: the tag ledger, the quest graph loaded from content
//! files, the tick simulation that replays offline time, and the sled store
//! that persists each player's progress.

pub mod content;
pub mod engine;
pub mod errors;
pub mod game;
pub mod quest;
pub mod report;
pub mod skills;
pub mod storage;
pub mod tags;
pub mod types;

pub use content::{
    load_content, load_items_from_json, load_quests_from_json, load_zones_from_json,
    ContentLibrary, ContentLibraryBuilder,
};
pub use engine::{process_adventure, ticks_due, AdventureState, TickSettings, MAX_CHAIN_STEPS};
pub use errors::AdventureError;
pub use game::{Game, StartedAdventure};
pub use quest::{
    check_requirements, choose_next_step, complete_quest, consumed_tags, roll_rewards,
    CompletedQuest,
};
pub use report::{AdventureGroup, AdventureReport, AdventureStep};
pub use skills::{level_to_xp, xp_to_level};
pub use storage::{AdventureStore, AdventureStoreBuilder, StoreTransaction};
pub use tags::{Inventory, Tag, TagCollection, TagType};
pub use types::*;
