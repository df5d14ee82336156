//! Test utilities & fixtures shared by the integration tests.

use std::path::{Path, PathBuf};

use idlequest::adventure::{ContentLibrary, ItemRecord, Quest, Tag, ZoneRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The sample content shipped in `data/`.
#[allow(dead_code)]
pub fn shipped_content_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[allow(dead_code)]
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Write a content directory (items.json, zones.json, zones/<file>) into
/// `root`. Quest files are given as `(file name, json)` pairs.
#[allow(dead_code)]
pub fn write_content(root: &Path, items: &str, zones: &str, quest_files: &[(&str, &str)]) {
    std::fs::create_dir_all(root.join("zones")).expect("zones dir");
    std::fs::write(root.join("items.json"), items).expect("items.json");
    std::fs::write(root.join("zones.json"), zones).expect("zones.json");
    for (name, json) in quest_files {
        std::fs::write(root.join("zones").join(name), json).expect("quest file");
    }
}

/// Small forest world used by the engine and game tests.
///
/// - `gather` (root, every tick): 1 stick
/// - `camp` (root, once, hold open) -> `unlock_shed` (needs and consumes a key)
/// - `craft_torch` (root, every tick): consumes 3 sticks, needs no torch
/// - `explore` (root, once) -> `find_cave`: grants the cave zone
#[allow(dead_code)]
pub fn forest_library() -> ContentLibrary {
    ContentLibrary::builder()
        .item(ItemRecord::new("stick"))
        .item(ItemRecord::new("key"))
        .item(ItemRecord::new("torch"))
        .item(ItemRecord::new("axe"))
        .zone(ZoneRecord::new("forest").public())
        .zone(ZoneRecord::new("cave"))
        .quest(
            Quest::new("gather", "forest")
                .with_frequency(0.0)
                .merged()
                .with_reward(Tag::item("stick"), (1, 1), 100.0),
        )
        .quest(
            Quest::new("camp", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .held_open()
                .with_next_step("unlock_shed", 100.0),
        )
        .quest(
            Quest::new("unlock_shed", "forest")
                .with_requirement(Tag::item("key"), 1, true)
                .with_reward(Tag::item("axe"), (1, 1), 100.0),
        )
        .quest(
            Quest::new("craft_torch", "forest")
                .with_frequency(0.0)
                .with_requirement(Tag::item("stick"), 3, true)
                .with_requirement(Tag::item("torch"), 0, false)
                .with_reward(Tag::item("torch"), (1, 1), 100.0),
        )
        .quest(
            Quest::new("explore", "forest")
                .with_frequency(0.0)
                .not_repeatable()
                .with_next_step("find_cave", 100.0),
        )
        .quest(Quest::new("find_cave", "forest").with_reward(Tag::zone("cave"), (1, 1), 100.0))
        .build()
        .expect("forest library")
}
