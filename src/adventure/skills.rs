//! Skill level curve. Levels only appear in content (`level` requirements);
//! the ledger always stores raw experience.

pub fn level_to_xp(level: i64) -> i64 {
    level * level * 10
}

pub fn xp_to_level(xp: i64) -> i64 {
    if xp <= 0 {
        return 0;
    }
    ((xp as f64) / 10.0).sqrt().floor() as i64
}
