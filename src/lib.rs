//! # Idlequest - Offline Progress Engine for Idle Games
//!
//! Idlequest works out what a player's character did while the player was
//! away. Elapsed wall-clock time is replayed as discrete ticks; on each tick
//! quest chains start at random, branch through a directed quest graph, and
//! add or consume tagged resources (items, skill experience, zone access).
//! The result is a structured report plus an updated player ledger.
//!
//! ## Features
//!
//! - **Catch-up Simulation**: Any amount of elapsed time is processed tick by tick, with a per-call tick budget.
//! - **Quest Graph**: Root quests with frequencies, weighted next steps, requirements, consumption and held-open chains.
//! - **Tag Ledger**: One signed-quantity model for items, experience and zones.
//! - **Reports**: Per-chain step groups with merged display entries and net ledger deltas.
//! - **Persistence**: Sled-backed player records with one unit of work per user at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idlequest::adventure::Game;
//! use idlequest::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!
//!     let game = Game::open(&config)?;
//!     let now = chrono::Utc::now().timestamp();
//!     game.start_adventure(1, "forest", now)?;
//!     if let Some(report) = game.update_adventure(1, now + 3600)? {
//!         println!("{} steps", report.steps().count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`adventure`] - Tags, content loading, quest resolution, the tick engine, reports and storage
//! - [`config`] - Configuration management and validation

pub mod adventure;
pub mod config;
