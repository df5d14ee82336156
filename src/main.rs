//! Binary entrypoint for the idlequest CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `validate` - load the content directory and print what it holds
//! - `quests` - print every root quest and the chains reachable from it
//! - `start --user <id> --zone <zone>` - start adventuring in a zone
//! - `update --user <id>` - catch up the current adventure and print the report
//! - `inventory --user <id>` - catch up, then list the player's tags
//! - `give --user <id> --item <item> --quantity <n>` - grant or remove items
//!
//! See the library crate docs for module‑level details: `idlequest::`.
use std::collections::HashSet;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use idlequest::adventure::{
    load_content, xp_to_level, AdventureReport, AdventureStep, ContentLibrary, Game, Quest, Tag,
    TagCollection, TagType,
};
use idlequest::config::Config;

#[derive(Parser)]
#[command(name = "idlequest")]
#[command(about = "Offline-progress adventure engine for idle games")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Load and check the content directory
    Validate,
    /// Print root quests and their chains
    Quests,
    /// Start adventuring in a zone
    Start {
        #[arg(short, long)]
        user: u64,
        #[arg(short, long)]
        zone: String,
    },
    /// Catch up the current adventure
    Update {
        #[arg(short, long)]
        user: u64,
    },
    /// Show a player's items, skills and zones
    Inventory {
        #[arg(short, long)]
        user: u64,
    },
    /// Give (or with a negative quantity, take) items
    Give {
        #[arg(short, long)]
        user: u64,
        #[arg(short, long)]
        item: String,
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        println!("Wrote default configuration to {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    config.validate()?;
    init_logging(&Some(config.clone()), cli.verbose);
    info!("idlequest v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Init => {} // handled above
        Commands::Validate => {
            let content = load_content(&config.game.content_dir)?;
            println!(
                "{}: {} items, {} zones, {} quests ({} root)",
                config.game.content_dir,
                content.items().count(),
                content.zones().count(),
                content.quest_count(),
                content.root_quests().count()
            );
        }
        Commands::Quests => {
            let content = load_content(&config.game.content_dir)?;
            for root in content.root_quests() {
                print_chain(&content, root, 0, &mut HashSet::new());
            }
        }
        Commands::Start { user, zone } => {
            let game = Game::open(&config)?;
            let started = game.start_adventure(user, &zone, now())?;
            if let Some(report) = &started.previous {
                print_report(game.content(), report);
            }
            let zone_name = game
                .content()
                .zone(&zone)
                .map(|z| z.name.clone())
                .unwrap_or(zone);
            println!("User {} is adventuring in {}.", user, zone_name);
        }
        Commands::Update { user } => {
            let game = Game::open(&config)?;
            match game.update_adventure(user, now())? {
                Some(report) => print_report(game.content(), &report),
                None => println!("User {} is not on an adventure.", user),
            }
        }
        Commands::Inventory { user } => {
            let game = Game::open(&config)?;
            if let Some(report) = game.update_adventure(user, now())? {
                print_report(game.content(), &report);
            }
            print_inventory(game.content(), &game.player_tags(user)?);
            println!("Zones: {}", game.zone_access(user)?.join(", "));
        }
        Commands::Give {
            user,
            item,
            quantity,
        } => {
            let game = Game::open(&config)?;
            let Some(record) = game.content().item(&item) else {
                anyhow::bail!("unknown item: {}", item);
            };
            let name = record.display_name(quantity.abs()).to_string();
            if game.give(user, &Tag::item(&item), quantity)? {
                println!("User {} now has {} more {}.", user, quantity, name);
            } else {
                println!("User {} does not have {} {}.", user, -quantity, name);
            }
        }
    }

    Ok(())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn print_chain(content: &ContentLibrary, quest: &Quest, depth: usize, seen: &mut HashSet<String>) {
    let mut flags = Vec::new();
    if let Some(frequency) = quest.frequency {
        flags.push(format!("every {}m", frequency));
    }
    if !quest.repeatable {
        flags.push("once".to_string());
    }
    if quest.merge {
        flags.push("merge".to_string());
    }
    if quest.hold_open {
        flags.push("hold open".to_string());
    }
    let suffix = if flags.is_empty() {
        String::new()
    } else {
        format!(" ({})", flags.join(", "))
    };
    println!("{}{} [{}]{}", "  ".repeat(depth), quest.id, quest.zone_id, suffix);

    if !seen.insert(quest.id.clone()) {
        return;
    }
    for step in &quest.next_steps {
        if let Some(next) = content.quest(&step.quest_id) {
            print_chain(content, next, depth + 1, seen);
        }
    }
    seen.remove(&quest.id);
}

fn print_report(content: &ContentLibrary, report: &AdventureReport) {
    if report.is_empty() {
        println!("Nothing happened in {} tick(s).", report.ticks);
    } else {
        for entry in report.merged_entries() {
            print_step(content, &entry);
        }
    }
    if report.ticks_remaining > 0 {
        println!("({} tick(s) still to catch up)", report.ticks_remaining);
    }
}

fn print_step(content: &ContentLibrary, step: &AdventureStep) {
    let prompt = content
        .quest(&step.quest_id)
        .and_then(|quest| quest.prompts.first())
        .map(String::as_str)
        .unwrap_or(step.quest_id.as_str());
    println!("{}", prompt);
    for (tag_type, tag, quantity) in step.tags_gained.iter() {
        println!("    +{}", describe(content, tag_type, tag, quantity));
    }
    for (tag_type, tag, quantity) in step.tags_lost.iter() {
        println!("    -{}", describe(content, tag_type, tag, quantity));
    }
}

fn describe(content: &ContentLibrary, tag_type: TagType, tag: &str, quantity: i64) -> String {
    match tag_type {
        TagType::Item => {
            let name = content
                .item(tag)
                .map(|item| item.display_name(quantity).to_string())
                .unwrap_or_else(|| tag.to_string());
            format!("{} {}", quantity, name)
        }
        TagType::Xp => format!("{} {} xp", quantity, tag),
        TagType::Zone => {
            let name = content
                .zone(tag)
                .map(|zone| zone.name.clone())
                .unwrap_or_else(|| tag.to_string());
            format!("access to {}", name)
        }
    }
}

fn print_inventory(content: &ContentLibrary, tags: &TagCollection) {
    println!("Inventory:");
    for (tag_type, tag, quantity) in tags.iter() {
        match tag_type {
            TagType::Item => println!("    {}", describe(content, tag_type, tag, quantity)),
            TagType::Xp => println!(
                "    {}: level {} ({} xp)",
                tag,
                xp_to_level(quantity),
                quantity
            ),
            TagType::Zone => {}
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config.as_ref().and_then(|cfg| cfg.logging.file.as_ref());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

            // Echo to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stderr);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
            let _ = builder.try_init();
            return;
        }
    }
    builder.format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
