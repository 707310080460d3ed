//! Demo binary for the streak-aggregation engine.
//!
//! Seeds an in-memory store with a few habits and completions, starts the
//! engine, records one more completion through it and prints the ranked
//! streak view.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::info;

use habit_streaks::{
    CompletionEvent, DuplicatePolicy, EngineConfig, Frequency, Habit, HabitStore, InMemoryStore,
    StreakEngine, UserId,
};

/// Command line arguments for the habit-streaks demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debounce window for the change reactor, in milliseconds
    #[arg(long, default_value_t = 250)]
    debounce_ms: u64,

    /// Credit multiple completions per day instead of rejecting them
    #[arg(long)]
    allow_duplicates: bool,

    /// Print the full ranked view as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habit_streaks={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    seed_demo_data(store.as_ref(), &user_id).await?;

    let config = EngineConfig {
        debounce: Duration::from_millis(args.debounce_ms),
        duplicate_policy: if args.allow_duplicates {
            DuplicatePolicy::AllowMultiple
        } else {
            DuplicatePolicy::RejectSameDay
        },
    };

    let engine =
        StreakEngine::start(store.clone() as Arc<dyn HabitStore>, user_id, config).await?;

    // Record one completion through the engine and let the reactor pick up
    // the resulting mutations.
    let target = engine
        .ranked_habits()
        .last()
        .map(|entry| (entry.habit.id.clone(), entry.habit.title.clone()));
    if let Some((habit_id, title)) = target {
        let outcome = engine.record_completion(&habit_id).await?;
        info!(habit = %title, ?outcome, "recorded completion");
    }
    tokio::time::sleep(Duration::from_millis(args.debounce_ms * 2 + 50)).await;

    let view = engine.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("🏅 Top streaks");
        for (position, entry) in view.leaderboard().iter().enumerate() {
            println!(
                "  {}. {}: current {} (best {}, total {})",
                position + 1,
                entry.habit.title,
                entry.streak.current,
                entry.streak.best,
                entry.streak.total
            );
        }
        println!();
        println!("All habits");
        for entry in &view.ranked {
            println!(
                "  🔥 {:<16} current {:>3} | 🏆 best {:>3} | ✅ total {:>3}",
                entry.habit.title, entry.streak.current, entry.streak.best, entry.streak.total
            );
        }
    }

    engine.shutdown().await;
    Ok(())
}

/// Seed a handful of habits with completion histories of varying strength
async fn seed_demo_data(
    store: &InMemoryStore,
    user_id: &UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    let seeds: [(&str, Frequency, &[i64]); 3] = [
        ("Morning run", Frequency::Daily, &[1, 2, 3]),
        ("Read 20 pages", Frequency::Daily, &[1, 3, 4, 5]),
        ("Call a friend", Frequency::Weekly, &[2]),
    ];

    for (title, frequency, days_ago) in seeds {
        let habit = Habit::new(user_id.clone(), title.to_string(), None, frequency)?;
        store.create_habit(&habit).await?;
        for offset in days_ago {
            let at = Utc::now() - chrono::Duration::days(*offset);
            store
                .append_completion(&CompletionEvent::new(habit.id.clone(), user_id.clone(), at))
                .await?;
        }
    }

    Ok(())
}
