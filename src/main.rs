//! Timer Deck - categorised countdown timers driven by a shared clock
//!
//! This is the main entry point for the timer-deck application.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use timer_deck::{
    config::{Command, Config},
    services::SnapshotStore,
    state::{format_hms, TimerEngine, TimerEvent, TimerId},
    tasks::{spawn_clock, spawn_persistence_writer},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_deck={}", config.log_level()))
        .init();

    info!("Starting timer-deck v1.0.0 with state file {}", config.state_file.display());

    let store = SnapshotStore::new(&config.state_file);
    let snapshot = store.load_or_default().await;
    let (persistence, writer) = spawn_persistence_writer(store);
    let engine = Arc::new(TimerEngine::new(snapshot, persistence));

    match config.command.clone() {
        Command::Run => run(Arc::clone(&engine)).await,
        command => execute(&engine, command)?,
    }

    // Dropping the engine closes the persistence queue so the writer can flush and exit
    drop(engine);
    if let Err(e) = writer.await {
        warn!("Persistence writer ended abnormally: {}", e);
    }

    Ok(())
}

/// Tick timers and log events until a shutdown signal arrives
async fn run(engine: Arc<TimerEngine>) {
    let mut events = engine.subscribe_events();
    let clock = spawn_clock(Arc::clone(&engine));
    info!("Clock running, press Ctrl-C to stop");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} timer events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    clock.stop().await;
    info!("Shutdown complete");
}

fn log_event(event: &TimerEvent) {
    match event {
        TimerEvent::Halfway { name, .. } => info!("{} is at 50%", name),
        TimerEvent::Completed { record, .. } => {
            info!(
                "{} ({}) finished after {}",
                record.name,
                record.category,
                format_hms(record.duration_seconds)
            )
        }
        other => tracing::debug!("{:?}", other),
    }
}

/// Apply a one-shot command and print its result
fn execute(engine: &TimerEngine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run => {}
        Command::Add { name, duration, category } => {
            let timer = engine.add_timer(&name, duration, &category)?;
            println!("Added timer {} '{}' in {}", timer.id, timer.name, timer.category);
        }
        Command::Start { id } => {
            let state = engine.start_timer(TimerId(id))?;
            println!("Timer {} is {}", id, state.status);
        }
        Command::Pause { id } => {
            let state = engine.pause_timer(TimerId(id))?;
            println!("Timer {} is {}", id, state.status);
        }
        Command::Reset { id } => match engine.reset_timer(TimerId(id))? {
            Some(state) => {
                println!("Timer {} reset to {}", id, format_hms(state.time_left_seconds))
            }
            None => println!("No timer {}", id),
        },
        Command::Complete { id } => match engine.complete_timer(TimerId(id))? {
            Some(record) => println!("Completed '{}' at {}", record.name, record.completed_at),
            None => println!("Timer {} was already completed", id),
        },
        Command::StartAll { category } => {
            let matched = engine.start_all_category_timers(&category)?;
            println!("Started {} timers in {}", matched, category);
        }
        Command::PauseAll { category } => {
            let matched = engine.pause_all_category_timers(&category)?;
            println!("Paused {} timers in {}", matched, category);
        }
        Command::ResumeAll { category } => {
            let matched = engine.resume_all_category_timers(&category)?;
            println!("Resumed {} timers in {}", matched, category);
        }
        Command::ResetAll { category } => {
            let matched = engine.reset_all_category_timers(&category)?;
            println!("Reset {} timers in {}", matched, category);
        }
        Command::List => {
            let states = engine.runtime_states()?;
            for (category, timers) in engine.timers_by_category()? {
                println!("{} ({})", category, timers.len());
                for timer in timers {
                    if let Some(state) = states.get(&timer.id) {
                        println!(
                            "  [{}] {:<20} {} {:>3.0}% {}",
                            timer.id,
                            timer.name,
                            format_hms(state.time_left_seconds),
                            state.progress(timer.duration_seconds) * 100.0,
                            state.status
                        );
                    }
                }
            }
        }
        Command::History => {
            for record in engine.history()? {
                println!(
                    "{}  {:<20} {:<12} {}",
                    record.completed_at.format("%Y-%m-%d %H:%M:%S"),
                    record.name,
                    record.category,
                    format_hms(record.duration_seconds)
                );
            }
        }
        Command::Clear => {
            engine.clear_all()?;
            println!("All timers removed");
        }
    }
    Ok(())
}
