//! CLI `remind` command: keep the daily reminder armed until Ctrl-C.

use anyhow::Result;
use chrono::Local;

use moodlog::config::MoodlogConfig;
use moodlog::reminder::{
    Notifier, PollingFeed, Prompt, RemoteReminderSource, ReminderScheduler, SystemClock,
    TimerState,
};

use super::connect;

/// Rings the terminal bell and prints the prompt.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, prompt: &Prompt) {
        println!("\x07");
        println!("{}", prompt.title);
        println!("  {}", prompt.body);
        println!();
    }
}

pub async fn remind(config: &MoodlogConfig, test: bool) -> Result<()> {
    let prompt = Prompt::from(&config.reminders);
    if test {
        TerminalNotifier.notify(&prompt);
        return Ok(());
    }

    let (_, api) = connect(config)?;
    let feed = PollingFeed::new(
        RemoteReminderSource::new(api),
        config.reminders.poll_interval(),
    );
    let handle = ReminderScheduler::new(SystemClock, TerminalNotifier, prompt)
        .with_timing(config.reminders.grace(), config.reminders.tolerance())
        .spawn(feed);

    println!("Reminder running. Press Ctrl-C to stop.");
    let mut states = handle.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                match state {
                    TimerState::Disarmed => println!("Reminder is off."),
                    TimerState::Armed { fire_at } => println!(
                        "Next reminder: {}",
                        fire_at.with_timezone(&Local).format("%a %b %e, %H:%M")
                    ),
                }
            }
        }
    }

    handle.stop().await;
    println!("Reminder stopped.");
    Ok(())
}
