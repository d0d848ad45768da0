//! CLI `settings` and `safe-mode` commands.

use anyhow::{bail, Result};
use dialoguer::Password;

use moodlog::api::types::Settings;
use moodlog::api::JournalApi;
use moodlog::config::MoodlogConfig;
use moodlog::reminder::ReminderTime;

use super::{connect, on_off, spinner};

pub async fn show(config: &MoodlogConfig) -> Result<()> {
    let (_, api) = connect(config)?;
    let settings = api.settings().await?;
    print_settings(&settings);
    Ok(())
}

pub async fn set(
    config: &MoodlogConfig,
    reminder: Option<bool>,
    time: Option<String>,
    privacy: Option<bool>,
) -> Result<()> {
    if reminder.is_none() && time.is_none() && privacy.is_none() {
        bail!("nothing to change; pass --reminder, --time or --privacy");
    }
    // Validate before anything is sent.
    let time = time.map(|t| t.parse::<ReminderTime>()).transpose()?;

    let (_, api) = connect(config)?;
    let mut settings = api.settings().await?;
    if let Some(enabled) = reminder {
        settings.reminder_enabled = enabled;
    }
    if let Some(time) = time {
        settings.reminder_time = time.to_string();
    }
    if let Some(privacy) = privacy {
        settings.privacy_mode = privacy;
    }

    let pb = spinner("Saving settings...");
    let result = api.update_settings(&settings).await;
    pb.finish_and_clear();

    print_settings(&result?);
    println!();
    println!("Settings saved. A running `moodlog remind` picks them up within a minute.");
    Ok(())
}

pub async fn safe_mode(config: &MoodlogConfig, enable: bool) -> Result<()> {
    let (_, api) = connect(config)?;

    if !enable {
        let password = Password::new()
            .with_prompt("Password to turn off safe mode")
            .interact()?;
        let pb = spinner("Verifying...");
        let valid = api.verify_password(&password).await;
        pb.finish_and_clear();
        if !valid? {
            bail!("Incorrect password");
        }
    }

    let settings = api.set_safe_mode(enable).await?;
    println!("Safe mode is now {}.", on_off(settings.safe_mode));
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("Settings");
    println!("{}", "=".repeat(40));
    if settings.reminder_enabled {
        println!("  Daily reminder:      on at {}", settings.reminder_time);
    } else {
        println!("  Daily reminder:      off");
    }
    println!("  Privacy mode:        {}", on_off(settings.privacy_mode));
    println!("  Safe mode:           {}", on_off(settings.safe_mode));
}
