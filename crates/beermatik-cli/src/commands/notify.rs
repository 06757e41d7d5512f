use clap::Subcommand;

use super::{App, CliResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Enable beer reminders
    On,
    /// Disable beer reminders
    Off,
    /// Schedule a test notification a couple of seconds out
    Test,
    /// Print the reminder schedule state as JSON
    Stats,
}

pub async fn run(action: NotifyAction) -> CliResult {
    let app = App::init().await?;

    match action {
        NotifyAction::On => {
            if !app.scheduler.set_enabled(true).await {
                return Err("notification permission denied".into());
            }
            println!("{{\"notificationsEnabled\": true}}");
        }
        NotifyAction::Off => {
            app.scheduler.set_enabled(false).await;
            println!("{{\"notificationsEnabled\": false}}");
        }
        NotifyAction::Test => {
            app.scheduler.send_test().await;
            println!("{{\"type\": \"test_scheduled\"}}");
        }
        NotifyAction::Stats => {
            println!("{}", serde_json::to_string_pretty(&app.scheduler.stats())?);
        }
    }
    Ok(())
}
