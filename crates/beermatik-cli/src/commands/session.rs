use std::io::Read;
use std::path::PathBuf;

use clap::Subcommand;

use super::{App, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Reset counters and entries; size and notification preference stay
    New,
    /// Print a full session snapshot as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore a snapshot from a file, or from stdin with "-"
    Import { file: PathBuf },
    /// Delete every persisted value
    Clear,
}

pub async fn run(action: SessionAction) -> CliResult {
    let app = App::init().await?;

    match action {
        SessionAction::New => {
            app.store.start_new_session().await;
            app.scheduler.stop().await;
            println!("{{\"type\": \"session_reset\"}}");
        }
        SessionAction::Export { out } => {
            let snapshot = app.store.export().await;
            match out {
                Some(path) => {
                    std::fs::write(&path, &snapshot)?;
                    let receipt = serde_json::json!({
                        "type": "exported",
                        "path": path.display().to_string(),
                    });
                    println!("{receipt}");
                }
                None => println!("{snapshot}"),
            }
        }
        SessionAction::Import { file } => {
            let data = if file.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)?
            };
            if !app.store.import(&data).await {
                return Err("import failed: malformed or incomplete snapshot".into());
            }
            // Reconcile the imported schedule the same way app start does.
            app.scheduler.start().await;
            println!("{}", serde_json::to_string_pretty(&app.status_json())?);
        }
        SessionAction::Clear => {
            app.scheduler.stop().await;
            app.store.clear_all_data().await;
            println!("{{\"type\": \"data_cleared\"}}");
        }
    }
    Ok(())
}
