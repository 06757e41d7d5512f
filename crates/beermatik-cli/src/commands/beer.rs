use clap::Subcommand;

use beermatik_core::BeerSize;

use super::{App, CliResult};

#[derive(Subcommand)]
pub enum BeerAction {
    /// Log one beer and refresh the reminder
    Add {
        /// Serving size, e.g. 33cl (defaults to the selected size)
        #[arg(long)]
        size: Option<BeerSize>,
    },
    /// Set the size the next logged beer will use
    Size { size: BeerSize },
    /// Print the current session as JSON
    Status,
}

pub async fn run(action: BeerAction) -> CliResult {
    let app = App::init().await?;

    match action {
        BeerAction::Add { size } => {
            let size = size.unwrap_or_else(|| {
                app.store
                    .cached()
                    .map(|session| session.selected_size)
                    .unwrap_or_default()
            });
            app.store.append_entry(size).await;
            app.scheduler.on_entry_added().await;
            println!("{}", serde_json::to_string_pretty(&app.status_json())?);
        }
        BeerAction::Size { size } => {
            app.store.update_selected_size(size).await;
            println!("{{\"selectedSize\": \"{size}\"}}");
        }
        BeerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&app.status_json())?);
        }
    }
    Ok(())
}
