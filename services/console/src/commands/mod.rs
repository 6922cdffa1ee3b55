//! Command handlers

pub mod archive;
pub mod run_log;
pub mod shifts;
pub mod users;

use anyhow::Result;

use crate::app::App;
use crate::cli::{Cli, Commands};
use crate::weather;

/// Route the parsed command to its handler
pub async fn execute(cli: Cli, app: &App) -> Result<()> {
    let identity = &cli.identity;
    match cli.command {
        Commands::Login => users::login(app, identity),
        Commands::User(command) => users::user(app, identity, command),
        Commands::Admin(command) => users::admin(app, identity, command),
        Commands::Run(command) => run_log::execute(app, identity, command),
        Commands::Shift(command) => shifts::shift(app, identity, command),
        Commands::Roster(command) => shifts::roster(app, identity, command),
        Commands::Archive(command) => archive::execute(app, identity, command).await,
        Commands::Weather => {
            println!("{}", weather::report(&app.settings.weather_url).await);
            Ok(())
        }
    }
}
