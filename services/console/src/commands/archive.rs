//! Archive and incident report commands

use anyhow::Result;
use common::database::{DatabaseConfig, health_check, init_pool, setup_schema};
use runs::RunArchive;
use tracing::info;

use crate::app::App;
use crate::cli::{ArchiveCommands, Identity};
use crate::commands::run_log::ensure_visible;

async fn open_archive() -> Result<RunArchive> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    health_check(&pool).await?;
    setup_schema(&pool).await?;
    Ok(RunArchive::new(pool))
}

pub async fn execute(app: &App, identity: &Identity, command: ArchiveCommands) -> Result<()> {
    let session = app.sign_in_active(identity)?;
    let archive = open_archive().await?;
    run(app, &archive, &session, command).await
}

async fn run(app: &App, archive: &RunArchive, session: &auth::Session, command: ArchiveCommands) -> Result<()> {
    match command {
        ArchiveCommands::Sync => {
            let added = archive.sync(&app.runs.list_runs()?).await?;
            info!("{} synced the archive", session.username);
            println!("Archived {added} new run(s)");
        }

        ArchiveCommands::List => {
            let policy = app.policy()?;
            let runs = archive.list().await?;
            let visible = policy.filter_visible(&session.username, &runs);
            if visible.is_empty() {
                println!("No archived runs to show");
            }
            for run in visible {
                let marker = if run.locked { " [report filed]" } else { "" };
                println!("{:>5}  {:<12} {:<20} {}{}", run.id, run.run_number, run.timestamp, run.nature, marker);
            }
        }

        ArchiveCommands::Incident { run_id, text } => {
            let run = archive.find(run_id).await?;
            ensure_visible(&app.policy()?, session, &run)?;
            archive.save_incident_report(run_id, &text).await?;
            println!("Incident report saved for run {}", run.run_number);
        }

        ArchiveCommands::ShowIncident { run_id } => {
            let run = archive.find(run_id).await?;
            ensure_visible(&app.policy()?, session, &run)?;

            println!("Run Number: {}", run.run_number);
            println!("Caller: {}", run.caller);
            println!("Location: {}", run.location);
            println!("Nature: {}", run.nature);
            println!("Assigned Units: {}", run.assigned);
            println!("Timestamp: {}", run.timestamp);
            println!();
            println!("Run Notes:");
            println!("{}", run.notes);

            let statuses = archive.statuses(run_id).await?;
            if !statuses.is_empty() {
                println!();
                println!("Responder Statuses:");
                for status in statuses {
                    println!("{}: {} at {}", status.unit, status.status, status.timestamp);
                }
            }

            let addendums = archive.addendums(run_id).await?;
            if !addendums.is_empty() {
                println!();
                println!("Addendums:");
                for addendum in addendums {
                    println!("{addendum}");
                }
            }

            println!();
            match archive.incident_report(run_id).await? {
                Some(report) => {
                    println!("Incident Report:");
                    println!("{report}");
                }
                None => println!("No incident report filed"),
            }
        }
    }
    Ok(())
}
