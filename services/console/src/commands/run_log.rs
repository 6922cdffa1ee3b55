//! Run log commands

use anyhow::{Result, bail};
use auth::{AccessPolicy, AuthError, Session};
use runs::store::now_timestamp;
use runs::{NewRun, RunRecord, UnitStatus, export, search};

use crate::app::App;
use crate::cli::{Identity, RunCommands};

pub fn execute(app: &App, identity: &Identity, command: RunCommands) -> Result<()> {
    let session = app.sign_in_active(identity)?;

    match command {
        RunCommands::Add {
            number,
            caller,
            location,
            nature,
            assigned,
            notes,
            statuses,
        } => {
            let statuses = parse_statuses(&statuses)?;
            let run = app.runs.append_run(NewRun {
                run_number: number,
                caller,
                location,
                nature,
                assigned,
                notes,
                timestamp: None,
                statuses,
            })?;
            println!("Logged run {} at {}", run.run_number, run.timestamp);
        }

        RunCommands::List { search: query } => {
            let policy = app.policy()?;
            let all = app.runs.list_runs()?;
            let visible = policy.filter_visible(&session.username, &all);
            let found = search::search(visible, query.as_deref().unwrap_or_default());

            if found.is_empty() {
                println!("No runs to show");
            }
            for run in found {
                println!(
                    "{:<12} {:<20} {:<20} {:<24} {}",
                    run.run_number, run.timestamp, run.nature, run.location, run.assigned
                );
            }
        }

        RunCommands::Show { number } => {
            let run = visible_run(app, &session, &number)?;
            print!("{run}");
        }

        RunCommands::Addendum { number, text } => {
            visible_run(app, &session, &number)?;
            let entry = app.runs.append_addendum(&number, &session.username, &text)?;
            println!("Added: {entry}");
        }

        RunCommands::Export { number, dir } => {
            let run = visible_run(app, &session, &number)?;
            let path = export::export_to_dir(&run, &dir)?;
            println!("Run exported to {}", path.display());
        }
    }
    Ok(())
}

/// Find a run and check the session may view it
pub fn visible_run(app: &App, session: &Session, number: &str) -> Result<RunRecord> {
    let run = app.runs.find_run(number)?;
    ensure_visible(&app.policy()?, session, &run)?;
    Ok(run)
}

pub fn ensure_visible<R: auth::Assignment>(policy: &AccessPolicy, session: &Session, run: &R) -> Result<()> {
    if policy.can_view(&session.username, run) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(format!("{} is not assigned to this run", session.username)).into())
    }
}

/// `UNIT=STATUS` pairs stamped with the current time
pub fn parse_statuses(values: &[String]) -> Result<Vec<UnitStatus>> {
    let timestamp = now_timestamp();
    values
        .iter()
        .map(|value| {
            let Some((unit, status)) = value.split_once('=') else {
                bail!("status '{value}' must look like UNIT=STATUS");
            };
            let (unit, status) = (unit.trim(), status.trim());
            if unit.is_empty() || status.is_empty() {
                bail!("status '{value}' must look like UNIT=STATUS");
            }
            Ok(UnitStatus::new(unit.to_uppercase(), status.to_uppercase(), timestamp.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{fixture, identity};

    fn add(app: &App, number: &str, assigned: &str) {
        execute(
            app,
            &identity("alex", "pw"),
            RunCommands::Add {
                number: number.to_string(),
                caller: "Gate".to_string(),
                location: "Dock".to_string(),
                nature: "Fall".to_string(),
                assigned: assigned.to_string(),
                notes: "Call Received".to_string(),
                statuses: vec!["41=enroute".to_string()],
            },
        )
        .unwrap();
    }

    #[test]
    fn test_parse_statuses() {
        let statuses = parse_statuses(&["e1 = on scene".to_string()]).unwrap();
        assert_eq!(statuses[0].unit, "E1");
        assert_eq!(statuses[0].status, "ON SCENE");
        assert!(parse_statuses(&["E1".to_string()]).is_err());
        assert!(parse_statuses(&["=ON".to_string()]).is_err());
    }

    #[test]
    fn test_responder_only_reaches_assigned_runs() {
        let (_dir, app) = fixture();
        add(&app, "1", "41, E1");
        add(&app, "2", "E1");

        let chris = app.sign_in(&identity("chris", "pw")).unwrap();
        assert!(visible_run(&app, &chris, "1").is_ok());
        assert!(visible_run(&app, &chris, "2").is_err());

        let blocked = execute(
            &app,
            &identity("chris", "pw"),
            RunCommands::Addendum {
                number: "2".to_string(),
                text: "should not land".to_string(),
            },
        );
        assert!(blocked.is_err());
        assert!(app.runs.find_run("2").unwrap().addendums.is_empty());

        let owner = app.sign_in(&identity("Dakota", "boss")).unwrap();
        assert!(visible_run(&app, &owner, "2").is_ok());
    }

    #[test]
    fn test_addendum_records_author() {
        let (_dir, app) = fixture();
        add(&app, "5", "41");
        execute(
            &app,
            &identity("chris", "pw"),
            RunCommands::Addendum {
                number: "5".to_string(),
                text: "patient released".to_string(),
            },
        )
        .unwrap();
        let run = app.runs.find_run("5").unwrap();
        assert!(run.addendums[0].ends_with("chris: patient released"));
    }
}
