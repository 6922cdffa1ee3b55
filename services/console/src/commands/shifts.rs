//! Shift log and roster commands

use anyhow::Result;
use shift::shift_log::{list_summaries, read_summary};
use shift::{Responder, Shift, ShiftError};

use crate::app::App;
use crate::cli::{Identity, RosterCommands, ShiftCommands};

pub fn shift(app: &App, identity: &Identity, command: ShiftCommands) -> Result<()> {
    let session = app.sign_in_active(identity)?;

    match command {
        ShiftCommands::Note { shift, message } => {
            app.shift_log(shift.shift).post_note(&session.username, &message)?;
            app.presence(shift.shift, &session.username).set_typing(false)?;
        }

        ShiftCommands::Read { shift } => {
            let contents = app.shift_log(shift.shift).read_all()?;
            if contents.is_empty() {
                println!("Nothing logged for {} today", shift.shift);
            } else {
                print!("{contents}");
            }
        }

        ShiftCommands::Archive { shift } => {
            let path = app.shift_log(shift.shift).archive(&session.username)?;
            println!("Shift archived: {}", path.display());
        }

        ShiftCommands::Attention {
            shift,
            description,
            responders,
        } => {
            app.shift_log(shift.shift).mark_attention(
                &session.username,
                description.as_deref(),
                responders.as_deref(),
            )?;
        }

        ShiftCommands::Typing { shift, stop } => {
            app.presence(shift.shift, &session.username).set_typing(!stop)?;
        }

        ShiftCommands::Who { shift } => {
            println!("{}", app.presence(shift.shift, &session.username).label()?);
        }

        ShiftCommands::Summaries { query } => {
            let names = list_summaries(&app.settings.shift_log_path(), &query)?;
            if names.is_empty() {
                println!("No shift summaries found");
            }
            for name in names {
                println!("{name}");
            }
        }

        ShiftCommands::ShowSummary { name } => {
            print!("{}", read_summary(&app.settings.shift_log_path(), &name)?);
        }
    }
    Ok(())
}

pub fn roster(app: &App, identity: &Identity, command: RosterCommands) -> Result<()> {
    let session = app.sign_in_active(identity)?;

    match command {
        RosterCommands::List { shift } => {
            let roster = app.roster.load()?;
            let shifts = match shift {
                Some(shift) => vec![shift],
                None => Shift::ALL.to_vec(),
            };
            for shift in shifts {
                let responders = roster.responders(shift);
                let width = responders.iter().map(|r| r.code.len()).max().unwrap_or(2);
                println!("[{}]", shift.letter());
                for responder in responders {
                    println!("  {:<width$} - {}", responder.code, responder.name);
                }
            }
        }

        RosterCommands::Add {
            shift,
            code,
            name,
            status,
            phone,
            email,
        } => {
            session.require_admin()?;
            app.roster.add(
                shift,
                Responder {
                    code,
                    name,
                    status,
                    phone,
                    email,
                },
            )?;
            println!("Responder added to {shift}");
        }

        RosterCommands::Edit {
            shift,
            code,
            new_code,
            name,
            status,
            phone,
            email,
            move_to,
        } => {
            session.require_admin()?;
            let roster = app.roster.load()?;
            let Some(current) = roster.responders(shift).iter().find(|r| r.code == code.trim()) else {
                return Err(ShiftError::ResponderNotFound {
                    code: code.trim().to_string(),
                    shift: shift.to_string(),
                }
                .into());
            };

            let edited = Responder {
                code: new_code.unwrap_or_else(|| current.code.clone()),
                name: name.unwrap_or_else(|| current.name.clone()),
                status: status.unwrap_or_else(|| current.status.clone()),
                phone: phone.unwrap_or_else(|| current.phone.clone()),
                email: email.unwrap_or_else(|| current.email.clone()),
            };
            let target = move_to.unwrap_or(shift);
            app.roster.update(shift, &code, edited, target)?;
            println!("Responder {} updated ({})", code.trim(), target);
        }

        RosterCommands::Remove { shift, code } => {
            session.require_admin()?;
            let removed = app.roster.remove(shift, &code)?;
            println!("Removed {} - {} from {}", removed.code, removed.name, shift);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{fixture, identity};
    use crate::cli::ShiftArg;

    #[test]
    fn test_note_clears_typing_flag() {
        let (_dir, app) = fixture();
        let shift_a = ShiftArg { shift: Shift::A };
        shift(&app, &identity("chris", "pw"), ShiftCommands::Typing { shift: shift_a, stop: false }).unwrap();
        assert_eq!(app.presence(Shift::A, "alex").typists().unwrap(), vec!["chris"]);

        shift(
            &app,
            &identity("chris", "pw"),
            ShiftCommands::Note {
                shift: shift_a,
                message: "radio check".to_string(),
            },
        )
        .unwrap();
        assert!(app.presence(Shift::A, "alex").typists().unwrap().is_empty());
        assert_eq!(app.shift_log(Shift::A).read_all().unwrap(), "chris: radio check\n");
    }

    #[test]
    fn test_roster_changes_need_admin() {
        let (_dir, app) = fixture();
        let add = |user: &str, password: &str| {
            roster(
                &app,
                &identity(user, password),
                RosterCommands::Add {
                    shift: Shift::B,
                    code: "43".to_string(),
                    name: "Kelsey".to_string(),
                    status: String::new(),
                    phone: String::new(),
                    email: String::new(),
                },
            )
        };

        assert!(add("chris", "pw").is_err());
        add("alex", "pw").unwrap();
        assert_eq!(app.roster.load().unwrap().responders(Shift::B).len(), 1);
    }

    #[test]
    fn test_roster_edit_moves_responder() {
        let (_dir, app) = fixture();
        app.roster
            .add(
                Shift::A,
                Responder {
                    code: "42".to_string(),
                    name: "Kelsey".to_string(),
                    phone: "555-0142".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        let edit = |user: &str| {
            roster(
                &app,
                &identity(user, "pw"),
                RosterCommands::Edit {
                    shift: Shift::A,
                    code: "42".to_string(),
                    new_code: Some("B7".to_string()),
                    name: None,
                    status: Some("Active".to_string()),
                    phone: None,
                    email: None,
                    move_to: Some(Shift::C),
                },
            )
        };
        assert!(edit("chris").is_err());
        edit("alex").unwrap();

        let loaded = app.roster.load().unwrap();
        assert!(loaded.responders(Shift::A).is_empty());
        let moved = &loaded.responders(Shift::C)[0];
        assert_eq!(moved.code, "B7");
        assert_eq!(moved.name, "Kelsey");
        assert_eq!(moved.status, "Active");
        assert_eq!(moved.phone, "555-0142");
    }
}
