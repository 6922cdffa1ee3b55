//! Command line definition

use clap::{Args, Parser, Subcommand};
use shift::Shift;
use std::path::PathBuf;

/// Dispatch console: run log, shift log and account administration
#[derive(Parser, Debug)]
#[command(name = "dispatch")]
#[command(about = "Dispatch console for the shared run and shift logs", long_about = None)]
pub struct Cli {
    /// Settings file (TOML); DISPATCH_* environment variables still apply
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub identity: Identity,

    #[command(subcommand)]
    pub command: Commands,
}

/// Who the command acts for
#[derive(Args, Debug, Clone, Default)]
pub struct Identity {
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    #[arg(long, short = 'p', global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check credentials and show the resolved role
    Login,

    /// User account management
    #[command(subcommand)]
    User(UserCommands),

    /// Admin list management
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Run log
    #[command(subcommand)]
    Run(RunCommands),

    /// Shift log and typing indicator
    #[command(subcommand)]
    Shift(ShiftCommands),

    /// Responder roster
    #[command(subcommand)]
    Roster(RosterCommands),

    /// SQLite archive and incident reports
    #[command(subcommand)]
    Archive(ArchiveCommands),

    /// Fetch the weather page as plain text
    Weather,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user with an admin-issued temporary password
    Add {
        username: String,
        #[arg(long)]
        temp_password: String,
        #[arg(long, default_value = "")]
        first: String,
        #[arg(long, default_value = "")]
        last: String,
        #[arg(long, default_value = "")]
        identifier: String,
        /// Set the admin flag column (owner only)
        #[arg(long)]
        admin: bool,
        /// Do not require a password change at first login
        #[arg(long)]
        permanent: bool,
    },

    /// Change your own password, or issue a temporary one to another user
    Passwd {
        username: Option<String>,
        #[arg(long)]
        new_password: String,
    },

    /// Edit a user's profile; omitted fields are kept
    Edit {
        username: String,
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        #[arg(long)]
        identifier: Option<String>,
        /// Issue a new temporary password
        #[arg(long)]
        temp_password: Option<String>,
    },

    /// Delete a user
    Delete { username: String },

    /// List users
    List,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Grant admin (owner only)
    Promote { username: String },

    /// Revoke admin (owner only)
    Demote { username: String },

    /// List admins other than the owner
    List,
}

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Log a new run
    Add {
        #[arg(long)]
        number: String,
        #[arg(long, default_value = "")]
        caller: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        nature: String,
        /// Comma-separated responder and apparatus codes
        #[arg(long, default_value = "")]
        assigned: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Unit status as UNIT=STATUS, repeatable
        #[arg(long = "status")]
        statuses: Vec<String>,
    },

    /// List runs you may view
    List {
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one run
    Show { number: String },

    /// Append an addendum to a run
    Addendum { number: String, text: String },

    /// Export a run to CSV
    Export {
        number: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ShiftArg {
    /// Shift A-D (SHIFT_A style also accepted)
    #[arg(long, short = 's', default_value = "A", value_parser = parse_shift)]
    pub shift: Shift,
}

#[derive(Subcommand, Debug)]
pub enum ShiftCommands {
    /// Post a note to today's shift log
    Note {
        #[command(flatten)]
        shift: ShiftArg,
        message: String,
    },

    /// Print today's shift log
    Read {
        #[command(flatten)]
        shift: ShiftArg,
    },

    /// End the shift and archive its log
    Archive {
        #[command(flatten)]
        shift: ShiftArg,
    },

    /// Post a needs-attention line
    Attention {
        #[command(flatten)]
        shift: ShiftArg,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        responders: Option<String>,
    },

    /// Set your typing flag
    Typing {
        #[command(flatten)]
        shift: ShiftArg,
        /// Clear the flag instead of setting it
        #[arg(long)]
        stop: bool,
    },

    /// Show who is typing
    Who {
        #[command(flatten)]
        shift: ShiftArg,
    },

    /// List archived shift summaries
    Summaries {
        #[arg(default_value = "")]
        query: String,
    },

    /// Print an archived shift summary
    ShowSummary { name: String },
}

#[derive(Subcommand, Debug)]
pub enum RosterCommands {
    /// List responders, optionally for one shift
    List {
        #[arg(long, short = 's', value_parser = parse_shift)]
        shift: Option<Shift>,
    },

    /// Add a responder to a shift
    Add {
        #[arg(value_parser = parse_shift)]
        shift: Shift,
        code: String,
        name: String,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Edit a responder, optionally renaming the code or moving shifts
    Edit {
        #[arg(value_parser = parse_shift)]
        shift: Shift,
        code: String,
        #[arg(long)]
        new_code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Move the responder to this shift
        #[arg(long, value_parser = parse_shift)]
        move_to: Option<Shift>,
    },

    /// Remove a responder from a shift
    Remove {
        #[arg(value_parser = parse_shift)]
        shift: Shift,
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ArchiveCommands {
    /// Mirror the run log into the archive
    Sync,

    /// List archived runs you may view, newest first
    List,

    /// Attach an incident report to an archived run (once)
    Incident { run_id: i64, text: String },

    /// Show an archived run with its incident report
    ShowIncident { run_id: i64 },
}

fn parse_shift(value: &str) -> Result<Shift, String> {
    value.parse().map_err(|e: shift::ShiftError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_flags_are_global() {
        let cli = Cli::try_parse_from([
            "dispatch", "run", "show", "2025-014", "--user", "alex", "--password", "pw",
        ])
        .unwrap();
        assert_eq!(cli.identity.user.as_deref(), Some("alex"));
        assert!(matches!(cli.command, Commands::Run(RunCommands::Show { ref number }) if number == "2025-014"));
    }

    #[test]
    fn test_shift_argument_forms() {
        let cli = Cli::try_parse_from(["dispatch", "shift", "read", "--shift", "SHIFT_c"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shift(ShiftCommands::Read { shift: ShiftArg { shift: Shift::C } })
        ));

        let cli = Cli::try_parse_from(["dispatch", "shift", "who"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shift(ShiftCommands::Who { shift: ShiftArg { shift: Shift::A } })
        ));

        assert!(Cli::try_parse_from(["dispatch", "shift", "read", "-s", "E"]).is_err());
    }

    #[test]
    fn test_repeated_statuses() {
        let cli = Cli::try_parse_from([
            "dispatch", "run", "add", "--number", "7", "--status", "41=ENROUTE", "--status", "E1=ON SCENE",
        ])
        .unwrap();
        let Commands::Run(RunCommands::Add { statuses, .. }) = cli.command else {
            panic!("expected run add");
        };
        assert_eq!(statuses, vec!["41=ENROUTE", "E1=ON SCENE"]);
    }

    #[test]
    fn test_roster_edit_options() {
        let cli = Cli::try_parse_from([
            "dispatch", "roster", "edit", "A", "42", "--new-code", "B7", "--move-to", "shift_b",
        ])
        .unwrap();
        let Commands::Roster(RosterCommands::Edit {
            shift,
            code,
            new_code,
            name,
            move_to,
            ..
        }) = cli.command
        else {
            panic!("expected roster edit");
        };
        assert_eq!(shift, Shift::A);
        assert_eq!(code, "42");
        assert_eq!(new_code.as_deref(), Some("B7"));
        assert_eq!(name, None);
        assert_eq!(move_to, Some(Shift::B));
    }
}
