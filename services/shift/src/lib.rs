//! Shift-side state of the dispatch console
//!
//! Daily shift logs with end-of-shift summaries, the typing indicator shared
//! between workstations, and the per-shift responder roster.

pub mod error;
pub mod presence;
pub mod roster;
pub mod shift;
pub mod shift_log;

pub use error::{ShiftError, ShiftResult};
pub use presence::{PresenceTracker, TypingState, typing_label};
pub use roster::{Responder, Roster, RosterRepository};
pub use shift::Shift;
pub use shift_log::ShiftLog;
