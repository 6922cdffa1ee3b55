//! The four crews

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ShiftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
    C,
    D,
}

impl Shift {
    pub const ALL: [Shift; 4] = [Shift::A, Shift::B, Shift::C, Shift::D];

    pub fn letter(self) -> char {
        match self {
            Shift::A => 'A',
            Shift::B => 'B',
            Shift::C => 'C',
            Shift::D => 'D',
        }
    }

    /// Name used in file names and the typing-state document, e.g. `SHIFT_A`
    pub fn key(self) -> &'static str {
        match self {
            Shift::A => "SHIFT_A",
            Shift::B => "SHIFT_B",
            Shift::C => "SHIFT_C",
            Shift::D => "SHIFT_D",
        }
    }
}

impl FromStr for Shift {
    type Err = ShiftError;

    /// Accepts `a`, `A`, `shift_a` or `SHIFT_A`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let letter = upper.strip_prefix("SHIFT_").unwrap_or(&upper);
        match letter {
            "A" => Ok(Shift::A),
            "B" => Ok(Shift::B),
            "C" => Ok(Shift::C),
            "D" => Ok(Shift::D),
            _ => Err(ShiftError::InvalidShift(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
