//! Poll Readiness Flags

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Readiness reported by a poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Readiness(u8);

impl Readiness {
    /// At least one sample can be read
    pub const READABLE: Readiness = Readiness(0x01);
    /// The oldest unread sample crossed the threshold
    pub const ALERT: Readiness = Readiness(0x02);

    /// No readiness
    pub const fn empty() -> Self {
        Readiness(0)
    }

    /// True if no flag is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set
    pub const fn contains(&self, other: Readiness) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_readable(&self) -> bool {
        self.contains(Self::READABLE)
    }

    pub const fn is_alert(&self) -> bool {
        self.contains(Self::ALERT)
    }

    /// Raw bits (READABLE = 0x01, ALERT = 0x02)
    pub const fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for Readiness {
    type Output = Readiness;

    fn bitor(self, rhs: Self) -> Self::Output {
        Readiness(self.0 | rhs.0)
    }
}

impl BitOrAssign for Readiness {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_readable(), self.is_alert()) {
            (true, true) => f.write_str("READABLE|ALERT"),
            (true, false) => f.write_str("READABLE"),
            (false, true) => f.write_str("ALERT"),
            (false, false) => f.write_str("-"),
        }
    }
}

/// Condition a readiness wait is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Any sample is available
    Readable,
    /// The oldest unread sample is an alert
    Alert,
}

impl Interest {
    /// True if `readiness` satisfies this interest
    pub fn is_satisfied_by(&self, readiness: Readiness) -> bool {
        match self {
            Interest::Readable => readiness.is_readable(),
            Interest::Alert => readiness.is_alert(),
        }
    }
}
