//! Typed resource quantities in Slurm notation.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const KIB_PER_MIB: u64 = 1024;
const KIB_PER_GIB: u64 = 1024 * KIB_PER_MIB;
const KIB_PER_TIB: u64 = 1024 * KIB_PER_GIB;

/// Memory ceiling, stored in KiB.
///
/// Accepts `300G`, `300GB`, `512M`, `1T`, `2048K`, or a bare number which
/// Slurm interprets as megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemorySize {
    kib: u64,
}

impl MemorySize {
    /// Size in KiB.
    pub fn kib(self) -> u64 {
        self.kib
    }
}

impl FromStr for MemorySize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidMemory {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let without_b = upper
            .strip_suffix('B')
            .filter(|rest| rest.ends_with(['K', 'M', 'G', 'T']))
            .unwrap_or(upper.as_str());

        let split = without_b
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(without_b.len());
        let (digits, unit) = without_b.split_at(split);

        if digits.is_empty() {
            return Err(invalid("expected a number"));
        }
        let amount: u64 = digits.parse().map_err(|_| invalid("number out of range"))?;

        let multiplier = match unit {
            "K" => 1,
            "" | "M" => KIB_PER_MIB,
            "G" => KIB_PER_GIB,
            "T" => KIB_PER_TIB,
            _ => return Err(invalid("unit must be one of K, M, G, T")),
        };

        let kib = amount
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("number out of range"))?;
        if kib == 0 {
            return Err(invalid("must be greater than zero"));
        }

        Ok(Self { kib })
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kib = self.kib;
        if kib % KIB_PER_TIB == 0 {
            write!(f, "{}T", kib / KIB_PER_TIB)
        } else if kib % KIB_PER_GIB == 0 {
            write!(f, "{}G", kib / KIB_PER_GIB)
        } else if kib % KIB_PER_MIB == 0 {
            write!(f, "{}M", kib / KIB_PER_MIB)
        } else {
            write!(f, "{kib}K")
        }
    }
}

/// Wall-clock limit, stored in seconds.
///
/// Accepts every form `sbatch --time` does: `M`, `M:S`, `H:M:S`, `D-H`,
/// `D-H:M`, `D-H:M:S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallClock {
    seconds: u64,
}

impl WallClock {
    /// Total seconds.
    pub fn seconds(self) -> u64 {
        self.seconds
    }
}

impl FromStr for WallClock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTimeLimit {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let number = |part: &str| -> Result<u64> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("expected digits"));
            }
            part.parse().map_err(|_| invalid("number out of range"))
        };

        let trimmed = s.trim();
        let (days, clock) = match trimmed.split_once('-') {
            Some((d, rest)) => (Some(number(d)?), rest),
            None => (None, trimmed),
        };
        let parts: Vec<&str> = clock.split(':').collect();

        let (h, m, sec) = match (days.is_some(), parts.as_slice()) {
            (false, [m]) => (0, number(*m)?, 0),
            (false, [m, s]) => (0, number(*m)?, number(*s)?),
            (_, [h, m, s]) => (number(*h)?, number(*m)?, number(*s)?),
            (true, [h]) => (number(*h)?, 0, 0),
            (true, [h, m]) => (number(*h)?, number(*m)?, 0),
            _ => return Err(invalid("too many ':' separated fields")),
        };

        let seconds = days
            .unwrap_or(0)
            .checked_mul(86_400)
            .and_then(|d| h.checked_mul(3600).and_then(|h| d.checked_add(h)))
            .and_then(|t| m.checked_mul(60).and_then(|m| t.checked_add(m)))
            .and_then(|t| t.checked_add(sec))
            .ok_or_else(|| invalid("number out of range"))?;

        if seconds == 0 {
            return Err(invalid("must be greater than zero"));
        }

        Ok(Self { seconds })
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.seconds / 86_400;
        let hours = (self.seconds % 86_400) / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        if days > 0 {
            write!(f, "{days}-{hours:02}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}
