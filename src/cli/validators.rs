//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

use crate::scheduler::{MemorySize, WallClock};

/// Parse a count that must be at least 1.
pub fn parse_positive(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid whole number"))?;

    if value == 0 {
        return Err("must be at least 1".to_string());
    }

    Ok(value)
}

/// Parse a memory size and return it in normalized Slurm notation.
pub fn parse_memory(s: &str) -> Result<String, String> {
    s.parse::<MemorySize>()
        .map(|m| m.to_string())
        .map_err(|e| e.to_string())
}

/// Parse a wall-clock limit and return it as `[D-]HH:MM:SS`.
pub fn parse_time_limit(s: &str) -> Result<String, String> {
    s.parse::<WallClock>()
        .map(|t| t.to_string())
        .map_err(|e| e.to_string())
}
