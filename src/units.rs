//! Size and duration parsing and formatting

use std::time::Duration;
use thiserror::Error;

pub const KB: u64 = 1024;
pub const MB: u64 = KB * KB;
pub const GB: u64 = KB * KB * KB;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnitError {
    #[error("Value {0:?} is an invalid size")]
    Empty(String),

    #[error("Invalid value {0:?}")]
    InvalidNumber(String),

    #[error("Illegal {kind} specifier {suffix:?} in {value:?}")]
    IllegalSuffix {
        kind: &'static str,
        suffix: char,
        value: String,
    },

    #[error("Value {0:?} is too large")]
    Overflow(String),
}

fn split_suffix(value: &str) -> Result<(u64, Option<char>), UnitError> {
    let value = value.trim();
    let Some(last) = value.chars().last() else {
        return Err(UnitError::Empty(value.to_string()));
    };
    let (digits, suffix) = if last.is_ascii_digit() {
        (value, None)
    } else {
        (&value[..value.len() - last.len_utf8()], Some(last))
    };
    let number = digits
        .parse::<u64>()
        .map_err(|_| UnitError::InvalidNumber(value.to_string()))?;
    Ok((number, suffix))
}

fn scale(value: &str, kind: &'static str, scales: &[(char, u64)]) -> Result<u64, UnitError> {
    let (number, suffix) = split_suffix(value)?;
    let Some(suffix) = suffix else {
        return Ok(number);
    };
    let factor = scales
        .iter()
        .find(|(c, _)| *c == suffix.to_ascii_lowercase())
        .map(|&(_, factor)| factor)
        .ok_or_else(|| UnitError::IllegalSuffix {
            kind,
            suffix,
            value: value.to_string(),
        })?;
    number
        .checked_mul(factor)
        .ok_or_else(|| UnitError::Overflow(value.to_string()))
}

/// Parse a byte count with an optional `b`, `k`, `m` or `g` suffix
pub fn parse_size(value: &str) -> Result<u64, UnitError> {
    scale(value, "size", &[('b', 1), ('k', KB), ('m', MB), ('g', GB)])
}

/// Parse a duration in seconds with an optional `s`, `m`, `h` or `d` suffix
pub fn parse_duration(value: &str) -> Result<Duration, UnitError> {
    let secs = scale(
        value,
        "time",
        &[('s', 1), ('m', 60), ('h', 3600), ('d', 24 * 3600)],
    )?;
    Ok(Duration::from_secs(secs))
}

/// Render a byte count in B, KB, MB or GB with one decimal place
pub fn format_size(value: f64) -> String {
    let (scaled, units) = if value < (10 * KB) as f64 {
        (value, "B")
    } else if value < (10 * MB) as f64 {
        (value / KB as f64, "KB")
    } else if value < (10 * GB) as f64 {
        (value / MB as f64, "MB")
    } else {
        (value / GB as f64, "GB")
    };
    format!("{:7.1} {}", scaled, units)
}

/// Render seconds as `H:MM:SS`
pub fn format_secs(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
