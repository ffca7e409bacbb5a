//! Input checks shared by the services, all failing with [SystemError::Invalid].

use crate::data::Stats;
use crate::error::{Result, SystemError};

/// Check that the trimmed `value` has between `min` and `max` characters (inclusive).
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        Err(SystemError::invalid(format!("{field} must be between {min} and {max} characters")))
    } else {
        Ok(())
    }
}

pub fn not_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(SystemError::invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// A deliberately loose check: one `@`, a non-empty local part and a dotted domain.
pub fn email(value: &str) -> Result<()> {
    let valid = value
        .split_once('@')
        .filter(|(local, domain)| !local.is_empty() && !domain.contains('@'))
        .is_some_and(|(_, domain)| domain.contains('.') && domain.split('.').all(|label| !label.is_empty()));

    if valid && !value.chars().any(char::is_whitespace) {
        Ok(())
    } else {
        Err(SystemError::invalid("Please provide a valid email"))
    }
}

pub fn password(value: &str) -> Result<()> {
    if value.chars().count() < 6 {
        Err(SystemError::invalid("Password must be at least 6 characters"))
    } else {
        Ok(())
    }
}

pub fn stats(stats: &Stats) -> Result<()> {
    match stats.named().into_iter().find(|(_, v)| !(Stats::MIN..=Stats::MAX).contains(v)) {
        Some((name, value)) => Err(SystemError::invalid(format!(
            "{name} must be between {} and {}, got {value}",
            Stats::MIN,
            Stats::MAX
        ))),
        None => Ok(()),
    }
}

pub fn quantity(value: i32) -> Result<()> {
    if value < 1 {
        Err(SystemError::invalid("Quantity must be at least 1"))
    } else {
        Ok(())
    }
}
