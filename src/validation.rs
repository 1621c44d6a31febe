use crate::error::{SchemaError, SchemaResult};
use regex::Regex;
use std::sync::LazyLock;

pub const USER_NAME_MAX: usize = 250;
pub const PASSWORD_MAX: usize = 128;
pub const EMAIL_MAX: usize = 120;
pub const PERSON_NAME_MAX: usize = 250;
pub const COMMENT_TEXT_MAX: usize = 250;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Lengths are counted in characters, matching SQLite's `length()` on TEXT.
pub fn require_text(field: &str, value: &str, max: usize) -> SchemaResult<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::validation(format!("{field} must not be empty")));
    }
    check_length(field, value, max)
}

pub fn check_length(field: &str, value: &str, max: usize) -> SchemaResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(SchemaError::validation(format!(
            "{field} is {len} characters, limit is {max}"
        )));
    }
    Ok(())
}

pub fn check_email(email: &str) -> SchemaResult<()> {
    require_text("email", email, EMAIL_MAX)?;
    if !EMAIL_PATTERN.is_match(email) {
        return Err(SchemaError::validation(format!("email {email:?} is malformed")));
    }
    Ok(())
}
