//! Common validation utilities for domain fields.

use validator::ValidationError;

/// Allowed length range for staff usernames.
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;

/// Validates a staff username.
///
/// Usernames are restricted to word characters so that `@username` mention
/// tokens in chat messages resolve unambiguously.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        let mut err = ValidationError::new("username_length");
        err.message = Some("Username must be 3-30 characters".into());
        return Err(err);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        let mut err = ValidationError::new("username_charset");
        err.message = Some("Username may only contain letters, digits and underscore".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a status display color (`#rrggbb`).
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let bytes = color.as_bytes();
    let well_formed =
        bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit);
    if well_formed {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("Color must be a #rrggbb hex string".into());
        Err(err)
    }
}

/// Validates that a free-text field is non-blank after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
