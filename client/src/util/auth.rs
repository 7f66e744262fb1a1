//! Shared auth form helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login, registration and password pages validate input identically before
//! anything is sent to the identity service.

pub const MIN_PASSWORD_LEN: usize = 6;

pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";

/// Trimmed email when it has the `local@domain.tld` shape.
///
/// # Errors
///
/// Returns `INVALID_EMAIL` otherwise.
pub fn validate_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && domain.contains('.')
            && !email.chars().any(char::is_whitespace)
            && !domain.contains('@')
    });
    if valid { Ok(email.to_owned()) } else { Err(INVALID_EMAIL) }
}

/// Password unchanged when long enough. Passwords are never trimmed.
///
/// # Errors
///
/// Returns `PASSWORD_TOO_SHORT` for fewer than six characters.
pub fn validate_password(raw: &str) -> Result<String, &'static str> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(raw.to_owned())
}

/// New password plus its confirmation.
///
/// # Errors
///
/// Returns `PASSWORD_TOO_SHORT` or `PASSWORDS_DIFFER`.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<String, &'static str> {
    let password = validate_password(password)?;
    if password != confirm {
        return Err(PASSWORDS_DIFFER);
    }
    Ok(password)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
