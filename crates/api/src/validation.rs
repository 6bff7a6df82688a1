use auth::Role;

use crate::ApiError;

pub const MIN_PASSWORD_CHARS: usize = 6;

pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Shape check only: one `@` with a non-empty local part and a dotted domain
pub fn email(value: &str) -> Result<(), ApiError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("invalid email address: '{value}'")))
    }
}

pub fn role(value: &str) -> Result<Role, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::Validation(format!("role must be 'user' or 'operator', got '{value}'")))
}
