//! Input policies shared by the signup endpoint and the client forms.

use validator::ValidationError;

use crate::constants::PASSWORD_MIN_LEN;

/// Single consolidated message for every password policy failure.
pub const PASSWORD_POLICY_MESSAGE: &str = "La contraseña debe tener al menos 8 caracteres, \
incluir mayúscula, minúscula, número y símbolo especial.";

/// Trimmed, lower-cased form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// At least 8 characters with a lowercase, an uppercase, a digit and a symbol
/// (anything that is not an ASCII letter or digit, underscore included).
pub fn password_meets_policy(password: &str) -> bool {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return false;
    }
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in password.chars() {
        if c.is_ascii_lowercase() {
            lower = true;
        } else if c.is_ascii_uppercase() {
            upper = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    lower && upper && digit && symbol
}

/// `#[validate(custom)]` hook for [`password_meets_policy`]. Every failure
/// carries [`PASSWORD_POLICY_MESSAGE`].
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password_meets_policy(password) {
        return Ok(());
    }
    let mut error = ValidationError::new("password_strength");
    error.message = Some(PASSWORD_POLICY_MESSAGE.into());
    Err(error)
}
