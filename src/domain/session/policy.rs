//! Credential policy applied before any auth call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::foundation::ValidationError;

static LOCAL_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w-]+(?:\.[\w-]+)*$").expect("valid local-part pattern"));

static LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+$").expect("valid letters pattern"));

static USER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,24}$").expect("valid user name pattern"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Only addresses at the institution's domain may sign up or sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionEmail {
    domain: String,
}

impl InstitutionEmail {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim().trim_start_matches('@').to_ascii_lowercase(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Accepts `local@domain` with a dotted word local part; the domain compares case-insensitively.
    pub fn check(&self, email: &str) -> Result<(), ValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        let (local, domain) = email
            .rsplit_once('@')
            .ok_or_else(|| ValidationError::invalid_format("email", "missing '@'"))?;
        if !LOCAL_PART.is_match(local) {
            return Err(ValidationError::invalid_format("email", "invalid local part"));
        }
        if !domain.eq_ignore_ascii_case(&self.domain) {
            return Err(ValidationError::DisallowedDomain {
                domain: domain.to_string(),
                expected: self.domain.clone(),
            });
        }
        Ok(())
    }
}

/// Passwords are 8 to 128 characters.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::empty_field("password"));
    }
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ValidationError::out_of_range(
            "password",
            MIN_PASSWORD_LEN as i32,
            MAX_PASSWORD_LEN as i32,
            i32::try_from(len).unwrap_or(i32::MAX),
        ));
    }
    Ok(())
}

/// A first or last name: letters only, surrounding whitespace ignored.
/// Returns the trimmed name.
pub fn check_name<'a>(field: &str, name: &'a str) -> Result<&'a str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if !LETTERS_ONLY.is_match(name) {
        return Err(ValidationError::invalid_format(field, "letters only"));
    }
    Ok(name)
}

/// 3 to 24 ASCII letters, digits, `_` or `.`. Returns the trimmed user name.
pub fn check_user_name(user_name: &str) -> Result<&str, ValidationError> {
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(ValidationError::empty_field("user_name"));
    }
    if !USER_NAME.is_match(user_name) {
        return Err(ValidationError::invalid_format(
            "user_name",
            "3 to 24 letters, digits, '_' or '.'",
        ));
    }
    Ok(user_name)
}
