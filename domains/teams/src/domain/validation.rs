//! Team name and team code rules

use rand::Rng;
use regex::Regex;

/// Characters used in generated codes; no 0/O or 1/I to keep them readable
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated team codes
pub const GENERATED_CODE_LENGTH: usize = 8;

pub const MIN_TEAM_NAME_LENGTH: usize = 3;
pub const MAX_TEAM_NAME_LENGTH: usize = 50;

lazy_static::lazy_static! {
    /// Team codes: 4-12 uppercase letters or digits
    pub static ref TEAM_CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9]{4,12}$").unwrap();
}

/// Trim and uppercase a user-supplied code; `None` if it is not a valid code
pub fn normalize_team_code(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    TEAM_CODE_REGEX.is_match(&normalized).then_some(normalized)
}

pub fn generate_team_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Team names are trimmed and must be 3-50 characters
pub fn validate_team_name(name: &str) -> bool {
    let length = name.trim().chars().count();
    (MIN_TEAM_NAME_LENGTH..=MAX_TEAM_NAME_LENGTH).contains(&length)
}

/// `validator` adapter for team name fields
pub fn team_name_format(name: &str) -> Result<(), validator::ValidationError> {
    if validate_team_name(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_team_name"))
    }
}

/// `validator` adapter for team code fields
pub fn team_code_format(code: &str) -> Result<(), validator::ValidationError> {
    if normalize_team_code(code).is_some() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_team_code"))
    }
}
