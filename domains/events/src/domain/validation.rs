//! Validation helpers and constants for API handlers

use regex::Regex;

lazy_static::lazy_static! {
    /// Event slug: lowercase alphanumeric words joined by single hyphens
    pub static ref EVENT_SLUG_REGEX: Regex =
        Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();

    /// Bank/UPI transaction references
    pub static ref TRANSACTION_ID_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_/-]{3,99}$").unwrap();

    /// Phone numbers: optional leading '+', digits with spaces or hyphens
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9][0-9 -]{5,30}[0-9]$").unwrap();
}

/// Maximum event slug length (varchar(64))
pub const MAX_SLUG_LENGTH: usize = 64;

pub fn validate_event_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LENGTH && EVENT_SLUG_REGEX.is_match(slug)
}

pub fn validate_transaction_id(transaction_id: &str) -> bool {
    TRANSACTION_ID_REGEX.is_match(transaction_id)
}

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// `validator` adapter for slug fields
pub fn slug_format(slug: &str) -> Result<(), validator::ValidationError> {
    if validate_event_slug(slug) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_slug"))
    }
}

/// `validator` adapter for payment reference fields
pub fn transaction_id_format(transaction_id: &str) -> Result<(), validator::ValidationError> {
    if validate_transaction_id(transaction_id) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_transaction_id"))
    }
}

/// `validator` adapter for phone fields
pub fn phone_format(phone: &str) -> Result<(), validator::ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_phone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_slug() {
        assert!(validate_event_slug("spring-hackathon-2026"));
        assert!(validate_event_slug("a"));
        assert!(validate_event_slug("ctf"));

        assert!(!validate_event_slug(""));
        assert!(!validate_event_slug("-lead"));
        assert!(!validate_event_slug("trail-"));
        assert!(!validate_event_slug("double--hyphen"));
        assert!(!validate_event_slug("Upper"));
        assert!(!validate_event_slug("under_score"));
        assert!(!validate_event_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)));
    }

    #[test]
    fn test_transaction_id() {
        assert!(validate_transaction_id("UTR123456789"));
        assert!(validate_transaction_id("pay_9f8e-77/01"));

        assert!(!validate_transaction_id("abc"));
        assert!(!validate_transaction_id("-starts-with-dash"));
        assert!(!validate_transaction_id("has space 1234"));
        assert!(!validate_transaction_id(&"x".repeat(101)));
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+91 98765 43210"));
        assert!(validate_phone("020-7946-0958"));
        assert!(validate_phone("5551234"));

        assert!(!validate_phone("12345"));
        assert!(!validate_phone("phone"));
        assert!(!validate_phone("+44 20 7946 0958 ext"));
        assert!(!validate_phone("98765-"));
    }
}
