use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FieldError;

/// Input validation utilities for the content API

// Compile regex patterns once at startup
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // This regex is hardcoded and validated - it is a compile-time constant in practice
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

const MIN_PASSWORD_LEN: usize = 5;
const MIN_TITLE_LEN: usize = 5;
const MIN_CONTENT_LEN: usize = 5;

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Field-level errors for a registration request; empty means valid.
pub fn registration_errors(email: &str, name: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !validate_email(email.trim()) {
        errors.push(FieldError::new("email", "E-Mail is invalid."));
    }
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required."));
    }
    if password.trim().chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new("password", "Password too short!"));
    }
    errors
}

/// Field-level errors for post creation/update input; empty means valid.
pub fn post_input_errors(title: &str, content: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if title.trim().chars().count() < MIN_TITLE_LEN {
        errors.push(FieldError::new("title", "Title is invalid."));
    }
    if content.trim().chars().count() < MIN_CONTENT_LEN {
        errors.push(FieldError::new("content", "Content is invalid."));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_registration_valid() {
        assert!(registration_errors("a@x.com", "A", "secret").is_empty());
    }

    #[test]
    fn test_registration_aggregates_errors() {
        let errors = registration_errors("not-an-email", "", "abc");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[1].field, "name");
        assert_eq!(errors[2].field, "password");
    }

    #[test]
    fn test_password_boundary() {
        assert!(registration_errors("a@x.com", "A", "abcd").iter().any(|e| e.field == "password"));
        assert!(registration_errors("a@x.com", "A", "abcde").is_empty());
    }

    #[test]
    fn test_post_input_valid() {
        assert!(post_input_errors("Hello World", "Some content").is_empty());
    }

    #[test]
    fn test_post_input_too_short() {
        let errors = post_input_errors("Hi", "ok");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Title is invalid.");
        assert_eq!(errors[1].message, "Content is invalid.");
    }

    #[test]
    fn test_post_input_whitespace_not_counted() {
        assert!(!post_input_errors("     ", "valid content").is_empty());
    }
}
