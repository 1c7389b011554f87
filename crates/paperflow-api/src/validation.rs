//! Input validation utilities for PaperFlow records
//!
//! This module provides validation functions for drafts and sign-in input.

use validator::ValidationError;

/// Maximum length for a section title
pub const MAX_TITLE_LENGTH: usize = 512;

/// Maximum length for a section number (e.g. "6.1.2")
pub const MAX_SECTION_NUMBER_LENGTH: usize = 32;

/// Maximum length for section body text (1MB)
pub const MAX_BODY_LENGTH: usize = 1024 * 1024;

/// Maximum length for note text
pub const MAX_NOTE_LENGTH: usize = 64 * 1024;

/// Maximum length for an email address
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length accepted by the auth backend
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate a section title: required, bounded
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title_empty"));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ValidationError::new("title_too_long"));
    }
    Ok(())
}

/// Validate a section number (may be empty for unnumbered sections)
pub fn validate_section_number(section_number: &str) -> Result<(), ValidationError> {
    if section_number.len() > MAX_SECTION_NUMBER_LENGTH {
        return Err(ValidationError::new("section_number_too_long"));
    }
    Ok(())
}

/// Validate section body text: required, bounded
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::new("body_empty"));
    }
    if body.len() > MAX_BODY_LENGTH {
        return Err(ValidationError::new("body_too_long"));
    }
    Ok(())
}

/// Validate note text. Whitespace-only text counts as empty.
pub fn validate_note_text(note: &str) -> Result<(), ValidationError> {
    if note.trim().is_empty() {
        return Err(ValidationError::new("note_empty"));
    }
    if note.len() > MAX_NOTE_LENGTH {
        return Err(ValidationError::new("note_too_long"));
    }
    Ok(())
}

/// Validate an email address (shape only)
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email_empty"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::new("email_too_long"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::new("email_invalid")),
    }
}

/// Validate password (basic length check, not security policy)
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password_empty"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Overtime").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"a".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_section_number() {
        assert!(validate_section_number("").is_ok());
        assert!(validate_section_number("6.1").is_ok());
        assert!(validate_section_number(&"9".repeat(MAX_SECTION_NUMBER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body("Employees shall...").is_ok());
        assert!(validate_body("\n\t").is_err());
    }

    #[test]
    fn test_validate_note_text() {
        assert!(validate_note_text("ask about weekends").is_ok());
        assert_eq!(
            validate_note_text("  ").unwrap_err().code.as_ref(),
            "note_empty"
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("kari@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("kari").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("kari@").is_err());
        assert!(validate_email("kari@localhost").is_ok());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
    }
}
