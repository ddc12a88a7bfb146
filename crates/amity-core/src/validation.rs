//! Request validation performed before the engines are invoked

use crate::email::{is_valid_email, normalize_email};
use crate::error::Error;

/// Maximum length for an email address (100 chars)
pub const MAX_EMAIL_LEN: usize = 100;

/// Maximum length for notification text (64KB)
pub const MAX_TEXT_LEN: usize = 64 * 1024;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyEmail { field: String },
    EmailTooLong { email: String, len: usize, max: usize },
    InvalidEmailFormat { email: String },
    TextTooLong { len: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail { field } => write!(f, "{} is required", field),
            Self::EmailTooLong { email, len, max } => {
                write!(f, "{} is too long: {} chars (max {})", email, len, max)
            }
            Self::InvalidEmailFormat { email } => {
                write!(f, "{} is an invalid email format", email)
            }
            Self::TextTooLong { len, max } => {
                write!(f, "Text too long: {} chars (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a single email field; `field` names it in the message
pub fn validate_email(field: &str, email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyEmail {
            field: field.to_string(),
        });
    }
    if trimmed.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::EmailTooLong {
            email: email.to_string(),
            len: trimmed.len(),
            max: MAX_EMAIL_LEN,
        });
    }
    if !is_valid_email(trimmed) {
        return Err(ValidationError::InvalidEmailFormat {
            email: email.to_string(),
        });
    }
    Ok(())
}

/// Validate notification text
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.len() > MAX_TEXT_LEN {
        return Err(ValidationError::TextTooLong {
            len: text.len(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Validate a list of named email fields, collecting every failure
pub fn validate_emails(fields: &[(&str, &str)]) -> Result<(), Error> {
    let messages: Vec<String> = fields
        .iter()
        .filter_map(|(field, email)| validate_email(field, email).err())
        .map(|e| e.to_string())
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidRequest(messages))
    }
}

/// True when both addresses normalize to the same identity
pub fn same_identity(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "andy@example.com").is_ok());
        assert!(validate_email("email", " andy@example.com ").is_ok());
        assert_eq!(
            validate_email("email", "  "),
            Err(ValidationError::EmptyEmail { field: "email".into() })
        );
        assert!(matches!(
            validate_email("email", "not-an-email"),
            Err(ValidationError::InvalidEmailFormat { .. })
        ));

        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(matches!(
            validate_email("email", &long),
            Err(ValidationError::EmailTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_emails_collects_all_failures() {
        let err = validate_emails(&[("friends[0]", "bad"), ("friends[1]", "worse")]).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "bad is an invalid email format",
                "worse is an invalid email format"
            ]
        );

        assert!(validate_emails(&[("requestor", "a@x.com"), ("target", "b@x.com")]).is_ok());
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("").is_ok());
        assert!(validate_text(&"x".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_same_identity() {
        assert!(same_identity("A@x.com ", "a@X.com"));
        assert!(!same_identity("a@x.com", "b@x.com"));
    }
}
