use std::fmt;
use thiserror::Error;

/// Why a login attempt was refused.
///
/// Both reasons map to the same error kind; the reason only selects the
/// message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownEmail,
    WrongPassword,
}

impl fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialFailure::UnknownEmail => f.write_str(
                "We cannot find an account with that email address. Please try again.",
            ),
            CredentialFailure::WrongPassword => {
                f.write_str("Password incorrect, please try again.")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("Email address already in use, please sign in instead.")]
    DuplicateEmail,
    #[error("{0}")]
    InvalidCredentials(CredentialFailure),
    #[error("Please log in to access this page.")]
    AuthenticationRequired,
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Metadata provider unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Current password does not match. Please try again.")]
    PasswordMismatch,
    #[error("Passwords do not match. Please try again.")]
    Confirmation,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Longest text stored for names, emails, titles and poster paths. Matches
/// the `VARCHAR(250)` columns.
pub const MAX_TEXT_LEN: usize = 250;

/// Rejects `value` when it is longer than [`MAX_TEXT_LEN`] characters.
pub fn check_length(field: &str, value: &str) -> Result<(), DomainError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::Validation(format!(
            "{} must be at most {} characters.",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

impl DomainError {
    /// Errors caused by user input or domain state, as opposed to
    /// infrastructure failures.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DomainError::RemoteUnavailable(_) | DomainError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_messages_differ_by_reason() {
        let unknown = DomainError::InvalidCredentials(CredentialFailure::UnknownEmail);
        let wrong = DomainError::InvalidCredentials(CredentialFailure::WrongPassword);

        assert_ne!(unknown.to_string(), wrong.to_string());
        assert!(unknown.to_string().contains("cannot find an account"));
        assert!(wrong.to_string().contains("Password incorrect"));
    }

    #[test]
    fn test_check_length_counts_characters() {
        assert!(check_length("Title", &"a".repeat(MAX_TEXT_LEN)).is_ok());
        assert!(check_length("Title", &"é".repeat(MAX_TEXT_LEN)).is_ok());

        let err = check_length("Title", &"a".repeat(MAX_TEXT_LEN + 1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref msg) if msg.starts_with("Title")));
    }

    #[test]
    fn test_infrastructure_errors_are_not_recoverable() {
        assert!(!DomainError::RemoteUnavailable("timeout".into()).is_recoverable());
        assert!(!DomainError::Internal("boom".into()).is_recoverable());
        assert!(DomainError::DuplicateEmail.is_recoverable());
        assert!(DomainError::NotFound("x".into()).is_recoverable());
    }
}
