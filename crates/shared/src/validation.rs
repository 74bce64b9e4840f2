use thiserror::Error;

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("Please enter your full name")]
    MissingFullName,
    #[error("Please enter your email")]
    MissingEmail,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Checks run before any signup request leaves the client. First failure wins.
pub fn validate_signup(
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), SignupError> {
    validate_credentials(full_name, email, password)?;
    if password != confirm_password {
        return Err(SignupError::PasswordMismatch);
    }
    Ok(())
}

/// The subset of [`validate_signup`] the server can check (it never sees the confirmation field).
pub fn validate_credentials(
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<(), SignupError> {
    if full_name.trim().is_empty() {
        return Err(SignupError::MissingFullName);
    }
    if email.trim().is_empty() {
        return Err(SignupError::MissingEmail);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(SignupError::PasswordTooShort);
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_first_failing_rule() {
        assert_eq!(
            validate_signup(" ", "", "x", "y"),
            Err(SignupError::MissingFullName)
        );
        assert_eq!(
            validate_signup("Ada", "  ", "x", "y"),
            Err(SignupError::MissingEmail)
        );
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "12345", "12345"),
            Err(SignupError::PasswordTooShort)
        );
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "123456", "1234567"),
            Err(SignupError::PasswordMismatch)
        );
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "123456", "123456"),
            Ok(())
        );
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            SignupError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
