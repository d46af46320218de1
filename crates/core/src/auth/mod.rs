//! Login rules and password hashing.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use thiserror::Error;

/// Why a login attempt was refused.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The user exists but is deactivated.
    #[error("User account is inactive")]
    UserInactive,

    /// The stored hash could not be checked.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl LoginError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserInactive => "USER_INACTIVE",
            Self::Password(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::UserInactive => 401,
            Self::Password(_) => 500,
        }
    }
}

/// Stored credentials of a user.
#[derive(Debug, Clone, Copy)]
pub struct StoredCredentials<'a> {
    /// PHC password hash.
    pub password_hash: &'a str,
    /// Whether the user may log in.
    pub is_active: bool,
}

/// Checks a login attempt.
///
/// The password is verified before the active flag so an inactive account
/// is only revealed to someone who knows its password.
///
/// # Errors
///
/// Returns `InvalidCredentials` for unknown users and wrong passwords,
/// `UserInactive` for deactivated users.
pub fn authenticate(stored: Option<StoredCredentials<'_>>, password: &str) -> Result<(), LoginError> {
    let stored = stored.ok_or(LoginError::InvalidCredentials)?;
    if !verify_password(password, stored.password_hash)? {
        return Err(LoginError::InvalidCredentials);
    }
    if !stored.is_active {
        return Err(LoginError::UserInactive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate() {
        let hash = hash_password("pw").unwrap();
        let active = StoredCredentials {
            password_hash: &hash,
            is_active: true,
        };

        assert!(authenticate(Some(active), "pw").is_ok());
        assert!(matches!(
            authenticate(Some(active), "nope"),
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(authenticate(None, "pw"), Err(LoginError::InvalidCredentials)));

        let inactive = StoredCredentials {
            is_active: false,
            ..active
        };
        let err = authenticate(Some(inactive), "pw").unwrap_err();
        assert_eq!(err.error_code(), "USER_INACTIVE");
        assert_eq!(err.http_status_code(), 401);
    }
}
