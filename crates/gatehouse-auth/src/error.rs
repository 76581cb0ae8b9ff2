use std::fmt;

use gatehouse_store::StorageError;
use thiserror::Error;

/// Result code sent back to the client.
///
/// Expected rejections are reported through a code, never through an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    Ok = 0,
    /// Username or password is missing
    InvalidArgument = 1001,
    /// The username is already registered
    AlreadyExists = 1002,
    /// Unknown username or wrong password, on purpose not told apart
    InvalidCredentials = 1004,
}

impl ErrorCode {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::AlreadyExists => "already_exists",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            1001 => Ok(Self::InvalidArgument),
            1002 => Ok(Self::AlreadyExists),
            1004 => Ok(Self::InvalidCredentials),
            other => Err(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Failure the gate cannot turn into an [`ErrorCode`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Account store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_wire_values() {
        assert_eq!(u32::from(ErrorCode::Ok), 0);
        assert_eq!(u32::from(ErrorCode::InvalidArgument), 1001);
        assert_eq!(u32::from(ErrorCode::AlreadyExists), 1002);
        assert_eq!(u32::from(ErrorCode::InvalidCredentials), 1004);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(ErrorCode::try_from(1002), Ok(ErrorCode::AlreadyExists));
        assert_eq!(ErrorCode::try_from(1003), Err(1003));
    }
}
