use thiserror::Error;

/// Message shown when no signup token was supplied.
pub const MISSING_TOKEN_MESSAGE: &str =
    "Registration token not found. Please use the link from your email.";
/// Message shown for any malformed signup token.
pub const INVALID_TOKEN_MESSAGE: &str =
    "Invalid token format. Please use the link from your email again.";

/// Signup token could not be decoded. Recoverable; blocks submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("signup token is missing")]
    Missing,
    #[error("invalid token format: missing ':' separator")]
    MissingSeparator,
    #[error("invalid token format: payload is not base64")]
    InvalidBase64,
    #[error("invalid token format: payload is not UTF-8")]
    InvalidUtf8,
}

impl DecodeError {
    /// Human-readable message suitable for inline display.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Missing => MISSING_TOKEN_MESSAGE,
            Self::MissingSeparator | Self::InvalidBase64 | Self::InvalidUtf8 => {
                INVALID_TOKEN_MESSAGE
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage is corrupt: {0}")]
    Corrupt(String),
    #[error("session tokens must both be non-empty")]
    IncompleteTokens,
    #[error("session storage lock poisoned")]
    Poisoned,
}

/// Normalized failure of an auth operation. `Display` is the inline message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level errors reported by the API.
    #[error("{0}")]
    Validation(String),
    /// The API refused the request (`detail`, bad credentials, other non-2xx).
    #[error("{0}")]
    Rejected(String),
    /// Network failure or a body that could not be understood.
    #[error("{0}")]
    Transport(String),
    #[error("Client configuration error: {0}")]
    Config(String),
    #[error("A request is already in progress.")]
    Busy,
    #[error("Not signed in.")]
    NotAuthenticated,
    #[error("{}", .0.user_message())]
    Decode(#[from] DecodeError),
    #[error("Session storage failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}
