//! Signup token decoding. A signup token is `base64url(email):suffix`; the
//! email is decoded locally for display and never trusted. The raw token is
//! forwarded unchanged when the registration is confirmed.

use super::error::DecodeError;
use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use std::fmt;
use url::Url;

/// Deep-link query parameter carrying the signup token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Decodes the claimed email embedded in a signup token.
///
/// # Errors
/// Returns a [`DecodeError`] when the token is empty, has no `:` separator, or
/// its payload is not base64-encoded UTF-8.
pub fn decode_claimed_email(token: &str) -> Result<String, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Missing);
    }

    let (payload, _) = token
        .split_once(':')
        .ok_or(DecodeError::MissingSeparator)?;
    if payload.is_empty() {
        return Err(DecodeError::InvalidBase64);
    }

    let mut standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = (4 - standard.len() % 4) % 4;
    standard.extend(std::iter::repeat('=').take(padding));

    let bytes = Base64::decode_vec(&standard).map_err(|_| DecodeError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

/// Builds a signup token for `email` with the given suffix.
#[must_use]
pub fn encode_claimed_email(email: &str, suffix: &str) -> String {
    format!("{}:{suffix}", Base64UrlUnpadded::encode_string(email.as_bytes()))
}

/// A signup token together with the email it claims.
#[derive(Clone, PartialEq, Eq)]
pub struct SignupToken {
    raw: String,
    claimed_email: String,
}

impl SignupToken {
    /// # Errors
    /// Returns a [`DecodeError`] if the token cannot be decoded.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let claimed_email = decode_claimed_email(raw)?;
        Ok(Self {
            raw: raw.trim().to_string(),
            claimed_email,
        })
    }

    /// Extracts and parses the `token` query parameter of a confirmation link.
    /// Relative links such as `/confirm-registration?token=...` are accepted.
    ///
    /// # Errors
    /// Returns [`DecodeError::Missing`] when the link has no token.
    pub fn from_link(link: &str) -> Result<Self, DecodeError> {
        let base = Url::parse("http://localhost/").map_err(|_| DecodeError::Missing)?;
        let url = base.join(link.trim()).map_err(|_| DecodeError::Missing)?;

        let token = url
            .query_pairs()
            .find(|(key, _)| key == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or(DecodeError::Missing)?;

        Self::parse(&token)
    }

    /// The token exactly as issued, for the confirmation request.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Email decoded from the token, for display only.
    #[must_use]
    pub fn claimed_email(&self) -> &str {
        &self.claimed_email
    }
}

impl fmt::Debug for SignupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupToken")
            .field("raw", &"***")
            .field("claimed_email", &self.claimed_email)
            .finish()
    }
}
