//! Request and response payloads for the accounts API. Credentials and token
//! material must never be logged; `Debug` output redacts them.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh credential pair. Both halves are always present together.
#[derive(Clone)]
pub struct SessionTokens {
    access: SecretString,
    refresh: SecretString,
}

impl SessionTokens {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: SecretString::from(refresh.into()),
        }
    }

    #[must_use]
    pub fn access(&self) -> &str {
        self.access.expose_secret()
    }

    #[must_use]
    pub fn refresh(&self) -> &str {
        self.refresh.expose_secret()
    }

    /// True when neither token is empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access().is_empty() && !self.refresh().is_empty()
    }
}

impl PartialEq for SessionTokens {
    fn eq(&self, other: &Self) -> bool {
        self.access() == other.access() && self.refresh() == other.refresh()
    }
}

impl Eq for SessionTokens {}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access", &"***")
            .field("refresh", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SignupEmailRequest {
    pub email: String,
}

#[derive(Clone, Serialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("business_name", &self.business_name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("token", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct TokenPairResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Profile returned by `/accounts/me/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
    pub name: String,
}

/// Confirmation email was accepted by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignupEmailSent {
    pub message: String,
}

/// Successful login, registration or refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticated {
    pub tokens: SessionTokens,
    pub message: Option<String>,
}
