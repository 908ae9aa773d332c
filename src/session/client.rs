//! HTTP client for the accounts API. Every operation makes a single attempt and
//! normalizes the response into `Result<_, AuthError>`; all knowledge of which
//! body field carries the error message lives here. The client never touches
//! session storage and never logs credentials or tokens.

use super::{
    error::AuthError,
    types::{
        Authenticated, CurrentUser, LoginRequest, MessageResponse, RefreshRequest,
        RegistrationRequest, SessionTokens, SignupEmailRequest, SignupEmailSent,
        TokenPairResponse,
    },
};
use crate::APP_USER_AGENT;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

pub const EMAIL_START_PATH: &str = "/accounts/email-start/";
pub const REGISTER_PATH: &str = "/accounts/register/";
pub const TOKEN_PATH: &str = "/accounts/api/token/";
pub const TOKEN_REFRESH_PATH: &str = "/accounts/api/token/refresh/";
pub const ME_PATH: &str = "/accounts/me/";

const UNKNOWN_ERROR: &str = "An unknown error occurred.";
const SIGNUP_UNEXPECTED: &str = "An unexpected error occurred";
const SIGNUP_SENT: &str = "A confirmation email has been sent. Please check your inbox.";
const REGISTER_UNEXPECTED: &str = "An unexpected error occurred during registration.";
const REGISTER_SUCCESS: &str = "Registration successful! Redirecting...";
const LOGIN_FAILED: &str = "Authentication failed";
const LOGIN_UNEXPECTED: &str = "An unknown error occurred during login.";
const USER_FAILED: &str = "Failed to fetch user";
const REFRESH_FAILED: &str = "Session refresh failed";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Per-request timeout; `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    /// # Errors
    /// Returns [`AuthError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|err| AuthError::Config(format!("invalid API base URL {base_url}: {err}")))?;

        let mut builder = Client::builder().user_agent(APP_USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| AuthError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim().trim_start_matches('/'))
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> RequestBuilder {
        self.http
            .post(self.endpoint(path))
            .header(CONTENT_TYPE, "application/json")
            .json(body)
    }

    fn get_json(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.endpoint(path))
            .header(CONTENT_TYPE, "application/json")
    }

    /// Asks the API to email a registration link to `request.email`.
    ///
    /// # Errors
    /// Returns the first `email` field error, else the `detail` message, else a
    /// generic failure.
    #[instrument(skip_all)]
    pub async fn request_signup_email(
        &self,
        request: &SignupEmailRequest,
    ) -> Result<SignupEmailSent, AuthError> {
        let (status, body) = self
            .send(self.post_json(EMAIL_START_PATH, request), SIGNUP_UNEXPECTED)
            .await?;

        if !status.is_success() {
            if let Some(message) = first_field_error(&body, "email") {
                return Err(AuthError::Validation(message));
            }
            return Err(AuthError::Rejected(
                detail_message(&body).unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }

        let response: MessageResponse = serde_json::from_value(body)
            .map_err(|_| AuthError::Transport(SIGNUP_UNEXPECTED.to_string()))?;

        Ok(SignupEmailSent {
            message: non_empty(response.message).unwrap_or_else(|| SIGNUP_SENT.to_string()),
        })
    }

    /// Completes registration with the signup token from the email link.
    ///
    /// # Errors
    /// Returns every field error from the response joined by spaces, or a
    /// generic failure.
    #[instrument(skip_all)]
    pub async fn confirm_registration(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Authenticated, AuthError> {
        let (status, body) = self
            .send(self.post_json(REGISTER_PATH, request), REGISTER_UNEXPECTED)
            .await?;

        if !status.is_success() {
            let message = flatten_field_errors(&body);
            if message.is_empty() {
                return Err(AuthError::Rejected(UNKNOWN_ERROR.to_string()));
            }
            if is_detail_only(&body) {
                return Err(AuthError::Rejected(message));
            }
            return Err(AuthError::Validation(message));
        }

        let response = token_pair(body, REGISTER_UNEXPECTED)?;
        let tokens = complete_pair(response.access, response.refresh, REGISTER_UNEXPECTED)?;

        Ok(Authenticated {
            tokens,
            message: Some(
                non_empty(response.message).unwrap_or_else(|| REGISTER_SUCCESS.to_string()),
            ),
        })
    }

    /// Exchanges email and password for a token pair.
    ///
    /// # Errors
    /// Returns the `detail` message or a generic authentication failure.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<Authenticated, AuthError> {
        let (status, body) = self
            .send(self.post_json(TOKEN_PATH, request), LOGIN_UNEXPECTED)
            .await?;

        if !status.is_success() {
            return Err(AuthError::Rejected(
                detail_message(&body).unwrap_or_else(|| LOGIN_FAILED.to_string()),
            ));
        }

        let response = token_pair(body, LOGIN_UNEXPECTED)?;
        let tokens = complete_pair(response.access, response.refresh, LOGIN_UNEXPECTED)?;

        Ok(Authenticated {
            tokens,
            message: non_empty(response.message),
        })
    }

    /// Renews the access token. When the API does not rotate the refresh token
    /// the current one is carried over.
    ///
    /// # Errors
    /// Returns the `detail` message or a generic refresh failure.
    #[instrument(skip_all)]
    pub async fn refresh(&self, tokens: &SessionTokens) -> Result<Authenticated, AuthError> {
        let request = RefreshRequest {
            refresh: tokens.refresh(),
        };
        let (status, body) = self
            .send(self.post_json(TOKEN_REFRESH_PATH, &request), REFRESH_FAILED)
            .await?;

        if !status.is_success() {
            return Err(AuthError::Rejected(
                detail_message(&body).unwrap_or_else(|| REFRESH_FAILED.to_string()),
            ));
        }

        let response = token_pair(body, REFRESH_FAILED)?;
        let refresh = non_empty(response.refresh).or_else(|| Some(tokens.refresh().to_string()));
        let tokens = complete_pair(response.access, refresh, REFRESH_FAILED)?;

        Ok(Authenticated {
            tokens,
            message: non_empty(response.message),
        })
    }

    /// Fetches the profile of the user owning the access token.
    ///
    /// # Errors
    /// Returns the `detail` message or a generic failure.
    #[instrument(skip_all)]
    pub async fn fetch_current_user(
        &self,
        tokens: &SessionTokens,
    ) -> Result<CurrentUser, AuthError> {
        let (status, body) = self
            .send(self.get_json(ME_PATH).bearer_auth(tokens.access()), USER_FAILED)
            .await?;

        if !status.is_success() {
            return Err(AuthError::Rejected(
                detail_message(&body).unwrap_or_else(|| USER_FAILED.to_string()),
            ));
        }

        serde_json::from_value(body).map_err(|_| AuthError::Transport(USER_FAILED.to_string()))
    }

    /// Sends the request and parses the body as JSON whatever the status.
    async fn send(
        &self,
        request: RequestBuilder,
        generic: &str,
    ) -> Result<(StatusCode, Value), AuthError> {
        let response = request
            .send()
            .await
            .map_err(|err| {
                warn!("request failed: {err}");
                AuthError::Transport(generic.to_string())
            })?;

        let status = response.status();
        debug!("{} - {}", response.url().path(), status);

        let bytes = response.bytes().await.map_err(|err| {
            warn!("failed to read response body: {err}");
            AuthError::Transport(generic.to_string())
        })?;

        let body = serde_json::from_slice::<Value>(&bytes).map_err(|err| {
            warn!("response body is not JSON ({status}): {err}");
            AuthError::Transport(generic.to_string())
        })?;

        Ok((status, body))
    }
}

fn token_pair(body: Value, generic: &str) -> Result<TokenPairResponse, AuthError> {
    serde_json::from_value(body).map_err(|_| AuthError::Transport(generic.to_string()))
}

fn complete_pair(
    access: Option<String>,
    refresh: Option<String>,
    generic: &str,
) -> Result<SessionTokens, AuthError> {
    match (non_empty(access), non_empty(refresh)) {
        (Some(access), Some(refresh)) => Ok(SessionTokens::new(access, refresh)),
        _ => {
            warn!("response is missing the access or refresh token");
            Err(AuthError::Transport(generic.to_string()))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// First message of a field-level error array, e.g. `{"email": ["..."]}`.
fn first_field_error(body: &Value, field: &str) -> Option<String> {
    body.get(field)?
        .as_array()?
        .iter()
        .find_map(Value::as_str)
        .map(ToString::to_string)
}

fn detail_message(body: &Value) -> Option<String> {
    body.get("detail")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .filter(|detail| !detail.is_empty())
}

fn is_detail_only(body: &Value) -> bool {
    body.as_object()
        .is_some_and(|map| map.len() == 1 && map.contains_key("detail"))
}

/// Every field message in key order, arrays flattened, joined by one space.
fn flatten_field_errors(body: &Value) -> String {
    let Some(map) = body.as_object() else {
        return String::new();
    };

    let mut messages = Vec::new();
    for value in map.values() {
        match value {
            Value::String(message) => messages.push(message.as_str()),
            Value::Array(items) => messages.extend(items.iter().filter_map(Value::as_str)),
            _ => {}
        }
    }

    messages.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_field_error_takes_first_string() {
        let body = json!({"email": ["Enter a valid email address.", "second"]});
        assert_eq!(
            first_field_error(&body, "email"),
            Some("Enter a valid email address.".to_string())
        );
        assert_eq!(first_field_error(&json!({"email": []}), "email"), None);
        assert_eq!(first_field_error(&json!({"email": "plain"}), "email"), None);
        assert_eq!(first_field_error(&json!({"detail": "x"}), "email"), None);
    }

    #[test]
    fn flatten_keeps_key_order_and_plain_strings() {
        let body = json!({
            "token": "Invalid or expired token.",
            "email": ["Email does not match the token.", "Enter a valid email address."],
            "code": 42,
        });
        assert_eq!(
            flatten_field_errors(&body),
            "Invalid or expired token. Email does not match the token. Enter a valid email address."
        );
        assert_eq!(flatten_field_errors(&json!({})), "");
        assert_eq!(flatten_field_errors(&json!(["not", "an", "object"])), "");
    }

    #[test]
    fn detail_only_bodies_are_detected() {
        assert!(is_detail_only(&json!({"detail": "nope"})));
        assert!(!is_detail_only(&json!({"detail": "nope", "email": ["x"]})));
        assert!(!is_detail_only(&json!(null)));
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let client = AuthClient::new(&ClientConfig {
            api_base_url: " http://localhost:8000/ ".to_string(),
            timeout: None,
        });
        assert!(client.is_ok());
        if let Ok(client) = client {
            assert_eq!(
                client.endpoint(TOKEN_PATH),
                "http://localhost:8000/accounts/api/token/"
            );
        }
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let client = AuthClient::new(&ClientConfig {
            api_base_url: "not a url".to_string(),
            timeout: None,
        });
        assert!(matches!(client, Err(AuthError::Config(_))));
    }

    #[test]
    fn partial_pairs_are_rejected() {
        assert!(complete_pair(Some("a".into()), Some("r".into()), "x").is_ok());
        assert!(complete_pair(Some("a".into()), None, "x").is_err());
        assert!(complete_pair(None, Some("r".into()), "x").is_err());
        assert!(complete_pair(Some(String::new()), Some("r".into()), "x").is_err());
    }
}
