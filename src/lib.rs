//! # Ziply (Session Bootstrap)
//!
//! `ziply` is the client-side session bootstrap for the Ziply business dashboard.
//! It covers the three authentication flows the dashboard exposes and keeps the
//! resulting credentials in durable storage.
//!
//! ## Registration
//!
//! Registration is a two step flow. The user first asks the API to send a
//! confirmation email (`/accounts/email-start/`). The email carries a deep link
//! with a short-lived signup token shaped like `base64url(email):suffix`. The
//! claimed email is decoded locally for display only; the API validates the
//! token when the registration is confirmed (`/accounts/register/`).
//!
//! ## Login
//!
//! Login exchanges an email and password for an access/refresh token pair
//! (`/accounts/api/token/`). The pair is renewed through
//! `/accounts/api/token/refresh/`.
//!
//! ## Session storage
//!
//! Token pairs are written as a unit under the `access` and `refresh` keys of a
//! key-value store. A partial pair is never reported as a session. Tokens are
//! stored unencrypted; the file backend restricts the file to its owner.

pub mod cli;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
