//! Session bootstrap: signup token decoding, the accounts API client, durable
//! token storage and the submission state machine that ties them together.
//!
//! Flow Overview: the UI decodes the claimed email of a signup link with
//! [`SignupToken`], submits a form through [`Bootstrap`], which calls
//! [`AuthClient`] and, on success, writes the token pair through
//! [`SessionStore`]. Observers follow progress with [`Bootstrap::subscribe`].
//! This module handles credentials and must never log token material.

pub mod bootstrap;
pub mod client;
pub mod error;
pub mod state;
pub mod store;
pub mod token;
pub mod types;

pub use bootstrap::Bootstrap;
pub use client::{AuthClient, ClientConfig};
pub use error::{AuthError, DecodeError, StoreError};
pub use state::{SessionState, SessionStateMachine};
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
pub use token::{decode_claimed_email, encode_claimed_email, SignupToken};
pub use types::{
    Authenticated, CurrentUser, LoginRequest, RegistrationRequest, SessionTokens,
    SignupEmailRequest, SignupEmailSent,
};
