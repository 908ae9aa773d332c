//! Wires the auth client, the session store and the submission state together:
//! submit, persist the tokens on success, then report `Authenticated`. Failures
//! never touch the store.

use super::{
    client::AuthClient,
    error::AuthError,
    state::{SessionState, SessionStateMachine},
    store::{KeyValueStore, SessionStore},
    types::{
        Authenticated, CurrentUser, LoginRequest, RegistrationRequest, SessionTokens,
        SignupEmailRequest, SignupEmailSent,
    },
};
use std::future::Future;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct Bootstrap<S> {
    client: AuthClient,
    store: SessionStore<S>,
    state: SessionStateMachine,
}

impl<S: KeyValueStore> Bootstrap<S> {
    pub fn new(client: AuthClient, store: SessionStore<S>) -> Self {
        Self {
            client,
            store,
            state: SessionStateMachine::default(),
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Picks up a session persisted by an earlier run.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read, or [`AuthError::Busy`]
    /// while a submission is in flight.
    pub fn resume(&self) -> Result<SessionState, AuthError> {
        let submission = self.state.begin()?;
        match self.store.read()? {
            Some(_) => submission.authenticated(),
            None => submission.signed_out(),
        }
        Ok(self.state())
    }

    /// # Errors
    /// See [`AuthClient::request_signup_email`].
    #[instrument(skip_all)]
    pub async fn request_signup_email(&self, email: &str) -> Result<SignupEmailSent, AuthError> {
        let submission = self.state.begin()?;
        let request = SignupEmailRequest {
            email: email.trim().to_string(),
        };

        match self.client.request_signup_email(&request).await {
            Ok(sent) => {
                submission.restore();
                Ok(sent)
            }
            Err(err) => {
                submission.failed(err.message());
                Err(err)
            }
        }
    }

    /// # Errors
    /// See [`AuthClient::confirm_registration`]; a storage failure is returned
    /// as [`AuthError::Store`].
    pub async fn confirm_registration(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Authenticated, AuthError> {
        self.authenticate(self.client.confirm_registration(request))
            .await
    }

    /// # Errors
    /// See [`AuthClient::login`]; a storage failure is returned as
    /// [`AuthError::Store`].
    pub async fn login(&self, request: &LoginRequest) -> Result<Authenticated, AuthError> {
        self.authenticate(self.client.login(request)).await
    }

    /// Renews the stored session.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a stored session, else
    /// see [`AuthClient::refresh`].
    pub async fn refresh(&self) -> Result<Authenticated, AuthError> {
        let tokens = self.stored_tokens()?;
        self.authenticate(self.client.refresh(&tokens)).await
    }

    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a stored session, else
    /// see [`AuthClient::fetch_current_user`].
    pub async fn current_user(&self) -> Result<CurrentUser, AuthError> {
        let tokens = self.stored_tokens()?;
        self.client.fetch_current_user(&tokens).await
    }

    /// Forgets the stored session.
    ///
    /// # Errors
    /// Returns [`AuthError::Busy`] during a submission, or the storage error.
    #[instrument(skip_all)]
    pub fn logout(&self) -> Result<(), AuthError> {
        let submission = self.state.begin()?;
        self.store.clear()?;
        submission.signed_out();
        info!("signed out");
        Ok(())
    }

    fn stored_tokens(&self) -> Result<SessionTokens, AuthError> {
        self.store.read()?.ok_or(AuthError::NotAuthenticated)
    }

    async fn authenticate<F>(&self, call: F) -> Result<Authenticated, AuthError>
    where
        F: Future<Output = Result<Authenticated, AuthError>>,
    {
        let submission = self.state.begin()?;

        let result = call
            .await
            .and_then(|auth| self.store.persist(&auth.tokens).map(|()| auth).map_err(Into::into));

        match result {
            Ok(auth) => {
                submission.authenticated();
                info!("session established");
                Ok(auth)
            }
            Err(err) => {
                warn!("authentication failed: {err}");
                submission.failed(err.message());
                Err(err)
            }
        }
    }
}
