//! Submission state shared between the auth flows and whatever renders them.
//!
//! `Anonymous -> Submitting -> {Authenticated, Failed}`, `Failed -> Submitting`
//! on retry, `Authenticated -> Submitting` on re-authentication and
//! `Authenticated -> Anonymous` on logout. Only one submission may be in flight;
//! a second one is refused with [`AuthError::Busy`].

use super::error::AuthError;
use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Submitting,
    Authenticated,
    /// Last submission failed with this inline message; the form stays editable.
    Failed(String),
}

impl SessionState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

#[derive(Debug)]
pub struct SessionStateMachine {
    tx: watch::Sender<SessionState>,
}

impl SessionStateMachine {
    #[must_use]
    pub fn new(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Read-only view for the UI; it is notified on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Enters `Submitting`.
    ///
    /// # Errors
    /// Returns [`AuthError::Busy`] when a submission is already in flight.
    pub fn begin(&self) -> Result<Submission<'_>, AuthError> {
        let mut previous = None;
        self.tx.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            previous = Some(std::mem::replace(state, SessionState::Submitting));
            true
        });

        previous
            .map(|previous| Submission {
                machine: self,
                previous: Some(previous),
            })
            .ok_or(AuthError::Busy)
    }

    pub(crate) fn set(&self, state: SessionState) {
        self.tx.send_replace(state);
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new(SessionState::Anonymous)
    }
}

/// An in-flight submission. Dropping it unfinished (for example when the
/// future driving it is cancelled) puts the previous state back.
#[derive(Debug)]
#[must_use = "a submission left unfinished reverts on drop"]
pub struct Submission<'a> {
    machine: &'a SessionStateMachine,
    previous: Option<SessionState>,
}

impl Submission<'_> {
    pub fn authenticated(mut self) {
        self.previous = None;
        self.machine.set(SessionState::Authenticated);
    }

    pub fn failed(mut self, message: impl Into<String>) {
        self.previous = None;
        self.machine.set(SessionState::Failed(message.into()));
    }

    pub fn signed_out(mut self) {
        self.previous = None;
        self.machine.set(SessionState::Anonymous);
    }

    /// Ends the submission without changing the session, e.g. after a signup
    /// email was sent.
    pub fn restore(mut self) {
        if let Some(previous) = self.previous.take() {
            self.machine.set(previous);
        }
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.machine.set(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submission_is_refused() {
        let machine = SessionStateMachine::default();
        let first = machine.begin();
        assert!(first.is_ok());
        assert_eq!(machine.current(), SessionState::Submitting);

        assert!(matches!(machine.begin(), Err(AuthError::Busy)));

        if let Ok(first) = first {
            first.authenticated();
        }
        assert_eq!(machine.current(), SessionState::Authenticated);
    }

    #[test]
    fn failure_then_retry() {
        let machine = SessionStateMachine::default();
        if let Ok(submission) = machine.begin() {
            submission.failed("Invalid credentials");
        }
        assert_eq!(
            machine.current(),
            SessionState::Failed("Invalid credentials".to_string())
        );

        let retry = machine.begin();
        assert!(retry.is_ok());
        assert_eq!(machine.current(), SessionState::Submitting);
    }

    #[test]
    fn dropped_submission_reverts() {
        let machine = SessionStateMachine::new(SessionState::Failed("x".to_string()));
        {
            let _submission = machine.begin();
            assert!(machine.current().is_submitting());
        }
        assert_eq!(machine.current(), SessionState::Failed("x".to_string()));
    }

    #[test]
    fn restore_keeps_previous_state() {
        let machine = SessionStateMachine::default();
        if let Ok(submission) = machine.begin() {
            submission.restore();
        }
        assert_eq!(machine.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let machine = SessionStateMachine::default();
        let mut rx = machine.subscribe();
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);

        let submission = machine.begin();
        assert!(rx.changed().await.is_ok());
        assert_eq!(*rx.borrow_and_update(), SessionState::Submitting);

        if let Ok(submission) = submission {
            submission.authenticated();
        }
        assert!(rx.changed().await.is_ok());
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);
    }
}
