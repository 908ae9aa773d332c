use crate::cli::actions::{confirm, decode, login, session, signup, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Signup(args) => signup::execute(args).await,
        Action::Decode(args) => decode::execute(&args),
        Action::Confirm(args) => confirm::execute(args).await,
        Action::Login(args) => login::execute(args).await,
        Action::WhoAmI(globals) => session::whoami(&globals).await,
        Action::Refresh(globals) => session::refresh(&globals).await,
        Action::Logout(globals) => session::logout(&globals),
        Action::Status(globals) => session::status(&globals),
    }
}
