pub mod confirm;
pub mod decode;
pub mod login;
pub mod session;
pub mod signup;

// Internal "interpreter" for `Action`, kept apart so this file stays small.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Signup(signup::Args),
    Decode(decode::Args),
    Confirm(confirm::Args),
    Login(login::Args),
    WhoAmI(GlobalArgs),
    Refresh(GlobalArgs),
    Logout(GlobalArgs),
    Status(GlobalArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
