use crate::{cli::globals::GlobalArgs, session::LoginRequest};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

/// Sign in and store the token pair.
/// # Errors
/// Returns the API error message, or a storage error.
pub async fn execute(args: Args) -> Result<()> {
    let bootstrap = args.globals.bootstrap()?;

    let request = LoginRequest {
        email: args.email.trim().to_string(),
        password: args.password.expose_secret().to_string(),
    };
    let authenticated = bootstrap.login(&request).await?;

    println!(
        "{}",
        authenticated
            .message
            .as_deref()
            .unwrap_or("Signed in.")
    );

    Ok(())
}
