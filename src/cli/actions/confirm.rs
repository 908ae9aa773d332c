use crate::{
    cli::{actions::decode::TokenSource, globals::GlobalArgs},
    session::RegistrationRequest,
};
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub source: TokenSource,
    pub name: String,
    pub business_name: String,
    /// Overrides the email claimed by the token.
    pub email: Option<String>,
    pub password: SecretString,
}

/// Complete registration and store the token pair.
/// # Errors
/// Returns the inline message for a bad token, the API error message, or a
/// storage error.
pub async fn execute(args: Args) -> Result<()> {
    // a token that cannot be decoded blocks submission
    let token = args
        .source
        .resolve()
        .map_err(|err| anyhow!(err.user_message()))?;

    let email = args
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .unwrap_or_else(|| token.claimed_email().to_string());
    debug!("confirming registration");

    let bootstrap = args.globals.bootstrap()?;
    let request = RegistrationRequest {
        name: args.name,
        business_name: args.business_name,
        email,
        password: args.password.expose_secret().to_string(),
        token: token.as_str().to_string(),
    };
    let authenticated = bootstrap.confirm_registration(&request).await?;

    if let Some(message) = authenticated.message {
        println!("{message}");
    }

    Ok(())
}
