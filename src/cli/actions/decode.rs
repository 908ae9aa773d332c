use crate::session::{DecodeError, SignupToken};
use anyhow::{anyhow, Result};

/// Where the signup token comes from: pasted directly or inside the email link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Token(String),
    Link(String),
}

impl TokenSource {
    /// # Errors
    /// Returns a [`DecodeError`] if the token is missing or malformed.
    pub fn resolve(&self) -> Result<SignupToken, DecodeError> {
        match self {
            Self::Token(token) => SignupToken::parse(token),
            Self::Link(link) => SignupToken::from_link(link),
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub source: TokenSource,
}

/// Print the email claimed by the token.
/// # Errors
/// Returns the inline message of the decode failure.
pub fn execute(args: &Args) -> Result<()> {
    let token = args
        .source
        .resolve()
        .map_err(|err| anyhow!(err.user_message()))?;

    println!("{}", token.claimed_email());

    Ok(())
}
