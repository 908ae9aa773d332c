use crate::{cli::globals::GlobalArgs, session::SessionState};
use anyhow::Result;

/// Print the profile of the signed-in user.
/// # Errors
/// Returns an error when no session is stored or the API refuses the token.
pub async fn whoami(globals: &GlobalArgs) -> Result<()> {
    let bootstrap = globals.bootstrap()?;
    let user = bootstrap.current_user().await?;

    println!("Welcome back, {}! <{}>", user.name, user.email);

    Ok(())
}

/// Renew the stored session.
/// # Errors
/// Returns an error when no session is stored or the API refuses the refresh token.
pub async fn refresh(globals: &GlobalArgs) -> Result<()> {
    let bootstrap = globals.bootstrap()?;
    bootstrap.refresh().await?;

    println!("Session renewed.");

    Ok(())
}

/// Forget the stored session.
/// # Errors
/// Returns an error if the session file cannot be written.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let bootstrap = globals.bootstrap()?;
    bootstrap.logout()?;

    println!("Signed out.");

    Ok(())
}

/// Report whether a session is stored.
/// # Errors
/// Returns an error if the session file cannot be read.
pub fn status(globals: &GlobalArgs) -> Result<()> {
    let bootstrap = globals.bootstrap()?;

    match bootstrap.state() {
        SessionState::Authenticated => println!(
            "Signed in (session stored in {}).",
            globals.session_file.display()
        ),
        _ => println!("Not signed in."),
    }

    Ok(())
}
