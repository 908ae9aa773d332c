use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
}

/// Ask the API to send a registration link.
/// # Errors
/// Returns the API error message if the request is refused.
pub async fn execute(args: Args) -> Result<()> {
    let bootstrap = args.globals.bootstrap()?;
    debug!("requesting registration email via {}", bootstrap.client().base_url());

    let sent = bootstrap.request_signup_email(&args.email).await?;
    println!("{}", sent.message);

    Ok(())
}
