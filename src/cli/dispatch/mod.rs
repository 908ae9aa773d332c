use crate::cli::{
    actions::{confirm, decode, decode::TokenSource, login, signup, Action},
    commands::{
        api,
        auth::{
            ARG_BUSINESS_NAME, ARG_EMAIL, ARG_LINK, ARG_NAME, ARG_PASSWORD, ARG_TOKEN, CMD_CONFIRM,
            CMD_DECODE, CMD_LOGIN, CMD_LOGOUT, CMD_REFRESH, CMD_SIGNUP, CMD_STATUS, CMD_WHOAMI,
        },
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    // decoding is local; it needs neither the API nor the session file
    if name == CMD_DECODE {
        return Ok(Action::Decode(decode::Args {
            source: token_source(sub)?,
        }));
    }

    let globals = global_args(sub)?;

    match name {
        CMD_SIGNUP => Ok(Action::Signup(signup::Args {
            globals,
            email: required(sub, ARG_EMAIL)?,
        })),
        CMD_CONFIRM => Ok(Action::Confirm(confirm::Args {
            globals,
            source: token_source(sub)?,
            name: required(sub, ARG_NAME)?,
            business_name: required(sub, ARG_BUSINESS_NAME)?,
            email: sub.get_one::<String>(ARG_EMAIL).cloned(),
            password: password(sub)?,
        })),
        CMD_LOGIN => Ok(Action::Login(login::Args {
            globals,
            email: required(sub, ARG_EMAIL)?,
            password: password(sub)?,
        })),
        CMD_WHOAMI => Ok(Action::WhoAmI(globals)),
        CMD_REFRESH => Ok(Action::Refresh(globals)),
        CMD_LOGOUT => Ok(Action::Logout(globals)),
        CMD_STATUS => Ok(Action::Status(globals)),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn global_args(matches: &ArgMatches) -> Result<GlobalArgs> {
    let options = api::Options::parse(matches)?;
    GlobalArgs::new(options.api_url, options.session_file, options.timeout_seconds)
}

fn required(matches: &ArgMatches, arg: &str) -> Result<String> {
    matches
        .get_one::<String>(arg)
        .cloned()
        .with_context(|| format!("missing required argument: --{arg}"))
}

fn password(matches: &ArgMatches) -> Result<SecretString> {
    required(matches, ARG_PASSWORD).map(SecretString::from)
}

fn token_source(matches: &ArgMatches) -> Result<TokenSource> {
    if let Some(token) = matches.get_one::<String>(ARG_TOKEN) {
        return Ok(TokenSource::Token(token.clone()));
    }

    matches
        .get_one::<String>(ARG_LINK)
        .map(|link| TokenSource::Link(link.clone()))
        .with_context(|| format!("missing required argument: --{ARG_TOKEN} or --{ARG_LINK}"))
}
