use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug, Clone)]
pub struct Options {
    pub api_url: String,
    pub session_file: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
}

impl Options {
    /// Parse API and storage arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_API_URL}"))?;

        Ok(Self {
            api_url,
            session_file: matches.get_one::<PathBuf>(ARG_SESSION_FILE).cloned(),
            timeout_seconds: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the accounts API")
                .env("ZIPLY_API_URL")
                .default_value("http://localhost:8000")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("Where the access/refresh tokens are stored")
                .long_help(
                    "Where the access/refresh tokens are stored. Defaults to ziply/session.json under the local data directory. Tokens are stored unencrypted; the file is created owner-only.",
                )
                .env("ZIPLY_SESSION_FILE")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds (default: no timeout)")
                .env("ZIPLY_TIMEOUT_SECONDS")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
