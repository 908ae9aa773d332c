use clap::{Arg, ArgGroup, Command};

pub const CMD_SIGNUP: &str = "signup";
pub const CMD_DECODE: &str = "decode";
pub const CMD_CONFIRM: &str = "confirm";
pub const CMD_LOGIN: &str = "login";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_REFRESH: &str = "refresh";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_STATUS: &str = "status";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TOKEN: &str = "token";
pub const ARG_LINK: &str = "link";
pub const ARG_NAME: &str = "name";
pub const ARG_BUSINESS_NAME: &str = "business-name";

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email address")
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("ZIPLY_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn token_source_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN)
                .long(ARG_TOKEN)
                .help("Signup token, base64url(email):suffix"),
        )
        .arg(
            Arg::new(ARG_LINK)
                .long(ARG_LINK)
                .help("Confirmation link from the registration email"),
        )
        .group(
            ArgGroup::new("token-source")
                .args([ARG_TOKEN, ARG_LINK])
                .required(true),
        )
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        Command::new(CMD_SIGNUP)
            .about("Request a registration email")
            .arg(email_arg().required(true)),
        token_source_args(
            Command::new(CMD_DECODE).about("Show the email claimed by a signup token"),
        ),
        token_source_args(
            Command::new(CMD_CONFIRM)
                .about("Complete registration with the token from the email link"),
        )
        .arg(
            Arg::new(ARG_NAME)
                .short('n')
                .long(ARG_NAME)
                .help("Your name")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BUSINESS_NAME)
                .short('b')
                .long(ARG_BUSINESS_NAME)
                .help("Business name")
                .required(true),
        )
        .arg(email_arg().help("Account email address (default: the email claimed by the token)"))
        .arg(password_arg()),
        Command::new(CMD_LOGIN)
            .about("Sign in with email and password")
            .arg(email_arg().required(true))
            .arg(password_arg()),
        Command::new(CMD_WHOAMI).about("Show the signed-in user"),
        Command::new(CMD_REFRESH).about("Renew the stored session"),
        Command::new(CMD_LOGOUT).about("Forget the stored session"),
        Command::new(CMD_STATUS).about("Show whether a session is stored"),
    ]
}
