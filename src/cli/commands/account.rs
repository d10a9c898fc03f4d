use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGIN: &str = "login";
pub const CMD_IS_ADMIN: &str = "is-admin";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_APP_ID: &str = "app-id";
pub const ARG_USER_ID: &str = "user-id";

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email (case-sensitive)")
        .env("IDENTITY_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Account password")
        .env("IDENTITY_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand_required(true)
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Register a new account and print its id")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Authenticate and print an access token for an application")
                .arg(email_arg())
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_APP_ID)
                        .short('a')
                        .long("app-id")
                        .help("Calling application id")
                        .env("IDENTITY_APP_ID")
                        .required(true)
                        .value_parser(clap::value_parser!(i32)),
                ),
        )
        .subcommand(
            Command::new(CMD_IS_ADMIN)
                .about("Print whether an account is an administrator")
                .arg(
                    Arg::new(ARG_USER_ID)
                        .short('u')
                        .long("user-id")
                        .help("Account id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
}

/// Email and password shared by `register` and `login`.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// # Errors
    /// Returns an error if the email or password is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let email = matches
            .get_one::<String>(ARG_EMAIL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_EMAIL}"))?;
        let password = matches
            .get_one::<String>(ARG_PASSWORD)
            .cloned()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_PASSWORD}"))?;

        Ok(Self {
            email,
            password: SecretString::from(password),
        })
    }
}
