//! Map validated CLI matches to an action.

use crate::cli::actions::{Action, admin, login, register};
use crate::cli::commands::{self, account, identity};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result, bail};
use secrecy::SecretString;

/// Build the action for the selected subcommand.
///
/// # Errors
/// Returns an error if required arguments are missing or the configuration is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .filter(|v| !v.trim().is_empty())
        .context("missing required argument: --dsn")?;
    let config = identity::parse(matches)?;
    let globals = GlobalArgs::new(SecretString::from(dsn), config);

    match matches.subcommand() {
        Some((account::CMD_REGISTER, sub)) => {
            let credentials = account::Credentials::parse(sub)?;
            Ok(Action::Register(register::Args {
                globals,
                email: credentials.email,
                password: credentials.password,
            }))
        }
        Some((account::CMD_LOGIN, sub)) => {
            let credentials = account::Credentials::parse(sub)?;
            let app_id = sub
                .get_one::<i32>(account::ARG_APP_ID)
                .copied()
                .context("missing required argument: --app-id")?;
            Ok(Action::Login(login::Args {
                globals,
                email: credentials.email,
                password: credentials.password,
                app_id,
            }))
        }
        Some((account::CMD_IS_ADMIN, sub)) => {
            let user_id = sub
                .get_one::<i64>(account::ARG_USER_ID)
                .copied()
                .context("missing required argument: --user-id")?;
            Ok(Action::IsAdmin(admin::Args { globals, user_id }))
        }
        Some((name, _)) => bail!("unknown subcommand: {name}"),
        None => bail!("missing subcommand"),
    }
}
