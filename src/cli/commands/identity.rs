use clap::{Arg, ArgMatches, Command};

use crate::identity::IdentityConfig;

pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_HASH_COST: &str = "hash-cost";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long("token-ttl")
                .help("Access token TTL in seconds")
                .env("IDENTITY_TOKEN_TTL")
                .default_value("3600")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_HASH_COST)
                .long("hash-cost")
                .help("Argon2 iteration count used for new password hashes")
                .env("IDENTITY_HASH_COST")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
}

/// Build a validated service configuration from matches.
///
/// # Errors
/// Returns an error if the ttl or cost is not positive.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<IdentityConfig> {
    let ttl = matches
        .get_one::<i64>(ARG_TOKEN_TTL)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_TOKEN_TTL}"))?;
    let cost = matches
        .get_one::<u32>(ARG_HASH_COST)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_HASH_COST}"))?;

    Ok(IdentityConfig::from_ttl_seconds(ttl, cost)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ConfigError, DEFAULT_HASH_COST, DEFAULT_TOKEN_TTL_SECONDS};
    use std::time::Duration;

    fn command() -> Command {
        with_args(Command::new("identity"))
    }

    #[test]
    fn defaults_match_library_defaults() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("IDENTITY_TOKEN_TTL", None::<&str>),
                ("IDENTITY_HASH_COST", None::<&str>),
            ],
            || {
                let matches = command().get_matches_from(vec!["identity"]);
                let config = parse(&matches)?;
                assert_eq!(
                    config.token_ttl(),
                    Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS)
                );
                assert_eq!(config.hash_cost(), DEFAULT_HASH_COST);
                Ok(())
            },
        )
    }

    #[test]
    fn rejects_non_positive_ttl() {
        temp_env::with_vars([("IDENTITY_TOKEN_TTL", None::<&str>)], || {
            let matches = command().get_matches_from(vec!["identity", "--token-ttl", "-1"]);
            let err = parse(&matches).err().map(|e| e.downcast::<ConfigError>().ok());
            assert_eq!(err, Some(Some(ConfigError::TokenTtl)));
        });
    }

    #[test]
    fn reads_env() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("IDENTITY_TOKEN_TTL", Some("120")),
                ("IDENTITY_HASH_COST", Some("4")),
            ],
            || {
                let matches = command().get_matches_from(vec!["identity"]);
                let config = parse(&matches)?;
                assert_eq!(config.token_ttl(), Duration::from_secs(120));
                assert_eq!(config.hash_cost(), 4);
                Ok(())
            },
        )
    }
}
