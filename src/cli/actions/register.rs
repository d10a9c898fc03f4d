use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

/// Register the account and print its id.
///
/// # Errors
/// Returns an error if the account exists or the store fails.
pub async fn handle(args: Args) -> Result<()> {
    let service = super::service(&args.globals).await?;
    let id = service
        .register(&args.email, args.password.expose_secret())
        .await
        .map_err(super::report)?;

    println!("{id}");

    Ok(())
}
