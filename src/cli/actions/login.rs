use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub app_id: i32,
}

/// Authenticate and print a token for `app_id`.
///
/// # Errors
/// Returns an error on invalid credentials, an unknown application, or store failure.
pub async fn handle(args: Args) -> Result<()> {
    let service = super::service(&args.globals).await?;
    let token = service
        .login(&args.email, args.password.expose_secret(), args.app_id)
        .await
        .map_err(super::report)?;

    println!("{token}");

    Ok(())
}
