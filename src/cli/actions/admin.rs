use anyhow::Result;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub user_id: i64,
}

/// Print `true` or `false` for the account's administrator flag.
///
/// # Errors
/// Returns an error if the account does not exist or the store fails.
pub async fn handle(args: Args) -> Result<()> {
    let service = super::service(&args.globals).await?;
    let is_admin = service.is_admin(args.user_id).await.map_err(super::report)?;

    println!("{is_admin}");

    Ok(())
}
