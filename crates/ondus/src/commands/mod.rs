//! Command handlers, one module per command group.

pub mod list;
pub mod tap;
pub mod tree;

use ondus_api::Session;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Open a session from config + flags and exchange the refresh token up
/// front, so a bad token is reported instead of showing an empty tree.
pub async fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let resolved = config::resolve(global)?;
    let session = Session::new(resolved.refresh_token, &resolved.session)?;

    tracing::debug!(base_url = %session.base_url(), "authenticating");
    if !session.get_access_token().await {
        return Err(CliError::AuthFailed);
    }
    Ok(session)
}

pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Tree => tree::handle(session, global).await,
        Command::Locations => list::locations(session, global).await,
        Command::Rooms => list::rooms(session, global).await,
        Command::Appliances => list::appliances(session, global).await,
        Command::Tap(args) => tap::handle(session, args, global).await,
        // Handled in main before a session is opened.
        Command::Completions(_) => Ok(()),
    }
}
