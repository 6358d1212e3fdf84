use tracing::debug;

use crate::auth::credentials::{Credential, CredentialConfig};
use crate::transport::{Connection, TransportError};

/// Presents the configured credential to the server.
///
/// Called only once a login check has reported the session unauthenticated.
/// Installing a ticket or pointing at a tickets file does not round-trip to
/// the server, so the caller re-checks the login state afterwards to learn
/// whether the credential was accepted.
pub async fn authenticate(
    conn: &mut dyn Connection,
    credential: &CredentialConfig,
) -> Result<(), TransportError> {
    match &credential.credential {
        Credential::Password {
            password,
            all_hosts,
        } => {
            debug!(user = %credential.username, all_hosts, "logging in with password");
            conn.login(password, *all_hosts).await?;
        }
        Credential::Ticket { value } => {
            debug!(user = %credential.username, "installing auth ticket");
            conn.set_auth_ticket(value);
        }
        Credential::TicketPath { path } => {
            let path = path.clone().or_else(|| conn.tickets_file_path());
            if let Some(path) = &path {
                debug!(user = %credential.username, path = %path.display(), "using tickets file");
                conn.set_tickets_file_path(path);
            }
        }
    }
    Ok(())
}
