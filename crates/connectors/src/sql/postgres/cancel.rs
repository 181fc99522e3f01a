use crate::sql::{error::ConnectorError, postgres::utils::tls_connector};
use tokio::runtime::Handle;
use tokio_postgres::{CancelToken, Client, NoTls, config::SslMode};
use tracing::{info, warn};

/// Sends a cancel request for the session's running statement if dropped
/// while still armed, which happens when the query future is abandoned
/// (timeout or shutdown) before the server answered.
pub(crate) struct CancelOnDrop {
    token: Option<CancelToken>,
    ssl_mode: SslMode,
}

impl CancelOnDrop {
    pub(crate) fn arm(client: &Client, ssl_mode: SslMode) -> Self {
        CancelOnDrop {
            token: Some(client.cancel_token()),
            ssl_mode,
        }
    }

    /// The query finished; nothing to cancel.
    pub(crate) fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!("No runtime to cancel the abandoned Postgres query on");
            return;
        };
        let ssl_mode = self.ssl_mode;
        handle.spawn(async move {
            match cancel(&token, ssl_mode).await {
                Ok(()) => info!("Cancelled abandoned Postgres query"),
                Err(error) => warn!(%error, "Failed to cancel abandoned Postgres query"),
            }
        });
    }
}

/// Cancel requests go over a fresh connection, negotiated like the session.
async fn cancel(token: &CancelToken, ssl_mode: SslMode) -> Result<(), ConnectorError> {
    match ssl_mode {
        SslMode::Disable => token.cancel_query(NoTls).await?,
        SslMode::Prefer => {
            if let Err(error) = token.cancel_query(tls_connector()?).await {
                warn!(%error, "TLS cancel request failed, retrying without TLS");
                token.cancel_query(NoTls).await?;
            }
        }
        _ => token.cancel_query(tls_connector()?).await?,
    }
    Ok(())
}
