use crate::sql::error::ConnectorError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::time::Duration;
use tokio_postgres::{
    Client, Config, NoTls, Socket,
    config::SslMode,
    tls::{MakeTlsConnect, TlsConnect},
};
use tracing::{debug, error, warn};

const APPLICATION_NAME: &str = "courier";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Parses a libpq-style connection string (`host=... dbname=...`) or a
/// `postgres://` URL, filling in the application name and a connect timeout
/// when the string does not set them.
pub fn parse_config(conninfo: &str) -> Result<Config, ConnectorError> {
    let mut config = conninfo
        .parse::<Config>()
        .map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
    if config.get_application_name().is_none() {
        config.application_name(APPLICATION_NAME);
    }
    if config.get_connect_timeout().is_none() {
        config.connect_timeout(CONNECT_TIMEOUT);
    }
    Ok(config)
}

/// Connects honouring the configured `sslmode`. `prefer` falls back to a
/// plain connection when the TLS handshake fails.
pub async fn connect(config: &Config) -> Result<Client, ConnectorError> {
    match config.get_ssl_mode() {
        SslMode::Disable => establish(config, NoTls).await,
        SslMode::Prefer => match establish(config, tls_connector()?).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                establish(config, NoTls).await
            }
        },
        _ => establish(config, tls_connector()?).await,
    }
}

pub async fn connect_client(conninfo: &str) -> Result<Client, ConnectorError> {
    connect(&parse_config(conninfo)?).await
}

pub(crate) fn tls_connector() -> Result<MakeTlsConnector, ConnectorError> {
    Ok(MakeTlsConnector::new(TlsConnector::builder().build()?))
}

/// Opens the session and drives its connection future on a background task.
async fn establish<T>(config: &Config, tls: T) -> Result<Client, ConnectorError>
where
    T: MakeTlsConnect<Socket> + Send + 'static,
    T::Stream: Send + 'static,
    T::TlsConnect: Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        match connection.await {
            Ok(()) => debug!("Postgres connection closed"),
            Err(err) => error!(%err, "Postgres connection error"),
        }
    });
    Ok(client)
}
