use crate::sql::{
    error::DbError,
    postgres::{
        cancel::CancelOnDrop,
        coercion::coerce_param,
        params::PgParamStore,
        row::to_row,
        utils::{connect, parse_config},
    },
};
use model::{core::value::Value, records::row::Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, Config};
use tracing::{debug, warn};

/// PostgreSQL sessions used as the row source for every task.
///
/// Each query checks a session out for its whole duration, so a cancel
/// request issued for an abandoned query reaches that query and no other.
/// Idle sessions are reused; closed ones are dropped at checkout and replaced
/// by a fresh connection, so a database restart costs one failed run instead
/// of all of them.
#[derive(Clone)]
pub struct PgAdapter {
    config: Arc<Config>,
    idle: Arc<Mutex<Vec<Client>>>,
}

impl PgAdapter {
    pub async fn connect(conninfo: &str) -> Result<Self, DbError> {
        let config = parse_config(conninfo)?;
        let client = connect(&config).await?;
        Ok(PgAdapter {
            config: Arc::new(config),
            idle: Arc::new(Mutex::new(vec![client])),
        })
    }

    async fn checkout(&self) -> Result<Client, DbError> {
        loop {
            let parked = self.idle.lock().await.pop();
            match parked {
                Some(client) if !client.is_closed() => return Ok(client),
                Some(_) => warn!("Postgres connection is closed, reconnecting"),
                None => return Ok(connect(&self.config).await?),
            }
        }
    }

    async fn checkin(&self, client: Client) {
        if !client.is_closed() {
            self.idle.lock().await.push(client);
        }
    }

    /// Sessions currently parked for reuse.
    pub async fn idle_sessions(&self) -> usize {
        self.idle.lock().await.len()
    }

    /// Runs a parameterized query. Arguments are coerced to the parameter
    /// types the server reports for the prepared statement.
    ///
    /// Dropping the returned future before it completes cancels the statement
    /// on the server and discards the session.
    pub async fn query_rows(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
        let client = self.checkout().await?;
        let in_flight = CancelOnDrop::arm(&client, self.config.get_ssl_mode());
        let result = run_query(&client, sql, args).await;
        in_flight.disarm();
        self.checkin(client).await;
        result
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        let client = self.checkout().await?;
        client.simple_query("SELECT 1").await?;
        self.checkin(client).await;
        Ok(())
    }
}

async fn run_query(client: &Client, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
    let statement = client.prepare(sql).await?;

    let param_types = statement.params();
    if param_types.len() != args.len() {
        return Err(DbError::ParamCount {
            expected: param_types.len(),
            actual: args.len(),
        });
    }

    let params = args
        .iter()
        .zip(param_types)
        .enumerate()
        .map(|(idx, (value, ty))| coerce_param(idx, value, ty))
        .collect::<Result<Vec<_>, _>>()?;
    let bindings = PgParamStore::new(params);

    let rows = client.query(&statement, &bindings.as_refs()).await?;
    debug!(rows = rows.len(), "Postgres query returned");
    Ok(rows.iter().map(to_row).collect())
}
