use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any SQL driver error.
    #[error("SQL error: {0}")]
    Sql(#[from] tokio_postgres::Error),

    /// The connection could not be (re)established.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectorError),

    /// A bound argument could not be converted to the parameter's SQL type.
    #[error("Cannot bind {value:?} as parameter ${index} of type {sql_type}")]
    Coercion {
        index: usize,
        value: String,
        sql_type: String,
    },

    /// The statement expects a different number of parameters than supplied.
    #[error("Statement expects {expected} parameters, got {actual}")]
    ParamCount { expected: usize, actual: usize },
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}
