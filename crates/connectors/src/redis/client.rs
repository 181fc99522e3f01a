use crate::redis::{
    command::{Cmd, expect_bulk, expect_integer, expect_ok},
    error::RedisError,
};
use futures_util::{SinkExt, StreamExt};
use redis_protocol::{codec::Resp2, resp2::types::BytesFrame};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpStream, sync::Mutex, time};
use tokio_util::codec::Framed;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type Connection = Framed<TcpStream, Resp2>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisOptions {
    /// `host:port`
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
}

impl RedisOptions {
    pub fn new(addr: impl Into<String>) -> Self {
        RedisOptions {
            addr: addr.into(),
            password: None,
            db: 0,
        }
    }
}

/// Single-connection RESP2 client shared by all tasks.
///
/// Commands are serialized through the connection mutex. The connection is
/// taken out of its slot for the duration of a command and only put back
/// after a complete reply, so a command that is cancelled or fails midway
/// leaves the slot empty and the next command dials a fresh connection
/// instead of reading a stale reply.
#[derive(Clone)]
pub struct RedisClient {
    options: Arc<RedisOptions>,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl RedisClient {
    /// Connects eagerly so bad addresses or credentials fail at startup.
    pub async fn connect(options: RedisOptions) -> Result<Self, RedisError> {
        let conn = dial(&options).await?;
        info!(addr = %options.addr, db = options.db, "Connected to Redis");
        Ok(RedisClient {
            options: Arc::new(options),
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    pub fn options(&self) -> &RedisOptions {
        &self.options
    }

    async fn execute(&self, cmd: Cmd) -> Result<BytesFrame, RedisError> {
        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => {
                debug!(addr = %self.options.addr, "Redis connection missing, reconnecting");
                dial(&self.options).await?
            }
        };
        let reply = roundtrip(&mut conn, cmd).await?;
        *slot = Some(conn);
        Ok(reply)
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let reply = self.execute(Cmd::new("PING")).await?;
        expect_ok("PING", reply)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let reply = self.execute(Cmd::new("GET").arg(key)).await?;
        expect_bulk("GET", reply)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), RedisError> {
        let reply = self.execute(Cmd::new("SET").arg(key).arg(value)).await?;
        expect_ok("SET", reply)
    }

    /// Returns how many of the keys existed.
    pub async fn del(&self, keys: &[&str]) -> Result<i64, RedisError> {
        let cmd = keys.iter().fold(Cmd::new("DEL"), |cmd, key| cmd.arg(key));
        let reply = self.execute(cmd).await?;
        expect_integer("DEL", reply)
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, RedisError> {
        let reply = self.execute(Cmd::new("HGET").arg(key).arg(field)).await?;
        expect_bulk("HGET", reply)
    }

    /// Returns the number of newly created fields.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<i64, RedisError> {
        let reply = self
            .execute(Cmd::new("HSET").arg(key).arg(field).arg(value))
            .await?;
        expect_integer("HSET", reply)
    }

    /// Appends to the tail; returns the new list length.
    pub async fn rpush(&self, key: &str, value: &str) -> Result<i64, RedisError> {
        let reply = self.execute(Cmd::new("RPUSH").arg(key).arg(value)).await?;
        expect_integer("RPUSH", reply)
    }

    pub async fn sadd(&self, key: &str, member: &str) -> Result<i64, RedisError> {
        let reply = self.execute(Cmd::new("SADD").arg(key).arg(member)).await?;
        expect_integer("SADD", reply)
    }

    pub async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<i64, RedisError> {
        let reply = self
            .execute(Cmd::new("ZADD").arg(key).arg(score.to_string()).arg(member))
            .await?;
        expect_integer("ZADD", reply)
    }

    /// Appends an entry with a server-generated id and returns that id.
    pub async fn xadd(&self, key: &str, fields: &[(String, String)]) -> Result<String, RedisError> {
        let cmd = fields
            .iter()
            .fold(Cmd::new("XADD").arg(key).arg("*"), |cmd, (name, value)| {
                cmd.arg(name).arg(value)
            });
        let reply = self.execute(cmd).await?;
        expect_bulk("XADD", reply)?.ok_or_else(|| RedisError::UnexpectedReply {
            command: "XADD".to_string(),
            reply: "nil".to_string(),
        })
    }
}

async fn dial(options: &RedisOptions) -> Result<Connection, RedisError> {
    let socket = time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&options.addr))
        .await
        .map_err(|_| RedisError::ConnectTimeout {
            addr: options.addr.clone(),
        })??;
    socket.set_nodelay(true)?;
    let mut conn = Framed::new(socket, Resp2::default());

    if let Some(password) = options.password.as_deref().filter(|p| !p.is_empty()) {
        let reply = roundtrip(&mut conn, Cmd::new("AUTH").arg(password)).await?;
        expect_ok("AUTH", reply)?;
    }
    if options.db != 0 {
        let reply = roundtrip(&mut conn, Cmd::new("SELECT").arg(options.db.to_string())).await?;
        expect_ok("SELECT", reply)?;
    }
    Ok(conn)
}

async fn roundtrip(conn: &mut Connection, cmd: Cmd) -> Result<BytesFrame, RedisError> {
    conn.send(cmd.into_frame())
        .await
        .map_err(|err| RedisError::Protocol(err.to_string()))?;
    match conn.next().await {
        Some(Ok(frame)) => Ok(frame),
        Some(Err(err)) => Err(RedisError::Protocol(err.to_string())),
        None => Err(RedisError::ConnectionClosed),
    }
}
