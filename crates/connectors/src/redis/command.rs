use crate::redis::error::RedisError;
use bytes::Bytes;
use redis_protocol::resp2::types::BytesFrame;

/// A command as an array of bulk strings.
#[derive(Debug, Clone)]
pub struct Cmd {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Cmd {
    pub fn new(name: &'static str) -> Self {
        Cmd {
            name,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn into_frame(self) -> BytesFrame {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(BytesFrame::BulkString(Bytes::from_static(
            self.name.as_bytes(),
        )));
        parts.extend(self.args.into_iter().map(BytesFrame::BulkString));
        BytesFrame::Array(parts)
    }
}

/// Turns error replies into `RedisError::Server`; everything else passes.
pub(crate) fn check_reply(command: &str, reply: BytesFrame) -> Result<BytesFrame, RedisError> {
    match reply {
        BytesFrame::Error(message) => Err(RedisError::Server {
            command: command.to_string(),
            message: message.to_string(),
        }),
        other => Ok(other),
    }
}

pub(crate) fn expect_ok(command: &str, reply: BytesFrame) -> Result<(), RedisError> {
    match check_reply(command, reply)? {
        BytesFrame::SimpleString(s) if s.as_ref() == b"OK" || s.as_ref() == b"PONG" => Ok(()),
        other => Err(unexpected(command, &other)),
    }
}

pub(crate) fn expect_integer(command: &str, reply: BytesFrame) -> Result<i64, RedisError> {
    match check_reply(command, reply)? {
        BytesFrame::Integer(n) => Ok(n),
        other => Err(unexpected(command, &other)),
    }
}

pub(crate) fn expect_bulk(command: &str, reply: BytesFrame) -> Result<Option<String>, RedisError> {
    match check_reply(command, reply)? {
        BytesFrame::Null => Ok(None),
        BytesFrame::BulkString(bytes) | BytesFrame::SimpleString(bytes) => {
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        other => Err(unexpected(command, &other)),
    }
}

fn unexpected(command: &str, reply: &BytesFrame) -> RedisError {
    RedisError::UnexpectedReply {
        command: command.to_string(),
        reply: format!("{reply:?}"),
    }
}
