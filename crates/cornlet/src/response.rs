//! Response accumulation and encoding.

use std::io;
use std::string::FromUtf8Error;

use crate::app::ResponseEvent;
use crate::bridge::codec::Frame;
use crate::bridge::protocol::ResponseMessage;

pub const DEFAULT_STATUS: u16 = 200;
pub const INTERNAL_ERROR: u16 = 500;

/// Response built up from an application's events.
///
/// A later start replaces status and headers; a later body replaces the body.
#[derive(Debug, Default)]
pub struct Response {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: ResponseEvent) {
        match event {
            ResponseEvent::Start { status, headers } => {
                self.status = Some(status);
                self.headers = headers;
            }
            ResponseEvent::Body { body } => {
                self.body = Some(body);
            }
        }
    }

    /// Finalize, defaulting status to 200 and body to empty.
    pub fn finish(self) -> Result<ResponseMessage, FromUtf8Error> {
        let body = match self.body {
            Some(bytes) => String::from_utf8(bytes)?,
            None => String::new(),
        };
        Ok(ResponseMessage {
            status: self.status.unwrap_or(DEFAULT_STATUS),
            body,
            headers: self.headers,
        })
    }
}

/// Synthetic 500 response carrying `message` as its body.
pub fn internal_error(message: impl Into<String>) -> ResponseMessage {
    ResponseMessage {
        status: INTERNAL_ERROR,
        body: message.into(),
        headers: Vec::new(),
    }
}

/// Serialize a response into a JSON frame.
pub fn encode(response: &ResponseMessage) -> io::Result<Frame> {
    let json =
        serde_json::to_vec(response).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Frame::json(json))
}
