//! Application calling convention.
//!
//! An [`App`] is called once per request with the [`Scope`], a [`Receive`]
//! handle for request input, and a [`Responder`] for response events. Each
//! [`Responder::send`] suspends the application until the adapter has applied
//! the event.

use tokio::sync::{mpsc, oneshot};

use crate::scope::Scope;

/// Failure raised by an application. Rendered with `Display` into the 500 body.
pub type AppError = anyhow::Error;

pub type AppResult = Result<(), AppError>;

/// Input event delivered by [`Receive::receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEvent {
    /// The request is available. Request bodies are not carried by the wire
    /// protocol, so this is the only event and it never has a body.
    Request,
}

/// Output event sent by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// Status line and headers.
    Start {
        status: u16,
        headers: Vec<(String, String)>,
    },
    /// Response body. Must be UTF-8.
    Body { body: Vec<u8> },
}

/// Request input handle.
#[derive(Debug, Default)]
pub struct Receive {
    _priv: (),
}

impl Receive {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn receive(&mut self) -> ReceiveEvent {
        ReceiveEvent::Request
    }
}

pub(crate) type EventTx = mpsc::Sender<(ResponseEvent, oneshot::Sender<()>)>;
pub(crate) type EventRx = mpsc::Receiver<(ResponseEvent, oneshot::Sender<()>)>;

/// Response output handle.
#[derive(Debug)]
pub struct Responder {
    tx: EventTx,
}

impl Responder {
    pub(crate) fn new(tx: EventTx) -> Self {
        Self { tx }
    }

    /// Hand an event to the adapter and wait until it has been applied.
    pub async fn send(&mut self, event: ResponseEvent) -> AppResult {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((event, ack_tx))
            .await
            .map_err(|_| anyhow::anyhow!("response channel closed"))?;
        ack_rx
            .await
            .map_err(|_| anyhow::anyhow!("response event was not acknowledged"))
    }

    pub async fn start(&mut self, status: u16, headers: Vec<(String, String)>) -> AppResult {
        self.send(ResponseEvent::Start { status, headers }).await
    }

    pub async fn body(&mut self, body: impl Into<Vec<u8>>) -> AppResult {
        self.send(ResponseEvent::Body { body: body.into() }).await
    }
}

/// Application invoked for each request.
///
/// Implementations are resolved once per connection and shared for its whole
/// lifetime, so any per-request state belongs inside `call`.
#[async_trait::async_trait]
pub trait App: Send + Sync + 'static {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut Receive,
        send: &mut Responder,
    ) -> AppResult;
}
