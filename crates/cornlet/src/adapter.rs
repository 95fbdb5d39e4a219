//! Handler adapter: runs an [`App`] for one request and collects its response.
//!
//! The application future and the event collector are polled together on the
//! current task. Every [`ResponseEvent`](crate::app::ResponseEvent) is applied
//! to the [`Response`] and acknowledged before the application resumes.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::app::{App, AppError, EventRx, Receive, Responder};
use crate::bridge::protocol::ResponseMessage;
use crate::response::{self, Response};
use crate::scope::Scope;

/// Why an application failed to produce a response.
#[derive(Debug, thiserror::Error)]
pub enum AppFailure {
    #[error("{0}")]
    Raised(AppError),

    #[error("{0}")]
    Panicked(String),

    #[error("response body is not valid UTF-8: {0}")]
    InvalidBody(#[from] std::string::FromUtf8Error),
}

impl AppFailure {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "application panicked".to_string()
        };
        Self::Panicked(message)
    }
}

impl From<AppFailure> for ResponseMessage {
    fn from(failure: AppFailure) -> Self {
        response::internal_error(failure.to_string())
    }
}

/// Run `app` against `scope` and return the accumulated response.
pub async fn invoke(app: &dyn App, scope: &Scope) -> Result<ResponseMessage, AppFailure> {
    let (tx, rx) = mpsc::channel(1);

    let run = async move {
        let mut receive = Receive::new();
        let mut responder = Responder::new(tx);
        let outcome = AssertUnwindSafe(app.call(scope, &mut receive, &mut responder))
            .catch_unwind()
            .await;
        // Closing the channel ends the collector.
        drop(responder);
        outcome
    };

    let (outcome, response) = tokio::join!(run, collect(rx));

    match outcome {
        Ok(Ok(())) => Ok(response.finish()?),
        Ok(Err(e)) => Err(AppFailure::Raised(e)),
        Err(panic) => Err(AppFailure::from_panic(panic)),
    }
}

/// Run `app`, substituting a 500 response for any failure.
pub async fn dispatch(app: &dyn App, scope: &Scope) -> ResponseMessage {
    match invoke(app, scope).await {
        Ok(response) => response,
        Err(failure) => {
            tracing::warn!(error = %failure, "Application failed, responding 500");
            failure.into()
        }
    }
}

async fn collect(mut rx: EventRx) -> Response {
    let mut response = Response::new();
    while let Some((event, ack)) = rx.recv().await {
        tracing::trace!(?event, "Response event");
        response.apply(event);
        let _ = ack.send(());
    }
    response
}
