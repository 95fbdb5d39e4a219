//! Built-in `demo.main` applications.

use std::sync::Arc;

use serde_json::json;

use crate::app::{App, AppResult, Receive, Responder};
use crate::registry::{AppRef, AppRegistry};
use crate::scope::Scope;

pub const MODULE: &str = "demo.main";

pub fn register(registry: &mut AppRegistry) {
    registry
        .register(AppRef::new(MODULE, "app"), || Arc::new(HelloApp) as Arc<dyn App>)
        .register(AppRef::new(MODULE, "echo"), || Arc::new(EchoApp) as Arc<dyn App>)
        .register(AppRef::new(MODULE, "fail"), || Arc::new(FailApp) as Arc<dyn App>);
}

/// Plain-text greeting.
pub struct HelloApp;

#[async_trait::async_trait]
impl App for HelloApp {
    async fn call(
        &self,
        _scope: &Scope,
        receive: &mut Receive,
        send: &mut Responder,
    ) -> AppResult {
        receive.receive().await;
        send.start(
            200,
            vec![("content-type".to_string(), "text/plain".to_string())],
        )
        .await?;
        send.body("Hello, World!").await
    }
}

/// Echoes the request line and headers back as JSON.
pub struct EchoApp;

#[async_trait::async_trait]
impl App for EchoApp {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut Receive,
        send: &mut Responder,
    ) -> AppResult {
        receive.receive().await;
        let body = serde_json::to_vec(&json!({
            "method": scope.method,
            "path": scope.path,
            "headers": scope.headers,
        }))?;
        send.start(
            200,
            vec![("content-type".to_string(), "application/json".to_string())],
        )
        .await?;
        send.body(body).await
    }
}

/// Always fails; useful for checking that a host survives application errors.
pub struct FailApp;

#[async_trait::async_trait]
impl App for FailApp {
    async fn call(&self, scope: &Scope, _: &mut Receive, _: &mut Responder) -> AppResult {
        anyhow::bail!("demo failure for {} {}", scope.method, scope.path)
    }
}
