//! Local execution of model-requested function calls.
//!
//! Handlers never fail: whatever goes wrong inside a function is reported back
//! to the model as the call output text so the conversation can continue.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::types::{FunctionCall, InputItem};

/// A locally implemented function the model may call.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    /// Run the function with already-parsed arguments and return its output text.
    async fn call(&self, arguments: Value) -> String;
}

/// Adapter turning an async closure into a [`FunctionHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> FunctionHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    async fn call(&self, arguments: Value) -> String {
        (self.f)(arguments).await
    }
}

/// Output text for a call whose function is not registered.
pub fn not_implemented_output(name: &str) -> String {
    format!("tool_error=Function '{}' is not implemented.", name)
}

/// Dispatches function calls by name.
#[derive(Clone, Default)]
pub struct FunctionCallExecutor {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl FunctionCallExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn FunctionHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Execute one call and return its output text.
    pub async fn execute(&self, call: &FunctionCall) -> String {
        let Some(handler) = self.handlers.get(&call.name) else {
            warn!(function = %call.name, call_id = %call.call_id, "model called an unknown function");
            return not_implemented_output(&call.name);
        };

        debug!(function = %call.name, call_id = %call.call_id, "executing function call");
        let output = handler.call(call.arguments()).await;
        debug!(
            function = %call.name,
            call_id = %call.call_id,
            output_chars = output.chars().count(),
            "function call finished"
        );
        output
    }

    /// Execute every call concurrently; outputs keep the order of `calls`.
    pub async fn execute_all(&self, calls: &[FunctionCall]) -> Vec<InputItem> {
        let outputs = join_all(calls.iter().map(|call| self.execute(call))).await;
        calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| InputItem::function_call_output(call.call_id.clone(), output))
            .collect()
    }
}

impl fmt::Debug for FunctionCallExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCallExecutor")
            .field("functions", &self.names())
            .finish()
    }
}
