//! In-process loopback runtime
//!
//! A `ClientContext` implementation backed by a local service registry.
//! Integration tests and the development binary run against it; production
//! deployments bind the real middleware by implementing `ClientContext`
//! out of tree.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::{
    BoxedContext, CallError, CallOptions, ClientContext, ContextFactory, TpError, TypedBuffer,
    DEFAULT_CALL_TIMEOUT,
};

/// A registered service handler
pub type Handler =
    Arc<dyn Fn(TypedBuffer) -> BoxFuture<'static, Result<TypedBuffer, TpError>> + Send + Sync>;

/// Name → handler table shared by all loopback contexts
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Handler>,
}

impl ServiceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under a name
    ///
    /// The handler receives the request buffer and returns the reply buffer
    /// or a backend error.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(TypedBuffer) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TypedBuffer, TpError>> + Send + 'static,
    {
        self.services
            .insert(name.into(), Arc::new(move |buf| Box::pin(handler(buf))));
    }

    fn handler(&self, name: &str) -> Option<Handler> {
        self.services.get(name).cloned()
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check whether no services are registered
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Factory producing loopback contexts over a shared registry
#[derive(Clone)]
pub struct LoopbackRuntime {
    registry: Arc<ServiceRegistry>,
}

impl LoopbackRuntime {
    /// Create a runtime over a service registry
    pub fn new(registry: ServiceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Create a runtime with no services (every call fails with no-entry)
    pub fn empty() -> Self {
        Self::new(ServiceRegistry::new())
    }
}

impl ContextFactory for LoopbackRuntime {
    fn create(&self) -> Result<BoxedContext, TpError> {
        Ok(Box::new(LoopbackContext {
            registry: Arc::clone(&self.registry),
        }))
    }
}

/// One loopback client context
pub struct LoopbackContext {
    registry: Arc<ServiceRegistry>,
}

#[async_trait]
impl ClientContext for LoopbackContext {
    async fn call(
        &mut self,
        service: &str,
        request: TypedBuffer,
        options: CallOptions,
    ) -> Result<TypedBuffer, CallError> {
        let handler = self
            .registry
            .handler(service)
            .ok_or_else(|| CallError::bare(TpError::no_entry(service)))?;

        let fut = handler(request);
        let result = match options.effective_timeout(DEFAULT_CALL_TIMEOUT) {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| CallError::bare(TpError::timeout(service)))?,
            None => fut.await,
        };

        result.map_err(CallError::bare)
    }

    async fn acall(
        &mut self,
        service: &str,
        request: TypedBuffer,
        _options: CallOptions,
    ) -> Result<(), CallError> {
        // Submit fails only when the service does not exist; the handler
        // outcome is discarded, matching fire-and-forget semantics.
        let handler = self
            .registry
            .handler(service)
            .ok_or_else(|| CallError::bare(TpError::no_entry(service)))?;

        let service = service.to_string();
        tokio::spawn(async move {
            if let Err(err) = handler(request).await {
                tracing::debug!(service = %service, error = %err, "async call failed");
            }
        });

        Ok(())
    }

    async fn terminate(&mut self) {}
}
