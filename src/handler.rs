//! Request entry point: one fresh loader registry per executed GraphQL request.

use std::sync::Arc;

use async_graphql::{Request, Response};
use tracing_futures::Instrument;

use crate::config::{LoaderConfig, SchemaConfig};
use crate::registry::{Loaders, StoreContext};
use crate::schema::{build_schema, AppSchema};
use crate::store::DataStore;

/// Executes GraphQL requests against a store.
///
/// The schema and the store are shared by every request. Each call to
/// [`RequestHandler::execute`] builds its own [`Loaders`], attaches it to the request, and drops
/// it (aborting the loader workers) when the response is produced.
#[derive(Clone)]
pub struct RequestHandler {
    schema: AppSchema,
    store: StoreContext,
    loader_config: LoaderConfig,
}

impl RequestHandler {
    pub fn new<S: DataStore>(store: Arc<S>) -> Self {
        Self::with_config(store, &SchemaConfig::default(), LoaderConfig::default())
    }

    pub fn with_config<S: DataStore>(
        store: Arc<S>,
        schema_config: &SchemaConfig,
        loader_config: LoaderConfig,
    ) -> Self {
        Self { schema: build_schema(schema_config), store, loader_config }
    }

    pub fn schema(&self) -> &AppSchema {
        &self.schema
    }

    /// Runs one request. Failures are reported in the response's error list, next to any
    /// partial data.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request: Request = request.into();
        let span = tracing::info_span!("graphql", operation = ?request.operation_name);
        let loaders = Loaders::new(self.store.clone(), &self.loader_config);
        let request = request.data(self.store.clone()).data(loaders);

        let response = self.schema.execute(request).instrument(span.clone()).await;
        if !response.errors.is_empty() {
            span.in_scope(|| {
                tracing::debug!(errors = response.errors.len(), "request finished with errors")
            });
        }
        response
    }
}
