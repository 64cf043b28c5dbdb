//! Tuning knobs for loaders and the schema.

use std::time::Duration;

/// Configuration shared by every loader in a [`Loaders`](crate::registry::Loaders) registry.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Time a worker waits after the first op of a frame before draining its queue.
    ///
    /// Defaults to 1ms. `None` only yields to the scheduler once, which is enough on a
    /// current-thread runtime but lets a multi-thread runtime split sibling loads across batches.
    pub batch_delay: Option<Duration>,

    /// Upper bound on a single batch function call. A batch exceeding it is rejected as a whole.
    pub fetch_timeout: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_delay: Some(Duration::from_millis(1)), fetch_timeout: None }
    }
}

impl LoaderConfig {
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

/// Limits applied by the schema engine before any resolver runs.
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Maximum selection depth of a query.
    pub max_depth: usize,

    /// Maximum query complexity, unlimited when `None`.
    pub max_complexity: Option<usize>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self { max_depth: 5, max_complexity: None }
    }
}

impl SchemaConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_complexity(mut self, max_complexity: usize) -> Self {
        self.max_complexity = Some(max_complexity);
        self
    }
}
