use std::ops::Drop;
use std::{collections::HashMap, fmt::Debug};

use tokio::sync::{mpsc, oneshot};
use tracing_futures::Instrument;

use crate::{
    batch_function::BatchFunction,
    config::LoaderConfig,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users can call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying
/// resource or cache. The cache can be cleared with calls to [`Loader::clear`],
/// [`Loader::clear_many`] and [`Loader::clear_all`], and values can be added to the cache
/// out-of-band through the use of [`Loader::prime`] and [`Loader::prime_many`].
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. Callers can invoke the
/// `Loader` from multiple parallel tasks, and the loader will enqueue the requested operations on
/// the request queue for processing by its `LoaderWorker`. The worker processes the requests
/// sequentially and provides results via response oneshot channels back to the Loader.
///
/// A loader and its cache belong to a single request. Dropping the loader aborts its worker;
/// callers still waiting receive [`LoadError::Closed`].
pub struct Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
}

impl<K, V> Drop for Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + std::hash::Hash + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Creates a new Loader for the provided BatchFunction and Context type.
    ///
    /// Note: the batch function is passed in as a marker for type inference.
    ///
    /// Spawns the worker on the current tokio runtime, so this must be called from within one.
    pub fn new<F, ContextT>(batch_fn: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        Self::with_config(batch_fn, context, LoaderConfig::default())
    }

    /// Like [`Loader::new`], with explicit batching and timeout settings.
    pub fn with_config<F, ContextT>(_: F, context: ContextT, config: LoaderConfig) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = tracing::trace_span!("LoaderWorker", batch_fn = std::any::type_name::<F>());
        let worker = LoaderWorker::<K, V, F, HashMap<K, Option<V>>, ContextT>::new(
            HashMap::new(),
            rx,
            context,
            config,
        );
        let load_task_handle = tokio::task::spawn(worker.start().instrument(span));
        Self { request_tx: tx, load_task_handle }
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Loads a value from the underlying resource.
    ///
    /// Returns `Ok(None)` if the value could not be loaded by the BatchFunction, and an error if
    /// the batch this key was part of failed.
    ///
    /// If the value is already in the loader cache, it is returned as soon as it is processed.
    /// Otherwise, the requested key is enqueued for batch loading in the next loader execution
    /// frame.
    pub async fn load(&self, key: K) -> Result<Option<V>, LoadError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::One(key, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Closed)?
    }

    /// Loads many values at once.
    ///
    /// Returns None for values that could not be loaded by the BatchFunction.
    ///
    /// If all the values are already present in the loader cache, they are returned as soon as
    /// the request is processed by the worker. Otherwise, the keys are enqueued for batch loading
    /// in the next loader execution frame.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<Option<V>>, LoadError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::Many(keys, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Closed)?
    }

    /// Adds a value to the cache.
    pub async fn prime(&self, key: K, value: V) {
        self.send_or_log(LoaderOp::Prime(key, value));
    }

    /// Adds many values to the cache at once.
    pub async fn prime_many(&self, key_vals: Vec<(K, V)>) {
        self.send_or_log(LoaderOp::PrimeMany(key_vals));
    }

    /// Removes a value from the cache.
    ///
    /// This key will be reloaded when it is next requested.
    pub async fn clear(&self, key: K) {
        self.send_or_log(LoaderOp::Clear(key));
    }

    /// Removes multiple values from the cache at once.
    ///
    /// These keys will be reloaded when requested.
    pub async fn clear_many(&self, keys: Vec<K>) {
        self.send_or_log(LoaderOp::ClearMany(keys));
    }

    /// Empties the cache.
    pub async fn clear_all(&self) {
        self.send_or_log(LoaderOp::ClearAll);
    }

    fn send(&self, op: LoaderOp<K, V>) -> Result<(), LoadError> {
        self.request_tx.send(op).map_err(|_| LoadError::Closed)
    }

    fn send_or_log(&self, op: LoaderOp<K, V>) {
        if self.send(op).is_err() {
            tracing::warn!("loader worker stopped, cache op dropped");
        }
    }
}
