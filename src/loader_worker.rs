use std::fmt::Debug;
use std::marker::PhantomData;
use std::slice;
use std::time::Duration;

use futures::future::FutureExt;
use tokio::sync::mpsc;

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;
use crate::{
    batch_function::BatchFunction,
    cache::Cache,
    config::LoaderConfig,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts its `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of four states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Yielding, so that the tasks that issued the first request can issue the rest of theirs.
/// 3. Flushing the request queue and staging keys for loading.
/// 4. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work
/// arrives.
///
/// In state (2), the worker yields back to the runtime once and then sleeps for the configured
/// batch delay (1ms by default). Resolvers of one GraphQL request are futures joined inside the
/// same task, so every sibling resolver that can issue a load without awaiting has done so by the
/// time the window closes, whether or not the runtime polls the worker on another thread.
///
/// In state (3), the worker synchronously pulls requests from the queue until the queue is empty.
/// Prime and Clear requests are resolved immediately against the cache. For Load requests, the
/// worker checks whether every requested key is cached (a cached "not found" counts). If so, it
/// immediately answers on the request's response channel, otherwise it stages the missing keys.
/// A Clear that removes a key some staged request still needs stages that key as well.
///
/// In state (4), the loader invokes its `BatchFunction` once with the sorted, deduplicated set
/// of staged keys. Returned values are cached, staged keys the function did not return are
/// cached as absent, and the outstanding Load requests are answered from the cache. If the
/// `BatchFunction` fails or times out, every outstanding Load request of the frame receives the
/// same error and nothing is cached for the staged keys.
pub struct LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Eq + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache,
    ContextT: Send + Sync + 'static,
{
    cache: CacheT,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    keys_to_load: Vec<K>,
    pending_requests: Vec<LoadRequest<K, V>>,
    context: ContextT,
    config: LoaderConfig,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
    phantom_batch_function: PhantomData<F>,
}

impl<K, V, F, CacheT, ContextT> LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Eq + Debug + Copy + Ord + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache<K = K, V = Option<V>>,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        cache: CacheT,
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
        context: ContextT,
        config: LoaderConfig,
    ) -> Self {
        Self {
            cache,
            request_rx,
            keys_to_load: Vec::new(),
            pending_requests: Vec::new(),
            context,
            config,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(std::any::type_name::<F>()),
            phantom_batch_function: PhantomData,
        }
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::debug!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(op) => self.mux_op(op),
            }
            wait_for_frame(self.config.batch_delay).await;
            // Flush remainder of the op queue before executing load.
            while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
                self.mux_op(op);
            }
            if !self.pending_requests.is_empty() {
                self.execute_load().await;
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn mux_op(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(request) => {
                let keys_to_load = request
                    .keys()
                    .iter()
                    .filter(|k| !self.cache.contains(k))
                    .copied()
                    .collect::<Vec<_>>();
                tracing::debug!(requested_keys = ?request.keys(), ?keys_to_load);
                #[cfg(feature = "stats")]
                {
                    let requested = request.keys().len() as u32;
                    self.stats.record_load_request(requested);
                    self.stats.record_cache_hits(requested - keys_to_load.len() as u32);
                }
                if keys_to_load.is_empty() {
                    let values = self.cache.get(request.keys());
                    request.send_response(values.into_iter().map(|v| v.and_then(Option::as_ref)));
                } else {
                    self.keys_to_load.extend(keys_to_load);
                    self.pending_requests.push(request);
                }
            }
            LoaderOp::Prime(key, value) => self.cache.insert(key, Some(value)),
            LoaderOp::PrimeMany(key_vals) => {
                self.cache.insert_many(key_vals.into_iter().map(|(k, v)| (k, Some(v))))
            }
            LoaderOp::Clear(key) => {
                self.cache.remove(slice::from_ref(&key));
                self.restage_pending_keys();
            }
            LoaderOp::ClearMany(keys) => {
                self.cache.remove(&keys);
                self.restage_pending_keys();
            }
            LoaderOp::ClearAll => {
                self.cache.flush();
                self.restage_pending_keys();
            }
        }
    }

    /// Stages again any key of a pending request whose cached value was just cleared, so the
    /// request is answered from the coming fetch instead of the missing entry.
    fn restage_pending_keys(&mut self) {
        for request in &self.pending_requests {
            for key in request.keys() {
                if !self.cache.contains(key) && !self.keys_to_load.contains(key) {
                    self.keys_to_load.push(*key);
                }
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        let mut keys = std::mem::take(&mut self.keys_to_load);
        #[cfg(feature = "stats")]
        self.stats.record_load_exec(keys.len() as u32);
        keys.sort();
        keys.dedup();

        let fetch = F::load(&keys, &self.context);
        let loaded = match self.config.fetch_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fetch).await {
                Ok(result) => result.map_err(LoadError::fetch),
                Err(_elapsed) => Err(LoadError::Timeout(timeout)),
            },
            None => fetch.await.map_err(LoadError::fetch),
        };

        match loaded {
            Ok(loaded_keyvals) => {
                tracing::debug!(batch_size = keys.len(), loaded = loaded_keyvals.len());
                #[cfg(feature = "stats")]
                self.stats
                    .record_load_exec_completed(keys.len() as u32, loaded_keyvals.len() as u32);
                self.cache.insert_many(keys.iter().map(|k| (*k, None)));
                self.cache.insert_many(loaded_keyvals.into_iter().map(|(k, v)| (k, Some(v))));

                for request in self.pending_requests.drain(..) {
                    let values = self.cache.get(request.keys());
                    request.send_response(values.into_iter().map(|v| v.and_then(Option::as_ref)));
                }
            }
            Err(error) => {
                tracing::warn!(%error, ?keys, "batch load failed");
                #[cfg(feature = "stats")]
                self.stats.record_load_exec_failed();
                for request in self.pending_requests.drain(..) {
                    request.send_error(error.clone());
                }
            }
        }
    }
}

async fn wait_for_frame(batch_delay: Option<Duration>) {
    tokio::task::yield_now().await;
    if let Some(delay) = batch_delay {
        tokio::time::sleep(delay).await;
    }
}
