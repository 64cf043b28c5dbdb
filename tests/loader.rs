use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use batchgraph::{BatchFunction, LoadError, Loader, LoaderConfig, StoreError};
use futures::future;

#[derive(Debug, PartialEq, Eq, Clone)]
struct DummyData(String);

#[derive(Default)]
struct DummyContext {
    map: Mutex<HashMap<i64, String>>,
    batches: Mutex<Vec<Vec<i64>>>,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl DummyContext {
    fn with_entries(entries: &[(i64, &str)]) -> Arc<Self> {
        let context = Self::default();
        context.map.lock().unwrap().extend(entries.iter().map(|(k, v)| (*k, v.to_string())));
        Arc::new(context)
    }

    fn batches(&self) -> Vec<Vec<i64>> {
        self.batches.lock().unwrap().clone()
    }
}

struct DummyDataLoader;

#[async_trait]
impl BatchFunction<i64, DummyData> for DummyDataLoader {
    type Context = Arc<DummyContext>;
    type Error = StoreError;

    async fn load(
        keys: &[i64],
        context: &Arc<DummyContext>,
    ) -> Result<Vec<(i64, DummyData)>, StoreError> {
        context.batches.lock().unwrap().push(keys.to_vec());
        if let Some(delay) = context.delay {
            tokio::time::sleep(delay).await;
        }
        if context.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("dummy backend down".to_owned()));
        }
        let map = context.map.lock().unwrap();
        Ok(keys.iter().filter_map(|k| map.get(k).cloned().map(|v| (*k, DummyData(v)))).collect())
    }
}

fn data(s: &str) -> Option<DummyData> {
    Some(DummyData(s.to_owned()))
}

#[tokio::test]
async fn basic_load() {
    let context = DummyContext::with_entries(&[(42, "Foo")]);

    let loader = Loader::new(DummyDataLoader {}, context);
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
}

#[tokio::test]
async fn repeated_load() {
    let context = DummyContext::with_entries(&[(42, "Foo")]);

    let loader = Loader::new(DummyDataLoader {}, context.clone());
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
    assert_eq!(context.batches(), vec![vec![42]]);
}

#[tokio::test]
async fn basic_load_many() {
    let context = DummyContext::with_entries(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]);

    let loader = Loader::new(DummyDataLoader {}, context);
    assert_eq!(
        loader.load_many(vec![5, 12, 8]).await.unwrap(),
        vec![data("red fish"), data("two fish"), data("blue fish")]
    );
}

#[tokio::test]
async fn load_async() {
    let context = DummyContext::with_entries(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]);

    let loader = Loader::new(DummyDataLoader {}, context.clone());

    let (a, b, c, d) = future::join4(
        loader.load(5),
        loader.load_many(vec![5, 42]),
        loader.load(99),
        loader.load(12),
    )
    .await;

    assert_eq!(a.unwrap(), data("red fish"));
    assert_eq!(b.unwrap(), vec![data("red fish"), data("one fish")]);
    assert_eq!(c.unwrap(), None);
    assert_eq!(d.unwrap(), data("two fish"));
    assert_eq!(context.batches(), vec![vec![5, 12, 42, 99]]);
}

#[tokio::test]
async fn duplicate_keys_share_one_fetch() {
    let context = DummyContext::with_entries(&[(1, "a"), (2, "b"), (3, "c")]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    let (first, second, third, fourth) =
        future::join4(loader.load(1), loader.load(2), loader.load(1), loader.load(3)).await;

    let first = first.unwrap();
    assert_eq!(first, data("a"));
    assert_eq!(first, third.unwrap());
    assert_eq!(second.unwrap(), data("b"));
    assert_eq!(fourth.unwrap(), data("c"));
    assert_eq!(context.batches(), vec![vec![1, 2, 3]]);
}

#[tokio::test]
async fn missing_key_is_none_and_memoized() {
    let context = DummyContext::with_entries(&[]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    assert_eq!(loader.load(404).await.unwrap(), None);
    assert_eq!(loader.load(404).await.unwrap(), None);
    assert_eq!(context.batches().len(), 1);
}

#[tokio::test]
async fn later_key_starts_new_batch() {
    let context = DummyContext::with_entries(&[(1, "a"), (2, "b")]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    loader.load(1).await.unwrap();
    loader.load(2).await.unwrap();
    assert_eq!(context.batches(), vec![vec![1], vec![2]]);
}

#[tokio::test]
async fn loaders_do_not_share_cache() {
    let context = DummyContext::with_entries(&[(42, "before")]);
    let first = Loader::new(DummyDataLoader {}, context.clone());
    let second = Loader::new(DummyDataLoader {}, context.clone());

    assert_eq!(first.load(42).await.unwrap(), data("before"));
    context.map.lock().unwrap().insert(42, "after".to_owned());

    assert_eq!(first.load(42).await.unwrap(), data("before"));
    assert_eq!(second.load(42).await.unwrap(), data("after"));
}

#[tokio::test]
async fn failed_batch_rejects_every_request() {
    let context = DummyContext::with_entries(&[(1, "a"), (2, "b")]);
    context.fail.store(true, Ordering::SeqCst);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    let (a, b, many) =
        future::join3(loader.load(1), loader.load(2), loader.load_many(vec![1, 2])).await;
    for error in [a.unwrap_err(), b.unwrap_err(), many.unwrap_err()] {
        assert!(matches!(error, LoadError::Fetch(_)), "unexpected error: {error}");
        assert!(error.to_string().contains("dummy backend down"));
    }
    assert_eq!(context.batches().len(), 1);

    // Failures are not cached.
    context.fail.store(false, Ordering::SeqCst);
    assert_eq!(loader.load(1).await.unwrap(), data("a"));
    assert_eq!(context.batches().len(), 2);
}

#[tokio::test]
async fn slow_batch_times_out() {
    let context = Arc::new(DummyContext {
        delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let config = LoaderConfig::default().with_fetch_timeout(Duration::from_millis(20));
    let loader = Loader::with_config(DummyDataLoader {}, context, config);

    let (a, b) = future::join(loader.load(1), loader.load(2)).await;
    assert!(matches!(a, Err(LoadError::Timeout(_))));
    assert!(matches!(b, Err(LoadError::Timeout(_))));
}

#[tokio::test]
async fn batch_delay_still_coalesces() {
    let context = DummyContext::with_entries(&[(1, "a"), (2, "b")]);
    let config = LoaderConfig::default().with_batch_delay(Duration::from_millis(5));
    let loader = Loader::with_config(DummyDataLoader {}, context.clone(), config);

    let (a, b) = future::join(loader.load(1), loader.load(2)).await;
    assert_eq!((a.unwrap(), b.unwrap()), (data("a"), data("b")));
    assert_eq!(context.batches(), vec![vec![1, 2]]);
}

#[tokio::test]
async fn prime_and_clear() {
    let context = DummyContext::with_entries(&[(7, "stored")]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    loader.prime(7, DummyData("primed".to_owned())).await;
    assert_eq!(loader.load(7).await.unwrap(), data("primed"));
    assert!(context.batches().is_empty());

    loader.clear(7).await;
    assert_eq!(loader.load(7).await.unwrap(), data("stored"));

    loader
        .prime_many(vec![(7, DummyData("again".to_owned())), (8, DummyData("new".to_owned()))])
        .await;
    assert_eq!(loader.load_many(vec![7, 8]).await.unwrap(), vec![data("again"), data("new")]);

    loader.clear_all().await;
    assert_eq!(loader.load_many(vec![7, 8]).await.unwrap(), vec![data("stored"), None]);
    assert_eq!(context.batches(), vec![vec![7], vec![7, 8]]);
}

#[tokio::test]
async fn load_during_inflight_fetch_reuses_it() {
    let context = DummyContext { delay: Some(Duration::from_millis(50)), ..Default::default() };
    context.map.lock().unwrap().insert(1, "one".to_owned());
    let context = Arc::new(context);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    let (first, second) = future::join(loader.load(1), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        loader.load(1).await
    })
    .await;

    assert_eq!(first.unwrap(), data("one"));
    assert_eq!(second.unwrap(), data("one"));
    assert_eq!(context.batches(), vec![vec![1]]);
}

#[tokio::test]
async fn clear_in_same_frame_refetches_pending_key() {
    let context = DummyContext::with_entries(&[(1, "one"), (2, "two")]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    assert_eq!(loader.load(1).await.unwrap(), data("one"));

    // Key 1 is a cache hit when the load_many is staged, then cleared before the fetch runs.
    let (many, ()) = future::join(loader.load_many(vec![1, 2]), loader.clear(1)).await;
    assert_eq!(many.unwrap(), vec![data("one"), data("two")]);
    assert_eq!(context.batches(), vec![vec![1], vec![1, 2]]);
}

#[tokio::test]
async fn clear_all_in_same_frame_refetches_pending_keys() {
    let context = DummyContext::with_entries(&[(1, "one"), (2, "two"), (3, "three")]);
    let loader = Loader::new(DummyDataLoader {}, context.clone());

    loader.load_many(vec![1, 2]).await.unwrap();

    let (many, ()) = future::join(loader.load_many(vec![1, 2, 3]), loader.clear_all()).await;
    assert_eq!(many.unwrap(), vec![data("one"), data("two"), data("three")]);
    assert_eq!(context.batches(), vec![vec![1, 2], vec![1, 2, 3]]);
}
