use sqlweave::{
    CachedPreparer, Postgres, SqlStmt, StatementCache, StatementCacheConfig, StatementClient,
    select,
};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out a fresh `Arc` per prepare so tests can observe releases.
#[derive(Default)]
struct CountingClient {
    prepares: AtomicUsize,
}

impl StatementClient for CountingClient {
    type Handle = Arc<String>;
    type Error = std::convert::Infallible;

    fn prepare(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<Self::Handle, Self::Error>> + Send {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(sql.to_string());
        async move { Ok(handle) }
    }
}

#[test]
fn pinned_entries_never_evicted_while_pinned() {
    let cache = StatementCache::new(3);
    cache.set("pinned-a", 1);
    cache.set("pinned-b", 2);
    cache.pin("pinned-a");
    cache.pin("pinned-b");

    for i in 0..50 {
        cache.set(format!("q{i}"), 100 + i);
        assert!(cache.is_pinned("pinned-a"));
        assert!(cache.is_pinned("pinned-b"));
        assert_eq!(cache.len(), 3);
    }

    let stats = cache.stats();
    assert_eq!(stats.pinned, 2);
    assert_eq!(stats.evictions, 49);
    assert_eq!(cache.get("q49"), Some(149));
    assert_eq!(cache.get("q48"), None);
}

#[tokio::test]
async fn preparer_reuses_handles_for_identical_sql() {
    let preparer = CachedPreparer::new(
        CountingClient::default(),
        &StatementCacheConfig::new().capacity(2),
    );

    let a = select("users").eq("id", 1i64).build(&Postgres).unwrap();
    let b = select("users").eq("id", 2i64).build(&Postgres).unwrap();
    assert_eq!(a.sql, b.sql);

    let first = preparer.prepare_built(&a).await.unwrap();
    let second = preparer.prepare_built(&b).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(preparer.client().prepares.load(Ordering::SeqCst), 1);

    let stats = preparer.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
}

#[tokio::test]
async fn evicted_and_cleared_handles_are_released() {
    let preparer = CachedPreparer::new(
        CountingClient::default(),
        &StatementCacheConfig::new().capacity(1),
    );

    let first = preparer.prepare_cached("SELECT 1").await.unwrap();
    assert_eq!(Arc::strong_count(&first), 2);

    preparer.prepare_cached("SELECT 2").await.unwrap();
    assert_eq!(Arc::strong_count(&first), 1);

    let second = preparer.prepare_cached("SELECT 2").await.unwrap();
    assert_eq!(Arc::strong_count(&second), 2);
    let client = preparer.into_client();
    assert_eq!(Arc::strong_count(&second), 1);
    assert_eq!(client.prepares.load(Ordering::SeqCst), 2);
}
