//! Prepared statement reuse on top of [`StatementCache`].
//!
//! The driver is abstracted by [`StatementClient`]; [`CachedPreparer`] looks a
//! statement up by its exact SQL text and prepares it through the client on a
//! miss. Client errors are returned as-is.

use crate::cache::{CacheStats, StatementCache};
use crate::config::StatementCacheConfig;
use crate::writer::Built;
use std::future::Future;

/// Something that can compile SQL into a reusable handle.
pub trait StatementClient: Send + Sync {
    type Handle: Clone + Send;
    type Error;

    fn prepare(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<Self::Handle, Self::Error>> + Send;
}

/// A client paired with a statement cache.
pub struct CachedPreparer<C: StatementClient> {
    client: C,
    cache: StatementCache<C::Handle>,
}

impl<C: StatementClient> CachedPreparer<C> {
    pub fn new(client: C, config: &StatementCacheConfig) -> Self {
        Self {
            client,
            cache: StatementCache::from_config(config),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &StatementCache<C::Handle> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Return the cached handle for `sql`, preparing and caching it on a miss.
    pub async fn prepare_cached(&self, sql: &str) -> Result<C::Handle, C::Error> {
        if let Some(handle) = self.cache.get(sql) {
            return Ok(handle);
        }
        let handle = self.client.prepare(sql).await?;
        self.cache.set(sql, handle.clone());
        Ok(handle)
    }

    /// [`CachedPreparer::prepare_cached`] for a built statement's SQL.
    pub async fn prepare_built(&self, built: &Built) -> Result<C::Handle, C::Error> {
        self.prepare_cached(&built.sql).await
    }

    /// Release every cached handle and return the client.
    pub fn into_client(self) -> C {
        self.cache.clear();
        self.client
    }
}

#[cfg(feature = "postgres")]
impl StatementClient for tokio_postgres::Client {
    type Handle = tokio_postgres::Statement;
    type Error = tokio_postgres::Error;

    fn prepare(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<Self::Handle, Self::Error>> + Send {
        tokio_postgres::Client::prepare(self, sql)
    }
}
