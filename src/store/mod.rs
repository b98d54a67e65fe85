//! Durable source → target routing table.
//!
//! The store is constructed once at startup and shared by reference between
//! the dispatcher (read path) and the admin commands (write path).

pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use serenity::model::id::ChannelId;

use crate::common::StoreResult;

pub use sqlite::SqliteRouteStore;

/// A source channel and the channel or thread its messages are relayed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub source: ChannelId,
    /// Unset until the source is paired with a target.
    pub target: Option<ChannelId>,
}

impl Route {
    pub fn is_paired(&self) -> bool {
        self.target.is_some()
    }
}

/// Run a store operation on the blocking thread pool.
///
/// Store calls take a lock and hit the disk, so async callers go through here
/// instead of calling the store on a runtime worker.
pub async fn run_blocking<T, F>(store: &Arc<dyn RouteStore>, op: F) -> StoreResult<T>
where
    F: FnOnce(&dyn RouteStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || op(store.as_ref())).await?
}

/// Outcome of adding a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// The source was already registered; its target is left as it was.
    AlreadyExists,
}

/// Storage contract for routes, keyed by source channel.
///
/// Every operation is atomic with respect to the others.
pub trait RouteStore: Send + Sync {
    /// Look up the route for a source channel.
    fn get(&self, source: ChannelId) -> StoreResult<Option<Route>>;

    /// All routes, paired or not.
    fn list(&self) -> StoreResult<Vec<Route>>;

    /// Routes that have a target.
    fn list_paired(&self) -> StoreResult<Vec<Route>>;

    /// Register a source with no target. Idempotent.
    fn upsert_source(&self, source: ChannelId) -> StoreResult<UpsertOutcome>;

    /// Point a registered source at a target, replacing any previous one.
    ///
    /// Fails with `UnknownSource` and creates nothing if the source is not registered.
    fn set_target(&self, source: ChannelId, target: ChannelId) -> StoreResult<()>;

    /// Delete a route. Fails with `UnknownSource` if it does not exist.
    fn remove(&self, source: ChannelId) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::common::StoreError;

    fn memory_store() -> Arc<dyn RouteStore> {
        Arc::new(SqliteRouteStore::open(Path::new(":memory:")).unwrap())
    }

    #[tokio::test]
    async fn test_run_blocking_returns_store_result() {
        let store = memory_store();
        let source = ChannelId::new(100);

        let outcome = run_blocking(&store, move |store| store.upsert_source(source))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let routes = run_blocking(&store, |store| store.list()).await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].source, source);
    }

    #[tokio::test]
    async fn test_run_blocking_passes_errors_through() {
        let store = memory_store();
        let source = ChannelId::new(100);

        let result = run_blocking(&store, move |store| store.remove(source)).await;
        assert!(matches!(
            result,
            Err(StoreError::UnknownSource { source_id }) if source_id == source
        ));
    }

    #[tokio::test]
    async fn test_run_blocking_reports_panicked_operation() {
        let store = memory_store();

        let result: StoreResult<()> =
            run_blocking(&store, |_| panic!("store operation panicked")).await;
        assert!(matches!(result, Err(StoreError::Task(_))));
    }
}
