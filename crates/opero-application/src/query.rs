use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use opero_core::config::QuerySettings;
use opero_core::error::ServiceResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Kind of data a cache entry holds. Invalidation works per kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Properties,
    PortfolioStats,
    Team,
    Invitations,
    Workspace,
    Profile,
    DailyTasks,
    UserStats,
}

/// Identifies one cached read: the entity kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: EntityKind,
    pub params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Bumped on every invalidation of a kind
    generations: HashMap<EntityKind, u64>,
}

impl CacheState {
    fn generation(&self, kind: EntityKind) -> u64 {
        self.generations.get(&kind).copied().unwrap_or(0)
    }
}

/// Read cache with stale-time expiry and per-kind invalidation.
///
/// A read that started before an invalidation of its kind is returned to its
/// caller but never stored, so no later read can observe data older than the
/// mutation that triggered the invalidation.
pub struct QueryClient {
    state: RwLock<CacheState>,
    stale_time: Duration,
    read_retries: u32,
}

impl QueryClient {
    pub fn new(settings: &QuerySettings) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            stale_time: settings.stale_time(),
            read_retries: settings.read_retries,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Returns the cached value for `key` if still fresh, otherwise runs
    /// `fetcher` (retrying failed reads) and caches the result.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ServiceResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let generation = {
            let state = self.state.read().await;
            if let Some(entry) = state.entries.get(&key) {
                if entry.fetched_at.elapsed() < self.stale_time {
                    if let Some(value) = entry.value.downcast_ref::<T>() {
                        tracing::debug!(kind = %key.kind, "Cache hit");
                        return Ok(value.clone());
                    }
                }
            }
            state.generation(key.kind)
        };

        tracing::debug!(kind = %key.kind, "Cache miss");
        let mut attempt = 0;
        let value = loop {
            match fetcher().await {
                Ok(value) => break value,
                Err(err) if attempt < self.read_retries => {
                    attempt += 1;
                    tracing::warn!(kind = %key.kind, attempt, "Read failed, retrying: {}", err);
                }
                Err(err) => return Err(err),
            }
        };

        let mut state = self.state.write().await;
        if state.generation(key.kind) == generation {
            state.entries.insert(
                key,
                CacheEntry {
                    value: Arc::new(value.clone()),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(kind = %key.kind, "Discarding read that raced an invalidation");
        }
        Ok(value)
    }

    /// Awaits `mutation` and, if it succeeds, invalidates `kinds`.
    pub async fn mutate<T, Fut>(&self, kinds: &[EntityKind], mutation: Fut) -> ServiceResult<T>
    where
        Fut: Future<Output = ServiceResult<T>>,
    {
        let value = mutation.await?;
        self.invalidate(kinds).await;
        Ok(value)
    }

    pub async fn invalidate(&self, kinds: &[EntityKind]) {
        let mut state = self.state.write().await;
        for kind in kinds {
            *state.generations.entry(*kind).or_default() += 1;
        }
        let before = state.entries.len();
        state.entries.retain(|key, _| !kinds.contains(&key.kind));
        tracing::debug!(?kinds, removed = before - state.entries.len(), "Invalidated queries");
    }

    /// Drops every entry, e.g. on sign-out.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        for kind in EntityKind::iter() {
            *state.generations.entry(kind).or_default() += 1;
        }
        state.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(&QuerySettings::default())
    }
}
