//! Time-bounded caches for the loaded repository and for projections.

use std::collections::hash_map::Entry;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::fallback::SideInputs;
use crate::projection::{project, MatchProjection, ModelConfig};
use crate::referee::RefereeAdjustment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    hits: usize,
    misses: usize,
}
impl CacheStats {
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl AddAssign<bool> for CacheStats {
    fn add_assign(&mut self, cache_hit: bool) {
        if cache_hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

fn expired(inserted: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(inserted) >= ttl
}

/// Holds the most recently loaded value, reloading it once it is older than the TTL.
#[derive(Debug)]
pub struct RepositoryCache<V> {
    ttl: Duration,
    slot: Option<(Instant, V)>,
    pub stats: CacheStats,
}
impl<V> RepositoryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: None,
            stats: CacheStats::default(),
        }
    }

    pub fn get_or_load<E>(&mut self, load: impl FnOnce() -> Result<V, E>) -> Result<&V, E> {
        self.get_or_load_at(Instant::now(), load)
    }

    pub fn get_or_load_at<E>(
        &mut self,
        now: Instant,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        let ttl = self.ttl;
        let slot = match self.slot.take() {
            Some((inserted, value)) if !expired(inserted, now, ttl) => {
                self.stats += true;
                (inserted, value)
            }
            _ => {
                self.stats += false;
                debug!("repository cache miss; loading");
                (now, load()?)
            }
        };
        let (_, value) = self.slot.insert(slot);
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

type Bytes = Vec<u8>;

/// Memoises [`project`] on its complete argument list, so a change of model parameters is
/// always a distinct entry.
#[derive(Debug)]
pub struct ProjectionCache {
    ttl: Duration,
    entries: FxHashMap<Bytes, (Instant, MatchProjection)>,
    pub stats: CacheStats,
}
impl ProjectionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: FxHashMap::default(),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn project(
        &mut self,
        home: &SideInputs,
        away: &SideInputs,
        referee: &RefereeAdjustment,
        config: &ModelConfig,
    ) -> MatchProjection {
        self.project_at(Instant::now(), home, away, referee, config)
    }

    pub fn project_at(
        &mut self,
        now: Instant,
        home: &SideInputs,
        away: &SideInputs,
        referee: &RefereeAdjustment,
        config: &ModelConfig,
    ) -> MatchProjection {
        let encoded = match bincode::encode_to_vec((home, away, referee, config), bincode::config::standard()) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("projection inputs not cacheable: {err}");
                self.stats += false;
                return project(home, away, referee, config);
            }
        };
        let ttl = self.ttl;
        let (projection, cache_hit) = match self.entries.entry(encoded) {
            Entry::Occupied(mut entry) => {
                if expired(entry.get().0, now, ttl) {
                    entry.insert((now, project(home, away, referee, config)));
                    (entry.into_mut(), false)
                } else {
                    (entry.into_mut(), true)
                }
            }
            Entry::Vacant(entry) => (entry.insert((now, project(home, away, referee, config))), false),
        };
        self.stats += cache_hit;
        projection.1.clone()
    }

    /// Drops every expired entry.
    pub fn purge(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries.retain(|_, (inserted, _)| !expired(*inserted, now, ttl));
    }
}
