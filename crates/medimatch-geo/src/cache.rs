//! Bounded, time-expiring cache in front of a reverse geocoder.
//!
//! Keys are coordinates rounded to three decimal places (about 110 m), so
//! nearby callers share an entry. Only successful lookups are cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use medimatch_core::Coordinate;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::GeoError;
use crate::types::{Place, ReverseGeocoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    lat_milli: i64,
    lng_milli: i64,
}

impl CacheKey {
    #[allow(clippy::cast_possible_truncation)]
    fn from_coordinate(at: Coordinate) -> Self {
        Self {
            lat_milli: (at.latitude() * 1000.0).round() as i64,
            lng_milli: (at.longitude() * 1000.0).round() as i64,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    place: Place,
    inserted_at: Instant,
}

/// Shared reverse-geocode cache. Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct GeocodeCache {
    capacity: usize,
    ttl: Duration,
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl GeocodeCache {
    /// A cache holding at most `capacity` entries, each valid for `ttl`.
    /// A zero capacity disables caching.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached place for `at`, dropping it if it has expired.
    pub async fn get(&self, at: Coordinate) -> Option<Place> {
        let key = CacheKey::from_coordinate(at);
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.place.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores `place` for `at`, evicting expired entries first and then the
    /// oldest entry if the cache is still full.
    pub async fn insert(&self, at: Coordinate, place: Place) {
        if self.capacity == 0 {
            return;
        }
        let key = CacheKey::from_coordinate(at);
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| *k)
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                place,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// A [`ReverseGeocoder`] that consults a [`GeocodeCache`] before delegating.
pub struct CachedReverseGeocoder<G> {
    inner: G,
    cache: GeocodeCache,
}

impl<G: ReverseGeocoder> CachedReverseGeocoder<G> {
    #[must_use]
    pub fn new(inner: G, cache: GeocodeCache) -> Self {
        Self { inner, cache }
    }

    async fn reverse_cached(&self, at: Coordinate) -> Result<Place, GeoError> {
        if let Some(place) = self.cache.get(at).await {
            tracing::debug!(
                latitude = at.latitude(),
                longitude = at.longitude(),
                "reverse geocode cache hit"
            );
            return Ok(place);
        }
        let place = self.inner.reverse(at).await?;
        self.cache.insert(at, place.clone()).await;
        Ok(place)
    }
}

impl<G: ReverseGeocoder> ReverseGeocoder for CachedReverseGeocoder<G> {
    fn reverse(&self, at: Coordinate) -> BoxFuture<'_, Result<Place, GeoError>> {
        self.reverse_cached(at).boxed()
    }
}
