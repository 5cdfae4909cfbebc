//! Content-addressed cache of computed surfaces.
//!
//! Entries are keyed by a hash of the exact inputs (station coordinates and
//! values, bounding box, boundary vertices, resolution), expire after a TTL
//! and are evicted least-recently-used beyond a fixed capacity.
//!
//! Concurrent requests for the same key share one computation: the first
//! caller runs the pipeline on the blocking pool and every other caller
//! awaits the same cell.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aq_common::{SurfaceError, SurfaceResult};
use geo::Polygon;
use lru::LruCache;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::config::SurfaceConfig;
use crate::pipeline::{Surface, SurfaceEngine, SurfaceRequest};
use crate::types::CacheStats;

/// Hash of everything that determines a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceKey(u64);

impl SurfaceKey {
    pub fn compute(request: &SurfaceRequest) -> Self {
        let mut hasher = DefaultHasher::new();

        let readings = request.stations.readings();
        readings.len().hash(&mut hasher);
        for r in readings {
            r.longitude.to_bits().hash(&mut hasher);
            r.latitude.to_bits().hash(&mut hasher);
            r.value.to_bits().hash(&mut hasher);
        }

        let bbox = &request.bbox;
        for v in [bbox.lat_min, bbox.lat_max, bbox.lon_min, bbox.lon_max] {
            v.to_bits().hash(&mut hasher);
        }

        let parts = &request.boundary.shape().0;
        parts.len().hash(&mut hasher);
        for polygon in parts {
            hash_polygon(polygon, &mut hasher);
        }

        request.resolution.hash(&mut hasher);

        Self(hasher.finish())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Exact input equality, short-circuiting on shared allocations.
fn same_inputs(a: &SurfaceRequest, b: &SurfaceRequest) -> bool {
    a.resolution == b.resolution
        && a.bbox == b.bbox
        && (Arc::ptr_eq(&a.stations, &b.stations) || a.stations == b.stations)
        && (Arc::ptr_eq(&a.boundary, &b.boundary) || a.boundary == b.boundary)
}

fn hash_polygon<H: Hasher>(polygon: &Polygon<f64>, hasher: &mut H) {
    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
    (polygon.interiors().len() + 1).hash(hasher);
    for ring in rings {
        ring.0.len().hash(hasher);
        for c in &ring.0 {
            c.x.to_bits().hash(hasher);
            c.y.to_bits().hash(hasher);
        }
    }
}

struct CachedSurface {
    surface: Arc<Surface>,
    request: SurfaceRequest,
    inserted_at: Instant,
}

type InFlight = (SurfaceRequest, Arc<OnceCell<Arc<Surface>>>);

/// LRU + TTL cache of surfaces with single-flight computation.
///
/// Keys are 64-bit digests, so every hit is confirmed against the stored
/// request; a colliding request is computed on its own and never served
/// another region's surface.
pub struct SurfaceCache {
    entries: Mutex<LruCache<SurfaceKey, CachedSurface>>,
    in_flight: Mutex<HashMap<SurfaceKey, InFlight>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
    collisions: AtomicU64,
}

impl SurfaceCache {
    /// Create a cache holding up to `capacity` surfaces for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        info!(
            capacity = capacity.get(),
            ttl_secs = ttl.as_secs(),
            "Surface cache initialized"
        );

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            computations: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            collisions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_secs))
    }

    /// Return the cached surface for `request`, computing it on a miss.
    ///
    /// At most one computation per key runs at a time; concurrent callers
    /// receive the same `Arc<Surface>`. Failures are not cached.
    pub async fn get_or_compute(
        &self,
        engine: Arc<SurfaceEngine>,
        request: SurfaceRequest,
    ) -> SurfaceResult<Arc<Surface>> {
        let key = SurfaceKey::compute(&request);
        self.get_or_compute_keyed(key, engine, request).await
    }

    async fn get_or_compute_keyed(
        &self,
        key: SurfaceKey,
        engine: Arc<SurfaceEngine>,
        request: SurfaceRequest,
    ) -> SurfaceResult<Arc<Surface>> {
        if let Some(surface) = self.lookup(&key, &request).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = key.value(), "Surface cache hit");
            return Ok(surface);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some((pending, cell)) if same_inputs(pending, &request) => Some(Arc::clone(cell)),
                Some(_) => None,
                None => {
                    let cell = Arc::new(OnceCell::new());
                    in_flight.insert(key, (request.clone(), Arc::clone(&cell)));
                    Some(cell)
                }
            }
        };

        let Some(cell) = cell else {
            // Another request with the same digest is in flight
            self.note_collision(&key);
            return self.compute(&key, engine, request).await;
        };

        let result = cell
            .get_or_try_init(|| async {
                // A computation that finished between our lookup and taking
                // the cell has already stored its result.
                if let Some(surface) = self.lookup(&key, &request).await {
                    return Ok(surface);
                }
                self.compute(&key, engine, request.clone()).await
            })
            .await
            .map(Arc::clone);

        if let Ok(surface) = &result {
            self.store(key, &request, Arc::clone(surface)).await;
        }

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&key)
            .map_or(false, |(_, current)| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(&key);
        }

        result
    }

    async fn compute(
        &self,
        key: &SurfaceKey,
        engine: Arc<SurfaceEngine>,
        request: SurfaceRequest,
    ) -> SurfaceResult<Arc<Surface>> {
        self.computations.fetch_add(1, Ordering::Relaxed);
        debug!(key = key.value(), "Computing surface");
        match tokio::task::spawn_blocking(move || engine.run(&request)).await {
            Ok(computed) => computed.map(Arc::new),
            Err(e) => Err(SurfaceError::Internal(format!("surface task failed: {}", e))),
        }
    }

    fn note_collision(&self, key: &SurfaceKey) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
        warn!(key = key.value(), "Surface cache key collision");
    }

    async fn lookup(&self, key: &SurfaceKey, request: &SurfaceRequest) -> Option<Arc<Surface>> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if !same_inputs(&entry.request, request) => {
                self.note_collision(key);
                return None;
            }
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(Arc::clone(&entry.surface));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(key = key.value(), "Surface cache entry expired");
        }
        None
    }

    async fn store(&self, key: SurfaceKey, request: &SurfaceRequest, surface: Arc<Surface>) {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.peek(&key) {
            // Keep a live entry for the same inputs; a colliding or stale
            // one is replaced.
            if same_inputs(&existing.request, request)
                && existing.inserted_at.elapsed() < self.ttl
            {
                return;
            }
        }
        let evicted = entries.push(
            key,
            CachedSurface {
                surface,
                request: request.clone(),
                inserted_at: Instant::now(),
            },
        );
        if let Some((old_key, _)) = evicted {
            if old_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Drop every cached surface.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            entries: self.entries.lock().await.len(),
        }
    }
}

impl std::fmt::Debug for SurfaceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCache")
            .field("ttl", &self.ttl)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
