// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build results and the bounded LRU cache that carries them between builds.
//!
//! The cache keeps the fingerprints and tiles of the most recent build of up to
//! `capacity` targets. Recency is updated only by [`BuildCacheStore::put`]: looking an
//! entry up never protects it from eviction.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use hashbrown::HashMap;
use understory_tiling::{Aabb3D, TileCoord};

use crate::fingerprint::FingerprintTable;
use crate::settings::{AgentSettings, BuildSettings};

/// Generated navigation data of one tile, opaque to the cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileData {
    /// Serialized tile payload.
    pub data: Vec<u8>,
    /// Polygon vertices, useful for debug drawing.
    pub vertices: Vec<Vec3>,
}

impl TileData {
    /// True if the tile carries no navigation data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.vertices.is_empty()
    }
}

/// The tiles generated for one agent.
#[derive(Clone, Debug, PartialEq)]
pub struct NavMeshLayer {
    /// Agent the tiles were generated for.
    pub agent: AgentSettings,
    /// Generated tiles by coordinate. Tiles are shared between consecutive results.
    pub tiles: BTreeMap<TileCoord, Arc<TileData>>,
}

impl NavMeshLayer {
    /// A layer with no tiles.
    pub fn new(agent: AgentSettings) -> Self {
        Self {
            agent,
            tiles: BTreeMap::new(),
        }
    }
}

/// The tiles of one build target, one layer per agent.
#[derive(Clone, Debug, PartialEq)]
pub struct NavMeshResult {
    /// Layers in the order of [`BuildSettings::agents`].
    pub layers: Vec<NavMeshLayer>,
    /// [`BuildSettings::settings_hash`] of the build.
    pub settings_hash: u64,
    /// Scene bounds the tiles were built against.
    pub bounds: Aabb3D,
}

impl Default for NavMeshResult {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            settings_hash: 0,
            bounds: Aabb3D::EMPTY,
        }
    }
}

impl NavMeshResult {
    /// Look up one layer.
    pub fn layer(&self, layer: usize) -> Option<&NavMeshLayer> {
        self.layers.get(layer)
    }

    /// Look up one tile of one layer.
    pub fn tile(&self, layer: usize, coord: TileCoord) -> Option<&Arc<TileData>> {
        self.layers.get(layer)?.tiles.get(&coord)
    }

    /// Number of tiles over all layers.
    pub fn tile_count(&self) -> usize {
        self.layers.iter().map(|l| l.tiles.len()).sum()
    }
}

/// Everything a later build of the same target needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CachedBuild {
    /// Fingerprints of every blocking entity of the build.
    pub fingerprints: FingerprintTable,
    /// The generated tiles.
    pub result: NavMeshResult,
}

/// Bounded map from build target to its last [`CachedBuild`], evicting the least
/// recently stored target.
#[derive(Clone, Debug)]
pub struct BuildCacheStore<K> {
    entries: HashMap<K, CachedBuild>,
    // Least recently stored at the front.
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Clone + Eq + Hash> Default for BuildCacheStore<K> {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl<K: Clone + Eq + Hash> BuildCacheStore<K> {
    /// Default number of targets kept.
    pub const DEFAULT_CAPACITY: usize = 4;

    /// Create a store keeping at most `capacity` targets, at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Maximum number of targets kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of targets stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a target without changing its recency.
    pub fn get(&self, key: &K) -> Option<&CachedBuild> {
        self.entries.get(key)
    }

    /// Store `build` as the most recent entry for `key`.
    ///
    /// Returns the evicted least recent entry when the store was full.
    pub fn put(&mut self, key: K, build: CachedBuild) -> Option<(K, CachedBuild)> {
        if self.entries.remove(&key).is_some() {
            self.unlink(&key);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, build);

        if self.entries.len() <= self.capacity {
            return None;
        }
        let oldest = self.order.pop_front()?;
        let evicted = self.entries.remove(&oldest)?;
        log::debug!("evicted least recently built target from the build cache");
        Some((oldest, evicted))
    }

    /// Remove and return the entry for `key`.
    pub fn remove(&mut self, key: &K) -> Option<CachedBuild> {
        let build = self.entries.remove(key)?;
        self.unlink(key);
        Some(build)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Stored keys from least to most recently stored.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    fn unlink(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }
}

/// Thread-safe [`BuildCacheStore`] shared by concurrent builds.
///
/// Lookups return a clone; geometry and tiles inside are reference counted, so the
/// clone does not copy any buffers.
pub struct BuildCache<K> {
    inner: Mutex<BuildCacheStore<K>>,
}

impl<K> fmt::Debug for BuildCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("BuildCache")
            .field("len", &store.entries.len())
            .field("capacity", &store.capacity)
            .finish_non_exhaustive()
    }
}

impl<K: Clone + Eq + Hash> Default for BuildCache<K> {
    fn default() -> Self {
        Self::with_capacity(BuildCacheStore::<K>::DEFAULT_CAPACITY)
    }
}

impl<K: Clone + Eq + Hash> BuildCache<K> {
    /// Create a cache keeping at most `capacity` targets, at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BuildCacheStore::with_capacity(capacity)),
        }
    }

    /// Create a cache sized by [`BuildSettings::cache_capacity`].
    pub fn for_settings(settings: &BuildSettings) -> Self {
        Self::with_capacity(settings.cache_capacity)
    }

    // Store operations never panic halfway, so a poisoned store is still consistent.
    fn lock(&self) -> MutexGuard<'_, BuildCacheStore<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the last build of `key`, without changing its recency.
    pub fn get(&self, key: &K) -> Option<CachedBuild> {
        self.lock().get(key).cloned()
    }

    /// Store `build` as the most recent entry for `key`, returning the evicted key.
    pub fn put(&self, key: K, build: CachedBuild) -> Option<K> {
        self.lock().put(key, build).map(|(k, _)| k)
    }

    /// Remove the entry for `key`.
    pub fn remove(&self, key: &K) -> Option<CachedBuild> {
        self.lock().remove(key)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of targets stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of targets kept.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Stored keys from least to most recently stored.
    pub fn keys(&self) -> Vec<K> {
        self.lock().keys().cloned().collect()
    }
}
