use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use qrdrop_types::{Clock, ImageId, SystemClock};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::record::{ImageMeta, Lookup, NewImage, StoredImage};
use crate::traits::ImageStore;

/// In-memory, HashMap-based image store.
///
/// Records live behind a `RwLock`: visible lookups share the read guard,
/// everything that mutates takes the write guard. Payloads are `Bytes`, so a
/// lookup clones a handle rather than the image.
pub struct InMemoryImageStore {
    records: RwLock<HashMap<ImageId, StoredImage>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryImageStore {
    /// Create a new empty store on the system clock.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new empty store reading time from `clock`.
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            records: RwLock::new(HashMap::new()),
            clock,
            ttl: config.ttl,
        })
    }

    /// Return a list of all ids currently held, visible or not.
    #[cfg(test)]
    pub(crate) fn all_ids(&self) -> Vec<ImageId> {
        self.read().keys().copied().collect()
    }

    // A panic while holding the guard cannot leave the map half-updated
    // (every mutation is a single HashMap call), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ImageId, StoredImage>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ImageId, StoredImage>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageStore for InMemoryImageStore {
    fn insert(&self, image: NewImage) -> StoreResult<ImageMeta> {
        let now = self.clock.now();
        let size = image.bytes.len() as u64;
        let mut map = self.write();
        loop {
            match map.entry(ImageId::generate()) {
                Entry::Vacant(slot) => {
                    let meta =
                        ImageMeta::new(*slot.key(), image.content_type, size, now, self.ttl)?;
                    debug!(id = %meta.id, size, content_type = %meta.content_type, "image stored");
                    slot.insert(StoredImage {
                        meta: meta.clone(),
                        bytes: image.bytes,
                    });
                    return Ok(meta);
                }
                Entry::Occupied(taken) => {
                    warn!(id = %taken.key(), "image id collision; regenerating");
                }
            }
        }
    }

    fn get(&self, id: &ImageId) -> StoreResult<Lookup> {
        let now = self.clock.now();
        {
            let map = self.read();
            match map.get(id) {
                None => return Ok(Lookup::NotFound),
                Some(record) if record.meta.is_visible_at(now) => {
                    return Ok(Lookup::Found(record.clone()))
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write guard, since a sweep may have
        // removed it since the read guard was released.
        let mut map = self.write();
        let expired = map.get(id).map(|record| !record.meta.is_visible_at(now));
        match expired {
            Some(true) => {
                map.remove(id);
                debug!(id = %id, "expired image removed on lookup");
                Ok(Lookup::Expired)
            }
            Some(false) => Ok(map.get(id).cloned().map_or(Lookup::NotFound, Lookup::Found)),
            None => Ok(Lookup::NotFound),
        }
    }

    fn remove(&self, id: &ImageId) -> StoreResult<bool> {
        Ok(self.write().remove(id).is_some())
    }

    fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut map = self.write();
        let before = map.len();
        map.retain(|_, record| record.meta.is_visible_at(now));
        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, remaining = map.len(), "swept expired images");
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn total_bytes(&self) -> u64 {
        self.read().values().map(|r| r.meta.size).sum()
    }
}

impl std::fmt::Debug for InMemoryImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryImageStore")
            .field("image_count", &self.len())
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
