use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use qrdrop_types::{Clock, ImageId, ImageType, SystemClock};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::record::{ImageMeta, Lookup, NewImage, StoredImage};
use crate::traits::ImageStore;

/// Image store that keeps payloads as files under one directory.
///
/// Files are named `{id}.{ext}`. The id → metadata index lives only in
/// memory, so the directory is purged of leftover image files on open:
/// nothing stored by a previous process is ever served.
///
/// File reads, writes and deletes all happen with no guard held.
pub struct DiskImageStore {
    dir: PathBuf,
    index: RwLock<HashMap<ImageId, ImageMeta>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl DiskImageStore {
    /// Open (creating if needed) a store rooted at `dir` on the system clock.
    pub fn open(dir: impl Into<PathBuf>, config: StoreConfig) -> StoreResult<Self> {
        Self::open_with_clock(dir, config, Arc::new(SystemClock))
    }

    /// Open a store rooted at `dir` reading time from `clock`.
    pub fn open_with_clock(
        dir: impl Into<PathBuf>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        config.validate()?;
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let purged = purge_leftovers(&dir)?;
        info!(dir = %dir.display(), purged, "disk image store opened");
        Ok(Self {
            dir,
            index: RwLock::new(HashMap::new()),
            clock,
            ttl: config.ttl,
        })
    }

    /// The directory payloads are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ImageId, ty: ImageType) -> PathBuf {
        self.dir.join(format!("{}.{}", id, ty.extension()))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ImageId, ImageMeta>> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ImageId, ImageMeta>> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delete a payload file, treating "already gone" as success.
    fn unlink(&self, meta: &ImageMeta) -> io::Result<()> {
        match fs::remove_file(self.path_for(&meta.id, meta.content_type)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl ImageStore for DiskImageStore {
    fn insert(&self, image: NewImage) -> StoreResult<ImageMeta> {
        let now = self.clock.now();
        loop {
            let id = ImageId::generate();
            if self.read().contains_key(&id) {
                warn!(id = %id, "image id collision; regenerating");
                continue;
            }

            let path = self.path_for(&id, image.content_type);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(id = %id, "image file already exists; regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = file.write_all(&image.bytes) {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
            drop(file);

            let size = image.bytes.len() as u64;
            let meta = match ImageMeta::new(id, image.content_type, size, now, self.ttl) {
                Ok(meta) => meta,
                Err(e) => {
                    let _ = fs::remove_file(&path);
                    return Err(e);
                }
            };
            let claimed = match self.write().entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(meta.clone());
                    true
                }
                Entry::Occupied(_) => false,
            };
            if !claimed {
                // Lost a race for the same id with a different extension.
                let _ = fs::remove_file(&path);
                continue;
            }
            debug!(id = %id, size = meta.size, path = %path.display(), "image written");
            return Ok(meta);
        }
    }

    fn get(&self, id: &ImageId) -> StoreResult<Lookup> {
        let now = self.clock.now();
        let Some(meta) = self.read().get(id).cloned() else {
            return Ok(Lookup::NotFound);
        };

        if !meta.is_visible_at(now) {
            // Re-check under the write guard; a sweep may have beaten us.
            let removed = self.write().remove(id);
            return match removed {
                Some(meta) => {
                    match self.unlink(&meta) {
                        Ok(()) => debug!(id = %id, "expired image removed on lookup"),
                        Err(e) => {
                            warn!(id = %id, error = %e, "failed to delete expired image file")
                        }
                    }
                    Ok(Lookup::Expired)
                }
                None => Ok(Lookup::NotFound),
            };
        }

        match fs::read(self.path_for(id, meta.content_type)) {
            Ok(data) => Ok(Lookup::Found(StoredImage {
                meta,
                bytes: Bytes::from(data),
            })),
            // Deleted out from under the index; drop the stale entry too.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.write().remove(id).is_some() {
                    warn!(id = %id, "image file missing; index entry dropped");
                }
                Ok(Lookup::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, id: &ImageId) -> StoreResult<bool> {
        let removed = self.write().remove(id);
        match removed {
            Some(meta) => {
                self.unlink(&meta)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut expired = Vec::new();
        {
            let mut index = self.write();
            index.retain(|_, meta| {
                if meta.is_visible_at(now) {
                    true
                } else {
                    expired.push(meta.clone());
                    false
                }
            });
        }

        for meta in &expired {
            if let Err(e) = self.unlink(meta) {
                warn!(id = %meta.id, error = %e, "failed to delete expired image file");
            }
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "swept expired images");
        }
        Ok(expired.len())
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn total_bytes(&self) -> u64 {
        self.read().values().map(|m| m.size).sum()
    }
}

impl std::fmt::Debug for DiskImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImageStore")
            .field("dir", &self.dir)
            .field("image_count", &self.len())
            .finish()
    }
}

/// Delete files a previous process left behind. Only names of the form
/// `{id}.{ext}` are touched; anything else in the directory is left alone.
fn purge_leftovers(dir: &Path) -> io::Result<usize> {
    let mut purged = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_image_file_name(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => purged += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "could not purge leftover image"),
        }
    }
    Ok(purged)
}

fn is_image_file_name(path: &Path) -> bool {
    let stem_is_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.parse::<ImageId>().is_ok());
    let ext_is_image = path
        .extension()
        .and_then(|s| s.to_str())
        .and_then(ImageType::from_extension)
        .is_some();
    stem_is_id && ext_is_image
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use qrdrop_types::ManualClock;

    use super::*;
    use crate::error::StoreError;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn open(dir: &Path) -> (DiskImageStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(epoch()));
        let config = StoreConfig::with_ttl_hours(1).unwrap();
        let store = DiskImageStore::open_with_clock(dir, config, clock.clone()).unwrap();
        (store, clock)
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn insert_writes_file_and_get_reads_it_back() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = open(tmp.path());

        let meta = store.insert(NewImage::new(&b"gif-bytes"[..], ImageType::Gif)).unwrap();
        let path = tmp.path().join(format!("{}.gif", meta.id));
        assert_eq!(fs::read(&path).unwrap(), b"gif-bytes");

        match store.get(&meta.id).unwrap() {
            Lookup::Found(record) => {
                assert_eq!(&record.bytes[..], b"gif-bytes");
                assert_eq!(record.meta, meta);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn expired_lookup_deletes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, clock) = open(tmp.path());
        let meta = store.insert(NewImage::new(&b"x"[..], ImageType::Png)).unwrap();

        clock.advance(Duration::hours(1));
        assert_eq!(store.get(&meta.id).unwrap(), Lookup::Expired);
        assert_eq!(store.get(&meta.id).unwrap(), Lookup::NotFound);
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[test]
    fn sweep_deletes_only_expired_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, clock) = open(tmp.path());
        store.insert(NewImage::new(&b"old"[..], ImageType::Png)).unwrap();
        clock.advance(Duration::minutes(45));
        let young = store.insert(NewImage::new(&b"young"[..], ImageType::WebP)).unwrap();

        let removed = store.sweep(epoch() + Duration::hours(1)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(file_count(tmp.path()), 1);
        assert!(store.get(&young.id).unwrap().is_found());
    }

    #[test]
    fn remove_is_idempotent_and_deletes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = open(tmp.path());
        let meta = store.insert(NewImage::new(&b"bye"[..], ImageType::Jpeg)).unwrap();

        assert!(store.remove(&meta.id).unwrap());
        assert!(!store.remove(&meta.id).unwrap());
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[test]
    fn open_purges_leftover_images_only() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join(format!("{}.png", ImageId::generate()));
        let unrelated = tmp.path().join("README.txt");
        fs::write(&stale, b"old").unwrap();
        fs::write(&unrelated, b"keep me").unwrap();

        let (store, _) = open(tmp.path());
        assert!(store.is_empty());
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn missing_file_reads_as_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = open(tmp.path());
        let meta = store.insert(NewImage::new(&b"x"[..], ImageType::Png)).unwrap();
        fs::remove_file(tmp.path().join(format!("{}.png", meta.id))).unwrap();
        assert_eq!(store.get(&meta.id).unwrap(), Lookup::NotFound);
        assert_eq!(store.len(), 0);
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn undeletable_expired_file_still_reads_as_expired() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, clock) = open(tmp.path());
        let meta = store.insert(NewImage::new(&b"x"[..], ImageType::Png)).unwrap();

        // A non-empty directory in the file's place makes remove_file fail.
        let path = tmp.path().join(format!("{}.png", meta.id));
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("pin"), b"").unwrap();

        clock.advance(Duration::hours(1));
        assert_eq!(store.get(&meta.id).unwrap(), Lookup::Expired);
        assert_eq!(store.get(&meta.id).unwrap(), Lookup::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn insert_past_the_calendar_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, clock) = open(tmp.path());
        clock.set(DateTime::<Utc>::MAX_UTC - Duration::minutes(1));

        let result = store.insert(NewImage::new(&b"x"[..], ImageType::Png));
        assert!(matches!(result, Err(StoreError::ExpiryOutOfRange(_))));
        assert!(store.is_empty());
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[test]
    fn parallel_inserts_lose_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = open(tmp.path());
        let store = Arc::new(store);

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let ty = if i % 2 == 0 { ImageType::Png } else { ImageType::Jpeg };
                    store.insert(NewImage::new(vec![i as u8; 16], ty)).unwrap().id
                })
            })
            .collect();
        let ids: HashSet<ImageId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(ids.len(), 100);
        assert_eq!(store.len(), 100);
        assert_eq!(store.total_bytes(), 100 * 16);
        assert_eq!(file_count(tmp.path()), 100);
        for id in &ids {
            assert!(store.get(id).unwrap().is_found());
        }
    }

    #[test]
    fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/uploads");
        let (store, _) = open(&nested);
        assert_eq!(store.dir(), nested.as_path());
        assert!(nested.is_dir());
    }
}
