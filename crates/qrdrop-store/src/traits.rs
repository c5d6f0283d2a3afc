use chrono::{DateTime, Utc};
use qrdrop_types::ImageId;

use crate::error::StoreResult;
use crate::record::{ImageMeta, Lookup, NewImage};

/// Time-bounded image store.
///
/// All implementations must satisfy these invariants:
/// - Every id handed out by `insert` is unique for the life of the store.
///   A colliding id is regenerated, never overwritten.
/// - `get` never returns a record whose `expires_at` is at or before the
///   store clock's current time.
/// - `sweep` runs under a single exclusive guard, so a concurrent `get`
///   observes either the state before the sweep or after it.
/// - No guard is held across file or network I/O.
pub trait ImageStore: Send + Sync {
    /// Store a validated image and return its metadata, including the
    /// freshly allocated id and expiry.
    fn insert(&self, image: NewImage) -> StoreResult<ImageMeta>;

    /// Look an id up.
    ///
    /// An expired record is removed as part of the call and reported as
    /// [`Lookup::Expired`]; subsequent lookups report [`Lookup::NotFound`].
    fn get(&self, id: &ImageId) -> StoreResult<Lookup>;

    /// Remove a record. Returns `true` if it existed.
    ///
    /// Removing an unknown id is a no-op, not an error.
    fn remove(&self, id: &ImageId) -> StoreResult<bool>;

    /// Remove every record with `expires_at <= now` and return how many
    /// were removed.
    fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    /// Number of records physically present, including expired records
    /// not yet swept.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes held.
    fn total_bytes(&self) -> u64;
}
