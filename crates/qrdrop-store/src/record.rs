use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use qrdrop_types::{ImageId, ImageType};

use crate::error::{StoreError, StoreResult};

/// An accepted upload that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewImage {
    /// The payload exactly as accepted.
    pub bytes: Bytes,
    /// Content type established by the upload gate.
    pub content_type: ImageType,
}

impl NewImage {
    pub fn new(bytes: impl Into<Bytes>, content_type: ImageType) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }
}

/// Everything about a stored image except its bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMeta {
    pub id: ImageId,
    pub content_type: ImageType,
    /// Payload length in bytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
    /// Always strictly after `created_at`.
    pub expires_at: DateTime<Utc>,
}

impl ImageMeta {
    pub(crate) fn new(
        id: ImageId,
        content_type: ImageType,
        size: u64,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> StoreResult<Self> {
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or(StoreError::ExpiryOutOfRange(created_at))?;
        Ok(Self {
            id,
            content_type,
            size,
            created_at,
            expires_at,
        })
    }

    /// Whether a lookup at `now` may return this record.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Time left before expiry, clamped at zero.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// A stored image as returned by a successful lookup.
///
/// `bytes` is a shared handle onto the store's copy, so returning a record
/// does not duplicate the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredImage {
    pub meta: ImageMeta,
    pub bytes: Bytes,
}

impl StoredImage {
    pub fn id(&self) -> ImageId {
        self.meta.id
    }

    pub fn content_type(&self) -> ImageType {
        self.meta.content_type
    }
}

/// Result of looking an identifier up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// The record exists and is still visible.
    Found(StoredImage),
    /// No record with this id exists (never created, or already removed).
    NotFound,
    /// The record existed but its window has passed. It has been removed.
    Expired,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_at(created: DateTime<Utc>, ttl: Duration) -> ImageMeta {
        ImageMeta::new(ImageId::generate(), ImageType::Png, 3, created, ttl).unwrap()
    }

    #[test]
    fn visible_strictly_before_expiry() {
        let created = DateTime::from_timestamp(1_000_000, 0).unwrap();
        let meta = meta_at(created, Duration::hours(1));
        assert!(meta.is_visible_at(created));
        assert!(meta.is_visible_at(meta.expires_at - Duration::milliseconds(1)));
        assert!(!meta.is_visible_at(meta.expires_at));
    }

    #[test]
    fn remaining_is_clamped() {
        let created = DateTime::from_timestamp(1_000_000, 0).unwrap();
        let meta = meta_at(created, Duration::seconds(90));
        assert_eq!(meta.remaining_at(created), Duration::seconds(90));
        assert_eq!(
            meta.remaining_at(created + Duration::hours(2)),
            Duration::zero()
        );
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let created = DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        let ttl = Duration::hours(2);
        let result = ImageMeta::new(ImageId::generate(), ImageType::Png, 3, created, ttl);
        assert!(matches!(result, Err(StoreError::ExpiryOutOfRange(at)) if at == created));
    }
}
