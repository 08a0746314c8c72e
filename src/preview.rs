//! Preview handles
//!
//! Each media item owns exactly one [`PreviewHandle`]. The handle releases its resource
//! through the issuing [`PreviewProvider`] when dropped, so removing an item (or dropping
//! the whole store) releases its preview exactly once.

use crate::media::MediaFile;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Source of revocable display resources (object URLs, temp files, GPU textures...)
pub trait PreviewProvider: Send + Sync {
    /// Create a display resource for the file, returning its locator
    fn acquire(&self, file: &MediaFile) -> String;

    /// Release a locator previously returned by `acquire`
    fn release(&self, locator: &str);
}

/// Owned preview resource; released on drop
pub struct PreviewHandle {
    locator: String,
    provider: Arc<dyn PreviewProvider>,
}

impl PreviewHandle {
    pub fn acquire(provider: Arc<dyn PreviewProvider>, file: &MediaFile) -> Self {
        let locator = provider.acquire(file);
        Self { locator, provider }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        debug!(preview = %self.locator, "Releasing preview");
        self.provider.release(&self.locator);
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.locator).finish()
    }
}

/// In-process registry minting `blob:` style locators and tracking which are live
#[derive(Default)]
pub struct ObjectUrlRegistry {
    next: AtomicU64,
    live: Mutex<HashSet<String>>,
    released: AtomicU64,
}

impl ObjectUrlRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_live(&self, locator: &str) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(locator)
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }
}

impl PreviewProvider for ObjectUrlRegistry {
    fn acquire(&self, file: &MediaFile) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let locator = format!("blob:content-studio/{}/{}", n, file.name());
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locator.clone());
        locator
    }

    fn release(&self, locator: &str) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(locator);
        if removed {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_handle_released_once_on_drop() {
        let registry = ObjectUrlRegistry::new();
        let file = MediaFile::new("a.png", "image/png", Utc::now(), vec![1, 2, 3]);

        let handle = PreviewHandle::acquire(registry.clone(), &file);
        let locator = handle.locator().to_string();
        assert!(registry.is_live(&locator));
        assert_eq!(registry.live_count(), 1);

        drop(handle);
        assert!(!registry.is_live(&locator));
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn test_locators_are_unique() {
        let registry = ObjectUrlRegistry::new();
        let file = MediaFile::new("a.png", "image/png", Utc::now(), vec![1]);

        let a = PreviewHandle::acquire(registry.clone(), &file);
        let b = PreviewHandle::acquire(registry.clone(), &file);
        assert_ne!(a.locator(), b.locator());
        assert_eq!(registry.live_count(), 2);
    }
}
