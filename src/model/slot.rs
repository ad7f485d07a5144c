//! Lazily loaded, individually releasable resource slot.
//!
//! Each slot has its own lock, so loading one resource never waits on another
//! resource's load or release. Handles are shared as `Arc`s: a release drops
//! the slot's reference while holding the lock, and workers already holding a
//! handle keep a fully usable value until they let go of it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Result;

pub struct ModelSlot<T> {
    name: &'static str,
    handle: Mutex<Option<Arc<T>>>,
}

impl<T> ModelSlot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached handle, or build it with `load` and cache it.
    ///
    /// A failed load leaves the slot empty so a later call can retry.
    pub fn get_or_try_load<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut guard = self.handle.lock();
        if let Some(handle) = guard.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(load()?);
        *guard = Some(Arc::clone(&handle));
        tracing::info!(resource = self.name, "loaded");
        Ok(handle)
    }

    /// The cached handle, without loading.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.handle.lock().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Drop the cached handle. Returns whether anything was loaded.
    pub fn release(&self) -> bool {
        let mut guard = self.handle.lock();
        match guard.take() {
            Some(handle) => {
                // Only the slot's reference goes here, under the lock; the
                // value itself is freed by whichever holder drops it last.
                drop(handle);
                tracing::info!(resource = self.name, "released");
                true
            }
            None => false,
        }
    }
}

impl<T> fmt::Debug for ModelSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
