//! Nullable store: in-memory storage with switchable failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use governdao_store::{MemoryStore, StateStore, StoreError};

/// An in-memory [`StateStore`] whose reads and writes can be made to fail.
#[derive(Default)]
pub struct NullStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `load` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `save` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read a raw value, bypassing failure injection (for assertions).
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.load(key).ok().flatten()
    }
}

impl StateStore for NullStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("injected read failure for {key}")));
        }
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("injected write failure for {key}")));
        }
        self.inner.save(key, value)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failures_leave_contents_untouched() {
        let store = NullStore::new();
        store.save("k", "v").unwrap();
        store.fail_writes(true);
        assert!(store.save("k", "w").is_err());
        store.fail_reads(true);
        assert!(store.load("k").is_err());
        assert_eq!(store.raw("k").as_deref(), Some("v"));
        assert_eq!(store.write_count(), 1);
    }
}
