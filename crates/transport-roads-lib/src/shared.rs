//! Thread-safe handle to a datastore
//!
//! A single coarse read/write lock serializes surface updates against queries, so a
//! sort-then-paginate listing always sees a consistent set of last-modified markers.

use crate::{DataError, Datastore, Result};
use std::sync::{Arc, RwLock};

/// Cloneable, shareable datastore guarded by one `RwLock`
#[derive(Clone, Debug, Default)]
pub struct SharedDatastore {
    inner: Arc<RwLock<Datastore>>,
}

impl SharedDatastore {
    pub fn new(datastore: Datastore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(datastore)),
        }
    }

    /// Run `f` with shared access. Any number of readers may run at once.
    pub fn read<R>(&self, f: impl FnOnce(&Datastore) -> R) -> Result<R> {
        let guard = self.inner.read().map_err(|_| DataError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access
    pub fn write<R>(&self, f: impl FnOnce(&mut Datastore) -> R) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| DataError::LockPoisoned)?;
        Ok(f(&mut guard))
    }
}

impl From<Datastore> for SharedDatastore {
    fn from(datastore: Datastore) -> Self {
        Self::new(datastore)
    }
}
