//! Fixed-size pool of extractors, each leased to one document at a time.

use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard};

use tracing::trace;

use crate::error::{LicexError, Result};
use crate::extractor::DocumentExtractor;

/// Extractors guarded by per-instance busy flags.
pub struct ExtractorPool {
    extractors: Vec<DocumentExtractor>,
    busy: Mutex<Vec<bool>>,
    released: Condvar,
}

impl ExtractorPool {
    pub fn new(extractors: Vec<DocumentExtractor>) -> Result<Self> {
        if extractors.is_empty() {
            return Err(LicexError::EmptyPool);
        }
        let busy = Mutex::new(vec![false; extractors.len()]);
        Ok(Self {
            extractors,
            busy,
            released: Condvar::new(),
        })
    }

    /// Pool of `size` extractors built by `build`.
    pub fn build(size: usize, mut build: impl FnMut() -> Result<DocumentExtractor>) -> Result<Self> {
        let extractors = (0..size.max(1)).map(|_| build()).collect::<Result<Vec<_>>>()?;
        Self::new(extractors)
    }

    pub fn size(&self) -> usize {
        self.extractors.len()
    }

    /// Number of instances currently leased.
    pub fn in_use(&self) -> usize {
        self.flags().iter().filter(|b| **b).count()
    }

    /// Lease a free extractor, or `None` when all are busy.
    pub fn lease(&self) -> Option<Lease<'_>> {
        let mut busy = self.flags();
        self.take_free(&mut busy)
    }

    /// Lease a free extractor, waiting until one is released.
    pub fn lease_blocking(&self) -> Lease<'_> {
        let mut busy = self.flags();
        loop {
            if let Some(lease) = self.take_free(&mut busy) {
                return lease;
            }
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    fn take_free(&self, busy: &mut [bool]) -> Option<Lease<'_>> {
        let index = busy.iter().position(|b| !*b)?;
        busy[index] = true;
        trace!("Leased extractor {}", index);
        Some(Lease { pool: self, index })
    }

    // A panic while leased must not wedge the pool
    fn flags(&self) -> MutexGuard<'_, Vec<bool>> {
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, index: usize) {
        self.flags()[index] = false;
        trace!("Released extractor {}", index);
        self.released.notify_one();
    }
}

/// Exclusive use of one pooled extractor; released on drop.
pub struct Lease<'p> {
    pool: &'p ExtractorPool,
    index: usize,
}

impl Lease<'_> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for Lease<'_> {
    type Target = DocumentExtractor;

    fn deref(&self) -> &DocumentExtractor {
        &self.pool.extractors[self.index]
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}
