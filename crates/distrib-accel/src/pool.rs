use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{AccelError, Result};

/// A fixed-size pool of accelerator slots.
///
/// `reserve()` acquires a semaphore permit, then claims the lowest-indexed
/// free slot via an atomic compare-exchange scan — the same
/// acquire-then-CAS-scan shape as a producer claiming a ring slot by
/// `fetch_add`-and-bounds-check, generalized here to a release/reclaim
/// cycle rather than a one-shot registration. The semaphore count bounds the
/// number of outstanding reservations to the slot count, so the CAS scan is
/// always guaranteed to find a free slot.
#[derive(Clone)]
pub struct AcceleratorPool {
    semaphore: Arc<Semaphore>,
    slots: Arc<Vec<AtomicBool>>,
}

impl AcceleratorPool {
    /// Builds a pool with exactly `n` slots, all initially free.
    pub fn new(n: usize) -> Self {
        let slots = (0..n).map(|_| AtomicBool::new(false)).collect();
        Self {
            semaphore: Arc::new(Semaphore::new(n)),
            slots: Arc::new(slots),
        }
    }

    /// Discovers pool size from `ACCEL_VISIBLE`, a comma-separated list of
    /// accelerator indices (e.g. `"0,1,3"`). Falls back to a single slot if
    /// the variable is unset, for local development without accelerators.
    /// Fails if the list names the same index twice.
    pub fn discover() -> Result<Self> {
        match std::env::var("ACCEL_VISIBLE") {
            Err(_) => Ok(Self::new(1)),
            Ok(list) if list.trim().is_empty() => Ok(Self::new(1)),
            Ok(list) => {
                let mut seen = HashSet::new();
                let mut count = 0;
                for tok in list.split(',') {
                    let idx: usize = tok.trim().parse().map_err(|_| {
                        AccelError::Unavailable(format!("invalid ACCEL_VISIBLE entry: {tok:?}"))
                    })?;
                    if !seen.insert(idx) {
                        return Err(AccelError::Unavailable(format!(
                            "ACCEL_VISIBLE lists slot {idx} more than once"
                        )));
                    }
                    count += 1;
                }
                if count == 0 {
                    return Err(AccelError::Unavailable(
                        "ACCEL_VISIBLE parsed to zero slots".to_string(),
                    ));
                }
                Ok(Self::new(count))
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Awaits a free slot and returns a guard that releases it on drop.
    pub async fn reserve(&self) -> Reservation {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("pool semaphore is never closed");
        let id = self
            .slots
            .iter()
            .position(|flag| {
                flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            })
            .expect("semaphore permit implies a free slot exists");

        Reservation {
            slots: Arc::clone(&self.slots),
            id,
            _permit: permit,
        }
    }
}

/// A held accelerator slot. The slot is released and the semaphore permit
/// returned when this value is dropped.
pub struct Reservation {
    slots: Arc<Vec<AtomicBool>>,
    id: usize,
    _permit: OwnedSemaphorePermit,
}

impl Reservation {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.slots[self.id].store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_then_release_allows_reuse() {
        let pool = AcceleratorPool::new(2);
        let r1 = pool.reserve().await;
        let r2 = pool.reserve().await;
        assert_ne!(r1.id(), r2.id());
        drop(r1);
        let r3 = pool.reserve().await;
        assert!(r3.id() < 2);
    }

    #[tokio::test]
    async fn reserve_blocks_when_pool_is_exhausted() {
        let pool = AcceleratorPool::new(1);
        let r1 = pool.reserve().await;
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move {
            let _r2 = pool2.reserve().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(r1);
        waiter.await.unwrap();
    }

    #[test]
    fn discover_rejects_duplicate_indices() {
        std::env::set_var("ACCEL_VISIBLE", "0,1,0");
        let result = AcceleratorPool::discover();
        std::env::remove_var("ACCEL_VISIBLE");
        assert!(result.is_err());
    }

    #[test]
    fn discover_falls_back_to_single_slot() {
        std::env::remove_var("ACCEL_VISIBLE");
        let pool = AcceleratorPool::discover().unwrap();
        assert_eq!(pool.capacity(), 1);
    }
}
