//! Capacity-limited pool of expensive-to-build helper objects.
//!
//! Typical residents are pathfinding solvers and other CPU-bound scratch
//! structures: costly to construct, used for a few milliseconds per player
//! action, then handed back.
//!
//! # How capacity is enforced
//!
//! A semaphore holds `maximum_retained` permits. Every checked-out object
//! carries one permit, so checked-out objects can never exceed the limit.
//! An object is only constructed by a permit holder that found the idle
//! list empty, which keeps the number of constructed objects within the
//! limit too. Construction runs outside every lock; the only thing behind
//! the mutex is a `Vec` push/pop.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{CancellationToken, PoolError};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How pooled objects are built and recycled.
pub trait PoolPolicy<T>: Send + Sync + 'static {
    /// Builds a fresh object. Called without any pool lock held.
    fn create(&self) -> T;

    /// Resets an object that is being returned.
    ///
    /// Return `false` to discard it instead of keeping it for reuse; the
    /// pool may then construct a replacement later. Default: keep.
    fn on_return(&self, _object: &mut T) -> bool {
        true
    }
}

/// A [`PoolPolicy`] that builds objects with a closure and keeps them all.
pub struct FnPolicy<F>(pub F);

impl<T, F> PoolPolicy<T> for FnPolicy<F>
where
    F: Fn() -> T + Send + Sync + 'static,
{
    fn create(&self) -> T {
        (self.0)()
    }
}

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Pool sizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on objects in existence. `None` uses
    /// [`PoolConfig::default_capacity`].
    pub maximum_retained: Option<usize>,
}

impl PoolConfig {
    /// Twice the number of parallel execution units: pooled helpers are
    /// held briefly for CPU-bound work, not for long waits.
    pub fn default_capacity() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            * 2
    }

    /// The effective capacity (never 0).
    pub fn maximum_retained(&self) -> usize {
        self.maximum_retained
            .unwrap_or_else(Self::default_capacity)
            .max(1)
    }
}

// ---------------------------------------------------------------------------
// BoundedResourcePool
// ---------------------------------------------------------------------------

/// A pool that never lets more than `maximum_retained` objects exist.
///
/// Objects are handed out as [`Pooled`] guards; dropping the guard is the
/// only way to give an object back, so returning twice or returning an
/// object from another pool cannot be expressed.
pub struct BoundedResourcePool<T> {
    name: String,
    maximum_retained: usize,
    permits: Semaphore,
    idle: Mutex<Vec<T>>,
    created: AtomicUsize,
    policy: Box<dyn PoolPolicy<T>>,
}

impl<T: Send + 'static> BoundedResourcePool<T> {
    /// Creates an empty pool. Objects are built lazily on demand.
    pub fn new(name: impl Into<String>, config: &PoolConfig, policy: impl PoolPolicy<T>) -> Self {
        let name = name.into();
        let maximum_retained = config.maximum_retained();
        tracing::info!(pool = %name, maximum_retained, "resource pool created");
        Self {
            name,
            maximum_retained,
            permits: Semaphore::new(maximum_retained),
            idle: Mutex::new(Vec::with_capacity(maximum_retained)),
            created: AtomicUsize::new(0),
            policy: Box::new(policy),
        }
    }

    /// Shorthand for a pool built with a closure.
    pub fn with_factory<F>(name: impl Into<String>, config: &PoolConfig, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(name, config, FnPolicy(factory))
    }

    /// Waits for an object.
    ///
    /// Resolves as soon as a returned object is available or a new one may
    /// be constructed. Waiters are not served in FIFO order.
    ///
    /// # Errors
    /// - [`PoolError::Cancelled`] if `cancel` fires first. No capacity is
    ///   consumed in that case.
    /// - [`PoolError::Closed`] if the pool was closed.
    pub async fn get(&self, cancel: &CancellationToken) -> Result<Pooled<'_, T>, PoolError> {
        if cancel.is_cancelled() {
            return Err(PoolError::Cancelled);
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(pool = %self.name, "acquisition cancelled");
                return Err(PoolError::Cancelled);
            }
            permit = self.permits.acquire() => permit.map_err(|_| PoolError::Closed)?,
        };

        Ok(self.check_out(permit))
    }

    /// Takes an object if one can be had without waiting.
    ///
    /// `None` means the pool is at capacity right now.
    pub fn try_get(&self) -> Option<Pooled<'_, T>> {
        self.permits
            .try_acquire()
            .ok()
            .map(|permit| self.check_out(permit))
    }

    /// Closes the pool: pending and future `get` calls fail with
    /// [`PoolError::Closed`]. Objects already out can still be returned.
    pub fn close(&self) {
        self.permits.close();
        tracing::info!(pool = %self.name, "resource pool closed");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn maximum_retained(&self) -> usize {
        self.maximum_retained
    }

    /// Objects currently checked out.
    pub fn checked_out(&self) -> usize {
        self.maximum_retained - self.permits.available_permits()
    }

    /// Idle objects ready for reuse.
    pub fn available(&self) -> usize {
        self.idle.lock().len()
    }

    /// Objects currently in existence (idle + checked out).
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Acquire)
    }

    fn check_out<'a>(&'a self, permit: SemaphorePermit<'a>) -> Pooled<'a, T> {
        let reused = self.idle.lock().pop();
        let object = match reused {
            Some(object) => object,
            None => {
                let object = self.policy.create();
                let created = self.created.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!(pool = %self.name, created, "constructed pooled object");
                object
            }
        };
        Pooled {
            pool: self,
            object: Some(object),
            _permit: permit,
        }
    }

    fn give_back(&self, mut object: T) {
        if self.policy.on_return(&mut object) {
            self.idle.lock().push(object);
        } else {
            self.created.fetch_sub(1, Ordering::AcqRel);
            tracing::debug!(pool = %self.name, "pooled object discarded on return");
        }
    }
}

impl<T> fmt::Debug for BoundedResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedResourcePool")
            .field("name", &self.name)
            .field("maximum_retained", &self.maximum_retained)
            .field("created", &self.created.load(Ordering::Relaxed))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pooled
// ---------------------------------------------------------------------------

/// A checked-out object. Dropping it returns the object to its pool and
/// frees one unit of capacity.
pub struct Pooled<'a, T: Send + 'static> {
    pool: &'a BoundedResourcePool<T>,
    object: Option<T>,
    // Declared last: released after `drop` has pushed the object back, so
    // the next permit holder finds it in the idle list.
    _permit: SemaphorePermit<'a>,
}

impl<T: Send + 'static> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.object.as_ref().expect("pooled object present until drop")
    }
}

impl<T: Send + 'static> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.object.as_mut().expect("pooled object present until drop")
    }
}

impl<T: Send + 'static> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(object) = self.object.take() {
            self.pool.give_back(object);
        }
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.object).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(k: usize) -> BoundedResourcePool<Vec<u32>> {
        BoundedResourcePool::with_factory(
            "test",
            &PoolConfig {
                maximum_retained: Some(k),
            },
            Vec::new,
        )
    }

    #[test]
    fn test_default_capacity_is_twice_parallelism() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.maximum_retained(), PoolConfig::default_capacity());
        assert!(cfg.maximum_retained() >= 2);
        assert_eq!(cfg.maximum_retained() % 2, 0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let cfg = PoolConfig {
            maximum_retained: Some(0),
        };
        assert_eq!(cfg.maximum_retained(), 1);
    }

    #[test]
    fn test_try_get_exhausts_at_capacity() {
        let pool = pool_of(2);
        let a = pool.try_get().expect("first");
        let b = pool.try_get().expect("second");

        assert!(pool.try_get().is_none());
        assert_eq!(pool.checked_out(), 2);
        assert_eq!(pool.created(), 2);

        drop(a);
        drop(b);
        assert_eq!(pool.checked_out(), 0);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_returned_object_is_reused_not_rebuilt() {
        let pool = pool_of(4);
        {
            let mut obj = pool.try_get().unwrap();
            obj.push(7);
        }
        let obj = pool.try_get().unwrap();

        assert_eq!(*obj, vec![7]);
        assert_eq!(pool.created(), 1);
    }

    struct ClearingPolicy;

    impl PoolPolicy<Vec<u32>> for ClearingPolicy {
        fn create(&self) -> Vec<u32> {
            Vec::new()
        }

        fn on_return(&self, object: &mut Vec<u32>) -> bool {
            object.clear();
            object.capacity() <= 16
        }
    }

    #[test]
    fn test_policy_resets_and_discards_on_return() {
        let pool = BoundedResourcePool::new(
            "clearing",
            &PoolConfig {
                maximum_retained: Some(1),
            },
            ClearingPolicy,
        );

        pool.try_get().unwrap().push(1);
        assert!(pool.try_get().unwrap().is_empty());
        assert_eq!(pool.created(), 1);

        pool.try_get().unwrap().extend(0..1_000);
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.created(), 0);
    }
}
