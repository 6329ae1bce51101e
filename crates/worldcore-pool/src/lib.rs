//! Bounded resource pooling for worldcore.
//!
//! Player actions that need an expensive helper (a pathfinder, a scratch
//! buffer) borrow one from a [`BoundedResourcePool`] and give it back by
//! dropping the [`Pooled`] guard. When the pool is at capacity,
//! [`BoundedResourcePool::get`] suspends until something is returned or
//! the caller's [`CancellationToken`] fires.

mod cancel;
mod error;
mod pool;

pub use cancel::CancellationToken;
pub use error::PoolError;
pub use pool::{BoundedResourcePool, FnPolicy, PoolConfig, PoolPolicy, Pooled};
