//! Error types for the pool layer.

/// Errors returned by [`BoundedResourcePool::get`](crate::BoundedResourcePool::get).
///
/// Running out of capacity is not an error: `get` waits and `try_get`
/// returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The cancellation token fired before an object became available.
    /// Nothing was acquired.
    #[error("acquisition cancelled")]
    Cancelled,

    /// The pool was closed while waiting.
    #[error("pool is closed")]
    Closed,
}
