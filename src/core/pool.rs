//! Bounded, blocking pool of reusable resources
//!
//! Resources are expensive to build, so the pool creates them lazily and
//! never holds more than `max_count` of them. Callers [`rent`] a [`Lease`];
//! dropping the lease puts the resource back on the idle stack, where the
//! next caller picks up the most recently returned one.
//!
//! When every resource is leased out and the limit is reached, `rent` blocks
//! until a lease is released. Waiters are not served in FIFO order.
//!
//! [`rent`]: ResourcePool::rent

use crate::error::{BoxError, Result, XRefError};
use parking_lot::{Condvar, Mutex};
use std::ops::{Deref, DerefMut};
use tracing::debug;

type Factory<T> = Box<dyn Fn() -> std::result::Result<T, BoxError> + Send + Sync>;

struct PoolState<T> {
    /// Returned resources, most recent last
    idle: Vec<T>,
    /// Resources that exist right now, idle or leased
    live: usize,
    /// Factory calls in flight; they hold a capacity slot
    pending: usize,
    leased: usize,
    /// Total successful factory calls
    created: usize,
    disposed: bool,
}

impl<T> PoolState<T> {
    fn has_capacity(&self, max_count: usize) -> bool {
        self.live + self.pending < max_count
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Resources constructed over the pool's lifetime
    pub created: usize,
    /// Resources waiting to be rented
    pub idle: usize,
    /// Resources currently handed out
    pub leased: usize,
    pub max_count: usize,
}

/// Thread-safe pool of at most `max_count` resources
pub struct ResourcePool<T> {
    factory: Factory<T>,
    max_count: usize,
    state: Mutex<PoolState<T>>,
    returned: Condvar,
}

impl<T> ResourcePool<T> {
    /// Create an empty pool
    ///
    /// `factory` is called lazily, at most `max_count` times while resources
    /// are alive. Fails with `InvalidArgument` if `max_count` is zero.
    pub fn new<F>(factory: F, max_count: usize) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        if max_count == 0 {
            return Err(XRefError::InvalidArgument(
                "pool max_count must be at least 1".to_string(),
            ));
        }

        Ok(ResourcePool {
            factory: Box::new(factory),
            max_count,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
                pending: 0,
                leased: 0,
                created: 0,
                disposed: false,
            }),
            returned: Condvar::new(),
        })
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Rent a resource, blocking while the pool is exhausted
    ///
    /// # Errors
    ///
    /// - `ResourceFactory` if a new resource had to be built and the factory
    ///   failed; the capacity slot is given back.
    /// - `InvalidState` if the pool is, or becomes, disposed.
    pub fn rent(&self) -> Result<Lease<'_, T>> {
        let mut state = self.state.lock();
        loop {
            if state.disposed {
                return Err(Self::disposed_error());
            }
            if let Some(resource) = state.idle.pop() {
                state.leased += 1;
                return Ok(Lease::new(self, resource));
            }
            if state.has_capacity(self.max_count) {
                state.pending += 1;
                drop(state);
                return self.construct().map(|resource| Lease::new(self, resource));
            }
            self.returned.wait(&mut state);
        }
    }

    /// Rent a resource if one is idle or can still be built
    ///
    /// Returns `Ok(None)` instead of blocking when the pool is exhausted.
    pub fn try_rent(&self) -> Result<Option<Lease<'_, T>>> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(Self::disposed_error());
        }
        if let Some(resource) = state.idle.pop() {
            state.leased += 1;
            return Ok(Some(Lease::new(self, resource)));
        }
        if !state.has_capacity(self.max_count) {
            return Ok(None);
        }
        state.pending += 1;
        drop(state);
        self.construct().map(|resource| Some(Lease::new(self, resource)))
    }

    /// Run the factory for a slot already reserved in `pending`
    fn construct(&self) -> Result<T> {
        let slot = PendingSlot { pool: self };
        let resource = (self.factory)().map_err(XRefError::ResourceFactory)?;
        slot.commit();
        Ok(resource)
    }

    fn give_back(&self, resource: T) {
        let mut state = self.state.lock();
        state.leased -= 1;
        if state.disposed {
            state.live -= 1;
            drop(state);
            // destroyed outside the lock
            drop(resource);
            return;
        }
        state.idle.push(resource);
        drop(state);
        self.returned.notify_one();
    }

    /// Destroy all idle resources and refuse further rentals
    ///
    /// Does not wait for outstanding leases; their resources are destroyed
    /// when the lease ends. Blocked `rent` calls fail with `InvalidState`.
    /// Disposing twice is a no-op.
    pub fn dispose(&self) {
        let idle = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            let idle = std::mem::take(&mut state.idle);
            state.live -= idle.len();
            idle
        };
        self.returned.notify_all();
        debug!("Disposed resource pool, destroying {} idle resources", idle.len());
        drop(idle);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            created: state.created,
            idle: state.idle.len(),
            leased: state.leased,
            max_count: self.max_count,
        }
    }

    fn disposed_error() -> XRefError {
        XRefError::InvalidState("resource pool is disposed".to_string())
    }
}

/// Capacity slot held while the factory runs
///
/// Released on failure or panic so a waiter can retry construction.
struct PendingSlot<'a, T> {
    pool: &'a ResourcePool<T>,
}

impl<T> PendingSlot<'_, T> {
    fn commit(self) {
        {
            let mut state = self.pool.state.lock();
            state.pending -= 1;
            state.live += 1;
            state.leased += 1;
            state.created += 1;
            debug!("Created pooled resource {}/{}", state.created, self.pool.max_count);
        }
        std::mem::forget(self);
    }
}

impl<T> Drop for PendingSlot<'_, T> {
    fn drop(&mut self) {
        self.pool.state.lock().pending -= 1;
        self.pool.returned.notify_one();
    }
}

/// Exclusive use of one pooled resource
///
/// The resource goes back to the pool exactly once: when the lease is
/// dropped or passed to [`Lease::release`].
pub struct Lease<'a, T> {
    pool: &'a ResourcePool<T>,
    resource: Option<T>,
}

impl<'a, T> Lease<'a, T> {
    fn new(pool: &'a ResourcePool<T>, resource: T) -> Self {
        Lease {
            pool,
            resource: Some(resource),
        }
    }

    /// Return the resource to the pool now
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!("lease resource is only taken on drop"),
        }
    }
}

impl<T> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.resource {
            Some(resource) => resource,
            None => unreachable!("lease resource is only taken on drop"),
        }
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.give_back(resource);
        }
    }
}
