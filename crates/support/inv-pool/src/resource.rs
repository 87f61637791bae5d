//! Round-robin pool of long-lived client handles.

use inv_error::{ConfigError, InventoryError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

type HandleFactory<T> = Box<dyn Fn() -> Result<Arc<T>> + Send + Sync>;

/// Round-robin pool of expensive client handles.
///
/// Handles are built lazily by the factory, at most `capacity` of them, and
/// handed out in rotation. A returned handle is shared: other callers may be
/// using the same handle at the same time.
///
/// The handle list and cursor live under one mutex, held only for the
/// read-or-create-then-advance sequence of [`acquire`](Self::acquire).
pub struct ResourcePool<T: ?Sized> {
    name: String,
    capacity: usize,
    factory: HandleFactory<T>,
    state: Mutex<PoolState<T>>,
}

struct PoolState<T: ?Sized> {
    handles: Vec<Arc<T>>,
    cursor: usize,
}

impl<T: ?Sized> ResourcePool<T> {
    /// Create a pool that builds handles with `factory`.
    ///
    /// Fails when `capacity` is zero.
    pub fn new<F>(name: impl Into<String>, capacity: usize, factory: F) -> Result<Self>
    where
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let name = name.into();
        if capacity == 0 {
            return Err(InventoryError::Config(ConfigError::Invalid(format!(
                "pool '{name}' capacity must be >= 1"
            ))));
        }

        Ok(Self {
            name,
            capacity,
            factory: Box::new(factory),
            state: Mutex::new(PoolState {
                handles: Vec::with_capacity(capacity),
                cursor: 0,
            }),
        })
    }

    /// Return the next handle in rotation, building one while below capacity.
    ///
    /// A factory failure is returned to the caller and the pool keeps its
    /// previous size.
    pub fn acquire(&self) -> Result<Arc<T>> {
        let mut state = self.state.lock();

        if state.handles.len() < self.capacity {
            let handle = (self.factory)()?;
            state.handles.push(handle);
            debug!(
                pool = %self.name,
                size = state.handles.len(),
                capacity = self.capacity,
                "Built pooled client"
            );
        }

        let index = state.cursor;
        let handle = state
            .handles
            .get(index)
            .cloned()
            .ok_or_else(|| {
                InventoryError::Other(anyhow::anyhow!(
                    "pool '{}' cursor {} has no handle",
                    self.name,
                    index
                ))
            })?;
        state.cursor = (index + 1) % self.capacity;

        trace!(pool = %self.name, index, "Acquired pooled client");
        Ok(handle)
    }

    /// Number of handles built so far.
    pub fn len(&self) -> usize {
        self.state.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
