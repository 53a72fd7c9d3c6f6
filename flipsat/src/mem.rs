//! Pluggable memory accounting.
//!
//! The engine owns its storage as ordinary vectors, but every growth or release of the large
//! per-variable, per-clause and per-literal tables is granted by a [`MemoryManager`]. This lets a
//! caller cap the memory of an engine instance (e.g. inside a portfolio) and lets the engine
//! report its peak usage. Refusal is fatal for the current run.
use std::mem::size_of;

use thiserror::Error;

/// Grants byte budgets to an engine instance.
pub trait MemoryManager: Send {
    /// Called before a new table of `bytes` bytes is created. Returns `false` to refuse.
    fn allocate(&mut self, bytes: usize) -> bool;

    /// Called when a table changes its capacity. Returns `false` to refuse.
    fn reallocate(&mut self, old_bytes: usize, new_bytes: usize) -> bool;

    /// Called when a table is released.
    fn free(&mut self, bytes: usize);
}

/// Manager that grants every request.
#[derive(Default)]
pub struct HeapManager;

impl MemoryManager for HeapManager {
    fn allocate(&mut self, _bytes: usize) -> bool {
        true
    }

    fn reallocate(&mut self, _old_bytes: usize, _new_bytes: usize) -> bool {
        true
    }

    fn free(&mut self, _bytes: usize) {}
}

/// Manager that refuses requests exceeding a fixed byte limit.
pub struct BoundedManager {
    limit: usize,
    in_use: usize,
}

impl BoundedManager {
    pub fn new(limit: usize) -> BoundedManager {
        BoundedManager { limit, in_use: 0 }
    }

    /// Bytes currently granted.
    pub fn in_use(&self) -> usize {
        self.in_use
    }
}

impl MemoryManager for BoundedManager {
    fn allocate(&mut self, bytes: usize) -> bool {
        if self.in_use + bytes > self.limit {
            return false;
        }
        self.in_use += bytes;
        true
    }

    fn reallocate(&mut self, old_bytes: usize, new_bytes: usize) -> bool {
        let in_use = self.in_use - old_bytes.min(self.in_use);
        if in_use + new_bytes > self.limit {
            return false;
        }
        self.in_use = in_use + new_bytes;
        true
    }

    fn free(&mut self, bytes: usize) {
        self.in_use -= bytes.min(self.in_use);
    }
}

/// Failure to obtain memory from the manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("out of memory: {requested} bytes requested with {allocated} bytes allocated")]
pub struct MemError {
    pub requested: usize,
    pub allocated: usize,
}

/// Accounting front end used by all engine tables.
pub struct Mem {
    manager: Box<dyn MemoryManager>,
    current: usize,
    max: usize,
}

impl Default for Mem {
    fn default() -> Mem {
        Mem::new(Box::new(HeapManager))
    }
}

impl Mem {
    pub fn new(manager: Box<dyn MemoryManager>) -> Mem {
        Mem {
            manager,
            current: 0,
            max: 0,
        }
    }

    /// Bytes currently held by tracked tables.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Peak of [`current`](Mem::current).
    pub fn max(&self) -> usize {
        self.max
    }

    fn bytes<T>(capacity: usize) -> usize {
        capacity * size_of::<T>()
    }

    fn grant(&mut self, old_bytes: usize, new_bytes: usize) -> Result<(), MemError> {
        let granted = if old_bytes == 0 {
            self.manager.allocate(new_bytes)
        } else {
            self.manager.reallocate(old_bytes, new_bytes)
        };
        if !granted {
            return Err(MemError {
                requested: new_bytes,
                allocated: self.current,
            });
        }
        self.current = self.current - old_bytes + new_bytes;
        self.max = self.max.max(self.current);
        Ok(())
    }

    /// A new table of `len` copies of `value`.
    pub fn alloc<T: Clone>(&mut self, len: usize, value: T) -> Result<Vec<T>, MemError> {
        self.grant(0, Self::bytes::<T>(len))?;
        Ok(vec![value; len])
    }

    /// Resize a tracked table, filling new entries with `value`.
    pub fn resize<T: Clone>(
        &mut self,
        table: &mut Vec<T>,
        len: usize,
        value: T,
    ) -> Result<(), MemError> {
        if len > table.capacity() {
            let old_bytes = Self::bytes::<T>(table.capacity());
            self.grant(old_bytes, Self::bytes::<T>(len))?;
            table.reserve_exact(len - table.len());
        }
        table.resize(len, value);
        Ok(())
    }

    /// Append to a tracked table, doubling its capacity when full.
    #[inline]
    pub fn push<T>(&mut self, table: &mut Vec<T>, value: T) -> Result<(), MemError> {
        if table.len() == table.capacity() {
            let old_capacity = table.capacity();
            let new_capacity = (old_capacity * 2).max(4);
            self.grant(
                Self::bytes::<T>(old_capacity),
                Self::bytes::<T>(new_capacity),
            )?;
            table.reserve_exact(new_capacity - table.len());
        }
        table.push(value);
        Ok(())
    }

    /// Shrink a tracked table's capacity to its length.
    pub fn fit<T>(&mut self, table: &mut Vec<T>) {
        let old_bytes = Self::bytes::<T>(table.capacity());
        table.shrink_to_fit();
        let new_bytes = Self::bytes::<T>(table.capacity());
        if new_bytes < old_bytes {
            if new_bytes == 0 {
                self.manager.free(old_bytes);
            } else {
                // Shrinking never exceeds a previous grant.
                let _ = self.manager.reallocate(old_bytes, new_bytes);
            }
            self.current -= old_bytes - new_bytes;
        }
    }

    /// Release a tracked table.
    pub fn release<T>(&mut self, table: &mut Vec<T>) {
        let bytes = Self::bytes::<T>(table.capacity());
        *table = vec![];
        if bytes > 0 {
            self.manager.free(bytes);
            self.current -= bytes;
        }
    }
}

impl Drop for Mem {
    fn drop(&mut self) {
        if self.current > 0 {
            self.manager.free(self.current);
        }
    }
}
