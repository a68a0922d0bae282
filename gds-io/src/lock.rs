use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

use crate::Allocator;

/// A mutex with a name, for guarding a container's stream access across threads.
pub struct NamedMutex<T> {
    name: String,
    inner: Mutex<T>,
}

/// An [`Allocator`] shared between threads.
pub type LockedAllocator = NamedMutex<Allocator>;

/// Holds a [`NamedMutex`] until dropped, on every exit path.
pub struct ScopedLock<'a, T> {
    name: &'a str,
    guard: MutexGuard<'a, T>,
}

impl<T> NamedMutex<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the lock is acquired.
    pub fn lock(&self) -> ScopedLock<'_, T> {
        let guard = self.inner.lock();
        log::trace!("acquired lock {}", self.name);
        ScopedLock {
            name: &self.name,
            guard,
        }
    }

    /// Acquire the lock only if it is free.
    pub fn try_lock(&self) -> Option<ScopedLock<'_, T>> {
        let guard = self.inner.try_lock()?;
        log::trace!("acquired lock {}", self.name);
        Some(ScopedLock {
            name: &self.name,
            guard,
        })
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> Deref for ScopedLock<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for ScopedLock<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for ScopedLock<'_, T> {
    fn drop(&mut self) {
        log::trace!("released lock {}", self.name);
    }
}
