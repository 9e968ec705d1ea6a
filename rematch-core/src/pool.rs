//! Reusable per-search state
//!
//! Executors need scratch memory proportional to the program and the input.
//! A [`Pool`] keeps released values around so the next search on the same
//! [`Regex`](crate::Regex) can reuse their allocations. Acquiring never
//! blocks: under contention a fresh value is built instead.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct Pool<T> {
    stack: Mutex<Vec<Box<T>>>,
}

impl<T: Default> Pool<T> {
    pub fn new() -> Self {
        Pool {
            stack: Mutex::new(Vec::new()),
        }
    }

    /// Take a value out of the pool, or build one if none is free.
    pub fn get(&self) -> PoolGuard<'_, T> {
        let value = match self.stack.try_lock() {
            Ok(mut stack) => stack.pop(),
            Err(_) => None,
        };
        PoolGuard {
            pool: self,
            value: Some(value.unwrap_or_default()),
        }
    }

    /// Number of values waiting to be reused.
    #[cfg(test)]
    fn idle(&self) -> usize {
        self.stack.lock().map_or(0, |stack| stack.len())
    }
}

/// A value borrowed from a [`Pool`], returned to it on drop.
#[derive(Debug)]
pub(crate) struct PoolGuard<'p, T: Default> {
    pool: &'p Pool<T>,
    value: Option<Box<T>>,
}

impl<T: Default> Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pool value taken before drop"),
        }
    }
}

impl<T: Default> DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pool value taken before drop"),
        }
    }
}

impl<T: Default> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take()
            && let Ok(mut stack) = self.pool.stack.try_lock()
        {
            stack.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse() {
        let pool: Pool<Vec<u32>> = Pool::new();
        {
            let mut value = pool.get();
            value.push(7);
        }
        assert_eq!(pool.idle(), 1);
        let value = pool.get();
        assert_eq!(*value, vec![7]);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_nested_get() {
        let pool: Pool<Vec<u32>> = Pool::new();
        let first = pool.get();
        let second = pool.get();
        assert!(first.is_empty() && second.is_empty());
        drop(first);
        drop(second);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_threads() {
        let pool: Pool<Vec<usize>> = Pool::new();
        std::thread::scope(|s| {
            for i in 0..4 {
                let pool = &pool;
                s.spawn(move || {
                    for _ in 0..100 {
                        let mut value = pool.get();
                        value.clear();
                        value.push(i);
                        assert_eq!(*value, vec![i]);
                    }
                });
            }
        });
        assert!(pool.idle() >= 1);
    }
}
