use rand::distributions::{Distribution, Uniform};

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A busy-waiting mutual exclusion lock with randomized exponential backoff
///
/// Contending threads retry the acquisition compare-exchange after spinning
/// for a random number of cycles drawn from an exponentially widening range,
/// so producers blocked on the same lock do not retry in lockstep. No
/// fairness guarantee: whichever thread wins the next exchange enters.
///
/// # Example
/// ```
/// use ripple::sync::spinlock::SpinLock;
///
/// let lock = SpinLock::new(0);
/// {
///   let mut guard = lock.lock();
///   *guard += 1;
/// }
/// assert_eq!(*lock.lock(), 1);
/// ```
pub struct SpinLock<T> {
  flag: AtomicBool,
  inner: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

pub struct SpinLockGuard<'a, T> {
  lock: &'a SpinLock<T>,
}

impl<'a, T> Drop for SpinLockGuard<'a, T> {
  fn drop(&mut self) {
    self.lock.flag.store(false, Ordering::Release);
  }
}

impl<'a, T> Deref for SpinLockGuard<'a, T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    unsafe { &*self.lock.inner.get() }
  }
}

impl<'a, T> DerefMut for SpinLockGuard<'a, T> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    unsafe { &mut *self.lock.inner.get() }
  }
}

impl<T> SpinLock<T> {
  pub fn new(value: T) -> Self {
    SpinLock {
      flag: AtomicBool::new(false),
      inner: UnsafeCell::new(value),
    }
  }

  fn try_lock(&self) -> bool {
    self
      .flag
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .is_ok()
  }

  pub fn lock(&self) -> SpinLockGuard<'_, T> {
    let mut backoff = 1u32;
    let mut rng = rand::thread_rng();
    while !self.try_lock() {
      let uniform = Uniform::from(0..2u32.pow(backoff));
      for _ in 0..uniform.sample(&mut rng) {
        std::hint::spin_loop();
      }
      backoff = std::cmp::min(backoff + 1, 10);
    }
    SpinLockGuard { lock: self }
  }
}
