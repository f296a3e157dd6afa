//! Lightweight atomic locks.
//!
//! Neither lock guards data; callers pair them with their own state. For data
//! protection use [`std::sync::Mutex`].

use std::sync::atomic::{AtomicBool, Ordering};

/// Spin lock over a single atomic flag.
#[derive(Debug, Default)]
pub struct SimpleLock {
    locked: AtomicBool,
}

impl SimpleLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spin until the lock is obtained.
    pub fn acquire(&self) {
        while !self.try_acquire() {
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    /// Obtain the lock if it is free.
    pub fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

/// Non-blocking flag used to let a single caller run an optional task.
///
/// [`SoftLock::acquire`] returns `true` only for the call that flipped the
/// flag; concurrent callers see `false` and skip the task.
#[derive(Debug, Default)]
pub struct SoftLock {
    locked: AtomicBool,
}

impl SoftLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    pub fn acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}
