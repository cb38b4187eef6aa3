use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

/// Background-scroll suspension shared by every open dialog.
///
/// Counted rather than boolean: the page stays locked while any
/// [`ScrollLockGuard`] is alive and unlocks when the last one drops.
#[derive(Debug, Default)]
pub struct ScrollLock {
    holders: AtomicUsize,
}

impl ScrollLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 整个进程共用的页面滚动锁
    pub fn global() -> Arc<Self> {
        static PAGE: OnceLock<Arc<ScrollLock>> = OnceLock::new();
        Arc::clone(PAGE.get_or_init(ScrollLock::new))
    }

    pub fn acquire(self: &Arc<Self>) -> ScrollLockGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        ScrollLockGuard {
            lock: Arc::clone(self),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct ScrollLockGuard {
    lock: Arc<ScrollLock>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.lock.holders.fetch_sub(1, Ordering::SeqCst);
    }
}
