use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

const UNINIT: u8 = 0;
const INITING: u8 = 1;
const READY: u8 = 2;

/// A write-once cell usable from `static`s.
///
/// The boot processor fills it once (e.g. with the discovered topology) and
/// every later reader gets a shared reference. Concurrent initializers spin
/// until the winner has published its value.
pub struct SyncOnceCell<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Default for SyncOnceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SyncOnceCell<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINIT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Returns `Some(&T)` if already initialized.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.is_initialized() {
            // SAFETY: READY guarantees the write is done
            Some(unsafe { self.get_unchecked() })
        } else {
            None
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// Stores `value` if the cell is empty.
    ///
    /// # Errors
    /// Hands `value` back if the cell was already set or is being set.
    pub fn set(&self, value: T) -> Result<&T, T> {
        if self.try_claim() {
            Ok(self.publish(value))
        } else {
            Err(value)
        }
    }

    /// Initialize at most once and return `&T`.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        if let Some(v) = self.get() {
            return v;
        }

        if self.try_claim() {
            return self.publish(init());
        }

        while !self.is_initialized() {
            spin_loop();
        }
        // SAFETY: READY
        unsafe { self.get_unchecked() }
    }

    fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(UNINIT, INITING, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn publish(&self, value: T) -> &T {
        // SAFETY: the caller won `try_claim`, so no one else writes or reads yet.
        unsafe {
            (*self.value.get()).write(value);
        }
        self.state.store(READY, Ordering::Release);
        // SAFETY: just wrote it
        unsafe { self.get_unchecked() }
    }

    /// # Safety
    /// The state must be READY.
    unsafe fn get_unchecked(&self) -> &T {
        unsafe { (*self.value.get()).assume_init_ref() }
    }
}

impl<T> Drop for SyncOnceCell<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == READY {
            // SAFETY: READY and we have exclusive access
            unsafe { self.value.get_mut().assume_init_drop() }
        }
    }
}

// Safety: shared after READY; initialization is single-writer.
unsafe impl<T: Send + Sync> Sync for SyncOnceCell<T> {}
unsafe impl<T: Send> Send for SyncOnceCell<T> {}
