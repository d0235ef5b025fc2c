//! [`TandemLock`] facilitates using [`Tandem`] across multiple threads,
//! e.g. as a global allocator, by wrapping it in a [`lock_api`] mutex.

use core::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator, GlobalAlloc, Layout};

use crate::base::{InitError, SlabConfig, Tandem, ALIGN};
use crate::ptr_utils::nonnull_slice_from_raw_parts;

/// Wraps a mutex-locked [`Tandem`].
///
/// The core allocator is single-threaded by design; this provides the
/// external mutual exclusion around every operation that sharing it
/// requires. Pick any [`lock_api::RawMutex`] implementation, e.g.
/// `spin::Mutex<()>`.
///
/// Layouts requesting an alignment above [`ALIGN`] are refused.
///
/// # Example
///
/// ```
/// use tandem::{SlabConfig, TandemLock};
///
/// static ALLOCATOR: TandemLock<spin::Mutex<()>> = TandemLock::new();
///
/// let mut heap = vec![0u64; 1024];
/// unsafe {
///     ALLOCATOR.init(heap.as_mut_ptr().cast(), heap.len() * 8, &SlabConfig::EMPTY).unwrap();
/// }
///
/// let p = unsafe { ALLOCATOR.lock().alloc(64) }.unwrap();
/// unsafe { ALLOCATOR.lock().free(p.as_ptr()) };
/// ```
#[derive(Debug)]
pub struct TandemLock<R: lock_api::RawMutex> {
    mutex: lock_api::Mutex<R, Tandem>,
}

impl<R: lock_api::RawMutex> TandemLock<R> {
    /// Create a new, inert [`TandemLock`]. Call [`init`](Self::init) before
    /// allocating.
    pub const fn new() -> Self {
        Self { mutex: lock_api::Mutex::new(Tandem::new()) }
    }

    /// Lock the mutex and access the inner [`Tandem`].
    #[track_caller]
    pub fn lock(&self) -> lock_api::MutexGuard<'_, R, Tandem> {
        self.mutex.lock()
    }

    /// Try to lock the mutex and access the inner [`Tandem`].
    pub fn try_lock(&self) -> Option<lock_api::MutexGuard<'_, R, Tandem>> {
        self.mutex.try_lock()
    }

    /// Returns a mutable reference to the inner [`Tandem`].
    ///
    /// This avoids locking, as a mutable reference statically guarantees
    /// that `self` is not shared.
    pub fn get_mut(&mut self) -> &mut Tandem {
        self.mutex.get_mut()
    }

    /// Retrieve the inner [`Tandem`].
    pub fn into_inner(self) -> Tandem {
        self.mutex.into_inner()
    }

    /// Set up the allocator over `base..base + len`.
    /// See [`Tandem::init`].
    ///
    /// # Safety
    /// As for [`Tandem::init`]; additionally there must be no outstanding
    /// allocations from a previous region.
    pub unsafe fn init(
        &self,
        base: *mut u8,
        len: usize,
        config: &SlabConfig,
    ) -> Result<(), InitError> {
        self.lock().init(base, len, config)
    }
}

impl<R: lock_api::RawMutex> Default for TandemLock<R> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<R: lock_api::RawMutex> GlobalAlloc for TandemLock<R> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN {
            return ptr::null_mut();
        }

        self.lock().alloc(layout.size()).map_or(ptr::null_mut(), |nn| nn.as_ptr())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.lock().free(ptr);
    }
}

unsafe impl<R: lock_api::RawMutex> Allocator for TandemLock<R> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.align() > ALIGN {
            return Err(AllocError);
        }

        if layout.size() == 0 {
            let dangling = unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
            return Ok(nonnull_slice_from_raw_parts(dangling, 0));
        }

        match unsafe { self.lock().alloc(layout.size()) } {
            Some(ptr) => Ok(nonnull_slice_from_raw_parts(ptr, layout.size())),
            None => Err(AllocError),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            self.lock().free(ptr.as_ptr());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type SpinLocked = TandemLock<spin::Mutex<()>>;

    #[test]
    fn locked_roundtrip() {
        let mut buf = vec![0u64; 256];
        let tandem: SpinLocked = TandemLock::new();

        unsafe {
            tandem.init(buf.as_mut_ptr().cast(), buf.len() * 8, &SlabConfig::EMPTY).unwrap();

            let layout = Layout::from_size_align(64, 8).unwrap();
            let p = tandem.alloc(layout);
            assert!(!p.is_null());
            tandem.dealloc(p, layout);
        }

        let mut tandem = tandem;
        assert!(tandem.get_mut().chunk_tier().is_single_free_span());
    }

    #[test]
    fn shared_across_threads() {
        let mut buf = vec![0u64; 2048];
        let tandem: SpinLocked = TandemLock::new();

        unsafe {
            tandem.init(buf.as_mut_ptr().cast(), buf.len() * 8, &SlabConfig::EMPTY).unwrap();
        }

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let layout = Layout::from_size_align(48, 8).unwrap();
                        let p = unsafe { GlobalAlloc::alloc(&tandem, layout) };
                        if !p.is_null() {
                            unsafe {
                                p.write_bytes(0xee, layout.size());
                                GlobalAlloc::dealloc(&tandem, p, layout);
                            }
                        }
                    }
                });
            }
        });

        let mut tandem = tandem;
        assert!(tandem.get_mut().chunk_tier().is_single_free_span());
    }

    #[test]
    fn try_lock_contends() {
        let tandem: SpinLocked = TandemLock::new();
        let guard = tandem.lock();
        assert!(tandem.try_lock().is_none());
        drop(guard);
        assert!(tandem.try_lock().is_some());
    }
}
