//! This module provides the core allocation mechanism via the [`Tandem`]
//! type and its configuration.

pub(crate) mod bitmap;
mod chunk;
mod marker;
mod slab;

use core::ptr::NonNull;

use crate::ptr_utils;

pub use chunk::CHUNK_MIN_SIZE;
pub use slab::{SlabConfig, SlabSlot, SLAB_SLOT_COUNT};

use chunk::ChunkTier;
use slab::SlabTier;

/// Alignment of every pointer the allocator hands out, and the granularity
/// all sizes are rounded to.
pub const ALIGN: usize = 8;

pub(crate) const ALIGN_MASK: usize = ALIGN - 1;

/// The smallest region [`Tandem::init`] accepts: worst-case alignment
/// padding plus one minimum chunk.
pub const MIN_REGION_SIZE: usize = ALIGN + CHUNK_MIN_SIZE;

/// Why [`Tandem::init`] refused a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The region pointer was null.
    NullRegion,
    /// After alignment and the configured slab classes, the region cannot
    /// hold even one minimum-size chunk.
    RegionTooSmall,
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InitError::NullRegion => f.write_str("region pointer is null"),
            InitError::RegionTooSmall => f.write_str("region too small for the chunk tier"),
        }
    }
}

/// The core allocator: a slab tier for frequent small allocations in front
/// of a boundary-tagged free-list tier for everything else, both carved out
/// of one caller-supplied region.
///
/// [`Tandem`] itself does not exhibit interior mutability; you need a
/// mutable reference to allocate with it. For the
/// [`Allocator`](allocator_api2::alloc::Allocator) or
/// [`GlobalAlloc`](allocator_api2::alloc::GlobalAlloc) APIs, wrap it in a
/// [`TandemCell`](crate::cell::TandemCell) (single-threaded) or a
/// [`TandemLock`](crate::sync::TandemLock) (mutex-synchronized).
///
/// # Example
///
/// ```
/// use tandem::{SlabConfig, Tandem};
///
/// let mut heap = vec![0u64; 4096];
/// let mut tandem = Tandem::new();
///
/// unsafe {
///     tandem.init(heap.as_mut_ptr().cast(), heap.len() * 8, &SlabConfig::default()).unwrap();
///
///     let p = tandem.alloc(100).unwrap();
///     tandem.free(p.as_ptr());
/// }
/// ```
#[derive(Debug)]
pub struct Tandem {
    slab: SlabTier,
    chunks: ChunkTier,
}

// The region's memory is only reachable through the one Tandem that owns it.
unsafe impl Send for Tandem {}

impl Default for Tandem {
    fn default() -> Self {
        Self::new()
    }
}

impl Tandem {
    /// Create an inert allocator: every `alloc` fails and `free` ignores
    /// everything until [`init`](Self::init) succeeds.
    pub const fn new() -> Self {
        Self { slab: SlabTier::inert(), chunks: ChunkTier::inert() }
    }

    /// Take ownership of `base..base + len` and set up both tiers in it.
    ///
    /// The region is trimmed inward to 8-byte alignment. The slab classes
    /// configured in `config` consume the low end; the remainder goes to
    /// the chunk tier and must still hold at least one minimum chunk.
    ///
    /// Errors for a null `base` or a `len` below [`MIN_REGION_SIZE`], and
    /// when the slab configuration leaves the chunk tier too little space.
    /// On error the allocator is left inert.
    ///
    /// # Safety
    /// - The region must be exclusively writable by this allocator (and
    ///   initialized memory) until it's discarded.
    /// - Re-initializing while allocations are outstanding invalidates them.
    pub unsafe fn init(
        &mut self,
        base: *mut u8,
        len: usize,
        config: &SlabConfig,
    ) -> Result<(), InitError> {
        self.slab = SlabTier::inert();
        self.chunks = ChunkTier::inert();

        if base.is_null() {
            return Err(InitError::NullRegion);
        }
        if len < MIN_REGION_SIZE {
            return Err(InitError::RegionTooSmall);
        }

        let aligned = ptr_utils::align_up_by(base, ALIGN_MASK);
        let len = len - (aligned as usize - base as usize);

        let consumed = self.slab.init(config, aligned, len);

        match self.chunks.init(aligned.add(consumed), len - consumed) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.slab = SlabTier::inert();
                Err(error)
            }
        }
    }

    /// Allocate `size` bytes, 8-aligned. A `size` of 0 is treated as 1.
    ///
    /// The slab tier is consulted first; on failure the request falls
    /// through to the chunk tier. Returns `None` when neither can serve it.
    ///
    /// # Safety
    /// The allocator's region must still be exclusively owned by it.
    pub unsafe fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        let size = size.max(1);

        if let Some(ptr) = self.slab.alloc(size) {
            return Some(ptr);
        }

        self.chunks.alloc(size)
    }

    /// Release an allocation previously returned by [`alloc`](Self::alloc).
    ///
    /// Null is a no-op. Pointers the allocator doesn't recognize, and
    /// double frees of chunks whose markers still agree, are silently
    /// ignored.
    ///
    /// # Safety
    /// The allocator's region must still be exclusively owned by it, and
    /// `ptr`'s allocation must no longer be read or written after this.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        if ptr as usize >= self.chunks.base() as usize {
            self.chunks.free(ptr);
        } else {
            self.slab.free(ptr);
        }
    }

    #[cfg(test)]
    pub(crate) fn chunk_tier(&self) -> &ChunkTier {
        &self.chunks
    }

    #[cfg(test)]
    pub(crate) fn slab_tier(&self) -> &SlabTier {
        &self.slab
    }
}
