//! The Tandem allocator crate.
//!
//! A two-tier allocator for a single caller-supplied contiguous byte
//! region. No OS heap is ever consulted; the allocator owns the region
//! exclusively for its lifetime, which makes it a fit for embedded and
//! bare-metal targets, memory-mapped scratch areas and the like.
//!
//! The two tiers:
//! - a **slab tier**: classes of fixed-size units for frequent small
//!   allocations, with liveness tracked in two redundant shadow bitmaps;
//! - a **chunk tier**: boundary-tagged variable-size chunks organised into
//!   free lists by power-of-two payload class, coalescing with their
//!   neighbours on free. Its metadata lives in-band with user data, so
//!   list traversal validates every node and routes around corruption
//!   rather than crashing.
//!
//! Your first step is [`Tandem::new`] (or one of the wrappers), then
//! [`init`](Tandem::init) with your region and a [`SlabConfig`]:
//!
//! ```
//! use tandem::{SlabConfig, Tandem};
//!
//! let mut heap = vec![0u64; 4096];
//! let mut tandem = Tandem::new();
//!
//! unsafe {
//!     tandem.init(heap.as_mut_ptr().cast(), heap.len() * 8, &SlabConfig::default()).unwrap();
//!
//!     let p = tandem.alloc(42).unwrap();
//!     tandem.free(p.as_ptr());
//! }
//! ```
//!
//! [`TandemCell`] adapts the allocator to the
//! [`Allocator`](allocator_api2::alloc::Allocator) and
//! [`GlobalAlloc`](allocator_api2::alloc::GlobalAlloc) traits for
//! single-threaded use; [`TandemLock`] does the same behind a
//! [`lock_api`] mutex of your choosing.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub(crate) mod ptr_utils;
pub(crate) mod region;

pub mod base;
pub mod cell;
pub mod sync;

pub use base::{
    InitError, SlabConfig, SlabSlot, Tandem, ALIGN, CHUNK_MIN_SIZE, MIN_REGION_SIZE,
    SLAB_SLOT_COUNT,
};
pub use cell::TandemCell;
pub use sync::TandemLock;
