//! Contiguous stack segments with checked bump allocation.
//!
//! A [`Segment`] is one contiguous frame area `[base, limit)` with a stack
//! pointer `base <= sp <= limit`. Frames grow upward from `base`; `sp`
//! points one past the topmost frame. The reservation is fixed at
//! creation — exceeding it is a fatal fault, never a reallocation, because
//! generated frames hold interior pointers that must not move.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};

use skein_core::Fault;

/// Fixed reservation of a segment in bytes.
///
/// A large power of two; the memory is virtual and mostly untouched, so a
/// generous reservation costs little. Far below 4GiB so byte offsets
/// always fit the packed 32-bit reference encoding.
pub const SEGMENT_BYTES: usize = 1 << 22;

/// Alignment of segment blocks. Generous enough for any frame local.
const SEGMENT_ALIGN: usize = 16;

/// One contiguous frame area with base/sp/limit pointers.
///
/// Segments are owned 1:1 by the stack node containing them and released
/// with it; they have no destructor of their own because captured
/// continuations alias them in ways the borrow checker cannot see.
#[repr(C)]
pub struct Segment {
    /// One past the topmost frame. `base <= sp <= limit`.
    pub(crate) sp: *mut u8,
    /// Start of the reservation.
    pub(crate) base: *mut u8,
    /// End of the reservation.
    pub(crate) limit: *mut u8,
}

impl Segment {
    /// Allocate a segment with the default reservation.
    pub fn new() -> Self {
        Self::with_capacity(SEGMENT_BYTES)
    }

    /// Allocate a segment with the given reservation in bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        let layout =
            Layout::from_size_align(bytes, SEGMENT_ALIGN).expect("segment size fits a Layout");
        let base = unsafe { alloc(layout) };
        if base.is_null() {
            handle_alloc_error(layout);
        }
        Self {
            sp: base,
            base,
            limit: unsafe { base.add(bytes) },
        }
    }

    /// Bump-allocate `bytes` from this segment, returning the old sp (the
    /// base of the newly allocated region).
    ///
    /// Exceeding the reservation is [`Fault::SegmentOverflow`].
    pub fn alloc(&mut self, bytes: usize) -> Result<*mut u8, Fault> {
        let remaining = self.remaining();
        if bytes > remaining {
            return Err(Fault::SegmentOverflow {
                requested: bytes,
                remaining,
            });
        }
        let old = self.sp;
        self.sp = unsafe { self.sp.add(bytes) };
        Ok(old)
    }

    /// Release `bytes` from the top of this segment, returning the new sp.
    pub fn dealloc(&mut self, bytes: usize) -> *mut u8 {
        debug_assert!(bytes <= self.used(), "segment dealloc past base");
        self.sp = unsafe { self.sp.sub(bytes) };
        self.sp
    }

    /// Bytes currently in use: `sp - base`.
    pub fn used(&self) -> usize {
        self.sp as usize - self.base as usize
    }

    /// Total reservation in bytes: `limit - base`.
    pub fn capacity(&self) -> usize {
        self.limit as usize - self.base as usize
    }

    /// Bytes remaining before the reservation is exhausted.
    pub fn remaining(&self) -> usize {
        self.limit as usize - self.sp as usize
    }

    /// Duplicate `[base, sp)` into a fresh block of identical total
    /// capacity, with sp/base/limit translated to the new block.
    ///
    /// # Safety
    ///
    /// The used portion must contain initialized bytes (it always does for
    /// segments built through [`Segment::alloc`] and frame pushes).
    pub(crate) unsafe fn copy(&self) -> Segment {
        let mut dst = Segment::with_capacity(self.capacity());
        let used = self.used();
        unsafe {
            std::ptr::copy_nonoverlapping(self.base, dst.base, used);
            dst.sp = dst.base.add(used);
        }
        dst
    }

    /// Return the reservation to the allocator.
    ///
    /// # Safety
    ///
    /// No pointer into the segment may be used afterwards; the caller must
    /// be the segment's sole owner.
    pub(crate) unsafe fn release(self) {
        let layout = Layout::from_size_align(self.capacity(), SEGMENT_ALIGN)
            .expect("segment size fits a Layout");
        unsafe { dealloc(self.base, layout) };
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skein_core::WORD_BYTES;

    #[test]
    fn fresh_segment_is_empty() {
        let seg = Segment::with_capacity(1024);
        assert_eq!(seg.used(), 0);
        assert_eq!(seg.capacity(), 1024);
        assert_eq!(seg.remaining(), 1024);
        unsafe { seg.release() };
    }

    #[test]
    fn alloc_returns_old_sp_and_bumps() {
        let mut seg = Segment::with_capacity(1024);
        let first = seg.alloc(64).unwrap();
        assert_eq!(first, seg.base);
        let second = seg.alloc(32).unwrap();
        assert_eq!(second as usize - first as usize, 64);
        assert_eq!(seg.used(), 96);
        unsafe { seg.release() };
    }

    #[test]
    fn dealloc_returns_new_sp() {
        let mut seg = Segment::with_capacity(1024);
        seg.alloc(96).unwrap();
        let sp = seg.dealloc(32);
        assert_eq!(sp as usize - seg.base as usize, 64);
        assert_eq!(seg.used(), 64);
        unsafe { seg.release() };
    }

    #[test]
    fn overflow_is_a_fault_not_a_panic() {
        let mut seg = Segment::with_capacity(64);
        seg.alloc(64).unwrap();
        let result = seg.alloc(1);
        assert!(matches!(
            result,
            Err(Fault::SegmentOverflow {
                requested: 1,
                remaining: 0,
            })
        ));
        unsafe { seg.release() };
    }

    #[test]
    fn exactly_full_alloc_succeeds() {
        let mut seg = Segment::with_capacity(64);
        assert!(seg.alloc(64).is_ok());
        assert_eq!(seg.remaining(), 0);
        unsafe { seg.release() };
    }

    #[test]
    fn copy_duplicates_used_bytes_independently() {
        let mut seg = Segment::with_capacity(256);
        let cell = seg.alloc(WORD_BYTES).unwrap();
        unsafe {
            cell.cast::<i64>().write(41);
            let dup = seg.copy();
            assert_eq!(dup.used(), seg.used());
            assert_eq!(dup.capacity(), seg.capacity());
            assert_eq!(dup.base.cast::<i64>().read(), 41);
            // Writes through the original are not seen by the copy.
            cell.cast::<i64>().write(17);
            assert_eq!(dup.base.cast::<i64>().read(), 41);
            dup.release();
            seg.release();
        }
    }

    proptest! {
        /// Under any balanced alloc/dealloc sequence that fits, the bump
        /// pointer tracks the running sum and never escapes the block.
        #[test]
        fn bump_pointer_tracks_balanced_traffic(sizes in prop::collection::vec(1usize..64, 1..32)) {
            let mut seg = Segment::with_capacity(4096);
            let total: usize = sizes.iter().sum();
            prop_assume!(total <= seg.capacity());
            for &n in &sizes {
                seg.alloc(n).unwrap();
            }
            prop_assert_eq!(seg.used(), total);
            for &n in sizes.iter().rev() {
                seg.dealloc(n);
            }
            prop_assert_eq!(seg.used(), 0);
            unsafe { seg.release() };
        }
    }
}
