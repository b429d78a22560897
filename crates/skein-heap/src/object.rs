//! Heap object allocation and reference counting.
//!
//! A heap object is a `(rc, eraser)` header followed immediately by an
//! opaque payload — the *environment* — whose shape only the eraser knows.
//! The reference count is inverted from the customary convention: it
//! counts *additional* owners beyond the first, so `rc == 0` means exactly
//! one owner and the single-owner fast paths need no counter traffic.
//! Implementations must preserve this convention exactly.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};

use skein_core::WORD_BYTES;

/// A type-specific destructor for an object's environment.
///
/// Emitted by the code generator; knows the static shape of the payload
/// and calls [`erase_object`] (via the value wrappers) on each heap-typed
/// field. Invoked exactly once, when the last owner erases.
pub type Eraser = unsafe fn(env: *mut u8);

/// The header of a heap object: `(rc, eraser)`, with the environment
/// payload immediately after.
///
/// The layout is normative for the code generator: an `i64` count followed
/// by a pointer-sized eraser slot, no padding. Object pointers always
/// point at the `rc` field.
#[repr(C)]
pub struct HeapObject {
    /// Owners beyond the first. `rc == 0` ⇔ exactly one owner.
    rc: i64,
    /// Destructor for the environment payload.
    eraser: Eraser,
}

/// Size of the object header in bytes.
pub const HEADER_BYTES: usize = std::mem::size_of::<HeapObject>();

/// Hidden bookkeeping word in front of the header, storing the total block
/// size so the block can be returned to the allocator. Invisible to the
/// code generator: object pointers point past it.
const PREFIX_BYTES: usize = WORD_BYTES;

/// Alignment of object blocks. Environments hold words and pointers only.
const BLOCK_ALIGN: usize = WORD_BYTES;

/// Allocate a heap object with an `env_bytes`-sized environment.
///
/// The header is initialized with `rc = 0` (one owner) and the given
/// eraser; the environment is uninitialized and must be fully written by
/// the caller before the object can be shared or erased.
pub fn new_object(eraser: Eraser, env_bytes: usize) -> *mut HeapObject {
    let total = PREFIX_BYTES + HEADER_BYTES + env_bytes;
    let layout = Layout::from_size_align(total, BLOCK_ALIGN)
        .expect("object block size fits a Layout");
    unsafe {
        let block = alloc(layout);
        if block.is_null() {
            handle_alloc_error(layout);
        }
        block.cast::<usize>().write(total);
        let obj = block.add(PREFIX_BYTES).cast::<HeapObject>();
        obj.write(HeapObject { rc: 0, eraser });
        obj
    }
}

/// Pointer to the environment payload, immediately past the header.
///
/// # Safety
///
/// `obj` must be a live object returned by [`new_object`].
pub unsafe fn object_environment(obj: *mut HeapObject) -> *mut u8 {
    unsafe { obj.cast::<u8>().add(HEADER_BYTES) }
}

/// Current reference count of an object. Test and diagnostic aid.
///
/// # Safety
///
/// `obj` must be a live object returned by [`new_object`].
pub unsafe fn object_rc(obj: *const HeapObject) -> i64 {
    unsafe { (*obj).rc }
}

/// Register an additional owner of `obj`. Null-safe no-op.
///
/// # Safety
///
/// `obj` must be null or a live object returned by [`new_object`].
pub unsafe fn share_object(obj: *mut HeapObject) {
    if obj.is_null() {
        return;
    }
    unsafe {
        debug_assert!((*obj).rc >= 0, "heap object rc went negative");
        (*obj).rc += 1;
    }
}

/// Drop one owner of `obj`. Null-safe no-op.
///
/// When the last owner drops (`rc == 0`), the eraser runs on the
/// environment and the block is freed. Erasing more times than the object
/// was shared is a precondition violation the runtime cannot detect.
///
/// # Safety
///
/// `obj` must be null or a live object returned by [`new_object`], and the
/// caller must actually hold one of its owners.
pub unsafe fn erase_object(obj: *mut HeapObject) {
    if obj.is_null() {
        return;
    }
    unsafe {
        let rc = (*obj).rc;
        debug_assert!(rc >= 0, "heap object rc went negative");
        if rc == 0 {
            let eraser = (*obj).eraser;
            eraser(object_environment(obj));
            release(obj);
        } else {
            (*obj).rc = rc - 1;
        }
    }
}

/// Return an object's block to the allocator. The eraser has already run.
unsafe fn release(obj: *mut HeapObject) {
    unsafe {
        let block = obj.cast::<u8>().sub(PREFIX_BYTES);
        let total = block.cast::<usize>().read();
        dealloc(block, Layout::from_size_align_unchecked(total, BLOCK_ALIGN));
    }
}
