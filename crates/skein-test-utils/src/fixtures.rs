//! Reusable generated-code stand-ins.
//!
//! Three families of fixtures:
//!
//! - **Probe objects** — heap objects whose erasers count drops through an
//!   `Arc<AtomicUsize>` or log them into a per-thread, insertion-ordered
//!   erase log, so tests can assert exactly which objects were reclaimed
//!   and how often.
//! - **Frame fixtures** — walkers and push helpers for the two frame
//!   shapes the tests use: one heap-object local, one scalar local.
//! - **Builders** — deep captured prefixes and leaked vtables for driving
//!   the entry runtime.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use skein_core::{Code, Word, WORD_BYTES};
use skein_heap::{new_object, object_environment, HeapObject};
use skein_stack::{
    reset, return_to, stack_allocate, stack_deallocate, FrameHeader, ReturnFn, StackNode, Walker,
    FRAME_HEADER_BYTES,
};

/// Eraser for objects with no heap-typed fields.
pub unsafe fn noop_eraser(_env: *mut u8) {}

/// A heap object with `words` uninitialized scalar fields and a no-op
/// eraser.
pub fn plain_object(words: usize) -> *mut HeapObject {
    new_object(noop_eraser, words * WORD_BYTES)
}

unsafe fn arc_counting_eraser(env: *mut u8) {
    unsafe {
        let counter = Arc::from_raw(env.cast::<*const AtomicUsize>().read());
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A heap object whose eraser bumps `drops` exactly once, when the last
/// owner erases. The object holds its own clone of the counter.
pub fn probe_object(drops: &Arc<AtomicUsize>) -> *mut HeapObject {
    let obj = new_object(arc_counting_eraser, WORD_BYTES);
    unsafe {
        object_environment(obj)
            .cast::<*const AtomicUsize>()
            .write(Arc::into_raw(Arc::clone(drops)));
    }
    obj
}

thread_local! {
    /// Insertion-ordered log of erased tags for the current thread.
    static ERASE_LOG: RefCell<IndexMap<Word, usize>> = RefCell::new(IndexMap::new());
}

unsafe fn logging_eraser(env: *mut u8) {
    let tag = unsafe { env.cast::<Word>().read() };
    ERASE_LOG.with(|log| *log.borrow_mut().entry(tag).or_insert(0) += 1);
}

/// A heap object whose eraser records `tag` in the per-thread erase log.
pub fn logged_object(tag: Word) -> *mut HeapObject {
    let obj = new_object(logging_eraser, WORD_BYTES);
    unsafe {
        object_environment(obj).cast::<Word>().write(tag);
    }
    obj
}

/// Take the current thread's erase log, in first-erased order.
pub fn drain_erase_log() -> IndexMap<Word, usize> {
    ERASE_LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

/// Sharer for a frame whose single local is a heap object pointer.
pub unsafe fn share_object_local(sp: *mut u8) -> *mut u8 {
    unsafe {
        let local = sp.sub(FRAME_HEADER_BYTES + WORD_BYTES);
        skein_heap::share_object(local.cast::<*mut HeapObject>().read());
        local
    }
}

/// Eraser for a frame whose single local is a heap object pointer.
pub unsafe fn erase_object_local(sp: *mut u8) -> *mut u8 {
    unsafe {
        let local = sp.sub(FRAME_HEADER_BYTES + WORD_BYTES);
        skein_heap::erase_object(local.cast::<*mut HeapObject>().read());
        local
    }
}

/// Walker for a frame whose single local is a scalar: nothing to share or
/// erase, just step over it.
pub unsafe fn skip_scalar_local(sp: *mut u8) -> *mut u8 {
    unsafe { sp.sub(FRAME_HEADER_BYTES + WORD_BYTES) }
}

unsafe fn push_one_local_frame(
    stack: *mut StackNode,
    local: Word,
    return_address: Code,
    sharer: Walker,
    eraser: Walker,
) {
    unsafe {
        let frame = stack_allocate(stack, WORD_BYTES + FRAME_HEADER_BYTES)
            .expect("test segment fits the pushed frame");
        frame.cast::<Word>().write(local);
        frame.add(WORD_BYTES).cast::<FrameHeader>().write(FrameHeader {
            return_address,
            sharer,
            eraser,
        });
    }
}

/// Push a frame owning `obj` (ownership transfers into the frame; the
/// frame's eraser drops it).
///
/// # Safety
///
/// `stack` must be a live top; `obj` null or live with an owner to give.
pub unsafe fn push_object_frame(stack: *mut StackNode, obj: *mut HeapObject) {
    unsafe {
        push_one_local_frame(
            stack,
            obj as Word,
            std::ptr::null(),
            share_object_local,
            erase_object_local,
        );
    }
}

/// Push a frame holding one scalar local.
///
/// # Safety
///
/// `stack` must be a live top.
pub unsafe fn push_scalar_frame(stack: *mut StackNode, value: Word) {
    unsafe {
        push_one_local_frame(
            stack,
            value,
            std::ptr::null(),
            skip_scalar_local,
            skip_scalar_local,
        );
    }
}

unsafe fn drop_cell_and_return(result: Word, stack: *mut StackNode) {
    unsafe {
        stack_deallocate(stack, WORD_BYTES);
        return_to(result, stack)
    }
}

/// Push the guard header that owns the cell just carved by
/// `new_reference`, keeping the segment walkable from sp.
///
/// Its walkers step over the cell word; its return address pops the cell
/// and keeps returning, the way a generated frame owning a mutable
/// variable would.
///
/// # Safety
///
/// `stack` must be a live top whose most recent allocation is one bare
/// cell word.
pub unsafe fn push_cell_guard(stack: *mut StackNode) {
    unsafe {
        let frame = stack_allocate(stack, FRAME_HEADER_BYTES)
            .expect("test segment fits the guard header");
        frame.cast::<FrameHeader>().write(FrameHeader {
            return_address: drop_cell_and_return as ReturnFn as Code,
            sharer: skip_scalar_local,
            eraser: skip_scalar_local,
        });
    }
}

/// Build a captured prefix of `segments` nodes, each holding
/// `frames_per_segment` object frames produced by `make_object`.
///
/// The bottom `rest` is null, so the result is shaped exactly like a
/// `shift`-captured chain and can be fed to `erase_stack`,
/// `unique_stack`, or `resume`.
///
/// # Safety
///
/// Objects returned by `make_object` must each carry an owner to give to
/// their frame.
pub unsafe fn deep_prefix(
    segments: usize,
    frames_per_segment: usize,
    mut make_object: impl FnMut() -> *mut HeapObject,
) -> *mut StackNode {
    let mut head: *mut StackNode = std::ptr::null_mut();
    for _ in 0..segments {
        unsafe {
            head = reset(head);
            for _ in 0..frames_per_segment {
                push_object_frame(head, make_object());
            }
        }
    }
    head
}

/// A vtable that lives for the rest of the process.
///
/// Leaks one small allocation per call; build vtables outside any
/// allocation-balance measurement window.
pub fn leaked_vtable(methods: &[Code]) -> *const Code {
    Box::leak(methods.to_vec().into_boxed_slice()).as_ptr()
}
