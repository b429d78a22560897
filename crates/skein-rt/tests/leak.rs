//! Allocator-balance check: a terminating program that captures nothing
//! beyond the program prompt leaves the net allocation count at zero.
//!
//! Lives in its own integration binary because the counting
//! `#[global_allocator]` is process-wide.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use skein_core::{Code, Evidence};
use skein_heap::{erase_object, new_object, share_object, HeapObject, Negative};
use skein_stack::{
    current_prompt, erase_stack, load_reference, new_reference, reset, resume, return_to,
    share_stack, shift, store_reference, StackNode,
};

struct CountingAllocator;

static OUTSTANDING: AtomicIsize = AtomicIsize::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        OUTSTANDING.fetch_add(1, Ordering::SeqCst);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        OUTSTANDING.fetch_sub(1, Ordering::SeqCst);
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

unsafe fn field_free_eraser(_env: *mut u8) {}

type Main = unsafe fn(*mut HeapObject, Evidence, *mut StackNode);

/// A program that exercises every allocating path: heap objects, a
/// prompt, a reference cell, a two-shot continuation.
unsafe fn busy_main(_obj: *mut HeapObject, _ev: Evidence, stack: *mut StackNode) {
    unsafe {
        let obj = new_object(field_free_eraser, 16);
        share_object(obj);
        erase_object(obj);
        erase_object(obj);

        let top = reset(stack);
        let p = current_prompt(top);
        let r = new_reference(top).unwrap();
        skein_test_utils::push_cell_guard(top);
        store_reference(r, top, 11).unwrap();

        let k = top;
        let remainder = shift(k, p).unwrap();
        share_stack(k);

        let live = resume(k, remainder);
        store_reference(r, live, 12).unwrap();
        let rem1 = shift(live, p).unwrap();
        erase_stack(live);

        let live2 = resume(k, rem1);
        assert_eq!(load_reference(r, live2).unwrap(), 11);
        let rem2 = shift(live2, p).unwrap();
        erase_stack(live2);

        return_to(0, rem2)
    }
}

#[test]
fn terminating_run_is_allocation_balanced() {
    // The vtable lives on this test's native stack: nothing here
    // allocates outside the measured window.
    let table = [busy_main as Main as Code];
    let f = Negative::new(table.as_ptr(), std::ptr::null_mut());

    let before = OUTSTANDING.load(Ordering::SeqCst);
    unsafe { skein_rt::run(f) };
    let after = OUTSTANDING.load(Ordering::SeqCst);

    assert_eq!(before, after, "run leaked or double-freed allocations");
}
