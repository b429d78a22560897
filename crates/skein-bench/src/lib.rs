//! Benchmark profiles and helpers for the skein runtime.
//!
//! Shared setup for the criterion benches: prompt chains of a given
//! depth, standing in for the meta-stacks real programs build.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

use skein_stack::{reset, StackNode};

/// Build a live chain of `depth` prompts over a null root.
///
/// The result is shaped like a captured prefix and can be torn down with
/// `erase_stack`.
///
/// # Safety
///
/// The chain is raw machine state; tear it down before dropping it.
pub unsafe fn prompt_chain(depth: usize) -> *mut StackNode {
    let mut top: *mut StackNode = std::ptr::null_mut();
    for _ in 0..depth {
        top = unsafe { reset(top) };
    }
    top
}
