//! Copy-on-write duplication of captured continuations.
//!
//! A captured prefix may be resumed more than once. Before any resumption
//! mutates it, [`unique_stack`] ensures the resumer holds the *sole*
//! owner: a shared prefix is deep-copied — segment bytes, arena cells,
//! and a fresh share of every heap object reachable from every live
//! frame — so the original and the copy evolve independently from that
//! point on.

use crate::frame::share_frames;
use crate::node::StackNode;

/// Return a sole-owned equivalent of `stack`.
///
/// With `rc == 0` the prefix is returned unchanged and may be mutated in
/// place. Otherwise one owner is peeled off the original (`rc -= 1`) and
/// a full copy is built:
///
/// 1. every segment is duplicated byte-for-byte, so overlaid arena cells
///    are physically copied;
/// 2. `share_frames` runs on each copied segment, so the original and the
///    copy hold independent owners of every heap object their frames
///    reference;
/// 3. prompts are deliberately preserved — references baked into copied
///    frames keep resolving, and each chain contains its own node bearing
///    the prompt, so lookup finds the local one.
///
/// The copy's head has `rc == 0`: the caller is its one owner.
///
/// # Safety
///
/// `stack` must be the head of a captured prefix (null-terminated chain)
/// the caller owns.
pub unsafe fn unique_stack(stack: *mut StackNode) -> *mut StackNode {
    unsafe {
        if (*stack).rc == 0 {
            return stack;
        }
        (*stack).rc -= 1;

        let head = clone_node(stack);
        let mut tail = head;
        let mut old = (*stack).rest;
        while !old.is_null() {
            let copy = clone_node(old);
            (*tail).rest = copy;
            tail = copy;
            old = (*old).rest;
        }
        head
    }
}

/// Duplicate one node: copied segment, shared frames, same prompt,
/// null `rest` (the caller links the chain).
unsafe fn clone_node(node: *const StackNode) -> *mut StackNode {
    unsafe {
        let mem = (*node).mem.copy();
        if mem.used() > 0 {
            share_frames(mem.sp);
        }
        StackNode::allocate(mem, (*node).prompt, std::ptr::null_mut())
    }
}
