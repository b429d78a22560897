//! Meta-stack nodes and captured-prefix reference counting.
//!
//! A [`StackNode`] pairs one segment with the prompt installed over it and
//! an intrusive `rest` link to the node below. The live meta-stack is the
//! chain from the top pointer down to null; a *captured prefix* is a
//! detached chain whose bottom `rest` is null, owned through its head
//! node's reference count.

use smallvec::SmallVec;

use skein_core::{Fault, Prompt};

use crate::frame::erase_frames;
use crate::segment::Segment;

/// One meta-stack node: reference count, segment, prompt, intrusive link.
///
/// The layout is normative for the code generator. The count follows the
/// inverted convention of the heap: `rc == 0` means exactly one owner.
/// Live meta-stack nodes always have `rc == 0`; only captured prefixes
/// accumulate additional owners.
#[repr(C)]
pub struct StackNode {
    /// Owners beyond the first. `rc == 0` ⇔ sole owner.
    pub(crate) rc: i64,
    /// The frame segment (and overlaid arena) of this prompt.
    pub(crate) mem: Segment,
    /// The prompt installed by the `reset` that pushed this node.
    pub(crate) prompt: Prompt,
    /// The node below, or null at the bottom of a captured prefix or
    /// under the global base node.
    pub(crate) rest: *mut StackNode,
}

impl StackNode {
    /// Allocate a node with `rc = 0` over the given segment.
    ///
    /// The entry runtime uses this to build the global and program nodes;
    /// everything else goes through [`crate::meta::reset`].
    pub fn allocate(mem: Segment, prompt: Prompt, rest: *mut StackNode) -> *mut StackNode {
        Box::into_raw(Box::new(StackNode {
            rc: 0,
            mem,
            prompt,
            rest,
        }))
    }

    /// The prompt installed over this node's segment.
    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    /// Owners beyond the first. Test and diagnostic aid.
    pub fn rc(&self) -> i64 {
        self.rc
    }

    /// The segment of this node.
    pub fn segment(&self) -> &Segment {
        &self.mem
    }
}

/// Release a node's segment and the node itself, returning its `rest`.
///
/// Frame contents are NOT erased here; callers either know the segment is
/// exhausted (underflow) or have already walked it (`erase_stack`).
pub(crate) unsafe fn free_node(node: *mut StackNode) -> *mut StackNode {
    unsafe {
        let rest = (*node).rest;
        let mem = std::ptr::addr_of_mut!((*node).mem).read();
        mem.release();
        drop(Box::from_raw(node));
        rest
    }
}

/// Bump-allocate `bytes` in the top segment, returning the old sp.
///
/// The code generator calls this from function prologues to push frames
/// (and from `newReference` sites to carve cells).
///
/// # Safety
///
/// `stack` must be a live meta-stack top.
pub unsafe fn stack_allocate(stack: *mut StackNode, bytes: usize) -> Result<*mut u8, Fault> {
    unsafe { (*stack).mem.alloc(bytes) }
}

/// Release `bytes` from the top segment, returning the new sp.
///
/// # Safety
///
/// `stack` must be a live meta-stack top with at least `bytes` in use.
pub unsafe fn stack_deallocate(stack: *mut StackNode, bytes: usize) -> *mut u8 {
    unsafe { (*stack).mem.dealloc(bytes) }
}

/// Register an additional owner of a captured prefix.
///
/// # Safety
///
/// `stack` must be the head of a captured prefix.
pub unsafe fn share_stack(stack: *mut StackNode) {
    unsafe {
        debug_assert!((*stack).rc >= 0, "stack node rc went negative");
        (*stack).rc += 1;
    }
}

/// Drop one owner of a captured prefix.
///
/// When the last owner drops, the whole chain is reclaimed: every
/// segment's frames are erased (propagating drops into heap objects),
/// then segments and nodes are freed, terminating at the null `rest`.
/// The walk is iterative: O(1) native stack regardless of chain length.
///
/// Must only be called on captured prefixes, never on the live meta-stack
/// head.
///
/// # Safety
///
/// `stack` must be the head of a captured prefix the caller owns.
pub unsafe fn erase_stack(stack: *mut StackNode) {
    unsafe {
        debug_assert!((*stack).rc >= 0, "stack node rc went negative");
        if (*stack).rc > 0 {
            (*stack).rc -= 1;
            return;
        }
        let mut node = stack;
        while !node.is_null() {
            if (*node).mem.used() > 0 {
                erase_frames((*node).mem.sp);
            }
            node = free_node(node);
        }
    }
}

/// The prompts of a chain, top first. Test and diagnostic aid.
///
/// # Safety
///
/// `top` must be a live meta-stack top or captured-prefix head.
pub unsafe fn chain_prompts(top: *const StackNode) -> SmallVec<[Prompt; 8]> {
    let mut prompts = SmallVec::new();
    let mut node = top;
    while !node.is_null() {
        unsafe {
            prompts.push((*node).prompt);
            node = (*node).rest;
        }
    }
    prompts
}

/// Number of nodes in a chain. Test and diagnostic aid.
///
/// # Safety
///
/// As [`chain_prompts`].
pub unsafe fn chain_len(top: *const StackNode) -> usize {
    let mut len = 0;
    let mut node = top;
    while !node.is_null() {
        len += 1;
        node = unsafe { (*node).rest };
    }
    len
}
