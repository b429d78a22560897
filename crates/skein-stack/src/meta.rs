//! Meta-stack operations: installing, capturing, and reinstating prompts.
//!
//! The lifecycle of a prompt:
//!
//! 1. `reset` — push a fresh segment + node with a newly minted prompt.
//! 2. `shift` — detach the chain from the top down to and including the
//!    node bearing a prompt; the detached prefix is a first-class
//!    continuation, the node's old `rest` becomes the new top.
//! 3. `resume` — splice a captured prefix back on top, cloning first if
//!    the prefix is shared so aliases never observe the mutation.
//! 4. underflow — when a segment runs out of frames, its bottom
//!    sentinel's return address pops the node and continues returning
//!    into the node below.

use skein_core::{Code, Fault, Prompt, Word};

use crate::frame::{return_to, walk_end, FrameHeader, ReturnFn, FRAME_HEADER_BYTES};
use crate::node::{free_node, StackNode};
use crate::segment::Segment;
use crate::unique::unique_stack;

/// Install a prompt boundary: a fresh segment and node over `top`.
///
/// The new segment carries a bottom sentinel frame whose return address
/// is the underflow stub, so exhausting the segment pops the node and
/// keeps returning below it.
///
/// # Safety
///
/// `top` must be a live meta-stack top (or null for a detached root).
pub unsafe fn reset(top: *mut StackNode) -> *mut StackNode {
    let mut seg = Segment::new();
    push_sentinel(&mut seg, underflow_return as ReturnFn as Code);
    StackNode::allocate(seg, Prompt::fresh(), top)
}

/// Write a sentinel frame at the bottom of a fresh segment.
///
/// The sentinel's walkers are [`walk_end`], terminating every frame walk;
/// its return address decides what happens when the segment exhausts its
/// frames: the underflow stub for `reset` segments, the entry runtime's
/// top-level handler for the program segment.
pub fn push_sentinel(seg: &mut Segment, return_address: Code) {
    let frame = seg
        .alloc(FRAME_HEADER_BYTES)
        .expect("fresh segment fits a sentinel frame");
    unsafe {
        frame.cast::<FrameHeader>().write(FrameHeader {
            return_address,
            sharer: walk_end,
            eraser: walk_end,
        });
    }
}

/// The prompt of the top node.
///
/// # Safety
///
/// `top` must be a live meta-stack top.
pub unsafe fn current_prompt(top: *const StackNode) -> Prompt {
    unsafe { (*top).prompt }
}

/// Pop an exhausted top node: free its segment and node, return the node
/// below as the new top.
///
/// # Safety
///
/// `top` must be a live meta-stack top whose segment holds no live frames
/// beyond its (already popped) sentinel.
pub unsafe fn underflow_stack(top: *mut StackNode) -> *mut StackNode {
    unsafe {
        debug_assert_eq!((*top).rc, 0, "live meta-stack node must be sole-owned");
        free_node(top)
    }
}

/// Return-address sentinel at the bottom of every `reset` segment:
/// underflow into the node below and continue returning there.
///
/// # Safety
///
/// Called only through the return path with a live top whose segment has
/// exhausted its frames.
pub unsafe fn underflow_return(result: Word, stack: *mut StackNode) {
    unsafe {
        let next = underflow_stack(stack);
        return_to(result, next)
    }
}

/// Detach the prefix above and including the node bearing `prompt`.
///
/// On success the passed-in `top` is the head of the captured prefix —
/// a chain ending at the prompt's node with a null `rest` and `rc == 0`
/// (sole owner: the capturer) — and the returned node is the new live
/// top. The delimiter travels with the capture, so resuming reinstalls
/// it.
///
/// # Safety
///
/// `top` must be a live meta-stack top.
pub unsafe fn shift(top: *mut StackNode, prompt: Prompt) -> Result<*mut StackNode, Fault> {
    let mut node = top;
    while !node.is_null() {
        unsafe {
            if (*node).prompt == prompt {
                let remainder = (*node).rest;
                (*node).rest = std::ptr::null_mut();
                return Ok(remainder);
            }
            node = (*node).rest;
        }
    }
    Err(Fault::PromptNotFound { prompt })
}

/// Splice a captured prefix back atop the live meta-stack.
///
/// A shared prefix is cloned first (see
/// [`unique_stack`]) so other aliases never
/// observe frames or arena cells mutated through this resumption. The
/// (possibly cloned) prefix head becomes the new top.
///
/// # Safety
///
/// `prefix` must be the head of a captured prefix the caller owns; `top`
/// must be a live meta-stack top.
pub unsafe fn resume(prefix: *mut StackNode, top: *mut StackNode) -> *mut StackNode {
    unsafe {
        let prefix = unique_stack(prefix);
        let mut node = prefix;
        while !(*node).rest.is_null() {
            node = (*node).rest;
        }
        (*node).rest = top;
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{chain_len, chain_prompts, erase_stack};

    /// A two-node chain with a null-rooted bottom, standing in for the
    /// global + program pair without the entry runtime.
    unsafe fn tiny_stack() -> *mut StackNode {
        let base = unsafe { reset(std::ptr::null_mut()) };
        unsafe { reset(base) }
    }

    #[test]
    fn reset_pushes_a_fresh_prompt() {
        unsafe {
            let top = tiny_stack();
            let inner = reset(top);
            assert_eq!(chain_len(inner), 3);
            assert_ne!(current_prompt(inner), current_prompt(top));
            assert_eq!((*inner).rest, top);
            // Tear down: the whole chain is detached from any runtime, so
            // erase_stack reclaims it.
            erase_stack(inner);
        }
    }

    #[test]
    fn reset_then_underflow_restores_the_top() {
        unsafe {
            let top = tiny_stack();
            let before = chain_prompts(top);
            let inner = reset(top);
            // Pop the sentinel the way the return path would, then
            // underflow.
            crate::node::stack_deallocate(inner, FRAME_HEADER_BYTES);
            let after = underflow_stack(inner);
            assert_eq!(after, top);
            assert_eq!(chain_prompts(after), before);
            erase_stack(top);
        }
    }

    #[test]
    fn shift_detaches_through_the_matching_node() {
        unsafe {
            let base = reset(std::ptr::null_mut());
            let middle = reset(base);
            let p = current_prompt(middle);
            let top = reset(middle);

            let remainder = shift(top, p).unwrap();
            assert_eq!(remainder, base);
            // Captured prefix: top and middle, bottom rest null.
            assert_eq!(chain_len(top), 2);
            assert_eq!((*middle).rest, std::ptr::null_mut());
            assert_eq!((*top).rc, 0);

            erase_stack(top);
            erase_stack(base);
        }
    }

    #[test]
    fn shift_of_the_top_prompt_captures_one_node() {
        unsafe {
            let base = reset(std::ptr::null_mut());
            let top = reset(base);
            let p = current_prompt(top);

            let remainder = shift(top, p).unwrap();
            assert_eq!(remainder, base);
            assert_eq!(chain_len(top), 1);

            erase_stack(top);
            erase_stack(base);
        }
    }

    #[test]
    fn shift_unknown_prompt_is_a_fault() {
        unsafe {
            let top = tiny_stack();
            let missing = Prompt::fresh();
            assert_eq!(
                shift(top, missing),
                Err(Fault::PromptNotFound { prompt: missing })
            );
            // The chain is untouched by a failed shift.
            assert_eq!(chain_len(top), 2);
            erase_stack(top);
        }
    }

    #[test]
    fn resume_of_sole_owner_splices_in_place() {
        unsafe {
            let base = reset(std::ptr::null_mut());
            let top = reset(base);
            let p = current_prompt(top);
            let before = chain_prompts(top);

            let remainder = shift(top, p).unwrap();
            let restored = resume(top, remainder);
            // Sole owner: no clone, the same node is spliced back.
            assert_eq!(restored, top);
            assert_eq!(chain_prompts(restored), before);

            let remainder = shift(restored, p).unwrap();
            assert_eq!(remainder, base);
            erase_stack(restored);
            erase_stack(base);
        }
    }
}
