//! Segmented meta-stack and delimited-continuation machinery.
//!
//! The meta-stack is an intrusive linked list of stack segments, one per
//! installed prompt, that implements multi-prompt delimited control:
//!
//! ```text
//!                 +-----------------+
//!      top ────▶  |  StackNode p₃   |
//!                 +-----------------+
//!                          | rest
//!                          ▼
//!                 +-----------------+
//!                 |  StackNode p₂   |
//!                 +-----------------+
//!                          | rest
//!                          ▼
//!                 +-----------------+
//!                 |  StackNode p₁   |   (global base: rest == null)
//!                 +-----------------+
//! ```
//!
//! `reset` pushes a node, `shift` detaches the prefix above and including
//! a named prompt, `resume` splices a captured prefix back, and
//! `unique_stack` clones a shared prefix so every alias observes an
//! independent copy — segments, arena cells, and heap ownership included.
//!
//! This crate is one of two that may contain `unsafe` code (along with
//! `skein-heap`): segments are raw memory regions walked through
//! code-generator-emitted callbacks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod frame;
pub mod meta;
pub mod node;
pub mod reference;
pub mod segment;
pub mod unique;

pub use frame::{
    erase_frames, header_at, return_to, share_frames, walk_end, FrameHeader, ReturnFn, Walker,
    FRAME_HEADER_BYTES,
};
pub use meta::{
    current_prompt, push_sentinel, reset, resume, shift, underflow_return, underflow_stack,
};
pub use node::{
    chain_len, chain_prompts, erase_stack, share_stack, stack_allocate, stack_deallocate,
    StackNode,
};
pub use reference::{get_var_pointer, load_reference, new_reference, store_reference};
pub use segment::{Segment, SEGMENT_BYTES};
pub use unique::unique_stack;
