//! The flat entry-point surface generated code links against.
//!
//! One module, every runtime call the code generator may emit:
//!
//! | Entry point | Contract |
//! |-------------|----------|
//! | [`new_object`], [`object_environment`], [`share_object`], [`erase_object`] | heap blocks; null-safe share/erase |
//! | [`share_positive`], [`erase_positive`], [`share_negative`], [`erase_negative`] | delegate to the value's `obj` field |
//! | [`stack_allocate`], [`stack_deallocate`] | adjust the top segment's sp |
//! | [`reset`], [`shift`], [`resume`], [`current_prompt`], [`underflow_stack`] | meta-stack control |
//! | [`share_stack`], [`erase_stack`] | captured-prefix ownership |
//! | [`new_reference`], [`get_var_pointer`] | prompt-scoped mutable cells |
//! | [`run`], [`run_int`], [`run_pos`] | program entry |
//! | [`print`], [`exit`] | assumed primitives |
//!
//! Operations that can fault are wrapped here: generated code never sees
//! a `Result`, it sees either the value or a diagnostic and process exit
//! (see [`crate::fault::die`]).

use skein_core::{Prompt, Reference, Word};
use skein_stack::StackNode;

use crate::fault::die;

pub use skein_heap::{
    erase_negative, erase_object, erase_positive, new_object, object_environment, share_negative,
    share_object, share_positive,
};
pub use skein_stack::{
    current_prompt, erase_stack, reset, resume, return_to, share_stack, stack_deallocate,
    underflow_stack,
};

pub use crate::entry::{run, run_int, run_pos, with_empty_stack};

/// Bump-allocate `bytes` in the top segment, returning the old sp.
///
/// Exceeding the segment reservation is fatal.
///
/// # Safety
///
/// As [`skein_stack::stack_allocate`].
pub unsafe fn stack_allocate(stack: *mut StackNode, bytes: usize) -> *mut u8 {
    unsafe { skein_stack::stack_allocate(stack, bytes) }.unwrap_or_else(|fault| die(fault))
}

/// Detach the prefix above and including the node bearing `prompt`; the
/// passed-in top becomes the captured prefix, the returned node the new
/// top. A missing prompt is fatal.
///
/// # Safety
///
/// As [`skein_stack::shift`].
pub unsafe fn shift(stack: *mut StackNode, prompt: Prompt) -> *mut StackNode {
    unsafe { skein_stack::shift(stack, prompt) }.unwrap_or_else(|fault| die(fault))
}

/// Allocate a mutable cell in the current prompt's arena. Fatal on
/// segment exhaustion or a prompt too wide for the packed encoding.
///
/// # Safety
///
/// As [`skein_stack::new_reference`].
pub unsafe fn new_reference(stack: *mut StackNode) -> Reference {
    unsafe { skein_stack::new_reference(stack) }.unwrap_or_else(|fault| die(fault))
}

/// Resolve a reference to its cell pointer. A dangling reference is
/// fatal.
///
/// # Safety
///
/// As [`skein_stack::get_var_pointer`].
pub unsafe fn get_var_pointer(reference: Reference, stack: *mut StackNode) -> *mut Word {
    unsafe { skein_stack::get_var_pointer(reference, stack) }.unwrap_or_else(|fault| die(fault))
}

/// Primitive integer output: one word, one line, stdout.
pub fn print(value: Word) {
    println!("{value}");
}

/// Terminate the process with the given status. The only process
/// termination path besides [`crate::fault::die`].
pub fn exit(code: i32) -> ! {
    std::process::exit(code)
}
