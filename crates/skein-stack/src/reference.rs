//! Prompt-scoped mutable cells overlaid on stack segments.
//!
//! A reference's cell lives *in* the segment of the prompt it is bound
//! to: `new_reference` carves one word at the current sp and records
//! (prompt, offset). Resolution walks the live meta-stack for the node
//! bearing the prompt and adds the offset to its segment base. Because
//! cells share the segment, capturing a continuation copies them with the
//! frames and every resumption of a cloned prefix sees an independent
//! store.
//!
//! Cells are accounted to the frame pushed above them: that frame's
//! sharer and eraser step over the cell words along with its own locals,
//! keeping the segment walkable from sp. Generated code maintains this
//! invariant; a segment whose topmost allocation is a bare cell must not
//! be captured or erased.

use skein_core::{Fault, Reference, Word, WORD_BYTES};

use crate::node::{stack_allocate, StackNode};

/// Allocate a mutable cell in the current prompt's arena.
///
/// Carves one word at the top of the current segment and returns a
/// reference encoding (current prompt, old sp − base). The cell is
/// uninitialized; generated code stores before any load.
///
/// # Safety
///
/// `stack` must be a live meta-stack top.
pub unsafe fn new_reference(stack: *mut StackNode) -> Result<Reference, Fault> {
    unsafe {
        let prompt = (*stack).prompt;
        let offset = (*stack).mem.used() as u32;
        stack_allocate(stack, WORD_BYTES)?;
        Reference::new(prompt, offset)
    }
}

/// Resolve a reference to the raw pointer of its cell.
///
/// Walks the live meta-stack from the top for the node bearing the
/// reference's prompt. The reference is dereferenceable exactly while
/// such a node exists and the offset lies within the segment's used
/// portion; otherwise the reference dangles.
///
/// # Safety
///
/// `stack` must be a live meta-stack top.
pub unsafe fn get_var_pointer(
    reference: Reference,
    stack: *mut StackNode,
) -> Result<*mut Word, Fault> {
    let mut node = stack;
    while !node.is_null() {
        unsafe {
            if (*node).prompt == reference.prompt() {
                let offset = reference.offset() as usize;
                if offset + WORD_BYTES > (*node).mem.used() {
                    return Err(Fault::DanglingReference { reference });
                }
                return Ok((*node).mem.base.add(offset).cast::<Word>());
            }
            node = (*node).rest;
        }
    }
    Err(Fault::DanglingReference { reference })
}

/// Load the word stored in a reference's cell.
///
/// # Safety
///
/// As [`get_var_pointer`]; the cell must have been stored at least once.
pub unsafe fn load_reference(reference: Reference, stack: *mut StackNode) -> Result<Word, Fault> {
    unsafe { get_var_pointer(reference, stack).map(|cell| cell.read()) }
}

/// Store a word into a reference's cell.
///
/// # Safety
///
/// As [`get_var_pointer`].
pub unsafe fn store_reference(
    reference: Reference,
    stack: *mut StackNode,
    value: Word,
) -> Result<(), Fault> {
    unsafe { get_var_pointer(reference, stack).map(|cell| cell.write(value)) }
}
