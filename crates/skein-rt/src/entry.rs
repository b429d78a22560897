//! Program entry: the initial meta-stack and the top-level return.
//!
//! Every program runs over two nodes: a *global* base node (prompt 0, no
//! parent) and a *program* node whose bottom sentinel returns into
//! [`top_level`]. When the program's last frame returns, `top_level`
//! underflows both nodes and the machine is gone.

use skein_core::{Code, Evidence, Prompt, Word};
use skein_heap::{HeapObject, Negative, Positive};
use skein_stack::{push_sentinel, underflow_stack, ReturnFn, Segment, StackNode};

/// First-method shape of an argument-free program closure.
type Main = unsafe fn(obj: *mut HeapObject, evidence: Evidence, stack: *mut StackNode);

/// First-method shape of a program closure over one integer argument.
type MainInt =
    unsafe fn(obj: *mut HeapObject, evidence: Evidence, arg: Word, stack: *mut StackNode);

/// First-method shape of a program closure over one positive argument.
type MainPos =
    unsafe fn(obj: *mut HeapObject, evidence: Evidence, arg: Positive, stack: *mut StackNode);

/// Build the initial meta-stack: a global base node under a program node
/// whose sentinel frame returns into [`top_level`].
///
/// Returns the program node as the live top.
///
/// # Safety
///
/// The returned top is raw machine state; it must be driven through the
/// runtime's calling convention and torn down by the top-level return.
pub unsafe fn with_empty_stack() -> *mut StackNode {
    let global = StackNode::allocate(Segment::new(), Prompt::GLOBAL, std::ptr::null_mut());
    let mut seg = Segment::new();
    push_sentinel(&mut seg, top_level as ReturnFn as Code);
    StackNode::allocate(seg, Prompt::fresh(), global)
}

/// The program segment's sentinel return: tear the machine down.
///
/// Called when the program's last frame returns. The result is discarded
/// (programs communicate through `print` and reference cells); the
/// program and global nodes are underflowed in turn, and the final `rest`
/// must be null — anything else means the meta-stack was corrupted.
///
/// # Safety
///
/// Called only through the return path, with `stack` the program node of
/// a meta-stack built by [`with_empty_stack`].
pub unsafe fn top_level(result: Word, stack: *mut StackNode) {
    let _ = result;
    unsafe {
        let global = underflow_stack(stack);
        let rest = underflow_stack(global);
        assert!(rest.is_null(), "meta-stack not empty after top level");
    }
}

/// Run an argument-free program closure to completion.
///
/// Builds the empty stack and tail-calls the closure's first method with
/// evidence 0 (the program prompt is "here" at the top level).
///
/// # Safety
///
/// `f`'s first vtable method must have the [`Main`] shape and obey the
/// runtime calling convention.
pub unsafe fn run(f: Negative) {
    unsafe {
        let stack = with_empty_stack();
        let main = std::mem::transmute::<Code, Main>(f.method(0));
        main(f.obj, Evidence::HERE, stack)
    }
}

/// Run a program closure over one integer argument.
///
/// # Safety
///
/// As [`run`], with the [`MainInt`] method shape.
pub unsafe fn run_int(f: Negative, arg: Word) {
    unsafe {
        let stack = with_empty_stack();
        let main = std::mem::transmute::<Code, MainInt>(f.method(0));
        main(f.obj, Evidence::HERE, arg, stack)
    }
}

/// Run a program closure over one positive argument.
///
/// # Safety
///
/// As [`run`], with the [`MainPos`] method shape.
pub unsafe fn run_pos(f: Negative, arg: Positive) {
    unsafe {
        let stack = with_empty_stack();
        let main = std::mem::transmute::<Code, MainPos>(f.method(0));
        main(f.obj, Evidence::HERE, arg, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::WORD_BYTES;
    use skein_stack::{chain_len, chain_prompts, current_prompt, return_to, stack_allocate};
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn empty_stack_is_program_over_global() {
        unsafe {
            let top = with_empty_stack();
            assert_eq!(chain_len(top), 2);
            let prompts = chain_prompts(top);
            assert_ne!(prompts[0], Prompt::GLOBAL);
            assert_eq!(prompts[1], Prompt::GLOBAL);
            assert_eq!(current_prompt(top), prompts[0]);
            // Tear down through the normal return path.
            return_to(0, top);
        }
    }

    #[test]
    fn fresh_stacks_get_fresh_program_prompts() {
        unsafe {
            let a = with_empty_stack();
            let pa = current_prompt(a);
            return_to(0, a);
            let b = with_empty_stack();
            let pb = current_prompt(b);
            return_to(0, b);
            assert!(pb > pa);
        }
    }

    static OBSERVED: AtomicI64 = AtomicI64::new(0);

    unsafe fn record_main(_obj: *mut HeapObject, evidence: Evidence, stack: *mut StackNode) {
        OBSERVED.store(evidence.0 as i64 + 1, Ordering::Relaxed);
        unsafe { return_to(0, stack) }
    }

    #[test]
    fn run_drives_the_first_method_with_here_evidence() {
        let table = [record_main as Main as Code];
        let f = Negative::new(table.as_ptr(), std::ptr::null_mut());
        unsafe { run(f) };
        // Evidence 0 observed (stored as 0 + 1).
        assert_eq!(OBSERVED.load(Ordering::Relaxed), 1);
    }

    static INT_SEEN: AtomicI64 = AtomicI64::new(0);

    unsafe fn int_main(_obj: *mut HeapObject, _ev: Evidence, arg: Word, stack: *mut StackNode) {
        INT_SEEN.store(arg, Ordering::Relaxed);
        // A program that also touches its stack before returning.
        unsafe {
            stack_allocate(stack, WORD_BYTES).unwrap();
            skein_stack::stack_deallocate(stack, WORD_BYTES);
            return_to(arg, stack)
        }
    }

    #[test]
    fn run_int_passes_the_argument() {
        let table = [int_main as MainInt as Code];
        let f = Negative::new(table.as_ptr(), std::ptr::null_mut());
        unsafe { run_int(f, 42) };
        assert_eq!(INT_SEEN.load(Ordering::Relaxed), 42);
    }

    static POS_TAG: AtomicI64 = AtomicI64::new(-1);

    unsafe fn pos_main(_obj: *mut HeapObject, _ev: Evidence, arg: Positive, stack: *mut StackNode) {
        POS_TAG.store(arg.tag, Ordering::Relaxed);
        unsafe { return_to(0, stack) }
    }

    #[test]
    fn run_pos_passes_the_argument() {
        let table = [pos_main as MainPos as Code];
        let f = Negative::new(table.as_ptr(), std::ptr::null_mut());
        unsafe { run_pos(f, Positive::scalar(9)) };
        assert_eq!(POS_TAG.load(Ordering::Relaxed), 9);
    }
}
