//! The single user-visible failure path.
//!
//! The runtime never recovers from an invariant violation: a missing
//! prompt, a dangling reference, or an exhausted segment means the code
//! generator emitted wrong code or memory was corrupted, and execution
//! cannot meaningfully continue. One diagnostic, one nonzero exit.

use skein_core::Fault;

/// Print a diagnostic for `fault` and terminate the process.
///
/// Clean termination is the absence of this call plus a top-level
/// underflow that observed an empty meta-stack.
pub fn die(fault: Fault) -> ! {
    eprintln!("skein: fatal: {fault}");
    std::process::exit(1)
}
