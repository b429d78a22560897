//! Reference-counted heap objects and values for the skein runtime.
//!
//! User data lives in header+payload heap blocks with per-object reference
//! counts and type-specific erasers emitted by the code generator. This
//! crate is one of two that may contain `unsafe` code (along with
//! `skein-stack`): it hands out raw object pointers whose lifetime is
//! governed by reference counts, not the borrow checker.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod object;
pub mod value;

pub use object::{
    erase_object, new_object, object_environment, object_rc, share_object, Eraser, HeapObject,
    HEADER_BYTES,
};
pub use value::{
    erase_negative, erase_positive, share_negative, share_positive, Negative, Positive,
};
