//! Hand-built "generated code" fixtures for skein development.
//!
//! Everything the code generator would normally emit, written by hand for
//! tests: frame walkers, frame pushes, probe objects whose erasers count
//! or log their drops, deep captured-prefix builders, and vtable/closure
//! builders for the entry runtime.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

mod fixtures;

pub use fixtures::{
    deep_prefix, drain_erase_log, erase_object_local, leaked_vtable, logged_object, noop_eraser,
    plain_object, probe_object, push_cell_guard, push_object_frame, push_scalar_frame,
    share_object_local, skip_scalar_local,
};
