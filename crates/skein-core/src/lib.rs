//! Core types for the skein effect-handler runtime.
//!
//! This is the leaf crate with zero internal skein dependencies. It defines
//! the fundamental vocabulary shared by the heap, stack, and entry-runtime
//! crates: the machine word, type-erased code pointers, prompts, evidence,
//! packed references, and the fatal-fault taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod prompt;
pub mod reference;
pub mod word;

// Re-export core types at crate root for convenience.
pub use error::Fault;
pub use prompt::{Evidence, Prompt};
pub use reference::Reference;
pub use word::{Code, Word, WORD_BYTES};
