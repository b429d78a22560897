//! The machine word and type-erased code pointers.

/// The machine word of the calling convention.
///
/// Every stack cell, constructor tag, scalar argument, and return value
/// travels as a `Word`. Generated code reinterprets words as pointers or
/// floats at statically known offsets; the runtime itself only ever moves
/// them.
pub type Word = i64;

/// Size of a [`Word`] in bytes. Frame locals and reference cells are laid
/// out in word-sized slots.
pub const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// A type-erased code pointer.
///
/// Return addresses and vtable entries are stored as `Code` and transmuted
/// to their concrete function signature at the call site, which knows the
/// static type. The runtime only calls through `Code` in two places: the
/// return path (`skein-stack`) and closure entry (`skein-rt`).
pub type Code = *const ();
