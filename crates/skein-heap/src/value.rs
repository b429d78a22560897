//! Positive and negative runtime values.
//!
//! A *positive* value is a variant of a source-level sum type: a tag plus
//! an optional environment object holding the constructor's fields. A
//! *negative* value is codata: a vtable of method code pointers plus the
//! closure environment. Both are two words wide and passed by value; their
//! layout is normative for the code generator.

use skein_core::{Code, Word};

use crate::object::{erase_object, share_object, HeapObject};

/// A tagged variant of a sum type.
///
/// `obj` is null for zero-field constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Positive {
    /// Constructor tag, numbered per source type.
    pub tag: Word,
    /// Fields environment, or null for zero-field constructors.
    pub obj: *mut HeapObject,
}

impl Positive {
    /// A variant carrying a fields environment.
    pub const fn new(tag: Word, obj: *mut HeapObject) -> Self {
        Self { tag, obj }
    }

    /// A zero-field constructor: tag only, null environment.
    pub const fn scalar(tag: Word) -> Self {
        Self {
            tag,
            obj: std::ptr::null_mut(),
        }
    }
}

/// A codata value: vtable plus closure environment.
///
/// `vtable` points at an array of [`Code`] entries, one per method, in
/// declaration order. Methods have shape
/// `fn(obj, evidence, args..., stack)` and are transmuted to their
/// concrete signature at the call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Negative {
    /// Method table: an array of code pointers.
    pub vtable: *const Code,
    /// Closure environment, or null for capture-free closures.
    pub obj: *mut HeapObject,
}

impl Negative {
    /// A codata value over the given vtable and environment.
    pub const fn new(vtable: *const Code, obj: *mut HeapObject) -> Self {
        Self { vtable, obj }
    }

    /// Load the code pointer of method `index`.
    ///
    /// # Safety
    ///
    /// `index` must be within the vtable the code generator emitted for
    /// this value's type.
    pub unsafe fn method(&self, index: usize) -> Code {
        unsafe { *self.vtable.add(index) }
    }
}

/// Register an additional owner of a positive value's environment.
///
/// # Safety
///
/// As [`share_object`]: the `obj` field must be null or live.
pub unsafe fn share_positive(value: Positive) {
    unsafe { share_object(value.obj) }
}

/// Drop one owner of a positive value's environment.
///
/// # Safety
///
/// As [`erase_object`]: the `obj` field must be null or live, and owned.
pub unsafe fn erase_positive(value: Positive) {
    unsafe { erase_object(value.obj) }
}

/// Register an additional owner of a negative value's environment.
///
/// # Safety
///
/// As [`share_object`]: the `obj` field must be null or live.
pub unsafe fn share_negative(value: Negative) {
    unsafe { share_object(value.obj) }
}

/// Drop one owner of a negative value's environment.
///
/// # Safety
///
/// As [`erase_object`]: the `obj` field must be null or live, and owned.
pub unsafe fn erase_negative(value: Negative) {
    unsafe { erase_object(value.obj) }
}
