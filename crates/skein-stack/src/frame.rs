//! Frame headers and the share/erase walks.
//!
//! Every live frame ends with a [`FrameHeader`]: three pointer-sized slots
//! holding the return address and the code-generator-emitted share/erase
//! callbacks that know the frame's local layout. A frame is
//! `[locals][header]` with sp one past the header, so the topmost header
//! of a segment is always at `sp - FRAME_HEADER_BYTES`.
//!
//! The walks are loops, not recursion: each walker processes its own
//! frame's heap-typed locals and returns the sp of the frame below, and
//! the sentinel walker at the bottom of every segment returns null. A
//! million-frame segment therefore costs O(1) native stack to walk.

use skein_core::{Code, Word};

use crate::node::StackNode;

/// A code-generator-emitted share or erase callback.
///
/// Invoked with sp pointing one past its frame's header. The walker
/// shares (or erases) each heap-typed local of that frame and returns the
/// sp of the frame below, or null from the bottom sentinel to end the
/// walk.
pub type Walker = unsafe fn(sp: *mut u8) -> *mut u8;

/// The shape of return addresses the runtime itself invokes.
///
/// Generated code stores return addresses type-erased as [`Code`] and
/// calls them with the concrete result type of the call site; the
/// runtime's own sentinels (top level, underflow) all use this word-sized
/// result shape.
pub type ReturnFn = unsafe fn(result: Word, stack: *mut StackNode);

/// The three-slot record at the top of every frame.
///
/// The layout is normative for the code generator: return address, then
/// sharer, then eraser, each pointer-sized, no padding. All three slots
/// must be populated before any call out of the frame.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FrameHeader {
    /// Continuation code for the frame's pending call.
    pub return_address: Code,
    /// Walker that shares the frame's heap-typed locals.
    pub sharer: Walker,
    /// Walker that erases the frame's heap-typed locals.
    pub eraser: Walker,
}

/// Size of a frame header in bytes: three pointer-sized slots.
pub const FRAME_HEADER_BYTES: usize = std::mem::size_of::<FrameHeader>();

/// The header of the topmost frame of a segment whose sp is `sp`.
///
/// # Safety
///
/// At least one frame must be live in the segment.
pub unsafe fn header_at(sp: *mut u8) -> *mut FrameHeader {
    unsafe { sp.sub(FRAME_HEADER_BYTES).cast::<FrameHeader>() }
}

/// The walker installed in sentinel frames: ends the walk.
///
/// Every segment's bottom frame carries `walk_end` as both sharer and
/// eraser, so [`share_frames`] and [`erase_frames`] terminate there for
/// any segment built through runtime-defined pushes.
pub unsafe fn walk_end(_sp: *mut u8) -> *mut u8 {
    std::ptr::null_mut()
}

/// Share every heap object referenced by every live frame below `sp`.
///
/// # Safety
///
/// `sp` must be the sp of a segment whose frames all carry valid headers,
/// with a sentinel frame at the bottom.
pub unsafe fn share_frames(sp: *mut u8) {
    let mut sp = sp;
    while !sp.is_null() {
        let header = unsafe { header_at(sp) };
        sp = unsafe { ((*header).sharer)(sp) };
    }
}

/// Erase every heap object referenced by every live frame below `sp`.
///
/// # Safety
///
/// As [`share_frames`].
pub unsafe fn erase_frames(sp: *mut u8) {
    let mut sp = sp;
    while !sp.is_null() {
        let header = unsafe { header_at(sp) };
        sp = unsafe { ((*header).eraser)(sp) };
    }
}

/// Pop the top frame header of the top segment and tail-call its return
/// address with `result`.
///
/// This is the runtime's return path: the returning function's own frame
/// is already gone, the header on top belongs to the caller's
/// continuation, and the continuation finds its locals directly below the
/// new sp.
///
/// # Safety
///
/// The top segment must hold at least one frame, and its return address
/// must have the [`ReturnFn`] shape.
pub unsafe fn return_to(result: Word, stack: *mut StackNode) {
    unsafe {
        let sp = (*stack).mem.sp;
        let header = header_at(sp).read();
        (*stack).mem.sp = sp.sub(FRAME_HEADER_BYTES);
        let ret: ReturnFn = std::mem::transmute::<Code, ReturnFn>(header.return_address);
        ret(result, stack)
    }
}
