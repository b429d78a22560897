//! Packed references to prompt-scoped mutable cells.

use std::fmt;

use crate::error::Fault;
use crate::prompt::Prompt;

/// A handle to a mutable cell bound to a dynamic prompt.
///
/// A reference records *which* prompt's arena holds its cell (`prompt`)
/// and *where* in that arena the cell sits (`offset`, in bytes from the
/// segment base). It is dereferenceable exactly while some live meta-stack
/// node bears the prompt; resolution is the stack crate's job.
///
/// The layout is normative for the code generator: two 32-bit fields
/// packed into one 64-bit word, prompt in the low half. Generated frames
/// store references in a single word-sized local via [`Reference::to_bits`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
#[must_use]
pub struct Reference {
    prompt: u32,
    offset: u32,
}

impl Reference {
    /// Create a reference to the cell at `offset` bytes into the arena of
    /// `prompt`.
    ///
    /// Returns `Err(Fault::PromptOverflow)` if the prompt does not fit the
    /// packed 32-bit field. Offsets always fit: segment reservations are
    /// far below 4GiB.
    pub fn new(prompt: Prompt, offset: u32) -> Result<Self, Fault> {
        let narrow = u32::try_from(prompt.0).map_err(|_| Fault::PromptOverflow { prompt })?;
        Ok(Self {
            prompt: narrow,
            offset,
        })
    }

    /// The prompt whose arena holds the cell.
    pub fn prompt(&self) -> Prompt {
        Prompt(u64::from(self.prompt))
    }

    /// Byte offset of the cell from the owning segment's base.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Pack into the single 64-bit word stored in generated frames.
    pub fn to_bits(self) -> u64 {
        u64::from(self.prompt) | (u64::from(self.offset) << 32)
    }

    /// Unpack from the 64-bit word representation.
    pub fn from_bits(bits: u64) -> Self {
        Self {
            prompt: bits as u32,
            offset: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference(prompt={}, offset={})", self.prompt, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_preserves_fields() {
        let r = Reference::new(Prompt(7), 4096).unwrap();
        assert_eq!(r.prompt(), Prompt(7));
        assert_eq!(r.offset(), 4096);
    }

    #[test]
    fn wide_prompt_is_rejected() {
        let wide = Prompt(u64::from(u32::MAX) + 1);
        assert!(matches!(
            Reference::new(wide, 0),
            Err(Fault::PromptOverflow { .. })
        ));
    }

    #[test]
    fn max_narrow_prompt_is_accepted() {
        let r = Reference::new(Prompt(u64::from(u32::MAX)), 8).unwrap();
        assert_eq!(r.prompt(), Prompt(u64::from(u32::MAX)));
    }

    proptest! {
        #[test]
        fn bits_round_trip(prompt in 0u32.., offset in 0u32..) {
            let r = Reference::new(Prompt(u64::from(prompt)), offset).unwrap();
            let back = Reference::from_bits(r.to_bits());
            prop_assert_eq!(r, back);
        }

        #[test]
        fn distinct_references_pack_distinctly(
            a in 0u32..,
            b in 0u32..,
            off_a in 0u32..,
            off_b in 0u32..,
        ) {
            let ra = Reference::new(Prompt(u64::from(a)), off_a).unwrap();
            let rb = Reference::new(Prompt(u64::from(b)), off_b).unwrap();
            prop_assert_eq!(ra == rb, ra.to_bits() == rb.to_bits());
        }
    }
}
