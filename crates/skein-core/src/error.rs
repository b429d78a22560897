//! The fatal-fault taxonomy of the runtime.
//!
//! The runtime recognizes only unrecoverable faults: they indicate a code
//! generator bug or memory corruption, never a condition user programs can
//! handle (the effect-handler machinery is the language's error mechanism
//! and never surfaces here). Operations that can fault return
//! `Result<_, Fault>` so they are testable; the entry-point surface in
//! `skein-rt` converts `Err` into a diagnostic and process exit.

use std::error::Error;
use std::fmt;

use crate::prompt::Prompt;
use crate::reference::Reference;

/// An unrecoverable runtime fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// `shift` searched the live meta-stack and found no node bearing the
    /// prompt.
    PromptNotFound {
        /// The prompt that was searched for.
        prompt: Prompt,
    },
    /// A reference was resolved after the node bearing its prompt left the
    /// live meta-stack, or its offset lies outside the segment's used
    /// portion.
    DanglingReference {
        /// The reference that failed to resolve.
        reference: Reference,
    },
    /// A prompt too wide for the packed 32-bit reference encoding.
    PromptOverflow {
        /// The oversized prompt.
        prompt: Prompt,
    },
    /// A stack allocation exceeded the segment's fixed reservation.
    SegmentOverflow {
        /// Bytes requested by the allocation.
        requested: usize,
        /// Bytes remaining in the segment.
        remaining: usize,
    },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromptNotFound { prompt } => {
                write!(f, "no such prompt on the live meta-stack: {prompt}")
            }
            Self::DanglingReference { reference } => {
                write!(f, "dangling reference: {reference}")
            }
            Self::PromptOverflow { prompt } => {
                write!(
                    f,
                    "prompt {prompt} does not fit the packed reference encoding"
                )
            }
            Self::SegmentOverflow {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "segment overflow: requested {requested} bytes, {remaining} remaining"
                )
            }
        }
    }
}

impl Error for Fault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_prompt() {
        let fault = Fault::PromptNotFound { prompt: Prompt(42) };
        assert_eq!(
            fault.to_string(),
            "no such prompt on the live meta-stack: 42"
        );
    }

    #[test]
    fn display_reports_overflow_sizes() {
        let fault = Fault::SegmentOverflow {
            requested: 64,
            remaining: 8,
        };
        assert_eq!(
            fault.to_string(),
            "segment overflow: requested 64 bytes, 8 remaining"
        );
    }
}
