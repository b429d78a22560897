//! Prompts and evidence: the identifiers of dynamic scope.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`Prompt`] allocation. Starts at 1 so that minted
/// prompts never collide with [`Prompt::GLOBAL`].
static PROMPT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier naming a dynamic scope boundary.
///
/// Each `reset` mints a fresh prompt via [`Prompt::fresh`]. Prompts are
/// the search keys of `shift` and the binding scope of references.
/// Within one process, minted prompts are strictly increasing and never
/// reused, even across independent meta-stacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prompt(pub u64);

impl Prompt {
    /// The prompt of the global base node under every program. Never
    /// minted by [`Prompt::fresh`].
    pub const GLOBAL: Prompt = Prompt(0);

    /// Mint a fresh, process-unique prompt.
    ///
    /// Each call returns a prompt strictly greater than every prompt
    /// returned before it within this process.
    pub fn fresh() -> Self {
        Self(PROMPT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Prompt {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A lexical distance in prompt boundaries.
///
/// The lifting pass annotates every effect operation with the number of
/// `reset` boundaries between the operation and its handler; generated
/// code threads that number through calls as evidence. `0` means "here".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Evidence(pub u64);

impl Evidence {
    /// The evidence of an operation handled at the current prompt.
    pub const HERE: Evidence = Evidence(0);
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Evidence {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_prompts_are_strictly_increasing() {
        let a = Prompt::fresh();
        let b = Prompt::fresh();
        let c = Prompt::fresh();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn fresh_never_returns_global() {
        for _ in 0..64 {
            assert_ne!(Prompt::fresh(), Prompt::GLOBAL);
        }
    }

    #[test]
    fn evidence_here_is_zero() {
        assert_eq!(Evidence::HERE, Evidence(0));
    }
}
