//! Alternating admission tokens for the degraded state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Hands out alternating tokens: `true, false, true, ...`.
///
/// A `true` token is the block phase. The phase is never reset, so repeated
/// entries into the degraded state continue the sequence where it left off.
#[derive(Debug)]
pub struct TrafficSampler {
    phase: AtomicBool,
}

impl TrafficSampler {
    pub fn new() -> Self {
        Self {
            phase: AtomicBool::new(true),
        }
    }

    /// Take the next token.
    ///
    /// Read and flip happen in one atomic operation, so concurrent callers
    /// never observe the same phase twice in a row.
    pub fn next_token(&self) -> bool {
        self.phase.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for TrafficSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn tokens_alternate_starting_with_block() {
        let sampler = TrafficSampler::new();
        let tokens: Vec<bool> = (0..6).map(|_| sampler.next_token()).collect();
        assert_eq!(tokens, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn concurrent_callers_split_tokens_evenly() {
        let sampler = Arc::new(TrafficSampler::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sampler = sampler.clone();
                std::thread::spawn(move || {
                    (0..1000).filter(|_| sampler.next_token()).count()
                })
            })
            .collect();

        let blocked: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(blocked, 4000);
    }
}
