use meshvoice_core::IceCandidate;
use std::collections::VecDeque;

/// FIFO buffer for candidates that arrive before a remote description exists.
///
/// The queue does not know about descriptions; the owner decides whether a
/// candidate is queued or applied directly.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: IceCandidate) {
        self.pending.push_back(candidate);
    }

    /// Returns everything buffered so far in arrival order and leaves the
    /// queue empty. Calling it again with nothing queued yields nothing.
    pub fn drain(&mut self) -> Vec<IceCandidate> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops whatever is still buffered.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
