//! Review session state machine.
//!
//! One owned context holds the whole per-session state: the current phase,
//! the fixed candidate batch, the review queue of candidate indices, the
//! captured-image preview, and a generation token that fences off stale
//! async completions. Transition methods mutate the context and hand any
//! side effect (a deep link to open) back to the caller instead of
//! performing I/O themselves.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::candidate::EventCandidate;
use crate::gcal;

/// Captured image bytes retained for preview and resubmission.
///
/// Released (dropped) on reset and on replacement capture so repeated scans
/// cannot accumulate image buffers.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Top-level phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for a capture.
    Idle,
    /// One extraction request in flight.
    Processing,
    /// Walking the queue of extracted candidates (possibly already empty).
    Review,
    /// Extraction failed; one message, one "try again" exit.
    Failed,
}

/// Owned session context with explicit transitions.
#[derive(Debug)]
pub struct ReviewSession {
    phase: SessionPhase,
    generation: u64,
    candidates: Vec<EventCandidate>,
    queue: VecDeque<usize>,
    preview: Option<CapturedImage>,
    error: Option<String>,
    /// Set between `begin_commit` and `finish_commit` while the UI shows
    /// the saved acknowledgment on the front card.
    committing: bool,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            generation: 0,
            candidates: Vec::new(),
            queue: VecDeque::new(),
            preview: None,
            error: None,
            committing: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn preview(&self) -> Option<&CapturedImage> {
        self.preview.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    /// Candidate indices currently in the queue, front first.
    pub fn queue(&self) -> impl Iterator<Item = usize> + '_ {
        self.queue.iter().copied()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Review reached with nothing left to process.
    pub fn all_processed(&self) -> bool {
        self.phase == SessionPhase::Review && self.queue.is_empty()
    }

    pub fn candidate(&self, index: usize) -> Option<&EventCandidate> {
        self.candidates.get(index)
    }

    /// The front candidate: the only one the UI may edit.
    pub fn front(&self) -> Option<&EventCandidate> {
        self.queue.front().and_then(|&i| self.candidates.get(i))
    }

    /// Mutable access to the front candidate. Edits land on the canonical
    /// array, so they survive queue operations.
    pub fn front_mut(&mut self) -> Option<&mut EventCandidate> {
        let index = *self.queue.front()?;
        self.candidates.get_mut(index)
    }

    /// Begin extraction for a newly captured image. Legal only from `Idle`;
    /// any prior preview is replaced (and thereby released).
    ///
    /// Returns the generation token to attach to the in-flight request.
    pub fn capture(&mut self, image: CapturedImage) -> Option<u64> {
        if self.phase != SessionPhase::Idle {
            warn!(phase = ?self.phase, "capture ignored outside Idle");
            return None;
        }
        self.preview = Some(image);
        self.start_processing()
    }

    /// Re-submit the retained preview after a failure, from `Idle`.
    pub fn resubmit(&mut self) -> Option<u64> {
        if self.phase != SessionPhase::Idle || self.preview.is_none() {
            return None;
        }
        self.start_processing()
    }

    fn start_processing(&mut self) -> Option<u64> {
        self.generation += 1;
        self.phase = SessionPhase::Processing;
        self.error = None;
        debug!(generation = self.generation, "extraction started");
        Some(self.generation)
    }

    /// Deliver a successful extraction result.
    ///
    /// Completions carrying a stale generation token (the session was reset
    /// or re-captured while the request was in flight) are dropped.
    pub fn extraction_succeeded(&mut self, generation: u64, candidates: Vec<EventCandidate>) {
        if !self.accepts_completion(generation) {
            return;
        }
        self.queue = (0..candidates.len()).collect();
        self.candidates = candidates;
        self.committing = false;
        self.phase = SessionPhase::Review;
        debug!(count = self.candidates.len(), "entering review");
    }

    /// Deliver a failed extraction. The preview is retained so the user can
    /// retry without re-picking the image.
    pub fn extraction_failed(&mut self, generation: u64, message: impl Into<String>) {
        if !self.accepts_completion(generation) {
            return;
        }
        self.error = Some(message.into());
        self.phase = SessionPhase::Failed;
    }

    fn accepts_completion(&self, generation: u64) -> bool {
        if self.phase != SessionPhase::Processing || generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                phase = ?self.phase,
                "dropping stale extraction completion"
            );
            return false;
        }
        true
    }

    /// Mark the front candidate saved and return its deep link for the
    /// caller to open. The card stays at the front (rendered as saved)
    /// until [`finish_commit`](Self::finish_commit) removes it after the
    /// UI's acknowledgment delay.
    ///
    /// No-op on an empty queue or while a commit is already pending.
    pub fn begin_commit(&mut self) -> Option<String> {
        if self.phase != SessionPhase::Review || self.committing {
            return None;
        }
        let url = self.front().map(gcal::render_url)?;
        self.committing = true;
        Some(url)
    }

    /// Remove the committed front card.
    pub fn finish_commit(&mut self) {
        if !self.committing {
            return;
        }
        self.committing = false;
        self.queue.pop_front();
    }

    /// Remove the front card without opening anything. No-op on an empty
    /// queue.
    pub fn discard(&mut self) -> bool {
        if self.phase != SessionPhase::Review || self.committing {
            return false;
        }
        self.queue.pop_front().is_some()
    }

    /// Return to `Idle` from any phase: clears candidates, queue, and error,
    /// releases the preview, and invalidates in-flight completions.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.candidates.clear();
        self.queue.clear();
        self.preview = None;
        self.error = None;
        self.committing = false;
    }

    /// Leave `Failed` for `Idle`, keeping the preview for a retry.
    pub fn try_again(&mut self) {
        if self.phase == SessionPhase::Failed {
            self.phase = SessionPhase::Idle;
            self.error = None;
        }
    }
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> CapturedImage {
        CapturedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        }
    }

    fn batch(n: usize) -> Vec<EventCandidate> {
        (0..n)
            .map(|i| EventCandidate {
                title: format!("Event {i}"),
                start_date_time: "2025-06-02T09:00:00+00:00".to_string(),
                ..EventCandidate::default()
            })
            .collect()
    }

    fn session_in_review(n: usize) -> ReviewSession {
        let mut session = ReviewSession::new();
        let generation = session.capture(image()).expect("capture from idle");
        session.extraction_succeeded(generation, batch(n));
        session
    }

    #[test]
    fn test_happy_path_reaches_review_with_identity_queue() {
        let session = session_in_review(3);
        assert_eq!(session.phase(), SessionPhase::Review);
        assert_eq!(session.queue().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(session.front().unwrap().title, "Event 0");
    }

    #[test]
    fn test_capture_is_only_legal_from_idle() {
        let mut session = ReviewSession::new();
        session.capture(image()).expect("first capture");
        assert!(session.capture(image()).is_none(), "no capture mid-flight");
        assert_eq!(session.phase(), SessionPhase::Processing);
    }

    #[test]
    fn test_empty_batch_enters_review_terminal_not_error() {
        let session = session_in_review(0);
        assert_eq!(session.phase(), SessionPhase::Review);
        assert!(session.all_processed());
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_failure_keeps_preview_for_retry() {
        let mut session = ReviewSession::new();
        let generation = session.capture(image()).unwrap();
        session.extraction_failed(generation, "relay error: 502");

        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.error_message(), Some("relay error: 502"));
        assert!(session.preview().is_some());

        session.try_again();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.preview().is_some(), "preview survives try-again");
        assert!(session.resubmit().is_some(), "retained preview resubmits");
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut session = ReviewSession::new();
        let stale = session.capture(image()).unwrap();
        session.reset();
        let fresh = session.capture(image()).unwrap();
        assert_ne!(stale, fresh);

        session.extraction_succeeded(stale, batch(5));
        assert_eq!(
            session.phase(),
            SessionPhase::Processing,
            "stale success must not enter review"
        );

        session.extraction_failed(stale, "late failure");
        assert_eq!(session.phase(), SessionPhase::Processing);

        session.extraction_succeeded(fresh, batch(2));
        assert_eq!(session.phase(), SessionPhase::Review);
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn test_discard_commit_discard_scenario() {
        let mut session = session_in_review(3);

        // Discard candidate 0.
        assert!(session.discard());

        // Edit then commit candidate 1.
        session.front_mut().unwrap().title = "Edited Title".to_string();
        let url = session.begin_commit().expect("commit returns a link");
        assert!(url.contains("text=Edited%20Title"));
        assert!(session.is_committing());
        session.finish_commit();

        // Discard candidate 2.
        assert!(session.discard());

        assert!(session.all_processed());
        // Committed edits persisted on the canonical array.
        assert_eq!(session.candidate(1).unwrap().title, "Edited Title");
    }

    #[test]
    fn test_queue_stays_a_prefix_removed_identity_subsequence() {
        let mut session = session_in_review(4);
        session.discard();
        let _ = session.begin_commit();
        session.finish_commit();

        let remaining: Vec<usize> = session.queue().collect();
        assert_eq!(remaining, vec![2, 3]);

        let mut seen = std::collections::HashSet::new();
        assert!(remaining.iter().all(|i| seen.insert(*i)), "no duplicates");
    }

    #[test]
    fn test_commit_and_discard_on_empty_queue_are_noops() {
        let mut session = session_in_review(0);
        assert!(session.begin_commit().is_none());
        assert!(!session.discard());
        session.finish_commit();
        assert!(session.all_processed());
    }

    #[test]
    fn test_discard_is_blocked_while_commit_pending() {
        let mut session = session_in_review(2);
        let _ = session.begin_commit().expect("commit");
        assert!(!session.discard(), "front is frozen during the saved flash");
        session.finish_commit();
        assert_eq!(session.remaining(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session_in_review(3);
        session.reset();

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.remaining(), 0);
        assert!(session.preview().is_none(), "preview released on reset");
        assert!(session.error_message().is_none());
        assert!(session.front().is_none());
    }

    #[test]
    fn test_capture_replaces_previous_preview() {
        let mut session = ReviewSession::new();
        let generation = session.capture(image()).unwrap();
        session.extraction_failed(generation, "boom");
        session.try_again();

        let replacement = CapturedImage {
            bytes: vec![9, 9],
            mime_type: "image/jpeg".to_string(),
        };
        session.capture(replacement).unwrap();
        assert_eq!(session.preview().unwrap().bytes, vec![9, 9]);
    }
}
