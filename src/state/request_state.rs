/// Request state definitions for tracking a submission through the orchestrator
///
/// A submission moves `Queued -> PolicyCheck -> Fetching -> Extracting` and
/// ends in `Succeeded` or `Failed`. A retryable failure may be re-queued.
use crate::model::FetchMethod;
use crate::FairwayError;
use std::fmt;

/// Represents the current state of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    // ===== Active States =====
    /// Waiting for a worker
    Queued,

    /// Consulting robots.txt
    PolicyCheck,

    /// Waiting on the network or the renderer
    Fetching(FetchMethod),

    /// Running the extraction pipeline on a fetched document
    Extracting,

    // ===== Terminal States =====
    /// A result with extracted facts was produced
    Succeeded,

    /// The attempt failed; `retryable` failures may go back to `Queued`
    Failed { retryable: bool },
}

impl RequestState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { retryable: false })
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Queued | Self::PolicyCheck | Self::Fetching(_) | Self::Extracting
        )
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// | From | To |
    /// |------|----|
    /// | Queued | PolicyCheck |
    /// | PolicyCheck | Fetching, Failed |
    /// | Fetching | Extracting, Failed |
    /// | Extracting | Succeeded, Failed, Fetching(dynamic) |
    /// | Failed (retryable) | Queued, Failed (terminal) |
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        use RequestState::*;

        match (self, next) {
            (Queued, PolicyCheck) => true,
            (PolicyCheck, Fetching(_)) | (PolicyCheck, Failed { .. }) => true,
            (Fetching(_), Extracting) | (Fetching(_), Failed { .. }) => true,
            (Extracting, Succeeded) | (Extracting, Failed { .. }) => true,
            // Escalation after a low-confidence static extraction
            (Extracting, Fetching(FetchMethod::Dynamic)) => true,
            (Failed { retryable: true }, Queued) => true,
            (Failed { retryable: true }, Failed { retryable: false }) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::PolicyCheck => "policy-check",
            Self::Fetching(FetchMethod::Static) => "fetching-static",
            Self::Fetching(FetchMethod::Dynamic) => "fetching-dynamic",
            Self::Extracting => "extracting",
            Self::Succeeded => "succeeded",
            Self::Failed { retryable: true } => "failed-retryable",
            Self::Failed { retryable: false } => "failed",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated walk of one submission through [`RequestState`]
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    target_id: String,
    state: RequestState,
    history: Vec<RequestState>,
}

impl RequestLifecycle {
    /// Starts a lifecycle in `Queued`
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            state: RequestState::Queued,
            history: vec![RequestState::Queued],
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Every state visited so far, oldest first
    pub fn history(&self) -> &[RequestState] {
        &self.history
    }

    /// Moves to `next`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The transition was legal and applied
    /// * `Err(FairwayError::InvalidTransition)` - The state is unchanged
    pub fn transition(&mut self, next: RequestState) -> Result<(), FairwayError> {
        if !self.state.can_transition_to(next) {
            return Err(FairwayError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!(
            target_id = %self.target_id,
            from = %self.state,
            to = %next,
            "Request state transition"
        );
        self.state = next;
        self.history.push(next);
        Ok(())
    }
}
