//! Demo state machine.
//!
//! Two independent tracks: verification (with the insight nested inside the
//! verified state) and policy generation. All transitions are synchronous;
//! callers apply asynchronous results by calling the `complete_*` methods.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{InsightText, PolicyDocument, VerificationResult};

/// Identifies one verification event.
pub type Epoch = u64;

/// Rejected transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// `verify` while a result is already shown.
    #[error("a verification is already active; reset it first")]
    AlreadyVerified,
    /// `begin_policy` while a request is outstanding.
    #[error("a policy generation request is already outstanding")]
    PolicyInFlight,
}

/// Insight for the current verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InsightTrack {
    /// Request outstanding.
    Pending,
    /// Explanation received.
    Ready(InsightText),
    /// The request failed; nothing to show.
    Empty,
}

/// Verification track. There is no explicit "verifying" state: while idle the
/// mounted widget is the pending UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerificationTrack {
    /// Widget mounted, no result yet.
    Idle,
    /// A result was delivered.
    Verified {
        /// What the widget reported.
        result: VerificationResult,
        /// Insight for this result.
        insight: InsightTrack,
        /// Tags insight completions for this result.
        epoch: Epoch,
    },
}

/// Policy track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PolicyTrack {
    /// Nothing generated yet.
    Empty,
    /// Request outstanding. `previous` stays on screen until it resolves.
    Generating {
        /// Document shown before this request.
        previous: Option<PolicyDocument>,
    },
    /// Last successful generation.
    Ready(PolicyDocument),
}

/// Whole application state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoState {
    /// Verification and its insight.
    pub verification: VerificationTrack,
    /// Policy generation.
    pub policy: PolicyTrack,
    next_epoch: Epoch,
}

impl Default for DemoState {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoState {
    /// Idle, with no policy.
    pub fn new() -> Self {
        Self {
            verification: VerificationTrack::Idle,
            policy: PolicyTrack::Empty,
            next_epoch: 1,
        }
    }

    /// Idle -> Verified with a pending insight. Returns the epoch the insight
    /// completion must present.
    pub fn verify(&mut self, result: VerificationResult) -> Result<Epoch, TransitionError> {
        if matches!(self.verification, VerificationTrack::Verified { .. }) {
            return Err(TransitionError::AlreadyVerified);
        }
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        self.verification = VerificationTrack::Verified {
            result,
            insight: InsightTrack::Pending,
            epoch,
        };
        Ok(epoch)
    }

    /// Applies an insight outcome. `None` means the request failed.
    ///
    /// Returns false (and changes nothing) when the verification it belongs to
    /// is gone or already has its insight.
    pub fn complete_insight(&mut self, for_epoch: Epoch, outcome: Option<InsightText>) -> bool {
        match &mut self.verification {
            VerificationTrack::Verified { insight, epoch, .. }
                if *epoch == for_epoch && *insight == InsightTrack::Pending =>
            {
                *insight = match outcome {
                    Some(text) => InsightTrack::Ready(text),
                    None => InsightTrack::Empty,
                };
                true
            }
            _ => false,
        }
    }

    /// Back to idle, dropping the result and its insight. Returns whether
    /// anything was cleared.
    pub fn reset(&mut self) -> bool {
        let was_verified = matches!(self.verification, VerificationTrack::Verified { .. });
        self.verification = VerificationTrack::Idle;
        was_verified
    }

    /// Empty | Ready -> Generating.
    pub fn begin_policy(&mut self) -> Result<(), TransitionError> {
        let previous = match &self.policy {
            PolicyTrack::Generating { .. } => return Err(TransitionError::PolicyInFlight),
            PolicyTrack::Empty => None,
            PolicyTrack::Ready(doc) => Some(doc.clone()),
        };
        self.policy = PolicyTrack::Generating { previous };
        Ok(())
    }

    /// Generating -> Ready. On failure (`None`) the previous document, if any,
    /// is restored. Returns false when no request was outstanding.
    pub fn complete_policy(&mut self, outcome: Option<PolicyDocument>) -> bool {
        let previous = match &mut self.policy {
            PolicyTrack::Generating { previous } => previous.take(),
            _ => return false,
        };
        self.policy = match outcome.or(previous) {
            Some(doc) => PolicyTrack::Ready(doc),
            None => PolicyTrack::Empty,
        };
        true
    }

    /// Result currently shown, if any.
    pub fn verification_result(&self) -> Option<&VerificationResult> {
        match &self.verification {
            VerificationTrack::Verified { result, .. } => Some(result),
            VerificationTrack::Idle => None,
        }
    }

    /// Insight text, once it has arrived.
    pub fn insight(&self) -> Option<&InsightText> {
        match &self.verification {
            VerificationTrack::Verified {
                insight: InsightTrack::Ready(text),
                ..
            } => Some(text),
            _ => None,
        }
    }

    /// Epoch of the active verification.
    pub fn epoch(&self) -> Option<Epoch> {
        match &self.verification {
            VerificationTrack::Verified { epoch, .. } => Some(*epoch),
            VerificationTrack::Idle => None,
        }
    }

    /// Document currently on screen, including the one kept during regeneration.
    pub fn policy(&self) -> Option<&PolicyDocument> {
        match &self.policy {
            PolicyTrack::Ready(doc) => Some(doc),
            PolicyTrack::Generating { previous } => previous.as_ref(),
            PolicyTrack::Empty => None,
        }
    }

    /// Insight request outstanding.
    pub fn is_analyzing(&self) -> bool {
        matches!(
            self.verification,
            VerificationTrack::Verified {
                insight: InsightTrack::Pending,
                ..
            }
        )
    }

    /// Policy request outstanding.
    pub fn is_generating_policy(&self) -> bool {
        matches!(self.policy, PolicyTrack::Generating { .. })
    }
}
