//! Lifecycle of one mutation attempt:
//! `Idle -> Validating -> {Accepted -> Persisting -> Done} | {Rejected -> Idle}`.
//!
//! Each state is its own type so a write cannot be started without an
//! accepted validation.

use crate::{Rejection, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Validating,
    Accepted,
    Rejected,
    Persisting,
    Done,
}

/// Entry point; a fresh attempt starts in `Validating`.
#[derive(Debug)]
pub struct MutationAttempt {
    kind: &'static str,
}

impl MutationAttempt {
    pub fn start(kind: &'static str) -> Self {
        trace(kind, MutationPhase::Idle, MutationPhase::Validating);
        Self { kind }
    }

    pub fn phase(&self) -> MutationPhase {
        MutationPhase::Validating
    }

    /// Settles validation. A rejection returns the attempt to `Idle`.
    pub fn decide(self, outcome: Result<Verdict, Rejection>) -> Result<Accepted, Rejection> {
        match outcome {
            Ok(verdict) => {
                trace(self.kind, MutationPhase::Validating, MutationPhase::Accepted);
                Ok(Accepted { kind: self.kind, verdict })
            }
            Err(rejection) => {
                trace(self.kind, MutationPhase::Validating, MutationPhase::Rejected);
                tracing::info!(mutation = self.kind, code = rejection.code.as_str(), "mutation rejected");
                trace(self.kind, MutationPhase::Rejected, MutationPhase::Idle);
                Err(rejection)
            }
        }
    }
}

#[derive(Debug)]
pub struct Accepted {
    kind: &'static str,
    verdict: Verdict,
}

impl Accepted {
    pub fn phase(&self) -> MutationPhase {
        MutationPhase::Accepted
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn persist(self) -> Persisting {
        trace(self.kind, MutationPhase::Accepted, MutationPhase::Persisting);
        Persisting { kind: self.kind, verdict: self.verdict }
    }
}

#[derive(Debug)]
pub struct Persisting {
    kind: &'static str,
    verdict: Verdict,
}

impl Persisting {
    pub fn phase(&self) -> MutationPhase {
        MutationPhase::Persisting
    }

    /// Call after the write committed. Hands back the verdict for the response.
    pub fn finish(self) -> Verdict {
        trace(self.kind, MutationPhase::Persisting, MutationPhase::Done);
        self.verdict
    }
}

fn trace(kind: &'static str, from: MutationPhase, to: MutationPhase) {
    tracing::debug!(mutation = kind, ?from, ?to, "mutation phase");
}
