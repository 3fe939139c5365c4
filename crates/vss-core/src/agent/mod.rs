//! Agent protocol engine
//!
//! Every agent deals its own secret and verifies everyone else's:
//!
//! 1. Deal: broadcast commitments, unicast one share per agent.
//! 2. Verify: Feldman-check each received share and broadcast a share-vote.
//! 3. Vote: a quorum of positive (or f+1 negative) share-votes trigger a
//!    single commitment-vote.
//! 4. Decide: a quorum of matching commitment-votes latch Valid or Invalid.
//! 5. Reveal: once all subjects are decided and more than f are valid,
//!    broadcast own shares of the valid subjects.
//! 6. Reconstruct: interpolate each valid subject from t verified reveals.

mod engine;
mod messages;
mod tally;

pub use engine::Agent;
pub use messages::Message;
pub use tally::VoteTally;

use crate::{AgentId, Behavior, Decision, Error};
use serde::Serialize;
use std::collections::BTreeMap;

/// What one agent ended up knowing when it stopped
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    /// Reporting agent
    pub agent: AgentId,
    /// Behavior the agent ran with
    pub behavior: Behavior,
    /// The secret this agent dealt, encoded
    pub dealt_secret: String,
    /// Decision per subject
    pub decisions: BTreeMap<AgentId, Decision>,
    /// Reconstructed secrets per subject, encoded
    pub secrets: BTreeMap<AgentId, String>,
    /// Why no secret was recovered, per subject
    pub failures: BTreeMap<AgentId, Error>,
    /// Whether final shares were revealed
    pub revealed: bool,
    /// Whether the agent reached its convergence condition
    pub converged: bool,
    /// Messages taken from the inbox
    pub messages_processed: usize,
}

impl AgentReport {
    /// Decision about `subject`
    pub fn decision(&self, subject: AgentId) -> Decision {
        self.decisions.get(&subject).copied().unwrap_or_default()
    }

    /// Reconstructed secret of `subject`, encoded
    pub fn secret(&self, subject: AgentId) -> Option<&str> {
        self.secrets.get(&subject).map(String::as_str)
    }

    /// Failure recorded for `subject`
    pub fn failure(&self, subject: AgentId) -> Option<&Error> {
        self.failures.get(&subject)
    }

    /// Subjects left without a quorum decision
    pub fn undecided(&self) -> Vec<AgentId> {
        self.decisions
            .iter()
            .filter(|(_, decision)| !decision.is_decided())
            .map(|(subject, _)| *subject)
            .collect()
    }
}
