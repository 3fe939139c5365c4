//! Core types for the VSS protocol

use crate::group::Group;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for an agent in the network (1-based)
///
/// Doubles as the evaluation point `x` of every share the agent receives.
pub type AgentId = usize;

/// When an agent stops processing its inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Process whatever is queued, exit as soon as the inbox is empty.
    ///
    /// Agents that run ahead of their peers may exit before quorum is
    /// reached for every subject; those subjects stay undecided.
    DrainOnce,
    /// Keep waiting for messages until every subject is decided and every
    /// valid subject is reconstructed and the inbox has been idle for
    /// `quiescence`, or until `deadline` has elapsed since start.
    UntilConverged {
        deadline: Duration,
        quiescence: Duration,
    },
}

impl Default for Termination {
    fn default() -> Self {
        Termination::UntilConverged {
            deadline: Duration::from_secs(10),
            quiescence: Duration::from_millis(50),
        }
    }
}

/// Protocol parameters shared by every agent of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Number of agents (N)
    pub n_agents: usize,

    /// Reconstruction threshold (t)
    pub threshold: usize,

    /// Tolerated number of faulty agents (f)
    pub max_faulty: usize,

    /// Inbox termination policy
    pub termination: Termination,

    /// Per-agent mailbox capacity; derived from `n_agents` when `None`
    pub mailbox_capacity: Option<usize>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            n_agents: crate::DEFAULT_AGENTS,
            threshold: crate::DEFAULT_THRESHOLD,
            max_faulty: crate::DEFAULT_FAULTY,
            termination: Termination::default(),
            mailbox_capacity: None,
        }
    }
}

impl ProtocolConfig {
    /// Create and validate a new protocol configuration
    pub fn new(n_agents: usize, threshold: usize, max_faulty: usize) -> Result<Self> {
        let config = Self {
            n_agents,
            threshold,
            max_faulty,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the termination policy
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Override the derived mailbox capacity
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity);
        self
    }

    /// Check the Byzantine bound and threshold against the agent count
    pub fn validate(&self) -> Result<()> {
        if self.n_agents == 0 {
            return Err(Error::InvalidConfig("Need at least one agent".into()));
        }
        if self.threshold < 2 {
            return Err(Error::InvalidConfig(
                "Threshold must be at least 2".into(),
            ));
        }
        if self.n_agents < 3 * self.max_faulty + 1 {
            return Err(Error::InvalidConfig(format!(
                "{} agents cannot tolerate {} faulty (need at least {})",
                self.n_agents,
                self.max_faulty,
                3 * self.max_faulty + 1
            )));
        }
        if self.threshold > self.n_agents - self.max_faulty {
            return Err(Error::InvalidConfig(format!(
                "Threshold {} exceeds the {} honest agents",
                self.threshold,
                self.n_agents - self.max_faulty
            )));
        }
        if let Some(capacity) = self.mailbox_capacity {
            if capacity == 0 {
                return Err(Error::InvalidConfig(
                    "Mailbox capacity must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Validate, then check that the group's exponent field holds every
    /// evaluation point `1..=n_agents` as a distinct nonzero element
    pub fn validate_for<G: Group>(&self, group: &G) -> Result<()> {
        self.validate()?;
        if (self.n_agents as u128) > group.max_evaluation_point() as u128 {
            return Err(Error::InvalidConfig(format!(
                "Group {} cannot evaluate shares for {} agents",
                group.name(),
                self.n_agents
            )));
        }
        Ok(())
    }

    /// Positive share-votes needed before casting a positive commitment-vote,
    /// and commitment-votes needed to latch a decision either way
    ///
    /// `ceil((N + f + 1) / 2)`: any two quorums share at least `f + 1` voters,
    /// so at least one honest agent, and `N - f` honest agents can always
    /// form one. Equals `2f + 1` when `N = 3f + 1`.
    pub fn quorum(&self) -> usize {
        (self.n_agents + self.max_faulty + 2) / 2
    }

    /// Negative share-votes needed before casting a negative commitment-vote (f+1)
    pub fn dispute_threshold(&self) -> usize {
        self.max_faulty + 1
    }

    /// Number of polynomial coefficients each dealer draws (t-1)
    pub fn coefficient_count(&self) -> usize {
        self.threshold - 1
    }

    /// Worst-case number of messages a single agent receives in one run
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity.unwrap_or_else(|| {
            let n = self.n_agents;
            // commitments + shares + one share-vote, one commitment-vote and
            // one reveal per (peer, subject)
            3 * n * n + 2 * n
        })
    }

    /// All agent identities in the run
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> {
        1..=self.n_agents
    }
}

/// How an agent behaves during a simulated run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Follows the protocol
    #[default]
    Honest,
    /// Crashed from the start: deals nothing, processes nothing
    Silent,
    /// Sends an off-polynomial share to each listed victim
    TamperShares { victims: Vec<AgentId> },
}

impl Behavior {
    /// Whether this agent follows the protocol
    pub fn is_honest(&self) -> bool {
        matches!(self, Behavior::Honest)
    }
}

/// A vote or decision outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Invalid,
}

/// Per-subject validity decision, written at most once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[default]
    Undecided,
    Valid,
    Invalid,
}

impl Decision {
    /// Whether a quorum has latched this decision
    pub fn is_decided(&self) -> bool {
        !matches!(self, Decision::Undecided)
    }
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Valid => Decision::Valid,
            Verdict::Invalid => Decision::Invalid,
        }
    }
}
