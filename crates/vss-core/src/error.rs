//! Error types for VSS protocol operations

use crate::AgentId;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for VSS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during VSS protocol execution
///
/// Only configuration and transport errors abort an agent. Verification and
/// quorum problems are recorded per subject and end up in the agent's report.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Error {
    /// Invalid protocol configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A share did not match its dealer's commitments
    #[error("Share from dealer {dealer} does not match its commitments at agent {agent}")]
    VerificationMismatch { dealer: AgentId, agent: AgentId },

    /// Not enough validated shares to reconstruct a subject's secret
    #[error("Insufficient shares for subject {subject}: required {required}, got {actual}")]
    InsufficientShares {
        subject: AgentId,
        required: usize,
        actual: usize,
    },

    /// No quorum decision was reached before the agent stopped
    #[error("No quorum decision for subject {subject}")]
    Undecided { subject: AgentId },

    /// The network decided the subject's shares are invalid
    #[error("Subject {subject} was decided invalid")]
    SubjectInvalid { subject: AgentId },

    /// Two interpolation points share the same x coordinate
    #[error("Duplicate interpolation point x={0}")]
    DuplicatePoint(u64),

    /// Agent identity outside the roster
    #[error("Invalid agent ID: {0}")]
    InvalidAgentId(AgentId),

    /// Recipient mailbox is at capacity
    #[error("Mailbox of agent {agent} is full (capacity {capacity})")]
    MailboxFull { agent: AgentId, capacity: usize },

    /// Agent was started without a roster
    #[error("Peers not provided to agent {0}")]
    PeersNotProvided(AgentId),

    /// Agent was given a second, different roster
    #[error("Peers already provided to agent {0}")]
    PeersAlreadyProvided(AgentId),

    /// Group or field arithmetic failed
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
