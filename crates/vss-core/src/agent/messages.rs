//! Protocol message types

use crate::group::Group;
use crate::polynomial::Commitments;
use crate::{AgentId, Verdict};

/// A message exchanged between agents
///
/// Messages are immutable once sent; every recipient gets its own copy.
#[derive(Debug, Clone)]
pub enum Message<G: Group> {
    /// Dealer's commitment vector, broadcast once
    CommitmentAnnounce {
        /// Dealer that owns the polynomial
        dealer: AgentId,
        /// `power(G, a_k)` for every coefficient
        commitments: Commitments<G>,
    },

    /// Dealer's polynomial evaluated at the recipient's index, unicast
    PrivateShare {
        /// Dealer that evaluated the polynomial
        dealer: AgentId,
        /// P_dealer(recipient)
        share: G::Scalar,
    },

    /// First-round vote on a received share
    ShareVote {
        voter: AgentId,
        subject: AgentId,
        verdict: Verdict,
        /// The rejected share value, kept for auditing negative votes
        disputed: Option<G::Scalar>,
    },

    /// Second-round vote, cast once enough share-votes agree
    CommitmentVote {
        voter: AgentId,
        subject: AgentId,
        verdict: Verdict,
    },

    /// The sender's own verified share of a valid subject
    FinalReveal {
        sender: AgentId,
        subject: AgentId,
        share: G::Scalar,
    },
}

impl<G: Group> Message<G> {
    /// Agent that produced this message
    pub fn sender(&self) -> AgentId {
        match self {
            Message::CommitmentAnnounce { dealer, .. } => *dealer,
            Message::PrivateShare { dealer, .. } => *dealer,
            Message::ShareVote { voter, .. } => *voter,
            Message::CommitmentVote { voter, .. } => *voter,
            Message::FinalReveal { sender, .. } => *sender,
        }
    }

    /// Dealer this message is about
    pub fn subject(&self) -> AgentId {
        match self {
            Message::CommitmentAnnounce { dealer, .. } => *dealer,
            Message::PrivateShare { dealer, .. } => *dealer,
            Message::ShareVote { subject, .. } => *subject,
            Message::CommitmentVote { subject, .. } => *subject,
            Message::FinalReveal { subject, .. } => *subject,
        }
    }

    /// Message tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Message::CommitmentAnnounce { .. } => "commitment-announce",
            Message::PrivateShare { .. } => "private-share",
            Message::ShareVote { .. } => "share-vote",
            Message::CommitmentVote { .. } => "commitment-vote",
            Message::FinalReveal { .. } => "final-share-reveal",
        }
    }
}
