//! Per-subject vote tallies and protocol state

use crate::group::Group;
use crate::polynomial::Commitments;
use crate::{AgentId, Decision, Error, Verdict};
use std::collections::BTreeSet;

/// Running counts for one voting round about one subject
///
/// Each voter is counted at most once, whatever it sends later.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    positive: usize,
    negative: usize,
    voters: BTreeSet<AgentId>,
}

impl VoteTally {
    /// Count a vote; returns false for a repeated voter
    pub fn record(&mut self, voter: AgentId, verdict: Verdict) -> bool {
        if !self.voters.insert(voter) {
            return false;
        }
        match verdict {
            Verdict::Valid => self.positive += 1,
            Verdict::Invalid => self.negative += 1,
        }
        true
    }

    /// Number of positive votes
    pub fn positive(&self) -> usize {
        self.positive
    }

    /// Number of negative votes
    pub fn negative(&self) -> usize {
        self.negative
    }
}

/// Everything one agent knows about one dealer
pub(crate) struct SubjectState<G: Group> {
    /// Dealer's commitment vector, once announced
    pub commitments: Option<Commitments<G>>,
    /// Share the dealer sent to this agent
    pub share: Option<G::Scalar>,
    /// Outcome of this agent's own Feldman check
    pub local_verdict: Option<Verdict>,
    /// First-round tally
    pub share_votes: VoteTally,
    /// Second-round tally
    pub commitment_votes: VoteTally,
    /// This agent's own commitment-vote, at most one per subject
    pub commitment_vote_cast: Option<Verdict>,
    /// Latched quorum decision
    pub decision: Decision,
    /// Whether this agent has broadcast its own share of the subject
    pub share_revealed: bool,
    /// Final reveals received, unverified until commitments are known
    pub reveals: Vec<(AgentId, G::Scalar)>,
    /// Senders whose reveal failed verification
    pub rejected: BTreeSet<AgentId>,
    /// Reconstructed secret
    pub secret: Option<G::Scalar>,
    /// Why reconstruction failed, if it did
    pub failure: Option<Error>,
}

impl<G: Group> SubjectState<G> {
    pub fn new() -> Self {
        Self {
            commitments: None,
            share: None,
            local_verdict: None,
            share_votes: VoteTally::default(),
            commitment_votes: VoteTally::default(),
            commitment_vote_cast: None,
            decision: Decision::Undecided,
            share_revealed: false,
            reveals: Vec::new(),
            rejected: BTreeSet::new(),
            secret: None,
            failure: None,
        }
    }

    /// Whether a share is waiting on its commitments
    pub fn verification_pending(&self) -> bool {
        self.share.is_some() && self.local_verdict.is_none() && self.commitments.is_some()
    }

    /// Write-once decision; returns false if already decided
    pub fn latch(&mut self, verdict: Verdict) -> bool {
        if self.decision.is_decided() {
            return false;
        }
        self.decision = verdict.into();
        true
    }

    /// Whether `sender` has already contributed a reveal
    pub fn has_reveal_from(&self, sender: AgentId) -> bool {
        self.rejected.contains(&sender) || self.reveals.iter().any(|(from, _)| *from == sender)
    }
}
