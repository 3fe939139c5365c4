//! Agent state machine: deal, verify, vote, decide, reveal, reconstruct

use super::tally::SubjectState;
use super::{AgentReport, Message};
use crate::group::Group;
use crate::mailbox::{Mailbox, MemoryMailbox, Roster};
use crate::polynomial::{reconstruct_secret, verify_share, Polynomial};
use crate::{AgentId, Behavior, Decision, Error, ProtocolConfig, Result, Termination, Verdict};
use rand_core::RngCore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// One participant: a dealer of its own secret and a verifier of everyone's
pub struct Agent<G: Group> {
    /// This agent's identity and evaluation point
    id: AgentId,
    /// Protocol parameters
    config: ProtocolConfig,
    /// Commitment group
    group: G,
    /// Honest or injected fault
    behavior: Behavior,
    /// Private polynomial, never sent
    polynomial: Polynomial<G>,
    /// Own inbox
    mailbox: Arc<dyn Mailbox<Message<G>>>,
    /// Network roster, set once before `run`
    roster: Option<Arc<Roster<Message<G>>>>,
    /// Per-dealer state, indexed by `dealer - 1`
    subjects: Vec<SubjectState<G>>,
    /// Whether final shares have been revealed
    revealed: bool,
    /// Messages taken from the inbox
    messages_processed: usize,
}

impl<G: Group> Agent<G> {
    /// Create an agent and draw its polynomial
    ///
    /// # Arguments
    /// * `id` - 1-based identity, at most `config.n_agents`
    /// * `config` - Protocol parameters, validated against `group`
    /// * `group` - Commitment group
    /// * `rng` - Source for the polynomial coefficients
    pub fn new<R: RngCore>(
        id: AgentId,
        config: ProtocolConfig,
        group: G,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate_for(&group)?;
        if id == 0 || id > config.n_agents {
            return Err(Error::InvalidAgentId(id));
        }

        let polynomial = Polynomial::random(&group, config.coefficient_count(), rng);
        let mailbox: Arc<dyn Mailbox<Message<G>>> =
            Arc::new(MemoryMailbox::new(id, config.mailbox_capacity()));
        let subjects = config.agent_ids().map(|_| SubjectState::new()).collect();

        Ok(Self {
            id,
            config,
            group,
            behavior: Behavior::Honest,
            polynomial,
            mailbox,
            roster: None,
            subjects,
            revealed: false,
            messages_processed: 0,
        })
    }

    /// Replace the drawn polynomial, e.g. to fix the dealt secret
    pub fn with_polynomial(mut self, polynomial: Polynomial<G>) -> Result<Self> {
        if polynomial.len() != self.config.coefficient_count() {
            return Err(Error::InvalidConfig(format!(
                "Polynomial has {} coefficients, expected {}",
                polynomial.len(),
                self.config.coefficient_count()
            )));
        }
        self.polynomial = polynomial;
        Ok(self)
    }

    /// Set the agent's behavior
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Use a different inbox implementation
    pub fn with_mailbox(mut self, mailbox: Arc<dyn Mailbox<Message<G>>>) -> Result<Self> {
        if mailbox.owner() != self.id {
            return Err(Error::InvalidAgentId(mailbox.owner()));
        }
        self.mailbox = mailbox;
        Ok(self)
    }

    /// This agent's identity
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// This agent's behavior
    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// The secret this agent deals
    pub fn dealt_secret(&self) -> G::Scalar {
        self.polynomial.secret()
    }

    /// Handle to this agent's inbox, for building the roster
    pub fn mailbox(&self) -> Arc<dyn Mailbox<Message<G>>> {
        self.mailbox.clone()
    }

    /// Attach the network roster
    ///
    /// Providing the same roster again is a no-op; a different one is rejected.
    pub fn provide_peers(&mut self, roster: Arc<Roster<Message<G>>>) -> Result<()> {
        if let Some(existing) = &self.roster {
            if Arc::ptr_eq(existing, &roster) {
                return Ok(());
            }
            return Err(Error::PeersAlreadyProvided(self.id));
        }
        if roster.len() != self.config.n_agents {
            return Err(Error::InvalidConfig(format!(
                "Roster has {} agents, expected {}",
                roster.len(),
                self.config.n_agents
            )));
        }
        self.roster = Some(roster);
        Ok(())
    }

    /// Run the dealer and verifier roles to completion
    ///
    /// Returns the agent's report; only transport and setup errors are
    /// returned as `Err`. Per-subject failures are listed in the report.
    #[instrument(skip(self), fields(agent = self.id))]
    pub async fn run(mut self) -> Result<AgentReport> {
        let roster = self
            .roster
            .clone()
            .ok_or(Error::PeersNotProvided(self.id))?;

        if self.behavior == Behavior::Silent {
            info!(agent = self.id, "Agent is silent, skipping protocol");
            return Ok(self.report(false));
        }

        info!(
            agent = self.id,
            n_agents = self.config.n_agents,
            threshold = self.config.threshold,
            max_faulty = self.config.max_faulty,
            "Starting agent"
        );

        self.deal(&roster)?;

        let converged = match self.config.termination {
            Termination::DrainOnce => {
                while let Some(message) = self.mailbox.try_dequeue() {
                    self.handle(&roster, message)?;
                }
                self.is_converged()
            }
            Termination::UntilConverged {
                deadline,
                quiescence,
            } => {
                self.process_until_converged(&roster, deadline, quiescence)
                    .await?
            }
        };

        let report = self.report(converged);
        for (subject, error) in &report.failures {
            warn!(agent = self.id, subject, %error, "No secret recovered");
        }
        info!(
            agent = self.id,
            recovered = report.secrets.len(),
            converged,
            messages = self.messages_processed,
            "Agent finished"
        );

        Ok(report)
    }

    /// Commit, broadcast commitments, and unicast one share per agent
    fn deal(&mut self, roster: &Roster<Message<G>>) -> Result<()> {
        let commitments = self.polynomial.commit(&self.group);
        debug!(
            agent = self.id,
            coefficients = commitments.len(),
            secret_commitment = %commitments
                .first()
                .map(|c| self.group.encode_element(c))
                .unwrap_or_default(),
            "Dealing shares"
        );

        self.subjects[self.id - 1].commitments = Some(commitments.clone());
        roster.broadcast(
            self.id,
            &Message::CommitmentAnnounce {
                dealer: self.id,
                commitments,
            },
        )?;

        for recipient in roster.ids() {
            let mut share = self.polynomial.evaluate(&self.group, recipient as u64);
            if let Behavior::TamperShares { victims } = &self.behavior {
                if victims.contains(&recipient) {
                    debug!(agent = self.id, recipient, "Tampering with share");
                    share = self.group.scalar_add(&share, &self.group.scalar_one());
                }
            }
            roster.send(
                recipient,
                Message::PrivateShare {
                    dealer: self.id,
                    share,
                },
            )?;
        }

        Ok(())
    }

    async fn process_until_converged(
        &mut self,
        roster: &Roster<Message<G>>,
        deadline: Duration,
        quiescence: Duration,
    ) -> Result<bool> {
        let started = Instant::now();
        let mailbox = self.mailbox.clone();

        loop {
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!(agent = self.id, "Deadline reached before convergence");
                return Ok(self.is_converged());
            }

            let wait = if self.is_converged() {
                quiescence.min(remaining)
            } else {
                remaining
            };

            match mailbox.dequeue_timeout(wait).await {
                Some(message) => self.handle(roster, message)?,
                None if self.is_converged() => return Ok(true),
                None => {}
            }
        }
    }

    fn handle(&mut self, roster: &Roster<Message<G>>, message: Message<G>) -> Result<()> {
        self.messages_processed += 1;

        let (sender, subject) = (message.sender(), message.subject());
        if !self.is_known(sender) || !self.is_known(subject) {
            warn!(
                agent = self.id,
                sender,
                subject,
                kind = message.kind(),
                "Dropping message naming an unknown agent"
            );
            return Ok(());
        }
        debug!(agent = self.id, sender, subject, kind = message.kind(), "Handling message");

        match message {
            Message::CommitmentAnnounce {
                dealer,
                commitments,
            } => {
                let state = self.state(dealer);
                if state.commitments.is_some() {
                    debug!(agent = self.id, dealer, "Ignoring repeated commitments");
                    return Ok(());
                }
                state.commitments = Some(commitments);
                if state.verification_pending() {
                    self.verify_and_vote(roster, dealer)?;
                }
                self.try_reconstruct(dealer);
                Ok(())
            }
            Message::PrivateShare { dealer, share } => {
                let state = self.state(dealer);
                if state.share.is_some() {
                    debug!(agent = self.id, dealer, "Ignoring repeated share");
                    return Ok(());
                }
                state.share = Some(share);
                if state.verification_pending() {
                    self.verify_and_vote(roster, dealer)
                } else {
                    debug!(
                        agent = self.id,
                        dealer,
                        "Deferring verification until commitments arrive"
                    );
                    Ok(())
                }
            }
            Message::ShareVote {
                voter,
                subject,
                verdict,
                disputed,
            } => {
                if let Some(value) = disputed {
                    debug!(
                        agent = self.id,
                        voter,
                        subject,
                        disputed = %self.group.encode_scalar(&value),
                        "Share disputed"
                    );
                }
                if !self.state(subject).share_votes.record(voter, verdict) {
                    return Ok(());
                }
                self.check_share_thresholds(roster, subject)
            }
            Message::CommitmentVote {
                voter,
                subject,
                verdict,
            } => {
                if !self.state(subject).commitment_votes.record(voter, verdict) {
                    return Ok(());
                }
                self.check_commitment_thresholds(roster, subject)
            }
            Message::FinalReveal {
                sender,
                subject,
                share,
            } => {
                let state = self.state(subject);
                if state.secret.is_some() || state.has_reveal_from(sender) {
                    return Ok(());
                }
                state.reveals.push((sender, share));
                self.try_reconstruct(subject);
                Ok(())
            }
        }
    }

    /// Feldman-check the stored share and broadcast the resulting share-vote
    fn verify_and_vote(&mut self, roster: &Roster<Message<G>>, dealer: AgentId) -> Result<()> {
        let state = &self.subjects[dealer - 1];
        let (Some(commitments), Some(share)) = (&state.commitments, state.share) else {
            return Ok(());
        };

        let verdict = if verify_share(&self.group, commitments, self.id as u64, &share) {
            Verdict::Valid
        } else {
            let error = Error::VerificationMismatch {
                dealer,
                agent: self.id,
            };
            warn!(agent = self.id, dealer, %error, "Local share verification failed");
            Verdict::Invalid
        };

        let state = &mut self.subjects[dealer - 1];
        state.local_verdict = Some(verdict);
        state.share_votes.record(self.id, verdict);

        roster.broadcast(
            self.id,
            &Message::ShareVote {
                voter: self.id,
                subject: dealer,
                verdict,
                disputed: (verdict == Verdict::Invalid).then_some(share),
            },
        )?;

        self.check_share_thresholds(roster, dealer)?;
        self.maybe_reveal(roster)
    }

    /// First round: a quorum of positive or f+1 negative share-votes trigger this
    /// agent's single commitment-vote
    fn check_share_thresholds(
        &mut self,
        roster: &Roster<Message<G>>,
        subject: AgentId,
    ) -> Result<()> {
        let quorum = self.config.quorum();
        let dispute = self.config.dispute_threshold();
        let state = self.state(subject);

        if state.commitment_vote_cast.is_some() {
            return Ok(());
        }
        let verdict = if state.share_votes.positive() >= quorum {
            Verdict::Valid
        } else if state.share_votes.negative() >= dispute {
            Verdict::Invalid
        } else {
            return Ok(());
        };

        self.cast_commitment_vote(roster, subject, verdict)
    }

    fn cast_commitment_vote(
        &mut self,
        roster: &Roster<Message<G>>,
        subject: AgentId,
        verdict: Verdict,
    ) -> Result<()> {
        let id = self.id;
        let state = self.state(subject);
        state.commitment_vote_cast = Some(verdict);
        state.commitment_votes.record(id, verdict);

        debug!(agent = id, subject, ?verdict, "Casting commitment-vote");
        roster.broadcast(
            id,
            &Message::CommitmentVote {
                voter: id,
                subject,
                verdict,
            },
        )?;

        self.check_commitment_thresholds(roster, subject)
    }

    /// Second round: a quorum of matching commitment-votes latch the decision
    fn check_commitment_thresholds(
        &mut self,
        roster: &Roster<Message<G>>,
        subject: AgentId,
    ) -> Result<()> {
        let quorum = self.config.quorum();
        let id = self.id;
        let state = self.state(subject);

        if !state.decision.is_decided() {
            let verdict = if state.commitment_votes.positive() >= quorum {
                Some(Verdict::Valid)
            } else if state.commitment_votes.negative() >= quorum {
                Some(Verdict::Invalid)
            } else {
                None
            };

            if let Some(verdict) = verdict {
                state.latch(verdict);
                info!(agent = id, subject, ?verdict, "Decision latched");

                if state.commitment_vote_cast.is_none() {
                    self.cast_commitment_vote(roster, subject, verdict)?;
                }
                self.try_reconstruct(subject);
            }
        }

        self.maybe_reveal(roster)
    }

    /// Once every subject is decided and more than f are valid, reveal this
    /// agent's verified share of each valid subject
    ///
    /// After the round opens, shares verified late are revealed as they come.
    fn maybe_reveal(&mut self, roster: &Roster<Message<G>>) -> Result<()> {
        if !self.revealed {
            if self.subjects.iter().any(|s| !s.decision.is_decided()) {
                return Ok(());
            }
            let valid = self.valid_subjects().len();
            if valid <= self.config.max_faulty {
                debug!(agent = self.id, valid, "Too few valid subjects to reveal");
                return Ok(());
            }
            self.revealed = true;
            info!(agent = self.id, valid, "Revealing final shares");
        }

        let id = self.id;
        for subject in self.valid_subjects() {
            let state = &mut self.subjects[subject - 1];
            if state.share_revealed {
                continue;
            }
            let share = match (state.share, state.local_verdict) {
                (Some(share), Some(Verdict::Valid)) => share,
                _ => continue,
            };
            state.share_revealed = true;
            if !state.has_reveal_from(id) {
                state.reveals.push((id, share));
            }

            roster.broadcast(
                id,
                &Message::FinalReveal {
                    sender: id,
                    subject,
                    share,
                },
            )?;
            self.try_reconstruct(subject);
        }

        Ok(())
    }

    /// Interpolate a valid subject's secret once `t` verified reveals are in
    fn try_reconstruct(&mut self, subject: AgentId) {
        let id = self.id;
        let threshold = self.config.threshold;
        let group = &self.group;
        let SubjectState {
            commitments,
            decision,
            reveals,
            rejected,
            secret,
            failure,
            ..
        } = &mut self.subjects[subject - 1];

        if secret.is_some() || *decision != Decision::Valid {
            return;
        }
        let Some(commitments) = commitments.as_ref() else {
            return;
        };

        reveals.retain(|(sender, share)| {
            let ok = verify_share(group, commitments, *sender as u64, share);
            if !ok {
                warn!(
                    agent = id,
                    subject,
                    sender = *sender,
                    "Rejecting reveal that does not match commitments"
                );
                rejected.insert(*sender);
            }
            ok
        });
        if reveals.len() < threshold {
            return;
        }

        let points: Vec<(u64, G::Scalar)> = reveals
            .iter()
            .map(|(sender, share)| (*sender as u64, *share))
            .collect();
        match reconstruct_secret(group, subject, &points, threshold) {
            Ok(value) => {
                if commitments.first() != Some(&group.power(&group.generator(), &value)) {
                    let error = Error::Crypto(format!(
                        "Reconstructed secret of {} does not match its commitment",
                        subject
                    ));
                    warn!(agent = id, subject, %error, "Reconstruction check failed");
                    *failure = Some(error);
                    return;
                }
                info!(
                    agent = id,
                    subject,
                    secret = %group.encode_scalar(&value),
                    "Secret reconstructed"
                );
                *secret = Some(value);
                *failure = None;
            }
            Err(error) => {
                warn!(agent = id, subject, %error, "Reconstruction failed");
                *failure = Some(error);
            }
        }
    }

    /// Every subject decided, and every valid subject resolved when a
    /// reveal round applies
    fn is_converged(&self) -> bool {
        if self.subjects.iter().any(|s| !s.decision.is_decided()) {
            return false;
        }
        if self.valid_subjects().len() <= self.config.max_faulty {
            return true;
        }
        self.subjects
            .iter()
            .filter(|s| s.decision == Decision::Valid)
            .all(|s| s.secret.is_some() || s.failure.is_some())
    }

    fn valid_subjects(&self) -> Vec<AgentId> {
        self.subjects
            .iter()
            .enumerate()
            .filter(|(_, s)| s.decision == Decision::Valid)
            .map(|(index, _)| index + 1)
            .collect()
    }

    fn is_known(&self, id: AgentId) -> bool {
        (1..=self.subjects.len()).contains(&id)
    }

    fn state(&mut self, subject: AgentId) -> &mut SubjectState<G> {
        &mut self.subjects[subject - 1]
    }

    fn report(&self, converged: bool) -> AgentReport {
        let mut decisions = BTreeMap::new();
        let mut secrets = BTreeMap::new();
        let mut failures = BTreeMap::new();

        for (index, state) in self.subjects.iter().enumerate() {
            let subject = index + 1;
            decisions.insert(subject, state.decision);

            if let Some(secret) = &state.secret {
                secrets.insert(subject, self.group.encode_scalar(secret));
                continue;
            }
            let error = match state.decision {
                Decision::Undecided => Error::Undecided { subject },
                Decision::Invalid => Error::SubjectInvalid { subject },
                Decision::Valid => state.failure.clone().unwrap_or(Error::InsufficientShares {
                    subject,
                    required: self.config.threshold,
                    actual: state.reveals.len(),
                }),
            };
            failures.insert(subject, error);
        }

        AgentReport {
            agent: self.id,
            behavior: self.behavior.clone(),
            dealt_secret: self.group.encode_scalar(&self.polynomial.secret()),
            decisions,
            secrets,
            failures,
            revealed: self.revealed,
            converged,
            messages_processed: self.messages_processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::AdditiveModQ;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type Net = Arc<Roster<Message<AdditiveModQ>>>;

    fn network(config: &ProtocolConfig) -> (Vec<Agent<AdditiveModQ>>, Net) {
        let group = AdditiveModQ::new(17).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut agents: Vec<_> = config
            .agent_ids()
            .map(|id| Agent::new(id, config.clone(), group, &mut rng).unwrap())
            .collect();
        let roster = Arc::new(Roster::new(agents.iter().map(|a| a.mailbox()).collect()).unwrap());
        for agent in &mut agents {
            agent.provide_peers(roster.clone()).unwrap();
        }
        (agents, roster)
    }

    fn feed(agent: &mut Agent<AdditiveModQ>, roster: &Net, messages: Vec<Message<AdditiveModQ>>) {
        for message in messages {
            agent.handle(roster, message).unwrap();
        }
    }

    fn commitment_votes(subjects: &[AgentId], voters: &[AgentId]) -> Vec<Message<AdditiveModQ>> {
        subjects
            .iter()
            .flat_map(|&subject| {
                voters.iter().map(move |&voter| Message::CommitmentVote {
                    voter,
                    subject,
                    verdict: Verdict::Valid,
                })
            })
            .collect()
    }

    /// Agent 1 verifies dealer 3's share, rejects a forged reveal from
    /// agent 2, and sees every subject decided Valid
    fn observer_of_dealer_three() -> (Agent<AdditiveModQ>, Agent<AdditiveModQ>, Net) {
        let config = ProtocolConfig::new(4, 3, 1).unwrap();
        let (mut agents, roster) = network(&config);
        let group = AdditiveModQ::new(17).unwrap();
        let dealer = agents.remove(2);
        let mut observer = agents.remove(0);

        let share_of = |x: u64| dealer.polynomial.evaluate(&group, x);
        let mut messages = vec![
            Message::CommitmentAnnounce {
                dealer: 3,
                commitments: dealer.polynomial.commit(&group),
            },
            Message::PrivateShare {
                dealer: 3,
                share: share_of(1),
            },
            Message::FinalReveal {
                sender: 2,
                subject: 3,
                share: group.scalar_add(&share_of(2), &1),
            },
        ];
        messages.extend(commitment_votes(&[1, 2, 3, 4], &[2, 3, 4]));
        feed(&mut observer, &roster, messages);

        (observer, dealer, roster)
    }

    #[test]
    fn test_thresholds_fire_once_per_subject() {
        let config = ProtocolConfig::new(4, 2, 1).unwrap();
        let (mut agents, roster) = network(&config);
        let mut agent = agents.remove(0);

        // P(x) = 5: one coefficient when t = 2
        let mut messages = vec![
            Message::CommitmentAnnounce {
                dealer: 2,
                commitments: vec![5],
            },
            Message::PrivateShare {
                dealer: 2,
                share: 5,
            },
        ];
        for voter in [2, 3, 4, 3, 4] {
            messages.push(Message::ShareVote {
                voter,
                subject: 2,
                verdict: Verdict::Valid,
                disputed: None,
            });
        }
        // every subject latches at the third vote; the repeat round is past it
        messages.extend(commitment_votes(&[1, 2, 3, 4], &[2, 3, 4]));
        messages.extend(commitment_votes(&[1, 2, 3, 4], &[2, 3, 4]));
        messages.push(Message::FinalReveal {
            sender: 3,
            subject: 2,
            share: 5,
        });
        feed(&mut agent, &roster, messages);

        assert!(agent.revealed);
        assert_eq!(agent.subjects[1].secret, Some(5));
        for state in &agent.subjects {
            assert_eq!(state.decision, Decision::Valid);
        }

        let mut commitment_votes = BTreeMap::new();
        let mut reveals = BTreeMap::new();
        while let Some(message) = agents[0].mailbox().try_dequeue() {
            match message {
                Message::CommitmentVote {
                    voter: 1, subject, ..
                } => *commitment_votes.entry(subject).or_insert(0) += 1,
                Message::FinalReveal {
                    sender: 1, subject, ..
                } => *reveals.entry(subject).or_insert(0) += 1,
                _ => {}
            }
        }
        assert_eq!(commitment_votes, BTreeMap::from([(1, 1), (2, 1), (3, 1), (4, 1)]));
        // agent 1 holds a verified share of subject 2 only
        assert_eq!(reveals, BTreeMap::from([(2, 1)]));
    }

    #[test]
    fn test_reveals_are_verified_before_reconstruction() {
        let (mut observer, dealer, roster) = observer_of_dealer_three();
        let group = AdditiveModQ::new(17).unwrap();
        let share_of = |x: u64| dealer.polynomial.evaluate(&group, x);

        let state = &observer.subjects[2];
        assert!(observer.revealed);
        assert!(state.rejected.contains(&2));
        assert!(!state.reveals.iter().any(|(sender, _)| *sender == 2));
        assert_eq!(state.reveals.len(), 1);

        // a rejected sender cannot try again with the right share
        feed(
            &mut observer,
            &roster,
            vec![
                Message::FinalReveal {
                    sender: 4,
                    subject: 3,
                    share: share_of(4),
                },
                Message::FinalReveal {
                    sender: 2,
                    subject: 3,
                    share: share_of(2),
                },
            ],
        );
        assert_eq!(observer.subjects[2].reveals.len(), 2);
        assert_eq!(observer.subjects[2].secret, None);

        feed(
            &mut observer,
            &roster,
            vec![Message::FinalReveal {
                sender: 3,
                subject: 3,
                share: share_of(3),
            }],
        );
        assert_eq!(observer.subjects[2].secret, Some(dealer.dealt_secret()));
        assert_eq!(observer.subjects[2].failure, None);
    }

    #[test]
    fn test_reveals_after_reconstruction_are_ignored() {
        let (mut observer, dealer, roster) = observer_of_dealer_three();
        let group = AdditiveModQ::new(17).unwrap();
        let share_of = |x: u64| dealer.polynomial.evaluate(&group, x);

        let honest = [4, 3].map(|sender| Message::FinalReveal {
            sender,
            subject: 3,
            share: share_of(sender as u64),
        });
        feed(&mut observer, &roster, honest.to_vec());
        let secret = observer.subjects[2].secret;
        assert_eq!(secret, Some(dealer.dealt_secret()));

        feed(
            &mut observer,
            &roster,
            vec![
                Message::FinalReveal {
                    sender: 4,
                    subject: 3,
                    share: group.scalar_add(&share_of(4), &1),
                },
                Message::FinalReveal {
                    sender: 3,
                    subject: 3,
                    share: 0,
                },
            ],
        );
        assert_eq!(observer.subjects[2].secret, secret);
        assert_eq!(observer.subjects[2].reveals.len(), 3);

        let report = observer.report(true);
        let encoded = group.encode_scalar(&dealer.dealt_secret());
        assert_eq!(report.secret(3), Some(encoded.as_str()));
    }
}
