//! Simulation orchestrator
//!
//! Builds one [`Agent`] per identity, wires them into a full mesh through a
//! shared [`Roster`], runs every agent as its own tokio task and collects
//! their reports once all of them have finished.

use crate::agent::{Agent, AgentReport};
use crate::group::Group;
use crate::mailbox::Roster;
use crate::polynomial::Polynomial;
use crate::{AgentId, Behavior, Error, ProtocolConfig, Result};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A configured simulation run, not yet started
pub struct Simulation<G: Group> {
    config: ProtocolConfig,
    group: G,
    behaviors: BTreeMap<AgentId, Behavior>,
    secrets: BTreeMap<AgentId, G::Scalar>,
    seed: Option<u64>,
}

impl<G: Group> Simulation<G> {
    /// Validate `config` against `group` and start with all agents honest
    pub fn new(config: ProtocolConfig, group: G) -> Result<Self> {
        config.validate_for(&group)?;
        Ok(Self {
            config,
            group,
            behaviors: BTreeMap::new(),
            secrets: BTreeMap::new(),
            seed: None,
        })
    }

    /// Inject a fault into one agent
    pub fn with_behavior(mut self, agent: AgentId, behavior: Behavior) -> Result<Self> {
        self.check_agent(agent)?;
        if let Behavior::TamperShares { victims } = &behavior {
            for victim in victims {
                self.check_agent(*victim)?;
            }
        }
        self.behaviors.insert(agent, behavior);
        Ok(self)
    }

    /// Fix the secret `agent` deals
    pub fn with_secret(mut self, agent: AgentId, secret: G::Scalar) -> Result<Self> {
        self.check_agent(agent)?;
        self.secrets.insert(agent, secret);
        Ok(self)
    }

    /// Draw every polynomial from a seeded generator instead of the OS
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Protocol parameters of this run
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Run all agents concurrently and wait for every one of them
    #[instrument(skip(self), fields(run_id = tracing::field::Empty, group = self.group.name()))]
    pub async fn run(self) -> Result<SimulationReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();

        info!(
            %run_id,
            n_agents = self.config.n_agents,
            threshold = self.config.threshold,
            max_faulty = self.config.max_faulty,
            "Starting simulation"
        );

        let mut agents = Vec::with_capacity(self.config.n_agents);
        for id in self.config.agent_ids() {
            agents.push(self.build_agent(id)?);
        }

        let roster = Arc::new(Roster::new(
            agents.iter().map(|agent| agent.mailbox()).collect(),
        )?);
        for agent in &mut agents {
            agent.provide_peers(roster.clone())?;
        }

        let mut tasks = JoinSet::new();
        for agent in agents {
            tasks.spawn(agent.run());
        }

        let mut reports = Vec::with_capacity(self.config.n_agents);
        while let Some(joined) = tasks.join_next().await {
            let report = joined.map_err(|e| Error::Internal(format!("Agent task failed: {}", e)))??;
            reports.push(report);
        }
        reports.sort_by_key(|report| report.agent);

        let report = SimulationReport {
            run_id,
            group: self.group.name().to_string(),
            config: self.config,
            started_at,
            finished_at: Utc::now(),
            agents: reports,
        };

        if report.is_success() {
            info!(%run_id, "Every honest agent recovered every honest secret");
        } else {
            warn!(
                %run_id,
                failures = report.failures().len(),
                "Simulation finished with unrecovered secrets"
            );
        }

        Ok(report)
    }

    fn build_agent(&self, id: AgentId) -> Result<Agent<G>> {
        let mut rng = match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => ChaCha20Rng::from_rng(OsRng).map_err(|e| Error::Crypto(e.to_string()))?,
        };

        let mut agent = Agent::new(id, self.config.clone(), self.group.clone(), &mut rng)?;
        if let Some(secret) = self.secrets.get(&id) {
            let polynomial = Polynomial::with_secret(
                &self.group,
                *secret,
                self.config.coefficient_count(),
                &mut rng,
            );
            agent = agent.with_polynomial(polynomial)?;
        }
        if let Some(behavior) = self.behaviors.get(&id) {
            agent = agent.with_behavior(behavior.clone());
        }
        debug!(agent = agent.id(), behavior = ?agent.behavior(), "Agent built");

        Ok(agent)
    }

    fn check_agent(&self, id: AgentId) -> Result<()> {
        if id == 0 || id > self.config.n_agents {
            return Err(Error::InvalidAgentId(id));
        }
        Ok(())
    }
}

/// Outcome of a whole simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Commitment group used
    pub group: String,
    /// Protocol parameters
    pub config: ProtocolConfig,
    /// When agents were built
    pub started_at: DateTime<Utc>,
    /// When the last agent finished
    pub finished_at: DateTime<Utc>,
    /// One report per agent, ordered by id
    pub agents: Vec<AgentReport>,
}

impl SimulationReport {
    /// Report of a single agent
    pub fn agent(&self, id: AgentId) -> Option<&AgentReport> {
        self.agents.iter().find(|report| report.agent == id)
    }

    fn honest(&self) -> impl Iterator<Item = &AgentReport> {
        self.agents.iter().filter(|report| report.behavior.is_honest())
    }

    /// Every honest agent recovered exactly the secret of every honest dealer
    pub fn is_success(&self) -> bool {
        self.honest().all(|verifier| {
            self.honest()
                .all(|dealer| verifier.secret(dealer.agent) == Some(dealer.dealt_secret.as_str()))
        })
    }

    /// No two honest agents latched different decisions about one subject
    pub fn agreement(&self) -> bool {
        let mut seen = BTreeMap::new();
        for report in self.honest() {
            for (subject, decision) in &report.decisions {
                if !decision.is_decided() {
                    continue;
                }
                if *seen.entry(*subject).or_insert(*decision) != *decision {
                    return false;
                }
            }
        }
        true
    }

    /// `(agent, subject, error)` for every honest agent that missed an
    /// honest dealer's secret
    pub fn failures(&self) -> Vec<(AgentId, AgentId, &Error)> {
        let honest_dealers: Vec<AgentId> = self.honest().map(|report| report.agent).collect();
        let honest_dealers = &honest_dealers;
        self.honest()
            .flat_map(move |report| {
                report
                    .failures
                    .iter()
                    .filter(move |(subject, _)| honest_dealers.contains(subject))
                    .map(move |(subject, error)| (report.agent, *subject, error))
            })
            .collect()
    }

    /// Pretty-printed JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{AdditiveModQ, SchnorrGroup, Secp256k1};
    use crate::{Decision, Termination};
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn short_deadline() -> Termination {
        Termination::UntilConverged {
            deadline: Duration::from_millis(300),
            quiescence: Duration::from_millis(20),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_honest_recovers_fixed_secret() {
        init_tracing();
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(ProtocolConfig::default(), group)
            .unwrap()
            .with_secret(3, 11)
            .unwrap()
            .with_seed(7)
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert!(report.agreement());
        assert_eq!(report.agents.len(), 10);
        for agent in &report.agents {
            assert!(agent.converged);
            assert!(agent.revealed);
            assert_eq!(agent.decision(3), Decision::Valid);
            assert_eq!(agent.secret(3), Some("11"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_honest_schnorr() {
        let group = SchnorrGroup::default();
        let report = Simulation::new(ProtocolConfig::default(), group)
            .unwrap()
            .with_secret(1, 123_456_789)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert_eq!(report.agent(5).unwrap().secret(1), Some("123456789"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_honest_secp256k1() {
        let config = ProtocolConfig::new(4, 3, 1).unwrap();
        let report = Simulation::new(config, Secp256k1)
            .unwrap()
            .with_seed(1)
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert_eq!(report.group, "secp256k1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_tampered_share_is_outvoted() {
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(ProtocolConfig::default(), group)
            .unwrap()
            .with_behavior(2, Behavior::TamperShares { victims: vec![5] })
            .unwrap()
            .with_seed(3)
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert!(report.agreement());

        // the victim rejected its own share yet still recovers from reveals
        let victim = report.agent(5).unwrap();
        assert_eq!(victim.decision(2), Decision::Valid);
        assert_eq!(victim.secret(2), Some(report.agent(2).unwrap().dealt_secret.as_str()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_widespread_tampering_is_invalid() {
        init_tracing();
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(ProtocolConfig::default(), group)
            .unwrap()
            .with_behavior(
                4,
                Behavior::TamperShares {
                    victims: vec![1, 2, 3, 6],
                },
            )
            .unwrap()
            .with_seed(5)
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert!(report.agreement());
        for agent in report.agents.iter().filter(|a| a.agent != 4) {
            assert_eq!(agent.decision(4), Decision::Invalid);
            assert_eq!(agent.failure(4), Some(&Error::SubjectInvalid { subject: 4 }));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_silent_dealer_leaves_subject_undecided() {
        init_tracing();
        let config = ProtocolConfig::new(4, 2, 1)
            .unwrap()
            .with_termination(short_deadline());
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(config, group)
            .unwrap()
            .with_behavior(4, Behavior::Silent)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(!report.is_success());
        assert!(report.agreement());

        let silent = report.agent(4).unwrap();
        assert_eq!(silent.messages_processed, 0);

        for agent in report.agents.iter().filter(|a| a.agent != 4) {
            assert!(!agent.converged);
            assert!(!agent.revealed);
            for subject in 1..=3 {
                assert_eq!(agent.decision(subject), Decision::Valid);
            }
            assert_eq!(agent.undecided(), vec![4]);
            assert_eq!(agent.failure(4), Some(&Error::Undecided { subject: 4 }));
        }
        assert!(!report.failures().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_fault_tolerance_boundary() {
        // f = 0: the quorum is a strict majority, here both agents
        let config = ProtocolConfig::new(2, 2, 0).unwrap();
        let group = AdditiveModQ::new(5).unwrap();
        let report = Simulation::new(config, group)
            .unwrap()
            .with_secret(1, 4)
            .unwrap()
            .with_secret(2, 0)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert_eq!(report.agent(2).unwrap().secret(1), Some("4"));
        assert_eq!(report.agent(1).unwrap().secret(2), Some("0"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_more_agents_than_the_byzantine_bound_needs() {
        // N = 10 > 3f + 1 = 7: quorum 7 is still reachable by the honest agents
        let config = ProtocolConfig::new(10, 4, 2).unwrap();
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(config, group)
            .unwrap()
            .with_seed(5)
            .run()
            .await
            .unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures());
        assert!(report.agreement());
        for agent in &report.agents {
            assert_eq!(agent.secrets.len(), 10);
        }
    }

    #[tokio::test]
    async fn test_drain_once_can_exit_undecided() {
        // single-threaded: each agent drains its inbox before the next starts
        let config = ProtocolConfig::default().with_termination(Termination::DrainOnce);
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(config, group)
            .unwrap()
            .with_seed(11)
            .run()
            .await
            .unwrap();

        assert!(!report.is_success());
        assert!(report.agreement());
        assert!(report.agents.iter().any(|a| a.undecided().len() == 10));
    }

    #[test]
    fn test_rejects_inconsistent_setup() {
        let group = AdditiveModQ::new(7).unwrap();
        // 10 evaluation points do not fit in Z_7
        assert!(Simulation::new(ProtocolConfig::default(), group).is_err());

        let group = AdditiveModQ::new(17).unwrap();
        let simulation = Simulation::new(ProtocolConfig::default(), group).unwrap();
        assert!(matches!(
            simulation.with_behavior(11, Behavior::Silent),
            Err(Error::InvalidAgentId(11))
        ));

        let simulation = Simulation::new(ProtocolConfig::default(), group).unwrap();
        assert!(matches!(
            simulation.with_behavior(1, Behavior::TamperShares { victims: vec![0] }),
            Err(Error::InvalidAgentId(0))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_report_serializes() {
        let config = ProtocolConfig::new(4, 2, 1).unwrap();
        let group = AdditiveModQ::new(17).unwrap();
        let report = Simulation::new(config, group)
            .unwrap()
            .with_seed(2)
            .run()
            .await
            .unwrap();

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["group"], "additive-mod-q");
        assert_eq!(value["agents"].as_array().unwrap().len(), 4);
        assert_eq!(value["config"]["n_agents"], 4);
    }
}
