//! # VSS Core
//!
//! Asynchronous Feldman verifiable secret sharing among N agents.
//!
//! Every agent is at once a dealer of its own secret and a verifier of
//! everyone else's. Agents talk only through their mailboxes; a two-round
//! Byzantine quorum vote decides whether each dealer's shares are
//! consistent, and consistent secrets are reconstructed from revealed shares.
//!
//! ## Protocol Overview
//!
//! With `N >= 3f + 1` agents, at most `f` faulty, and quorum
//! `q = ceil((N + f + 1) / 2)` (which is 2f+1 when N = 3f+1):
//! - share-votes: q positive or f+1 negative trigger one commitment-vote
//! - commitment-votes: q matching latch the decision for a dealer
//! - reveal: once every dealer is decided, verified shares are broadcast
//!   and each valid secret is interpolated from `t` of them
//!
//! ## Example
//!
//! ```rust,ignore
//! use vss_core::{group::AdditiveModQ, ProtocolConfig, Simulation};
//!
//! let config = ProtocolConfig::new(10, 4, 3)?;
//! let report = Simulation::new(config, AdditiveModQ::new(17)?)?
//!     .with_secret(3, 11)?
//!     .run()
//!     .await?;
//! assert!(report.is_success());
//! ```

pub mod agent;
pub mod error;
pub mod group;
pub mod mailbox;
pub mod polynomial;
pub mod simulation;
pub mod types;

pub use agent::{Agent, AgentReport, Message};
pub use error::{Error, Result};
pub use polynomial::Polynomial;
pub use simulation::{Simulation, SimulationReport};
pub use types::{AgentId, Behavior, Decision, ProtocolConfig, Termination, Verdict};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of agents
pub const DEFAULT_AGENTS: usize = 10;

/// Default reconstruction threshold
pub const DEFAULT_THRESHOLD: usize = 4;

/// Default tolerated number of faulty agents
pub const DEFAULT_FAULTY: usize = 3;

/// Default modulus of the additive demonstration group
pub const DEFAULT_MODULUS: u64 = 17;
