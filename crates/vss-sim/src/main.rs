//! VSS Simulation CLI
//!
//! Command-line interface for the asynchronous VSS agent simulation:
//! - Run N agents with optional injected faults
//! - Check a configuration and show its derived thresholds

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};
use vss_core::group::{AdditiveModQ, Group, SchnorrGroup, Secp256k1};
use vss_core::{AgentId, Behavior, ProtocolConfig, Simulation, SimulationReport, Termination};

/// VSS Sim - asynchronous verifiable secret sharing agents
#[derive(Parser)]
#[command(name = "vss-sim")]
#[command(about = "Asynchronous Feldman VSS with Byzantine quorum voting")]
#[command(version)]
struct Cli {
    /// Number of agents (N)
    #[arg(short = 'n', long, env = "VSS_AGENTS", default_value_t = vss_core::DEFAULT_AGENTS)]
    agents: usize,

    /// Reconstruction threshold (t)
    #[arg(short, long, env = "VSS_THRESHOLD", default_value_t = vss_core::DEFAULT_THRESHOLD)]
    threshold: usize,

    /// Tolerated faulty agents (f)
    #[arg(short, long, env = "VSS_FAULTY", default_value_t = vss_core::DEFAULT_FAULTY)]
    faulty: usize,

    /// Commitment group
    #[arg(short, long, env = "VSS_GROUP", value_enum, default_value_t = GroupKind::Schnorr)]
    group: GroupKind,

    /// Prime modulus of the additive group
    #[arg(long, env = "VSS_MODULUS", default_value_t = vss_core::DEFAULT_MODULUS)]
    modulus: u64,

    /// Emit logs as JSON
    #[arg(long, env = "VSS_JSON_LOGS")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GroupKind {
    /// Z_q under addition; illustrative only
    Additive,
    /// Order-q subgroup of Z_p^* with p = 2q + 1
    Schnorr,
    /// secp256k1 curve points
    Secp256k1,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Seed for reproducible polynomials
        #[arg(long, env = "VSS_SEED")]
        seed: Option<u64>,

        /// Process queued messages once and exit instead of waiting to converge
        #[arg(long, env = "VSS_DRAIN_ONCE")]
        drain_once: bool,

        /// Per-agent deadline in milliseconds
        #[arg(long, env = "VSS_DEADLINE_MS", default_value_t = 10_000)]
        deadline_ms: u64,

        /// Idle time after convergence before an agent exits, in milliseconds
        #[arg(long, env = "VSS_QUIESCENCE_MS", default_value_t = 50)]
        quiescence_ms: u64,

        /// Agents that crash before dealing (comma-separated)
        #[arg(long, value_delimiter = ',')]
        silent: Vec<AgentId>,

        /// Dealer sending bad shares, as DEALER:VICTIM[,VICTIM...]
        #[arg(long, value_parser = parse_tamper)]
        tamper: Vec<(AgentId, Vec<AgentId>)>,

        /// Fixed secret for a dealer, as DEALER=VALUE
        #[arg(long, value_parser = parse_secret)]
        secret: Vec<(AgentId, u64)>,

        /// Write the full report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate the configuration and show derived thresholds
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if cli.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ProtocolConfig::new(cli.agents, cli.threshold, cli.faulty)?;

    match cli.command {
        Commands::Run {
            seed,
            drain_once,
            deadline_ms,
            quiescence_ms,
            ref silent,
            ref tamper,
            ref secret,
            ref report,
        } => {
            let termination = if drain_once {
                Termination::DrainOnce
            } else {
                Termination::UntilConverged {
                    deadline: Duration::from_millis(deadline_ms),
                    quiescence: Duration::from_millis(quiescence_ms),
                }
            };
            let options = RunOptions {
                config: config.with_termination(termination),
                seed,
                silent,
                tamper,
                secret,
            };

            let outcome = match cli.group {
                GroupKind::Additive => run(options, AdditiveModQ::new(cli.modulus)?).await?,
                GroupKind::Schnorr => run(options, SchnorrGroup::default()).await?,
                GroupKind::Secp256k1 => run(options, Secp256k1).await?,
            };

            print_summary(&outcome);

            if let Some(path) = report {
                std::fs::write(path, outcome.to_json()?)
                    .with_context(|| format!("writing report to {}", path.display()))?;
                info!(path = ?path, "Report written");
            }

            if !outcome.is_success() {
                bail!(
                    "{} honest secret(s) were not recovered",
                    outcome.failures().len()
                );
            }
        }
        Commands::Check => {
            show_check(&cli, &config)?;
        }
    }

    Ok(())
}

struct RunOptions<'a> {
    config: ProtocolConfig,
    seed: Option<u64>,
    silent: &'a [AgentId],
    tamper: &'a [(AgentId, Vec<AgentId>)],
    secret: &'a [(AgentId, u64)],
}

async fn run<G: Group>(options: RunOptions<'_>, group: G) -> Result<SimulationReport> {
    info!(
        group = group.name(),
        n_agents = options.config.n_agents,
        threshold = options.config.threshold,
        max_faulty = options.config.max_faulty,
        "Configuring simulation"
    );

    let mut simulation = Simulation::new(options.config, group.clone())?;
    for id in options.silent {
        simulation = simulation.with_behavior(*id, Behavior::Silent)?;
    }
    for (dealer, victims) in options.tamper {
        simulation = simulation.with_behavior(
            *dealer,
            Behavior::TamperShares {
                victims: victims.clone(),
            },
        )?;
    }
    for (dealer, value) in options.secret {
        simulation = simulation.with_secret(*dealer, fixed_secret(&group, *dealer, *value)?)?;
    }
    if let Some(seed) = options.seed {
        simulation = simulation.with_seed(seed);
    }

    Ok(simulation.run().await?)
}

/// A dealer's fixed secret, refusing values that would wrap modulo the order
fn fixed_secret<G: Group>(group: &G, dealer: AgentId, value: u64) -> Result<G::Scalar> {
    group.checked_scalar_from_u64(value).with_context(|| {
        format!(
            "secret {} for dealer {} is not below the {} group order",
            value,
            dealer,
            group.name()
        )
    })
}

fn print_summary(report: &SimulationReport) {
    println!("Simulation {}", report.run_id);
    println!("  Group: {}", report.group);
    println!(
        "  N = {}, t = {}, f = {}",
        report.config.n_agents, report.config.threshold, report.config.max_faulty
    );
    println!(
        "  Elapsed: {} ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );

    for agent in &report.agents {
        println!(
            "  Agent {:>3} [{:?}] recovered {}/{} secrets{}",
            agent.agent,
            agent.behavior,
            agent.secrets.len(),
            agent.decisions.len(),
            if agent.converged { "" } else { " (not converged)" }
        );
    }

    let failures = report.failures();
    if failures.is_empty() {
        println!("All honest agents recovered every honest secret");
    } else {
        for (agent, subject, error) in &failures {
            warn!(agent, subject, %error, "Secret not recovered");
            println!("  Agent {} missed subject {}: {}", agent, subject, error);
        }
    }
    if !report.agreement() {
        println!("Honest agents disagree on at least one decision");
    }
}

fn show_check(cli: &Cli, config: &ProtocolConfig) -> Result<()> {
    let parameters = match cli.group {
        GroupKind::Additive => {
            let group = AdditiveModQ::new(cli.modulus)?;
            config.validate_for(&group)?;
            format!("Z_{} under addition", group.modulus())
        }
        GroupKind::Schnorr => {
            let group = SchnorrGroup::default();
            config.validate_for(&group)?;
            format!("order {} subgroup of Z_{}^*", group.order(), group.modulus())
        }
        GroupKind::Secp256k1 => {
            config.validate_for(&Secp256k1)?;
            "secp256k1 curve points".to_string()
        }
    };

    println!("Configuration OK:");
    println!("{}", serde_json::to_string_pretty(config)?);
    println!("  Group: {}", parameters);
    println!("  Quorum (ceil((N+f+1)/2)): {}", config.quorum());
    println!("  Dispute threshold (f+1): {}", config.dispute_threshold());
    println!("  Coefficients per dealer: {}", config.coefficient_count());
    println!("  Mailbox capacity: {}", config.mailbox_capacity());

    Ok(())
}

fn parse_agent(value: &str) -> std::result::Result<AgentId, String> {
    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid agent id '{}': {}", value, e))
}

fn parse_tamper(value: &str) -> std::result::Result<(AgentId, Vec<AgentId>), String> {
    let (dealer, victims) = value
        .split_once(':')
        .ok_or_else(|| format!("expected DEALER:VICTIMS, got '{}'", value))?;
    let victims = victims
        .split(',')
        .map(parse_agent)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((parse_agent(dealer)?, victims))
}

fn parse_secret(value: &str) -> std::result::Result<(AgentId, u64), String> {
    let (dealer, secret) = value
        .split_once('=')
        .ok_or_else(|| format!("expected DEALER=VALUE, got '{}'", value))?;
    let secret = secret
        .trim()
        .parse()
        .map_err(|e| format!("invalid secret '{}': {}", secret, e))?;
    Ok((parse_agent(dealer)?, secret))
}
