//! SCOUT Scenario Replay CLI
//!
//! Replays a recorded exploratory-testing session through the SCOUT
//! reasoning cycle and prints every decision.
//!
//! Usage:
//!   cargo run -p demo -- replay crates/scout-runtime/scenarios/checkout_stall.json
//!   cargo run -p demo -- replay crates/scout-runtime/scenarios/login_flow.json --config scout.toml
//!   cargo run -p demo -- check-config scout.toml

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scout_contracts::{config::ScoutConfig, error::ScoutResult};
use scout_policy::{
    exploration::{classify_action, group_actions_by_category},
    risk::{safest_actions, RiskCategory},
};
use scout_runtime::{Replay, ReplayEnd, Replayer, Scenario};

// ── CLI definition ────────────────────────────────────────────────────────────

/// SCOUT exploratory-testing decision core demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "SCOUT exploratory-testing replay demo",
    long_about = "Replays recorded UI snapshots through SCOUT's reasoning cycle, showing\n\
                  invariant checks, routing, risk-aware planning and the audit chain."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON scenario and print each decision.
    Replay {
        /// Path to the scenario JSON file.
        scenario: PathBuf,
        /// Optional TOML configuration; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// How many of the safest final actions to list.
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
    /// Parse and validate a TOML configuration, then print it.
    CheckConfig {
        config: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to see per-action scoring.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Replay { scenario, config, top } => run_replay(&scenario, config.as_deref(), top),
        Command::CheckConfig { config } => check_config(&config),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> ScoutResult<ScoutConfig> {
    match path {
        Some(path) => ScoutConfig::from_file(path),
        None => Ok(ScoutConfig::default()),
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run_replay(scenario_path: &Path, config: Option<&Path>, top: usize) -> ScoutResult<()> {
    let config = load_config(config)?;
    let scenario = Scenario::from_file(scenario_path)?;
    info!(path = %scenario_path.display(), "scenario loaded");

    print_banner(&scenario);
    let replay = Replayer::new(config).replay(&scenario)?;
    print_steps(&replay);
    print_summary(&replay, top);
    Ok(())
}

fn check_config(path: &Path) -> ScoutResult<()> {
    let config = ScoutConfig::from_file(path)?;
    println!("Configuration '{}' is valid.", path.display());
    println!("{:#?}", config);
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_banner(scenario: &Scenario) {
    println!();
    println!("SCOUT: Exploratory-Testing Decision Core");
    println!("Scenario: {}", scenario.display_name());
    println!("=========================================");
    println!();
    println!("Per frame:");
    println!("  [1] Interpret the snapshot (read-only)");
    println!("  [2] Check invariants and baselines; log anomalies");
    println!("  [3] Route: TERMINATE / DEEP_TEST / CONTINUE");
    println!("  [4] Unless TERMINATE: pick the next offered action by coverage and risk");
    println!("  [5] Append the cycle to the SHA-256 audit chain");
    println!();
}

fn print_steps(replay: &Replay) {
    for step in &replay.steps {
        let action = step
            .next_action
            .as_ref()
            .map(|a| format!("{} ({})", a, classify_action(a)))
            .unwrap_or_else(|| "-".to_string());
        println!("  frame {:>2}  step {:>3}  {:<9}  next: {}", step.frame, step.step, step.control.to_string(), action);
        for anomaly in &step.anomalies {
            println!("      ! [{}] {}", anomaly.severity, anomaly.description);
        }
        println!("      {}", step.reasoning);
    }
    println!();
}

fn print_summary(replay: &Replay, top: usize) {
    let end = match replay.end {
        ReplayEnd::Terminated => "terminated",
        ReplayEnd::FramesExhausted => "ran out of frames",
    };
    let state = &replay.state;
    println!("Session {}: {} after {} cycles", state.session_id.0, end, replay.steps.len());
    println!(
        "Anomalies: {} ({} high severity)",
        replay.anomaly_count(),
        state.anomalies.high_severity_count()
    );
    println!("Baselines learned: {}", state.knowledge.baselines.len());

    let offered = &state.ui_state.available_actions;
    let risks = &state.knowledge.risk_scores;
    if !offered.is_empty() {
        println!("Safest actions on the final screen:");
        for action in safest_actions(offered, risks, top) {
            let risk = risks.get(action);
            println!("  {:<24} {:.2} ({})", action.as_str(), risk, RiskCategory::from_score(risk));
        }
        println!("Final screen by category:");
        for (category, actions) in group_actions_by_category(offered) {
            if !actions.is_empty() {
                let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                println!("  {:<10} {}", category.to_string(), names.join(", "));
            }
        }
    }

    println!(
        "Audit chain: {} events, {}, terminal hash {}",
        replay.audit.events.len(),
        if replay.audit_intact { "VERIFIED" } else { "BROKEN" },
        replay.audit.terminal_hash
    );
    println!();
}
