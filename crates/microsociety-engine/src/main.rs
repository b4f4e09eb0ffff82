//! Engine binary for the MicroSociety simulation.
//!
//! Wires configuration, world generation, the agent spawner, and the
//! optional frozen-policy model around the core tick cycle, then runs the
//! simulation until a termination condition is met or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `microsociety-config.yaml` (or the path given
//!    as the first argument, or `MICROSOCIETY_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the frozen policy when the external model is enabled
//! 4. Generate the world and spawn agents
//! 5. Run the paced tick loop
//! 6. Log the final report and export the best agent's policy if configured

mod error;
mod policy_model;
mod spawner;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use microsociety_core::config::LoggingConfig;
use microsociety_core::runner::{self, SimulationReport};
use microsociety_core::{
    ExperienceBuffer, ExternalModel, NoModel, SimulationConfig, SimulationState, run_tick,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::policy_model::FrozenPolicyModel;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "microsociety-config.yaml";

/// Environment variable overriding the config path.
const CONFIG_ENV: &str = "MICROSOCIETY_CONFIG";

/// Offset mixed into the world seed for the spawner's generator.
const SPAWNER_SEED_OFFSET: u64 = 0x5EED;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or policy export fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("microsociety-engine starting");
    if from_file {
        info!(path = %config_path.display(), "configuration loaded");
    } else {
        info!(path = %config_path.display(), "config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        agents = config.agents.count,
        max_ticks = config.world.max_ticks,
        tick_interval_ms = config.world.tick_interval_ms,
        "simulation configured"
    );

    // 3. Load the external model.
    let model = load_model(&config)?;

    // 4. Generate the world and spawn agents.
    let agent_count = config.agents.count;
    let export_path = config.external_model.export_path.clone();
    let mut spawner_rng = StdRng::seed_from_u64(config.world.seed ^ SPAWNER_SEED_OFFSET);
    let mut state = SimulationState::new(config)?;
    spawner::spawn_agents(&mut state, agent_count, &mut spawner_rng)?;

    // 5. Run the simulation.
    let experiences = ExperienceBuffer::new();
    let report = run_paced(&mut state, model.as_ref(), &experiences).await;

    // 6. Report and export.
    runner::log_simulation_end(&report);
    log_experience_batch(&experiences);
    if let Some(path) = export_path {
        export_best_policy(&state, &path)?;
    }

    info!(end_reason = ?report.end_reason, ticks = report.ticks, "microsociety-engine shutdown complete");
    Ok(())
}

/// Resolve the config path: first argument, then environment, then default.
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_model(config: &SimulationConfig) -> Result<Box<dyn ExternalModel>, EngineError> {
    let external = &config.external_model;
    match (&external.policy_path, external.enabled) {
        (Some(path), true) => {
            let model = FrozenPolicyModel::load(path)?;
            if model.is_empty() {
                warn!(path = %path.display(), "policy file is empty, agents fall back to Q-learning");
            }
            Ok(Box::new(model))
        }
        _ => Ok(Box::new(NoModel)),
    }
}

/// Drive ticks at `world.tick_interval_ms` until the run ends or Ctrl-C.
async fn run_paced(
    state: &mut SimulationState,
    model: &dyn ExternalModel,
    experiences: &ExperienceBuffer,
) -> SimulationReport {
    let stop = AtomicBool::new(false);
    let interval_ms = state.config.world.tick_interval_ms;
    let summary_every = state.config.logging.summary_interval_ticks;
    let mut pacer = (interval_ms > 0).then(|| tokio::time::interval(Duration::from_millis(interval_ms)));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut shutdown_armed = true;

    info!(agents = state.agents.len(), "entering tick loop");
    let reason = loop {
        if let Some(reason) = runner::end_reason(state, &stop) {
            break reason;
        }
        tokio::select! {
            signal = &mut shutdown, if shutdown_armed => {
                shutdown_armed = false;
                match signal {
                    Ok(()) => {
                        warn!(tick = state.tick, "shutdown requested, stopping after current tick");
                        stop.store(true, Ordering::Relaxed);
                    }
                    Err(e) => warn!(error = %e, "failed to listen for Ctrl-C, shutdown signal disabled"),
                }
            }
            () = pace(pacer.as_mut()) => {
                let summary = run_tick(state, model, experiences);
                for id in &summary.deaths {
                    debug!(tick = summary.tick, agent = %id, "death recorded");
                }
                if summary.tick.checked_rem(summary_every) == Some(0) {
                    log_experience_batch(experiences);
                }
            }
        }
    };
    SimulationReport::capture(state, Some(reason))
}

/// Wait for the next pacing slot, or just yield when unpaced.
async fn pace(pacer: Option<&mut tokio::time::Interval>) {
    match pacer {
        Some(interval) => {
            interval.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

/// Log one summary line for the buffered experiences, then discard them.
fn log_experience_batch(experiences: &ExperienceBuffer) {
    let stats = experiences.stats();
    if stats.total == 0 {
        return;
    }
    let drained = experiences.drain();
    info!(
        records = drained.len(),
        average_reward = stats.average_reward,
        min_reward = stats.min_reward,
        max_reward = stats.max_reward,
        terminal = stats.terminal,
        "experience batch"
    );
}

/// Write the greedy policy of the agent with the best net reward.
fn export_best_policy(state: &SimulationState, path: &Path) -> Result<(), EngineError> {
    let best = state.agents.iter().max_by(|a, b| {
        let net_a = a.total_reward + a.total_penalty;
        let net_b = b.total_reward + b.total_penalty;
        net_a.total_cmp(&net_b)
    });
    match best {
        Some(agent) => {
            info!(name = %agent.name, reward = agent.total_reward, "exporting best agent's policy");
            policy_model::export_policy(path, &agent.policy.greedy_policy())
        }
        None => {
            warn!("no agents, nothing to export");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_core::EndReason;

    use super::*;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.width = 8;
        config.world.height = 8;
        config.world.max_ticks = 15;
        config.world.tick_interval_ms = 0;
        config
    }

    #[tokio::test]
    async fn paced_loop_stops_at_tick_limit() {
        let mut state = SimulationState::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        spawner::spawn_agents(&mut state, 3, &mut rng).unwrap();
        let buffer = ExperienceBuffer::new();
        let report = run_paced(&mut state, &NoModel, &buffer).await;
        assert_eq!(report.end_reason, Some(EndReason::MaxTicksReached));
        assert_eq!(report.ticks, 15);
        assert_eq!(report.agents.len(), 3);
    }

    #[tokio::test]
    async fn interval_pacing_still_runs_every_tick() {
        let mut config = small_config();
        config.world.max_ticks = 3;
        config.world.tick_interval_ms = 1;
        let mut state = SimulationState::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        spawner::spawn_agents(&mut state, 1, &mut rng).unwrap();
        let report = run_paced(&mut state, &NoModel, &ExperienceBuffer::new()).await;
        assert_eq!(report.ticks, 3);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let (config, from_file) = load_config(Path::new("definitely/not/here.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn disabled_model_is_never_loaded() {
        let model = load_model(&SimulationConfig::default()).unwrap();
        assert!(!model.is_loaded());
    }

    #[test]
    fn exported_policy_loads_back() {
        let mut state = SimulationState::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        spawner::spawn_agents(&mut state, 2, &mut rng).unwrap();
        for _ in 0..10 {
            run_tick(&mut state, &NoModel, &microsociety_core::NullSink);
        }
        let path = std::env::temp_dir().join(format!("microsociety-best-{}.json", std::process::id()));
        export_best_policy(&state, &path).unwrap();
        let model = FrozenPolicyModel::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(model.is_loaded());
    }

    #[test]
    fn experience_batch_is_summarised_and_cleared() {
        let mut state = SimulationState::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        spawner::spawn_agents(&mut state, 2, &mut rng).unwrap();
        let buffer = ExperienceBuffer::new();
        run_tick(&mut state, &NoModel, &buffer);
        assert_eq!(buffer.len(), 2);
        log_experience_batch(&buffer);
        assert!(buffer.is_empty());
    }
}
