//! Tick cycle: the loop step that drives the MicroSociety simulation.
//!
//! Each tick runs through these phases:
//!
//! 1. **World** -- advance the clock, regrow resources, and let the market
//!    drift and stabilize once its interval has elapsed.
//! 2. **Agents** -- visit agents in list order. Each one gets its vital
//!    tick (cooldown countdown, energy decay, death check); a living agent
//!    whose cooldown has expired then takes one full turn:
//!    observe, decide, walk to the target tile, act, and learn. An agent
//!    whose walk drains its energy dies on arrival without acting.
//!
//! Agents act strictly one after another, so later agents in a tick see the
//! prices, storage, and tiles left behind by earlier ones. The order of the
//! agent list is the turn order.

use microsociety_agents::{AgentError, NpcAgent, apply_vital_tick};
use microsociety_economy::{House, Market};
use microsociety_learning::extract_state;
use microsociety_types::{ActionType, AgentId, Position, TileCoord};
use microsociety_world::{TileAccess, TileGrid, WorldError, generate_world, regrow_resources};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::actions::{ActionContext, ActionOutcome, execute_action};
use crate::config::{ConfigError, SimulationConfig};
use crate::experience::ExperienceSink;
use crate::feedback::{Transition, apply_feedback};
use crate::model::ExternalModel;
use crate::router::{self, Decision, EconomyView};

/// Errors that can occur while setting up the simulation.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The configuration is inconsistent.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// World generation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An agent could not be created.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// Settings fixed for the whole run.
    pub config: SimulationConfig,
    /// The tile grid.
    pub grid: TileGrid,
    /// Tile holding the house.
    pub house_tile: TileCoord,
    /// Tile holding the market.
    pub market_tile: TileCoord,
    /// The market.
    pub market: Market,
    /// The house.
    pub house: House,
    /// Every agent, in turn order.
    pub agents: Vec<NpcAgent>,
    /// Generator for regrowth, market drift, and router coin flips.
    pub rng: StdRng,
    /// Ticks completed.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub elapsed: f64,
}

impl SimulationState {
    /// Validate `config` and generate a world with no agents yet.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the configuration is invalid or the world
    /// cannot be generated.
    pub fn new(config: SimulationConfig) -> Result<Self, TickError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let world = generate_world(&config.world.generation_params(), &mut rng)?;
        info!(
            width = config.world.width,
            height = config.world.height,
            house = %world.house,
            market = %world.market,
            "world generated"
        );
        Ok(Self {
            market: Market::new(config.market.clone()),
            house: House::new(config.house.clone()),
            grid: world.grid,
            house_tile: world.house,
            market_tile: world.market,
            agents: Vec::new(),
            rng,
            tick: 0,
            elapsed: 0.0,
            config,
        })
    }

    /// Add an NPC standing at the centre of `tile`, last in turn order.
    ///
    /// The agent's exploration seed is drawn from the simulation RNG, so a
    /// fixed world seed reproduces every policy.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Agent`] if the agent cannot be created.
    pub fn spawn_agent(&mut self, name: impl Into<String>, tile: TileCoord) -> Result<AgentId, TickError> {
        let seed = self.rng.random();
        let position = tile.center(self.grid.tile_size());
        let agent = NpcAgent::new(name, position, &self.config.agents, &self.config.learning, seed)?;
        let id = agent.id;
        debug!(agent = %id, name = %agent.name, tile = %tile, "agent spawned");
        self.agents.push(agent);
        Ok(id)
    }

    /// Number of agents still alive.
    pub fn living_agents(&self) -> u32 {
        let alive = self.agents.iter().filter(|a| a.is_alive()).count();
        u32::try_from(alive).unwrap_or(u32::MAX)
    }

    /// Look up an agent by id.
    pub fn agent(&self, id: AgentId) -> Option<&NpcAgent> {
        self.agents.iter().find(|a| a.id == id)
    }
}

/// One agent's completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTurn {
    /// The agent that acted.
    pub agent_id: AgentId,
    /// The router's decision.
    pub decision: Decision,
    /// The tile acted on.
    pub target: TileCoord,
    /// What happened.
    pub outcome: ActionOutcome,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds elapsed after this tick.
    pub elapsed: f64,
    /// Turns taken, in order.
    pub turns: Vec<AgentTurn>,
    /// Agents who died during this tick.
    pub deaths: Vec<AgentId>,
    /// Tiles that regrew a resource.
    pub regrown: u32,
    /// Whether the market ran a stabilization pass.
    pub market_stabilized: bool,
    /// Living agents at the end of the tick.
    pub agents_alive: u32,
}

impl TickSummary {
    /// Sum of the rewards earned this tick.
    pub fn total_reward(&self) -> f64 {
        self.turns.iter().map(|t| t.outcome.reward).sum()
    }
}

/// Borrowed world pieces an agent turn may touch.
struct TurnWorld<'a> {
    config: &'a SimulationConfig,
    grid: &'a mut TileGrid,
    market: &'a mut Market,
    house: &'a mut House,
    house_tile: TileCoord,
    market_tile: TileCoord,
    rng: &'a mut StdRng,
    tick: u64,
}

/// Execute one tick of the simulation.
///
/// `model` is offered to agents with the external-model flag; `sink`
/// receives one experience per executed action.
pub fn run_tick(
    state: &mut SimulationState,
    model: &dyn ExternalModel,
    sink: &dyn ExperienceSink,
) -> TickSummary {
    let dt = state.config.world.tick_delta.max(0.0);
    state.tick = state.tick.saturating_add(1);
    state.elapsed += dt;
    let tick = state.tick;

    // --- Phase 1: World ---
    let regrown = regrow_resources(&mut state.grid, state.config.world.regrowth_chance, &mut state.rng);
    let market_stabilized = state.market.update(dt, &mut state.rng);

    // --- Phase 2: Agents ---
    let SimulationState {
        config,
        grid,
        house_tile,
        market_tile,
        market,
        house,
        agents,
        rng,
        ..
    } = state;
    let mut world = TurnWorld {
        config,
        grid,
        market,
        house,
        house_tile: *house_tile,
        market_tile: *market_tile,
        rng,
        tick,
    };

    let mut turns = Vec::new();
    let mut deaths = Vec::new();
    for agent in agents.iter_mut() {
        let vital = apply_vital_tick(agent, dt, &world.config.agents);
        if vital.died {
            deaths.push(agent.id);
        }
        if !agent.can_act() {
            continue;
        }
        turns.extend(take_turn(agent, &mut world, model, sink));
        if agent.check_death(world.config.agents.death_penalty) {
            info!(tick, agent = %agent.id, name = %agent.name, "agent died");
            deaths.push(agent.id);
        }
    }

    let summary = TickSummary {
        tick,
        elapsed: state.elapsed,
        turns,
        deaths,
        regrown,
        market_stabilized,
        agents_alive: state.living_agents(),
    };

    // An interval of zero disables the summary.
    if tick.checked_rem(state.config.logging.summary_interval_ticks) == Some(0) {
        info!(
            tick,
            alive = summary.agents_alive,
            actions = summary.turns.len(),
            reward = summary.total_reward(),
            deaths = summary.deaths.len(),
            house_level = state.house.level(),
            "tick summary"
        );
    }
    summary
}

fn take_turn(
    agent: &mut NpcAgent,
    world: &mut TurnWorld<'_>,
    model: &dyn ExternalModel,
    sink: &dyn ExperienceSink,
) -> Option<AgentTurn> {
    let config = world.config;
    let discretization = config.learning.discretization();
    let before = extract_state(&*world.grid, &agent.observation(), discretization);

    let economy = EconomyView {
        market: &*world.market,
        house: &*world.house,
    };
    let decision = router::decide(agent, &before, economy, model, &config.router, &mut *world.rng);

    let origin = agent_tile(world.grid, agent.position);
    let target = resolve_target(world, decision.action, origin);
    travel(agent, origin, target, world.grid.tile_size(), config.actions.travel_energy_per_tile);
    if agent.vitals.is_depleted() {
        // Collapsed on the way; the caller records the death.
        debug!(tick = world.tick, agent = %agent.id, action = ?decision.action, "agent exhausted before acting");
        return None;
    }

    let mut ctx = ActionContext {
        grid: &mut *world.grid,
        market: &mut *world.market,
        house: &mut *world.house,
        rewards: &config.rewards,
        tuning: &config.actions,
    };
    let outcome = execute_action(agent, decision.action, target, &mut ctx);

    let after = extract_state(&*world.grid, &agent.observation(), discretization);
    apply_feedback(
        agent,
        Transition {
            previous: before,
            action: decision.action,
            reward: outcome.reward,
            next: after,
            tick: world.tick,
        },
        &config.experience,
        sink,
    );

    Some(AgentTurn {
        agent_id: agent.id,
        decision,
        target,
        outcome,
    })
}

/// The tile under `position`, clamped onto the grid.
pub fn agent_tile<G: TileAccess + ?Sized>(grid: &G, position: Position) -> TileCoord {
    let (width, height) = grid.dimensions();
    let (bx, by) = position.bucket(grid.tile_size());
    let clamp = |v: i32, len: u32| u32::try_from(v).unwrap_or(0).min(len.saturating_sub(1));
    TileCoord::new(clamp(bx, width), clamp(by, height))
}

fn resolve_target(world: &TurnWorld<'_>, action: ActionType, origin: TileCoord) -> TileCoord {
    if let Some(kind) = action.gather_target() {
        return world.grid.find_nearest(origin, kind).unwrap_or(origin);
    }
    if action.targets_house() {
        return world.house_tile;
    }
    if action.targets_market() {
        return world.market_tile;
    }
    origin
}

fn travel(agent: &mut NpcAgent, origin: TileCoord, target: TileCoord, tile_size: f64, energy_per_tile: f64) {
    let distance = origin.manhattan_distance(target);
    agent.position = target.center(tile_size);
    if distance > 0 {
        agent.vitals.change_energy(-energy_per_tile * f64::from(distance));
    }
}
