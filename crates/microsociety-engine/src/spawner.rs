//! Agent spawner for seeding the simulation with its initial population.
//!
//! At startup the spawner creates `agents.count` NPCs with unique names and
//! scatters them over free tiles of the generated world. The spawner draws
//! from its own seeded generator so a fixed config reproduces the same
//! population.

use microsociety_core::SimulationState;
use microsociety_types::{AgentId, TileCoord};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::EngineError;

/// Built-in pool of agent names. Picked without replacement; a population
/// larger than the pool reuses names with a numeric suffix.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze", "Iris", "Juniper",
    "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine", "Quill", "Reed", "Sage", "Thorn",
    "Umber", "Vale", "Wren", "Yarrow", "Zephyr",
];

/// Spawn `count` agents onto free tiles of `state`.
///
/// Agents get distinct tiles while free tiles last; beyond that, tiles are
/// reused in the same shuffled order.
pub fn spawn_agents<R: Rng + ?Sized>(
    state: &mut SimulationState,
    count: u32,
    rng: &mut R,
) -> Result<Vec<AgentId>, EngineError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut tiles = state.grid.empty_tiles();
    if tiles.is_empty() {
        // A crowded map still has its house tile to stand on.
        tiles.push(state.house_tile);
    }
    tiles.shuffle(rng);
    let names = pick_unique_names(rng, count);

    let mut ids = Vec::with_capacity(names.len());
    for (i, name) in names.into_iter().enumerate() {
        let tile = pick_tile(&tiles, i)?;
        ids.push(state.spawn_agent(name, tile)?);
    }
    info!(agents = ids.len(), free_tiles = tiles.len(), "agents spawned");
    Ok(ids)
}

fn pick_tile(tiles: &[TileCoord], index: usize) -> Result<TileCoord, EngineError> {
    index
        .checked_rem(tiles.len())
        .and_then(|slot| tiles.get(slot))
        .copied()
        .ok_or_else(|| EngineError::Spawner {
            message: String::from("world has no tile to place agents on"),
        })
}

/// Pick `count` distinct names.
fn pick_unique_names<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<String> {
    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    pool.shuffle(rng);
    let pool_len = pool.len();
    (0..usize::try_from(count).unwrap_or(usize::MAX))
        .map(|i| {
            let base = i
                .checked_rem(pool_len)
                .and_then(|slot| pool.get(slot))
                .copied()
                .unwrap_or("Npc");
            match i.checked_div(pool_len) {
                Some(0) | None => base.to_owned(),
                Some(round) => format!("{base}-{}", round.saturating_add(1)),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use microsociety_core::SimulationConfig;
    use microsociety_world::TileAccess;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn state() -> SimulationState {
        let mut config = SimulationConfig::default();
        config.world.width = 10;
        config.world.height = 10;
        SimulationState::new(config).unwrap()
    }

    #[test]
    fn spawns_requested_population_on_free_tiles() {
        let mut state = state();
        let mut rng = StdRng::seed_from_u64(1);
        let ids = spawn_agents(&mut state, 6, &mut rng).unwrap();
        assert_eq!(ids.len(), 6);
        assert_eq!(state.agents.len(), 6);
        let tile_size = state.grid.tile_size();
        let tiles: BTreeSet<_> = state
            .agents
            .iter()
            .map(|a| state.grid.tile_at(a.position).unwrap())
            .collect();
        assert_eq!(tiles.len(), 6);
        for agent in &state.agents {
            let tile = state.grid.tile_at(agent.position).unwrap();
            assert!(!state.grid.has_object(tile));
            assert_eq!(agent.position, tile.center(tile_size));
        }
    }

    #[test]
    fn names_are_unique_even_past_the_pool() {
        let mut rng = StdRng::seed_from_u64(2);
        let names = pick_unique_names(&mut rng, 60);
        let distinct: BTreeSet<_> = names.iter().collect();
        assert_eq!(distinct.len(), 60);
        assert!(names.iter().any(|n| n.ends_with("-2")));
        assert!(names.iter().any(|n| n.ends_with("-3")));
    }

    #[test]
    fn zero_agents_is_a_no_op() {
        let mut state = state();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(spawn_agents(&mut state, 0, &mut rng).unwrap().is_empty());
        assert!(state.agents.is_empty());
    }

    #[test]
    fn same_seed_same_population() {
        let names = |seed| {
            let mut state = state();
            let mut rng = StdRng::seed_from_u64(seed);
            spawn_agents(&mut state, 5, &mut rng).unwrap();
            state
                .agents
                .iter()
                .map(|a| (a.name.clone(), state.grid.tile_at(a.position)))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(9), names(9));
    }
}
