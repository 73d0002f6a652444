//! Headless demo loop
//!
//! Spawns a handful of players and mobs, equips loadouts, and runs the
//! simulation for a fixed stretch of ticks, logging notable events. Useful
//! for eyeballing behavior and profiling without a network layer.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use petal_arena::consts::SIM_DT;
use petal_arena::sim::{GameEvent, GameState, tick};
use petal_arena::{PetalRegistry, SimConfig};

/// Demo arena radius players wander inside
const ARENA_RADIUS: f32 = 25.0;
/// Demo duration in ticks (30 seconds at 30 Hz)
const DEMO_TICKS: u32 = 900;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42u64);
    log::info!("petal-arena demo starting (seed {seed})");

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut state = GameState::new(SimConfig::default(), PetalRegistry::builtin());

    let loadouts: [&[&str]; 4] = [
        &["basic", "basic", "light", "light", "rose"],
        &["sand", "sand", "rose", "leaf", "faster"],
        &["stinger", "light", "light", "rose", "rose"],
        &["basic", "sand", "leaf", "leaf", "stinger"],
    ];

    for loadout in loadouts {
        let pos = random_arena_pos(&mut rng, ARENA_RADIUS * 0.5);
        let id = state.spawn_player(pos);
        for (slot, name) in loadout.iter().enumerate() {
            // Loadouts above only name builtin petals
            state
                .queue_equip(id, slot, name)
                .expect("builtin loadout definition");
        }
    }

    for _ in 0..8 {
        let pos = random_arena_pos(&mut rng, ARENA_RADIUS);
        let radius = rng.random_range(1.0..2.5);
        let health = rng.random_range(40.0..120.0);
        state.spawn_mob(pos, radius, health);
    }

    for i in 0..DEMO_TICKS {
        // Retarget wandering every couple of seconds
        if i % 60 == 0 {
            for player in &mut state.players {
                let target = random_arena_pos(&mut rng, ARENA_RADIUS);
                let speed = state.config.player_speed;
                player.vel = (target - player.pos).normalize_or_zero() * speed;
            }
        }

        tick(&mut state, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::PetalBroken { petal, owner, .. } => {
                    log::debug!("petal {petal} of player {owner} broke")
                }
                GameEvent::PlayerHealed { player, amount } => {
                    log::debug!("player {player} healed {amount}")
                }
                GameEvent::PlayerDied { player, killer } => {
                    log::info!("player {player} was slain by player {killer}")
                }
                GameEvent::MobDied { mob, killer } => {
                    log::info!("mob {mob} felled by player {killer}")
                }
            }
        }

        let deltas = state.drain_dirty_petals();
        if !deltas.is_empty() {
            log::trace!("{} petal deltas this tick", deltas.len());
        }
    }

    log::info!(
        "demo finished: {} ticks, {} players and {} mobs alive",
        state.time_ticks,
        state.players.len(),
        state.mobs.len()
    );
}

fn random_arena_pos(rng: &mut Pcg32, radius: f32) -> Vec2 {
    let theta = rng.random_range(0.0..TAU);
    let r = rng.random_range(0.0..radius);
    petal_arena::polar_to_cartesian(r, theta)
}
