//! Property tests for ring layout and petal phase invariants

use std::f32::consts::TAU;

use glam::Vec2;
use proptest::prelude::*;

use petal_arena::consts::SIM_DT;
use petal_arena::defs::{Modifiers, PetalDefinition, Rarity};
use petal_arena::sim::{GameState, tick};
use petal_arena::{PetalRegistry, SimConfig, cartesian_to_polar};

/// A damage-free registry whose one definition carries `pieces` pieces
fn pieces_registry(pieces: u32) -> PetalRegistry {
    let def = PetalDefinition {
        id: "orbiter".into(),
        display_name: "Orbiter".into(),
        rarity: Rarity::Common,
        damage: None,
        health: Some(10.0),
        heal: None,
        reload_time: None,
        use_time: None,
        hitbox_radius: 0.4,
        is_duplicate: pieces > 1,
        piece_amount: pieces,
        modifiers: Modifiers::default(),
    };
    PetalRegistry::new(vec![def]).expect("valid test definition")
}

proptest! {
    /// Every petal sits exactly on the orbit circle, and consecutive
    /// pieces are separated by the same angular slice.
    #[test]
    fn petals_partition_the_circle(pieces in 1u32..12, ticks in 2u32..50) {
        let cfg = SimConfig::default();
        let mut state = GameState::new(cfg, pieces_registry(pieces));
        let p = state.spawn_player(Vec2::new(5.0, -3.0));
        state.queue_equip(p, 0, "orbiter").unwrap();

        for _ in 0..ticks {
            tick(&mut state, SIM_DT);
        }

        let player = state.player(p).unwrap();
        let snaps = state.full_petal_snapshot();
        prop_assert_eq!(snaps.len(), pieces as usize);

        let range = player.inventory.range;
        let mut angles: Vec<f32> = Vec::with_capacity(snaps.len());
        for snap in &snaps {
            let (r, theta) = cartesian_to_polar(snap.pos - player.pos);
            prop_assert!(
                (r - range).abs() < 1e-3,
                "petal off the orbit circle: {} != {}", r, range
            );
            angles.push(theta);
        }

        // Pairwise separation equals the per-piece slice (mod 2π)
        let slice = TAU / pieces as f32;
        for pair in angles.windows(2) {
            let mut delta = (pair[1] - pair[0]).rem_euclid(TAU);
            if delta > TAU - 1e-3 {
                delta = 0.0;
            }
            prop_assert!(
                (delta - slice).abs() < 1e-3,
                "uneven slice: {} vs {}", delta, slice
            );
        }
    }

    /// The ring follows its owner wherever movement takes them.
    #[test]
    fn ring_is_centered_on_owner(
        x in -50.0f32..50.0,
        y in -50.0f32..50.0,
        vx in -6.0f32..6.0,
        vy in -6.0f32..6.0,
    ) {
        let cfg = SimConfig::default();
        let mut state = GameState::new(cfg, pieces_registry(3));
        let p = state.spawn_player(Vec2::new(x, y));
        state.queue_equip(p, 0, "orbiter").unwrap();
        state.player_mut(p).unwrap().vel = Vec2::new(vx, vy);

        for _ in 0..30 {
            tick(&mut state, SIM_DT);
        }

        let player_pos = state.player(p).unwrap().pos;
        let range = state.player(p).unwrap().inventory.range;
        for snap in state.full_petal_snapshot() {
            let (r, _) = cartesian_to_polar(snap.pos - player_pos);
            prop_assert!((r - range).abs() < 1e-3);
        }
    }

    /// Random tick sequences with random slot commands never leave a
    /// petal both reloading and using, and never panic.
    #[test]
    fn no_petal_is_both_reloading_and_using(
        seed_commands in proptest::collection::vec((0usize..10, 0usize..10, 0u8..3), 0..20),
        ticks in 1u32..120,
    ) {
        let cfg = SimConfig::default();
        let mut state = GameState::new(cfg, PetalRegistry::builtin());
        let p = state.spawn_player(Vec2::ZERO);
        state.player_mut(p).unwrap().health = 40.0; // keep heal triggers live
        state.queue_equip(p, 0, "rose").unwrap();
        state.queue_equip(p, 1, "sand").unwrap();

        let mut pending = seed_commands.into_iter();
        for t in 0..ticks {
            if t % 7 == 0 {
                if let Some((a, b, kind)) = pending.next() {
                    // Commands come from the full valid slot range
                    let _ = match kind {
                        0 => state.queue_equip(p, a, "rose"),
                        1 => state.queue_delete(p, a),
                        _ => state.queue_swap(p, a, b),
                    };
                }
            }
            tick(&mut state, SIM_DT);

            for player in &state.players {
                for (_, petal) in player.inventory.petals() {
                    prop_assert!(
                        !(petal.is_reloading() && petal.is_using()),
                        "petal {} reloading and using at once", petal.id
                    );
                }
            }
        }
    }

    /// Piece totals always match the equipped definitions, whatever the
    /// equip/delete/swap history.
    #[test]
    fn piece_total_matches_equipped_slots(
        ops in proptest::collection::vec((0usize..10, 0usize..10, 0u8..3), 1..30),
    ) {
        let cfg = SimConfig::default();
        let mut state = GameState::new(cfg, PetalRegistry::builtin());
        let p = state.spawn_player(Vec2::ZERO);

        for (a, b, kind) in ops {
            let _ = match kind {
                0 => state.queue_equip(p, a, "sand"),
                1 => state.queue_delete(p, a),
                _ => state.queue_swap(p, a, b),
            };
            tick(&mut state, SIM_DT);

            let player = state.player(p).unwrap();
            let expected: u32 = (0..player.inventory.equipped_count())
                .filter_map(|i| player.inventory.slot(i))
                .map(|id| state.defs.def(id).displayed_pieces())
                .sum();
            prop_assert_eq!(player.inventory.total_displayed_pieces(), expected);
        }
    }
}
