//! Fixed timestep simulation tick
//!
//! Advances the whole world deterministically. Per tick, in order:
//! 1. Apply buffered slot commands (atomic between ticks)
//! 2. Move players
//! 3. Rebuild the spatial grid from current positions
//! 4. Tick every player's inventory in ascending id order; each player's
//!    combat effects are applied before the next player runs
//! 5. Sweep dead entities
//!
//! The only deferred construct is the petal use-effect completion, which is
//! tick-scheduled on the petal itself, so results are replayable
//! regardless of wall-clock jitter.

use super::grid::GridEntry;
use super::petal::Impact;
use super::state::{EntityId, EntityKind, GameEvent, GameState, SlotCommand};

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, dt: f32) {
    apply_pending_commands(state);
    move_players(state, dt);
    rebuild_grid(state);
    tick_petals(state, dt);
    sweep_dead(state);
    state.time_ticks += 1;
}

/// Apply slot commands buffered since the previous tick
///
/// Commands were validated at queue time; a player despawning in between
/// is the one late failure, handled by dropping the command.
fn apply_pending_commands(state: &mut GameState) {
    let commands = std::mem::take(&mut state.pending_commands);
    for command in commands {
        let GameState {
            players,
            defs,
            next_id,
            ..
        } = state;
        match command {
            SlotCommand::Equip { player, slot, def } => {
                if let Some(p) = players.iter_mut().find(|p| p.id == player) {
                    let pos = p.pos;
                    p.inventory.set_slot(slot, Some(def), defs, pos, next_id);
                    log::info!("player {player} equipped '{}' in slot {slot}", defs.def(def).id);
                }
            }
            SlotCommand::Delete { player, slot } => {
                if let Some(p) = players.iter_mut().find(|p| p.id == player) {
                    let pos = p.pos;
                    p.inventory.set_slot(slot, None, defs, pos, next_id);
                    log::info!("player {player} cleared slot {slot}");
                }
            }
            SlotCommand::Swap { player, a, b } => {
                if let Some(p) = players.iter_mut().find(|p| p.id == player) {
                    let pos = p.pos;
                    p.inventory.swap_slots(a, b, defs, pos, next_id);
                }
            }
        }
    }
}

fn move_players(state: &mut GameState, dt: f32) {
    for player in &mut state.players {
        if player.alive {
            player.pos += player.vel * player.speed_multiplier * dt;
        }
    }
}

/// Rebuild the broad-phase index from current positions
///
/// Reloading/using petals are indexed too: they can still be query
/// results, and damage intake itself decides whether a hit counts.
fn rebuild_grid(state: &mut GameState) {
    let GameState {
        grid,
        players,
        mobs,
        ..
    } = state;
    grid.clear();
    for player in players.iter().filter(|p| p.alive) {
        grid.insert(GridEntry {
            id: player.id,
            kind: EntityKind::Player,
            owner: None,
            hitbox: player.hitbox(),
        });
        for (_, petal) in player.inventory.petals() {
            grid.insert(GridEntry {
                id: petal.id,
                kind: EntityKind::Petal,
                owner: Some(player.id),
                hitbox: petal.hitbox(),
            });
        }
    }
    for mob in mobs.iter().filter(|m| m.alive) {
        grid.insert(GridEntry {
            id: mob.id,
            kind: EntityKind::Mob,
            owner: None,
            hitbox: mob.hitbox(),
        });
    }
}

/// Run every player's ring and petal state machines
fn tick_petals(state: &mut GameState, dt: f32) {
    for i in 0..state.players.len() {
        let mut impacts = Vec::new();
        {
            let GameState {
                players,
                grid,
                defs,
                config,
                time_ticks,
                ..
            } = &mut *state;
            let player = &mut players[i];
            if !player.alive {
                continue;
            }

            // Refresh equipment modifiers before the ring runs
            let modifiers = player.inventory.aggregate_modifiers(defs);
            player.max_health = player.base_max_health + modifiers.max_health;
            player.health = player.health.min(player.max_health);
            player.speed_multiplier = modifiers.speed;
            if modifiers.heal_per_second > 0.0 {
                player.heal(modifiers.heal_per_second * dt);
            }

            let owner = player.owner_ctx();
            player.inventory.tick(
                &owner,
                grid,
                defs,
                config,
                *time_ticks,
                dt,
                modifiers.revolution_speed,
                &mut impacts,
            );
        }
        apply_impacts(state, &impacts);
    }
}

/// Apply one player's combat effects before the next player ticks
///
/// A target that already dropped into reload ignores further hits from
/// the same batch, matching immediate-application semantics.
fn apply_impacts(state: &mut GameState, impacts: &[Impact]) {
    for impact in impacts {
        match *impact {
            Impact::Damage {
                target,
                target_kind,
                amount,
                source,
            } => apply_damage(state, target, target_kind, amount, source),
            Impact::Heal { player, amount } => {
                let healed = state.player_mut(player).map(|p| p.heal(amount)).is_some();
                if healed {
                    state.events.push(GameEvent::PlayerHealed { player, amount });
                }
            }
        }
    }
}

fn apply_damage(
    state: &mut GameState,
    target: EntityId,
    target_kind: EntityKind,
    amount: f32,
    source: EntityId,
) {
    match target_kind {
        EntityKind::Player => {
            let died = state
                .player_mut(target)
                .is_some_and(|p| p.receive_damage(amount));
            if died {
                log::info!("player {target} killed by player {source}");
                state.events.push(GameEvent::PlayerDied {
                    player: target,
                    killer: source,
                });
            }
        }
        EntityKind::Mob => {
            let died = state
                .mob_mut(target)
                .is_some_and(|m| m.receive_damage(amount));
            if died {
                log::debug!("mob {target} killed by player {source}");
                state.events.push(GameEvent::MobDied {
                    mob: target,
                    killer: source,
                });
            }
        }
        EntityKind::Petal => {
            let broken = state.petal_mut(target).map(|(owner, petal)| {
                (owner, petal.receive_damage(amount))
            });
            if let Some((owner, true)) = broken {
                state.events.push(GameEvent::PetalBroken {
                    petal: target,
                    owner,
                    attacker: source,
                });
            }
        }
    }
}

/// Remove dead mobs and despawn dead players (with all their petals)
fn sweep_dead(state: &mut GameState) {
    state.mobs.retain(|m| m.alive);
    let dead: Vec<EntityId> = state
        .players
        .iter()
        .filter(|p| !p.alive)
        .map(|p| p.id)
        .collect();
    for id in dead {
        state.despawn_player(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::defs::PetalRegistry;
    use glam::Vec2;

    fn new_state() -> GameState {
        GameState::new(SimConfig::default(), PetalRegistry::builtin())
    }

    #[test]
    fn test_commands_apply_at_tick_start_not_immediately() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        state.queue_equip(p, 0, "basic").unwrap();

        assert!(state.full_petal_snapshot().is_empty());
        tick(&mut state, 1.0);
        let snap = state.full_petal_snapshot();
        assert_eq!(snap.len(), 1);
        assert!(snap[0].is_reloading);
    }

    #[test]
    fn test_petal_wears_mob_down() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        // Fat mob sitting under the whole ring
        let m = state.spawn_mob(Vec2::ZERO, 5.0, 50.0);
        state.queue_equip(p, 0, "light").unwrap();

        // light: 6 damage, 0.5s reload; at dt=1 it activates on its first
        // tick and lands a hit every tick after; 50 hp falls inside 15
        for _ in 0..15 {
            tick(&mut state, 1.0);
        }
        let events = state.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::MobDied { mob, killer } if *mob == m && *killer == p)),
            "mob never died: {events:?}"
        );
        assert!(state.mob(m).is_none(), "dead mob not swept");
    }

    #[test]
    fn test_own_petals_never_break_each_other() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        state.queue_equip(p, 0, "light").unwrap();
        state.queue_equip(p, 1, "light").unwrap();
        state.queue_equip(p, 2, "sand").unwrap();

        for _ in 0..100 {
            tick(&mut state, 1.0);
        }
        let events = state.drain_events();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::PetalBroken { .. })),
            "same-owner petals damaged each other: {events:?}"
        );
    }

    #[test]
    fn test_petal_vs_petal_between_players() {
        let mut state = new_state();
        // Close enough that the two rings stay within petal contact range
        let a = state.spawn_player(Vec2::ZERO);
        let b = state.spawn_player(Vec2::new(1.0, 0.0));
        state.queue_equip(a, 0, "basic").unwrap();
        state.queue_equip(b, 0, "basic").unwrap();

        let mut broken = Vec::new();
        for _ in 0..20 {
            tick(&mut state, 1.0);
            broken.extend(state.drain_events().into_iter().filter_map(|e| match e {
                GameEvent::PetalBroken {
                    owner, attacker, ..
                } => Some((owner, attacker)),
                _ => None,
            }));
        }
        assert!(!broken.is_empty(), "enemy petals never collided");
        for (owner, attacker) in broken {
            assert_ne!(owner, attacker, "petal broke a sibling");
        }
    }

    #[test]
    fn test_heal_cycle_restores_owner_and_clamps() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        state.queue_equip(p, 0, "rose").unwrap();
        state.player_mut(p).unwrap().health = 90.0;

        // rose: heal 10, 3.5s reload, 1.5s use; plenty of room in 40 ticks
        let mut healed = false;
        for _ in 0..40 {
            tick(&mut state, 0.5);
            for event in state.drain_events() {
                if let GameEvent::PlayerHealed { player, amount } = event {
                    assert_eq!(player, p);
                    assert!((amount - 10.0).abs() < f32::EPSILON);
                    healed = true;
                }
            }
        }
        assert!(healed, "use effect never completed");
        let player = state.player(p).unwrap();
        assert!((player.health - player.max_health).abs() < 1e-4);

        // Post-heal petal state: back in reload, not using
        let snap = state.full_petal_snapshot();
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_dirty_snapshots_exactly_on_transitions() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        state.queue_equip(p, 0, "basic").unwrap();

        // Spawn tick: dirty with is_reloading = true
        tick(&mut state, 1.0);
        let snaps = state.drain_dirty_petals();
        assert_eq!(snaps.len(), 1);
        assert!(snaps[0].is_reloading);

        // Steady reload tick (basic reloads in 2.5s): no dirty petals
        tick(&mut state, 1.0);
        assert!(state.drain_dirty_petals().is_empty());

        // Third tick crosses 2.5s: reloading -> attacking
        tick(&mut state, 1.0);
        let snaps = state.drain_dirty_petals();
        assert_eq!(snaps.len(), 1);
        assert!(!snaps[0].is_reloading);

        // Steady attacking ticks: nothing to sync
        tick(&mut state, 1.0);
        tick(&mut state, 1.0);
        assert!(state.drain_dirty_petals().is_empty());
    }

    #[test]
    fn test_leaf_passive_heal_and_faster_revolution() {
        let mut state = new_state();
        let p = state.spawn_player(Vec2::ZERO);
        state.queue_equip(p, 0, "leaf").unwrap();
        state.queue_equip(p, 1, "faster").unwrap();
        state.player_mut(p).unwrap().health = 50.0;

        tick(&mut state, 1.0);
        let expected_step =
            state.config.revolution_step + state.defs.def(state.defs.get("faster").unwrap())
                .modifiers
                .revolution_speed;
        let player = state.player(p).unwrap();
        assert!(player.health > 50.0, "passive heal did not apply");
        assert!(
            (player.inventory.revolution_angle - expected_step).abs() < 1e-6,
            "revolution modifier not applied"
        );
    }

    #[test]
    fn test_player_death_despawns_ring() {
        let mut state = new_state();
        let victim = state.spawn_player(Vec2::ZERO);
        state.player_mut(victim).unwrap().health = 5.0;
        // Attacker ring orbits right through the victim's hitbox
        let attacker = state.spawn_player(Vec2::new(2.5, 0.0));
        state.queue_equip(attacker, 0, "sand").unwrap();
        state.queue_equip(attacker, 1, "sand").unwrap();

        let mut died = false;
        for _ in 0..200 {
            tick(&mut state, 1.0);
            for event in state.drain_events() {
                if let GameEvent::PlayerDied { player, killer } = event {
                    assert_eq!(player, victim);
                    assert_eq!(killer, attacker);
                    died = true;
                }
            }
            if died {
                break;
            }
        }
        assert!(died, "orbiting petals never killed the adjacent player");
        assert!(state.player(victim).is_none());
        // Only the attacker's two sand bunches (8 pieces) remain
        assert_eq!(state.full_petal_snapshot().len(), 8);
    }

    #[test]
    fn test_determinism() {
        fn run() -> GameState {
            let mut state = GameState::new(SimConfig::default(), PetalRegistry::builtin());
            let a = state.spawn_player(Vec2::ZERO);
            let b = state.spawn_player(Vec2::new(1.0, 0.0));
            state.spawn_mob(Vec2::new(-2.0, 0.0), 2.0, 500.0);
            state.queue_equip(a, 0, "basic").unwrap();
            state.queue_equip(a, 1, "sand").unwrap();
            state.queue_equip(b, 0, "rose").unwrap();
            state.queue_equip(b, 1, "stinger").unwrap();
            for i in 0..200u32 {
                if i == 50 {
                    let _ = state.queue_swap(b, 0, 1);
                }
                tick(&mut state, crate::consts::SIM_DT);
            }
            state
        }

        let s1 = run();
        let s2 = run();

        assert_eq!(s1.time_ticks, s2.time_ticks);
        assert_eq!(s1.players.len(), s2.players.len());
        for (p1, p2) in s1.players.iter().zip(&s2.players) {
            assert_eq!(p1.id, p2.id);
            assert_eq!(p1.health, p2.health);
            assert!((p1.inventory.revolution_angle - p2.inventory.revolution_angle).abs() < 1e-6);
        }
        let (snap1, snap2) = (s1.full_petal_snapshot(), s2.full_petal_snapshot());
        assert_eq!(snap1.len(), snap2.len());
        for (a, b) in snap1.iter().zip(&snap2) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.is_reloading, b.is_reloading);
            assert!(a.pos.distance(b.pos) < 1e-6);
        }
    }
}
