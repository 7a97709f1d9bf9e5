//! Kinematics: advance every entity one tick
//!
//! Continuous entities move by `vel * dt`, with gravity added to the player's
//! velocity before the position update. Grid entities move exactly one cell.
//! Wrap-around fields use modulo arithmetic; clamped fields keep the player
//! inside the field.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::config::{BoundsPolicy, GameConfig};
use super::input::Direction;
use super::state::{Entity, Motion, SimState};
use crate::{clamp_coord, wrap_coord};

/// Advance the player and all entities by one tick
pub fn integrate(state: &mut SimState, config: &GameConfig, dt: f32) {
    integrate_player(state, config, dt);

    let rng = &mut state.rng;
    for entity in state.entities.values_mut() {
        entity.prev_pos = entity.pos;
        step_entity(entity, config, dt, rng);
    }
}

fn integrate_player(state: &mut SimState, config: &GameConfig, dt: f32) {
    let player = &mut state.player;
    player.prev_pos = player.pos;

    match player.motion {
        Motion::Static => {}
        Motion::Linear => {
            player.vel.y += config.gravity * dt;
            player.pos += player.vel * dt;
        }
        Motion::GridStep | Motion::GridWander => {
            if config.player.has_body {
                // Old head becomes the first body segment; the tail is settled after scoring
                state.segments.push_front(player.pos);
            }
            player.pos += player.heading().as_vec2();
        }
    }

    apply_bounds(player, config);
}

fn step_entity(entity: &mut Entity, config: &GameConfig, dt: f32, rng: &mut Pcg32) {
    match entity.motion {
        Motion::Static => {}
        Motion::Linear => {
            entity.pos += entity.vel * dt;
        }
        Motion::GridStep => {
            entity.pos += entity.heading().as_vec2();
            if config.bounds == BoundsPolicy::Wrap {
                entity.pos = wrap_position(entity.pos, config.field);
            }
        }
        Motion::GridWander => {
            let next = entity.pos + entity.heading().as_vec2();
            if inside_grid(next, config.field) {
                entity.pos = next;
            } else {
                // Stay in place this tick and turn
                let dir = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
                entity.vel = dir.to_vec2();
            }
        }
    }
}

fn apply_bounds(player: &mut Entity, config: &GameConfig) {
    match config.bounds {
        BoundsPolicy::Wrap => {
            player.pos = wrap_position(player.pos, config.field);
        }
        BoundsPolicy::Clamp => {
            let size = player.size();
            let min = player.min();
            let offset = player.pos - min;
            let clamped = Vec2::new(
                clamp_coord(min.x, size.x, config.field.x),
                clamp_coord(min.y, size.y, config.field.y),
            );
            player.pos = clamped + offset;
        }
        // Lethal and fall-out bounds are judged by the collision pass
        BoundsPolicy::Lethal | BoundsPolicy::FallOut => {}
    }
}

/// Wrap a position into `[0, field)` on both axes
#[inline]
pub fn wrap_position(pos: Vec2, field: Vec2) -> Vec2 {
    Vec2::new(wrap_coord(pos.x, field.x), wrap_coord(pos.y, field.y))
}

#[inline]
fn inside_grid(cell: Vec2, field: Vec2) -> bool {
    cell.x >= 0.0 && cell.y >= 0.0 && cell.x < field.x && cell.y < field.y
}

/// Horizontal nudge for lane-style steering, clamped to the field
pub fn nudge_player(player: &mut Entity, dx: f32, config: &GameConfig) {
    player.pos.x += dx;
    let min = player.min();
    let offset = player.pos.x - min.x;
    player.pos.x = clamp_coord(min.x, player.size().x, config.field.x) + offset;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::GameKind;
    use crate::sim::state::{EntityKind, Extent};
    use proptest::prelude::*;

    #[test]
    fn test_gravity_before_position() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        state.player.pos.y = 300.0;

        integrate(&mut state, &config, 1.0);
        assert_eq!(state.player.vel.y, 0.5);
        assert_eq!(state.player.pos.y, 300.5);
        assert_eq!(state.player.prev_pos.y, 300.0);
    }

    #[test]
    fn test_grid_step_moves_one_cell() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 1, 0);

        integrate(&mut state, &config, 1.0);
        assert_eq!(state.player.pos, Vec2::new(11.0, 10.0));
        assert_eq!(state.segments.front(), Some(&Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_pacman_wraps() {
        let config = GameKind::Pacman.config();
        let mut state = SimState::new(&config, 1, 0);
        state.player.pos = Vec2::new(19.0, 3.0);

        integrate(&mut state, &config, 1.0);
        assert_eq!(state.player.pos, Vec2::new(0.0, 3.0));

        state.player.vel = Vec2::NEG_Y;
        state.player.pos = Vec2::new(4.0, 0.0);
        integrate(&mut state, &config, 1.0);
        assert_eq!(state.player.pos, Vec2::new(4.0, 19.0));
    }

    #[test]
    fn test_ghost_turns_at_edge() {
        let config = GameKind::Pacman.config();
        let mut state = SimState::new(&config, 3, 0);
        let ghost_id = state
            .entities
            .values()
            .find(|e| e.kind == EntityKind::Ghost)
            .map(|e| e.id)
            .unwrap();
        {
            let ghost = state.entities.get_mut(&ghost_id).unwrap();
            ghost.pos = Vec2::new(0.0, 7.0);
            ghost.vel = Vec2::NEG_X;
        }

        integrate(&mut state, &config, 1.0);
        let ghost = &state.entities[&ghost_id];
        assert_eq!(ghost.pos, Vec2::new(0.0, 7.0));
        assert_eq!(ghost.vel.length(), 1.0);
    }

    #[test]
    fn test_nudge_clamps() {
        let config = GameKind::CarRace.config();
        let mut car = Entity::new(0, EntityKind::Player, Vec2::new(10.0, 520.0), Extent::Box(Vec2::new(40.0, 60.0)));
        nudge_player(&mut car, -20.0, &config);
        assert_eq!(car.pos.x, 0.0);
        car.pos.x = 350.0;
        nudge_player(&mut car, 20.0, &config);
        assert_eq!(car.pos.x, 360.0);
    }

    proptest! {
        #[test]
        fn prop_wrapped_player_stays_in_field(x in -100i32..100, y in -100i32..100, dir in 0usize..4) {
            let config = GameKind::Pacman.config();
            let mut state = SimState::new(&config, 5, 0);
            state.player.pos = Vec2::new(x as f32, y as f32);
            state.player.vel = Direction::ALL[dir].to_vec2();

            integrate(&mut state, &config, 1.0);
            let p = state.player.pos;
            prop_assert!(p.x >= 0.0 && p.x < config.field.x);
            prop_assert!(p.y >= 0.0 && p.y < config.field.y);
        }

        #[test]
        fn prop_clamped_player_stays_in_field(x in -1000.0f32..1000.0, vx in -50.0f32..50.0, vy in -50.0f32..50.0) {
            let mut config = GameKind::CarRace.config();
            config.player.motion = crate::sim::state::Motion::Linear;
            let mut state = SimState::new(&config, 5, 0);
            state.player.pos.x = x;
            state.player.vel = Vec2::new(vx, vy);

            integrate(&mut state, &config, 1.0);
            let max = state.player.max();
            prop_assert!(state.player.pos.x >= 0.0 && state.player.pos.y >= 0.0);
            prop_assert!(max.x <= config.field.x && max.y <= config.field.y);
        }
    }
}
