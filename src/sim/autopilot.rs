//! Attract-mode player
//!
//! Produces raw input from the current state so a game can play itself
//! (idle screens, the headless demo binary). It only looks at the state; it
//! never mutates it, so runs stay reproducible.

use glam::Vec2;

use super::config::{BoundsPolicy, GameConfig, GameKind};
use super::input::{Direction, KeyCode, RawInput};
use super::state::{Entity, EntityKind, SimState};
use crate::wrap_coord;

/// How far ahead of the car an obstacle counts as a threat (pixels)
const CAR_LOOKAHEAD: f32 = 220.0;

/// Pick the input a simple bot would press this tick, if any
pub fn suggest(state: &SimState, config: &GameConfig) -> Option<RawInput> {
    match config.kind {
        GameKind::Snake | GameKind::Pacman => grid_move(state, config),
        GameKind::Flappy => flap(state, config),
        GameKind::CarRace => dodge(state, config),
        GameKind::Platformer => hop(state),
    }
}

fn key_for(dir: Direction) -> RawInput {
    RawInput::Key(match dir {
        Direction::Up => KeyCode::ArrowUp,
        Direction::Down => KeyCode::ArrowDown,
        Direction::Left => KeyCode::ArrowLeft,
        Direction::Right => KeyCode::ArrowRight,
    })
}

/// Greedy step towards the nearest collectible, avoiding walls, body and ghosts
fn grid_move(state: &SimState, config: &GameConfig) -> Option<RawInput> {
    let head = state.player.pos;
    let heading = state.player.vel;

    let target = state
        .entities
        .values()
        .filter(|e| matches!(e.kind, EntityKind::Food | EntityKind::Pellet))
        .min_by(|a, b| {
            a.pos
                .distance_squared(head)
                .total_cmp(&b.pos.distance_squared(head))
        })
        .map(|e| e.pos);

    let mut options: Vec<(Direction, f32)> = Direction::ALL
        .iter()
        .filter(|d| !(config.reversal_guard && d.reverses(heading)))
        .filter_map(|d| {
            let next = next_cell(head, *d, config);
            if !cell_is_safe(state, config, next) {
                return None;
            }
            let cost = target.map_or(0.0, |t| next.distance_squared(t));
            Some((*d, cost))
        })
        .collect();
    options.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (best, _) = *options.first()?;
    if best.to_vec2() == heading {
        None
    } else {
        Some(key_for(best))
    }
}

fn next_cell(head: Vec2, dir: Direction, config: &GameConfig) -> Vec2 {
    let next = head + dir.to_vec2();
    if config.bounds == BoundsPolicy::Wrap {
        Vec2::new(wrap_coord(next.x, config.field.x), wrap_coord(next.y, config.field.y))
    } else {
        next
    }
}

fn cell_is_safe(state: &SimState, config: &GameConfig, cell: Vec2) -> bool {
    let inside = cell.x >= 0.0 && cell.y >= 0.0 && cell.x < config.field.x && cell.y < config.field.y;
    let on_body = state.segments.iter().any(|s| *s == cell);
    let near_ghost = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::Ghost)
        .any(|g| g.pos.distance_squared(cell) <= 1.0);
    inside && !on_body && !near_ghost
}

/// Flap whenever the bird sinks below the middle of the next gap
fn flap(state: &SimState, config: &GameConfig) -> Option<RawInput> {
    let bird = &state.player;
    let target = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::PipeGate && e.max().x >= bird.min().x)
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
        .map(|gate| gate.min().y + gate.size().y * 0.6)
        .unwrap_or(config.field.y * 0.5);

    if bird.max().y > target && bird.vel.y >= 0.0 {
        Some(RawInput::Key(KeyCode::Space))
    } else {
        None
    }
}

/// Steer out of the lane of the closest oncoming obstacle
fn dodge(state: &SimState, config: &GameConfig) -> Option<RawInput> {
    let car = &state.player;
    let step = config.player.lateral_step?;

    let blocked = |min_x: f32| {
        let max_x = min_x + car.size().x;
        state.entities.values().any(|e| threatens(e, car, min_x, max_x))
    };

    let x = car.min().x;
    if !blocked(x) {
        return None;
    }

    // Prefer the side with more room
    let room_left = x;
    let room_right = config.field.x - car.max().x;
    let sides = if room_left >= room_right {
        [(Direction::Left, -step), (Direction::Right, step)]
    } else {
        [(Direction::Right, step), (Direction::Left, -step)]
    };

    sides
        .iter()
        .find(|(_, dx)| {
            let shifted = (x + dx * 3.0).clamp(0.0, config.field.x - car.size().x);
            shifted != x && !blocked(shifted)
        })
        .map(|(dir, _)| key_for(*dir))
}

fn threatens(obstacle: &Entity, car: &Entity, min_x: f32, max_x: f32) -> bool {
    obstacle.kind == EntityKind::Obstacle
        && obstacle.min().x < max_x
        && obstacle.max().x > min_x
        && obstacle.max().y > car.min().y - CAR_LOOKAHEAD
        && obstacle.min().y < car.max().y
}

/// Jump when the platform underfoot is about to run out
fn hop(state: &SimState) -> Option<RawInput> {
    if !state.grounded {
        return None;
    }
    let player = &state.player;
    let feet = player.max().y;

    let ledge_end = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::Platform)
        .filter(|e| (e.min().y - feet).abs() < 1.0)
        .filter(|e| e.min().x < player.max().x && e.max().x > player.min().x)
        .map(|e| e.max().x)
        .fold(f32::NEG_INFINITY, f32::max);

    if ledge_end < player.max().x + player.size().x {
        Some(RawInput::Key(KeyCode::Space))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Extent;

    #[test]
    fn test_snake_turns_towards_food() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 1, 0);
        state.entities.clear();
        state.insert(Entity::new(0, EntityKind::Food, Vec2::new(10.0, 3.0), Extent::CELL));

        assert_eq!(suggest(&state, &config), Some(RawInput::Key(KeyCode::ArrowUp)));
    }

    #[test]
    fn test_snake_keeps_heading_when_aligned() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 1, 0);
        state.entities.clear();
        state.insert(Entity::new(0, EntityKind::Food, Vec2::new(15.0, 10.0), Extent::CELL));
        assert_eq!(suggest(&state, &config), None);
    }

    #[test]
    fn test_snake_avoids_wall() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 1, 0);
        state.entities.clear();
        state.player.pos = Vec2::new(19.0, 0.0);
        let input = suggest(&state, &config);
        assert_eq!(input, Some(RawInput::Key(KeyCode::ArrowDown)));
    }

    #[test]
    fn test_flappy_flaps_when_low() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        state.player.pos.y = 500.0;
        assert_eq!(suggest(&state, &config), Some(RawInput::Key(KeyCode::Space)));
        state.player.pos.y = 100.0;
        assert_eq!(suggest(&state, &config), None);
    }

    #[test]
    fn test_car_dodges() {
        let config = GameKind::CarRace.config();
        let mut state = SimState::new(&config, 1, 0);
        assert_eq!(suggest(&state, &config), None);

        let car = state.player.pos;
        state.insert(Entity::new(
            0,
            EntityKind::Obstacle,
            car - Vec2::new(10.0, 150.0),
            Extent::Box(Vec2::new(60.0, 60.0)),
        ));
        assert!(suggest(&state, &config).is_some());
    }

    #[test]
    fn test_platformer_waits_until_grounded() {
        let config = GameKind::Platformer.config();
        let state = SimState::new(&config, 1, 0);
        assert_eq!(suggest(&state, &config), None);
    }
}
