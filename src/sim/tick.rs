//! Fixed timestep simulation tick
//!
//! One call runs the whole pipeline atomically:
//! input → spawn → integrate → cull → collide → score → transition.
//! The caller decides whether the run is still `Running`; this function only
//! reports why it ended.

use super::collision::{Outcome, classify, hits_own_body, out_of_bounds};
use super::config::{GameConfig, SpawnCadence};
use super::input::{Direction, TickInput};
use super::integrate::{integrate, nudge_player};
use super::spawn::{cull, maybe_spawn, replenish};
use super::state::{EntityId, GameEvent, OverReason, SimState};

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub events: Vec<GameEvent>,
    /// Set when the run must transition to `Over`
    pub over: Option<OverReason>,
}

/// Advance the state by one fixed timestep
pub fn tick(state: &mut SimState, input: &TickInput, config: &GameConfig, dt: f32) -> TickOutcome {
    let mut out = TickOutcome::default();
    state.tick += 1;

    apply_input(state, input, config, &mut out.events);

    out.events.extend(maybe_spawn(state, config, input.spawn_pulse));
    integrate(state, config, dt);
    out.events.extend(cull(state, config));

    let contacts = classify(&state.player, &state.entities, config);

    // Supports resolve first so a landing wins over a fall in the same tick
    let support = contacts
        .iter()
        .filter(|c| c.outcome == Outcome::Supporting)
        .filter_map(|c| state.entities.get(&c.id).map(|e| (c.id, e.min().y)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    resolve_support(state, support, &mut out.events);

    let mut lethal: Option<EntityId> = None;
    for contact in &contacts {
        match contact.outcome {
            Outcome::Lethal => {
                lethal.get_or_insert(contact.id);
            }
            Outcome::Scoring => {
                // Applied even when a hazard ends the run this tick
                state.entities.remove(&contact.id);
                state.score += contact.points;
                state.pending_growth += config.growth_per_pickup;
                out.events.push(GameEvent::Collected {
                    id: contact.id,
                    kind: contact.kind,
                    points: contact.points,
                });
            }
            Outcome::None | Outcome::Supporting => {}
        }
    }

    if let Some(id) = lethal {
        out.over = Some(OverReason::LethalCollision);
        out.events.push(GameEvent::Lethal { cause: Some(id) });
    } else if out_of_bounds(&state.player, config) {
        out.over = Some(OverReason::OutOfBounds);
        out.events.push(GameEvent::Lethal { cause: None });
    } else if config.self_collision
        && hits_own_body(state.player.pos, &state.segments, state.pending_growth == 0)
    {
        out.over = Some(OverReason::LethalCollision);
        out.events.push(GameEvent::Lethal { cause: None });
    }

    settle_body(state, config);

    if out.over.is_some() {
        return out;
    }

    state.score += config.survival_points;

    if !replenish(state, config, &mut out.events) && !collectible_left(state, config) {
        out.over = Some(OverReason::NoLegalMove);
        return out;
    }

    if let Some(kind) = config.clear_kind {
        if state.count_kind(kind) == 0 {
            out.over = Some(OverReason::AllCollectiblesConsumed);
        }
    }

    out
}

fn apply_input(state: &mut SimState, input: &TickInput, config: &GameConfig, events: &mut Vec<GameEvent>) {
    if let Some(dir) = input.direction {
        steer(state, dir, config);
    }

    if input.jump {
        if let Some(jump_velocity) = config.player.jump_velocity {
            if !config.player.jump_requires_ground || state.grounded {
                state.player.vel.y = jump_velocity;
                state.grounded = false;
                events.push(GameEvent::Jumped);
            }
        }
    }
}

fn steer(state: &mut SimState, dir: Direction, config: &GameConfig) {
    if config.is_grid() {
        if config.reversal_guard && dir.reverses(state.player.vel) {
            return;
        }
        state.player.vel = dir.to_vec2();
    } else if let Some(step) = config.player.lateral_step {
        match dir {
            Direction::Left => nudge_player(&mut state.player, -step, config),
            Direction::Right => nudge_player(&mut state.player, step, config),
            Direction::Up | Direction::Down => {}
        }
    }
}

/// Snap onto the highest supporting top, or lose footing
fn resolve_support(state: &mut SimState, support: Option<(EntityId, f32)>, events: &mut Vec<GameEvent>) {
    match support {
        Some((id, top)) => {
            let player = &mut state.player;
            player.pos.y += top - player.max().y;
            if player.vel.y > 0.0 {
                player.vel.y = 0.0;
            }
            if !state.grounded {
                events.push(GameEvent::Landed { on: id });
            }
            state.grounded = true;
        }
        None => state.grounded = false,
    }
}

/// Drop the vacated tail cell unless the body is still growing
fn settle_body(state: &mut SimState, config: &GameConfig) {
    if !config.player.has_body {
        return;
    }
    if state.pending_growth > 0 {
        state.pending_growth -= 1;
    } else {
        state.segments.pop_back();
    }
}

fn collectible_left(state: &SimState, config: &GameConfig) -> bool {
    config.spawns.iter().any(|rule| {
        matches!(rule.cadence, SpawnCadence::Replenish(_))
            && state.count_kind(rule.template.kind()) > 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP_DT;
    use crate::sim::config::GameKind;
    use crate::sim::state::{Entity, EntityKind, Extent, Motion};
    use glam::Vec2;

    fn run(state: &mut SimState, config: &GameConfig, input: &TickInput) -> TickOutcome {
        tick(state, input, config, STEP_DT)
    }

    #[test]
    fn test_flappy_free_fall() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        assert_eq!(state.player.pos.y, 300.0);

        for _ in 0..20 {
            let out = run(&mut state, &config, &TickInput::default());
            assert_eq!(out.over, None);
        }
        assert_eq!(state.player.vel.y, 10.0);
        assert_eq!(state.player.pos.y, 405.0);
        assert_eq!(state.tick, 20);
    }

    #[test]
    fn test_flappy_jump_sets_velocity() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        let out = run(&mut state, &config, &jump);
        assert!(out.events.contains(&GameEvent::Jumped));
        // Gravity applies after the jump impulse
        assert_eq!(state.player.vel.y, -9.5);
        assert_eq!(state.player.pos.y, 290.5);
    }

    #[test]
    fn test_snake_eats_food() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        state.entities.clear();
        state.insert(Entity::new(0, EntityKind::Food, Vec2::new(11.0, 10.0), Extent::CELL));

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, None);
        assert_eq!(state.player.pos, Vec2::new(11.0, 10.0));
        assert_eq!(state.score, 1);
        assert_eq!(state.body_len(), 2);

        let foods: Vec<&Entity> = state
            .entities
            .values()
            .filter(|e| e.kind == EntityKind::Food)
            .collect();
        assert_eq!(foods.len(), 1);
        let food = foods[0].pos;
        assert_ne!(food, state.player.pos);
        assert!(state.segments.iter().all(|s| *s != food));
    }

    #[test]
    fn test_snake_keeps_length_without_food() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        for _ in 0..3 {
            run(&mut state, &config, &TickInput::default());
        }
        assert_eq!(state.body_len(), 1);
        assert_eq!(state.player.pos, Vec2::new(13.0, 10.0));
    }

    #[test]
    fn test_snake_wall_is_lethal() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        state.player.pos = Vec2::new(19.0, 3.0);
        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, Some(OverReason::OutOfBounds));
    }

    #[test]
    fn test_snake_self_collision() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        // Head at (5,5) heading up into a loop of body cells
        state.player.pos = Vec2::new(5.0, 5.0);
        state.player.vel = Vec2::NEG_Y;
        state.segments = [(5.0, 6.0), (4.0, 6.0), (4.0, 5.0), (4.0, 4.0), (5.0, 4.0), (6.0, 4.0)]
            .into_iter()
            .map(|(x, y)| Vec2::new(x, y))
            .collect();

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, Some(OverReason::LethalCollision));
    }

    #[test]
    fn test_snake_may_follow_its_tail() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        // 2x2 loop: the tail cell is vacated as the head enters it
        state.player.pos = Vec2::new(5.0, 5.0);
        state.player.vel = Vec2::NEG_Y;
        state.segments = [(6.0, 5.0), (6.0, 4.0), (5.0, 4.0)]
            .into_iter()
            .map(|(x, y)| Vec2::new(x, y))
            .collect();

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, None);
        assert_eq!(state.body_len(), 4);
    }

    #[test]
    fn test_reversal_ignored_in_tick() {
        let config = GameKind::Snake.config();
        let mut state = SimState::new(&config, 42, 0);
        let input = TickInput {
            direction: Some(Direction::Left),
            ..Default::default()
        };
        run(&mut state, &config, &input);
        assert_eq!(state.player.pos, Vec2::new(11.0, 10.0));
    }

    #[test]
    fn test_lethal_and_scoring_same_tick() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        let p = state.player.pos;
        state.insert(Entity::new(0, EntityKind::PipeGate, p, Extent::Box(Vec2::new(4.0, 150.0))));
        state.insert(Entity::new(0, EntityKind::Pipe, p, Extent::Box(Vec2::new(60.0, 60.0))));

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(state.score, 1);
        assert_eq!(out.over, Some(OverReason::LethalCollision));
        assert_eq!(state.count_kind(EntityKind::PipeGate), 0);
    }

    #[test]
    fn test_flappy_ceiling_is_lethal() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        state.player.pos.y = 5.0;
        state.player.vel.y = -10.0;
        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, Some(OverReason::OutOfBounds));
    }

    #[test]
    fn test_car_survival_scoring_and_nudge() {
        let config = GameKind::CarRace.config();
        let mut state = SimState::new(&config, 1, 0);
        let left = TickInput {
            direction: Some(Direction::Left),
            ..Default::default()
        };
        run(&mut state, &config, &left);
        run(&mut state, &config, &TickInput::default());
        assert_eq!(state.score, 2);
        assert_eq!(state.player.pos.x, 160.0);
    }

    #[test]
    fn test_car_obstacle_pulse_and_crash() {
        let config = GameKind::CarRace.config();
        let mut state = SimState::new(&config, 1, 0);
        let pulse = TickInput {
            spawn_pulse: true,
            ..Default::default()
        };
        let out = run(&mut state, &config, &pulse);
        assert!(out.events.iter().any(|e| matches!(e, GameEvent::Spawned { .. })));

        // Drop a car right on top of the player
        let p = state.player.pos;
        state.insert(
            Entity::new(0, EntityKind::Obstacle, p - Vec2::new(0.0, 10.0), Extent::Box(Vec2::new(60.0, 60.0)))
                .with_motion(Motion::Linear, Vec2::new(0.0, 5.0)),
        );
        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, Some(OverReason::LethalCollision));
    }

    #[test]
    fn test_platformer_stands_on_ground() {
        let config = GameKind::Platformer.config();
        let mut state = SimState::new(&config, 3, 0);
        for _ in 0..30 {
            let out = run(&mut state, &config, &TickInput::default());
            assert_eq!(out.over, None);
        }
        assert!(state.grounded);
        assert_eq!(state.player.max().y, 390.0);
        assert_eq!(state.player.vel.y, 0.0);
        assert_eq!(state.score, 30);
    }

    #[test]
    fn test_platformer_jump_needs_ground() {
        let config = GameKind::Platformer.config();
        let mut state = SimState::new(&config, 3, 0);
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        // Airborne at start
        let out = run(&mut state, &config, &jump);
        assert!(!out.events.contains(&GameEvent::Jumped));

        for _ in 0..30 {
            run(&mut state, &config, &TickInput::default());
        }
        let out = run(&mut state, &config, &jump);
        assert!(out.events.contains(&GameEvent::Jumped));
        assert!(state.player.vel.y < 0.0);
    }

    #[test]
    fn test_platformer_support_checked_before_fall() {
        let config = GameKind::Platformer.config();
        let mut state = SimState::new(&config, 3, 0);
        state.entities.clear();
        // Platform whose top sits on the bottom edge; the fall would carry the player past it
        let id = state.insert(
            Entity::new(0, EntityKind::Platform, Vec2::new(0.0, 400.0), Extent::Box(Vec2::new(800.0, 20.0))),
        );
        state.player.pos.y = 365.0;
        state.player.vel.y = 40.0;

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, None);
        assert!(out.events.contains(&GameEvent::Landed { on: id }));
        assert_eq!(state.player.max().y, 400.0);
    }

    #[test]
    fn test_platformer_fall_out() {
        let config = GameKind::Platformer.config();
        let mut state = SimState::new(&config, 3, 0);
        state.entities.clear();
        state.player.pos.y = 395.0;
        state.player.vel.y = 10.0;
        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(out.over, Some(OverReason::OutOfBounds));
    }

    #[test]
    fn test_pacman_clears_board() {
        let config = GameKind::Pacman.config();
        let mut state = SimState::new(&config, 3, 0);
        state.entities.retain(|_, e| e.kind != EntityKind::Ghost);
        state.entities.retain(|_, e| e.cell() == glam::IVec2::new(2, 1));

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(state.score, 10);
        assert_eq!(out.over, Some(OverReason::AllCollectiblesConsumed));
    }

    #[test]
    fn test_snake_no_legal_move() {
        let mut config = GameKind::Snake.config();
        config.field = Vec2::new(3.0, 1.0);
        config.player.pos = Vec2::new(1.0, 0.0);
        config.initial.clear();
        let mut state = SimState::new(&config, 3, 0);
        state.segments.push_back(Vec2::new(0.0, 0.0));
        state.insert(Entity::new(0, EntityKind::Food, Vec2::new(2.0, 0.0), Extent::CELL));

        let out = run(&mut state, &config, &TickInput::default());
        assert_eq!(state.score, 1);
        assert_eq!(out.over, Some(OverReason::NoLegalMove));
    }

    #[test]
    fn test_determinism() {
        let config = GameKind::Flappy.config();
        let mut a = SimState::new(&config, 99999, 0);
        let mut b = SimState::new(&config, 99999, 0);

        for i in 0..200 {
            let input = TickInput {
                jump: i % 17 == 0,
                spawn_pulse: i % 120 == 0,
                ..Default::default()
            };
            let oa = run(&mut a, &config, &input);
            let ob = run(&mut b, &config, &input);
            assert_eq!(oa, ob);
        }
        assert_eq!(a.player, b.player);
        assert_eq!(a.entities, b.entities);
    }
}
