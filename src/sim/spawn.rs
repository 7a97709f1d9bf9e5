//! Spawning and culling
//!
//! Spawn rules fire on a tick count, on spawn-clock pulses, when the live
//! count of a kind drops below a minimum, or right after collectibles are
//! consumed. Positions are drawn from the run's seeded RNG and are never
//! placed on top of the player. Entities that scroll past the trailing edge
//! are filtered out every tick.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::collision::overlaps;
use super::config::{GameConfig, SpawnCadence, SpawnTemplate};
use super::state::{Entity, EntityKind, EntityMeta, Extent, GameEvent, Motion, SimState};
use crate::consts::SPAWN_REROLLS;

/// Width of the scoring strip placed at the trailing edge of a pipe gap
pub const GATE_WIDTH: f32 = 4.0;

/// Place the initial world for a fresh run
pub fn populate(state: &mut SimState, config: &GameConfig) {
    for initial in &config.initial {
        let entity = Entity::new(0, initial.kind, initial.pos, initial.extent)
            .with_motion(initial.motion, initial.vel)
            .with_meta(EntityMeta {
                color: initial.color,
                lane: None,
            });
        state.insert(entity);
    }

    if let Some(kind) = config.fill_grid {
        let player_cell = state.player.cell();
        let grid = config.grid_size();
        for y in 0..grid.y {
            for x in 0..grid.x {
                let cell = IVec2::new(x, y);
                if cell != player_cell {
                    state.insert(Entity::new(0, kind, cell.as_vec2(), Extent::CELL));
                }
            }
        }
    }

    log::debug!(
        "Populated {:?} with {} entities",
        config.kind,
        state.entities.len()
    );
}

/// Run the tick-driven spawn rules. `pulse` is true when a spawn-clock pulse is due.
pub fn maybe_spawn(state: &mut SimState, config: &GameConfig, pulse: bool) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for (index, rule) in config.spawns.iter().enumerate() {
        let due = match rule.cadence {
            SpawnCadence::EveryTicks(interval) => {
                let elapsed = &mut state.spawn_elapsed[index];
                *elapsed += 1;
                if *elapsed >= interval.max(1) {
                    *elapsed = 0;
                    true
                } else {
                    false
                }
            }
            SpawnCadence::Clock { .. } => pulse,
            SpawnCadence::MinLive(min) => state.count_kind(rule.template.kind()) < min,
            // Handled after scoring
            SpawnCadence::Replenish(_) => false,
        };

        if due {
            events.extend(spawn_from_template(state, config, &rule.template));
        }
    }

    events
}

/// Refill collectibles consumed this tick.
///
/// Returns false if a refill was needed but no legal cell was free.
pub fn replenish(state: &mut SimState, config: &GameConfig, events: &mut Vec<GameEvent>) -> bool {
    let mut placed_all = true;

    for rule in &config.spawns {
        let SpawnCadence::Replenish(count) = rule.cadence else {
            continue;
        };
        while state.count_kind(rule.template.kind()) < count {
            let spawned = spawn_from_template(state, config, &rule.template);
            if spawned.is_empty() {
                placed_all = false;
                break;
            }
            events.extend(spawned);
        }
    }

    placed_all
}

/// Create entities from a template. Returns no events if no legal spot was found.
pub fn spawn_from_template(
    state: &mut SimState,
    config: &GameConfig,
    template: &SpawnTemplate,
) -> Vec<GameEvent> {
    let batch = match template {
        SpawnTemplate::GridCell { kind } => free_cell(state, config).map(|cell| {
            vec![Entity::new(0, *kind, cell.as_vec2(), Extent::CELL)]
        }),
        _ => reroll(state, |state| roll_template(state, config, template)),
    };

    let Some(batch) = batch else {
        log::debug!("No legal spawn point for {:?}, skipping", template.kind());
        return Vec::new();
    };

    batch
        .into_iter()
        .map(|entity| {
            let kind = entity.kind;
            let id = state.insert(entity);
            GameEvent::Spawned { id, kind }
        })
        .collect()
}

/// Retry a random placement until no piece overlaps the player
fn reroll<F>(state: &mut SimState, mut roll: F) -> Option<Vec<Entity>>
where
    F: FnMut(&mut SimState) -> Vec<Entity>,
{
    for _ in 0..SPAWN_REROLLS {
        let batch = roll(state);
        if !batch.iter().any(|e| overlaps(&state.player, e)) {
            return Some(batch);
        }
    }
    None
}

fn roll_template(state: &mut SimState, config: &GameConfig, template: &SpawnTemplate) -> Vec<Entity> {
    let field = config.field;
    let rng = &mut state.rng;

    match template {
        SpawnTemplate::LaneObstacle {
            lanes,
            size,
            speed,
            colors,
        } => {
            let lanes = (*lanes).max(1);
            let lane = rng.random_range(0..lanes);
            let lane_width = field.x / lanes as f32;
            let x = lane_width * lane as f32 + lane_width / 2.0 - size.x / 2.0;
            let color = if colors.is_empty() {
                None
            } else {
                Some(colors[rng.random_range(0..colors.len())])
            };

            vec![
                Entity::new(0, EntityKind::Obstacle, Vec2::new(x, -size.y), Extent::Box(*size))
                    .with_motion(Motion::Linear, Vec2::new(0.0, *speed))
                    .with_meta(EntityMeta {
                        color,
                        lane: Some(lane),
                    }),
            ]
        }
        SpawnTemplate::PipePair {
            width,
            gap,
            margin,
            speed,
        } => {
            let span = (field.y - gap - 2.0 * margin).max(0.0);
            let top = rng.random::<f32>() * span + margin;
            let vel = Vec2::new(-speed, 0.0);
            let bottom_y = top + gap;

            vec![
                Entity::new(0, EntityKind::Pipe, Vec2::new(field.x, 0.0), Extent::Box(Vec2::new(*width, top)))
                    .with_motion(Motion::Linear, vel),
                Entity::new(
                    0,
                    EntityKind::Pipe,
                    Vec2::new(field.x, bottom_y),
                    Extent::Box(Vec2::new(*width, field.y - bottom_y)),
                )
                .with_motion(Motion::Linear, vel),
                Entity::new(
                    0,
                    EntityKind::PipeGate,
                    Vec2::new(field.x + width - GATE_WIDTH, top),
                    Extent::Box(Vec2::new(GATE_WIDTH, *gap)),
                )
                .with_motion(Motion::Linear, vel),
            ]
        }
        SpawnTemplate::Platform { size, min_y, speed } => {
            let y = if *min_y < field.y {
                rng.random_range(*min_y..field.y)
            } else {
                *min_y
            };
            vec![
                Entity::new(0, EntityKind::Platform, Vec2::new(field.x, y), Extent::Box(*size))
                    .with_motion(Motion::Linear, Vec2::new(-speed, 0.0)),
            ]
        }
        SpawnTemplate::GridCell { kind } => {
            // Grid spawns enumerate free cells instead of rerolling
            let cell = IVec2::new(
                rng.random_range(0..config.grid_size().x.max(1)),
                rng.random_range(0..config.grid_size().y.max(1)),
            );
            vec![Entity::new(0, *kind, cell.as_vec2(), Extent::CELL)]
        }
    }
}

/// Uniformly chosen cell not held by the player, its body or any entity
pub fn free_cell(state: &mut SimState, config: &GameConfig) -> Option<IVec2> {
    let grid = config.grid_size();
    let occupied = |cell: IVec2| {
        state.player.cell() == cell
            || state.segments.iter().any(|s| s.round().as_ivec2() == cell)
            || state.entities.values().any(|e| e.cell() == cell)
    };

    let free: Vec<IVec2> = (0..grid.y)
        .flat_map(|y| (0..grid.x).map(move |x| IVec2::new(x, y)))
        .filter(|cell| !occupied(*cell))
        .collect();

    if free.is_empty() {
        return None;
    }
    let index = state.rng.random_range(0..free.len());
    Some(free[index])
}

/// Remove entities that are fully outside the field and still moving away from it
pub fn cull(state: &mut SimState, config: &GameConfig) -> Vec<GameEvent> {
    let field = config.field;
    let mut culled = Vec::new();

    state.entities.retain(|id, e| {
        let min = e.min();
        let max = e.max();
        let gone = (max.x <= 0.0 && e.vel.x < 0.0)
            || (min.x >= field.x && e.vel.x > 0.0)
            || (max.y <= 0.0 && e.vel.y < 0.0)
            || (min.y >= field.y && e.vel.y > 0.0);
        if gone {
            culled.push(GameEvent::Culled { id: *id });
        }
        !gone
    });

    if !culled.is_empty() {
        log::debug!("Culled {} entities", culled.len());
    }
    culled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::{GameKind, SpawnRule};

    #[test]
    fn test_pacman_grid_filled() {
        let config = GameKind::Pacman.config();
        let state = SimState::new(&config, 1, 0);
        assert_eq!(state.count_kind(EntityKind::Pellet), 20 * 20 - 1);
        assert_eq!(state.count_kind(EntityKind::Ghost), 4);
        assert!(
            state
                .entities
                .values()
                .all(|e| e.kind != EntityKind::Pellet || e.cell() != IVec2::new(1, 1))
        );
    }

    #[test]
    fn test_every_ticks_cadence() {
        let mut config = GameKind::CarRace.config();
        config.spawns[0].cadence = SpawnCadence::EveryTicks(10);
        let mut state = SimState::new(&config, 9, 0);

        let mut spawned = 0;
        for _ in 0..100 {
            spawned += maybe_spawn(&mut state, &config, false).len();
        }
        assert_eq!(spawned, 10);
    }

    #[test]
    fn test_clock_cadence_waits_for_pulse() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 9, 0);
        assert!(maybe_spawn(&mut state, &config, false).is_empty());

        let events = maybe_spawn(&mut state, &config, true);
        // Two pipe bodies and a gate
        assert_eq!(events.len(), 3);
        assert_eq!(state.count_kind(EntityKind::Pipe), 2);
        assert_eq!(state.count_kind(EntityKind::PipeGate), 1);
    }

    #[test]
    fn test_pipe_gap_within_margins() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 123, 0);
        for _ in 0..50 {
            maybe_spawn(&mut state, &config, true);
        }
        for gate in state.entities.values().filter(|e| e.kind == EntityKind::PipeGate) {
            assert!(gate.pos.y >= 50.0);
            assert!(gate.pos.y + gate.size().y <= 600.0 - 50.0);
        }
    }

    #[test]
    fn test_lane_positions() {
        let config = GameKind::CarRace.config();
        let mut state = SimState::new(&config, 4, 0);
        for _ in 0..30 {
            maybe_spawn(&mut state, &config, true);
        }
        for car in state.entities.values() {
            let lane = car.meta.lane.unwrap();
            let expected = (400.0 / 3.0) * lane as f32 + 400.0 / 6.0 - 30.0;
            assert!((car.pos.x - expected).abs() < 0.001);
            assert_eq!(car.pos.y, -60.0);
            assert!(car.meta.color.is_some());
        }
    }

    #[test]
    fn test_min_live_tops_up_one_per_tick() {
        let config = GameKind::Platformer.config();
        let mut state = SimState::new(&config, 2, 0);
        assert_eq!(state.count_kind(EntityKind::Platform), 4);

        maybe_spawn(&mut state, &config, false);
        assert_eq!(state.count_kind(EntityKind::Platform), 5);
        maybe_spawn(&mut state, &config, false);
        assert_eq!(state.count_kind(EntityKind::Platform), 5);
    }

    #[test]
    fn test_spawn_avoids_player() {
        let mut config = GameKind::CarRace.config();
        config.spawns = vec![SpawnRule {
            cadence: SpawnCadence::EveryTicks(1),
            template: SpawnTemplate::Platform {
                size: Vec2::new(100.0, 20.0),
                min_y: 100.0,
                speed: 2.0,
            },
        }];
        let mut state = SimState::new(&config, 2, 0);
        // Player sits exactly where every platform would appear
        state.player.pos = Vec2::new(390.0, 0.0);
        state.player.extent = Extent::Box(Vec2::new(50.0, 1000.0));

        let events = maybe_spawn(&mut state, &config, false);
        assert!(events.is_empty());
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_free_cell_excludes_body() {
        let mut config = GameKind::Snake.config();
        config.field = Vec2::new(2.0, 2.0);
        config.initial.clear();
        let mut state = SimState::new(&config, 1, 0);
        state.player.pos = Vec2::new(0.0, 0.0);
        state.segments.push_back(Vec2::new(1.0, 0.0));
        state.segments.push_back(Vec2::new(1.0, 1.0));

        assert_eq!(free_cell(&mut state, &config), Some(IVec2::new(0, 1)));

        state.segments.push_back(Vec2::new(0.0, 1.0));
        assert_eq!(free_cell(&mut state, &config), None);
    }

    #[test]
    fn test_cull_trailing_edge_only() {
        let config = GameKind::Flappy.config();
        let mut state = SimState::new(&config, 1, 0);
        maybe_spawn(&mut state, &config, true);
        // Fresh pipes sit beyond the right edge but move inward
        assert!(cull(&mut state, &config).is_empty());

        for e in state.entities.values_mut() {
            e.pos.x = -61.0;
        }
        assert_eq!(cull(&mut state, &config).len(), 3);
        assert!(state.entities.is_empty());
    }
}
