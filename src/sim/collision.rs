//! Collision detection and classification
//!
//! Shapes are axis-aligned boxes or circles. Every non-player entity is
//! classified against the player as `None`, `Lethal`, `Scoring` or
//! `Supporting` using the game's collision rules. Positions read here are
//! always post-integration.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::config::{BoundsPolicy, GameConfig};
use super::state::{Entity, EntityId, EntityKind, Extent};

/// Collision class of a player/entity pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    None,
    /// Hazard: ends the run
    Lethal,
    /// Collectible: removed and scored
    Scoring,
    /// Platform landed on from above
    Supporting,
}

/// Classification of one entity against the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub id: EntityId,
    pub kind: EntityKind,
    pub outcome: Outcome,
    /// Points awarded for a scoring contact
    pub points: u64,
}

/// Strict axis-aligned box overlap (touching edges do not overlap)
#[inline]
pub fn aabb_overlap(a_min: Vec2, a_size: Vec2, b_min: Vec2, b_size: Vec2) -> bool {
    a_min.x < b_min.x + b_size.x
        && a_min.x + a_size.x > b_min.x
        && a_min.y < b_min.y + b_size.y
        && a_min.y + a_size.y > b_min.y
}

/// Check if two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    a.distance_squared(b) < combined * combined
}

/// Box vs circle via the closest point on the box
#[inline]
pub fn box_circle_overlap(box_min: Vec2, box_size: Vec2, center: Vec2, radius: f32) -> bool {
    let closest = center.clamp(box_min, box_min + box_size);
    center.distance_squared(closest) < radius * radius
}

/// Shape overlap between two entities
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    match (a.extent, b.extent) {
        (Extent::Box(sa), Extent::Box(sb)) => aabb_overlap(a.pos, sa, b.pos, sb),
        (Extent::Circle(ra), Extent::Circle(rb)) => circles_overlap(a.pos, ra, b.pos, rb),
        (Extent::Box(sa), Extent::Circle(rb)) => box_circle_overlap(a.pos, sa, b.pos, rb),
        (Extent::Circle(ra), Extent::Box(sb)) => box_circle_overlap(b.pos, sb, a.pos, ra),
    }
}

/// Player overlaps `platform` and its bottom edge was at or above the platform top last tick
pub fn lands_on(player: &Entity, platform: &Entity) -> bool {
    overlaps(player, platform) && player.prev_bottom() <= platform.min().y
}

/// Grid pass-through: player and other exchanged cells during this tick
pub fn swapped_cells(player: &Entity, other: &Entity) -> bool {
    let player_prev = player.prev_pos.round();
    let other_prev = other.prev_pos.round();
    player_prev != player.pos.round()
        && player.pos.round() == other_prev
        && player_prev == other.pos.round()
}

/// Classify every other entity against the player
pub fn classify(
    player: &Entity,
    others: &BTreeMap<EntityId, Entity>,
    config: &GameConfig,
) -> Vec<Contact> {
    others
        .values()
        .filter(|other| other.id != player.id)
        .map(|other| {
            let (rule, points) = config.rule_for(other.kind);
            let outcome = match rule {
                Outcome::None => Outcome::None,
                Outcome::Supporting => {
                    if lands_on(player, other) {
                        Outcome::Supporting
                    } else {
                        Outcome::None
                    }
                }
                Outcome::Lethal => {
                    let swapped = config.is_grid() && swapped_cells(player, other);
                    if swapped || overlaps(player, other) {
                        Outcome::Lethal
                    } else {
                        Outcome::None
                    }
                }
                Outcome::Scoring => {
                    if overlaps(player, other) {
                        Outcome::Scoring
                    } else {
                        Outcome::None
                    }
                }
            };
            Contact {
                id: other.id,
                kind: other.kind,
                outcome,
                points: if outcome == Outcome::Scoring { points } else { 0 },
            }
        })
        .collect()
}

/// Player has left the field in a way the bounds policy treats as lethal
pub fn out_of_bounds(player: &Entity, config: &GameConfig) -> bool {
    let min = player.min();
    let max = player.max();
    match config.bounds {
        BoundsPolicy::Lethal => {
            min.x < 0.0 || min.y < 0.0 || max.x > config.field.x || max.y > config.field.y
        }
        BoundsPolicy::FallOut => min.y > config.field.y,
        BoundsPolicy::Wrap | BoundsPolicy::Clamp => false,
    }
}

/// Head entered one of the trailing segments.
///
/// The last segment is skipped when it is about to be vacated this tick.
pub fn hits_own_body(head: Vec2, segments: &VecDeque<Vec2>, tail_vacates: bool) -> bool {
    let checked = if tail_vacates {
        segments.len().saturating_sub(1)
    } else {
        segments.len()
    };
    segments.iter().take(checked).any(|s| s.round() == head.round())
}
