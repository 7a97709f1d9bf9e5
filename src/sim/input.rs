//! Raw input to abstract intents
//!
//! Raw key/pointer events arrive at any time between ticks. The mapper filters
//! them by game status, drops illegal reversals and collapses everything
//! received since the previous tick into one [`TickInput`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::state::GameStatus;

/// Logical key names understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
}

impl KeyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::Space => "Space",
            KeyCode::Enter => "Enter",
        }
    }

    /// Parse a DOM-style key or code name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" | "Up" => Some(KeyCode::ArrowUp),
            "ArrowDown" | "Down" => Some(KeyCode::ArrowDown),
            "ArrowLeft" | "Left" => Some(KeyCode::ArrowLeft),
            "ArrowRight" | "Right" => Some(KeyCode::ArrowRight),
            "Space" | " " | "Spacebar" => Some(KeyCode::Space),
            "Enter" => Some(KeyCode::Enter),
            _ => None,
        }
    }
}

/// A raw event from the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawInput {
    Key(KeyCode),
    /// Click or tap anywhere
    Pointer,
}

/// Screen-space direction (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn to_vec2(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::NEG_Y,
            Direction::Down => Vec2::Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// True if moving this way would reverse `heading`
    pub fn reverses(&self, heading: Vec2) -> bool {
        let unit = Vec2::new(axis_sign(heading.x), axis_sign(heading.y));
        unit != Vec2::ZERO && self.to_vec2() == -unit
    }
}

fn axis_sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Abstract player intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Jump,
    Start,
    Restart,
}

impl Intent {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Intent::MoveUp => Some(Direction::Up),
            Intent::MoveDown => Some(Direction::Down),
            Intent::MoveLeft => Some(Direction::Left),
            Intent::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Most recent legal direction since the previous tick
    pub direction: Option<Direction>,
    /// Jump requested since the previous tick
    pub jump: bool,
    /// A spawn-clock pulse is due this tick
    pub spawn_pulse: bool,
}

/// Filters and collapses raw input between ticks
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    reversal_guard: bool,
    can_jump: bool,
    pending_direction: Option<Direction>,
    pending_jump: bool,
    pending_control: Option<Intent>,
}

impl InputMapper {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            reversal_guard: config.reversal_guard,
            can_jump: config.player.jump_velocity.is_some(),
            ..Default::default()
        }
    }

    /// Translate a raw event given the current status, without filtering reversals
    pub fn map(&self, raw: RawInput, status: GameStatus) -> Option<Intent> {
        match status {
            GameStatus::Idle => Some(Intent::Start),
            GameStatus::Over => match raw {
                RawInput::Key(KeyCode::Space | KeyCode::Enter) | RawInput::Pointer => {
                    Some(Intent::Restart)
                }
                // Arrow keys held through a death must not restart
                _ => None,
            },
            GameStatus::Running => match raw {
                RawInput::Key(KeyCode::ArrowUp) => Some(Intent::MoveUp),
                RawInput::Key(KeyCode::ArrowDown) => Some(Intent::MoveDown),
                RawInput::Key(KeyCode::ArrowLeft) => Some(Intent::MoveLeft),
                RawInput::Key(KeyCode::ArrowRight) => Some(Intent::MoveRight),
                RawInput::Key(KeyCode::Space) | RawInput::Pointer if self.can_jump => {
                    Some(Intent::Jump)
                }
                _ => None,
            },
        }
    }

    /// Accept a raw event. `heading` is the player's current travel direction.
    ///
    /// Returns the intent that was recorded, if any.
    pub fn push(&mut self, raw: RawInput, status: GameStatus, heading: Vec2) -> Option<Intent> {
        let intent = self.map(raw, status)?;

        match intent {
            Intent::Start | Intent::Restart => {
                self.pending_control = Some(intent);
            }
            Intent::Jump => {
                self.pending_jump = true;
            }
            _ => {
                let dir = intent.direction()?;
                if self.reversal_guard && dir.reverses(heading) {
                    log::debug!("Dropped reversal {:?}", dir);
                    return None;
                }
                self.pending_direction = Some(dir);
            }
        }

        Some(intent)
    }

    /// Take a pending Start/Restart
    pub fn take_control(&mut self) -> Option<Intent> {
        self.pending_control.take()
    }

    /// Collapse everything pending into this tick's input
    pub fn drain(&mut self) -> TickInput {
        TickInput {
            direction: self.pending_direction.take(),
            jump: std::mem::take(&mut self.pending_jump),
            spawn_pulse: false,
        }
    }

    /// Forget everything pending
    pub fn clear(&mut self) {
        self.pending_direction = None;
        self.pending_jump = false;
        self.pending_control = None;
    }
}
