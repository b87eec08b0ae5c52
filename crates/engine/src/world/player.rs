use crate::geometry::Vec2;

use super::animation::{AnimationError, Direction, SpriteSheet};
use super::entity::Entity;

/// Raw directional key state for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

/// Axes the player is currently committed to, carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementFlags {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    fn horizontal(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCharacter {
    entity: Entity,
    flags: MovementFlags,
    running: bool,
}

impl PlayerCharacter {
    pub fn new(sheet: SpriteSheet) -> Result<Self, AnimationError> {
        Ok(Self {
            entity: Entity::new(sheet, Direction::Down, Vec2::ZERO)?,
            flags: MovementFlags::default(),
            running: false,
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    pub fn flags(&self) -> MovementFlags {
        self.flags
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_moving(&self) -> bool {
        self.flags.any()
    }

    /// Resolves velocity and facing from key state.
    ///
    /// Each axis keeps the key that was committed first: a held `down` blocks
    /// `up` until the vertical axis is released, and likewise `left` blocks
    /// `right`. The checks read the flags as they were before this call.
    /// Horizontal movement always sets facing; vertical movement only does so
    /// while no horizontal flag is set.
    pub fn apply_input(&mut self, input: MovementInput, base_speed: f32, run_multiplier: f32) {
        self.running = input.run;
        let speed = if input.run {
            base_speed * run_multiplier
        } else {
            base_speed
        };
        let horizontal_before = self.flags.horizontal();

        if input.up && !self.flags.down {
            self.entity.set_velocity_y(-speed);
            self.flags.up = true;
            if !horizontal_before {
                self.entity.set_direction(Direction::Up);
            }
        } else if input.down && !self.flags.up {
            self.entity.set_velocity_y(speed);
            self.flags.down = true;
            if !horizontal_before {
                self.entity.set_direction(Direction::Down);
            }
        } else {
            self.entity.set_velocity_y(0.0);
            self.flags.up = false;
            self.flags.down = false;
        }

        if input.left && !self.flags.right {
            self.entity.set_velocity_x(-speed);
            self.flags.left = true;
            self.entity.set_direction(Direction::Left);
        } else if input.right && !self.flags.left {
            self.entity.set_velocity_x(speed);
            self.flags.right = true;
            self.entity.set_direction(Direction::Right);
        } else {
            self.entity.set_velocity_x(0.0);
            self.flags.left = false;
            self.flags.right = false;
        }
    }

    pub fn reset_movement(&mut self) {
        self.flags = MovementFlags::default();
        self.running = false;
    }
}
