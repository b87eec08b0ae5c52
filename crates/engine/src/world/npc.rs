use crate::geometry::Vec2;

use super::animation::{AnimationError, Direction, SpriteSheet};
use super::entity::Entity;

pub const NPC_MOVE_SPEED: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    entity: Entity,
    name: String,
    moving_direction: Option<Direction>,
    lines: Vec<String>,
}

impl Npc {
    pub fn new(
        name: impl Into<String>,
        sheet: SpriteSheet,
        facing: Direction,
        moving_direction: Option<Direction>,
        lines: Vec<String>,
        position: Vec2,
    ) -> Result<Self, AnimationError> {
        Ok(Self {
            entity: Entity::new(sheet, facing, position)?,
            name: name.into(),
            moving_direction,
            lines,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn moving_direction(&self) -> Option<Direction> {
        self.moving_direction
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    /// Drives velocity and animation from the scripted direction. Facing is
    /// left as configured.
    pub fn apply_script(&mut self, speed: f32) {
        match self.moving_direction {
            Some(direction) => {
                let unit = direction.unit();
                self.entity.set_velocity(unit.x * speed, unit.y * speed);
                self.entity.set_paused(false);
            }
            None => {
                self.entity.set_velocity(0.0, 0.0);
                self.entity.set_paused(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc(moving_direction: Option<Direction>) -> Npc {
        let sheet = SpriteSheet::from_image_size("elder.png", 256, 128).expect("sheet");
        Npc::new(
            "Elder",
            sheet,
            Direction::Left,
            moving_direction,
            vec!["Hello.".to_string()],
            Vec2::new(40.0, 40.0),
        )
        .expect("npc")
    }

    #[test]
    fn stationary_npc_stays_put_and_paused() {
        let mut npc = npc(None);
        npc.apply_script(NPC_MOVE_SPEED);
        npc.entity_mut().tick(0.5);
        assert_eq!(npc.entity().position(), Vec2::new(40.0, 40.0));
        assert!(npc.entity().is_paused());
        assert_eq!(npc.entity().current_frame().index, 24);
    }

    #[test]
    fn scripted_npc_walks_in_its_direction() {
        let mut npc = npc(Some(Direction::Up));
        npc.apply_script(NPC_MOVE_SPEED);
        npc.entity_mut().tick(0.1);
        assert_eq!(npc.entity().velocity(), Vec2::new(0.0, -100.0));
        assert_eq!(npc.entity().position(), Vec2::new(40.0, 30.0));
        assert!(!npc.entity().is_paused());
        assert_eq!(npc.entity().direction(), Direction::Left);
    }

    #[test]
    fn keeps_name_and_lines() {
        let npc = npc(None);
        assert_eq!(npc.name(), "Elder");
        assert_eq!(npc.lines(), ["Hello.".to_string()]);
    }
}
