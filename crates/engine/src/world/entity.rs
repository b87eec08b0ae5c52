use crate::geometry::{Rect, Vec2};

use super::animation::{AnimationError, AnimationState, Direction, SpriteSheet, WalkCycles};

pub const FEET_HEIGHT_PX: i32 = 8;

/// Frame the renderer should blit for an entity this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame<'a> {
    pub sheet: &'a SpriteSheet,
    pub index: u16,
}

/// Shared movement and animation state of the player and every NPC.
///
/// `rect` is the draw rectangle: its top-left is `position` truncated to whole
/// pixels and its size is one sprite frame. `feet` is half as wide, eight
/// pixels tall and anchored to the bottom-centre of `rect`; only `feet` is
/// tested against blockers so sprite tops may overlap walls.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    position: Vec2,
    previous_position: Vec2,
    velocity: Vec2,
    animation: AnimationState,
    sheet: SpriteSheet,
    cycles: WalkCycles,
    rect: Rect,
    feet: Rect,
}

impl Entity {
    pub fn new(
        sheet: SpriteSheet,
        direction: Direction,
        position: Vec2,
    ) -> Result<Self, AnimationError> {
        let cycles = WalkCycles::standard(&sheet)?;
        let (frame_width, frame_height) = sheet.frame_size();
        let rect = Rect::new(0, 0, frame_width as i32, frame_height as i32);
        let feet = Rect::new(0, 0, rect.width / 2, FEET_HEIGHT_PX);
        let mut entity = Self {
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            animation: AnimationState::facing(direction),
            sheet,
            cycles,
            rect,
            feet,
        };
        entity.sync_rects();
        Ok(entity)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports the entity; the move cannot be reverted.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.previous_position = position;
        self.sync_rects();
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, vx: f32, vy: f32) {
        self.velocity = Vec2::new(vx, vy);
    }

    pub fn set_velocity_x(&mut self, vx: f32) {
        self.velocity.x = vx;
    }

    pub fn set_velocity_y(&mut self, vy: f32) {
        self.velocity.y = vy;
    }

    pub fn direction(&self) -> Direction {
        self.animation.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.animation.set_direction(direction);
    }

    pub fn is_paused(&self) -> bool {
        !self.animation.playing
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.animation.set_playing(!paused);
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn sprite_sheet(&self) -> &SpriteSheet {
        &self.sheet
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn feet(&self) -> Rect {
        self.feet
    }

    pub fn tick(&mut self, dt: f32) {
        self.animation.advance(dt);
        self.previous_position = self.position;
        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
        self.sync_rects();
    }

    pub fn revert_last_move(&mut self) {
        self.position = self.previous_position;
        self.sync_rects();
    }

    pub fn current_frame(&self) -> SpriteFrame<'_> {
        SpriteFrame {
            sheet: &self.sheet,
            index: self.animation.frame(&self.cycles),
        }
    }

    fn sync_rects(&mut self) {
        self.rect.x = self.position.x as i32;
        self.rect.y = self.position.y as i32;
        self.feet.set_mid_bottom(self.rect.mid_bottom());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_at(x: f32, y: f32) -> Entity {
        let sheet = SpriteSheet::from_image_size("hero.png", 256, 128).expect("sheet");
        Entity::new(sheet, Direction::Down, Vec2::new(x, y)).expect("entity")
    }

    #[test]
    fn rects_follow_construction_position() {
        let entity = entity_at(100.7, 50.2);
        assert_eq!(entity.rect(), Rect::new(100, 50, 32, 32));
        assert_eq!(entity.feet(), Rect::new(108, 74, 16, 8));
    }

    #[test]
    fn tick_moves_by_velocity_times_dt_without_normalising() {
        let mut entity = entity_at(10.0, 20.0);
        entity.set_velocity(100.0, -100.0);
        entity.tick(0.25);
        assert_eq!(entity.position(), Vec2::new(35.0, -5.0));
        assert_eq!(entity.rect().x, 35);
        assert_eq!(entity.rect().y, -5);
    }

    #[test]
    fn revert_restores_position_and_rects_exactly() {
        let mut entity = entity_at(12.5, 40.0);
        let fresh = entity_at(12.5, 40.0);
        entity.set_velocity(37.0, 13.0);
        entity.tick(0.016);
        entity.revert_last_move();
        assert_eq!(entity.position(), Vec2::new(12.5, 40.0));
        assert_eq!(entity.rect(), fresh.rect());
        assert_eq!(entity.feet(), fresh.feet());
    }

    #[test]
    fn second_revert_is_a_no_op() {
        let mut entity = entity_at(0.0, 0.0);
        entity.set_velocity(50.0, 0.0);
        entity.tick(0.1);
        entity.tick(0.1);
        entity.revert_last_move();
        entity.revert_last_move();
        assert_eq!(entity.position(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn set_position_is_not_revertible() {
        let mut entity = entity_at(0.0, 0.0);
        entity.set_position(Vec2::new(64.0, 64.0));
        entity.revert_last_move();
        assert_eq!(entity.position(), Vec2::new(64.0, 64.0));
    }

    #[test]
    fn paused_entity_shows_first_frame_for_facing() {
        let mut entity = entity_at(0.0, 0.0);
        entity.set_direction(Direction::Up);
        assert!(entity.is_paused());
        assert_eq!(entity.current_frame().index, 2);

        entity.set_paused(false);
        entity.tick(0.1);
        assert_eq!(entity.current_frame().index, 1);
        assert_eq!(entity.current_frame().sheet.image_src(), "hero.png");
    }
}
