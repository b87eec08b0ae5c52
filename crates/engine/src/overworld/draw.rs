use crate::camera::Camera;
use crate::geometry::{Rect, Vec2};
use crate::world::Entity;

/// Everything the renderer needs for one frame besides the map tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub camera: Camera,
    pub player_layer: usize,
    /// Ordered by layer, then by the bottom edge of the draw rectangle.
    pub sprites: Vec<SpriteDraw>,
    pub dialog: Option<DialogDraw>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDraw {
    pub image_src: String,
    /// Frame rectangle inside the sheet image.
    pub source: Rect,
    pub screen_x: i32,
    pub screen_y: i32,
    pub layer: usize,
    pub bottom: i32,
}

impl SpriteDraw {
    pub fn for_entity(entity: &Entity, layer: usize, camera: &Camera) -> Self {
        let frame = entity.current_frame();
        let (frame_x, frame_y) = frame.sheet.frame_origin(frame.index);
        let (frame_width, frame_height) = frame.sheet.frame_size();
        let rect = entity.rect();
        let (screen_x, screen_y) =
            camera.world_to_screen(Vec2::new(rect.x as f32, rect.y as f32));
        Self {
            image_src: frame.sheet.image_src().to_string(),
            source: Rect::new(
                frame_x as i32,
                frame_y as i32,
                frame_width as i32,
                frame_height as i32,
            ),
            screen_x,
            screen_y,
            layer,
            bottom: rect.bottom(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogDraw {
    pub rect: Rect,
    pub message: String,
}

pub(super) fn sort_sprites(sprites: &mut [SpriteDraw]) {
    sprites.sort_by_key(|sprite| (sprite.layer, sprite.bottom));
}
