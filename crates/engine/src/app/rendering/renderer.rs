use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture, TextureError};
use thiserror::Error;
use winit::window::Window;

use crate::assets::FileAssets;
use crate::camera::{Camera, Viewport};
use crate::geometry::Rect;
use crate::map::{MapData, MapLayerKind, TileLayer};
use crate::overworld::{DialogDraw, DrawList, SpriteDraw, DIALOG_BORDER_PX};

use super::font::{draw_text_clipped, glyph_advance, line_advance, text_width, wrap_text};
use super::images::ImageCache;
use super::{blit_scaled, draw_filled_rect};

const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];
const TILE_FALLBACK_COLOR: [u8; 4] = [68, 74, 62, 255];
const SPRITE_PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const DIALOG_FRAME_COLOR: [u8; 4] = [0, 0, 0, 255];
const DIALOG_PANEL_COLOR: [u8; 4] = [143, 143, 143, 255];
const DIALOG_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const DIALOG_TEXT_SCALE: i32 = 3;
const DIALOG_TEXT_PADDING_PX: i32 = 12;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("surface resize failed: {0}")]
    Resize(#[from] TextureError),
}

/// Draws the mounted map and a frame's draw list into a fixed-size pixel
/// buffer that is scaled onto the window surface.
pub struct Renderer {
    pixels: Pixels<'static>,
    buffer: Viewport,
    assets: FileAssets,
    images: ImageCache,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        buffer: Viewport,
        assets: FileAssets,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(buffer.width.max(1), buffer.height.max(1), surface)?;
        Ok(Self {
            pixels,
            buffer,
            assets,
            images: ImageCache::default(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }

    pub fn render(&mut self, map: &MapData, draw_list: &DrawList) -> Result<(), RenderError> {
        if self.buffer.width == 0 || self.buffer.height == 0 {
            return Ok(());
        }
        compose_frame(
            self.pixels.frame_mut(),
            self.buffer,
            map,
            draw_list,
            &mut self.images,
            &self.assets,
        );
        self.pixels.render()?;
        Ok(())
    }
}

/// Layers bottom to top, each followed by the sprites assigned to it, then
/// sprites on layers the map lacks, then the dialog.
fn compose_frame(
    frame: &mut [u8],
    buffer: Viewport,
    map: &MapData,
    draw_list: &DrawList,
    images: &mut ImageCache,
    assets: &FileAssets,
) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }
    let camera = &draw_list.camera;
    let mut target = FrameTarget {
        frame,
        width: buffer.width,
        height: buffer.height,
    };

    for (layer_index, layer) in map.layers.iter().enumerate() {
        if layer.visible {
            match &layer.kind {
                MapLayerKind::Tiles(tiles) => {
                    draw_tile_layer(&mut target, map, tiles, camera, images)
                }
                MapLayerKind::Image(Some(path)) => {
                    if let Some(image) = images.get_or_load(path) {
                        let source = Rect::new(0, 0, image.width as i32, image.height as i32);
                        let dest = camera.world_rect_to_screen(source);
                        blit_scaled(target.frame, target.width, target.height, image, source, dest);
                    }
                }
                MapLayerKind::Image(None) | MapLayerKind::Objects => {}
            }
        }
        for sprite in draw_list
            .sprites
            .iter()
            .filter(|sprite| sprite.layer == layer_index)
        {
            draw_sprite(&mut target, sprite, camera.zoom(), images, assets);
        }
    }
    for sprite in draw_list
        .sprites
        .iter()
        .filter(|sprite| sprite.layer >= map.layers.len())
    {
        draw_sprite(&mut target, sprite, camera.zoom(), images, assets);
    }

    if let Some(dialog) = &draw_list.dialog {
        draw_dialog(&mut target, dialog);
    }
}

struct FrameTarget<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl FrameTarget<'_> {
    fn fill(&mut self, rect: Rect, color: [u8; 4]) {
        draw_filled_rect(
            self.frame,
            self.width,
            self.height,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            color,
        );
    }
}

fn draw_tile_layer(
    target: &mut FrameTarget<'_>,
    map: &MapData,
    tiles: &TileLayer,
    camera: &Camera,
    images: &mut ImageCache,
) {
    if map.tile_width == 0 || map.tile_height == 0 {
        return;
    }
    let Some((x_range, y_range)) = visible_tile_range(map, tiles, camera) else {
        return;
    };
    for y in y_range {
        for x in x_range.clone() {
            let Some(gid) = tiles.gid_at(x, y).filter(|gid| *gid != 0) else {
                continue;
            };
            let Some(tileset) = map.tileset_for_gid(gid) else {
                continue;
            };
            // Oversized tiles grow upward from the bottom of their cell.
            let world = Rect::new(
                (x * map.tile_width) as i32,
                ((y + 1) * map.tile_height) as i32 - tileset.tile_height as i32,
                tileset.tile_width as i32,
                tileset.tile_height as i32,
            );
            let dest = camera.world_rect_to_screen(world);
            let image = tileset
                .image
                .as_ref()
                .and_then(|image| images.get_or_load(&image.path));
            match (image, tileset.tile_source_rect(gid)) {
                (Some(image), Some(source)) => {
                    blit_scaled(target.frame, target.width, target.height, image, source, dest)
                }
                _ => target.fill(dest, TILE_FALLBACK_COLOR),
            }
        }
    }
}

fn visible_tile_range(
    map: &MapData,
    tiles: &TileLayer,
    camera: &Camera,
) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
    let view = camera.visible_world_rect();
    let tile_width = map.tile_width as i32;
    let tile_height = map.tile_height as i32;
    let overhang_rows = map
        .tilesets
        .iter()
        .map(|tileset| tileset.tile_height.saturating_sub(map.tile_height))
        .max()
        .unwrap_or(0)
        .div_ceil(map.tile_height) as i32;

    let x_min = view.left().div_euclid(tile_width).max(0);
    let x_max = (view.right() + tile_width - 1)
        .div_euclid(tile_width)
        .min(tiles.width as i32);
    let y_min = view.top().div_euclid(tile_height).max(0);
    let y_max = ((view.bottom() + tile_height - 1).div_euclid(tile_height) + overhang_rows)
        .min(tiles.height as i32);
    if x_min >= x_max || y_min >= y_max {
        return None;
    }
    Some((x_min as u32..x_max as u32, y_min as u32..y_max as u32))
}

fn draw_sprite(
    target: &mut FrameTarget<'_>,
    sprite: &SpriteDraw,
    zoom: f32,
    images: &mut ImageCache,
    assets: &FileAssets,
) {
    let dest = Rect::new(
        sprite.screen_x,
        sprite.screen_y,
        (sprite.source.width as f32 * zoom).round() as i32,
        (sprite.source.height as f32 * zoom).round() as i32,
    );
    let image = match assets.sprite_path(&sprite.image_src) {
        Ok(path) => images.get_or_load(&path),
        Err(error) => {
            images.warn_unresolved(&sprite.image_src, &error.to_string());
            None
        }
    };
    match image {
        Some(image) => blit_scaled(
            target.frame,
            target.width,
            target.height,
            image,
            sprite.source,
            dest,
        ),
        None => target.fill(dest, SPRITE_PLACEHOLDER_COLOR),
    }
}

fn draw_dialog(target: &mut FrameTarget<'_>, dialog: &DialogDraw) {
    let outer = dialog.rect;
    target.fill(outer, DIALOG_FRAME_COLOR);
    let inner = Rect::new(
        outer.x + DIALOG_BORDER_PX,
        outer.y + DIALOG_BORDER_PX,
        outer.width - DIALOG_BORDER_PX * 2,
        outer.height - DIALOG_BORDER_PX * 2,
    );
    if inner.is_empty() {
        return;
    }
    target.fill(inner, DIALOG_PANEL_COLOR);

    let scale = DIALOG_TEXT_SCALE;
    let usable_width = inner.width - DIALOG_TEXT_PADDING_PX * 2;
    let max_chars = (usable_width + scale) / glyph_advance(scale);
    let lines = wrap_text(&dialog.message, max_chars.max(1) as usize);
    if lines.is_empty() {
        return;
    }
    let block_height = lines.len() as i32 * line_advance(scale) - 2 * scale;
    let mut y = inner.y + (inner.height - block_height) / 2;
    for line in &lines {
        let x = inner.x + (inner.width - text_width(line, scale)) / 2;
        draw_text_clipped(
            target.frame,
            target.width,
            target.height,
            x,
            y,
            line,
            scale,
            DIALOG_TEXT_COLOR,
        );
        y += line_advance(scale);
    }
}
