mod font;
mod images;
mod renderer;

pub use renderer::{RenderError, Renderer};

use crate::geometry::Rect;

use images::LoadedImage;

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + rect_width).min(width as i32);
    let bottom = (y + rect_height).min(height as i32);
    for py in top..bottom {
        for px in left..right {
            write_pixel_rgba_clipped(frame, width as usize, px, py, color);
        }
    }
}

/// Nearest-neighbour copy of `source` inside `image` onto `dest` in the
/// frame. Fully transparent texels are skipped.
fn blit_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    image: &LoadedImage,
    source: Rect,
    dest: Rect,
) {
    if source.is_empty() || dest.is_empty() || image.width == 0 || image.height == 0 {
        return;
    }
    if image.rgba.len() < image.width as usize * image.height as usize * 4 {
        return;
    }
    let draw_left = dest.left().max(0);
    let draw_top = dest.top().max(0);
    let draw_right = dest.right().min(width as i32);
    let draw_bottom = dest.bottom().min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let scale_x = source.width as f32 / dest.width as f32;
    let scale_y = source.height as f32 / dest.height as f32;
    let image_width = image.width as usize;
    let frame_width = width as usize;

    for out_y in draw_top..draw_bottom {
        let src_y = source.y + ((out_y - dest.y) as f32 * scale_y).floor() as i32;
        if src_y < 0 || src_y >= image.height as i32 || src_y >= source.bottom() {
            continue;
        }
        let src_row_offset = src_y as usize * image_width * 4;
        let dst_row_offset = out_y as usize * frame_width * 4;
        for out_x in draw_left..draw_right {
            let src_x = source.x + ((out_x - dest.x) as f32 * scale_x).floor() as i32;
            if src_x < 0 || src_x >= image.width as i32 || src_x >= source.right() {
                continue;
            }
            let src_offset = src_row_offset + src_x as usize * 4;
            let alpha = image.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            frame[dst_offset..dst_offset + 3]
                .copy_from_slice(&image.rgba[src_offset..src_offset + 3]);
            frame[dst_offset + 3] = alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn filled_rect_is_clipped_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        draw_filled_rect(&mut frame, 4, 4, -2, 2, 4, 10, [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 0, 2), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 1, 3), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 2, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_doubles_source_region_and_skips_transparent_texels() {
        // 2x1 image: red opaque, then transparent.
        let image = LoadedImage {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 0],
        };
        let mut frame = vec![0u8; 4 * 2 * 4];
        blit_scaled(
            &mut frame,
            4,
            2,
            &image,
            Rect::new(0, 0, 2, 1),
            Rect::new(0, 0, 4, 2),
        );
        assert_eq!(pixel(&frame, 4, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 4, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 4, 2, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 3, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_reads_only_inside_the_source_rect() {
        let image = LoadedImage {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 0, 255, 255],
        };
        let mut frame = vec![0u8; 2 * 4];
        blit_scaled(
            &mut frame,
            2,
            1,
            &image,
            Rect::new(1, 0, 1, 1),
            Rect::new(0, 0, 2, 1),
        );
        assert_eq!(pixel(&frame, 2, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&frame, 2, 1, 0), [0, 0, 255, 255]);
    }
}
