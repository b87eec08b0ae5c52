use crate::camera::Viewport;
use crate::geometry::Rect;

/// Width of the dark frame around the dialog panel.
pub const DIALOG_BORDER_PX: i32 = 4;

/// Panel shown while reading a sign: full viewport width, a quarter of its
/// height, docked to the bottom edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignDialog {
    message: String,
    width: u32,
    height: u32,
}

impl SignDialog {
    pub fn new(message: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            message: message.into(),
            width: viewport.width,
            height: viewport.height / 4,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn screen_rect(&self, viewport: Viewport) -> Rect {
        Rect::new(
            0,
            viewport.height as i32 - self.height as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}
