use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Vec2;

/// Sprite sheets are laid out as 4 rows of 8 equally sized frames.
pub const SHEET_COLUMNS: u32 = 8;
pub const SHEET_ROWS: u32 = 4;
pub const WALK_CYCLE_LEN: usize = 6;
pub const FRAME_DURATION_SECONDS: f32 = 0.1;

/// Frame indices of each walking cycle; the first entry is the standing pose.
pub const STANDARD_WALK_CYCLES: [(Direction, [u16; WALK_CYCLE_LEN]); 4] = [
    (Direction::Up, [2, 1, 0, 2, 3, 4]),
    (Direction::Down, [10, 9, 8, 10, 11, 12]),
    (Direction::Right, [16, 17, 18, 16, 21, 22]),
    (Direction::Left, [24, 25, 26, 24, 29, 30]),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
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

    const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("sprite sheet '{image_src}' is {width}x{height}; expected at least 8x4 pixels")]
    SheetTooSmall {
        image_src: String,
        width: u32,
        height: u32,
    },
    #[error("no walking cycle configured for direction '{}'", .direction.as_token())]
    MissingWalkCycle { direction: Direction },
    #[error(
        "walking cycle '{}' references frame {frame} but the sheet only has {frame_count} frames",
        .direction.as_token()
    )]
    FrameOutOfRange {
        direction: Direction,
        frame: u16,
        frame_count: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSheet {
    image_src: String,
    frame_width: u32,
    frame_height: u32,
}

impl SpriteSheet {
    pub fn from_image_size(
        image_src: impl Into<String>,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, AnimationError> {
        let image_src = image_src.into();
        let frame_width = image_width / SHEET_COLUMNS;
        let frame_height = image_height / SHEET_ROWS;
        if frame_width == 0 || frame_height == 0 {
            return Err(AnimationError::SheetTooSmall {
                image_src,
                width: image_width,
                height: image_height,
            });
        }
        Ok(Self {
            image_src,
            frame_width,
            frame_height,
        })
    }

    pub fn image_src(&self) -> &str {
        &self.image_src
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn frame_count(&self) -> u32 {
        SHEET_COLUMNS * SHEET_ROWS
    }

    /// Top-left pixel of `index` inside the sheet image.
    pub fn frame_origin(&self, index: u16) -> (u32, u32) {
        let index = u32::from(index);
        (
            (index % SHEET_COLUMNS) * self.frame_width,
            (index / SHEET_COLUMNS) * self.frame_height,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkCycles {
    frames: [[u16; WALK_CYCLE_LEN]; 4],
}

impl WalkCycles {
    pub fn standard(sheet: &SpriteSheet) -> Result<Self, AnimationError> {
        Self::from_table(&STANDARD_WALK_CYCLES, sheet)
    }

    pub fn from_table(
        table: &[(Direction, [u16; WALK_CYCLE_LEN])],
        sheet: &SpriteSheet,
    ) -> Result<Self, AnimationError> {
        let mut frames = [[0u16; WALK_CYCLE_LEN]; 4];
        for direction in Direction::ALL {
            let Some((_, cycle)) = table.iter().find(|(entry, _)| *entry == direction) else {
                return Err(AnimationError::MissingWalkCycle { direction });
            };
            if let Some(frame) = cycle
                .iter()
                .copied()
                .find(|frame| u32::from(*frame) >= sheet.frame_count())
            {
                return Err(AnimationError::FrameOutOfRange {
                    direction,
                    frame,
                    frame_count: sheet.frame_count(),
                });
            }
            frames[direction.index()] = *cycle;
        }
        Ok(Self { frames })
    }

    pub fn first_frame(&self, direction: Direction) -> u16 {
        self.frames[direction.index()][0]
    }

    pub fn frame_at(&self, direction: Direction, elapsed_seconds: f32) -> u16 {
        let step = (elapsed_seconds.max(0.0) / FRAME_DURATION_SECONDS) as usize;
        self.frames[direction.index()][step % WALK_CYCLE_LEN]
    }
}

/// Facing and walk-cycle clock owned by each entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    pub direction: Direction,
    pub elapsed_seconds: f32,
    pub playing: bool,
}

impl AnimationState {
    pub fn facing(direction: Direction) -> Self {
        Self {
            direction,
            elapsed_seconds: 0.0,
            playing: false,
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if self.direction != direction {
            self.direction = direction;
            self.elapsed_seconds = 0.0;
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn advance(&mut self, dt: f32) {
        if self.playing {
            self.elapsed_seconds += dt;
        }
    }

    pub fn frame(&self, cycles: &WalkCycles) -> u16 {
        if self.playing {
            cycles.frame_at(self.direction, self.elapsed_seconds)
        } else {
            cycles.first_frame(self.direction)
        }
    }
}
