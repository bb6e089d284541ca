//! Interactive fixed-aspect crop tool.

pub mod error;
pub mod geometry;
pub mod interaction;
pub mod output;
pub mod render;
pub mod session;
pub mod tool;

use std::fmt;
use std::str::FromStr;

use crate::geometry::{DisplayGeometry, OutputSize};

pub use error::{CropError, CropResult, WorkerJob};
pub use interaction::{DragSession, InteractionState};
pub use output::{produce_cropped_image, EncodedImage, SourceImage};
pub use render::{render_frame, CropSurface, CropStyle, RasterSurface};
pub use session::CropSession;
pub use tool::{CropOutcome, CropTool};

pub const DEFAULT_ASPECT_RATIO: AspectRatio = AspectRatio::new(16, 9);
pub const DEFAULT_PREVIEW_MAX: DisplayGeometry = DisplayGeometry::new(300, 220);
pub const DEFAULT_OUTPUT_MAX: OutputSize = OutputSize::new(1920, 1080);
pub const DEFAULT_MIN_CROP_SIZE: f64 = 50.0;
pub const DEFAULT_HANDLE_SIZE: f64 = 8.0;
pub const DEFAULT_HIT_TOLERANCE: f64 = 4.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl Corner {
    /// Hit-test priority order.
    pub const ALL: [Corner; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::NorthWest => "nw",
            Self::NorthEast => "ne",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::NorthEast => Self::SouthWest,
            Self::SouthEast => Self::NorthWest,
            Self::SouthWest => Self::NorthEast,
        }
    }
}

/// What a pointer-down grabbed: the rectangle body or one of its corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropHandle {
    Move,
    Corner(Corner),
}

impl CropHandle {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Corner(corner) => corner.label(),
        }
    }
}

impl FromStr for CropHandle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "nw" => Ok(Self::Corner(Corner::NorthWest)),
            "ne" => Ok(Self::Corner(Corner::NorthEast)),
            "se" => Ok(Self::Corner(Corner::SouthEast)),
            "sw" => Ok(Self::Corner(Corner::SouthWest)),
            other => Err(format!("unknown crop handle: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. Zero terms are treated as 1.
    pub fn value(self) -> f64 {
        f64::from(self.width.max(1)) / f64::from(self.height.max(1))
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        DEFAULT_ASPECT_RATIO
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .split_once(':')
            .ok_or_else(|| format!("aspect ratio must look like W:H, got {value:?}"))?;
        let width = width
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid aspect width {width:?}: {err}"))?;
        let height = height
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid aspect height {height:?}: {err}"))?;
        if width == 0 || height == 0 {
            return Err(format!("aspect ratio terms must be positive, got {value:?}"));
        }
        Ok(Self::new(width, height))
    }
}

/// Corner handle hitbox: a `handle_size` square centered on each corner,
/// grown by `tolerance` on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitZone {
    pub handle_size: f64,
    pub tolerance: f64,
}

impl HitZone {
    pub fn reach(&self) -> f64 {
        self.handle_size / 2.0 + self.tolerance
    }
}

impl Default for HitZone {
    fn default() -> Self {
        Self {
            handle_size: DEFAULT_HANDLE_SIZE,
            tolerance: DEFAULT_HIT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSettings {
    pub aspect_ratio: AspectRatio,
    pub preview_max: DisplayGeometry,
    pub output_max: OutputSize,
    pub min_crop_size: f64,
    pub hit_zone: HitZone,
    pub jpeg_quality: u8,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            preview_max: DEFAULT_PREVIEW_MAX,
            output_max: DEFAULT_OUTPUT_MAX,
            min_crop_size: DEFAULT_MIN_CROP_SIZE,
            hit_zone: HitZone::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}
