use std::fmt;

use thiserror::Error;

pub type CropResult<T> = std::result::Result<T, CropError>;

/// Background job kinds the crop tool runs off the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerJob {
    Decode,
    Encode,
}

impl WorkerJob {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for WorkerJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum CropError {
    #[error("failed to decode image: {0}")]
    DecodeFailure(#[source] image::ImageError),
    #[error("invalid crop state: {width}x{height}")]
    InvalidCropState { width: f64, height: f64 },
    #[error("failed to encode cropped image: {0}")]
    EncodeFailure(#[source] image::ImageError),
    #[error("no image is open in the crop tool")]
    NoActiveSession,
    #[error("background {0} job stopped without a result")]
    WorkerStopped(WorkerJob),
}

impl CropError {
    /// Whether the tool stays open after this error so the user can retry.
    pub fn keeps_tool_open(&self) -> bool {
        matches!(
            self,
            Self::InvalidCropState { .. }
                | Self::EncodeFailure(_)
                | Self::WorkerStopped(WorkerJob::Encode)
        )
    }
}
