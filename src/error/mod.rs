use crate::config::ConfigError;
use crate::cropper::CropError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
