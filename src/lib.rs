pub mod config;
pub mod cropper;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod logging;
pub mod worker;

pub use cropper::{CropOutcome, CropSession, CropSettings, CropTool};
pub use error::{AppError, AppResult};

/// Entrypoint used by the CLI: crops `bytes` with the given settings after
/// replaying `drags`.
pub fn run(
    bytes: &[u8],
    settings: CropSettings,
    drags: &[headless::DragStep],
) -> AppResult<headless::HeadlessReport> {
    tracing::info!(
        input_bytes = bytes.len(),
        drags = drags.len(),
        aspect = %settings.aspect_ratio,
        "starting cover crop"
    );
    let report = headless::run_headless(bytes, settings, drags)?;
    tracing::info!(
        width = report.image.width,
        height = report.image.height,
        "cover crop complete"
    );
    Ok(report)
}
