use image::imageops::FilterType;
use image::RgbaImage;

use crate::geometry::{DisplayGeometry, DisplayPoint, DisplayRect, OutputSize};

use super::error::CropResult;
use super::geometry::{centered_crop, clamp_to_bounds, effective_min_width, fit_display_geometry};
use super::interaction::{CropConstraints, InteractionState};
use super::output::{produce_cropped_image, EncodedImage, SourceImage};
use super::render::{render_frame, CropStyle, CropSurface};
use super::CropSettings;

/// State of one crop pass over one image.
#[derive(Debug)]
pub struct CropSession {
    source: SourceImage,
    preview: RgbaImage,
    crop: DisplayRect,
    constraints: CropConstraints,
    interaction: InteractionState,
    output_max: OutputSize,
    jpeg_quality: u8,
}

impl CropSession {
    pub fn open(bytes: &[u8], settings: &CropSettings) -> CropResult<Self> {
        let source = SourceImage::decode(bytes)?;
        Ok(Self::from_source(source, settings))
    }

    pub fn from_source(source: SourceImage, settings: &CropSettings) -> Self {
        let display_geometry = fit_display_geometry(source.size(), settings.preview_max);
        let aspect = settings.aspect_ratio.value();
        let preview = source
            .image()
            .resize_exact(
                display_geometry.width,
                display_geometry.height,
                FilterType::Triangle,
            )
            .to_rgba8();
        let constraints = CropConstraints {
            display: display_geometry,
            aspect,
            min_width: effective_min_width(display_geometry, aspect, settings.min_crop_size),
            hit_zone: settings.hit_zone,
        };
        let crop = clamp_to_bounds(
            centered_crop(display_geometry, aspect),
            display_geometry,
            aspect,
        );
        tracing::info!(
            source = ?source.size(),
            display = ?display_geometry,
            ?crop,
            aspect = %settings.aspect_ratio,
            "crop session opened"
        );

        Self {
            source,
            preview,
            crop,
            constraints,
            interaction: InteractionState::Idle,
            output_max: settings.output_max,
            jpeg_quality: settings.jpeg_quality,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn preview(&self) -> &RgbaImage {
        &self.preview
    }

    pub fn display(&self) -> DisplayGeometry {
        self.constraints.display
    }

    pub fn crop(&self) -> DisplayRect {
        self.crop
    }

    pub fn constraints(&self) -> &CropConstraints {
        &self.constraints
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Returns true when the pointer grabbed a handle.
    pub fn pointer_down(&mut self, pointer: DisplayPoint) -> bool {
        self.interaction
            .pointer_down(pointer, self.crop, &self.constraints)
            .is_some()
    }

    /// Returns true when the crop rectangle changed and needs a redraw.
    pub fn pointer_move(&mut self, pointer: DisplayPoint) -> bool {
        let Some(next) = self.interaction.pointer_move(pointer, &self.constraints) else {
            return false;
        };
        if next == self.crop {
            return false;
        }
        self.crop = next;
        true
    }

    pub fn pointer_up(&mut self) -> bool {
        self.interaction.release()
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.interaction.release()
    }

    pub fn render<S: CropSurface + ?Sized>(&self, surface: &mut S, style: &CropStyle) {
        render_frame(
            surface,
            &self.preview,
            self.constraints.display,
            self.crop,
            style,
        );
    }

    /// Encodes the current crop. The session is left untouched, so a failed
    /// confirm can be retried.
    pub fn confirm(&self) -> CropResult<EncodedImage> {
        produce_cropped_image(
            &self.source,
            self.constraints.display,
            self.crop,
            self.output_max,
            self.jpeg_quality,
        )
    }

    /// Snapshot of everything [`CropSession::confirm`] needs, for running the
    /// encode off the UI thread.
    pub fn encode_job(&self) -> impl FnOnce() -> CropResult<EncodedImage> + Send + 'static {
        let source = self.source.clone();
        let display = self.constraints.display;
        let crop = self.crop;
        let output_max = self.output_max;
        let quality = self.jpeg_quality;
        move || produce_cropped_image(&source, display, crop, output_max, quality)
    }
}

#[cfg(test)]
impl CropSession {
    pub(crate) fn force_crop(&mut self, crop: DisplayRect) {
        self.crop = crop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cropper::{Corner, CropError, CropHandle};
    use image::{DynamicImage, Rgba};

    fn session_for(width: u32, height: u32) -> CropSession {
        let image = RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]));
        CropSession::from_source(
            SourceImage::from_image(DynamicImage::ImageRgba8(image)),
            &CropSettings::default(),
        )
    }

    #[test]
    fn opening_a_wide_image_fits_preview_and_centers_crop() {
        let session = session_for(1000, 500);
        assert_eq!(session.display(), DisplayGeometry::new(300, 150));
        assert_eq!(session.preview().dimensions(), (300, 150));

        let crop = session.crop();
        let aspect = 16.0 / 9.0;
        assert!((crop.height - 150.0).abs() < 1e-9);
        assert!((crop.width - 150.0 * aspect).abs() < 1e-9);
        assert!((crop.x - (300.0 - 150.0 * aspect) / 2.0).abs() < 1e-9);
        assert!(crop.y.abs() < 1e-9);
        assert_eq!(*session.interaction(), InteractionState::Idle);
    }

    #[test]
    fn corner_drag_updates_crop_and_release_returns_to_idle() {
        let mut session = session_for(1000, 500);
        session.force_crop(DisplayRect::new(50.0, 0.0, 200.0, 112.5));

        assert!(session.pointer_down(DisplayPoint::new(50.0, 0.0)));
        assert_eq!(
            session.interaction().active_handle(),
            Some(CropHandle::Corner(Corner::NorthWest))
        );
        assert!(session.pointer_move(DisplayPoint::new(30.0, 0.0)));

        let crop = session.crop();
        assert!((crop.x - 30.0).abs() < 1e-9);
        assert_eq!(crop.y, 0.0);
        assert!((crop.width - 220.0).abs() < 1e-9);
        assert!((crop.height - 123.75).abs() < 1e-9);

        assert!(session.pointer_leave());
        assert!(!session.pointer_move(DisplayPoint::new(0.0, 0.0)));
        assert!((session.crop().x - 30.0).abs() < 1e-9);
    }

    #[test]
    fn confirm_with_degenerate_crop_fails_and_keeps_session_usable() {
        let mut session = session_for(640, 360);
        session.force_crop(DisplayRect::new(10.0, 10.0, 0.0, 0.0));
        let err = session.confirm().expect_err("degenerate crop should fail");
        assert!(matches!(err, CropError::InvalidCropState { .. }));

        session.force_crop(DisplayRect::new(0.0, 0.0, 160.0, 90.0));
        let encoded = session.confirm().expect("valid crop should encode");
        // Display is 300x169, so the axes scale by 640/300 and 360/169.
        assert_eq!((encoded.width, encoded.height), (341, 192));
    }

    #[test]
    fn encode_job_matches_synchronous_confirm() {
        let session = session_for(320, 180);
        let job = session.encode_job();
        let from_job = job().expect("job should encode");
        let direct = session.confirm().expect("confirm should encode");
        assert_eq!(from_job, direct);
    }
}
