use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage};

use crate::geometry::{DisplayGeometry, DisplayRect, OutputSize, SourceRect, SourceSize};

use super::error::{CropError, CropResult};

pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";
pub const OUTPUT_FILE_NAME: &str = "cover.jpg";

/// Decoded source image plus its natural size. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: Arc<DynamicImage>,
    size: SourceSize,
}

impl SourceImage {
    pub fn decode(bytes: &[u8]) -> CropResult<Self> {
        let image = image::load_from_memory(bytes).map_err(CropError::DecodeFailure)?;
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let size = SourceSize::new(image.width(), image.height());
        Self {
            image: Arc::new(image),
            size,
        }
    }

    pub fn size(&self) -> SourceSize {
        self.size
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub const fn mime_type(&self) -> &'static str {
        OUTPUT_MIME_TYPE
    }

    pub const fn file_name(&self) -> &'static str {
        OUTPUT_FILE_NAME
    }
}

/// Maps a display-space crop onto source pixels.
///
/// Each axis has its own scale factor; rounding to whole pixels may leave
/// them slightly apart.
pub fn source_rect_for_crop(
    natural: SourceSize,
    display: DisplayGeometry,
    crop: DisplayRect,
) -> SourceRect {
    let scale_x = f64::from(natural.width) / display.width_f64().max(1.0);
    let scale_y = f64::from(natural.height) / display.height_f64().max(1.0);
    let max_x = natural.width.saturating_sub(1);
    let max_y = natural.height.saturating_sub(1);

    let x = ((crop.x * scale_x).round().max(0.0) as u32).min(max_x);
    let y = ((crop.y * scale_y).round().max(0.0) as u32).min(max_y);
    let width = ((crop.width * scale_x).round().max(1.0) as u32)
        .clamp(1, (natural.width - x).max(1));
    let height = ((crop.height * scale_y).round().max(1.0) as u32)
        .clamp(1, (natural.height - y).max(1));
    SourceRect::new(x, y, width, height)
}

/// Output never upscales: each axis is capped independently.
pub fn output_size_for(source: SourceRect, max_output: OutputSize) -> OutputSize {
    OutputSize::new(
        source.width.min(max_output.width).max(1),
        source.height.min(max_output.height).max(1),
    )
}

/// Resamples the crop region of the full-resolution source into a JPEG.
///
/// Neither the source image nor the crop rectangle is modified.
pub fn produce_cropped_image(
    source: &SourceImage,
    display: DisplayGeometry,
    crop: DisplayRect,
    max_output: OutputSize,
    quality: u8,
) -> CropResult<EncodedImage> {
    let crop_is_valid = crop.width.is_finite()
        && crop.height.is_finite()
        && crop.x.is_finite()
        && crop.y.is_finite()
        && !crop.is_empty();
    if source.size().is_empty() || !crop_is_valid {
        return Err(CropError::InvalidCropState {
            width: crop.width,
            height: crop.height,
        });
    }

    let region = source_rect_for_crop(source.size(), display, crop);
    let output = output_size_for(region, max_output);
    tracing::debug!(?region, ?output, "resampling crop region");

    let cropped = source
        .image()
        .crop_imm(region.x, region.y, region.width, region.height);
    let resampled = if (region.width, region.height) == (output.width, output.height) {
        cropped.to_rgb8()
    } else {
        imageops::resize(
            &cropped.to_rgb8(),
            output.width,
            output.height,
            imageops::FilterType::Triangle,
        )
    };

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    resampled
        .write_with_encoder(encoder)
        .map_err(CropError::EncodeFailure)?;

    Ok(EncodedImage {
        bytes,
        width: output.width,
        height: output.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn gradient_source(width: u32, height: u32) -> SourceImage {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        SourceImage::from_image(DynamicImage::ImageRgb8(image))
    }

    #[test]
    fn full_frame_crop_maps_to_full_source_and_caps_each_axis() {
        let natural = SourceSize::new(2000, 1000);
        let display = DisplayGeometry::new(300, 150);
        let crop = DisplayRect::new(0.0, 0.0, 300.0, 150.0);

        let region = source_rect_for_crop(natural, display, crop);
        assert_eq!(region, SourceRect::new(0, 0, 2000, 1000));
        assert_eq!(
            output_size_for(region, OutputSize::new(1920, 1080)),
            OutputSize::new(1920, 1000)
        );
    }

    #[test]
    fn scale_factors_are_computed_per_axis() {
        // 1001/300 and 500/150 differ once the display was rounded.
        let natural = SourceSize::new(1001, 500);
        let display = DisplayGeometry::new(300, 150);
        let region =
            source_rect_for_crop(natural, display, DisplayRect::new(30.0, 15.0, 90.0, 45.0));
        assert_eq!(region, SourceRect::new(100, 50, 300, 150));
    }

    #[test]
    fn source_rect_is_clamped_inside_the_image() {
        let natural = SourceSize::new(100, 50);
        let display = DisplayGeometry::new(100, 50);
        let region =
            source_rect_for_crop(natural, display, DisplayRect::new(80.0, 40.0, 64.0, 36.0));
        assert_eq!(region, SourceRect::new(80, 40, 20, 10));
    }

    #[test]
    fn small_crops_are_never_upscaled() {
        let region = SourceRect::new(0, 0, 320, 180);
        assert_eq!(
            output_size_for(region, OutputSize::new(1920, 1080)),
            OutputSize::new(320, 180)
        );
    }

    #[test]
    fn produce_cropped_image_encodes_bounded_jpeg() {
        let source = gradient_source(2000, 1000);
        let encoded = produce_cropped_image(
            &source,
            DisplayGeometry::new(300, 150),
            DisplayRect::new(0.0, 0.0, 300.0, 150.0),
            OutputSize::new(1920, 1080),
            90,
        )
        .expect("full frame crop should encode");

        assert_eq!((encoded.width, encoded.height), (1920, 1000));
        assert_eq!(encoded.mime_type(), "image/jpeg");
        let decoded = image::load_from_memory_with_format(&encoded.bytes, ImageFormat::Jpeg)
            .expect("output should be a valid jpeg");
        assert_eq!(decoded.width(), 1920);
        assert_eq!(decoded.height(), 1000);
        assert_eq!(source.size(), SourceSize::new(2000, 1000));
    }

    #[test]
    fn produce_cropped_image_rejects_degenerate_crop() {
        let source = gradient_source(64, 32);
        let err = produce_cropped_image(
            &source,
            DisplayGeometry::new(64, 32),
            DisplayRect::new(10.0, 10.0, 0.0, 0.0),
            OutputSize::new(1920, 1080),
            90,
        )
        .expect_err("zero width crop should fail");
        assert!(matches!(err, CropError::InvalidCropState { .. }));
    }

    #[test]
    fn produce_cropped_image_rejects_undecoded_source() {
        let source = SourceImage::from_image(DynamicImage::new_rgb8(0, 0));
        let err = produce_cropped_image(
            &source,
            DisplayGeometry::new(1, 1),
            DisplayRect::new(0.0, 0.0, 1.0, 1.0),
            OutputSize::new(1920, 1080),
            90,
        )
        .expect_err("empty source should fail");
        assert!(matches!(err, CropError::InvalidCropState { .. }));
    }

    #[test]
    fn decode_reports_garbage_bytes() {
        let err = SourceImage::decode(b"definitely not an image").expect_err("decode should fail");
        assert!(matches!(err, CropError::DecodeFailure(_)));
    }
}
