use image::{imageops, RgbaImage};

use crate::geometry::{DisplayGeometry, DisplayRect, RgbaColor};

use super::geometry::handle_square;
use super::{Corner, DEFAULT_HANDLE_SIZE};

/// Drawing target for the crop overlay, in display coordinates.
pub trait CropSurface {
    fn resize(&mut self, display: DisplayGeometry);
    fn clear(&mut self);
    fn draw_image(&mut self, image: &RgbaImage, target: DisplayGeometry);
    fn fill_rect(&mut self, rect: DisplayRect, color: RgbaColor);
    fn stroke_rect(&mut self, rect: DisplayRect, color: RgbaColor, line_width: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropStyle {
    pub mask: RgbaColor,
    pub border: RgbaColor,
    pub border_width: f64,
    pub handle_fill: RgbaColor,
    pub handle_stroke: RgbaColor,
    pub handle_size: f64,
}

impl Default for CropStyle {
    fn default() -> Self {
        Self {
            mask: RgbaColor::new(0, 0, 0, 128),
            border: RgbaColor::new(255, 255, 255, 255),
            border_width: 2.0,
            handle_fill: RgbaColor::new(255, 255, 255, 255),
            handle_stroke: RgbaColor::new(17, 24, 39, 255),
            handle_size: DEFAULT_HANDLE_SIZE,
        }
    }
}

/// Top, left, right and bottom strips around the crop. They never overlap,
/// so no pixel is darkened twice.
pub fn mask_regions(crop: DisplayRect, display: DisplayGeometry) -> [DisplayRect; 4] {
    let width = display.width_f64();
    let height = display.height_f64();
    let top = crop.y.max(0.0);
    let bottom = crop.bottom().min(height);
    let band_height = (bottom - top).max(0.0);
    [
        DisplayRect::new(0.0, 0.0, width, top),
        DisplayRect::new(0.0, top, crop.x.max(0.0), band_height),
        DisplayRect::new(
            crop.right(),
            top,
            (width - crop.right()).max(0.0),
            band_height,
        ),
        DisplayRect::new(0.0, bottom, width, (height - bottom).max(0.0)),
    ]
}

/// Full redraw of the crop overlay.
pub fn render_frame<S: CropSurface + ?Sized>(
    surface: &mut S,
    preview: &RgbaImage,
    display: DisplayGeometry,
    crop: DisplayRect,
    style: &CropStyle,
) {
    surface.clear();
    surface.draw_image(preview, display);

    for region in mask_regions(crop, display) {
        if !region.is_empty() {
            surface.fill_rect(region, style.mask);
        }
    }

    surface.stroke_rect(crop, style.border, style.border_width);

    for corner in Corner::ALL {
        let square = handle_square(crop, corner, style.handle_size);
        surface.fill_rect(square, style.handle_fill);
        surface.stroke_rect(square, style.handle_stroke, 1.0);
    }
}

/// Software surface backed by an RGBA frame buffer.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    frame: RgbaImage,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    pub fn new() -> Self {
        Self {
            frame: RgbaImage::new(1, 1),
        }
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    fn pixel_span(start: f64, end: f64, limit: u32) -> (u32, u32) {
        let limit = f64::from(limit);
        let first = start.round().clamp(0.0, limit) as u32;
        let last = end.round().clamp(0.0, limit) as u32;
        (first, last.max(first))
    }

    fn blend_rect(&mut self, rect: DisplayRect, color: RgbaColor) {
        if rect.is_empty() || color.alpha == 0 {
            return;
        }
        let (x0, x1) = Self::pixel_span(rect.x, rect.right(), self.frame.width());
        let (y0, y1) = Self::pixel_span(rect.y, rect.bottom(), self.frame.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let pixel = self.frame.get_pixel_mut(x, y);
                pixel.0 = blend_source_over(pixel.0, color);
            }
        }
    }
}

fn blend_source_over(destination: [u8; 4], color: RgbaColor) -> [u8; 4] {
    let alpha = u32::from(color.alpha);
    let inverse = 255 - alpha;
    let mix = |source: u8, target: u8| -> u8 {
        ((u32::from(source) * alpha + u32::from(target) * inverse + 127) / 255) as u8
    };
    let out_alpha = alpha + (u32::from(destination[3]) * inverse + 127) / 255;
    [
        mix(color.red, destination[0]),
        mix(color.green, destination[1]),
        mix(color.blue, destination[2]),
        out_alpha.min(255) as u8,
    ]
}

impl CropSurface for RasterSurface {
    fn resize(&mut self, display: DisplayGeometry) {
        if self.frame.dimensions() != (display.width, display.height) {
            self.frame = RgbaImage::new(display.width.max(1), display.height.max(1));
        }
    }

    fn clear(&mut self) {
        for pixel in self.frame.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, target: DisplayGeometry) {
        if image.dimensions() == (target.width, target.height) {
            imageops::replace(&mut self.frame, image, 0, 0);
            return;
        }
        let scaled = imageops::resize(
            image,
            target.width.max(1),
            target.height.max(1),
            imageops::FilterType::Triangle,
        );
        imageops::replace(&mut self.frame, &scaled, 0, 0);
    }

    fn fill_rect(&mut self, rect: DisplayRect, color: RgbaColor) {
        self.blend_rect(rect, color);
    }

    fn stroke_rect(&mut self, rect: DisplayRect, color: RgbaColor, line_width: f64) {
        if rect.is_empty() || line_width <= 0.0 {
            return;
        }
        let half = line_width / 2.0;
        let outer = DisplayRect::new(
            rect.x - half,
            rect.y - half,
            rect.width + line_width,
            rect.height + line_width,
        );
        // Vertical bands stop short of the horizontal ones so corners are blended once.
        self.blend_rect(
            DisplayRect::new(outer.x, outer.y, outer.width, line_width),
            color,
        );
        self.blend_rect(
            DisplayRect::new(outer.x, outer.bottom() - line_width, outer.width, line_width),
            color,
        );
        let inner_height = (outer.height - line_width * 2.0).max(0.0);
        self.blend_rect(
            DisplayRect::new(outer.x, outer.y + line_width, line_width, inner_height),
            color,
        );
        self.blend_rect(
            DisplayRect::new(
                outer.right() - line_width,
                outer.y + line_width,
                line_width,
                inner_height,
            ),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum DrawOp {
        Resize,
        Clear,
        Image(u32, u32),
        Fill(DisplayRect),
        Stroke(DisplayRect),
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        ops: Vec<DrawOp>,
    }

    impl CropSurface for RecordingSurface {
        fn resize(&mut self, _display: DisplayGeometry) {
            self.ops.push(DrawOp::Resize);
        }

        fn clear(&mut self) {
            self.ops.push(DrawOp::Clear);
        }

        fn draw_image(&mut self, _image: &RgbaImage, target: DisplayGeometry) {
            self.ops.push(DrawOp::Image(target.width, target.height));
        }

        fn fill_rect(&mut self, rect: DisplayRect, _color: RgbaColor) {
            self.ops.push(DrawOp::Fill(rect));
        }

        fn stroke_rect(&mut self, rect: DisplayRect, _color: RgbaColor, _line_width: f64) {
            self.ops.push(DrawOp::Stroke(rect));
        }
    }

    fn solid_preview(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]))
    }

    fn area(rect: &DisplayRect) -> f64 {
        rect.width.max(0.0) * rect.height.max(0.0)
    }

    #[test]
    fn render_frame_draws_layers_in_order() {
        let display = DisplayGeometry::new(100, 50);
        let crop = DisplayRect::new(20.0, 5.0, 64.0, 36.0);
        let mut surface = RecordingSurface::default();

        render_frame(
            &mut surface,
            &solid_preview(100, 50),
            display,
            crop,
            &CropStyle::default(),
        );

        assert_eq!(surface.ops[0], DrawOp::Clear);
        assert_eq!(surface.ops[1], DrawOp::Image(100, 50));
        assert!(surface.ops[2..6]
            .iter()
            .all(|op| matches!(op, DrawOp::Fill(_))));
        assert_eq!(surface.ops[6], DrawOp::Stroke(crop));
        let handles = &surface.ops[7..];
        assert_eq!(handles.len(), 8);
        for pair in handles.chunks_exact(2) {
            assert!(matches!(pair[0], DrawOp::Fill(_)));
            assert!(matches!(pair[1], DrawOp::Stroke(_)));
        }
        assert!(!surface.ops.contains(&DrawOp::Resize));
    }

    #[test]
    fn render_frame_skips_empty_mask_strips() {
        let display = DisplayGeometry::new(300, 150);
        let crop = DisplayRect::new(16.0, 0.0, 150.0 * 16.0 / 9.0, 150.0);
        let mut surface = RecordingSurface::default();

        render_frame(
            &mut surface,
            &solid_preview(300, 150),
            display,
            crop,
            &CropStyle::default(),
        );

        let mask_fills = surface.ops[2..]
            .iter()
            .take_while(|op| matches!(op, DrawOp::Fill(_)))
            .count();
        assert_eq!(mask_fills, 2);
    }

    #[test]
    fn mask_regions_cover_everything_outside_the_crop_exactly_once() {
        let display = DisplayGeometry::new(300, 150);
        let crop = DisplayRect::new(40.0, 20.0, 160.0, 90.0);
        let regions = mask_regions(crop, display);

        let masked: f64 = regions.iter().map(area).sum();
        assert!((masked - (300.0 * 150.0 - area(&crop))).abs() < 1e-9);
        for (i, a) in regions.iter().enumerate() {
            for b in regions.iter().skip(i + 1) {
                let overlap_w = (a.right().min(b.right()) - a.x.max(b.x)).max(0.0);
                let overlap_h = (a.bottom().min(b.bottom()) - a.y.max(b.y)).max(0.0);
                assert_eq!(overlap_w * overlap_h, 0.0, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn raster_surface_darkens_outside_and_keeps_inside() {
        let display = DisplayGeometry::new(100, 50);
        let crop = DisplayRect::new(20.0, 5.0, 64.0, 36.0);
        let mut surface = RasterSurface::new();
        surface.resize(display);

        render_frame(
            &mut surface,
            &solid_preview(100, 50),
            display,
            crop,
            &CropStyle::default(),
        );

        let frame = surface.frame();
        assert_eq!(frame.dimensions(), (100, 50));
        assert_eq!(frame.get_pixel(52, 23).0, [200, 100, 50, 255]);
        let outside = frame.get_pixel(2, 2).0;
        assert!(outside[0] < 200 && outside[1] < 100);
        assert_eq!(outside[3], 255);
        assert_eq!(frame.get_pixel(21, 6).0, [255, 255, 255, 255]);
    }

    #[test]
    fn raster_surface_scales_mismatched_images_to_target() {
        let display = DisplayGeometry::new(40, 20);
        let mut surface = RasterSurface::new();
        surface.resize(display);
        surface.draw_image(&solid_preview(400, 200), display);

        let corner = surface.frame().get_pixel(39, 19).0;
        assert!(corner[0].abs_diff(200) <= 1 && corner[1].abs_diff(100) <= 1);
        assert_eq!(corner[3], 255);
    }
}
