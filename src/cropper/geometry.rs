use crate::geometry::{DisplayGeometry, DisplayPoint, DisplayRect, SourceSize};

use super::{Corner, CropHandle, HitZone};

/// Contain-fits the natural image size into the preview box.
///
/// Images that already fit are shown at native size. Otherwise the smaller of
/// the two axis scale factors is used, so the constraining axis lands exactly
/// on its maximum and the other stays inside the box.
pub fn fit_display_geometry(natural: SourceSize, max_preview: DisplayGeometry) -> DisplayGeometry {
    let max_width = max_preview.width.max(1);
    let max_height = max_preview.height.max(1);
    if natural.width <= max_width && natural.height <= max_height {
        return DisplayGeometry::new(natural.width.max(1), natural.height.max(1));
    }

    let natural_width = f64::from(natural.width.max(1));
    let natural_height = f64::from(natural.height.max(1));
    let scale = (f64::from(max_width) / natural_width).min(f64::from(max_height) / natural_height);
    let width = ((natural_width * scale).round() as u32).clamp(1, max_width);
    let height = ((natural_height * scale).round() as u32).clamp(1, max_height);
    DisplayGeometry::new(width, height)
}

/// Widest crop width that satisfies the aspect ratio inside the display.
pub fn max_crop_width(display: DisplayGeometry, aspect: f64) -> f64 {
    display.width_f64().min(display.height_f64() * aspect)
}

/// Minimum crop width, lowered when the display cannot host `min_size`.
pub fn effective_min_width(display: DisplayGeometry, aspect: f64, min_size: f64) -> f64 {
    min_size.min(max_crop_width(display, aspect))
}

/// Largest aspect-correct rectangle, centered in the display.
pub fn centered_crop(display: DisplayGeometry, aspect: f64) -> DisplayRect {
    let width = max_crop_width(display, aspect);
    let height = width / aspect;
    DisplayRect::new(
        (display.width_f64() - width) / 2.0,
        (display.height_f64() - height) / 2.0,
        width,
        height,
    )
}

pub fn corner_point(rect: DisplayRect, corner: Corner) -> DisplayPoint {
    match corner {
        Corner::NorthWest => DisplayPoint::new(rect.x, rect.y),
        Corner::NorthEast => DisplayPoint::new(rect.right(), rect.y),
        Corner::SouthEast => DisplayPoint::new(rect.right(), rect.bottom()),
        Corner::SouthWest => DisplayPoint::new(rect.x, rect.bottom()),
    }
}

/// Square of side `size` centered on the given corner.
pub fn handle_square(rect: DisplayRect, corner: Corner, size: f64) -> DisplayRect {
    let center = corner_point(rect, corner);
    DisplayRect::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
}

pub fn hit_test(pointer: DisplayPoint, rect: DisplayRect, zone: HitZone) -> Option<CropHandle> {
    let reach = zone.reach();
    for corner in Corner::ALL {
        let center = corner_point(rect, corner);
        if (pointer.x - center.x).abs() <= reach && (pointer.y - center.y).abs() <= reach {
            return Some(CropHandle::Corner(corner));
        }
    }

    if rect.contains(pointer) {
        return Some(CropHandle::Move);
    }
    None
}

/// Resizes `original` from `corner` by a cumulative pointer displacement.
///
/// The opposite corner stays put. Width follows `dx` and is floored at
/// `min_size`; height is always `width / aspect`, so `dy` has no effect.
pub fn resize_from_corner(
    corner: Corner,
    original: DisplayRect,
    dx: f64,
    _dy: f64,
    aspect: f64,
    min_size: f64,
) -> DisplayRect {
    let anchor = corner_point(original, corner.opposite());
    let width = match corner {
        Corner::NorthWest | Corner::SouthWest => original.width - dx,
        Corner::NorthEast | Corner::SouthEast => original.width + dx,
    }
    .max(min_size);
    let height = width / aspect;

    let (x, y) = match corner {
        Corner::NorthWest => (anchor.x - width, anchor.y - height),
        Corner::NorthEast => (anchor.x, anchor.y - height),
        Corner::SouthEast => (anchor.x, anchor.y),
        Corner::SouthWest => (anchor.x - width, anchor.y),
    };
    DisplayRect::new(x, y, width, height)
}

pub fn translate(original: DisplayRect, dx: f64, dy: f64) -> DisplayRect {
    DisplayRect::new(original.x + dx, original.y + dy, original.width, original.height)
}

/// Shrinks the rectangle to fit the display, then slides it inside.
///
/// Height is re-derived from width after every size change so the aspect
/// ratio survives clamping.
pub fn clamp_to_bounds(rect: DisplayRect, display: DisplayGeometry, aspect: f64) -> DisplayRect {
    let display_width = display.width_f64();
    let display_height = display.height_f64();

    let mut width = rect.width.min(display_width);
    let mut height = width / aspect;
    if height > display_height {
        height = display_height;
        width = height * aspect;
    }

    let x = rect.x.clamp(0.0, (display_width - width).max(0.0));
    let y = rect.y.clamp(0.0, (display_height - height).max(0.0));
    DisplayRect::new(x, y, width, height)
}
