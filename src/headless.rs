//! Drives the crop tool without a window: open, replay drags, confirm.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use image::RgbaImage;

use crate::cropper::geometry::corner_point;
use crate::cropper::{
    CropError, CropHandle, CropOutcome, CropSettings, CropTool, EncodedImage, RasterSurface,
};
use crate::error::AppResult;
use crate::geometry::{DisplayGeometry, DisplayPoint, DisplayRect};

/// One scripted drag: grab `handle`, move the pointer by `(dx, dy)`, release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStep {
    pub handle: CropHandle,
    pub dx: f64,
    pub dy: f64,
}

impl FromStr for DragStep {
    type Err = String;

    /// Parses `HANDLE:DX,DY`, e.g. `nw:-20,0` or `move:15,-4`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (handle, offset) = value
            .split_once(':')
            .ok_or_else(|| format!("drag must look like HANDLE:DX,DY, got {value:?}"))?;
        let (dx, dy) = offset
            .split_once(',')
            .ok_or_else(|| format!("drag offset must look like DX,DY, got {offset:?}"))?;
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| format!("invalid drag offset {raw:?}"))
        };
        Ok(Self {
            handle: handle.parse()?,
            dx: parse(dx)?,
            dy: parse(dy)?,
        })
    }
}

#[derive(Debug)]
pub struct HeadlessReport {
    pub display: DisplayGeometry,
    pub crop: DisplayRect,
    pub preview_frame: RgbaImage,
    pub image: EncodedImage,
}

fn grab_point(crop: DisplayRect, handle: CropHandle) -> DisplayPoint {
    match handle {
        CropHandle::Move => {
            DisplayPoint::new(crop.x + crop.width / 2.0, crop.y + crop.height / 2.0)
        }
        CropHandle::Corner(corner) => corner_point(crop, corner),
    }
}

fn take_failure(outcome: &RefCell<Option<CropOutcome>>) -> CropError {
    match outcome.borrow_mut().take() {
        Some(CropOutcome::Failed(err)) => err,
        _ => CropError::NoActiveSession,
    }
}

pub fn run_headless(
    bytes: &[u8],
    settings: CropSettings,
    drags: &[DragStep],
) -> AppResult<HeadlessReport> {
    let outcome: Rc<RefCell<Option<CropOutcome>>> = Rc::new(RefCell::new(None));
    let sink = outcome.clone();
    let mut tool = CropTool::new(settings, RasterSurface::new(), move |result| {
        *sink.borrow_mut() = Some(result);
    });

    if !tool.open(bytes) {
        return Err(take_failure(&outcome).into());
    }

    for step in drags {
        let Some(session) = tool.session() else {
            break;
        };
        let start = grab_point(session.crop(), step.handle);
        if !tool.pointer_down(start) {
            tracing::warn!(handle = step.handle.label(), ?start, "drag did not grab the crop");
            continue;
        }
        tool.pointer_move(DisplayPoint::new(start.x + step.dx, start.y + step.dy));
        tool.pointer_up();
    }

    let Some(session) = tool.session() else {
        return Err(CropError::NoActiveSession.into());
    };
    let display = session.display();
    let crop = session.crop();
    let preview_frame = tool.surface().frame().clone();

    if !tool.confirm() {
        return Err(take_failure(&outcome).into());
    }
    let delivered = outcome.borrow_mut().take();
    match delivered {
        Some(CropOutcome::Confirmed(image)) => Ok(HeadlessReport {
            display,
            crop,
            preview_frame,
            image,
        }),
        Some(CropOutcome::Failed(err)) => Err(err.into()),
        _ => Err(CropError::NoActiveSession.into()),
    }
}
