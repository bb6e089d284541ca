use crate::geometry::{DisplayGeometry, DisplayPoint, DisplayRect};

use super::geometry::{clamp_to_bounds, hit_test, resize_from_corner, translate};
use super::{CropHandle, HitZone};

/// Fixed limits a drag is evaluated against during one crop session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropConstraints {
    pub display: DisplayGeometry,
    pub aspect: f64,
    pub min_width: f64,
    pub hit_zone: HitZone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub handle: CropHandle,
    pub start: DisplayPoint,
    pub origin: DisplayRect,
}

impl DragSession {
    /// Rectangle for the pointer at `pointer`, always derived from `origin`.
    pub fn rect_at(&self, pointer: DisplayPoint, constraints: &CropConstraints) -> DisplayRect {
        let dx = pointer.x - self.start.x;
        let dy = pointer.y - self.start.y;
        let next = match self.handle {
            CropHandle::Move => translate(self.origin, dx, dy),
            CropHandle::Corner(corner) => resize_from_corner(
                corner,
                self.origin,
                dx,
                dy,
                constraints.aspect,
                constraints.min_width,
            ),
        };
        clamp_to_bounds(next, constraints.display, constraints.aspect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl InteractionState {
    pub const fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }

    pub fn active_handle(&self) -> Option<CropHandle> {
        match self {
            Self::Idle => None,
            Self::Dragging(session) => Some(session.handle),
        }
    }

    /// `Idle -> Dragging` when the pointer lands on a handle or the body.
    ///
    /// A second pointer-down while already dragging keeps the current drag.
    pub fn pointer_down(
        &mut self,
        pointer: DisplayPoint,
        crop: DisplayRect,
        constraints: &CropConstraints,
    ) -> Option<CropHandle> {
        if let Self::Dragging(session) = self {
            tracing::debug!(handle = ?session.handle, "pointer down ignored while dragging");
            return None;
        }

        let handle = hit_test(pointer, crop, constraints.hit_zone)?;
        tracing::debug!(handle = handle.label(), ?pointer, "crop drag started");
        *self = Self::Dragging(DragSession {
            handle,
            start: pointer,
            origin: crop,
        });
        Some(handle)
    }

    /// New crop rectangle while dragging; `None` while idle.
    pub fn pointer_move(
        &self,
        pointer: DisplayPoint,
        constraints: &CropConstraints,
    ) -> Option<DisplayRect> {
        match self {
            Self::Idle => None,
            Self::Dragging(session) => Some(session.rect_at(pointer, constraints)),
        }
    }

    /// `Dragging -> Idle` on pointer-up or when the pointer leaves the surface.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        if let Self::Dragging(session) = self {
            tracing::debug!(handle = session.handle.label(), "crop drag finished");
        }
        *self = Self::Idle;
        was_dragging
    }
}
