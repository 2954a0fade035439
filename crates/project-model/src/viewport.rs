//! Layout geometry for preview and export.
//!
//! Rectangles are in pixels of whatever surface they describe (source
//! frame, output canvas, on-screen preview element).

use serde::{Deserialize, Serialize};

use crate::region::ZoomCenter;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin.
    pub fn sized(w: f64, h: f64) -> Self {
        Self::new(0.0, 0.0, w, h)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Position of `(px, py)` as percentages of this rectangle, clamped to
    /// `[0, 100]`. Used to turn a pointer click on the rendered preview into
    /// a zoom center, independent of the source resolution.
    pub fn percent_of(&self, px: f64, py: f64) -> ZoomCenter {
        if self.w <= 0.0 || self.h <= 0.0 {
            return ZoomCenter::MIDDLE;
        }
        ZoomCenter::new(
            (px - self.x) / self.w * 100.0,
            (py - self.y) / self.h * 100.0,
        )
    }
}

/// Letterbox/pillarbox placement: the largest rectangle with the source's
/// aspect ratio that fits inside `canvas`, centered.
pub fn fit_rect(source_w: f64, source_h: f64, canvas: Rect) -> Rect {
    if source_w <= 0.0 || source_h <= 0.0 {
        return canvas;
    }
    let scale = (canvas.w / source_w).min(canvas.h / source_h);
    let w = source_w * scale;
    let h = source_h * scale;
    Rect::new(
        canvas.x + (canvas.w - w) / 2.0,
        canvas.y + (canvas.h - h) / 2.0,
        w,
        h,
    )
}

/// Cover placement: the smallest rectangle with the image's aspect ratio
/// that covers `canvas`, centered (overflow is clipped by the canvas).
pub fn cover_rect(image_w: f64, image_h: f64, canvas: Rect) -> Rect {
    if image_w <= 0.0 || image_h <= 0.0 {
        return canvas;
    }
    let scale = (canvas.w / image_w).max(canvas.h / image_h);
    let w = image_w * scale;
    let h = image_h * scale;
    Rect::new(
        canvas.x + (canvas.w - w) / 2.0,
        canvas.y + (canvas.h - h) / 2.0,
        w,
        h,
    )
}

/// Source crop for a zoom: `source / level` in size, centered on `center`,
/// shifted so it never leaves the source frame.
pub fn zoom_crop(source_w: f64, source_h: f64, center: ZoomCenter, level: f64) -> Rect {
    let level = if level.is_finite() && level >= 1.0 {
        level
    } else {
        1.0
    };
    let w = source_w / level;
    let h = source_h / level;
    let (cx, cy) = center.normalized();

    let x = (cx * source_w - w / 2.0).clamp(0.0, (source_w - w).max(0.0));
    let y = (cy * source_h - h / 2.0).clamp(0.0, (source_h - h).max(0.0));

    Rect::new(x, y, w, h)
}
