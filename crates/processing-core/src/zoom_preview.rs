//! Zoom preview helpers.
//!
//! Generates CSS-like transform styles so UI clients can present a zoom on
//! the preview element without running the renderer, plus an animator for
//! hosts that interpolate the scale themselves.

use screenverse_project_model::region::{Region, ZoomCenter};

/// Transition used when a zoom starts governing.
pub const ZOOM_IN_SECS: f64 = 0.78;

/// Transition used when returning to 1x.
pub const ZOOM_OUT_SECS: f64 = 0.63;

/// Ease-out-quad control points.
pub const ZOOM_EASING: &str = "cubic-bezier(0.25, 0.46, 0.45, 0.94)";

/// Transform to apply to the preview element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStyle {
    pub scale: f64,
    pub origin: ZoomCenter,
    pub transition_secs: f64,
}

impl ZoomStyle {
    pub fn css_transform(&self) -> String {
        format!("scale({})", self.scale)
    }

    pub fn css_transform_origin(&self) -> String {
        format!("{}% {}%", self.origin.x, self.origin.y)
    }

    pub fn css_transition(&self) -> String {
        format!("transform {}s {}", self.transition_secs, ZOOM_EASING)
    }

    pub fn is_zoomed(&self) -> bool {
        self.scale > 1.0
    }
}

/// Tracks the last zoom center so zooming back out never jumps to the
/// frame origin.
#[derive(Debug, Clone)]
pub struct ZoomPreview {
    last_center: ZoomCenter,
}

impl ZoomPreview {
    pub fn new() -> Self {
        Self {
            last_center: ZoomCenter::MIDDLE,
        }
    }

    pub fn last_center(&self) -> ZoomCenter {
        self.last_center
    }

    /// Style for the governing zoom region (or none).
    pub fn style(&mut self, governing: Option<&Region>) -> ZoomStyle {
        match governing.and_then(Region::zoom) {
            Some(zoom) => {
                self.last_center = zoom.center;
                ZoomStyle {
                    scale: zoom.level,
                    origin: zoom.center,
                    transition_secs: ZOOM_IN_SECS,
                }
            }
            None => ZoomStyle {
                scale: 1.0,
                origin: self.last_center,
                transition_secs: ZOOM_OUT_SECS,
            },
        }
    }
}

impl Default for ZoomPreview {
    fn default() -> Self {
        Self::new()
    }
}

/// `cubic-bezier(0.25, 0.46, 0.45, 0.94)` evaluated at progress `t`.
pub fn ease_out_quad(t: f64) -> f64 {
    const X1: f64 = 0.25;
    const Y1: f64 = 0.46;
    const X2: f64 = 0.45;
    const Y2: f64 = 0.94;

    let t = t.clamp(0.0, 1.0);
    let bezier = |p1: f64, p2: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    };

    // Solve x(s) = t by bisection; x is monotonic for these control points.
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if bezier(X1, X2, mid) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier(Y1, Y2, (lo + hi) / 2.0)
}

/// Samples an eased scale between successive targets.
#[derive(Debug, Clone)]
pub struct ZoomAnimator {
    from: f64,
    to: f64,
    started_at: f64,
    duration: f64,
}

impl ZoomAnimator {
    pub fn new() -> Self {
        Self {
            from: 1.0,
            to: 1.0,
            started_at: 0.0,
            duration: 0.0,
        }
    }

    /// Retarget at `now_secs`, starting from the value currently shown.
    pub fn retarget(&mut self, style: &ZoomStyle, now_secs: f64) {
        if (style.scale - self.to).abs() < f64::EPSILON {
            return;
        }
        self.from = self.sample(now_secs);
        self.to = style.scale;
        self.started_at = now_secs;
        self.duration = style.transition_secs;
    }

    /// Scale shown at `now_secs`.
    pub fn sample(&self, now_secs: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let progress = (now_secs - self.started_at) / self.duration;
        self.from + (self.to - self.from) * ease_out_quad(progress)
    }

    pub fn is_settled(&self, now_secs: f64) -> bool {
        now_secs - self.started_at >= self.duration
    }
}

impl Default for ZoomAnimator {
    fn default() -> Self {
        Self::new()
    }
}
