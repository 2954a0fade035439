//! Clip metadata probing: duration recovery and first-frame thumbnails.

use std::time::Duration;

use screenverse_common::error::{ScreenverseError, ScreenverseResult};
use screenverse_project_model::viewport::{fit_rect, Rect};

use crate::media::{Canvas, Rgba, VideoSource};

/// Target used to force the container to be scanned to its end.
const DURATION_PROBE_SECS: f64 = 1e10;

/// Upper bound on the seek-to-end workaround.
pub const DURATION_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Duration of `source`, resolving sources that report an unknown length.
///
/// Freshly recorded streams often report an infinite duration until the
/// decoder has walked the whole file, so a far-past-the-end seek is issued
/// and the playhead returned to 0 afterwards.
pub async fn resolve_duration(source: &mut dyn VideoSource) -> ScreenverseResult<f64> {
    let reported = source.duration();
    if reported.is_finite() && reported > 0.0 {
        return Ok(reported);
    }

    tracing::debug!(reported, "Source duration unknown, probing end of stream");
    if tokio::time::timeout(DURATION_PROBE_TIMEOUT, source.seek(DURATION_PROBE_SECS))
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_ms = DURATION_PROBE_TIMEOUT.as_millis() as u64,
            "Seek to end of stream timed out"
        );
    }
    let resolved = source.duration();

    if tokio::time::timeout(DURATION_PROBE_TIMEOUT, source.seek(0.0))
        .await
        .is_err()
    {
        tracing::warn!("Seek back to start timed out after duration probe");
    }

    if resolved.is_finite() && resolved > 0.0 {
        tracing::debug!(duration_secs = resolved, "Resolved source duration");
        Ok(resolved)
    } else {
        Err(ScreenverseError::render(format!(
            "could not determine clip duration (source reports {resolved})"
        )))
    }
}

/// PNG of the first frame, letterboxed into a 16:9 canvas `width` wide.
pub async fn capture_thumbnail(
    source: &mut dyn VideoSource,
    canvas: &mut dyn Canvas,
    width: u32,
) -> ScreenverseResult<Vec<u8>> {
    let (source_w, source_h) = source.dimensions();
    if width == 0 || source_w == 0 || source_h == 0 {
        return Err(ScreenverseError::render(format!(
            "cannot thumbnail a {source_w}x{source_h} source at width {width}"
        )));
    }

    if source.current_time() != 0.0
        && tokio::time::timeout(DURATION_PROBE_TIMEOUT, source.seek(0.0))
            .await
            .is_err()
    {
        tracing::warn!("Seek to first frame timed out, thumbnail uses current frame");
    }

    let height = ((width as f64) * 9.0 / 16.0).round().max(1.0) as u32;
    canvas.resize(width, height);
    canvas.fill(Rgba::BLACK);
    let dst = fit_rect(
        source_w as f64,
        source_h as f64,
        Rect::sized(width as f64, height as f64),
    );
    canvas.draw_video(
        &*source,
        Rect::sized(source_w as f64, source_h as f64),
        dst,
    );
    canvas.snapshot_png()
}
