//! Auto-Zoom: turn clicks recorded during capture into zoom regions.
//!
//! # Algorithm
//!
//! 1. **Window** every click as `[t - lead, t + tail]`, floored at zero.
//! 2. **Merge** windows that overlap; the merged region keeps the first
//!    click's position and id.
//! 3. **Clamp** to the clip duration when it is known.
//!
//! The output never contains overlapping zoom regions, so it is always
//! exportable as-is.

use screenverse_project_model::event::RecordedClick;
use screenverse_project_model::region::{
    Region, RegionKind, ZoomOrigin, ZoomSettings, DEFAULT_ZOOM_LEVEL, MAX_ZOOM_LEVEL,
    MIN_REGION_SECS, MIN_ZOOM_LEVEL,
};

/// Configuration for the click analyzer.
#[derive(Debug, Clone)]
pub struct AutoZoomConfig {
    /// Seconds of lead-in before each click.
    pub lead_secs: f64,

    /// Seconds the zoom holds after each click.
    pub tail_secs: f64,

    /// Magnification of generated regions.
    pub zoom_level: f64,
}

impl Default for AutoZoomConfig {
    fn default() -> Self {
        Self {
            lead_secs: 0.1,
            tail_secs: 0.3,
            zoom_level: DEFAULT_ZOOM_LEVEL,
        }
    }
}

/// Converts recorded clicks into candidate zoom regions.
pub struct AutoZoomAnalyzer {
    config: AutoZoomConfig,
}

impl AutoZoomAnalyzer {
    pub fn new(config: AutoZoomConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AutoZoomConfig::default())
    }

    /// Build zoom regions from `clicks`.
    ///
    /// With `duration_secs`, regions are clamped into the clip and clicks
    /// past its end are ignored.
    pub fn analyze(&self, clicks: &[RecordedClick], duration_secs: Option<f64>) -> Vec<Region> {
        let duration = duration_secs.filter(|d| d.is_finite() && *d >= MIN_REGION_SECS);
        let level = self.config.zoom_level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);

        let mut sorted: Vec<&RecordedClick> = clicks
            .iter()
            .filter(|c| c.time_secs.is_finite() && c.time_secs >= 0.0)
            .filter(|c| duration.map_or(true, |d| c.time_secs <= d))
            .collect();
        sorted.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));

        let mut regions: Vec<Region> = Vec::new();
        for click in sorted {
            let start = (click.time_secs - self.config.lead_secs).max(0.0);
            let end = click.time_secs + self.config.tail_secs;

            if let Some(last) = regions.last_mut() {
                if start < last.end {
                    last.end = last.end.max(end);
                    continue;
                }
            }

            regions.push(Region {
                id: click.zoom_region_id(),
                kind: RegionKind::Zoom(ZoomSettings {
                    center: click.center(),
                    level,
                    origin: ZoomOrigin::RecordedClicks,
                }),
                start,
                end,
            });
        }

        if let Some(duration) = duration {
            for region in &mut regions {
                region.end = region.end.min(duration);
                if region.end - region.start < MIN_REGION_SECS {
                    region.start = (region.end - MIN_REGION_SECS).max(0.0);
                }
            }
            // Clamping the tail can make the last two touch again.
            regions.dedup_by(|later, earlier| {
                if later.overlaps(earlier) {
                    earlier.end = earlier.end.max(later.end);
                    true
                } else {
                    false
                }
            });
        }

        tracing::debug!(
            clicks = clicks.len(),
            regions = regions.len(),
            "Derived zoom regions from recorded clicks"
        );
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(t: f64, x: f64, y: f64) -> RecordedClick {
        RecordedClick::new(t, x, y)
    }

    #[test]
    fn test_no_clicks_no_regions() {
        assert!(AutoZoomAnalyzer::with_defaults().analyze(&[], None).is_empty());
    }

    #[test]
    fn test_single_click_window() {
        let regions = AutoZoomAnalyzer::with_defaults().analyze(&[click(2.0, 25.0, 75.0)], None);
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.id, "zoom-mouse-2000");
        assert!((region.start - 1.9).abs() < 1e-9);
        assert!((region.end - 2.3).abs() < 1e-9);

        let zoom = region.zoom().unwrap();
        assert_eq!(zoom.level, 1.5);
        assert_eq!(zoom.origin, ZoomOrigin::RecordedClicks);
        assert_eq!(zoom.center.x, 25.0);
    }

    #[test]
    fn test_click_at_start_floors_at_zero() {
        let regions = AutoZoomAnalyzer::with_defaults().analyze(&[click(0.05, 50.0, 50.0)], None);
        assert_eq!(regions[0].start, 0.0);
    }

    #[test]
    fn test_overlapping_clicks_merge_keeping_first_center() {
        let clicks = [click(1.0, 10.0, 10.0), click(1.2, 90.0, 90.0), click(5.0, 40.0, 40.0)];
        let regions = AutoZoomAnalyzer::with_defaults().analyze(&clicks, None);
        assert_eq!(regions.len(), 2);
        assert!((regions[0].end - 1.5).abs() < 1e-9);
        assert_eq!(regions[0].zoom().unwrap().center.x, 10.0);

        for pair in regions.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_clamped_to_duration() {
        let clicks = [click(9.9, 50.0, 50.0), click(12.0, 50.0, 50.0)];
        let regions = AutoZoomAnalyzer::with_defaults().analyze(&clicks, Some(10.0));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].end, 10.0);
        assert!(regions[0].span_secs() >= MIN_REGION_SECS - 1e-9);
    }
}
