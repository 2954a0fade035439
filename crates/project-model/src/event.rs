//! Pointer clicks captured while recording.
//!
//! Clicks are stored as JSONL, one object per line. Coordinates are
//! percentages (0-100) of the captured surface so they map directly onto a
//! zoom center.

use serde::{Deserialize, Serialize};

use crate::region::ZoomCenter;

/// A single pointer press during a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedClick {
    /// Seconds since recording start.
    #[serde(rename = "t")]
    pub time_secs: f64,

    /// Horizontal position, percent of surface width.
    pub x: f64,

    /// Vertical position, percent of surface height.
    pub y: f64,
}

impl RecordedClick {
    pub fn new(time_secs: f64, x: f64, y: f64) -> Self {
        Self { time_secs, x, y }
    }

    /// Build a click from surface pixel coordinates.
    pub fn from_surface(
        time_secs: f64,
        px: f64,
        py: f64,
        surface_width: f64,
        surface_height: f64,
    ) -> Self {
        let x = if surface_width > 0.0 {
            px / surface_width * 100.0
        } else {
            50.0
        };
        let y = if surface_height > 0.0 {
            py / surface_height * 100.0
        } else {
            50.0
        };
        Self::new(time_secs, x, y)
    }

    /// Id of the zoom region derived from this click.
    pub fn zoom_region_id(&self) -> String {
        format!("zoom-mouse-{}", (self.time_secs * 1000.0).floor() as i64)
    }

    pub fn center(&self) -> ZoomCenter {
        ZoomCenter::new(self.x, self.y)
    }

    fn is_valid(&self) -> bool {
        self.time_secs.is_finite() && self.time_secs >= 0.0 && self.x.is_finite() && self.y.is_finite()
    }
}

/// Parse clicks from JSONL content.
///
/// Blank lines and `#` comments are skipped; so are clicks with a negative
/// or non-finite time. Output is ordered by time.
pub fn parse_clicks(jsonl: &str) -> Result<Vec<RecordedClick>, serde_json::Error> {
    let mut clicks = jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str::<RecordedClick>)
        .collect::<Result<Vec<_>, _>>()?;
    clicks.retain(RecordedClick::is_valid);
    clicks.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
    Ok(clicks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let json = serde_json::to_string(&RecordedClick::new(1.5, 30.0, 40.0)).unwrap();
        assert_eq!(json, r#"{"t":1.5,"x":30.0,"y":40.0}"#);
    }

    #[test]
    fn test_parse_sorts_and_skips_comments() {
        let content = "# clicks\n{\"t\":2.0,\"x\":10,\"y\":10}\n\n{\"t\":0.5,\"x\":90,\"y\":5}\n";
        let clicks = parse_clicks(content).unwrap();
        assert_eq!(clicks.len(), 2);
        assert_eq!(clicks[0].time_secs, 0.5);
    }

    #[test]
    fn test_parse_drops_invalid_times() {
        let content = "{\"t\":-1.0,\"x\":10,\"y\":10}\n{\"t\":1.0,\"x\":10,\"y\":10}\n";
        assert_eq!(parse_clicks(content).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        assert!(parse_clicks("{\"t\":1.0}\n").is_err());
    }

    #[test]
    fn test_from_surface_and_id() {
        let click = RecordedClick::from_surface(1.2345, 480.0, 270.0, 1920.0, 1080.0);
        assert!((click.x - 25.0).abs() < 1e-9);
        assert!((click.y - 25.0).abs() < 1e-9);
        assert_eq!(click.zoom_region_id(), "zoom-mouse-1234");
    }
}
