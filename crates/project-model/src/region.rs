//! Timeline regions: time-bound trim and zoom edit operations.
//!
//! A [`RegionSet`] owns every region of one clip and enforces the bounds
//! invariant on each mutation: `0 <= start < end <= duration` with a minimum
//! width of [`MIN_REGION_SECS`]. Regions may overlap freely; deciding which
//! region governs an instant belongs to playback and export.

use serde::{Deserialize, Serialize};

/// Smallest span a region may have, in seconds.
pub const MIN_REGION_SECS: f64 = 0.1;

/// Zoom magnification domain.
pub const MIN_ZOOM_LEVEL: f64 = 1.0;
pub const MAX_ZOOM_LEVEL: f64 = 3.0;
pub const DEFAULT_ZOOM_LEVEL: f64 = 1.5;

/// Stable region identifier.
pub type RegionId = String;

/// Focal point of a zoom, as percentages (0-100) of frame width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCenter {
    pub x: f64,
    pub y: f64,
}

impl ZoomCenter {
    /// Frame center.
    pub const MIDDLE: ZoomCenter = ZoomCenter { x: 50.0, y: 50.0 };

    /// Create a center, clamping both axes into `[0, 100]`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Center as normalized `[0, 1]` fractions.
    pub fn normalized(&self) -> (f64, f64) {
        (self.x / 100.0, self.y / 100.0)
    }
}

impl Default for ZoomCenter {
    fn default() -> Self {
        Self::MIDDLE
    }
}

/// How a zoom region came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomOrigin {
    /// Placed by the user clicking the preview surface.
    #[default]
    PointerClick,
    /// Derived from clicks captured while recording.
    RecordedClicks,
}

/// Zoom-only region parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomSettings {
    #[serde(rename = "zoom_center")]
    pub center: ZoomCenter,

    #[serde(rename = "zoom_level", default = "default_zoom_level")]
    pub level: f64,

    #[serde(rename = "zoom_origin", default)]
    pub origin: ZoomOrigin,
}

fn default_zoom_level() -> f64 {
    DEFAULT_ZOOM_LEVEL
}

/// Region variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    /// Time range cut out of preview and export.
    Trim,
    /// Time range shown as a magnified crop.
    Zoom(ZoomSettings),
}

/// A time-bound edit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,

    #[serde(flatten)]
    pub kind: RegionKind,

    /// Start time in seconds.
    pub start: f64,

    /// End time in seconds.
    pub end: f64,
}

impl Region {
    pub fn is_trim(&self) -> bool {
        matches!(self.kind, RegionKind::Trim)
    }

    pub fn is_zoom(&self) -> bool {
        matches!(self.kind, RegionKind::Zoom(_))
    }

    /// Zoom parameters, if this is a zoom region.
    pub fn zoom(&self) -> Option<&ZoomSettings> {
        match &self.kind {
            RegionKind::Zoom(settings) => Some(settings),
            RegionKind::Trim => None,
        }
    }

    pub fn span_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Closed-interval test used by interactive preview (`start <= t <= end`).
    pub fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start && time_secs <= self.end
    }

    /// Half-open test used for frame exclusion (`start <= t < end`).
    pub fn covers_frame(&self, time_secs: f64) -> bool {
        time_secs >= self.start && time_secs < self.end
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn kind_prefix(&self) -> &'static str {
        match self.kind {
            RegionKind::Trim => "trim",
            RegionKind::Zoom(_) => "zoom",
        }
    }
}

/// What to create in [`RegionSet::add_region`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewRegion {
    Trim,
    Zoom {
        /// `None` leaves the zoom pending until a center is supplied.
        center: Option<ZoomCenter>,
        level: f64,
        origin: ZoomOrigin,
    },
}

impl NewRegion {
    /// A pointer-placed zoom awaiting its center.
    pub fn pending_zoom() -> Self {
        Self::Zoom {
            center: None,
            level: DEFAULT_ZOOM_LEVEL,
            origin: ZoomOrigin::PointerClick,
        }
    }

    /// A pointer-placed zoom with a known center.
    pub fn zoom_at(center: ZoomCenter) -> Self {
        Self::Zoom {
            center: Some(center),
            level: DEFAULT_ZOOM_LEVEL,
            origin: ZoomOrigin::PointerClick,
        }
    }
}

/// A zoom region that has bounds but no focal point yet.
///
/// It is not part of any set until [`RegionSet::set_zoom_center`] finalizes
/// it; dropping it discards the region entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingZoom {
    id: RegionId,
    start: f64,
    end: f64,
    level: f64,
    origin: ZoomOrigin,
}

impl PendingZoom {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

/// Result of [`RegionSet::add_region`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddedRegion {
    /// Inserted into the set.
    Region(Region),
    /// Zoom created without a center; not yet inserted.
    PendingZoom(PendingZoom),
}

/// Errors raised at the region mutation boundary. A failed mutation leaves
/// the set untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("Invalid region bounds [{start}, {end}]: {reason}")]
    InvalidRegionBounds { start: f64, end: f64, reason: String },

    #[error("Invalid clip duration: {duration}")]
    InvalidDuration { duration: f64 },

    #[error("Invalid zoom parameter: {reason}")]
    InvalidZoom { reason: String },

    #[error("Region not found: {id}")]
    RegionNotFound { id: String },

    #[error("Region {id} is not a zoom region")]
    NotAZoomRegion { id: String },
}

impl RegionError {
    fn bounds(start: f64, end: f64, reason: impl Into<String>) -> Self {
        Self::InvalidRegionBounds {
            start,
            end,
            reason: reason.into(),
        }
    }

    fn not_found(id: &str) -> Self {
        Self::RegionNotFound { id: id.to_string() }
    }
}

/// All regions of one clip over a bounded timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet {
    duration: f64,
    regions: Vec<Region>,
    next_seq: u64,
}

impl RegionSet {
    /// Create an empty set for a clip of `duration` seconds.
    pub fn new(duration: f64) -> Result<Self, RegionError> {
        if !duration.is_finite() || duration < MIN_REGION_SECS {
            return Err(RegionError::InvalidDuration { duration });
        }
        Ok(Self {
            duration,
            regions: Vec::new(),
            next_seq: 1,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Create a region with a fresh id, clamped into the clip bounds.
    ///
    /// A zoom without a center comes back as [`AddedRegion::PendingZoom`]
    /// and is not inserted.
    pub fn add_region(
        &mut self,
        spec: NewRegion,
        start: f64,
        end: f64,
    ) -> Result<AddedRegion, RegionError> {
        match spec {
            NewRegion::Trim => self.add_trim(start, end).map(AddedRegion::Region),
            NewRegion::Zoom {
                center: None,
                level,
                origin,
            } => self
                .add_pending_zoom(start, end, level, origin)
                .map(AddedRegion::PendingZoom),
            NewRegion::Zoom {
                center: Some(center),
                level,
                origin,
            } => {
                let (start, end) = clamp_span(start, end, self.duration)?;
                let settings = ZoomSettings {
                    center: checked_center(center)?,
                    level: checked_zoom_level(level)?,
                    origin,
                };
                let region = Region {
                    id: self.fresh_id("zoom"),
                    kind: RegionKind::Zoom(settings),
                    start,
                    end,
                };
                self.regions.push(region.clone());
                tracing::debug!(id = %region.id, start, end, "Added zoom region");
                Ok(AddedRegion::Region(region))
            }
        }
    }

    /// [`RegionSet::add_region`] for a trim.
    pub fn add_trim(&mut self, start: f64, end: f64) -> Result<Region, RegionError> {
        let (start, end) = clamp_span(start, end, self.duration)?;
        let region = Region {
            id: self.fresh_id("trim"),
            kind: RegionKind::Trim,
            start,
            end,
        };
        self.regions.push(region.clone());
        tracing::debug!(id = %region.id, start, end, "Added trim region");
        Ok(region)
    }

    /// [`RegionSet::add_region`] for a zoom without a center.
    pub fn add_pending_zoom(
        &mut self,
        start: f64,
        end: f64,
        level: f64,
        origin: ZoomOrigin,
    ) -> Result<PendingZoom, RegionError> {
        let (start, end) = clamp_span(start, end, self.duration)?;
        let level = checked_zoom_level(level)?;
        Ok(PendingZoom {
            id: self.fresh_id("zoom"),
            start,
            end,
            level,
            origin,
        })
    }

    /// Finalize a pending zoom with its focal point and insert it.
    pub fn set_zoom_center(
        &mut self,
        pending: PendingZoom,
        center: ZoomCenter,
    ) -> Result<Region, RegionError> {
        let center = checked_center(center)?;
        let (start, end) = clamp_span(pending.start, pending.end, self.duration)?;
        let id = if self.contains_id(&pending.id) {
            self.fresh_id("zoom")
        } else {
            pending.id
        };
        let region = Region {
            id,
            kind: RegionKind::Zoom(ZoomSettings {
                center,
                level: pending.level,
                origin: pending.origin,
            }),
            start,
            end,
        };
        self.regions.push(region.clone());
        tracing::debug!(id = %region.id, x = center.x, y = center.y, "Zoom center set");
        Ok(region)
    }

    /// Move one or both edges of a region (drag handles).
    ///
    /// The opposite edge never moves: an edge dragged past it stops
    /// [`MIN_REGION_SECS`] short.
    pub fn update_region_bounds(
        &mut self,
        id: &str,
        new_start: Option<f64>,
        new_end: Option<f64>,
    ) -> Result<&Region, RegionError> {
        let duration = self.duration;
        let index = self.index_of(id)?;
        let region = &self.regions[index];

        for value in [new_start, new_end].into_iter().flatten() {
            if !value.is_finite() {
                return Err(RegionError::bounds(
                    new_start.unwrap_or(region.start),
                    new_end.unwrap_or(region.end),
                    "bounds must be finite",
                ));
            }
        }

        let mut start = region.start;
        let mut end = region.end;
        if let Some(s) = new_start {
            start = s.clamp(0.0, (end - MIN_REGION_SECS).max(0.0));
        }
        if let Some(e) = new_end {
            end = e.clamp((start + MIN_REGION_SECS).min(duration), duration);
        }

        let region = &mut self.regions[index];
        region.start = start;
        region.end = end;
        Ok(&self.regions[index])
    }

    /// Shift a region to a new start, preserving its width.
    pub fn move_region(&mut self, id: &str, new_start: f64) -> Result<&Region, RegionError> {
        let duration = self.duration;
        let index = self.index_of(id)?;
        let region = &mut self.regions[index];

        if !new_start.is_finite() {
            return Err(RegionError::bounds(
                new_start,
                region.end,
                "start must be finite",
            ));
        }

        let width = region.span_secs();
        let start = new_start.clamp(0.0, (duration - width).max(0.0));
        region.start = start;
        region.end = (start + width).min(duration);
        Ok(&self.regions[index])
    }

    /// Change a zoom region's magnification, clamped into `[1.0, 3.0]`.
    pub fn set_zoom_level(&mut self, id: &str, level: f64) -> Result<&Region, RegionError> {
        let level = checked_zoom_level(level)?;
        let index = self.index_of(id)?;
        match &mut self.regions[index].kind {
            RegionKind::Zoom(settings) => settings.level = level,
            RegionKind::Trim => {
                return Err(RegionError::NotAZoomRegion { id: id.to_string() });
            }
        }
        Ok(&self.regions[index])
    }

    pub fn remove_region(&mut self, id: &str) -> Result<Region, RegionError> {
        let index = self.index_of(id)?;
        Ok(self.regions.remove(index))
    }

    /// Remove every region, returning what was removed.
    pub fn clear_all(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.regions)
    }

    /// Copy of the current region list, for history.
    pub fn snapshot(&self) -> Vec<Region> {
        self.regions.clone()
    }

    /// Replace the region list with a history snapshot.
    pub fn restore(&mut self, snapshot: Vec<Region>) {
        self.regions = snapshot;
    }

    /// Insert externally produced regions whose ids are not present yet.
    ///
    /// Bounds and zoom parameters are re-clamped; regions that cannot be
    /// repaired are skipped. Returns the number inserted.
    pub fn merge_imported(&mut self, imported: Vec<Region>) -> usize {
        let mut inserted = 0;
        for mut region in imported {
            if self.contains_id(&region.id) {
                tracing::debug!(id = %region.id, "Skipping already-present imported region");
                continue;
            }
            let (start, end) = match clamp_span(region.start, region.end, self.duration) {
                Ok(span) => span,
                Err(err) => {
                    tracing::warn!(id = %region.id, error = %err, "Dropping imported region");
                    continue;
                }
            };
            region.start = start;
            region.end = end;
            if let RegionKind::Zoom(settings) = &mut region.kind {
                if !settings.level.is_finite() || !settings.center.is_finite() {
                    tracing::warn!(id = %region.id, "Dropping imported zoom with invalid parameters");
                    continue;
                }
                settings.level = settings.level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
                settings.center = ZoomCenter::new(settings.center.x, settings.center.y);
            }
            self.regions.push(region);
            inserted += 1;
        }
        inserted
    }

    /// First zoom region (insertion order) containing `time_secs`, inclusive.
    pub fn zoom_at(&self, time_secs: f64) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.is_zoom() && r.contains(time_secs))
    }

    /// First trim region whose half-open span covers `time_secs`.
    pub fn trim_at(&self, time_secs: f64) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.is_trim() && r.covers_frame(time_secs))
    }

    /// Time ranges that survive trimming, in order.
    pub fn kept_segments(&self) -> Vec<(f64, f64)> {
        kept_segments(&self.regions, self.duration)
    }

    fn index_of(&self, id: &str) -> Result<usize, RegionError> {
        self.regions
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RegionError::not_found(id))
    }

    fn fresh_id(&mut self, prefix: &str) -> RegionId {
        loop {
            let id = format!("{prefix}-{}", self.next_seq);
            self.next_seq += 1;
            if !self.contains_id(&id) {
                return id;
            }
        }
    }
}

/// Complement of the merged trim ranges over `[0, duration]`.
///
/// Empty segments are dropped, so a trim that reaches the clip end leaves
/// no zero-length tail.
pub fn kept_segments(regions: &[Region], duration: f64) -> Vec<(f64, f64)> {
    const EPSILON: f64 = 1e-9;

    let mut trims: Vec<(f64, f64)> = regions
        .iter()
        .filter(|r| r.is_trim())
        .map(|r| (r.start.max(0.0), r.end.min(duration)))
        .collect();
    trims.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut segments = Vec::new();
    let mut cursor = 0.0f64;
    for (start, end) in trims {
        if start > cursor + EPSILON {
            segments.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if duration > cursor + EPSILON {
        segments.push((cursor, duration));
    }
    segments
}

/// Clamp `[start, end]` into `[0, duration]` with the minimum width.
fn clamp_span(start: f64, end: f64, duration: f64) -> Result<(f64, f64), RegionError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(RegionError::bounds(start, end, "bounds must be finite"));
    }
    if end < start {
        return Err(RegionError::bounds(start, end, "end precedes start"));
    }

    let mut start = start.clamp(0.0, duration);
    let mut end = end.clamp(0.0, duration);
    if end - start < MIN_REGION_SECS {
        end = start + MIN_REGION_SECS;
        if end > duration {
            end = duration;
            start = (duration - MIN_REGION_SECS).max(0.0);
        }
    }
    Ok((start, end))
}

fn checked_zoom_level(level: f64) -> Result<f64, RegionError> {
    if !level.is_finite() {
        return Err(RegionError::InvalidZoom {
            reason: format!("zoom level {level} is not finite"),
        });
    }
    Ok(level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL))
}

fn checked_center(center: ZoomCenter) -> Result<ZoomCenter, RegionError> {
    if !center.is_finite() {
        return Err(RegionError::InvalidZoom {
            reason: "zoom center is not finite".to_string(),
        });
    }
    Ok(ZoomCenter::new(center.x, center.y))
}
