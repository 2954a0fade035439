//! Editor session: one clip's regions, history and playback state.
//!
//! Every structural edit (add, delete, reset, finished drag) records the
//! pre-mutation region list before it is applied. The session is owned by
//! the caller; nothing here is global.

use screenverse_common::EditorDefaults;
use screenverse_project_model::history::EditHistory;
use screenverse_project_model::region::{
    Region, RegionError, RegionId, RegionSet, ZoomCenter, ZoomOrigin,
};
use screenverse_project_model::viewport::Rect;

use crate::governor::{PlaybackCommand, PlaybackGovernor, TimelineClick};
use crate::zoom_preview::{ZoomPreview, ZoomStyle};

#[derive(Debug, Clone)]
struct DragState {
    region_id: RegionId,
    changed: bool,
}

/// Interactive editing state for one loaded clip.
#[derive(Debug, Clone)]
pub struct EditorSession {
    regions: RegionSet,
    history: EditHistory,
    governor: PlaybackGovernor,
    preview: ZoomPreview,
    selected: Option<RegionId>,
    drag: Option<DragState>,
    defaults: EditorDefaults,
}

impl EditorSession {
    /// Start editing a clip of `duration_secs` with an empty region set.
    pub fn new(duration_secs: f64, defaults: EditorDefaults) -> Result<Self, RegionError> {
        Ok(Self {
            regions: RegionSet::new(duration_secs)?,
            history: EditHistory::with_depth(defaults.history_depth),
            governor: PlaybackGovernor::new(),
            preview: ZoomPreview::new(),
            selected: None,
            drag: None,
            defaults,
        })
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn governor(&self) -> &PlaybackGovernor {
        &self.governor
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn current_time(&self) -> f64 {
        self.governor.current_time()
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), RegionError> {
        match id {
            Some(id) if !self.regions.contains_id(id) => Err(RegionError::RegionNotFound {
                id: id.to_string(),
            }),
            _ => {
                self.selected = id.map(str::to_string);
                Ok(())
            }
        }
    }

    /// `[playhead, playhead + duration * fraction]`, end clamped.
    fn span_at_playhead(&self) -> (f64, f64) {
        let duration = self.regions.duration();
        let start = self.governor.current_time().clamp(0.0, duration);
        let length = duration * self.defaults.new_region_fraction;
        (start, (start + length).min(duration))
    }

    /// Add a trim at the playhead and select it.
    pub fn add_trim_at_playhead(&mut self) -> Result<Region, RegionError> {
        let (start, end) = self.span_at_playhead();
        let before = self.regions.snapshot();
        let region = self.regions.add_trim(start, end)?;
        self.history.push(before);
        self.selected = Some(region.id.clone());
        Ok(region)
    }

    /// Create a zoom at the playhead and wait for its center.
    ///
    /// Returns the pause command for the host. Nothing is recorded in
    /// history until the center is set.
    pub fn begin_zoom_at_playhead(&mut self) -> Result<PlaybackCommand, RegionError> {
        let (start, end) = self.span_at_playhead();
        let pending = self.regions.add_pending_zoom(
            start,
            end,
            self.defaults.default_zoom_level,
            ZoomOrigin::PointerClick,
        )?;
        Ok(self.governor.begin_zoom_setup(pending))
    }

    /// Supply the pending zoom's center; the zoom is inserted, selected
    /// and entered. `Ok(None)` when no zoom was waiting.
    pub fn finalize_zoom_center(&mut self, center: ZoomCenter) -> Result<Option<Region>, RegionError> {
        let before = self.regions.snapshot();
        let region = self.governor.finalize_zoom_center(&mut self.regions, center)?;
        if let Some(region) = &region {
            self.history.push(before);
            self.selected = Some(region.id.clone());
            tracing::debug!(id = %region.id, "Zoom region finalized");
        }
        Ok(region)
    }

    /// A click on the rendered preview at `(px, py)` inside `bounds`.
    pub fn on_video_click(
        &mut self,
        bounds: Rect,
        px: f64,
        py: f64,
    ) -> Result<Option<Region>, RegionError> {
        if self.governor.pending_zoom().is_none() {
            return Ok(None);
        }
        self.finalize_zoom_center(bounds.percent_of(px, py))
    }

    pub fn cancel_zoom_setup(&mut self) -> bool {
        self.governor.cancel_zoom_setup().is_some()
    }

    /// Delete the selected region. No-op without a selection.
    pub fn delete_selected(&mut self) -> Result<Option<Region>, RegionError> {
        let Some(id) = self.selected.clone() else {
            return Ok(None);
        };
        let before = self.regions.snapshot();
        let removed = self.regions.remove_region(&id)?;
        self.history.push(before);
        self.governor.on_region_removed(&id);
        self.selected = None;
        Ok(Some(removed))
    }

    /// Remove every region and start playback state over. Returns the
    /// commands that rewind and pause the host.
    pub fn reset(&mut self) -> Vec<PlaybackCommand> {
        let before = self.regions.snapshot();
        self.regions.clear_all();
        self.history.cancel_gesture();
        self.history.push(before);
        self.preview = ZoomPreview::new();
        self.selected = None;
        self.drag = None;
        self.governor.reset()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.regions.snapshot()) {
            Some(previous) => {
                self.apply_snapshot(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.regions.snapshot()) {
            Some(next) => {
                self.apply_snapshot(next);
                true
            }
            None => false,
        }
    }

    fn apply_snapshot(&mut self, snapshot: Vec<Region>) {
        self.regions.restore(snapshot);
        self.selected = None;
        self.drag = None;
        self.governor.reconcile(&self.regions);
    }

    /// Start dragging a region edge or body; selects it.
    pub fn begin_drag(&mut self, id: &str) -> Result<(), RegionError> {
        if !self.regions.contains_id(id) {
            return Err(RegionError::RegionNotFound { id: id.to_string() });
        }
        if self.history.in_gesture() {
            // The previous drag never saw its release.
            self.end_drag();
        }
        self.history.begin_gesture(self.regions.snapshot());
        self.drag = Some(DragState {
            region_id: id.to_string(),
            changed: false,
        });
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Live edge drag.
    pub fn drag_bounds(
        &mut self,
        new_start: Option<f64>,
        new_end: Option<f64>,
    ) -> Result<&Region, RegionError> {
        let id = self.drag_target()?;
        let before = self.bounds_of(&id);
        let region = self.regions.update_region_bounds(&id, new_start, new_end)?;
        if before != Some((region.start, region.end)) {
            if let Some(drag) = self.drag.as_mut() {
                drag.changed = true;
            }
        }
        Ok(region)
    }

    /// Live body drag.
    pub fn drag_move(&mut self, new_start: f64) -> Result<&Region, RegionError> {
        let id = self.drag_target()?;
        let before = self.bounds_of(&id);
        let region = self.regions.move_region(&id, new_start)?;
        if before != Some((region.start, region.end)) {
            if let Some(drag) = self.drag.as_mut() {
                drag.changed = true;
            }
        }
        Ok(region)
    }

    /// Finish a drag, recording one history entry if anything moved.
    pub fn end_drag(&mut self) -> bool {
        let changed = self.drag.take().is_some_and(|d| d.changed);
        self.history.end_gesture(changed)
    }

    fn drag_target(&self) -> Result<RegionId, RegionError> {
        self.drag
            .as_ref()
            .map(|d| d.region_id.clone())
            .ok_or_else(|| RegionError::RegionNotFound {
                id: "<no drag in progress>".to_string(),
            })
    }

    fn bounds_of(&self, id: &str) -> Option<(f64, f64)> {
        self.regions.get(id).map(|r| (r.start, r.end))
    }

    /// Change the entered zoom's magnification. `Ok(None)` when no zoom
    /// is entered.
    pub fn set_zoom_level(&mut self, level: f64) -> Result<Option<&Region>, RegionError> {
        let Some(id) = self.governor.active_region_id().map(str::to_string) else {
            return Ok(None);
        };
        self.regions.set_zoom_level(&id, level).map(Some)
    }

    /// Merge regions from the import channel. Not recorded in history.
    pub fn merge_imported(&mut self, imported: Vec<Region>) -> usize {
        let count = self.regions.merge_imported(imported);
        if count > 0 {
            tracing::info!(count, "Merged imported regions");
        }
        count
    }

    pub fn on_time_update(&mut self, time_secs: f64) -> Option<PlaybackCommand> {
        self.governor.on_time_update(&self.regions, time_secs)
    }

    /// Timeline click: seek, play, and select the zoom entered (if any).
    pub fn on_timeline_click(&mut self, time_secs: f64) -> TimelineClick {
        let click = self.governor.on_timeline_click(&self.regions, time_secs);
        self.selected = click.entered.clone();
        click
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.governor.set_playing(playing);
    }

    /// Preview transform for the current playhead.
    pub fn zoom_style(&mut self) -> ZoomStyle {
        let governing = self.governor.governing_zoom(&self.regions);
        self.preview.style(governing)
    }
}
