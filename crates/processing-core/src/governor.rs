//! Playback Governor: decides what the preview does next.
//!
//! The host media element reports time updates at its own cadence; for each
//! one the governor answers with at most one command (seek back to loop a
//! zoom, seek forward past a trim). Pointer clicks on the timeline or the
//! video surface drive the mode transitions.
//!
//! ```text
//!   Free ──add zoom──▶ AwaitingZoomCenter ──video click──▶ ZoomEntered
//!    ▲  ◀──cancel────────────┘                               │
//!    └──────timeline click outside a zoom / region deleted ◀─┘
//! ```

use screenverse_project_model::region::{
    PendingZoom, Region, RegionError, RegionId, RegionSet, ZoomCenter,
};

/// Instruction for the host media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    /// Set the playhead to this many seconds.
    Seek(f64),
    Play,
    Pause,
}

/// Preview interaction mode.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackMode {
    /// No zoom entered; trims are skipped.
    Free,
    /// The user entered this zoom region; playback loops inside it and
    /// trims are ignored.
    ZoomEntered { region_id: RegionId },
    /// A zoom was added and waits for a click on the video to set its
    /// center. Playback is paused.
    AwaitingZoomCenter { pending: PendingZoom },
}

/// Result of a timeline click.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineClick {
    /// Zoom region that was entered, if the click landed in one.
    pub entered: Option<RegionId>,
    pub commands: Vec<PlaybackCommand>,
}

/// Per-session playback state machine.
#[derive(Debug, Clone)]
pub struct PlaybackGovernor {
    mode: PlaybackMode,
    current_time: f64,
    is_playing: bool,
}

impl PlaybackGovernor {
    pub fn new() -> Self {
        Self {
            mode: PlaybackMode::Free,
            current_time: 0.0,
            is_playing: false,
        }
    }

    pub fn mode(&self) -> &PlaybackMode {
        &self.mode
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// True while a zoom region is entered and looping.
    pub fn is_looping(&self) -> bool {
        matches!(self.mode, PlaybackMode::ZoomEntered { .. })
    }

    pub fn active_region_id(&self) -> Option<&str> {
        match &self.mode {
            PlaybackMode::ZoomEntered { region_id } => Some(region_id),
            _ => None,
        }
    }

    pub fn pending_zoom(&self) -> Option<&PendingZoom> {
        match &self.mode {
            PlaybackMode::AwaitingZoomCenter { pending } => Some(pending),
            _ => None,
        }
    }

    /// Record a play/pause change reported by the host.
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Playhead moved without governor involvement (scrubbing).
    pub fn set_current_time(&mut self, time_secs: f64) {
        if time_secs.is_finite() {
            self.current_time = time_secs.max(0.0);
        }
    }

    /// The user clicked the timeline at `time_secs`.
    ///
    /// Always seeks and resumes playback. Landing inside a zoom region
    /// (closed interval) enters it; anywhere else returns to `Free`. A zoom
    /// still waiting for its center is discarded.
    pub fn on_timeline_click(&mut self, regions: &RegionSet, time_secs: f64) -> TimelineClick {
        let time = if time_secs.is_finite() {
            time_secs.clamp(0.0, regions.duration())
        } else {
            self.current_time
        };

        if let PlaybackMode::AwaitingZoomCenter { pending } = &self.mode {
            tracing::debug!(id = pending.id(), "Timeline click discarded pending zoom");
        }

        let entered = regions.zoom_at(time).map(|r| r.id.clone());
        self.mode = match &entered {
            Some(id) => PlaybackMode::ZoomEntered {
                region_id: id.clone(),
            },
            None => PlaybackMode::Free,
        };
        self.current_time = time;
        self.is_playing = true;

        tracing::trace!(time, entered = ?entered, "Timeline click");
        TimelineClick {
            entered,
            commands: vec![PlaybackCommand::Seek(time), PlaybackCommand::Play],
        }
    }

    /// Host time-update tick.
    pub fn on_time_update(&mut self, regions: &RegionSet, time_secs: f64) -> Option<PlaybackCommand> {
        if !time_secs.is_finite() {
            return None;
        }
        self.current_time = time_secs;

        match &self.mode {
            PlaybackMode::AwaitingZoomCenter { .. } => None,
            PlaybackMode::ZoomEntered { region_id } => match regions.get(region_id) {
                Some(active) if active.is_zoom() => {
                    if time_secs >= active.end {
                        self.current_time = active.start;
                        Some(PlaybackCommand::Seek(active.start))
                    } else {
                        None
                    }
                }
                _ => {
                    self.mode = PlaybackMode::Free;
                    self.skip_trims(regions, time_secs)
                }
            },
            PlaybackMode::Free => self.skip_trims(regions, time_secs),
        }
    }

    /// Jump past the trim covering `time`, following trims that start
    /// before the previous one ends so one tick clears a whole chain.
    fn skip_trims(&mut self, regions: &RegionSet, time: f64) -> Option<PlaybackCommand> {
        let mut target = regions.trim_at(time)?.end;
        while let Some(next) = regions.trim_at(target) {
            if next.end <= target {
                break;
            }
            target = next.end;
        }
        self.current_time = target;
        tracing::trace!(from = time, to = target, "Skipping trimmed range");
        Some(PlaybackCommand::Seek(target))
    }

    /// Enter center-picking mode for a freshly created pending zoom.
    pub fn begin_zoom_setup(&mut self, pending: PendingZoom) -> PlaybackCommand {
        self.mode = PlaybackMode::AwaitingZoomCenter { pending };
        self.is_playing = false;
        PlaybackCommand::Pause
    }

    /// The video surface was clicked while picking a zoom center.
    ///
    /// Inserts the finalized region and enters it. Returns `Ok(None)` when
    /// no zoom is waiting. On error the pending zoom is kept.
    pub fn finalize_zoom_center(
        &mut self,
        regions: &mut RegionSet,
        center: ZoomCenter,
    ) -> Result<Option<Region>, RegionError> {
        let pending = match &self.mode {
            PlaybackMode::AwaitingZoomCenter { pending } => pending.clone(),
            _ => return Ok(None),
        };
        let region = regions.set_zoom_center(pending, center)?;
        self.mode = PlaybackMode::ZoomEntered {
            region_id: region.id.clone(),
        };
        Ok(Some(region))
    }

    /// Leave center-picking mode, discarding the pending zoom.
    pub fn cancel_zoom_setup(&mut self) -> Option<PendingZoom> {
        match std::mem::replace(&mut self.mode, PlaybackMode::Free) {
            PlaybackMode::AwaitingZoomCenter { pending } => Some(pending),
            other => {
                self.mode = other;
                None
            }
        }
    }

    /// A region was deleted; leave it if it was the entered zoom.
    pub fn on_region_removed(&mut self, id: &str) {
        if self.active_region_id() == Some(id) {
            self.mode = PlaybackMode::Free;
        }
    }

    /// Drop an entered zoom that no longer exists (after undo/redo/restore).
    pub fn reconcile(&mut self, regions: &RegionSet) {
        if let Some(id) = self.active_region_id() {
            if !regions.get(id).is_some_and(Region::is_zoom) {
                self.mode = PlaybackMode::Free;
            }
        }
    }

    /// Back to a fresh session: no zoom, paused at 0.
    pub fn reset(&mut self) -> Vec<PlaybackCommand> {
        *self = Self::new();
        vec![PlaybackCommand::Pause, PlaybackCommand::Seek(0.0)]
    }

    /// The zoom region dictating the preview transform right now.
    ///
    /// An entered zoom governs regardless of the playhead. Otherwise the
    /// first zoom containing the playhead governs, unless a trim covers the
    /// playhead too: outside an entered zoom, trim wins.
    pub fn governing_zoom<'a>(&self, regions: &'a RegionSet) -> Option<&'a Region> {
        match &self.mode {
            PlaybackMode::ZoomEntered { region_id } => {
                regions.get(region_id).filter(|r| r.is_zoom())
            }
            PlaybackMode::AwaitingZoomCenter { .. } | PlaybackMode::Free => {
                if regions.trim_at(self.current_time).is_some() {
                    return None;
                }
                regions.zoom_at(self.current_time)
            }
        }
    }
}

impl Default for PlaybackGovernor {
    fn default() -> Self {
        Self::new()
    }
}
