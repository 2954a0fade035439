use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use screenverse_common::error::{ScreenverseError, ScreenverseResult};
use screenverse_project_model::project::{Background, ExportConfig, PresetBackground};
use screenverse_project_model::region::{NewRegion, RegionSet, ZoomCenter};
use screenverse_project_model::viewport::Rect;
use screenverse_render_engine::export::{
    export_clip, ExportCancel, ExportJob, ExportProgress, ExportStage, ExportTargets,
    ExportTuning, ProgressCallback,
};
use screenverse_render_engine::metadata::{capture_thumbnail, resolve_duration};
use screenverse_render_engine::{
    Canvas, ImageLoader, LoadedImage, MediaStream, Recorder, RecorderFactory, RecorderOptions,
    Rgba, VideoSource,
};

// ---- fakes -----------------------------------------------------------------

struct FakeVideo {
    width: u32,
    height: u32,
    reported_duration: f64,
    true_duration: f64,
    time: f64,
    stall_seeks: bool,
    seeks: Arc<Mutex<Vec<f64>>>,
}

impl FakeVideo {
    fn new(duration: f64) -> Self {
        Self {
            width: 1920,
            height: 1080,
            reported_duration: duration,
            true_duration: duration,
            time: 0.0,
            stall_seeks: false,
            seeks: Arc::default(),
        }
    }
}

#[async_trait]
impl VideoSource for FakeVideo {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration(&self) -> f64 {
        self.reported_duration
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn reported_frame_rate(&self) -> Option<f64> {
        Some(30.0)
    }

    fn decoded_frame_count(&self) -> Option<u64> {
        None
    }

    async fn seek(&mut self, time_secs: f64) {
        self.seeks.lock().unwrap().push(time_secs);
        if self.stall_seeks {
            std::future::pending::<()>().await;
        }
        if time_secs >= self.true_duration {
            self.reported_duration = self.true_duration;
        }
        self.time = time_secs.min(self.true_duration);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CanvasOp {
    Clear,
    Fill(Rgba),
    Image(String, Rect),
    Video { at: f64, src: Rect, dst: Rect },
}

#[derive(Default)]
struct FakeCanvas {
    size: (u32, u32),
    ops: Arc<Mutex<Vec<CanvasOp>>>,
}

impl FakeCanvas {
    fn video_draws(&self) -> Vec<(f64, Rect, Rect)> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Video { at, src, dst } => Some((*at, *src, *dst)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for FakeCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn fill(&mut self, color: Rgba) {
        self.ops.lock().unwrap().push(CanvasOp::Fill(color));
    }

    fn clear(&mut self) {
        self.ops.lock().unwrap().push(CanvasOp::Clear);
    }

    fn draw_image(&mut self, image: &LoadedImage, dst: Rect) {
        self.ops
            .lock()
            .unwrap()
            .push(CanvasOp::Image(image.source.clone(), dst));
    }

    fn draw_video(&mut self, source: &dyn VideoSource, src: Rect, dst: Rect) {
        self.ops.lock().unwrap().push(CanvasOp::Video {
            at: source.current_time(),
            src,
            dst,
        });
    }

    fn capture_stream(&mut self, fps: u32) -> MediaStream {
        MediaStream {
            id: "canvas-stream".to_string(),
            frame_rate: Some(fps as f64),
            has_audio: false,
        }
    }

    fn snapshot_png(&self) -> ScreenverseResult<Vec<u8>> {
        let mut png = b"\x89PNG".to_vec();
        png.extend_from_slice(&self.size.0.to_be_bytes());
        png.extend_from_slice(&self.size.1.to_be_bytes());
        Ok(png)
    }
}

struct FakeImages {
    fail: bool,
}

#[async_trait]
impl ImageLoader for FakeImages {
    async fn load(&self, source: &str) -> ScreenverseResult<LoadedImage> {
        if self.fail {
            return Err(ScreenverseError::FileNotFound {
                path: source.into(),
            });
        }
        Ok(LoadedImage {
            source: source.to_string(),
            width: 1000,
            height: 1000,
        })
    }
}

struct FakeRecorders {
    supported: Vec<&'static str>,
    chunks: Vec<Vec<u8>>,
    created: Arc<Mutex<Vec<RecorderOptions>>>,
    stops: Arc<AtomicUsize>,
}

impl FakeRecorders {
    fn producing(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            supported: vec!["video/webm;codecs=vp9", "video/webm"],
            chunks,
            created: Arc::default(),
            stops: Arc::default(),
        }
    }

    fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

struct FakeRecorder {
    mime_type: String,
    chunks: Vec<Vec<u8>>,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl Recorder for FakeRecorder {
    fn start(&mut self) -> ScreenverseResult<()> {
        Ok(())
    }

    fn pause(&mut self) -> ScreenverseResult<()> {
        Ok(())
    }

    fn resume(&mut self) -> ScreenverseResult<()> {
        Ok(())
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn stop(&mut self) -> ScreenverseResult<Vec<Vec<u8>>> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(std::mem::take(&mut self.chunks))
    }
}

impl RecorderFactory for FakeRecorders {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.contains(&mime_type)
    }

    fn create(
        &self,
        _stream: &MediaStream,
        options: RecorderOptions,
    ) -> ScreenverseResult<Box<dyn Recorder>> {
        self.created.lock().unwrap().push(options.clone());
        Ok(Box::new(FakeRecorder {
            mime_type: options.mime_type,
            chunks: self.chunks.clone(),
            stops: self.stops.clone(),
        }))
    }
}

fn progress_log() -> (Arc<Mutex<Vec<ExportProgress>>>, ProgressCallback) {
    let log: Arc<Mutex<Vec<ExportProgress>>> = Arc::default();
    let sink = log.clone();
    (
        log,
        Box::new(move |p: ExportProgress| sink.lock().unwrap().push(p)),
    )
}

fn job(regions: RegionSet, background: Background) -> ExportJob {
    ExportJob {
        regions,
        config: ExportConfig {
            background,
            ..ExportConfig::default()
        },
    }
}

// ---- tests -----------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn trimmed_range_is_never_rendered() {
    let mut regions = RegionSet::new(10.0).unwrap();
    regions.add_trim(2.0, 4.0).unwrap();

    let mut video = FakeVideo::new(10.0);
    let seeks = video.seeks.clone();
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![1, 2, 3], vec![4]]);
    let (progress, callback) = progress_log();

    let output = export_clip(
        &job(regions, Background::Black),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        Some(callback),
    )
    .await
    .unwrap();

    assert_eq!(output.data, vec![1, 2, 3, 4]);
    assert_eq!(output.mime_type, "video/webm;codecs=vp9");
    assert_eq!(recorders.stop_count(), 1);
    assert_eq!(canvas.size, (1920, 1080));

    let draws = canvas.video_draws();
    assert_eq!(draws.len(), 240);
    assert!(draws.iter().all(|(at, _, _)| !(2.0..4.0).contains(at)));
    assert!(seeks.lock().unwrap().iter().all(|t| !(2.0..4.0).contains(t)));
    assert!(seeks.lock().unwrap().contains(&4.0));

    let progress = progress.lock().unwrap();
    assert_eq!(progress.first().unwrap().stage, ExportStage::Preparing);
    let rendering: Vec<&ExportProgress> = progress
        .iter()
        .filter(|p| p.stage == ExportStage::Rendering)
        .collect();
    assert_eq!(rendering.len(), 240);
    assert!(rendering.windows(2).all(|w| w[0].progress <= w[1].progress));
    assert!(rendering.iter().all(|p| p.progress <= 0.9 + 1e-12));
    let last = progress.last().unwrap();
    assert_eq!(last.stage, ExportStage::Complete);
    assert_eq!(last.progress, 1.0);
}

#[tokio::test(start_paused = true)]
async fn zoom_frames_sample_a_crop_into_the_same_placement() {
    let mut regions = RegionSet::new(3.0).unwrap();
    regions
        .add_region(NewRegion::zoom_at(ZoomCenter::new(0.0, 0.0)), 1.0, 2.0)
        .unwrap();

    let mut video = FakeVideo::new(3.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![9]]);

    export_clip(
        &job(regions, Background::None),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await
    .unwrap();

    let draws = canvas.video_draws();
    assert_eq!(draws.len(), 90);
    let full = Rect::sized(1920.0, 1080.0);
    let zoomed: Vec<_> = draws.iter().filter(|(_, src, _)| *src != full).collect();
    assert_eq!(zoomed.len(), 30);
    for (_, src, dst) in &zoomed {
        assert_eq!(*src, Rect::new(0.0, 0.0, 1280.0, 720.0));
        assert_eq!(*dst, full);
    }
}

#[tokio::test(start_paused = true)]
async fn failed_background_image_degrades_to_clear() {
    let regions = RegionSet::new(1.0).unwrap();
    let mut video = FakeVideo::new(1.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![7]]);

    let output = export_clip(
        &job(
            regions,
            Background::Custom {
                path: "/missing/bg.png".into(),
            },
        ),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: true },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await;

    assert!(output.is_ok());
    let ops = canvas.ops.lock().unwrap();
    assert!(!ops.iter().any(|op| matches!(op, CanvasOp::Image(..))));
    assert_eq!(ops.iter().filter(|op| **op == CanvasOp::Clear).count(), 30);
}

#[tokio::test(start_paused = true)]
async fn preset_background_is_drawn_cover_fit() {
    let regions = RegionSet::new(0.5).unwrap();
    let mut video = FakeVideo::new(0.5);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![7]]);

    export_clip(
        &job(
            regions,
            Background::Preset {
                preset: PresetBackground::TechBlue,
            },
        ),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await
    .unwrap();

    let ops = canvas.ops.lock().unwrap();
    let images: Vec<&Rect> = ops
        .iter()
        .filter_map(|op| match op {
            CanvasOp::Image(source, dst) => {
                assert_eq!(source, PresetBackground::TechBlue.url());
                Some(dst)
            }
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 15);
    assert_eq!(*images[0], Rect::new(0.0, -420.0, 1920.0, 1920.0));
}

#[tokio::test(start_paused = true)]
async fn stalled_seeks_time_out_and_export_still_finishes() {
    let mut regions = RegionSet::new(1.0).unwrap();
    regions.add_trim(0.2, 0.6).unwrap();

    let mut video = FakeVideo::new(1.0);
    video.stall_seeks = true;
    let seeks = video.seeks.clone();
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![1]]);

    let output = export_clip(
        &job(regions, Background::Black),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(output.chunk_count, 1);
    assert_eq!(canvas.video_draws().len(), 18);
    assert!(!seeks.lock().unwrap().is_empty());
    assert_eq!(recorders.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_recorder_once_and_reports_frames() {
    let regions = RegionSet::new(5.0).unwrap();
    let mut video = FakeVideo::new(5.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![1]]);

    let cancel = ExportCancel::new();
    let trigger = cancel.clone();
    let callback: ProgressCallback = Box::new(move |p: ExportProgress| {
        if p.stage == ExportStage::Rendering && p.frames_rendered == 5 {
            trigger.cancel();
        }
    });

    let err = export_clip(
        &job(regions, Background::None),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &cancel,
        Some(callback),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ScreenverseError::ExportCancelled { frames_rendered: 5 }
    ));
    assert_eq!(canvas.video_draws().len(), 5);
    assert_eq!(recorders.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_frame_wait_draws_nothing_more() {
    let regions = RegionSet::new(5.0).unwrap();
    let mut video = FakeVideo::new(5.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![1]]);
    let cancel = ExportCancel::new();
    let trigger = cancel.clone();

    // 30 fps: frames at 0 and 33 ms are drawn, the cancel lands while
    // waiting for the 67 ms tick.
    let job = job(regions, Background::None);
    let tuning = ExportTuning::default();
    let (result, ()) = tokio::join!(
        export_clip(
            &job,
            ExportTargets {
                source: &mut video,
                canvas: &mut canvas,
                images: &FakeImages { fail: false },
                recorders: &recorders,
            },
            &tuning,
            &cancel,
            None,
        ),
        async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        }
    );

    assert!(matches!(
        result.unwrap_err(),
        ScreenverseError::ExportCancelled { frames_rendered: 2 }
    ));
    assert_eq!(canvas.video_draws().len(), 2);
    assert_eq!(recorders.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn recorder_without_data_fails_the_export() {
    let regions = RegionSet::new(1.0).unwrap();
    let mut video = FakeVideo::new(1.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![Vec::new()]);
    let (progress, callback) = progress_log();

    let err = export_clip(
        &job(regions, Background::None),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        Some(callback),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ScreenverseError::EmptyExport { .. }));
    assert_eq!(recorders.stop_count(), 1);
    assert_eq!(
        progress.lock().unwrap().last().unwrap().stage,
        ExportStage::Failed
    );
}

#[tokio::test(start_paused = true)]
async fn fully_trimmed_clip_fails_before_recording() {
    let mut regions = RegionSet::new(2.0).unwrap();
    regions.add_trim(0.0, 2.0).unwrap();
    let mut video = FakeVideo::new(2.0);
    let mut canvas = FakeCanvas::default();
    let recorders = FakeRecorders::producing(vec![vec![1]]);

    let err = export_clip(
        &job(regions, Background::None),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ScreenverseError::EmptyExport { .. }));
    assert!(recorders.created.lock().unwrap().is_empty());
    assert!(canvas.video_draws().is_empty());
}

#[tokio::test(start_paused = true)]
async fn recorder_uses_first_supported_container() {
    let regions = RegionSet::new(0.5).unwrap();
    let mut video = FakeVideo::new(0.5);
    let mut canvas = FakeCanvas::default();
    let mut recorders = FakeRecorders::producing(vec![vec![1]]);
    recorders.supported = vec!["video/webm;codecs=vp8"];

    let output = export_clip(
        &job(regions, Background::None),
        ExportTargets {
            source: &mut video,
            canvas: &mut canvas,
            images: &FakeImages { fail: false },
            recorders: &recorders,
        },
        &ExportTuning::default(),
        &ExportCancel::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(output.mime_type, "video/webm;codecs=vp8");
    let created = recorders.created.lock().unwrap();
    assert_eq!(created[0].video_bitrate_bps, 8_000_000);
}

#[tokio::test(start_paused = true)]
async fn infinite_duration_is_resolved_by_seeking_to_the_end() {
    let mut video = FakeVideo::new(12.5);
    video.reported_duration = f64::INFINITY;
    let seeks = video.seeks.clone();

    let duration = resolve_duration(&mut video).await.unwrap();
    assert_eq!(duration, 12.5);
    assert_eq!(video.current_time(), 0.0);
    assert_eq!(*seeks.lock().unwrap(), vec![1e10, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn unresolvable_duration_is_an_error() {
    let mut video = FakeVideo::new(12.5);
    video.reported_duration = f64::INFINITY;
    video.stall_seeks = true;

    let err = resolve_duration(&mut video).await.unwrap_err();
    assert!(matches!(err, ScreenverseError::Render { .. }));
}

#[tokio::test(start_paused = true)]
async fn thumbnail_is_a_letterboxed_first_frame() {
    let mut video = FakeVideo::new(4.0);
    video.width = 720;
    video.height = 720;
    video.time = 2.0;
    let mut canvas = FakeCanvas::default();

    let png = capture_thumbnail(&mut video, &mut canvas, 320).await.unwrap();
    assert!(png.starts_with(b"\x89PNG"));
    assert_eq!(canvas.size, (320, 180));

    let draws = canvas.video_draws();
    assert_eq!(draws.len(), 1);
    let (at, _, dst) = draws[0];
    assert_eq!(at, 0.0);
    assert_eq!(dst, Rect::new(70.0, 0.0, 180.0, 180.0));
}
