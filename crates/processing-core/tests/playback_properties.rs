use proptest::prelude::*;

use screenverse_common::EditorDefaults;
use screenverse_processing_core::auto_zoom::AutoZoomAnalyzer;
use screenverse_processing_core::governor::{PlaybackCommand, PlaybackGovernor};
use screenverse_processing_core::session::EditorSession;
use screenverse_project_model::event::parse_clicks;
use screenverse_project_model::region::{RegionSet, ZoomCenter};

/// Tick from `from` to `until` every `dt`, applying seeks. Returns every
/// playhead observed after the governor had its say.
fn play(
    governor: &mut PlaybackGovernor,
    regions: &RegionSet,
    from: f64,
    until: f64,
    dt: f64,
) -> Vec<f64> {
    let mut seen = Vec::new();
    let mut t = from;
    while t < until && seen.len() < 20_000 {
        if let Some(PlaybackCommand::Seek(target)) = governor.on_time_update(regions, t) {
            t = target;
        }
        seen.push(t);
        t += dt;
    }
    seen
}

proptest! {
    #[test]
    fn trim_skip_lands_on_end_and_never_reenters(
        start in 0.5f64..8.0,
        width in 0.1f64..1.5,
        dt in 0.01f64..0.9,
    ) {
        let mut regions = RegionSet::new(10.0).unwrap();
        let trim = regions.add_trim(start, start + width).unwrap();
        let mut governor = PlaybackGovernor::new();

        for t in play(&mut governor, &regions, 0.0, 10.0, dt) {
            prop_assert!(!trim.covers_frame(t), "playhead {} inside trim {:?}", t, trim);
        }
    }

    #[test]
    fn entered_zoom_never_overshoots_by_more_than_a_tick(
        start in 0.0f64..8.0,
        width in 0.1f64..2.0,
        dt in 0.01f64..0.5,
    ) {
        let mut regions = RegionSet::new(10.0).unwrap();
        regions
            .add_region(
                screenverse_project_model::region::NewRegion::zoom_at(ZoomCenter::MIDDLE),
                start,
                start + width,
            )
            .unwrap();
        let zoom = regions.regions()[0].clone();

        let mut governor = PlaybackGovernor::new();
        governor.on_timeline_click(&regions, zoom.start);
        prop_assert!(governor.is_looping());

        for t in play(&mut governor, &regions, zoom.start, zoom.start + 40.0, dt) {
            prop_assert!(t >= zoom.start - 1e-9);
            prop_assert!(t <= zoom.end + dt + 1e-9, "escaped to {} from {:?}", t, zoom);
        }
    }
}

#[test]
fn recorded_clicks_become_non_overlapping_importable_zooms() {
    let clicks = parse_clicks(
        "{\"t\":0.5,\"x\":10,\"y\":20}\n\
         {\"t\":0.6,\"x\":80,\"y\":80}\n\
         {\"t\":3.0,\"x\":50,\"y\":50}\n\
         {\"t\":9.95,\"x\":90,\"y\":90}\n",
    )
    .unwrap();
    let imported = AutoZoomAnalyzer::with_defaults().analyze(&clicks, Some(10.0));
    assert_eq!(imported.len(), 3);

    let mut session = EditorSession::new(10.0, EditorDefaults::default()).unwrap();
    assert_eq!(session.merge_imported(imported.clone()), 3);
    assert_eq!(session.merge_imported(imported), 0);
    assert!(!session.history().can_undo());

    let zooms: Vec<_> = session.regions().iter().collect();
    for (i, a) in zooms.iter().enumerate() {
        for b in zooms.iter().skip(i + 1) {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
        assert!(a.end <= 10.0);
    }

    let click = session.on_timeline_click(0.55);
    assert_eq!(click.entered.as_deref(), Some("zoom-mouse-500"));
}
