//! Print the export plan for a region set.

use std::path::PathBuf;

use screenverse_project_model::project::{AspectRatio, ExportConfig};
use screenverse_project_model::region::{Region, RegionSet};
use screenverse_render_engine::compositor::{plan_export, ExportPlan, SourceInfo};

pub struct PlanArgs {
    pub regions: PathBuf,
    pub duration: f64,
    pub aspect: AspectRatio,
    pub fps: Option<u32>,
    pub source_width: u32,
    pub source_height: u32,
    pub json: bool,
}

pub fn run(args: PlanArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.regions)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.regions.display()))?;
    let plan = build_plan(&content, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Export plan for {}", args.regions.display());
    println!(
        "  Canvas: {}x{} ({})",
        plan.canvas_width, plan.canvas_height, args.aspect
    );
    println!(
        "  Video placement: {:.1},{:.1} {:.1}x{:.1}",
        plan.placement.x, plan.placement.y, plan.placement.w, plan.placement.h
    );
    println!("  Frame rate: {} fps", plan.frame_rate);
    println!(
        "  Frames: {} ({:.2}s of {:.2}s source)",
        plan.total_frames(),
        plan.output_duration_secs(),
        plan.duration_secs
    );
    println!("  Zoomed frames: {}", plan.zoomed_frames());
    println!("  Kept segments:");
    for (start, end) in &plan.kept_segments {
        println!("    {start:>8.3}s - {end:>8.3}s");
    }
    Ok(())
}

fn build_plan(content: &str, args: &PlanArgs) -> anyhow::Result<ExportPlan> {
    let regions: Vec<Region> = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse regions: {e}"))?;
    let supplied = regions.len();

    let mut set = RegionSet::new(args.duration).map_err(|e| anyhow::anyhow!("{e}"))?;
    let accepted = set.merge_imported(regions);
    if accepted < supplied {
        tracing::warn!(
            supplied,
            accepted,
            "Some regions were dropped (duplicate ids or unrepairable bounds)"
        );
    }

    let config = ExportConfig {
        aspect_ratio: args.aspect,
        frame_rate: args.fps,
        ..ExportConfig::default()
    };
    let source = SourceInfo {
        width: args.source_width,
        height: args.source_height,
        reported_frame_rate: None,
        decoded_frames: None,
    };
    Ok(plan_export(&set, &config, &source)?)
}
