//! Plan command - show the tiles a preload would cover.

use clap::Args;
use tilecache::coord::MAX_REQUEST_TILES;

use super::common::CoverageArgs;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub coverage: CoverageArgs,
}

/// Run the plan command.
pub fn run(args: PlanArgs) -> Result<(), CliError> {
    let request = args.coverage.request();
    let bbox = request.bounding_box().map_err(CliError::InvalidRequest)?;
    let ranges = request.tile_ranges().map_err(CliError::InvalidRequest)?;

    println!(
        "Area: {:.5}, {:.5} ({} m square)",
        request.center.lat, request.center.lon, request.size_meters
    );
    println!(
        "Bounding box: N {:.5}  W {:.5}  S {:.5}  E {:.5}",
        bbox.top_left.lat, bbox.top_left.lon, bbox.bottom_right.lat, bbox.bottom_right.lon
    );
    println!();
    println!("{:>4}  {:>21}  {:>21}  {:>10}", "Zoom", "Columns (x)", "Rows (y)", "Tiles");

    let mut total = 0u64;
    for range in &ranges {
        let count = range.count();
        total += count;
        println!(
            "{:>4}  {:>21}  {:>21}  {:>10}",
            range.zoom,
            format!("{}..{}", range.x.start, range.x.end - 1),
            format!("{}..{}", range.y.start, range.y.end - 1),
            count
        );
    }

    println!();
    println!("Total: {} tiles", total);
    if total > MAX_REQUEST_TILES {
        println!(
            "Too large for one preload (limit {} tiles); shrink the area or zoom range.",
            MAX_REQUEST_TILES
        );
    }
    Ok(())
}
