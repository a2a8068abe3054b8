use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Result;

use annoview::viewer_1d::{self, Config, Viewer1D};
use annoview::AppWindow;
use annoview_core::ParseError;

#[derive(Debug)]
pub struct Args {
    annotations: PathBuf,
    width: u32,
    height: u32,

    init_range: Option<String>,
    max_primitives: Option<usize>,
    min_interval_ms: Option<u64>,

    list: bool,
}

pub fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            let name = std::env::args().next().unwrap_or_else(|| "annoview".into());
            eprintln!("{e}");
            println!("Usage: {name} <annotations.gff3> [--width W] [--height H]");
            println!("    [--range [seqid:]start-end] [--max-primitives N]");
            println!("    [--min-interval-ms N] [--list]");
            return ExitCode::from(1);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            match e.downcast_ref::<ParseError>() {
                Some(ParseError::EmptyResult) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::default();
    if let Some(max) = args.max_primitives {
        config.max_primitives = max;
    }
    if let Some(ms) = args.min_interval_ms {
        config.min_redraw_interval = Duration::from_millis(ms);
    }

    let args_1d = viewer_1d::Args {
        annotations: args.annotations,
        dims: [args.width, args.height],
        init_range: args.init_range,
    };

    let mut viewer = viewer_1d::init(&args_1d, config)?;
    viewer.render(Instant::now())?;

    print_summary(&viewer, args.list);

    Ok(())
}

fn print_summary(viewer: &Viewer1D, list: bool) {
    let result = viewer.result();
    let layout = viewer.layout();

    println!(
        "{}: {} features, {} roots in {} lanes",
        result.name,
        result.stats.total_features,
        result.stats.root_features,
        layout.lane_count()
    );
    println!(
        "sequences: {}",
        result.sequences.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "types: {}",
        result.feature_types.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    if !result.issues.is_empty() {
        println!(
            "issues: {} skipped lines, {} warnings",
            result.stats.error_count, result.stats.warning_count
        );
        for issue in &result.issues {
            println!("  {issue}");
        }
    }

    if let Some(frame) = viewer.frame() {
        let stats = &frame.stats;
        println!(
            "window: {:.0}-{:.0} (scale {:.2})",
            frame.window.start, frame.window.end, frame.transform.scale
        );
        println!(
            "primitives: {}{}",
            stats.primitives,
            if frame.capped { " (capped)" } else { "" }
        );
        println!(
            "visible: {} full, {} with culled children; {} invisible, {} sub-pixel",
            stats.visible_full,
            stats.visible_culled_children,
            stats.invisible,
            stats.sub_pixel
        );
    }

    if list {
        for (ix, lane) in layout.lanes().iter().enumerate() {
            let roots = lane
                .features()
                .iter()
                .filter_map(|&id| result.get(id))
                .map(|f| format!("{} [{}-{}]", f.display_name(), f.start, f.end))
                .collect::<Vec<_>>();
            println!("lane {ix}: {}", roots.join(", "));
        }
    }
}

pub fn parse_args() -> std::result::Result<Args, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    let width = pargs.opt_value_from_str("--width")?.unwrap_or(1200);
    let height = pargs.opt_value_from_str("--height")?.unwrap_or(400);
    let init_range = pargs.opt_value_from_fn("--range", parse_range)?;
    let max_primitives = pargs.opt_value_from_str("--max-primitives")?;
    let min_interval_ms = pargs.opt_value_from_str("--min-interval-ms")?;
    let list = pargs.contains("--list");

    let args = Args {
        annotations: pargs.free_from_os_str(parse_path)?,
        width,
        height,

        init_range,
        max_primitives,
        min_interval_ms,

        list,
    };

    Ok(args)
}

fn parse_range(s: &str) -> Result<String> {
    const ERROR_MSG: &str = "Range must be in the format `[seqid:]start-end`, \
where `start` and `end` are nonnegative integers and `start` <= `end`";

    if viewer_1d::parse_pos_range(s).is_none() {
        anyhow::bail!(ERROR_MSG);
    }

    Ok(s.to_string())
}

fn parse_path(s: &std::ffi::OsStr) -> Result<std::path::PathBuf, &'static str> {
    Ok(s.into())
}
