//! coinscan CLI: calibrate on a reference coin, then count euro coins.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use coinscan::image_io::{gray_view, load_color_image, load_edge_image, rgb_view};
use coinscan::io::{load_calibration, write_calibration};
use coinscan::{CoinDetectConfig, CoinDetectReport, CoinDetector, CoinDetectorParams, SearchMode};
use log::{info, LevelFilter};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "coinscan")]
#[command(about = "Detect euro coins in edge images and add up their value")]
#[command(version)]
struct Cli {
    /// Log debug output (per-radius peaks, per-circle classification).
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the reference coin and write a calibration file.
    Calibrate {
        #[command(flatten)]
        frame: FrameArgs,
        /// Path to write the calibration (JSON).
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Value all coins using a saved calibration.
    Detect {
        #[command(flatten)]
        frame: FrameArgs,
        /// Calibration written by `calibrate`.
        #[arg(long)]
        calibration: PathBuf,
        /// Path to write the report (JSON).
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Mark circles in the reference radius range without calibration.
    Circles {
        /// Path to the binary edge image.
        #[arg(long)]
        edges: PathBuf,
        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Run a full detection described by a JSON config.
    Run {
        /// Path to a `CoinDetectConfig` JSON file.
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct FrameArgs {
    /// Path to the binary edge image.
    #[arg(long)]
    edges: PathBuf,
    /// Path to the color frame the edge image was derived from.
    #[arg(long)]
    color: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct DetectorArgs {
    /// Detector parameters (JSON); missing fields use defaults.
    #[arg(long)]
    params: Option<PathBuf>,
    /// Sweep radii on one thread.
    #[arg(long, conflicts_with = "workers")]
    sequential: bool,
    /// Number of radius partitions swept in parallel.
    #[arg(long)]
    workers: Option<usize>,
}

impl DetectorArgs {
    fn to_params(&self) -> CliResult<CoinDetectorParams> {
        let mut params = match &self.params {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => CoinDetectorParams::default(),
        };
        if self.sequential {
            params.mode = SearchMode::Sequential;
        } else if let Some(workers) = self.workers {
            params.mode = SearchMode::Parallel { workers };
        }
        Ok(params)
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_log);

    match cli.command {
        Commands::Calibrate {
            frame,
            out,
            detector,
        } => run_calibrate(&frame, &out, &detector),
        Commands::Detect {
            frame,
            calibration,
            out,
            detector,
        } => run_detect(&frame, &calibration, &out, &detector),
        Commands::Circles { edges, detector } => run_circles(&edges, &detector),
        Commands::Run { config } => run_config(&config),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init_with_filter(level);
        coinscan::core::init_tracing(json, level);
    }

    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--json-log needs the `tracing` feature; using plain logs");
        }
        let _ = coinscan::core::init_with_level(level);
    }
}

fn run_calibrate(frame: &FrameArgs, out: &Path, args: &DetectorArgs) -> CliResult<()> {
    let edges = load_edge_image(&frame.edges)?;
    let color = load_color_image(&frame.color)?;

    let mut detector = CoinDetector::new(args.to_params()?);
    let reference = detector.calibrate_from_frame(&gray_view(&edges), &rgb_view(&color))?;
    if let Some(calibration) = detector.calibration() {
        write_calibration(calibration, out)?;
    }
    println!("reference coin: {reference}");
    println!("wrote calibration to {}", out.display());
    Ok(())
}

fn run_detect(
    frame: &FrameArgs,
    calibration: &Path,
    out: &Path,
    args: &DetectorArgs,
) -> CliResult<()> {
    let edges = load_edge_image(&frame.edges)?;
    let color = load_color_image(&frame.color)?;

    let mut detector = CoinDetector::new(args.to_params()?);
    let calibration = load_calibration(calibration)?;
    detector.set_calibration(calibration.clone());

    let mut report = CoinDetectReport::new(
        &frame.edges.to_string_lossy(),
        &frame.color.to_string_lossy(),
    );
    report.calibration = Some(calibration);
    match detector.detect_coins(&gray_view(&edges), &rgb_view(&color)) {
        Ok(res) => {
            println!("{res}");
            report.set_detection(res);
        }
        Err(e) => report.set_error(e),
    }
    report.write_json(out)?;
    println!("wrote report to {}", out.display());
    Ok(())
}

fn run_circles(edges_path: &Path, args: &DetectorArgs) -> CliResult<()> {
    let edges = load_edge_image(edges_path)?;
    let detector = CoinDetector::new(args.to_params()?);
    let circles = detector.detect_circles(&gray_view(&edges))?;

    println!("list of circles:");
    for (i, c) in circles.iter().enumerate() {
        println!(" circle #{i}\t{c}");
    }
    Ok(())
}

fn run_config(config_path: &Path) -> CliResult<()> {
    let cfg = CoinDetectConfig::load_json(config_path)?;
    info!(
        "Loading images: {} / {}",
        cfg.edge_image_path, cfg.color_image_path
    );
    let edges = load_edge_image(&cfg.edge_image_path)?;
    let color = load_color_image(&cfg.color_image_path)?;
    let (edges, color) = (gray_view(&edges), rgb_view(&color));

    let mut detector = cfg.build_detector();
    let mut report = CoinDetectReport::from_config(&cfg, config_path);

    let calibrated = match &cfg.calibration_path {
        Some(path) => {
            detector.set_calibration(load_calibration(path)?);
            Ok(())
        }
        None => detector
            .calibrate_from_frame(&edges, &color)
            .map(|reference| report.reference = Some(reference)),
    };

    match calibrated.and_then(|()| detector.detect_coins(&edges, &color)) {
        Ok(res) => {
            println!("{res}");
            report.set_detection(res);
        }
        Err(e) => report.set_error(e),
    }
    report.calibration = detector.calibration().cloned();

    let out = cfg.output_path();
    report.write_json(&out)?;
    println!("wrote report to {}", out.display());
    Ok(())
}
