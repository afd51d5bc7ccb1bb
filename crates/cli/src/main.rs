use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use rand::rngs::StdRng;
use rand::SeedableRng;

use augment_core::acoustics::infrastructure::room_acoustics_transformer::{
    RoomOutputLength, DEFAULT_ROOM_POOL_SIZE,
};
use augment_core::audio::infrastructure::wav_reader::WavReader;
use augment_core::audio::infrastructure::wav_writer::WavWriter;
use augment_core::augmentation::infrastructure::noise_mix_transformer::{
    DEFAULT_NOISE_MU, DEFAULT_NOISE_SD,
};
use augment_core::augmentation::infrastructure::tempo_shift_transformer::DEFAULT_TEMPO_RATIO;
use augment_core::pipeline::augment_dataset_use_case::{
    AugmentDatasetUseCase, AugmentReport, DatasetOptions,
};
use augment_core::pipeline::augmentation_pipeline::AugmentationPipeline;
use augment_core::pipeline::pipeline_config::{PipelineConfig, TransformFlags};
use augment_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use augment_core::shared::constants::SAMPLE_RATE;

/// Augment a speech dataset with background noise, simulated room
/// acoustics and tempo changes, mirroring it into a new directory.
#[derive(Parser, Debug)]
#[command(name = "augment", version)]
struct Cli {
    /// Directory containing the source dataset.
    source: PathBuf,

    /// Directory the augmented dataset is written to.
    target: PathBuf,

    /// Directory of noise WAV files (enables noise mixing).
    #[arg(long)]
    noise_dir: Option<PathBuf>,

    /// Mean of the noise gain distribution.
    #[arg(long, default_value_t = DEFAULT_NOISE_MU)]
    noise_mu: f64,

    /// Standard deviation of the noise gain distribution.
    #[arg(long, default_value_t = DEFAULT_NOISE_SD)]
    noise_sd: f64,

    /// Reverberate audio in randomly sampled rooms.
    #[arg(long)]
    room_simulation: bool,

    /// Number of rooms sampled for the simulation pool.
    #[arg(long, default_value_t = DEFAULT_ROOM_POOL_SIZE)]
    rooms: usize,

    /// Length of simulated audio: full (keeps onset and reverb tail) or match-input.
    #[arg(long, default_value = "full")]
    room_output: String,

    /// Tempo ratio (> 1 speeds up, 1.0 disables).
    #[arg(long, default_value_t = DEFAULT_TEMPO_RATIO)]
    tempo: f64,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,

    /// Base random seed (random and logged when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Number of worker threads.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// JSON pipeline description, instead of the per-transform flags.
    #[arg(
        long,
        conflicts_with_all = [
            "noise_dir", "noise_mu", "noise_sd", "room_simulation", "rooms", "room_output", "tempo",
        ]
    )]
    config: Option<PathBuf>,

    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose, cli.quiet)),
    )
    .format_timestamp(None)
    .init();
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate(&cli)?;

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::from_flags(&transform_flags(&cli)?, cli.seed),
    };
    let seed = match cli.seed.or(config.seed) {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            log::info!("No seed given, using {seed}");
            seed
        }
    };
    config.seed = Some(seed);
    log::debug!("Pipeline config:\n{}", config.to_json());

    let reader = WavReader::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let pipeline = AugmentationPipeline::from_config(&config, &reader, SAMPLE_RATE, &mut rng)?;
    if pipeline.is_empty() {
        log::warn!("No transforms enabled; audio files are re-encoded unchanged");
    }

    let mut use_case = AugmentDatasetUseCase::new(
        Box::new(reader),
        Box::new(WavWriter::new()),
        pipeline,
        Box::new(StdoutPipelineLogger::default()),
    );
    let options = DatasetOptions {
        recursive: cli.recursive,
        jobs: cli.jobs,
        seed,
    };
    let report = use_case.run(&cli.source, &cli.target, &options)?;
    print_report(&report, &cli);
    Ok(())
}

fn print_report(report: &AugmentReport, cli: &Cli) {
    log::info!(
        "Augmented {} files, copied {}, created {} directories in {}",
        report.augmented,
        report.copied,
        report.directories,
        cli.target.display()
    );
    if report.has_skips() {
        log::warn!("Skipped {} files:", report.skipped.len());
        for skipped in &report.skipped {
            log::warn!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}

fn transform_flags(cli: &Cli) -> Result<TransformFlags, String> {
    Ok(TransformFlags {
        noise_dir: cli.noise_dir.clone(),
        noise_mu: cli.noise_mu,
        noise_sd: cli.noise_sd,
        room_simulation: cli.room_simulation,
        rooms: cli.rooms,
        room_output: parse_room_output(&cli.room_output)?,
        tempo: cli.tempo,
    })
}

fn parse_room_output(value: &str) -> Result<RoomOutputLength, String> {
    match value {
        "full" => Ok(RoomOutputLength::Full),
        "match-input" => Ok(RoomOutputLength::MatchInput),
        other => Err(format!(
            "Room output must be 'full' or 'match-input', got '{other}'"
        )),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.source.is_dir() {
        return Err(format!("Source directory not found: {}", cli.source.display()).into());
    }
    if cli.jobs == 0 {
        return Err("Jobs must be at least 1".into());
    }
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
        return Ok(());
    }
    if let Some(dir) = &cli.noise_dir {
        if !dir.is_dir() {
            return Err(format!("Noise directory not found: {}", dir.display()).into());
        }
    }
    if !cli.noise_mu.is_finite() {
        return Err(format!("Noise mu must be finite, got {}", cli.noise_mu).into());
    }
    if !cli.noise_sd.is_finite() || cli.noise_sd < 0.0 {
        return Err(format!("Noise sd must be non-negative, got {}", cli.noise_sd).into());
    }
    if cli.room_simulation && cli.rooms == 0 {
        return Err("Rooms must be at least 1".into());
    }
    if !cli.tempo.is_finite() || cli.tempo <= 0.0 {
        return Err(format!("Tempo must be a positive ratio, got {}", cli.tempo).into());
    }
    parse_room_output(&cli.room_output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("augment").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["in", "out"]).unwrap();
        assert_eq!(cli.rooms, 10);
        assert_eq!(cli.jobs, 1);
        assert_eq!(cli.tempo, 1.0);
        assert_eq!(cli.room_output, "full");
        assert!(!cli.recursive);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_config_conflicts_with_transform_flags() {
        assert!(parse(&["in", "out", "--config", "p.json", "--tempo", "1.2"]).is_err());
        assert!(parse(&["in", "out", "--config", "p.json", "--room-simulation"]).is_err());
        assert!(parse(&["in", "out", "--config", "p.json", "--seed", "3"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(parse(&["in", "out", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(0, true), "warn");
        assert_eq!(log_filter(0, false), "info");
        assert_eq!(log_filter(1, false), "debug");
        assert_eq!(log_filter(3, false), "trace");
    }

    #[test]
    fn test_parse_room_output() {
        assert_eq!(parse_room_output("full").unwrap(), RoomOutputLength::Full);
        assert_eq!(
            parse_room_output("match-input").unwrap(),
            RoomOutputLength::MatchInput
        );
        assert!(parse_room_output("tail").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let src = tempdir().unwrap();
        let source = src.path().to_str().unwrap();

        assert!(validate(&parse(&[source, "out"]).unwrap()).is_ok());
        assert!(validate(&parse(&["/no/such/dir", "out"]).unwrap()).is_err());
        assert!(validate(&parse(&[source, "out", "--jobs", "0"]).unwrap()).is_err());
        assert!(validate(&parse(&[source, "out", "--tempo", "0"]).unwrap()).is_err());
        assert!(validate(&parse(&[source, "out", "--noise-sd=-1"]).unwrap()).is_err());
        assert!(validate(&parse(&[source, "out", "--room-output", "tail"]).unwrap()).is_err());
        assert!(
            validate(&parse(&[source, "out", "--room-simulation", "--rooms", "0"]).unwrap())
                .is_err()
        );
        assert!(validate(&parse(&[source, "out", "--noise-dir", "/no/noise"]).unwrap()).is_err());
    }

    #[test]
    fn test_flags_build_ordered_pipeline_config() {
        let cli = parse(&[
            "in",
            "out",
            "--tempo",
            "1.1",
            "--room-simulation",
            "--room-output",
            "match-input",
            "--noise-dir",
            "noise",
        ])
        .unwrap();
        let config = PipelineConfig::from_flags(&transform_flags(&cli).unwrap(), Some(5));
        assert_eq!(config.transforms.len(), 3);
        assert_eq!(config.seed, Some(5));
    }
}
