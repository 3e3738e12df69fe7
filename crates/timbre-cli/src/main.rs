//! Timbre - classify the genre of MP3/WAV clips from the command line
//!
//! ```text
//! timbre song.mp3 other.wav
//! timbre --json --model ./genre-classifier.onnx clips/*.wav
//! cat clip.wav | timbre -
//! ```
//!
//! Logs go to stderr; set RUST_LOG=debug for pipeline details or RUST_LOG=warn
//! to keep only problems.

mod report;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use timbre_core::config;
use timbre_core::dedup::{ContentHash, UploadMemo};
use timbre_core::{Classification, ClassifyError, Pipeline};

/// Path argument that reads the clip from standard input
const STDIN_PATH: &str = "-";

#[derive(Debug, Parser)]
#[command(name = "timbre", version, about = "Classify the music genre of audio clips")]
struct Cli {
    /// MP3 or WAV files to classify ("-" reads one clip from stdin)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// ONNX model file (overrides the config file)
    #[arg(long)]
    model: Option<PathBuf>,

    /// YAML config file [default: <config dir>/timbre/config.yaml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one JSON object per file instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Parse arguments, rejecting inputs that can't all be read
    fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Self::try_parse_from(args)?;
        let stdin_inputs = cli
            .files
            .iter()
            .filter(|p| p.as_path() == Path::new(STDIN_PATH))
            .count();
        if stdin_inputs > 1 {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "standard input (\"-\") can only be given once",
            ));
        }
        Ok(cli)
    }
}

/// Result of classifying one command-line input
struct Outcome {
    hash: Option<ContentHash>,
    cached: bool,
    result: std::result::Result<Classification, ClassifyError>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("timbre: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Classify every input. Returns `Ok(false)` if any single file failed.
fn run(cli: &Cli) -> Result<bool> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load(&config_path);
    if let Some(model) = &cli.model {
        config.model.model_path = model.clone();
    }

    let pipeline = Pipeline::from_config(&config).context("Cannot classify without the model")?;
    log::info!("Classifier ready: {}", pipeline.classifier().model_name());

    let mut memo = UploadMemo::new();
    let mut all_ok = true;

    for path in &cli.files {
        let label = path.display().to_string();
        let outcome = classify_input(&pipeline, &mut memo, path);
        all_ok &= outcome.result.is_ok();
        print_outcome(&label, &outcome, cli.json)?;
    }

    Ok(all_ok)
}

fn classify_input(
    pipeline: &Pipeline,
    memo: &mut UploadMemo<Classification>,
    path: &Path,
) -> Outcome {
    let from_stdin = path == Path::new(STDIN_PATH);
    let bytes = match read_input(path, from_stdin) {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                ClassifyError::Decode(format!("Failed to open {}: {}", path.display(), e))
            } else {
                ClassifyError::Io(e)
            };
            return Outcome {
                hash: None,
                cached: false,
                result: Err(err),
            };
        }
    };

    let hash = ContentHash::of(&bytes);
    let result = memo.get_or_try_insert(&hash, || {
        if from_stdin {
            pipeline.predict_bytes(&bytes, None)
        } else {
            let name = path.file_name().and_then(|n| n.to_str());
            pipeline.predict_bytes(&bytes, name)
        }
    });

    match result {
        Ok((classification, cached)) => Outcome {
            hash: Some(hash),
            cached,
            result: Ok(classification),
        },
        Err(e) => {
            log::debug!("{} failed: {}", path.display(), e);
            Outcome {
                hash: Some(hash),
                cached: false,
                result: Err(e),
            }
        }
    }
}

fn read_input(path: &Path, from_stdin: bool) -> std::io::Result<Vec<u8>> {
    if from_stdin {
        let mut bytes = Vec::new();
        std::io::stdin().lock().read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        std::fs::read(path)
    }
}

fn print_outcome(label: &str, outcome: &Outcome, json: bool) -> Result<()> {
    match (&outcome.result, json) {
        (Ok(classification), true) => {
            let hash = outcome
                .hash
                .as_ref()
                .context("Classified input without a content hash")?;
            let report = report::FileReport::new(label, hash, outcome.cached, classification);
            println!("{}", serde_json::to_string(&report)?);
        }
        (Ok(classification), false) => {
            print!("{}", report::render_text(label, outcome.cached, classification));
        }
        (Err(e), true) => {
            println!("{}", serde_json::to_string(&report::ErrorReport::new(label, e))?);
        }
        (Err(e), false) => {
            eprint!("{}", report::render_error_text(label, e));
        }
    }
    Ok(())
}
