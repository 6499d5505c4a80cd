//! vadbench — VAD benchmark command line.
//!
//! Synthesizes (or reuses) the labeled benchmark corpus, runs every selected
//! engine's parameter sweep in parallel, and writes one TDR/FAR curve per
//! engine plus an optional JSON summary.
//!
//! The corpus is persisted next to the curves and reused on later runs, so
//! every engine — and every rerun — is benchmarked against identical bytes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vadbench_core::bench::report::{write_csv, Summary};
use vadbench_core::bench::runner::run_engines;
use vadbench_core::corpus::synth::{synthesize, SynthConfig};
use vadbench_core::corpus::Corpus;
use vadbench_core::dataset::{NoiseDataset, SpeechDataset};
use vadbench_core::detector::{EngineKind, EngineSetup};

const SPEECH_FILE: &str = "vadbench_speech.wav";
const LABEL_FILE: &str = "vadbench_labels.txt";

#[derive(Debug)]
struct Args {
    speech_dir: Option<PathBuf>,
    noise_dir: Option<PathBuf>,
    out_dir: PathBuf,
    engines: Vec<EngineKind>,
    snr_db: f64,
    silero_model: Option<PathBuf>,
    summary: Option<PathBuf>,
    rebuild_corpus: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut speech_dir: Option<PathBuf> = None;
    let mut noise_dir: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from(".");
    let mut engines: Option<Vec<EngineKind>> = None;
    let mut snr_db = 10.0f64;
    let mut silero_model: Option<PathBuf> = None;
    let mut summary: Option<PathBuf> = None;
    let mut rebuild_corpus = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--speech-dir" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --speech-dir");
                };
                speech_dir = Some(PathBuf::from(v));
            }
            "--noise-dir" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --noise-dir");
                };
                noise_dir = Some(PathBuf::from(v));
            }
            "--out-dir" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --out-dir");
                };
                out_dir = PathBuf::from(v);
            }
            "--engines" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --engines");
                };
                let mut selected = Vec::new();
                for name in v.split(',') {
                    let Some(kind) = EngineKind::parse(name) else {
                        bail!(
                            "unknown engine '{}' (available: {})",
                            name.trim(),
                            available_engines()
                        );
                    };
                    if !selected.contains(&kind) {
                        selected.push(kind);
                    }
                }
                if selected.is_empty() {
                    bail!("--engines selected nothing");
                }
                engines = Some(selected);
            }
            "--snr-db" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --snr-db");
                };
                snr_db = v
                    .parse::<f64>()
                    .with_context(|| format!("invalid value for --snr-db: {v:?}"))?;
            }
            "--silero-model" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --silero-model");
                };
                silero_model = Some(PathBuf::from(v));
            }
            "--summary" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --summary");
                };
                summary = Some(PathBuf::from(v));
            }
            "--rebuild-corpus" => {
                rebuild_corpus = true;
            }
            "--help" | "-h" => {
                println!(
                    "Usage: vadbench --speech-dir <dir> --noise-dir <dir> \\
  [--out-dir <dir>] [--engines {}] [--snr-db <db>] \\
  [--silero-model <file.onnx>] [--summary <file.json>] [--rebuild-corpus]

The corpus (speech WAV + label file) is persisted under --out-dir and reused
on later runs; pass --rebuild-corpus to regenerate it.",
                    available_engines()
                );
                std::process::exit(0);
            }
            other => {
                bail!("unknown argument: {other}");
            }
        }
    }

    Ok(Args {
        speech_dir,
        noise_dir,
        out_dir,
        engines: engines.unwrap_or_else(|| EngineKind::all().to_vec()),
        snr_db,
        silero_model,
        summary,
        rebuild_corpus,
    })
}

fn available_engines() -> String {
    EngineKind::all()
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(",")
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("vadbench failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args = parse_args()?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("cannot create output directory {}", args.out_dir.display()))?;
    let speech_path = args.out_dir.join(SPEECH_FILE);
    let label_path = args.out_dir.join(LABEL_FILE);

    let corpus = if !args.rebuild_corpus && speech_path.exists() && label_path.exists() {
        info!(
            speech = %speech_path.display(),
            labels = %label_path.display(),
            "reusing persisted corpus"
        );
        Corpus::load(&speech_path, &label_path)?
    } else {
        let (Some(speech_dir), Some(noise_dir)) = (&args.speech_dir, &args.noise_dir) else {
            bail!(
                "--speech-dir and --noise-dir are required (no corpus found under {})",
                args.out_dir.display()
            );
        };
        let speech = SpeechDataset::open(speech_dir)?;
        let noise = NoiseDataset::open(noise_dir)?;
        let config = SynthConfig {
            snr_db: args.snr_db,
            ..SynthConfig::default()
        };
        let corpus = synthesize(&speech, &noise, &config)?;
        corpus.store(&speech_path, &label_path)?;
        info!(
            samples = corpus.samples.len(),
            frames = corpus.labels.len(),
            snr_db = args.snr_db,
            "corpus synthesized and persisted"
        );
        corpus
    };

    let setup = EngineSetup {
        silero_model: args.silero_model.clone(),
    };

    let reports = run_engines(&args.engines, &setup, &corpus);

    let mut outcomes = Vec::new();
    let mut failed = 0usize;
    for report in reports {
        match report.outcome {
            Ok(outcome) => {
                write_csv(&args.out_dir, &outcome)?;
                outcomes.push(outcome);
            }
            Err(e) => {
                failed += 1;
                warn!(engine = report.engine.name(), error = %e, "engine failed; no curve written");
            }
        }
    }

    if let Some(summary_path) = &args.summary {
        Summary::new(&corpus, outcomes.clone()).write(summary_path)?;
    }

    if outcomes.is_empty() {
        bail!("all {failed} engine jobs failed");
    }
    if failed > 0 {
        warn!(failed, succeeded = outcomes.len(), "some engine jobs failed");
    }
    Ok(())
}
