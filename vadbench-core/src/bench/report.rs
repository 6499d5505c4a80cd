//! Result persistence: per-engine CSV curves and an optional JSON summary.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::EngineOutcome;
use crate::corpus::{Corpus, FrameLabel};
use crate::detector::EngineKind;
use crate::error::Result;

/// CSV path for one engine's curve under `out_dir`.
pub fn csv_path(out_dir: &Path, engine: EngineKind) -> PathBuf {
    out_dir.join(format!("vadbench_{}.csv", engine.name()))
}

/// Write one engine's sweep curve: `tdr, far` per line, in the (ascending)
/// order of `outcome.points`.
pub fn write_csv(out_dir: &Path, outcome: &EngineOutcome) -> Result<PathBuf> {
    let path = csv_path(out_dir, outcome.engine);
    let mut file = std::fs::File::create(&path)?;
    for point in &outcome.points {
        writeln!(
            file,
            "{:.6}, {:.6}",
            point.true_detect_rate, point.false_alarm_rate
        )?;
    }
    info!(
        engine = outcome.engine.name(),
        path = %path.display(),
        points = outcome.points.len(),
        "sweep curve written"
    );
    Ok(path)
}

/// Machine-readable run summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub corpus_frames: usize,
    pub voice_frames: usize,
    pub silence_frames: usize,
    pub unknown_frames: usize,
    pub engines: Vec<EngineOutcome>,
}

impl Summary {
    pub fn new(corpus: &Corpus, engines: Vec<EngineOutcome>) -> Self {
        Self {
            corpus_frames: corpus.labels.len(),
            voice_frames: corpus.count(FrameLabel::Voice),
            silence_frames: corpus.count(FrameLabel::Silence),
            unknown_frames: corpus.count(FrameLabel::Unknown),
            engines,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "summary written");
        Ok(())
    }
}
