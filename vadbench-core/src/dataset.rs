//! Dataset providers for the speech and noise corpora.
//!
//! Providers are thin, deterministic index→buffer loaders: the directory scan
//! is sorted once at construction, and every `load` re-validates the corpus
//! sample rate. Randomness lives with the caller (the corpus synthesizer owns
//! the seeded RNG), not here.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::audio::wav;
use crate::corpus::SAMPLE_RATE;
use crate::error::{Result, VadBenchError};

/// DEMAND rooms excluded from the noise corpus: heavy reverberation makes
/// their energy statistics unusable as additive background noise.
const DEMAND_BLOCKLIST: &[&str] = &[
    "OMEETING", "PCAFETER", "PRESTO", "SCAFE", "SPSQUARE", "TBUS", "TMETRO",
];

/// Indexed source of fixed-rate mono PCM buffers.
pub trait DatasetProvider {
    /// Number of audio files in the dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the file at `index` as mono f32 at the corpus sample rate.
    fn load(&self, index: usize) -> Result<Vec<f32>>;
}

/// LibriSpeech-style speech corpus: nested speaker/chapter directories,
/// scanned recursively for `.wav` files.
#[derive(Debug)]
pub struct SpeechDataset {
    paths: Vec<PathBuf>,
}

impl SpeechDataset {
    pub fn open(root: &Path) -> Result<Self> {
        let paths = scan(root, |dir, out| collect_wavs_recursive(dir, out))?;
        info!(
            files = paths.len(),
            root = %root.display(),
            "speech dataset loaded"
        );
        Ok(Self { paths })
    }
}

impl DatasetProvider for SpeechDataset {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<Vec<f32>> {
        wav::read_mono(&self.paths[index], SAMPLE_RATE)
    }
}

/// DEMAND-style noise corpus: one directory per noise category (blocklisted
/// reverberant rooms skipped), `.wav` files inside.
pub struct NoiseDataset {
    paths: Vec<PathBuf>,
}

impl NoiseDataset {
    pub fn open(root: &Path) -> Result<Self> {
        let paths = scan(root, |dir, out| {
            for entry in std::fs::read_dir(dir)? {
                let category = entry?.path();
                if !category.is_dir() {
                    continue;
                }
                let name = category
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                if DEMAND_BLOCKLIST.contains(&name) {
                    continue;
                }
                for file in std::fs::read_dir(&category)? {
                    let path = file?.path();
                    if is_wav(&path) {
                        out.push(path);
                    }
                }
            }
            Ok(())
        })?;
        info!(
            files = paths.len(),
            root = %root.display(),
            "noise dataset loaded"
        );
        Ok(Self { paths })
    }
}

impl DatasetProvider for NoiseDataset {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<Vec<f32>> {
        wav::read_mono(&self.paths[index], SAMPLE_RATE)
    }
}

/// Common scan wrapper: existence check, collect, sort, non-empty check.
/// Sorting gives deterministic indices regardless of directory entry order.
fn scan(
    root: &Path,
    collect: impl Fn(&Path, &mut Vec<PathBuf>) -> Result<()>,
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(VadBenchError::DatasetNotFound {
            path: root.to_path_buf(),
        });
    }
    let mut paths = Vec::new();
    collect(root, &mut paths)?;
    paths.sort();
    if paths.is_empty() {
        return Err(VadBenchError::EmptyDataset {
            path: root.to_path_buf(),
        });
    }
    Ok(paths)
}

fn collect_wavs_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_wavs_recursive(&path, out)?;
            continue;
        }
        if is_wav(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}
