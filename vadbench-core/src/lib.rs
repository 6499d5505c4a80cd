//! # vadbench-core
//!
//! Benchmark harness for voice-activity-detection engines.
//!
//! ## Architecture
//!
//! ```text
//! SpeechDataset ─► EnergyLabeler ─► CorpusSynthesizer ─► speech WAV + label file
//! NoiseDataset ─────────┘                                       │
//!                                                    Corpus (shared, read-only)
//!                                                               │
//!                                        runner: one sweep job per EngineKind
//!                                                               │
//!                                     Detector::score per frame (ScoreCache)
//!                                                               │
//!                                          TDR/FAR curve ─► CSV / JSON summary
//! ```
//!
//! Corpus synthesis is deterministic (seeded noise draws), so every engine and
//! every rerun is scored against an identical corpus. A threshold sweep costs
//! one detector inference per physical frame: raw speech probabilities are
//! cached per frame geometry and re-thresholded on lookup.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod bench;
pub mod corpus;
pub mod dataset;
pub mod detector;
pub mod error;

// Convenience re-exports for downstream crates
pub use bench::{run_sweep, EngineOutcome, SweepPoint, SweepRange};
pub use corpus::{Corpus, FrameLabel, DEFAULT_FRAME_LEN, SAMPLE_RATE};
pub use detector::{Detector, EngineKind, EngineSetup, FrameScore};
pub use error::{Result, VadBenchError};
