//! VAD engine capability.
//!
//! Every engine is a `Detector`: it advertises a native frame length, scores
//! one frame at a time, and releases its backing resources when the sweep is
//! done. `EngineKind` is the closed set of benchmarkable engines; the
//! sweep-range metadata is a method on the variant, so an engine cannot
//! drift apart from its own parameter range.
//!
//! Detectors are created inside the job thread that drives them and never
//! cross threads afterwards (the WebRTC handle is thread-affine), so the
//! trait carries no `Send` bound.

pub mod energy;
pub mod webrtc;

#[cfg(feature = "onnx")]
pub mod silero;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::bench::SweepRange;
use crate::error::Result;
#[cfg(feature = "onnx")]
use crate::error::VadBenchError;

/// Raw per-frame output of a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameScore {
    /// Parameter-independent speech probability in [0, 1]. Safe to cache
    /// across sweep values; the evaluator applies the current threshold.
    Probability(f32),
    /// Already-thresholded decision from an engine whose sweep parameter is
    /// baked into the instance. Never cached across sweep values.
    Decision(bool),
}

/// A configured VAD engine instance.
pub trait Detector {
    /// Native frame size in samples at the corpus rate.
    fn frame_length(&self) -> usize;

    /// Score one frame of exactly `frame_length()` samples.
    fn score(&mut self, frame: &[f32]) -> Result<FrameScore>;

    /// Release backing resources (native handles, inference sessions).
    /// Called exactly once per instance, even when a sweep pass fails
    /// mid-corpus.
    fn release(&mut self) -> Result<()>;
}

/// Engine-specific configuration, threaded explicitly through construction.
#[derive(Debug, Clone, Default)]
pub struct EngineSetup {
    /// Path to the Silero VAD ONNX model. Required by `EngineKind::Silero`.
    pub silero_model: Option<PathBuf>,
}

/// The closed set of benchmarkable engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Frame-RMS baseline.
    Energy,
    /// WebRTC VAD (GMM), swept over its aggressiveness mode.
    WebRtc,
    /// Silero neural VAD, swept over its probability threshold.
    #[cfg(feature = "onnx")]
    Silero,
}

impl EngineKind {
    /// Every engine compiled into this build.
    pub fn all() -> &'static [EngineKind] {
        &[
            EngineKind::Energy,
            EngineKind::WebRtc,
            #[cfg(feature = "onnx")]
            EngineKind::Silero,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Energy => "energy",
            EngineKind::WebRtc => "webrtc",
            #[cfg(feature = "onnx")]
            EngineKind::Silero => "silero",
        }
    }

    /// Parse a user-facing engine name (case-insensitive).
    pub fn parse(name: &str) -> Option<EngineKind> {
        EngineKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Decision-parameter range swept for this engine.
    pub fn sweep(self) -> SweepRange {
        match self {
            EngineKind::Energy => SweepRange::new(0.0, 1.0, 0.001),
            EngineKind::WebRtc => SweepRange::new(0.0, 3.0, 1.0),
            #[cfg(feature = "onnx")]
            EngineKind::Silero => SweepRange::new(0.0, 1.0, 0.001),
        }
    }

    /// Construct a detector for one sweep value.
    ///
    /// Setup is validated here, before any frame is scored; a missing
    /// required field fails with a clear error.
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn create(self, value: f64, setup: &EngineSetup) -> Result<Box<dyn Detector>> {
        match self {
            EngineKind::Energy => Ok(Box::new(energy::EnergyDetector::new())),
            EngineKind::WebRtc => Ok(Box::new(webrtc::WebRtcDetector::new(value)?)),
            #[cfg(feature = "onnx")]
            EngineKind::Silero => {
                let path =
                    setup
                        .silero_model
                        .as_ref()
                        .ok_or(VadBenchError::MissingEngineConfig {
                            engine: "silero",
                            field: "a Silero ONNX model path",
                        })?;
                Ok(Box::new(silero::SileroDetector::new(path)?))
            }
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_engine_name() {
        for &kind in EngineKind::all() {
            assert_eq!(EngineKind::parse(kind.name()), Some(kind));
            assert_eq!(EngineKind::parse(&kind.name().to_uppercase()), Some(kind));
        }
        assert_eq!(EngineKind::parse("cobra"), None);
    }

    #[test]
    fn sweep_metadata_is_well_formed() {
        for &kind in EngineKind::all() {
            let range = kind.sweep();
            assert!(range.min < range.max, "{kind}");
            assert!(range.step > 0.0, "{kind}");
        }
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn silero_without_model_path_fails_at_creation() {
        let err = EngineKind::Silero
            .create(0.5, &EngineSetup::default())
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::VadBenchError::MissingEngineConfig { .. }
        ));
    }
}
