//! WebRTC VAD engine.
//!
//! Wraps `webrtc_vad::Vad` over 30 ms frames at the corpus rate. The sweep
//! value selects the aggressiveness mode at construction, so each frame's
//! output is an already-thresholded decision and is never reused across
//! sweep values.

use webrtc_vad::{SampleRate, Vad, VadMode};

use super::{Detector, FrameScore};
use crate::corpus::SAMPLE_RATE;
use crate::error::{Result, VadBenchError};

/// 30 ms at 16 kHz. One of the three frame durations the engine accepts.
const FRAME_LEN: usize = SAMPLE_RATE as usize * 30 / 1000;

pub struct WebRtcDetector {
    vad: Vad,
    /// Reused f32 → i16 conversion buffer.
    frame_i16: Vec<i16>,
}

impl WebRtcDetector {
    /// `mode` is the aggressiveness sweep value: 0 (quality) … 3 (very
    /// aggressive).
    pub fn new(mode: f64) -> Result<Self> {
        let mode = match mode.round() as i64 {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            3 => VadMode::VeryAggressive,
            other => {
                return Err(VadBenchError::Detector(format!(
                    "webrtc aggressiveness must be 0..=3, got {other}"
                )))
            }
        };

        Ok(Self {
            vad: Vad::new_with_rate_and_mode(SampleRate::Rate16kHz, mode),
            frame_i16: Vec::with_capacity(FRAME_LEN),
        })
    }
}

impl Detector for WebRtcDetector {
    fn frame_length(&self) -> usize {
        FRAME_LEN
    }

    fn score(&mut self, frame: &[f32]) -> Result<FrameScore> {
        self.frame_i16.clear();
        self.frame_i16.extend(
            frame
                .iter()
                .map(|&s| (s * 32_767.0).clamp(-32_768.0, 32_767.0) as i16),
        );

        let is_speech = self.vad.is_voice_segment(&self.frame_i16).map_err(|_| {
            VadBenchError::Detector(format!(
                "webrtc rejected a {}-sample frame",
                self.frame_i16.len()
            ))
        })?;

        Ok(FrameScore::Decision(is_speech))
    }

    fn release(&mut self) -> Result<()> {
        // The native handle is freed when the Vad drops.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_mode() {
        assert!(WebRtcDetector::new(4.0).is_err());
        assert!(WebRtcDetector::new(-1.0).is_err());
    }

    #[test]
    fn accepts_all_four_modes() {
        for mode in 0..=3 {
            assert!(WebRtcDetector::new(f64::from(mode)).is_ok(), "mode={mode}");
        }
    }

    #[test]
    fn silence_frame_is_not_speech() {
        let mut detector = WebRtcDetector::new(3.0).unwrap();
        let frame = vec![0.0f32; FRAME_LEN];
        assert_eq!(
            detector.score(&frame).unwrap(),
            FrameScore::Decision(false)
        );
    }

    #[test]
    fn wrong_frame_length_is_an_error() {
        let mut detector = WebRtcDetector::new(0.0).unwrap();
        let frame = vec![0.0f32; 100];
        assert!(detector.score(&frame).is_err());
    }
}
