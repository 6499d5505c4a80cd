//! Energy-based ground-truth labeling.
//!
//! ## Algorithm
//!
//! 1. First-order pre-emphasis: `y[0] = 0; y[i] = x[i] - 0.97·x[i-1]`.
//! 2. Drop the first `DEFAULT_FRAME_LEN` samples (filter warm-up artifact).
//! 3. Per non-overlapping 512-sample block: energy = Σ s², normalised by the
//!    buffer's maximum block energy. A digitally silent buffer has no
//!    reference energy and labels everything `Silence`.
//! 4. Classify against the voice/silence thresholds; the band between them
//!    is `Unknown`.
//! 5. Guard band: blocks within `radius` of a `Voice` block become `Unknown`
//!    unless they are `Voice` themselves, so ambiguous transition frames are
//!    excluded from scoring instead of mislabeled.

use super::{FrameLabel, DEFAULT_FRAME_LEN};
use crate::audio;

/// Pre-emphasis coefficient.
const PRE_EMPHASIS: f32 = 0.97;

/// Thresholds and smoothing radius for the energy labeler.
#[derive(Debug, Clone, Copy)]
pub struct LabelerConfig {
    /// Normalised block energy at or above this is `Voice`. Default: `1e-2`.
    pub voice_threshold: f64,
    /// Normalised block energy at or below this is `Silence`. Default: `5e-4`.
    pub silence_threshold: f64,
    /// Guard-band half-width in blocks around each `Voice` block. Default: 5.
    pub radius: usize,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            voice_threshold: 1e-2,
            silence_threshold: 5e-4,
            radius: 5,
        }
    }
}

/// Label `pcm` with one `FrameLabel` per 512-sample block.
///
/// Returns exactly `floor((pcm.len() - DEFAULT_FRAME_LEN) / DEFAULT_FRAME_LEN)`
/// labels — zero when the buffer is shorter than one block past warm-up.
/// Deterministic: identical input yields an identical label sequence.
///
/// Two voice regions closer than `2·radius` blocks keep no `Silence` between
/// them; the whole gap ends up `Unknown`. That gap is transition audio, not
/// scoreable silence, so it is left as-is rather than special-cased.
pub fn label_frames(pcm: &[f32], config: &LabelerConfig) -> Vec<FrameLabel> {
    if pcm.len() < 2 * DEFAULT_FRAME_LEN {
        return Vec::new();
    }

    let mut filtered = Vec::with_capacity(pcm.len());
    filtered.push(0.0f32);
    for i in 1..pcm.len() {
        filtered.push(pcm[i] - PRE_EMPHASIS * pcm[i - 1]);
    }
    let filtered = &filtered[DEFAULT_FRAME_LEN..];

    let energies: Vec<f64> = filtered
        .chunks_exact(DEFAULT_FRAME_LEN)
        .map(audio::energy)
        .collect();

    let max_energy = energies.iter().fold(0.0f64, |acc, &e| acc.max(e));
    if max_energy <= 0.0 {
        return vec![FrameLabel::Silence; energies.len()];
    }

    let mut labels: Vec<FrameLabel> = energies
        .iter()
        .map(|&e| {
            let normalised = e / max_energy;
            if normalised >= config.voice_threshold {
                FrameLabel::Voice
            } else if normalised <= config.silence_threshold {
                FrameLabel::Silence
            } else {
                FrameLabel::Unknown
            }
        })
        .collect();

    // Guard band around every voice block.
    for i in 0..labels.len() {
        if labels[i] != FrameLabel::Voice {
            continue;
        }
        let lo = i.saturating_sub(config.radius);
        let hi = (i + config.radius).min(labels.len() - 1);
        for label in &mut labels[lo..=hi] {
            if *label != FrameLabel::Voice {
                *label = FrameLabel::Unknown;
            }
        }
    }

    labels
}
