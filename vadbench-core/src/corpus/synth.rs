//! Corpus synthesis: utterance assembly, silence padding, and SNR-controlled
//! noise mixing.
//!
//! ## Pipeline
//!
//! ```text
//! speech[idx] ─► truncate to 512-multiple ─► label ─► drop warm-up block
//!      │                                                       │
//!      └────► utterance PCM + labels ─► +20 s silence gap ─────┤
//!                                                              ▼
//! noise draw ─► unit-peak ─► concat ─► truncate ─► per-utterance SNR mix
//!                                                              ▼
//!                                                 peak-normalised Corpus
//! ```
//!
//! Noise segments are drawn with replacement from the noise provider by a
//! fixed-seed `StdRng`, so corpus generation is reproducible across runs and
//! every engine is benchmarked against an identical corpus.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::labeler::{label_frames, LabelerConfig};
use super::{Corpus, FrameLabel, DEFAULT_FRAME_LEN, SILENCE_FRAMES, SILENCE_SAMPLES};
use crate::audio;
use crate::dataset::DatasetProvider;
use crate::error::Result;

/// Fixed noise-draw seed.
const NOISE_SEED: u64 = 778;

/// Synthesis parameters.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Target per-utterance speech-to-noise ratio, in dB. Default: 10.
    pub snr_db: f64,
    /// Ground-truth labeler settings.
    pub labeler: LabelerConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            snr_db: 10.0,
            labeler: LabelerConfig::default(),
        }
    }
}

/// One labeled utterance or silence gap awaiting mixing.
struct Segment {
    samples: Vec<f32>,
    labels: Vec<FrameLabel>,
    /// Silence gaps skip SNR scaling entirely.
    is_gap: bool,
}

impl Segment {
    fn silence_gap() -> Self {
        Self {
            samples: vec![0.0; SILENCE_SAMPLES],
            labels: vec![FrameLabel::Silence; SILENCE_FRAMES],
            is_gap: true,
        }
    }
}

/// Build the benchmark corpus from a speech and a noise provider.
pub fn synthesize(
    speech: &dyn DatasetProvider,
    noise: &dyn DatasetProvider,
    config: &SynthConfig,
) -> Result<Corpus> {
    let segments = assemble(speech, &config.labeler)?;
    let speech_len: usize = segments.iter().map(|s| s.samples.len()).sum();
    info!(
        utterances = speech.len(),
        samples = speech_len,
        "speech track assembled"
    );

    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    let mut mixed = draw_noise_track(noise, &mut rng, speech_len)?;

    let mut labels = Vec::with_capacity(speech_len / DEFAULT_FRAME_LEN);
    let mut offset = 0usize;
    for segment in &segments {
        let end = offset + segment.samples.len();
        if !segment.is_gap {
            let scale = snr_scale(
                audio::max_block_energy(&segment.samples, DEFAULT_FRAME_LEN),
                audio::max_block_energy(&mixed[offset..end], DEFAULT_FRAME_LEN),
                config.snr_db,
            );
            for (out, &s) in mixed[offset..end].iter_mut().zip(&segment.samples) {
                *out += s * scale;
            }
        }
        labels.extend_from_slice(&segment.labels);
        offset = end;
    }

    let peak = audio::peak(&mixed);
    if peak > 0.0 {
        for s in &mut mixed {
            *s /= peak;
        }
    }

    let corpus = Corpus {
        samples: mixed,
        labels,
    };
    assert_eq!(
        corpus.samples.len(),
        corpus.labels.len() * DEFAULT_FRAME_LEN,
        "corpus samples and labels lost alignment"
    );
    Ok(corpus)
}

/// Load, truncate, and label every speech item, appending a silence gap
/// after each utterance.
fn assemble(speech: &dyn DatasetProvider, labeler: &LabelerConfig) -> Result<Vec<Segment>> {
    let mut segments = Vec::with_capacity(speech.len() * 2);

    for index in 0..speech.len() {
        let mut pcm = speech.load(index)?;
        pcm.truncate(pcm.len() - pcm.len() % DEFAULT_FRAME_LEN);

        if pcm.len() >= DEFAULT_FRAME_LEN {
            let labels = label_frames(&pcm, labeler);
            // Drop the labeler's warm-up block so PCM and labels line up.
            let samples = pcm.split_off(DEFAULT_FRAME_LEN);
            assert_eq!(
                samples.len(),
                labels.len() * DEFAULT_FRAME_LEN,
                "labeled utterance lost alignment"
            );
            segments.push(Segment {
                samples,
                labels,
                is_gap: false,
            });
        } else {
            debug!(index, "utterance shorter than one label block; contributing silence only");
        }

        segments.push(Segment::silence_gap());
    }

    Ok(segments)
}

/// Concatenate unit-peak-normalised random noise draws until `target_len`
/// samples are available, then truncate to exactly that length.
fn draw_noise_track(
    noise: &dyn DatasetProvider,
    rng: &mut StdRng,
    target_len: usize,
) -> Result<Vec<f32>> {
    if noise.is_empty() {
        return Err(anyhow::anyhow!("noise dataset is empty").into());
    }

    let mut track = Vec::with_capacity(target_len);
    let mut silent_draws = 0usize;
    while track.len() < target_len {
        let draw = noise.load(rng.gen_range(0..noise.len()))?;
        let peak = audio::peak(&draw);
        if peak <= 0.0 {
            silent_draws += 1;
            if silent_draws > noise.len() {
                return Err(anyhow::anyhow!(
                    "noise dataset yields only digitally silent audio"
                )
                .into());
            }
            debug!("skipping digitally silent noise draw");
            continue;
        }
        track.extend(draw.iter().map(|&s| s / peak));
    }
    track.truncate(target_len);
    Ok(track)
}

/// Additive gain placing a speech segment `snr_db` above the noise under it.
///
/// Satisfies `(speech_energy · scale²) / noise_energy = 10^(snr_db / 10)`,
/// where each energy is the maximum per-block sum of squares within the
/// segment. A zero-energy segment stays silent (scale 0).
pub(crate) fn snr_scale(speech_energy: f64, noise_energy: f64, snr_db: f64) -> f32 {
    if speech_energy <= 0.0 {
        return 0.0;
    }
    ((noise_energy * 10f64.powf(snr_db / 10.0)) / speech_energy).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct MemoryDataset {
        items: Vec<Vec<f32>>,
    }

    impl DatasetProvider for MemoryDataset {
        fn len(&self) -> usize {
            self.items.len()
        }

        fn load(&self, index: usize) -> Result<Vec<f32>> {
            Ok(self.items[index].clone())
        }
    }

    /// ±`amp` square wave of `len` samples; survives pre-emphasis.
    fn square(amp: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i % 2 == 0 { amp } else { -amp })
            .collect()
    }

    /// Low-level deterministic noise pattern.
    fn noise_pattern(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.05 * ((i % 13) as f32 / 13.0 - 0.5))
            .collect()
    }

    fn speech_provider() -> MemoryDataset {
        MemoryDataset {
            // Two utterances; the second is not a 512 multiple and gets truncated.
            items: vec![
                square(0.5, DEFAULT_FRAME_LEN * 6),
                square(0.4, DEFAULT_FRAME_LEN * 4 + 100),
            ],
        }
    }

    fn noise_provider() -> MemoryDataset {
        MemoryDataset {
            items: vec![noise_pattern(16_000), noise_pattern(9_000)],
        }
    }

    #[test]
    fn snr_scale_round_trips_the_target_ratio() {
        for snr_db in [0.0, 10.0, 20.0] {
            let speech_energy = 3.7;
            let noise_energy = 0.42;
            let scale = f64::from(snr_scale(speech_energy, noise_energy, snr_db));
            assert_relative_eq!(
                (speech_energy * scale * scale) / noise_energy,
                10f64.powf(snr_db / 10.0),
                max_relative = 1e-5
            );
        }
    }

    #[test]
    fn snr_scale_of_silent_segment_is_zero() {
        assert_eq!(snr_scale(0.0, 1.0, 10.0), 0.0);
    }

    #[test]
    fn corpus_keeps_samples_and_labels_aligned() {
        let corpus = synthesize(
            &speech_provider(),
            &noise_provider(),
            &SynthConfig::default(),
        )
        .unwrap();
        assert_eq!(corpus.samples.len(), corpus.labels.len() * DEFAULT_FRAME_LEN);
        // utterance 1: 6 blocks − warm-up = 5 labels; utterance 2: 4 − 1 = 3.
        assert_eq!(corpus.labels.len(), 5 + SILENCE_FRAMES + 3 + SILENCE_FRAMES);
    }

    #[test]
    fn silence_gaps_are_labeled_silence() {
        let corpus = synthesize(
            &speech_provider(),
            &noise_provider(),
            &SynthConfig::default(),
        )
        .unwrap();
        // The gap after the first utterance (5 labels) is all Silence.
        let gap = &corpus.labels[5..5 + SILENCE_FRAMES];
        assert!(gap.iter().all(|&l| l == FrameLabel::Silence));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let config = SynthConfig::default();
        let a = synthesize(&speech_provider(), &noise_provider(), &config).unwrap();
        let b = synthesize(&speech_provider(), &noise_provider(), &config).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn output_is_peak_normalised_and_finite() {
        let corpus = synthesize(
            &speech_provider(),
            &noise_provider(),
            &SynthConfig::default(),
        )
        .unwrap();
        let peak = audio::peak(&corpus.samples);
        assert!(peak <= 1.0 + 1e-6, "peak={peak}");
        assert!((peak - 1.0).abs() < 1e-6, "peak should hit full scale");
        assert!(corpus.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn silent_utterance_adds_no_speech_energy() {
        let speech = MemoryDataset {
            items: vec![vec![0.0; DEFAULT_FRAME_LEN * 4]],
        };
        let corpus = synthesize(&speech, &noise_provider(), &SynthConfig::default()).unwrap();
        // Labels: all Silence (zero-energy utterance) + gap.
        assert!(corpus.labels.iter().all(|&l| l == FrameLabel::Silence));
        assert!(corpus.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn higher_snr_raises_voiced_region_energy() {
        let quiet = synthesize(
            &speech_provider(),
            &noise_provider(),
            &SynthConfig {
                snr_db: 0.0,
                ..SynthConfig::default()
            },
        )
        .unwrap();
        let loud = synthesize(
            &speech_provider(),
            &noise_provider(),
            &SynthConfig {
                snr_db: 20.0,
                ..SynthConfig::default()
            },
        )
        .unwrap();
        // Peak normalisation rescales both, so compare voiced energy relative
        // to the silence-gap energy within each corpus.
        let voiced = |c: &Corpus| {
            audio::energy(&c.samples[..DEFAULT_FRAME_LEN * 5])
                / audio::energy(&c.samples[DEFAULT_FRAME_LEN * 5..DEFAULT_FRAME_LEN * 50])
        };
        assert!(
            voiced(&loud) > voiced(&quiet),
            "loud={} quiet={}",
            voiced(&loud),
            voiced(&quiet)
        );
    }
}
