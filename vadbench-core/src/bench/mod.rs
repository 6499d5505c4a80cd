//! Sweep evaluation: drives corpus frames through a detector and accumulates
//! a true-detect-rate / false-alarm-rate point per sweep value.

pub mod report;
pub mod runner;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, FrameLabel, DEFAULT_FRAME_LEN};
use crate::detector::{Detector, EngineKind, EngineSetup, FrameScore};
use crate::error::{Result, VadBenchError};

/// Closed sweep interval `[min, max]` stepped by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SweepRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Number of sweep points, both endpoints included.
    pub fn len(&self) -> usize {
        ((self.max - self.min) / self.step).round() as usize + 1
    }

    /// A sweep always contains at least its `min` endpoint.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Materialise the sweep values in ascending order.
    ///
    /// Derived from the point count rather than repeated addition, so the
    /// final value is exactly `max` with no floating-point drift.
    pub fn points(&self) -> Vec<f64> {
        let n = self.len();
        (0..n)
            .map(|i| {
                if i + 1 == n {
                    self.max
                } else {
                    self.min + self.step * i as f64
                }
            })
            .collect()
    }
}

/// Identity of a physical frame: its index on the detector's native grid plus
/// that grid's frame length. Independent of the sweep value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub index: usize,
    pub frame_length: usize,
}

/// Per-sweep-run cache of raw speech probabilities.
///
/// Keyed by frame geometry only: a physically identical frame resolves to the
/// same cached probability whichever threshold is currently being evaluated,
/// which is what lets a threshold sweep reuse one detector inference per
/// frame. Owned by one engine's sweep run and dropped with it — never shared
/// across engines or runs, so a stale probability cannot leak between them.
#[derive(Debug, Default)]
pub struct ScoreCache {
    scores: HashMap<FrameKey, f32>,
    hits: usize,
    misses: usize,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(hits, misses)` over the cache's lifetime.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    fn lookup(&mut self, key: FrameKey) -> Option<f32> {
        match self.scores.get(&key).copied() {
            Some(probability) => {
                self.hits += 1;
                Some(probability)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, key: FrameKey, probability: f32) {
        self.scores.insert(key, probability);
    }
}

/// One evaluated sweep point.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub value: f64,
    pub true_detect_rate: f64,
    pub false_alarm_rate: f64,
}

/// A completed engine sweep, points ascending by parameter value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutcome {
    pub engine: EngineKind,
    pub points: Vec<SweepPoint>,
}

/// Score the whole corpus once at `value` using `detector`.
///
/// Frame `i` on the detector's native grid aligns to ground-truth label
/// `round(i · frame_length / DEFAULT_FRAME_LEN)`, clamped to the last label.
/// Nearest-neighbour alignment: native frame lengths need not divide the
/// label grid, so small misalignment at grid boundaries is expected.
fn score_frames(
    detector: &mut dyn Detector,
    corpus: &Corpus,
    value: f64,
    cache: &mut ScoreCache,
) -> Result<SweepPoint> {
    let frame_length = detector.frame_length();
    let num_frames = corpus.samples.len() / frame_length;
    let last_label = corpus.labels.len().saturating_sub(1);

    let mut voice_frames = 0usize;
    let mut silence_frames = 0usize;
    let mut true_detects = 0usize;
    let mut false_alarms = 0usize;

    for i in 0..num_frames {
        let frame = &corpus.samples[i * frame_length..(i + 1) * frame_length];
        let label_index =
            ((i * frame_length) as f64 / DEFAULT_FRAME_LEN as f64).round() as usize;
        let truth = corpus.labels[label_index.min(last_label)];

        let key = FrameKey {
            index: i,
            frame_length,
        };
        let is_speech = match cache.lookup(key) {
            Some(probability) => f64::from(probability) >= value,
            None => match detector.score(frame)? {
                FrameScore::Probability(probability) => {
                    cache.insert(key, probability);
                    f64::from(probability) >= value
                }
                FrameScore::Decision(decision) => decision,
            },
        };

        match truth {
            FrameLabel::Voice => {
                voice_frames += 1;
                if is_speech {
                    true_detects += 1;
                }
            }
            FrameLabel::Silence => {
                silence_frames += 1;
                if is_speech {
                    false_alarms += 1;
                }
            }
            FrameLabel::Unknown => {}
        }
    }

    if voice_frames == 0 {
        return Err(VadBenchError::EmptyDenominator {
            truth: "voice",
            value,
        });
    }
    if silence_frames == 0 {
        return Err(VadBenchError::EmptyDenominator {
            truth: "silence",
            value,
        });
    }

    Ok(SweepPoint {
        value,
        true_detect_rate: true_detects as f64 / voice_frames as f64,
        false_alarm_rate: false_alarms as f64 / silence_frames as f64,
    })
}

/// Score and then release, whatever the scoring outcome. A cleanup failure is
/// logged rather than propagated: it must not discard a computed point.
fn score_then_release(
    detector: &mut dyn Detector,
    corpus: &Corpus,
    value: f64,
    cache: &mut ScoreCache,
) -> Result<SweepPoint> {
    let scored = score_frames(detector, corpus, value, cache);
    if let Err(e) = detector.release() {
        warn!(value, error = %e, "detector release failed");
    }
    scored
}

/// Evaluate one sweep value: construct the detector, score, release.
pub fn evaluate_point(
    kind: EngineKind,
    value: f64,
    setup: &EngineSetup,
    corpus: &Corpus,
    cache: &mut ScoreCache,
) -> Result<SweepPoint> {
    let mut detector = kind.create(value, setup)?;
    score_then_release(detector.as_mut(), corpus, value, cache)
}

/// Run one engine's full parameter sweep over `corpus`.
///
/// One `ScoreCache` spans the whole run, so probability engines pay one
/// inference per physical frame across all sweep values. Points are evaluated
/// in ascending parameter order, and the result is sorted by value before it
/// is returned — downstream plotting depends on that order, so it is enforced
/// rather than assumed.
pub fn run_sweep(kind: EngineKind, setup: &EngineSetup, corpus: &Corpus) -> Result<EngineOutcome> {
    let range = kind.sweep();
    let values = range.points();
    info!(
        engine = kind.name(),
        points = values.len(),
        min = range.min,
        max = range.max,
        "sweep started"
    );

    let mut cache = ScoreCache::new();
    let mut points = Vec::with_capacity(values.len());
    for value in values {
        let point = evaluate_point(kind, value, setup, corpus, &mut cache)?;
        debug!(
            engine = kind.name(),
            value,
            tdr = point.true_detect_rate,
            far = point.false_alarm_rate,
            "sweep point"
        );
        points.push(point);
    }

    points.sort_by(|a, b| a.value.total_cmp(&b.value));

    let (hits, misses) = cache.stats();
    info!(
        engine = kind.name(),
        cache_hits = hits,
        cache_misses = misses,
        "sweep finished"
    );

    Ok(EngineOutcome {
        engine: kind,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::corpus::DEFAULT_FRAME_LEN;

    /// Scripted detector: decides speech for a fixed set of frame indices,
    /// or emits a per-frame probability, recording underlying invocations.
    struct StubDetector {
        frame_length: usize,
        speech_frames: Vec<usize>,
        emit_probability: bool,
        next_frame: usize,
        scored_frames: Arc<Mutex<Vec<usize>>>,
        release_calls: Arc<AtomicUsize>,
        fail_at_frame: Option<usize>,
    }

    impl StubDetector {
        fn deciding(speech_frames: Vec<usize>) -> Self {
            Self {
                frame_length: DEFAULT_FRAME_LEN,
                speech_frames,
                emit_probability: false,
                next_frame: 0,
                scored_frames: Arc::new(Mutex::new(Vec::new())),
                release_calls: Arc::new(AtomicUsize::new(0)),
                fail_at_frame: None,
            }
        }

        fn probabilistic(scored_frames: Arc<Mutex<Vec<usize>>>) -> Self {
            Self {
                frame_length: DEFAULT_FRAME_LEN,
                speech_frames: Vec::new(),
                emit_probability: true,
                next_frame: 0,
                scored_frames,
                release_calls: Arc::new(AtomicUsize::new(0)),
                fail_at_frame: None,
            }
        }
    }

    impl Detector for StubDetector {
        fn frame_length(&self) -> usize {
            self.frame_length
        }

        fn score(&mut self, _frame: &[f32]) -> Result<FrameScore> {
            let index = self.next_frame;
            self.next_frame += 1;
            self.scored_frames.lock().push(index);

            if self.fail_at_frame == Some(index) {
                return Err(VadBenchError::Detector("intentional test failure".into()));
            }

            if self.emit_probability {
                // Deterministic per-frame probability: frame k scores k/10.
                Ok(FrameScore::Probability(index as f32 / 10.0))
            } else {
                Ok(FrameScore::Decision(self.speech_frames.contains(&index)))
            }
        }

        fn release(&mut self) -> Result<()> {
            self.release_calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    /// 10-block corpus: 4 Voice, 4 Silence, 2 Unknown.
    fn ten_frame_corpus() -> Corpus {
        use FrameLabel::{Silence as S, Unknown as U, Voice as V};
        let labels = vec![U, V, V, V, S, S, V, S, U, S];
        Corpus {
            samples: vec![0.0; labels.len() * DEFAULT_FRAME_LEN],
            labels,
        }
    }

    #[test]
    fn sweep_points_are_inclusive_and_drift_free() {
        let range = SweepRange::new(0.0, 1.0, 0.001);
        let points = range.points();
        assert_eq!(points.len(), 1001);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[1000], 1.0);
        assert!(points.windows(2).all(|w| w[0] < w[1]));

        let coarse = SweepRange::new(0.0, 3.0, 1.0).points();
        assert_eq!(coarse, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn rates_match_hand_computed_counts() {
        // Stub flags frames {1,3,5,7}: {1,3} are Voice (true detects out of
        // 4 voice frames), {5,7} are Silence (false alarms out of 4).
        let corpus = ten_frame_corpus();
        let mut detector = StubDetector::deciding(vec![1, 3, 5, 7]);
        let mut cache = ScoreCache::new();

        let point = score_frames(&mut detector, &corpus, 0.5, &mut cache).unwrap();
        assert_eq!(point.true_detect_rate, 0.5);
        assert_eq!(point.false_alarm_rate, 0.5);
    }

    #[test]
    fn probability_cache_invokes_detector_once_per_frame() {
        let corpus = ten_frame_corpus();
        let scored = Arc::new(Mutex::new(Vec::new()));
        let mut cache = ScoreCache::new();

        for value in [0.25, 0.75] {
            let mut detector = StubDetector::probabilistic(Arc::clone(&scored));
            score_then_release(&mut detector, &corpus, value, &mut cache).unwrap();
        }

        // One underlying inference per physical frame, not per (frame, value):
        // the second pass is served entirely from cache.
        assert_eq!(&*scored.lock(), &(0..corpus.labels.len()).collect::<Vec<_>>());
        assert_eq!(cache.len(), corpus.labels.len());
        let (hits, misses) = cache.stats();
        assert_eq!(misses, corpus.labels.len());
        assert_eq!(hits, corpus.labels.len());
    }

    #[test]
    fn cached_probabilities_rethreshold_per_value() {
        // Frame k scores k/10; raising the threshold must flip decisions
        // computed from cache, not reuse the old booleans.
        let corpus = ten_frame_corpus();
        let scored = Arc::new(Mutex::new(Vec::new()));
        let mut cache = ScoreCache::new();

        let mut detector = StubDetector::probabilistic(Arc::clone(&scored));
        let permissive = score_then_release(&mut detector, &corpus, 0.0, &mut cache).unwrap();
        assert_eq!(permissive.true_detect_rate, 1.0);
        assert_eq!(permissive.false_alarm_rate, 1.0);

        let mut detector = StubDetector::probabilistic(Arc::clone(&scored));
        let strict = score_then_release(&mut detector, &corpus, 0.95, &mut cache).unwrap();
        assert_eq!(strict.true_detect_rate, 0.0);
        assert_eq!(strict.false_alarm_rate, 0.0);
    }

    #[test]
    fn deciding_detectors_are_reinvoked_per_value() {
        let corpus = ten_frame_corpus();
        let mut detector = StubDetector::deciding(vec![1]);
        let first_scored = Arc::clone(&detector.scored_frames);
        let mut cache = ScoreCache::new();

        score_then_release(&mut detector, &corpus, 0.0, &mut cache).unwrap();

        let mut detector = StubDetector::deciding(vec![1]);
        let second_scored = Arc::clone(&detector.scored_frames);
        score_then_release(&mut detector, &corpus, 1.0, &mut cache).unwrap();

        // Nothing was cached, so both passes hit the detector for every frame.
        assert!(cache.is_empty());
        assert_eq!(first_scored.lock().len(), corpus.labels.len());
        assert_eq!(second_scored.lock().len(), corpus.labels.len());
    }

    #[test]
    fn zero_silence_denominator_is_a_reported_error() {
        let corpus = Corpus {
            samples: vec![0.0; 4 * DEFAULT_FRAME_LEN],
            labels: vec![FrameLabel::Voice; 4],
        };
        let mut detector = StubDetector::deciding(vec![]);
        let mut cache = ScoreCache::new();

        let err = score_frames(&mut detector, &corpus, 0.5, &mut cache).unwrap_err();
        assert!(
            matches!(
                err,
                VadBenchError::EmptyDenominator {
                    truth: "silence",
                    ..
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn zero_voice_denominator_is_a_reported_error() {
        let corpus = Corpus {
            samples: vec![0.0; 4 * DEFAULT_FRAME_LEN],
            labels: vec![FrameLabel::Silence; 4],
        };
        let mut detector = StubDetector::deciding(vec![]);
        let mut cache = ScoreCache::new();

        let err = score_frames(&mut detector, &corpus, 0.5, &mut cache).unwrap_err();
        assert!(matches!(
            err,
            VadBenchError::EmptyDenominator { truth: "voice", .. }
        ));
    }

    #[test]
    fn release_runs_even_when_scoring_fails() {
        let corpus = ten_frame_corpus();
        let mut detector = StubDetector::deciding(vec![]);
        detector.fail_at_frame = Some(3);
        let releases = Arc::clone(&detector.release_calls);
        let mut cache = ScoreCache::new();

        let result = score_then_release(&mut detector, &corpus, 0.5, &mut cache);
        assert!(result.is_err());
        assert_eq!(releases.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unknown_frames_count_toward_neither_rate() {
        // Flag every frame as speech: TDR and FAR both 1.0, and the two
        // Unknown frames change neither denominator.
        let corpus = ten_frame_corpus();
        let mut detector = StubDetector::deciding((0..10).collect());
        let mut cache = ScoreCache::new();

        let point = score_frames(&mut detector, &corpus, 0.5, &mut cache).unwrap();
        assert_eq!(point.true_detect_rate, 1.0);
        assert_eq!(point.false_alarm_rate, 1.0);
    }

    #[test]
    fn native_frames_align_to_nearest_label() {
        // A 480-sample detector over a 512-sample label grid: frame i maps
        // to round(480·i / 512). Frame 8 starts at sample 3840 → label 7.5 →
        // rounds to 8.
        let mut detector = StubDetector::deciding(vec![]);
        detector.frame_length = 480;
        let mut corpus = ten_frame_corpus();
        corpus.labels = vec![FrameLabel::Voice; 10];
        corpus.labels[8] = FrameLabel::Silence;
        let mut cache = ScoreCache::new();

        let point = score_frames(&mut detector, &corpus, 0.5, &mut cache).unwrap();
        // 5120 samples / 480 = 10 native frames; frames map to labels
        // 0,1,2,3,4,5,6,7,8,8 → 8 voice-aligned + 2 silence-aligned.
        assert_eq!(point.true_detect_rate, 0.0);
        assert_eq!(point.false_alarm_rate, 0.0);
    }

    #[test]
    fn run_sweep_orders_points_ascending() {
        use crate::corpus::FrameLabel::{Silence as S, Voice as V};
        // Real Energy engine over a tiny synthetic corpus: loud voice block,
        // quiet silence blocks.
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for i in 0..6 {
            if i % 3 == 0 {
                samples.extend((0..DEFAULT_FRAME_LEN).map(|j| if j % 2 == 0 { 0.8f32 } else { -0.8 }));
                labels.push(V);
            } else {
                samples.extend(std::iter::repeat(0.0f32).take(DEFAULT_FRAME_LEN));
                labels.push(S);
            }
        }
        let corpus = Corpus { samples, labels };

        let outcome = run_sweep(EngineKind::Energy, &EngineSetup::default(), &corpus).unwrap();
        assert_eq!(outcome.points.len(), 1001);
        assert!(outcome
            .points
            .windows(2)
            .all(|w| w[0].value < w[1].value));
        // Threshold 0 flags everything; threshold 1 flags nothing.
        assert_eq!(outcome.points[0].true_detect_rate, 1.0);
        assert_eq!(outcome.points[0].false_alarm_rate, 1.0);
        assert_eq!(outcome.points[1000].true_detect_rate, 0.0);
    }
}
