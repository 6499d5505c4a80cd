//! Parallel engine jobs.
//!
//! One scoped thread per engine. Each job owns its detector instances and its
//! score cache, shares the corpus by immutable reference, and reports its
//! outcome over a channel. Failure domains are per-engine: a failed sweep is
//! reported and leaves sibling jobs untouched.

use crossbeam_channel::unbounded;
use tracing::{error, info};

use super::{run_sweep, EngineOutcome};
use crate::corpus::Corpus;
use crate::detector::{EngineKind, EngineSetup};
use crate::error::Result;

/// Result of one engine's job, failures included.
#[derive(Debug)]
pub struct EngineReport {
    pub engine: EngineKind,
    pub outcome: Result<EngineOutcome>,
}

/// Run each engine's full sweep on its own thread.
///
/// Returns one report per requested engine, in the input order.
pub fn run_engines(
    engines: &[EngineKind],
    setup: &EngineSetup,
    corpus: &Corpus,
) -> Vec<EngineReport> {
    let (tx, rx) = unbounded();

    std::thread::scope(|scope| {
        for &engine in engines {
            let tx = tx.clone();
            scope.spawn(move || {
                let outcome = run_sweep(engine, setup, corpus);
                match &outcome {
                    Ok(outcome) => info!(
                        engine = engine.name(),
                        points = outcome.points.len(),
                        "engine job finished"
                    ),
                    Err(e) => error!(engine = engine.name(), error = %e, "engine job failed"),
                }
                let _ = tx.send(EngineReport { engine, outcome });
            });
        }
        drop(tx);
    });

    // All jobs have joined; drain and restore the requested order.
    let mut reports: Vec<EngineReport> = rx.into_iter().collect();
    reports.sort_by_key(|report| engines.iter().position(|&e| e == report.engine));
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{FrameLabel, DEFAULT_FRAME_LEN};

    fn tiny_corpus() -> Corpus {
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for i in 0..8 {
            if i < 2 {
                samples.extend(
                    (0..DEFAULT_FRAME_LEN).map(|j| if j % 2 == 0 { 0.6f32 } else { -0.6 }),
                );
                labels.push(FrameLabel::Voice);
            } else {
                samples.extend(std::iter::repeat(0.0f32).take(DEFAULT_FRAME_LEN));
                labels.push(FrameLabel::Silence);
            }
        }
        Corpus { samples, labels }
    }

    #[test]
    fn reports_come_back_in_requested_order() {
        let corpus = tiny_corpus();
        let engines = [EngineKind::WebRtc, EngineKind::Energy];
        let reports = run_engines(&engines, &EngineSetup::default(), &corpus);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].engine, EngineKind::WebRtc);
        assert_eq!(reports[1].engine, EngineKind::Energy);
        for report in &reports {
            assert!(report.outcome.is_ok(), "{}: {:?}", report.engine, report.outcome);
        }
    }

    #[test]
    fn engine_failures_stay_isolated() {
        // A corpus with no silence frames fails every engine with a
        // zero-denominator error; each job reports its own failure.
        let corpus = Corpus {
            samples: vec![0.0; 4 * DEFAULT_FRAME_LEN],
            labels: vec![FrameLabel::Voice; 4],
        };
        let reports = run_engines(
            &[EngineKind::Energy, EngineKind::WebRtc],
            &EngineSetup::default(),
            &corpus,
        );
        assert_eq!(reports.len(), 2);
        for report in reports {
            assert!(report.outcome.is_err());
        }
    }
}
