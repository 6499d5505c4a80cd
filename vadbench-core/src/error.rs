use thiserror::Error;

/// All errors produced by vadbench-core.
#[derive(Debug, Error)]
pub enum VadBenchError {
    #[error("dataset directory not found: {path}")]
    DatasetNotFound { path: std::path::PathBuf },

    #[error("no audio files found under {path}")]
    EmptyDataset { path: std::path::PathBuf },

    #[error("{path}: sample rate is {actual} Hz, corpus requires {expected} Hz")]
    SampleRateMismatch {
        path: std::path::PathBuf,
        expected: u32,
        actual: u32,
    },

    #[error("label file {path}: {detail}")]
    LabelFile {
        path: std::path::PathBuf,
        detail: String,
    },

    #[error("corpus shape mismatch: {samples} samples cannot carry {labels} labels")]
    CorpusShape { samples: usize, labels: usize },

    #[error("engine '{engine}' requires {field}")]
    MissingEngineConfig {
        engine: &'static str,
        field: &'static str,
    },

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[cfg(feature = "onnx")]
    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("detector error: {0}")]
    Detector(String),

    #[error("no {truth}-labeled frames at sweep value {value} — rate denominator would be zero")]
    EmptyDenominator { truth: &'static str, value: f64 },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VadBenchError>;
