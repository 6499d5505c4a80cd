//! WAV read/write via `hound`.
//!
//! The reader accepts 16/24/32-bit integer and f32 WAVs and downmixes
//! interleaved channels to mono; every read enforces the corpus sample rate,
//! so a mislabeled dataset file fails fast instead of skewing the benchmark.
//! The corpus writer emits 16-bit PCM mono.

use std::path::Path;

use crate::error::{Result, VadBenchError};

/// Read a WAV file as mono f32 samples, enforcing `expected_rate`.
pub fn read_mono(path: &Path, expected_rate: u32) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != expected_rate {
        return Err(VadBenchError::SampleRateMismatch {
            path: path.to_path_buf(),
            expected: expected_rate,
            actual: spec.sample_rate,
        });
    }

    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            } else {
                let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        }
    };

    if channels == 1 {
        return Ok(interleaved);
    }

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks(channels) {
        let sum = frame.iter().copied().sum::<f32>();
        mono.push(sum / channels as f32);
    }
    Ok(mono)
}

/// Write mono f32 samples as a 16-bit PCM WAV at `rate`.
pub fn write_mono_i16(path: &Path, samples: &[f32], rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(v)?;
    }
    writer.finalize()?;
    Ok(())
}
