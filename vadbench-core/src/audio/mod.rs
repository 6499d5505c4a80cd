//! Shared PCM numeric helpers.

pub mod wav;

/// Peak absolute amplitude of a buffer. Zero for an empty buffer.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Root-mean-square level of a frame.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Sum of squared samples, accumulated in f64.
pub fn energy(samples: &[f32]) -> f64 {
    samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum()
}

/// Maximum energy over non-overlapping `block_len` blocks (trailing partial
/// block included). Zero for an empty buffer.
pub fn max_block_energy(samples: &[f32], block_len: usize) -> f64 {
    samples.chunks(block_len).map(energy).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_of_empty_is_zero() {
        assert_eq!(peak(&[]), 0.0);
    }

    #[test]
    fn peak_sees_negative_excursions() {
        assert_eq!(peak(&[0.1, -0.8, 0.3]), 0.8);
    }

    #[test]
    fn rms_of_square_wave_equals_amplitude() {
        // A square wave at ±0.5 has RMS = 0.5
        let samples: Vec<f32> = (0..256)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let rms = rms(&samples);
        assert!((rms - 0.5).abs() < 1e-5, "rms={rms}");
    }

    #[test]
    fn max_block_energy_picks_loudest_block() {
        // Quiet block then loud block
        let mut samples = vec![0.1f32; 4];
        samples.extend(vec![0.5f32; 4]);
        let e = max_block_energy(&samples, 4);
        assert!((e - 4.0 * 0.25).abs() < 1e-9, "e={e}");
    }

    #[test]
    fn max_block_energy_of_empty_is_zero() {
        assert_eq!(max_block_energy(&[], 512), 0.0);
    }
}
