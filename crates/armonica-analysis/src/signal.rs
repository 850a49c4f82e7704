//! Test-signal generation and block utilities.

use std::f32::consts::PI;

/// Generate a sine test tone.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `frequency` - Tone frequency in Hz
/// * `duration_secs` - Duration in seconds
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
pub fn generate_test_tone(
    sample_rate: f32,
    frequency: f32,
    duration_secs: f32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generate a tone with known second and third harmonic content.
///
/// `h2` and `h3` are the harmonic amplitudes relative to `amplitude`, so
/// the expected THD of the result is `sqrt(h2² + h3²) · 100` percent.
/// Useful for calibrating measurement rigs against a known figure.
pub fn generate_distorted_tone(
    sample_rate: f32,
    frequency: f32,
    duration_secs: f32,
    amplitude: f32,
    h2: f32,
    h3: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let w = 2.0 * PI * frequency * t;
            amplitude * (w.sin() + h2 * (2.0 * w).sin() + h3 * (3.0 * w).sin())
        })
        .collect()
}

/// Mix an interleaved multi-channel block down to mono by averaging.
///
/// Returns an empty vector for zero channels. A trailing partial frame is
/// dropped.
pub fn mixdown_interleaved(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels == 0 {
        return Vec::new();
    }
    if channels == 1 {
        return samples.to_vec();
    }

    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_has_requested_length_and_amplitude() {
        let tone = generate_test_tone(48000.0, 1000.0, 0.5, 0.8);
        assert_eq!(tone.len(), 24000);

        let peak = tone.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!((peak - 0.8).abs() < 0.01, "peak {peak}");
    }

    #[test]
    fn distorted_tone_reduces_to_pure_tone() {
        let pure = generate_test_tone(48000.0, 500.0, 0.1, 0.5);
        let distorted = generate_distorted_tone(48000.0, 500.0, 0.1, 0.5, 0.0, 0.0);

        for (a, b) in pure.iter().zip(&distorted) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn mixdown_averages_frames() {
        let interleaved = [1.0, 3.0, 2.0, 4.0, -1.0, 1.0];
        let mono = mixdown_interleaved(&interleaved, 2);
        assert_eq!(mono, vec![2.0, 3.0, 0.0]);
    }

    #[test]
    fn mixdown_mono_is_identity() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(mixdown_interleaved(&samples, 1), samples.to_vec());
    }

    #[test]
    fn mixdown_zero_channels_is_empty() {
        assert!(mixdown_interleaved(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn mixdown_drops_partial_frame() {
        let mono = mixdown_interleaved(&[1.0, 1.0, 5.0], 2);
        assert_eq!(mono, vec![1.0]);
    }
}
