//! Forward spectrum transform with reusable scratch buffers.

use rustfft::{FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Real-input forward transform of fixed power-of-two size.
///
/// The plan and all scratch buffers are allocated once at construction;
/// [`SpectrumTransform::magnitudes`] reuses them, so the per-block call
/// performs no allocation and is safe on the audio-processing context.
pub struct SpectrumTransform {
    fft: Arc<dyn rustfft::Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    size: usize,
}

impl SpectrumTransform {
    /// Plan a forward transform of `size` points.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a power of two.
    pub fn new(size: usize) -> Self {
        assert!(
            size.is_power_of_two(),
            "transform size must be a power of two, got {size}"
        );

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitude: vec![0.0; size / 2],
            size,
        }
    }

    /// Transform size in samples.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of magnitude bins produced per call (`size / 2`).
    pub fn bins(&self) -> usize {
        self.size / 2
    }

    /// Run the forward transform and return the magnitude spectrum.
    ///
    /// Bins cover DC up to (but excluding) Nyquist, `mag[k] = sqrt(re²+im²)`.
    /// Input shorter than the transform size is zero-padded; excess samples
    /// are ignored.
    pub fn magnitudes(&mut self, input: &[f32]) -> &[f32] {
        let n = input.len().min(self.size);
        for (slot, &x) in self.buffer.iter_mut().zip(&input[..n]) {
            *slot = Complex::new(x, 0.0);
        }
        for slot in self.buffer.iter_mut().skip(n) {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (mag, c) in self.magnitude.iter_mut().zip(&self.buffer) {
            *mag = c.norm();
        }
        &self.magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| (2.0 * PI * freq_hz * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn peak_bin_matches_input_frequency() {
        let sample_rate = 48000.0;
        let size = 4096;
        // Bin-centered tone: bin 100 exactly.
        let freq = 100.0 * sample_rate / size as f32;

        let mut transform = SpectrumTransform::new(size);
        let mags = transform.magnitudes(&sine(freq, sample_rate, size));

        let peak = mags
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 100);
    }

    #[test]
    fn dc_input_lands_in_bin_zero() {
        let mut transform = SpectrumTransform::new(256);
        let mags = transform.magnitudes(&[1.0; 256]).to_vec();

        let rest: f32 = mags[1..].iter().sum();
        assert!(mags[0] > rest * 10.0, "DC {} vs rest {rest}", mags[0]);
    }

    #[test]
    fn short_input_is_zero_padded() {
        let mut transform = SpectrumTransform::new(512);
        let mags = transform.magnitudes(&[1.0; 16]).to_vec();
        assert_eq!(mags.len(), 256);
        assert!(mags.iter().all(|m| m.is_finite()));
    }

    #[test]
    fn repeated_calls_are_consistent() {
        // Scratch reuse must not leak state between calls.
        let sample_rate = 48000.0;
        let size = 1024;
        let signal = sine(1000.0, sample_rate, size);

        let mut transform = SpectrumTransform::new(size);
        let first = transform.magnitudes(&signal).to_vec();
        let unrelated = vec![0.5; size];
        let _ = transform.magnitudes(&unrelated);
        let third = transform.magnitudes(&signal).to_vec();

        for (a, b) in first.iter().zip(&third) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two() {
        let _ = SpectrumTransform::new(1000);
    }
}
