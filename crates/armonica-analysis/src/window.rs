//! Precomputed analysis window coefficients.

use std::f32::consts::PI;

/// Precomputed Hann window for the analysis transform.
///
/// The coefficient table depends only on the window length, so it is built
/// once at construction and multiplied into each analysis block. Endpoints
/// are exactly zero (`cos(2πi/(n-1))` form), which keeps block boundaries
/// from leaking into the spectrum.
#[derive(Debug, Clone)]
pub struct SpectralWindow {
    coeffs: Vec<f32>,
}

impl SpectralWindow {
    /// Build a Hann window of the given length.
    ///
    /// # Panics
    ///
    /// Panics if `len < 2`.
    pub fn hann(len: usize) -> Self {
        assert!(len >= 2, "window length must be >= 2");

        let denom = (len - 1) as f32;
        let coeffs = (0..len)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
            .collect();

        Self { coeffs }
    }

    /// Window length in samples.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Returns true for a zero-length window (never constructed by `hann`).
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Multiply the window into `buffer` elementwise.
    ///
    /// If the lengths differ, only the overlapping prefix is touched.
    pub fn apply(&self, buffer: &mut [f32]) {
        for (sample, &w) in buffer.iter_mut().zip(&self.coeffs) {
            *sample *= w;
        }
    }

    /// The raw coefficient table.
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }
}
