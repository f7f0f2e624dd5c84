//! FFT-based temporal subsampling
//!
//! Decimation by an integer factor T in the frequency domain: pad with
//! reflect-limited samples, forward FFT, drop every bin above the new
//! Nyquist frequency, inverse FFT at the shorter length, strip the resampled
//! padding. Truncating the spectrum is what makes this anti-aliasing aware;
//! no content above the new Nyquist survives into the output.

use crate::shape;
use crate::transform::RecordingTransform;
use lfp_core::{LfpError, LfpResult, Recording};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Decimates a recording from rate R to rate R/T
#[derive(Debug, Clone)]
pub struct Resampler {
    temporal_factor: usize,
}

impl Resampler {
    pub fn new(temporal_factor: usize) -> LfpResult<Self> {
        if temporal_factor == 0 {
            return Err(LfpError::InvalidConfig {
                reason: "temporal factor must be at least 1".to_string(),
            });
        }
        Ok(Self { temporal_factor })
    }

    pub fn temporal_factor(&self) -> usize {
        self.temporal_factor
    }
}

impl RecordingTransform for Resampler {
    fn name(&self) -> &'static str {
        "temporal subsampling"
    }

    fn apply(&self, input: &Recording) -> LfpResult<Recording> {
        if self.temporal_factor == 1 {
            return Ok(input.clone());
        }

        let num_samples = input.num_samples();
        let num_channels = input.num_channels();
        let out_samples = shape::exact_div("temporal subsampling", num_samples, self.temporal_factor)?;
        let (npad_l, npad_r) = auto_npad(num_samples);

        // Decimate channel by channel, then interleave back into frames.
        let mut channels = Vec::with_capacity(num_channels);
        for c in 0..num_channels {
            let trace = input.channel_data(c)?;
            channels.push(decimate_fft(&trace, self.temporal_factor, out_samples, npad_l, npad_r));
        }

        let mut data = Vec::with_capacity(out_samples * num_channels);
        for t in 0..out_samples {
            for channel in &channels {
                data.push(channel[t]);
            }
        }

        let out_rate = input.sampling_rate() / self.temporal_factor as f32;
        let output = Recording::new(input.channel_ids().to_vec(), out_rate, data)?;
        shape::expect_count("temporal subsampling", out_samples, output.num_samples())?;
        Ok(output)
    }
}

/// Padding that brings the FFT length to the next power of two.
///
/// `min_add = min(n / 8, 100) * 2`, total pad = next power of two minus `n`,
/// split as evenly as possible between the two edges.
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let sum = n + min_add;
    let next_pow2 = 1usize << ((sum as f64).log2().ceil() as u32);
    let total = next_pow2 - n;
    (total / 2, total - total / 2)
}

/// Decimate a single trace by `factor` in the frequency domain.
///
/// `final_len` must be `x.len() / factor`; the caller has already validated
/// divisibility.
fn decimate_fft(x: &[f32], factor: usize, final_len: usize, npad_l: usize, npad_r: usize) -> Vec<f32> {
    let n_in = x.len();
    if n_in == 0 {
        return vec![];
    }
    let ratio = 1.0 / factor as f64;

    // Reflect-limited padding on both edges keeps the FFT from wrapping the
    // first sample onto the last.
    let pad_l = npad_l.min(n_in - 1);
    let pad_r = npad_r.min(n_in - 1);
    let old_len = n_in + pad_l + pad_r;

    let mut x_ext = Vec::with_capacity(old_len);
    for i in (1..=pad_l).rev() {
        x_ext.push(2.0 * x[0] - x[i]);
    }
    x_ext.extend_from_slice(x);
    let last = x[n_in - 1];
    for i in 1..=pad_r {
        let idx = (n_in - 1).saturating_sub(i);
        x_ext.push(2.0 * last - x[idx]);
    }

    let new_len_padded = (ratio * old_len as f64).round() as usize;

    // Forward FFT; only the half-spectrum is needed for a real signal.
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft = planner.plan_fft_forward(old_len);
    let mut buf: Vec<Complex<f64>> = x_ext
        .iter()
        .map(|&v| Complex { re: v as f64, im: 0.0 })
        .collect();
    fft.process(&mut buf);

    let rfft_len = old_len / 2 + 1;
    let mut x_fft: Vec<Complex<f64>> = buf[..rfft_len].to_vec();

    // The new Nyquist bin is kept in full rather than split with its mirror.
    if new_len_padded % 2 == 0 {
        let nyq = new_len_padded / 2;
        if nyq < x_fft.len() {
            x_fft[nyq] *= 2.0;
        }
    }

    // Amplitude scale for the shorter inverse transform.
    let scale = new_len_padded as f64 / old_len as f64;
    for v in &mut x_fft {
        *v *= scale;
    }

    // Inverse FFT at the decimated length: copying only the first
    // `new_rfft_len` bins truncates everything above the new Nyquist.
    let new_rfft_len = new_len_padded / 2 + 1;
    let mut spectrum = vec![Complex::<f64>::default(); new_len_padded];
    let n_copy = x_fft.len().min(new_rfft_len);
    spectrum[..n_copy].copy_from_slice(&x_fft[..n_copy]);
    for i in 1..new_rfft_len {
        let idx = new_len_padded - i;
        if idx >= new_rfft_len {
            spectrum[idx] = spectrum[i].conj();
        }
    }

    let ifft = planner.plan_fft_inverse(new_len_padded);
    ifft.process(&mut spectrum);
    let inv_scale = 1.0 / new_len_padded as f64;

    // Strip the resampled padding edges.
    let to_remove_l = (ratio * pad_l as f64).round() as usize;
    let to_remove_r = new_len_padded.saturating_sub(final_len + to_remove_l);
    let strip_end = new_len_padded.saturating_sub(to_remove_r);

    let mut result: Vec<f32> = spectrum[to_remove_l..strip_end]
        .iter()
        .map(|c| (c.re * inv_scale) as f32)
        .collect();
    result.resize(final_len, 0.0);
    result
}
