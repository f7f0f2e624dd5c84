//! Highpass filtering for drift removal
//!
//! A 2nd-order Butterworth highpass (bilinear transform with frequency
//! pre-warping) applied causally per channel. A cutoff of exactly 0 Hz
//! bypasses the filter entirely; designing a biquad that close to DC is
//! numerically unstable, so 0 means "off", not "very low".

use crate::transform::RecordingTransform;
use lfp_core::{LfpError, LfpResult, Recording};

/// Removes content below a cutoff frequency; shape-preserving
#[derive(Debug, Clone)]
pub struct HighpassFilter {
    cutoff_hz: f32,
}

impl HighpassFilter {
    pub fn new(cutoff_hz: f32) -> LfpResult<Self> {
        if !cutoff_hz.is_finite() || cutoff_hz < 0.0 {
            return Err(LfpError::InvalidConfig {
                reason: format!("highpass cutoff {}Hz must be finite and non-negative", cutoff_hz),
            });
        }
        Ok(Self { cutoff_hz })
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// True when this filter is configured as a no-op
    pub fn is_bypass(&self) -> bool {
        self.cutoff_hz == 0.0
    }
}

impl RecordingTransform for HighpassFilter {
    fn name(&self) -> &'static str {
        "highpass filtering"
    }

    fn apply(&self, input: &Recording) -> LfpResult<Recording> {
        if self.is_bypass() {
            return Ok(input.clone());
        }

        let rate = input.sampling_rate();
        if self.cutoff_hz >= rate / 2.0 {
            return Err(LfpError::InvalidConfig {
                reason: format!(
                    "highpass cutoff {}Hz must be below the Nyquist frequency {}Hz",
                    self.cutoff_hz,
                    rate / 2.0
                ),
            });
        }

        let biquad = Biquad::highpass(self.cutoff_hz, rate);
        let num_channels = input.num_channels();
        let num_samples = input.num_samples();

        let mut channels = Vec::with_capacity(num_channels);
        for c in 0..num_channels {
            let trace = input.channel_data(c)?;
            channels.push(biquad.filter(&trace));
        }

        let mut data = Vec::with_capacity(num_samples * num_channels);
        for t in 0..num_samples {
            for channel in &channels {
                data.push(channel[t]);
            }
        }

        Recording::new(input.channel_ids().to_vec(), rate, data)
    }
}

/// Single biquad section (2nd order), direct form I
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// 2nd-order Butterworth highpass coefficients via bilinear transform
    fn highpass(cutoff: f32, rate: f32) -> Self {
        let omega_c = 2.0 * std::f32::consts::PI * cutoff / rate;
        let k = (omega_c / 2.0).tan();

        let sqrt2 = std::f32::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let b0 = 1.0 / norm;
        Biquad {
            b0,
            b1: -2.0 * b0,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - sqrt2 * k + 1.0) / norm,
        }
    }

    /// Causal pass over one channel trace
    fn filter(&self, x: &[f32]) -> Vec<f32> {
        let mut y = Vec::with_capacity(x.len());
        let (mut x1, mut x2) = (0.0_f32, 0.0_f32);
        let (mut y1, mut y2) = (0.0_f32, 0.0_f32);

        for &input in x {
            let output = self.b0 * input + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = input;
            y2 = y1;
            y1 = output;
            y.push(output);
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine_recording(rate: f32, samples: usize, freq: f32) -> Recording {
        let data: Vec<f32> = (0..samples).map(|t| (TAU * freq * t as f32 / rate).sin()).collect();
        Recording::new(vec!["LFP0".to_string()], rate, data).unwrap()
    }

    fn rms(values: &[f32]) -> f32 {
        (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt()
    }

    #[test]
    fn test_shape_preserved() {
        let input = sine_recording(1000.0, 2048, 15.0);
        let filter = HighpassFilter::new(1.0).unwrap();
        let output = filter.apply(&input).unwrap();
        assert_eq!(output.num_channels(), input.num_channels());
        assert_eq!(output.num_samples(), input.num_samples());
        assert_eq!(output.sampling_rate(), input.sampling_rate());
    }

    #[test]
    fn test_zero_cutoff_is_bitwise_bypass() {
        let input = sine_recording(1000.0, 1024, 15.0);
        let filter = HighpassFilter::new(0.0).unwrap();
        assert!(filter.is_bypass());
        let output = filter.apply(&input).unwrap();
        assert_eq!(output.data(), input.data());
    }

    #[test]
    fn test_dc_is_removed() {
        let input = Recording::new(vec!["LFP0".to_string()], 1000.0, vec![1.0; 8000]).unwrap();
        let filter = HighpassFilter::new(1.0).unwrap();
        let output = filter.apply(&input).unwrap();
        let trace = output.channel_data(0).unwrap();
        // After the step transient settles the output sits at zero.
        let tail = &trace[6000..];
        assert!(rms(tail) < 1e-2, "DC remains, rms={}", rms(tail));
    }

    #[test]
    fn test_passband_preserved() {
        let input = sine_recording(1000.0, 8000, 100.0);
        let filter = HighpassFilter::new(1.0).unwrap();
        let output = filter.apply(&input).unwrap();
        let trace = output.channel_data(0).unwrap();
        let out_rms = rms(&trace[4000..]);
        let in_rms = rms(&input.channel_data(0).unwrap()[4000..]);
        assert!(
            (out_rms - in_rms).abs() / in_rms < 0.05,
            "passband attenuated: in={} out={}",
            in_rms,
            out_rms
        );
    }

    #[test]
    fn test_cutoff_above_nyquist_rejected() {
        let input = sine_recording(1000.0, 512, 15.0);
        let filter = HighpassFilter::new(600.0).unwrap();
        assert!(filter.apply(&input).is_err());
    }

    #[test]
    fn test_negative_cutoff_rejected() {
        assert!(HighpassFilter::new(-0.1).is_err());
        assert!(HighpassFilter::new(f32::NAN).is_err());
    }
}
