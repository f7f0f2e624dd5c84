//! Recording: container for one probe's multi-channel LFP data
//!
//! Samples are stored time-major: frame `t` occupies
//! `data[t * num_channels .. (t + 1) * num_channels]`, one value per channel
//! in channel-id order. The channel axis always matches the channel-id list.

use crate::error::LfpResult;
use crate::recording_error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One probe's multi-channel time series
#[derive(Debug, Clone)]
pub struct Recording {
    /// Unique identifier for this recording
    pub id: Uuid,
    /// Ordered, unique channel identifiers
    channel_ids: Vec<String>,
    /// Sampling rate in Hz
    sampling_rate: f32,
    /// Time-major sample buffer, `num_samples * num_channels` values
    data: Vec<f32>,
    /// Creation timestamp (ms since epoch)
    pub created_at: u64,
}

impl Recording {
    /// Create a new recording, validating the structural invariants.
    pub fn new(channel_ids: Vec<String>, sampling_rate: f32, data: Vec<f32>) -> LfpResult<Self> {
        if channel_ids.is_empty() {
            return Err(recording_error!("channel id list is empty"));
        }
        if !(sampling_rate > 0.0) || !sampling_rate.is_finite() {
            return Err(recording_error!(
                "sampling rate {}Hz is not positive",
                sampling_rate
            ));
        }
        let unique: HashSet<&str> = channel_ids.iter().map(|s| s.as_str()).collect();
        if unique.len() != channel_ids.len() {
            return Err(recording_error!("channel ids are not unique"));
        }
        if data.len() % channel_ids.len() != 0 {
            return Err(recording_error!(
                "buffer length {} is not a multiple of channel count {}",
                data.len(),
                channel_ids.len()
            ));
        }

        Ok(Recording {
            id: Uuid::new_v4(),
            channel_ids,
            sampling_rate,
            data,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis() as u64,
        })
    }

    /// Ordered channel identifiers
    pub fn channel_ids(&self) -> &[String] {
        &self.channel_ids
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channel_ids.len()
    }

    /// Number of time samples per channel
    pub fn num_samples(&self) -> usize {
        self.data.len() / self.channel_ids.len()
    }

    /// Check if the recording holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recording duration in seconds
    pub fn duration(&self) -> f32 {
        self.num_samples() as f32 / self.sampling_rate
    }

    /// Raw time-major buffer
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Position of a channel id in the channel axis
    pub fn channel_index(&self, channel_id: &str) -> Option<usize> {
        self.channel_ids.iter().position(|id| id == channel_id)
    }

    /// One frame: the values of every channel at time index `t`
    pub fn frame(&self, t: usize) -> &[f32] {
        let n = self.channel_ids.len();
        &self.data[t * n..(t + 1) * n]
    }

    /// Extract the full time series of a single channel
    pub fn channel_data(&self, channel_index: usize) -> LfpResult<Vec<f32>> {
        let n = self.channel_ids.len();
        if channel_index >= n {
            return Err(recording_error!(
                "channel index {} out of bounds (0-{})",
                channel_index,
                n - 1
            ));
        }

        let samples = self.num_samples();
        let mut channel = Vec::with_capacity(samples);
        for t in 0..samples {
            channel.push(self.data[t * n + channel_index]);
        }
        Ok(channel)
    }

    /// New recording restricted to the channels at `keep`, preserving order.
    pub fn select_channels(&self, keep: &[usize]) -> LfpResult<Recording> {
        if keep.is_empty() {
            return Err(recording_error!("channel selection is empty"));
        }
        let n = self.channel_ids.len();
        let mut seen = HashSet::new();
        for &idx in keep {
            if idx >= n {
                return Err(recording_error!(
                    "channel index {} out of bounds (0-{})",
                    idx,
                    n - 1
                ));
            }
            if !seen.insert(idx) {
                return Err(recording_error!("channel index {} selected twice", idx));
            }
        }

        let samples = self.num_samples();
        let mut data = Vec::with_capacity(samples * keep.len());
        for t in 0..samples {
            let frame = self.frame(t);
            for &idx in keep {
                data.push(frame[idx]);
            }
        }

        let channel_ids = keep.iter().map(|&idx| self.channel_ids[idx].clone()).collect();
        Recording::new(channel_ids, self.sampling_rate, data)
    }

    /// Sample timestamps in seconds, monotonically non-decreasing
    pub fn time_vector(&self) -> Vec<f32> {
        let dt = 1.0 / self.sampling_rate;
        (0..self.num_samples()).map(|t| t as f32 * dt).collect()
    }

    /// Basic statistics for one channel
    pub fn channel_stats(&self, channel_index: usize) -> LfpResult<ChannelStats> {
        let channel = self.channel_data(channel_index)?;
        Ok(ChannelStats::calculate(&channel))
    }
}

/// Basic statistics for one channel's trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    pub rms: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub peak_to_peak: f32,
}

impl ChannelStats {
    pub fn calculate(data: &[f32]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let len = data.len() as f32;
        let mean = data.iter().sum::<f32>() / len;
        let rms = (data.iter().map(|x| x * x).sum::<f32>() / len).sqrt();
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / len;
        let min = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev: variance.sqrt(),
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("LFP{}", i)).collect()
    }

    #[test]
    fn test_recording_creation() {
        let recording = Recording::new(channel_ids(4), 2500.0, vec![0.0; 4 * 100]).unwrap();
        assert_eq!(recording.num_channels(), 4);
        assert_eq!(recording.num_samples(), 100);
        assert!((recording.duration() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_duplicate_channel_ids() {
        let ids = vec!["LFP0".to_string(), "LFP0".to_string()];
        assert!(Recording::new(ids, 2500.0, vec![0.0; 20]).is_err());
    }

    #[test]
    fn test_rejects_ragged_buffer() {
        assert!(Recording::new(channel_ids(3), 2500.0, vec![0.0; 10]).is_err());
    }

    #[test]
    fn test_rejects_nonpositive_rate() {
        assert!(Recording::new(channel_ids(2), 0.0, vec![0.0; 4]).is_err());
        assert!(Recording::new(channel_ids(2), -1.0, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_frame_and_channel_extraction() {
        // Frame t holds [t*10 + c for c in 0..3].
        let data: Vec<f32> = (0..5)
            .flat_map(|t| (0..3).map(move |c| (t * 10 + c) as f32))
            .collect();
        let recording = Recording::new(channel_ids(3), 1000.0, data).unwrap();

        assert_eq!(recording.frame(2), &[20.0, 21.0, 22.0]);

        let ch1 = recording.channel_data(1).unwrap();
        assert_eq!(ch1, vec![1.0, 11.0, 21.0, 31.0, 41.0]);

        assert!(recording.channel_data(3).is_err());
    }

    #[test]
    fn test_select_channels_preserves_order_and_ids() {
        let data: Vec<f32> = (0..4)
            .flat_map(|t| (0..6).map(move |c| (t * 100 + c) as f32))
            .collect();
        let recording = Recording::new(channel_ids(6), 1000.0, data).unwrap();

        let selected = recording.select_channels(&[0, 2, 4]).unwrap();
        assert_eq!(selected.num_channels(), 3);
        assert_eq!(selected.num_samples(), 4);
        assert_eq!(selected.channel_ids(), &["LFP0", "LFP2", "LFP4"]);
        assert_eq!(selected.frame(1), &[100.0, 102.0, 104.0]);
    }

    #[test]
    fn test_select_channels_rejects_bad_indices() {
        let recording = Recording::new(channel_ids(4), 1000.0, vec![0.0; 8]).unwrap();
        assert!(recording.select_channels(&[]).is_err());
        assert!(recording.select_channels(&[4]).is_err());
        assert!(recording.select_channels(&[1, 1]).is_err());
    }

    #[test]
    fn test_time_vector_is_monotonic() {
        let recording = Recording::new(channel_ids(1), 1250.0, vec![0.0; 100]).unwrap();
        let times = recording.time_vector();
        assert_eq!(times.len(), 100);
        for pair in times.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_channel_stats() {
        let recording =
            Recording::new(channel_ids(1), 1000.0, vec![2.0, 4.0, 2.0, 4.0]).unwrap();
        let stats = recording.channel_stats(0).unwrap();
        assert!((stats.mean - 3.0).abs() < 1e-6);
        assert!((stats.peak_to_peak - 2.0).abs() < 1e-6);
    }
}
