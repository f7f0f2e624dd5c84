//! Run configuration for the subsampling pipeline
//!
//! One immutable [`SubsamplingConfig`] value is constructed and validated
//! before any probe starts, then passed explicitly into the pipeline and
//! runner. There are no mutable globals to override.

use lfp_core::{config_error, LfpResult, ProbeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How reference channels are chosen for each probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// Derive the reference boundary from anatomical annotations
    #[serde(rename = "auto-from-annotations")]
    Annotations,
    /// Take the reference start index from `explicit_reference_indices`
    #[serde(rename = "explicit-per-probe-index")]
    Explicit,
    /// Skip referencing entirely
    #[serde(rename = "disabled")]
    Disabled,
}

/// Parameters of one subsampling run. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsamplingConfig {
    /// Temporal factor T: one sample in T is kept
    pub temporal_factor: usize,
    /// Spatial factor S: one channel in S is kept
    pub spatial_factor: usize,
    /// Highpass cutoff in Hz; 0 disables the filter
    pub highpass_cutoff_hz: f32,
    /// Reference-channel selection policy
    pub reference_mode: ReferenceMode,
    /// Probe label -> reference start index, used only in `Explicit` mode
    pub explicit_reference_indices: HashMap<String, usize>,
}

impl Default for SubsamplingConfig {
    /// The capsule defaults: halve the sample rate, keep every 4th channel,
    /// 0.1 Hz highpass, reference from annotations.
    fn default() -> Self {
        Self {
            temporal_factor: 2,
            spatial_factor: 4,
            highpass_cutoff_hz: 0.1,
            reference_mode: ReferenceMode::Annotations,
            explicit_reference_indices: HashMap::new(),
        }
    }
}

impl SubsamplingConfig {
    /// Validate the configuration. Any error here is fatal for the run.
    pub fn validate(&self) -> LfpResult<()> {
        if self.temporal_factor == 0 {
            return Err(config_error!("temporal factor must be at least 1"));
        }
        if self.spatial_factor == 0 {
            return Err(config_error!("spatial factor must be at least 1"));
        }
        if !self.highpass_cutoff_hz.is_finite() || self.highpass_cutoff_hz < 0.0 {
            return Err(config_error!(
                "highpass cutoff {}Hz must be finite and non-negative",
                self.highpass_cutoff_hz
            ));
        }
        if self.reference_mode == ReferenceMode::Explicit {
            if self.explicit_reference_indices.is_empty() {
                return Err(config_error!(
                    "explicit reference mode requires at least one probe override"
                ));
            }
            self.explicit_overrides()?;
        }
        Ok(())
    }

    /// Canonicalize the override map once, at ingestion.
    ///
    /// Labels are parsed with the same `probe<letter>` rule used everywhere
    /// else; a malformed or duplicated label is a configuration error.
    pub fn explicit_overrides(&self) -> LfpResult<BTreeMap<ProbeId, usize>> {
        let mut overrides = BTreeMap::new();
        for (label, &index) in &self.explicit_reference_indices {
            let probe = ProbeId::parse(label)
                .map_err(|err| config_error!("override map: {}", err))?;
            if overrides.insert(probe, index).is_some() {
                return Err(config_error!(
                    "override map names {} more than once",
                    probe
                ));
            }
        }
        Ok(overrides)
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> LfpResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("failed to serialize configuration: {}", e))
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> LfpResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| config_error!("failed to deserialize configuration: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SubsamplingConfig::default();
        assert_eq!(config.temporal_factor, 2);
        assert_eq!(config.spatial_factor, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_factors_rejected() {
        let mut config = SubsamplingConfig::default();
        config.temporal_factor = 0;
        assert!(config.validate().is_err());

        let mut config = SubsamplingConfig::default();
        config.spatial_factor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_cutoff_rejected() {
        let mut config = SubsamplingConfig::default();
        config.highpass_cutoff_hz = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_mode_requires_overrides() {
        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Explicit;
        assert!(config.validate().is_err());

        config
            .explicit_reference_indices
            .insert("ProbeA".to_string(), 350);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_override_label_rejected() {
        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Explicit;
        config
            .explicit_reference_indices
            .insert("channels_350_up".to_string(), 350);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_override_labels_rejected() {
        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Explicit;
        config
            .explicit_reference_indices
            .insert("ProbeA".to_string(), 350);
        config
            .explicit_reference_indices
            .insert("probea".to_string(), 300);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_override_canonicalization() {
        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Explicit;
        config
            .explicit_reference_indices
            .insert("626791_ProbeB-LFP".to_string(), 320);

        let overrides = config.explicit_overrides().unwrap();
        let probe = ProbeId::from_letter('B').unwrap();
        assert_eq!(overrides.get(&probe), Some(&320));
    }

    #[test]
    fn test_reference_mode_option_strings() {
        let json = r#"{
            "temporal_factor": 2,
            "spatial_factor": 4,
            "highpass_cutoff_hz": 0.1,
            "reference_mode": "auto-from-annotations",
            "explicit_reference_indices": {}
        }"#;
        let config = SubsamplingConfig::from_json(json).unwrap();
        assert_eq!(config.reference_mode, ReferenceMode::Annotations);

        let config = SubsamplingConfig {
            reference_mode: ReferenceMode::Disabled,
            ..SubsamplingConfig::default()
        };
        assert!(config.to_json().unwrap().contains("\"disabled\""));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Explicit;
        config
            .explicit_reference_indices
            .insert("ProbeA".to_string(), 350);

        let json = config.to_json().unwrap();
        let restored = SubsamplingConfig::from_json(&json).unwrap();
        assert_eq!(restored.temporal_factor, config.temporal_factor);
        assert_eq!(restored.reference_mode, ReferenceMode::Explicit);
        assert_eq!(restored.explicit_reference_indices.get("ProbeA"), Some(&350));
    }
}
