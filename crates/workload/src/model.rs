// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A single periodic inference stream.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// One workload stream: `model` fires `rate` times per second, each
/// occurrence gated by a Bernoulli trial with success `probability`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelSpec {
    /// Path to the model container.
    pub model: PathBuf,
    /// Target rate in jobs per second.
    pub rate: f64,
    /// Probability in `[0, 1]` that a due occurrence is actually issued.
    #[serde(default = "default_probability")]
    pub probability: f64,
    /// Path to the input manifest used to bind a sample input.
    pub inputs: PathBuf,
}

fn default_probability() -> f64 {
    1.0
}

impl ModelSpec {
    pub fn new(
        model: impl Into<PathBuf>,
        rate: f64,
        probability: f64,
        inputs: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model: model.into(),
            rate,
            probability,
            inputs: inputs.into(),
        }
    }

    /// The identifier used to key registries and latency records.
    pub fn id(&self) -> String {
        self.model.display().to_string()
    }

    /// Short display name: the container file stem.
    pub fn short_name(&self) -> String {
        self.model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id())
    }

    /// Container path.
    pub fn model_path(&self) -> &Path {
        &self.model
    }

    /// Inter-arrival period at the given scale factor: `1 / (rate × scale)`.
    ///
    /// Fails when the period is zero or does not fit in a [`Duration`].
    pub fn period(&self, scale: f64) -> Result<Duration, String> {
        let period = Duration::try_from_secs_f64(1.0 / (self.rate * scale)).map_err(|e| {
            format!(
                "'{}': rate {} at scale {scale} has no valid period: {e}",
                self.id(),
                self.rate
            )
        })?;
        if period.is_zero() {
            return Err(format!(
                "'{}': rate {} at scale {scale} rounds to a zero period",
                self.id(),
                self.rate
            ));
        }
        Ok(period)
    }

    /// Checks rate, probability, and paths.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.model.as_os_str().is_empty() {
            return Err("model path is empty".into());
        }
        if self.inputs.as_os_str().is_empty() {
            return Err(format!("'{}': input manifest path is empty", self.id()));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(format!("'{}': rate must be positive, got {}", self.id(), self.rate));
        }
        self.period(1.0)?;
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(format!(
                "'{}': probability must be in [0, 1], got {}",
                self.id(),
                self.probability
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        let m = ModelSpec::new("m.toml", 10.0, 1.0, "in.txt");
        assert_eq!(m.period(1.0).unwrap(), Duration::from_millis(100));
        assert_eq!(m.period(2.0).unwrap(), Duration::from_millis(50));
        assert_eq!(m.period(0.5).unwrap(), Duration::from_millis(200));
    }

    #[test]
    fn test_period_out_of_range() {
        assert!(ModelSpec::new("m", 1e300, 1.0, "i").period(1.0).is_err());
        assert!(ModelSpec::new("m", 1e-300, 1.0, "i").period(1.0).is_err());
        assert!(ModelSpec::new("m", 1.0, 1.0, "i").period(1e-300).is_err());
    }

    #[test]
    fn test_names() {
        let m = ModelSpec::new("models/KD_res8.toml", 3.0, 1.0, "in.txt");
        assert_eq!(m.id(), "models/KD_res8.toml");
        assert_eq!(m.short_name(), "KD_res8");
    }

    #[test]
    fn test_validate() {
        assert!(ModelSpec::new("m", 3.0, 0.5, "i").validate().is_ok());
        assert!(ModelSpec::new("m", 0.0, 0.5, "i").validate().is_err());
        assert!(ModelSpec::new("m", f64::NAN, 0.5, "i").validate().is_err());
        assert!(ModelSpec::new("m", 3.0, 1.5, "i").validate().is_err());
        assert!(ModelSpec::new("m", 1e300, 1.0, "i").validate().is_err());
        assert!(ModelSpec::new("", 3.0, 1.0, "i").validate().is_err());
        assert!(ModelSpec::new("m", 3.0, 1.0, "").validate().is_err());
    }
}
