// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scenarios and the scenario table.

use crate::{ModelSpec, WorkloadError};
use std::collections::HashSet;
use std::path::Path;

/// A named mix of concurrently running model streams.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    pub name: String,
    pub models: Vec<ModelSpec>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, models: Vec<ModelSpec>) -> Self {
        Self {
            name: name.into(),
            models,
        }
    }

    /// Sum of the configured rates at scale 1.0.
    pub fn total_rate(&self) -> f64 {
        self.models.iter().map(|m| m.rate).sum()
    }

    /// Expected issued jobs per second at scale 1.0 (rate × probability).
    pub fn expected_rate(&self) -> f64 {
        self.models.iter().map(|m| m.rate * m.probability).sum()
    }
}

/// Every scenario the sweep visits, in declaration order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenarioTable {
    #[serde(rename = "scenario")]
    pub scenarios: Vec<Scenario>,
}

impl ScenarioTable {
    /// Creates and validates a table.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, WorkloadError> {
        let table = Self { scenarios };
        table.validate()?;
        Ok(table)
    }

    /// The compiled-in augmented-reality assistant mix.
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![Scenario::new(
                "AR_Assistant",
                vec![
                    ModelSpec::new(
                        "models/KD_res8_narrow_quant.toml",
                        3.0,
                        1.0,
                        "input_lists/KD_res8_narrow.txt",
                    ),
                    ModelSpec::new(
                        "models/ASR_EM_24L_quant.toml",
                        3.0,
                        0.5,
                        "input_lists/ASR_EM_24L.txt",
                    ),
                    ModelSpec::new(
                        "models/SS_HRViT_b1_quant.toml",
                        10.0,
                        1.0,
                        "input_lists/SS_HRViT_b1_quant.txt",
                    ),
                    ModelSpec::new(
                        "models/DE_midas_v21_small_quant.toml",
                        30.0,
                        1.0,
                        "input_lists/DE_midas_v21_small.txt",
                    ),
                    ModelSpec::new(
                        "models/OD_D2go_FasterRCNN_quant.toml",
                        10.0,
                        1.0,
                        "input_lists/OD_D2go_FasterRCNN.txt",
                    ),
                ],
            )],
        }
    }

    /// Loads and validates a table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, WorkloadError> {
        let content = std::fs::read_to_string(path).map_err(|e| WorkloadError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates a table from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, WorkloadError> {
        let table: Self = toml::from_str(s)?;
        table.validate()?;
        tracing::debug!(
            "loaded {} scenario(s), {} distinct model(s)",
            table.scenarios.len(),
            table.unique_models().len()
        );
        Ok(table)
    }

    /// Serialises the table to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks the whole table; the first problem found is returned.
    pub fn validate(&self) -> Result<(), WorkloadError> {
        if self.scenarios.is_empty() {
            return Err(WorkloadError::Empty);
        }

        let mut names = HashSet::new();
        for sc in &self.scenarios {
            let invalid = |detail: String| WorkloadError::InvalidScenario {
                scenario: sc.name.clone(),
                detail,
            };
            if sc.name.trim().is_empty() {
                return Err(invalid("scenario name is empty".into()));
            }
            if !names.insert(sc.name.as_str()) {
                return Err(invalid("duplicate scenario name".into()));
            }
            if sc.models.is_empty() {
                return Err(invalid("scenario has no models".into()));
            }
            for m in &sc.models {
                m.validate().map_err(invalid)?;
            }
        }
        Ok(())
    }

    /// Distinct models across all scenarios, keyed by [`ModelSpec::id`].
    /// The first occurrence of each model wins.
    pub fn unique_models(&self) -> Vec<&ModelSpec> {
        let mut seen = HashSet::new();
        self.scenarios
            .iter()
            .flat_map(|s| s.models.iter())
            .filter(|m| seen.insert(m.id()))
            .collect()
    }

    /// Looks up a scenario by name.
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let t = ScenarioTable::builtin();
        t.validate().unwrap();
        let ar = t.get("AR_Assistant").unwrap();
        assert_eq!(ar.models.len(), 5);
        assert!((ar.total_rate() - 56.0).abs() < 1e-9);
        assert!((ar.expected_rate() - 54.5).abs() < 1e-9);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
[[scenario]]
name = "VR_Gaming"

[[scenario.models]]
model = "models/HT.toml"
rate = 30.0
inputs = "lists/HT.txt"

[[scenario.models]]
model = "models/ES.toml"
rate = 60.0
probability = 0.25
inputs = "lists/ES.txt"
"#;
        let t = ScenarioTable::from_toml(toml).unwrap();
        let sc = &t.scenarios[0];
        assert_eq!(sc.name, "VR_Gaming");
        assert_eq!(sc.models[0].probability, 1.0);
        assert_eq!(sc.models[1].probability, 0.25);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let t = ScenarioTable::builtin();
        let back = ScenarioTable::from_toml(&t.to_toml().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_rejects_empty() {
        let err = ScenarioTable::new(vec![]).unwrap_err();
        assert!(matches!(err, WorkloadError::Empty));

        let err = ScenarioTable::new(vec![Scenario::new("x", vec![])]).unwrap_err();
        assert!(matches!(err, WorkloadError::InvalidScenario { .. }));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_models() {
        let m = ModelSpec::new("a.toml", 1.0, 1.0, "a.txt");
        let dup = ScenarioTable::new(vec![
            Scenario::new("s", vec![m.clone()]),
            Scenario::new("s", vec![m.clone()]),
        ]);
        assert!(dup.is_err());

        let bad = ModelSpec::new("a.toml", -1.0, 1.0, "a.txt");
        assert!(ScenarioTable::new(vec![Scenario::new("s", vec![bad])]).is_err());
    }

    #[test]
    fn test_unique_models() {
        let a = ModelSpec::new("a.toml", 1.0, 1.0, "a.txt");
        let b = ModelSpec::new("b.toml", 2.0, 1.0, "b.txt");
        let t = ScenarioTable::new(vec![
            Scenario::new("one", vec![a.clone(), b.clone()]),
            Scenario::new("two", vec![ModelSpec { rate: 9.0, ..a.clone() }]),
        ])
        .unwrap();
        let ids: Vec<String> = t.unique_models().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["a.toml", "b.toml"]);
        assert_eq!(t.unique_models()[0].rate, 1.0);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ScenarioTable::from_file(Path::new("/nonexistent/workload.toml"));
        assert!(matches!(err, Err(WorkloadError::Read { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.toml");
        std::fs::write(&path, ScenarioTable::builtin().to_toml().unwrap()).unwrap();
        assert_eq!(ScenarioTable::from_file(&path).unwrap().scenarios.len(), 1);
    }
}
