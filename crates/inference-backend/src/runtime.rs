// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution runtime identifiers.

use std::fmt;
use std::str::FromStr;

/// One execution engine on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// General-purpose processor.
    Cpu,
    /// Graphics accelerator.
    Gpu,
    /// Signal processor.
    Dsp,
}

impl RuntimeKind {
    /// All runtime kinds in declaration order.
    pub const ALL: [RuntimeKind; 3] = [RuntimeKind::Cpu, RuntimeKind::Gpu, RuntimeKind::Dsp];

    /// Fixed preference order used for tie-breaking: most specialised first.
    pub const PREFERENCE: [RuntimeKind; 3] =
        [RuntimeKind::Dsp, RuntimeKind::Gpu, RuntimeKind::Cpu];

    /// Short upper-case name (`"CPU"`, `"GPU"`, `"DSP"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Cpu => "CPU",
            RuntimeKind::Gpu => "GPU",
            RuntimeKind::Dsp => "DSP",
        }
    }

    /// Stable index in `0..3`.
    pub fn index(&self) -> usize {
        match self {
            RuntimeKind::Cpu => 0,
            RuntimeKind::Gpu => 1,
            RuntimeKind::Dsp => 2,
        }
    }

    /// Position in [`RuntimeKind::PREFERENCE`]; lower is preferred.
    pub fn preference_rank(&self) -> usize {
        match self {
            RuntimeKind::Dsp => 0,
            RuntimeKind::Gpu => 1,
            RuntimeKind::Cpu => 2,
        }
    }

    /// Parses a comma-separated list such as `"cpu,gpu,dsp"`.
    pub fn parse_list(s: &str) -> Result<Vec<RuntimeKind>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(RuntimeKind::Cpu),
            "gpu" => Ok(RuntimeKind::Gpu),
            "dsp" => Ok(RuntimeKind::Dsp),
            other => Err(format!(
                "unknown runtime '{other}'; expected 'cpu', 'gpu', or 'dsp'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_order() {
        let mut all = RuntimeKind::ALL.to_vec();
        all.sort_by_key(|r| r.preference_rank());
        assert_eq!(all, RuntimeKind::PREFERENCE.to_vec());
    }

    #[test]
    fn test_parse() {
        assert_eq!("DSP".parse::<RuntimeKind>().unwrap(), RuntimeKind::Dsp);
        assert_eq!(" gpu ".parse::<RuntimeKind>().unwrap(), RuntimeKind::Gpu);
        assert!("npu".parse::<RuntimeKind>().is_err());
    }

    #[test]
    fn test_parse_list() {
        let rts = RuntimeKind::parse_list("cpu, dsp").unwrap();
        assert_eq!(rts, vec![RuntimeKind::Cpu, RuntimeKind::Dsp]);
        assert!(RuntimeKind::parse_list("cpu,tpu").is_err());
    }

    #[test]
    fn test_display_and_index() {
        assert_eq!(RuntimeKind::Gpu.to_string(), "GPU");
        let idx: Vec<usize> = RuntimeKind::ALL.iter().map(|r| r.index()).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }
}
