// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Input manifest parsing.
//!
//! An input manifest lists the raw input files for a model, one batch per
//! line. Lines starting with `#` are comments (engines commonly use a
//! leading `#` line to name output layers).
//!
//! # Format
//! ```text
//! # output_layer_name
//! data/sample_0.raw
//! data/sample_1.raw
//! image:=data/img_2.raw mask:=data/mask_2.raw
//! ```
//!
//! A batch is either a whitespace-separated list of paths, matched to the
//! network inputs by position, or a list of `name:=path` pairs matched by
//! input name. Relative paths are resolved against the manifest's
//! directory.

use crate::BackendError;
use std::path::{Path, PathBuf};

/// One input file within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEntry {
    /// Input tensor name when given as `name:=path`.
    pub name: Option<String>,
    /// Resolved file path.
    pub path: PathBuf,
}

/// One line of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBatch {
    pub entries: Vec<InputEntry>,
}

impl InputBatch {
    /// Returns the file for the named input, falling back to the entry at
    /// `position` when the batch has no `name:=` mapping for it.
    pub fn file_for(&self, name: &str, position: usize) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.name.as_deref() == Some(name))
            .or_else(|| self.entries.get(position))
            .map(|e| e.path.as_path())
    }
}

/// A parsed input manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputManifest {
    pub batches: Vec<InputBatch>,
}

impl InputManifest {
    /// Reads and parses a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let content = std::fs::read_to_string(path).map_err(|e| BackendError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base).map_err(|detail| BackendError::Manifest {
            path: path.display().to_string(),
            detail,
        })
    }

    /// Parses manifest text, resolving relative paths against `base`.
    pub fn parse(content: &str, base: &Path) -> Result<Self, String> {
        let mut batches = Vec::new();

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut entries = Vec::new();
            for token in line.split_whitespace() {
                let (name, file) = match token.split_once(":=") {
                    Some((n, f)) => {
                        if n.is_empty() || f.is_empty() {
                            return Err(format!(
                                "line {}: malformed 'name:=path' entry '{token}'",
                                line_no + 1
                            ));
                        }
                        (Some(n.to_string()), f)
                    }
                    None => (None, token),
                };
                entries.push(InputEntry {
                    name,
                    path: resolve(base, file),
                });
            }
            batches.push(InputBatch { entries });
        }

        if batches.is_empty() {
            return Err("manifest lists no inputs".into());
        }
        Ok(Self { batches })
    }

    /// Returns the first batch. Always present for a parsed manifest.
    pub fn first(&self) -> &InputBatch {
        &self.batches[0]
    }
}

fn resolve(base: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Decodes a raw little-endian `f32` file.
pub fn load_float_file(path: &Path) -> Result<Vec<f32>, BackendError> {
    let bytes = std::fs::read(path).map_err(|e| BackendError::io(path, e))?;
    if bytes.len() % 4 != 0 {
        return Err(BackendError::Manifest {
            path: path.display().to_string(),
            detail: format!("{} bytes is not a whole number of f32 values", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
