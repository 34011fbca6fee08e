// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Uniform random placement.

use super::{LoadView, RuntimeSelector, SelectionInput};
use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Picks uniformly among the available runtimes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl RuntimeSelector for UniformRandom {
    fn name(&self) -> &str {
        "RANDOM"
    }

    fn select(
        &self,
        input: &SelectionInput<'_>,
        _load: &dyn LoadView,
        rng: &mut SmallRng,
    ) -> Option<RuntimeKind> {
        input.available.choose(rng).copied()
    }
}
