// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static-affinity policies (`CPU_ONLY`, `GPU_ONLY`, `DSP_ONLY`).

use super::{LoadView, RuntimeSelector, SelectionInput};
use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;

/// Always targets one runtime.
///
/// When the model has no handle for the target, the first available
/// runtime is used instead. The fallback is deterministic but arbitrary.
#[derive(Debug, Clone, Copy)]
pub struct FixedAffinity {
    target: RuntimeKind,
}

impl FixedAffinity {
    pub fn new(target: RuntimeKind) -> Self {
        Self { target }
    }

    pub fn target(&self) -> RuntimeKind {
        self.target
    }
}

impl RuntimeSelector for FixedAffinity {
    fn name(&self) -> &str {
        match self.target {
            RuntimeKind::Cpu => "CPU_ONLY",
            RuntimeKind::Gpu => "GPU_ONLY",
            RuntimeKind::Dsp => "DSP_ONLY",
        }
    }

    fn select(
        &self,
        input: &SelectionInput<'_>,
        _load: &dyn LoadView,
        _rng: &mut SmallRng,
    ) -> Option<RuntimeKind> {
        if input.is_available(self.target) {
            Some(self.target)
        } else {
            input.available.first().copied()
        }
    }
}
