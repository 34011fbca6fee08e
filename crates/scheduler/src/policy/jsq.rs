// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Join-shortest-queue placement.

use super::{LoadView, RuntimeSelector, SelectionInput};
use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;

/// Picks the available runtime with the fewest pending requests.
///
/// Equal depths are broken by [`RuntimeKind::PREFERENCE`] (DSP, then GPU,
/// then CPU).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestQueue;

impl RuntimeSelector for ShortestQueue {
    fn name(&self) -> &str {
        "JSQ"
    }

    fn select(
        &self,
        input: &SelectionInput<'_>,
        load: &dyn LoadView,
        _rng: &mut SmallRng,
    ) -> Option<RuntimeKind> {
        shortest_queue(input.available, load)
    }
}

/// Shared by [`ShortestQueue`] and the dynamic policy's fallback.
pub(crate) fn shortest_queue(available: &[RuntimeKind], load: &dyn LoadView) -> Option<RuntimeKind> {
    available
        .iter()
        .copied()
        .min_by_key(|rt| (load.queue_depth(*rt), rt.preference_rank()))
}
