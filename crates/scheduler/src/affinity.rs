// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Worker thread pinning.
//!
//! On Linux the calling thread is bound to one core with
//! `sched_setaffinity`. Elsewhere pinning is unsupported and reported as
//! such; callers log and carry on unpinned.

use crate::SchedulerError;

/// Pins the calling thread to `core`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<(), SchedulerError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    set.set(core).map_err(|e| SchedulerError::PinError {
        core,
        detail: format!("not a valid cpu set index: {e}"),
    })?;
    sched_setaffinity(Pid::from_raw(0), &set).map_err(|e| SchedulerError::PinError {
        core,
        detail: format!("sched_setaffinity failed: {e}"),
    })
}

/// Pins the calling thread to `core`.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(core: usize) -> Result<(), SchedulerError> {
    Err(SchedulerError::PinError {
        core,
        detail: "thread pinning is not supported on this platform".into(),
    })
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_core_is_rejected() {
        assert!(matches!(
            pin_current_thread(1 << 20),
            Err(SchedulerError::PinError { core, .. }) if core == 1 << 20
        ));
    }
}
