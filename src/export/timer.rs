// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Stage timing instrumentation, active when the perf timer option is set.

use std::time::Instant;

use log::info;

pub(crate) struct PerfTimer {
    enabled: bool,
    started: Instant,
}

impl PerfTimer {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    /// Logs the elapsed time since the last mark and restarts the clock.
    pub(crate) fn mark(&mut self, label: &str) {
        if self.enabled {
            info!("{label}: {:.3?}", self.started.elapsed());
        }
        self.started = Instant::now();
    }
}
