//! System memory sampling between sources

use sysinfo::System;
use tracing::debug;

/// Samples system memory usage against a warning threshold
#[derive(Debug)]
pub struct MemoryMonitor {
    system: System,
    threshold: f64,
}

impl MemoryMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            system: System::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fraction of system memory in use, `None` when it cannot be read
    pub fn usage(&mut self) -> Option<f64> {
        self.system.refresh_memory();

        let total_memory = self.system.total_memory() as f64;
        if total_memory == 0.0 {
            return None;
        }
        Some(self.system.used_memory() as f64 / total_memory)
    }

    /// Check if system is under memory pressure
    pub fn is_under_pressure(&mut self) -> bool {
        let Some(memory_usage) = self.usage() else {
            return false;
        };

        let is_pressure = memory_usage > self.threshold;
        if is_pressure {
            debug!(
                "Memory pressure detected: {:.1}% usage (threshold: {:.1}%)",
                memory_usage * 100.0,
                self.threshold * 100.0
            );
        }
        is_pressure
    }
}
