use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Timing of one pipeline phase.
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

/// Records how long each ETL phase took and, with the `cli` feature, the
/// process's resident memory at the end of the phase.
pub struct SystemMonitor {
    enabled: bool,
    started: Instant,
    phase_started: Instant,
    phases: Vec<PhaseStats>,
    #[cfg(feature = "cli")]
    system: System,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            phase_started: now,
            phases: Vec::new(),
            #[cfg(feature = "cli")]
            system: System::new(),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phases(&self) -> &[PhaseStats] {
        &self.phases
    }

    /// Closes the current phase under `phase` and starts timing the next one.
    pub fn finish_phase(&mut self, phase: &str) {
        if !self.enabled {
            return;
        }

        let stats = PhaseStats {
            phase: phase.to_string(),
            elapsed: self.phase_started.elapsed(),
            memory_mb: self.memory_mb(),
        };
        match stats.memory_mb {
            Some(mb) => tracing::info!("📊 {} took {:?}, memory {}MB", phase, stats.elapsed, mb),
            None => tracing::info!("📊 {} took {:?}", phase, stats.elapsed),
        }

        self.phases.push(stats);
        self.phase_started = Instant::now();
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.phases.iter().filter_map(|p| p.memory_mb).max();
        tracing::info!(
            "📊 Total time {:?} over {} phases, peak memory {}",
            self.started.elapsed(),
            self.phases.len(),
            peak.map(|mb| format!("{}MB", mb))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    #[cfg(feature = "cli")]
    fn memory_mb(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system
            .process(pid)
            .map(|process| process.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn memory_mb(&mut self) -> Option<u64> {
        None
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
