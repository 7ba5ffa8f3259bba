use std::time::Duration;
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Steps of a report run that resource usage is logged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPhase {
    Start,
    Summarize,
    BuildRows,
    WriteReport,
}

impl ReportPhase {
    pub fn label(self) -> &'static str {
        match self {
            ReportPhase::Start => "Start",
            ReportPhase::Summarize => "Summarize inputs",
            ReportPhase::BuildRows => "Build rows",
            ReportPhase::WriteReport => "Write report",
        }
    }
}

/// Inputs handled per second, `None` before any time has passed.
pub fn inputs_per_second(inputs: usize, elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    (seconds > 0.0).then(|| inputs as f64 / seconds)
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

/// Logs process CPU and memory at each report phase when enabled.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<Sampler>>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_memory_mb: 0,
                })),
                Err(e) => {
                    tracing::warn!("Process statistics unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            sampler,
            start_time: Instant::now(),
        }
    }

    fn sample(&self) -> Option<ProcessStats> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let pid = sampler.pid;
        sampler.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = sampler.system.process(pid)?;
        let cpu_usage = process.cpu_usage();
        let memory_mb = process.memory() / 1024 / 1024;
        sampler.peak_memory_mb = sampler.peak_memory_mb.max(memory_mb);

        Some(ProcessStats {
            cpu_usage,
            memory_mb,
            peak_memory_mb: sampler.peak_memory_mb,
            elapsed: self.start_time.elapsed(),
        })
    }

    /// `inputs` is the number of files the phase handled.
    pub fn phase(&self, phase: ReportPhase, inputs: usize) {
        let Some(stats) = self.sample() else {
            return;
        };
        let rate = inputs_per_second(inputs, stats.elapsed)
            .map(|r| format!(", {:.2} input(s)/s", r))
            .unwrap_or_default();
        tracing::info!(
            "📊 {} - {} input(s), CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}{}",
            phase.label(),
            inputs,
            stats.cpu_usage,
            stats.memory_mb,
            stats.peak_memory_mb,
            stats.elapsed,
            rate
        );
    }

    pub fn finish(&self, rows: usize) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Report finished - {} row(s) in {:?}, Peak Memory: {}MB",
                rows,
                stats.elapsed,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn phase(&self, _phase: ReportPhase, _inputs: usize) {}

    pub fn finish(&self, _rows: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(ReportPhase::Summarize.label(), "Summarize inputs");
        assert_eq!(ReportPhase::WriteReport.label(), "Write report");
    }

    #[test]
    fn test_inputs_per_second() {
        assert_eq!(inputs_per_second(10, Duration::from_secs(4)), Some(2.5));
        assert_eq!(inputs_per_second(10, Duration::ZERO), None);
    }

    #[test]
    fn test_disabled_monitor_is_silent() {
        let monitor = SystemMonitor::new(false);
        monitor.phase(ReportPhase::Start, 0);
        monitor.finish(0);
    }
}
