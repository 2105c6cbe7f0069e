use crate::core::{Pipeline, SalesReport};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::Mutex;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub output_path: String,
    pub report: SalesReport,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Mutex<SystemMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: Mutex::new(SystemMonitor::new(monitor_enabled)),
        }
    }

    fn phase_done(&self, phase: &str) {
        if let Ok(mut monitor) = self.monitor.lock() {
            monitor.finish_phase(phase);
        }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting sales ETL run");

        tracing::info!("Extracting sales feed...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", records.len());
        self.phase_done("extract");

        tracing::info!("Aggregating...");
        let report = self.pipeline.transform(records).await?;
        tracing::info!(
            "Aggregated {} of {} records for the selection",
            report.aggregates.count,
            report.feed_records
        );
        self.phase_done("transform");

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(&report).await?;
        tracing::info!("Report saved to: {}", output_path);
        self.phase_done("load");

        if let Ok(monitor) = self.monitor.lock() {
            monitor.log_final_stats();
        }

        Ok(EtlOutcome {
            output_path,
            report,
        })
    }
}
