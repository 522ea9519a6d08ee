use crate::core::Pipeline;
use crate::domain::model::EtlReport;
use crate::utils::error::Result;
use crate::utils::monitor::PhaseMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<EtlReport> {
        tracing::info!("🚀 Starting NF-e extraction...");
        self.monitor.log_phase("Start");

        // Extract
        let batch = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} line item(s) from {} document(s), {} failed",
            batch.records.len(),
            batch.documents_parsed,
            batch.failures.len()
        );
        self.monitor.log_phase("Extract");

        // Transform
        let result = self.pipeline.transform(batch).await?;
        tracing::info!(
            "🧮 Aggregated {} line item(s) into {} summary row(s)",
            result.detail.len(),
            result.summary.len()
        );
        self.monitor.log_phase("Transform");

        // Load
        let outputs = self.pipeline.load(&result).await?;
        for output in &outputs {
            tracing::info!("💾 Wrote {}", output);
        }
        self.monitor.log_phase("Load");
        self.monitor.log_final();

        Ok(EtlReport {
            outputs,
            line_items: result.detail.len(),
            summary: result.summary,
            failures: result.failures,
            documents_parsed: result.documents_parsed,
        })
    }
}
