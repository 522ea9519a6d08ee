use crate::core::aggregator::{self, Aggregator};
use crate::core::export;
use crate::core::extractor;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{DocumentFailure, ExtractionBatch, OutputFormat, TransformResult};
use crate::utils::error::{EtlError, Result};

pub const DOCUMENT_EXTENSION: &str = "xml";

pub struct NfePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> NfePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    async fn resolve_documents(&self) -> Result<Vec<String>> {
        let mut documents = Vec::new();
        for input in self.config.input_paths() {
            let found = self.storage.list_documents(input, DOCUMENT_EXTENSION).await?;
            if found.is_empty() {
                tracing::warn!("⚠️ No .{} documents found in {}", DOCUMENT_EXTENSION, input);
            }
            documents.extend(found);
        }
        Ok(documents)
    }

    fn output_file(&self, suffix: &str, extension: &str) -> String {
        format!(
            "{}/{}{}.{}",
            self.config.output_path().trim_end_matches('/'),
            self.config.report_name(),
            suffix,
            extension
        )
    }

    async fn write(&self, path: String, data: &[u8]) -> Result<String> {
        tracing::debug!("Writing {} bytes to {}", data.len(), path);
        self.storage.write_file(&path, data).await?;
        Ok(path)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for NfePipeline<S, C> {
    async fn extract(&self) -> Result<ExtractionBatch> {
        let documents = self.resolve_documents().await?;
        let policy = self.config.extraction_policy();
        let mut batch = ExtractionBatch::default();

        // 逐一處理，單一文件失敗不中斷整批
        for document in &documents {
            let parsed = match self.storage.read_file(document).await {
                Ok(data) => extractor::parse_nfe(document, &data, &policy),
                Err(e) => Err(EtlError::parse(document.as_str(), e)),
            };

            match parsed {
                Ok(records) => {
                    tracing::debug!("📄 {}: {} line item(s)", document, records.len());
                    batch.documents_parsed += 1;
                    batch.records.extend(records);
                }
                Err(e) => {
                    tracing::warn!("❌ {}", e);
                    let reason = match e {
                        EtlError::DocumentParseError { message, .. } => message,
                        other => other.to_string(),
                    };
                    batch.failures.push(DocumentFailure {
                        document: document.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(batch)
    }

    async fn transform(&self, batch: ExtractionBatch) -> Result<TransformResult> {
        if batch.records.is_empty() {
            return Err(EtlError::NoValidData {
                documents: batch.documents_seen(),
                failures: batch.failures,
            });
        }

        let mut totals = Aggregator::new();
        totals.extend(batch.records);
        let (detail, mut summary) = totals.finish();

        if self.config.pad_states() {
            aggregator::pad_states(&mut summary);
        }

        Ok(TransformResult {
            detail,
            summary,
            failures: batch.failures,
            documents_parsed: batch.documents_parsed,
        })
    }

    async fn load(&self, result: &TransformResult) -> Result<Vec<String>> {
        let mut outputs = Vec::new();

        match self.config.output_format() {
            OutputFormat::Zip => {
                let data = export::zip_report(result)?;
                outputs.push(self.write(self.output_file("", "zip"), &data).await?);
            }
            OutputFormat::Csv => {
                let detail = export::detail_csv(&result.detail)?;
                outputs.push(self.write(self.output_file("", "csv"), &detail).await?);

                let summary = export::summary_csv(&result.summary)?;
                outputs.push(self.write(self.output_file("_resumo", "csv"), &summary).await?);

                if !result.failures.is_empty() {
                    let failures = export::failures_csv(&result.failures)?;
                    outputs.push(self.write(self.output_file("_falhas", "csv"), &failures).await?);
                }
            }
        }

        Ok(outputs)
    }
}
