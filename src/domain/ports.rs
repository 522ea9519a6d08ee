use crate::domain::model::{ExtractionBatch, ExtractionPolicy, OutputFormat, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// A file resolves to itself; a directory to the files directly inside it
    /// whose extension matches, sorted by path.
    fn list_documents(
        &self,
        path: &str,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_paths(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    fn report_name(&self) -> &str;
    fn extraction_policy(&self) -> ExtractionPolicy;
    fn pad_states(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractionBatch>;
    async fn transform(&self, batch: ExtractionBatch) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<Vec<String>>;
}
