pub mod aggregator;
pub mod etl;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod xml;

pub use crate::domain::model::{ExtractionBatch, LineItemRecord, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
