pub mod chart;
pub mod csv_io;
pub mod engine;
pub mod narration;
pub mod pipeline;
pub mod protocol;
pub mod report;
pub mod sentiment;

pub use crate::domain::model::{AdviceResult, FeedbackRecord, SummaryResult};
pub use crate::domain::ports::{AnalysisPipeline, LanguageModel, Notifier};
pub use crate::utils::error::Result;
