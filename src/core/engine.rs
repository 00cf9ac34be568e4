use crate::domain::ports::AnalysisPipeline;
use crate::utils::error::Result;

pub struct AnalysisEngine<P: AnalysisPipeline> {
    pipeline: P,
}

impl<P: AnalysisPipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Reading feedback CSV...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Loaded {} records", records.len());

        tracing::info!("Summarizing in batches...");
        let results = self.pipeline.summarize(records).await?;
        tracing::info!("Collected {} results", results.len());

        tracing::info!("Writing output CSV...");
        let output_path = self.pipeline.load(results).await?;

        Ok(output_path)
    }
}
