use crate::article::ArticleRecord;
use crate::criteria::SearchCriteria;
use crate::error::AppError;
use async_trait::async_trait;

/// Uniform search contract over one external news source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Label used in records and diagnostics.
    fn name(&self) -> &str;
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ArticleRecord>, AppError>;
}
