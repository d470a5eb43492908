use crate::article::{ArticleRecord, Diagnostic};
use crate::criteria::SearchCriteria;
use crate::error::{AppError, ServiceErrorKind};
use crate::source::SourceAdapter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default, Serialize, Clone)]
pub struct Aggregation {
    pub articles: Vec<ArticleRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fans a search out to every configured adapter and merges the results in adapter order.
pub struct ResultAggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    timeout: Duration,
}

impl ResultAggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, timeout: Duration) -> Self {
        Self { adapters, timeout }
    }

    /// Each adapter runs as its own task under `timeout`. A failed, panicked or
    /// timed-out adapter contributes nothing and leaves a diagnostic instead.
    pub async fn aggregate(&self, criteria: &SearchCriteria) -> Aggregation {
        log::info!("Querying {} sources", self.adapters.len());

        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = adapter.clone();
                let criteria = criteria.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, adapter.search(&criteria)).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::service(
                            adapter.name(),
                            ServiceErrorKind::TimedOut(timeout.as_secs()),
                        )),
                    }
                })
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        let mut aggregation = Aggregation::default();
        for (adapter, joined) in self.adapters.iter().zip(results) {
            let result = joined.map_err(AppError::from).and_then(|r| r);
            match result {
                Ok(articles) => {
                    log::debug!("{} contributed {} articles", adapter.name(), articles.len());
                    aggregation.articles.extend(articles);
                }
                Err(e) => {
                    log::warn!("Source {} failed: {}", adapter.name(), e);
                    aggregation.diagnostics.push(Diagnostic::from_error(adapter.name(), &e));
                }
            }
        }

        log::info!(
            "Aggregated {} articles with {} source failures",
            aggregation.articles.len(),
            aggregation.diagnostics.len()
        );
        aggregation
    }
}
