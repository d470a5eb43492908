use crate::aggregator::{Aggregation, ResultAggregator};
use crate::article::{ArticleRecord, Diagnostic};
use crate::criteria::SearchCriteria;
use crate::decoder::TagDecoder;
use crate::error::{AppError, ServiceErrorKind};
use crate::geocode::CoordinateResolver;
use crate::metadata::{GeoCoordinate, ImageMetadata};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const GEOCODER: &str = "geocoder";

#[derive(Debug, Clone)]
pub enum RunSource {
    Photograph(PathBuf),
    Criteria(SearchCriteria),
}

#[derive(Debug, Serialize, Clone)]
pub struct RunOutcome {
    pub articles: Vec<ArticleRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Decoded photograph tags, present only for the photograph path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

pub struct Orchestrator {
    decoder: TagDecoder,
    resolver: Arc<dyn CoordinateResolver>,
    aggregator: ResultAggregator,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        decoder: TagDecoder,
        resolver: Arc<dyn CoordinateResolver>,
        aggregator: ResultAggregator,
        timeout: Duration,
    ) -> Self {
        Self { decoder, resolver, aggregator, timeout }
    }

    pub async fn run(&self, source: RunSource) -> Result<RunOutcome, AppError> {
        match source {
            RunSource::Criteria(criteria) => {
                criteria.validate()?;
                let Aggregation { articles, diagnostics } = self.aggregator.aggregate(&criteria).await;
                Ok(RunOutcome { articles, diagnostics, metadata: None })
            }
            RunSource::Photograph(path) => self.run_photograph(path).await,
        }
    }

    async fn run_photograph(&self, path: PathBuf) -> Result<RunOutcome, AppError> {
        log::info!("Processing photograph: {:?}", path);
        let decoder = self.decoder.clone();
        let metadata = tokio::task::spawn_blocking(move || decoder.decode(&path)).await??;

        let criteria = SearchCriteria::from_metadata(&metadata);
        log::debug!("Criteria from image tags: {:?}", criteria);

        let search = async {
            if criteria.is_empty() {
                log::info!("Image tags hold no search criteria, skipping source queries");
                let note = Diagnostic::new("image tags", "no usable search criteria in image tags");
                Aggregation { articles: Vec::new(), diagnostics: vec![note] }
            } else {
                self.aggregator.aggregate(&criteria).await
            }
        };
        let (place, mut aggregation) = tokio::join!(self.resolve_place(metadata.coordinate()), search);

        let (place, place_diagnostic) = place;
        if let Some(diagnostic) = place_diagnostic {
            aggregation.diagnostics.insert(0, diagnostic);
        }

        Ok(RunOutcome {
            articles: aggregation.articles,
            diagnostics: aggregation.diagnostics,
            metadata: Some(metadata.with_place(place)),
        })
    }

    /// Geocoding failures degrade to an unknown place plus a diagnostic.
    async fn resolve_place(&self, coord: Option<GeoCoordinate>) -> (Option<String>, Option<Diagnostic>) {
        let coord = match coord {
            Some(coord) => coord,
            None => return (None, None),
        };
        let result = match tokio::time::timeout(self.timeout, self.resolver.resolve(coord)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::service(
                GEOCODER,
                ServiceErrorKind::TimedOut(self.timeout.as_secs()),
            )),
        };
        match result {
            Ok(place) => (place, None),
            Err(e) => {
                log::warn!("Place unknown: {}", e);
                (None, Some(Diagnostic::from_error(GEOCODER, &e)))
            }
        }
    }
}
