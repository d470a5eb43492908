use crate::article::ArticleRecord;
use crate::criteria::{build_query, SearchCriteria};
use crate::error::AppError;
use crate::source::SourceAdapter;
use super::invalid_source;
use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use url::Url;

const QUERY_PLACEHOLDER: &str = "{query}";

/// Scrapes headline links from a site's HTML search page.
pub struct WebPageAdapter {
    client: reqwest::Client,
    label: String,
    search_url: String,
    selector: Selector,
}

impl WebPageAdapter {
    pub fn new(
        client: reqwest::Client,
        label: String,
        search_url: String,
        selector: &str,
    ) -> Result<Self, AppError> {
        if !search_url.contains(QUERY_PLACEHOLDER) {
            return Err(invalid_source(format!(
                "{}: search url {:?} has no {} placeholder",
                label, search_url, QUERY_PLACEHOLDER
            )));
        }
        let selector = Selector::parse(selector)
            .map_err(|e| invalid_source(format!("{}: bad selector {:?}: {}", label, selector, e)))?;
        Ok(Self { client, label, search_url, selector })
    }

    fn page_url(&self, query: &str) -> Result<Url, AppError> {
        let raw = self.search_url.replace(QUERY_PLACEHOLDER, query);
        Url::parse(&raw).map_err(|e| {
            invalid_source(format!("{}: bad search url {:?}: {}", self.label, raw, e))
        })
    }
}

#[async_trait]
impl SourceAdapter for WebPageAdapter {
    fn name(&self) -> &str {
        &self.label
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ArticleRecord>, AppError> {
        let page_url = self.page_url(&build_query(criteria))?;
        log::debug!("Fetching {} search page: {}", self.label, page_url);

        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .map_err(|e| AppError::transport(self.label.clone(), e))?;

        if response.status() != StatusCode::OK {
            log::info!("{} answered {}, treating as no results", self.label, response.status());
            return Ok(Vec::new());
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(self.label.clone(), e))?;
        let articles = parse_results(&body, &page_url, &self.selector, &self.label);
        log::info!("{} returned {} articles", self.label, articles.len());
        Ok(articles)
    }
}

/// Headline anchors matched by `selector`; relative links resolve against `page_url`.
fn parse_results(body: &str, page_url: &Url, selector: &Selector, label: &str) -> Vec<ArticleRecord> {
    let document = Html::parse_document(body);
    document
        .select(selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let url = page_url
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string());
            let title = anchor.text().collect::<String>().trim().to_string();
            Some(ArticleRecord::link(title, url, label))
        })
        .collect()
}
