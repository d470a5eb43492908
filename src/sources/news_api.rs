use crate::article::ArticleRecord;
use crate::criteria::{build_query, SearchCriteria};
use crate::error::{AppError, ServiceErrorKind};
use crate::source::SourceAdapter;
use super::invalid_source;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

const NAME: &str = "NewsAPI";
/// Upper bound on records taken from one response, whatever `page_size` says.
const MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: Option<ApiSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

/// Structured search against a NewsAPI-style `everything` endpoint.
pub struct NewsApiAdapter {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    page_size: usize,
    language: String,
    sort_by: String,
}

impl NewsApiAdapter {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        api_key: String,
        page_size: usize,
        language: String,
        sort_by: String,
    ) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| invalid_source(format!("bad {} url {:?}: {}", NAME, endpoint, e)))?;
        if page_size > MAX_PAGE_SIZE {
            log::warn!("{} page_size {} exceeds {}, clamping", NAME, page_size, MAX_PAGE_SIZE);
        }
        let page_size = page_size.min(MAX_PAGE_SIZE);
        Ok(Self { client, endpoint, api_key, page_size, language, sort_by })
    }

    /// The query is appended verbatim so its `+` separators survive.
    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&format!("q={}", query)));
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("language", &self.language)
            .append_pair("sortBy", &self.sort_by)
            .append_pair("pageSize", &self.page_size.to_string());
        url
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ArticleRecord>, AppError> {
        let query = build_query(criteria);
        log::debug!("Searching {} for: {}", NAME, query);

        let response = self
            .client
            .get(self.request_url(&query))
            .send()
            .await
            .map_err(|e| AppError::transport(NAME, e))?;

        check_status(response.status())?;

        let body = response.text().await.map_err(|e| AppError::transport(NAME, e))?;
        let articles = parse_articles(&body, self.page_size)?;
        log::info!("{} returned {} articles", NAME, articles.len());
        Ok(articles)
    }
}

fn check_status(status: StatusCode) -> Result<(), AppError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::service(NAME, ServiceErrorKind::Unauthorized));
    }
    if !status.is_success() {
        return Err(AppError::service(NAME, ServiceErrorKind::Status(status.as_u16())));
    }
    Ok(())
}

fn parse_articles(body: &str, limit: usize) -> Result<Vec<ArticleRecord>, AppError> {
    let response: EverythingResponse =
        serde_json::from_str(body).map_err(|e| AppError::parse(NAME, e))?;

    let articles = response
        .articles
        .into_iter()
        .filter_map(|article| {
            let (title, url) = match (article.title, article.url) {
                (Some(title), Some(url)) => (title, url),
                _ => {
                    log::trace!("Skipping {} item without title or url", NAME);
                    return None;
                }
            };
            let source = article
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| NAME.to_string());
            Some(ArticleRecord {
                title,
                url,
                source,
                description: article.description,
                author: article.author,
                published_at: article.published_at,
                content: article.content,
            })
        })
        .take(limit.min(MAX_PAGE_SIZE))
        .collect();
    Ok(articles)
}
