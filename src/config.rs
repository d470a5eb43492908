use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub web_port: u16,
    pub allowed_extensions: HashSet<String>,
    pub geocoder_url: String,
    pub user_agent: String,
    #[serde(default)]
    pub news_api_key: String,
    pub source_timeout_secs: u64,
    pub sources: Vec<SourceConfig>,
}

/// One configured search source. The order of `sources` is the order results are merged in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    NewsApi {
        url: String,
        #[serde(default = "default_page_size")]
        page_size: usize,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default = "default_sort_by")]
        sort_by: String,
    },
    WebPage {
        label: String,
        /// Search page URL with a `{query}` placeholder.
        search_url: String,
        selector: String,
    },
}

fn default_page_size() -> usize {
    10
}

fn default_language() -> String {
    "en".into()
}

fn default_sort_by() -> String {
    "relevancy".into()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("NEWS_LOCATOR").try_parsing(true))
            .build()?;

        s.try_deserialize()
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        log_level: "debug".into(),
        web_port: 0,
        allowed_extensions: ["png", "jpg", "jpeg"].iter().map(|s| s.to_string()).collect(),
        geocoder_url: "http://127.0.0.1:9/reverse".into(),
        user_agent: "news_locator-tests".into(),
        news_api_key: "test-key".into(),
        source_timeout_secs: 2,
        sources: vec![],
    }
}
