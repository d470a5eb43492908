pub mod news_api;
pub mod web_page;

use crate::config::{AppConfig, SourceConfig};
use crate::error::AppError;
use crate::source::SourceAdapter;
use std::sync::Arc;
use std::time::Duration;

use self::news_api::NewsApiAdapter;
use self::web_page::WebPageAdapter;

/// Builds the adapters in configured order, sharing one HTTP client.
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Arc<dyn SourceAdapter>>, AppError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.source_timeout_secs))
        .build()
        .map_err(|e| AppError::transport("http client", e))?;

    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        match source {
            SourceConfig::NewsApi { url, page_size, language, sort_by } => {
                if config.news_api_key.is_empty() {
                    log::warn!("News API key is empty; requests will be rejected as unauthorized.");
                }
                adapters.push(Arc::new(NewsApiAdapter::new(
                    client.clone(),
                    url,
                    config.news_api_key.clone(),
                    *page_size,
                    language.clone(),
                    sort_by.clone(),
                )?));
            }
            SourceConfig::WebPage { label, search_url, selector } => {
                adapters.push(Arc::new(WebPageAdapter::new(
                    client.clone(),
                    label.clone(),
                    search_url.clone(),
                    selector,
                )?));
            }
        }
    }
    log::debug!(
        "Configured sources: {:?}",
        adapters.iter().map(|a| a.name().to_string()).collect::<Vec<_>>()
    );
    Ok(adapters)
}

pub(crate) fn invalid_source(message: String) -> AppError {
    AppError::Config(config::ConfigError::Message(message))
}

/// Serves one canned HTTP response on a loopback port and returns the port.
#[cfg(test)]
pub(crate) async fn serve_once(status: &str, content_type: &str, body: &str) -> u16 {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    });
    port
}
